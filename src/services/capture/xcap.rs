use crate::error::{OverlayError, Result};
use crate::model::WindowHandle;
use ::xcap::Window;
use image::RgbaImage;
use tracing::{debug, info};

use super::r#trait::{check_buffer, CaptureBackend, BYTES_PER_PIXEL};

/// Захват окна через xcap. xcap отдаёт RGBA, буфер заполняется в BGRA.
pub struct XcapCapture {
    target: Option<WindowHandle>,
}

impl XcapCapture {
    pub fn new() -> Self {
        Self { target: None }
    }

    fn find_target(target: WindowHandle) -> Result<Window> {
        Window::all()
            .map_err(|e| OverlayError::Capture(format!("xcap: не удалось получить список окон: {}", e)))?
            .into_iter()
            .find(|w| w.id().map(u64::from).ok() == Some(target.value()))
            .ok_or_else(|| OverlayError::Capture(format!("целевое окно {} больше не существует", target)))
    }
}

impl CaptureBackend for XcapCapture {
    fn name(&self) -> &'static str {
        "xcap"
    }

    fn init(&mut self, target: WindowHandle) -> Result<()> {
        Self::find_target(target)?;
        info!("xcap: захват привязан к окну {}", target);
        self.target = Some(target);
        Ok(())
    }

    fn grab(&mut self, buffer: &mut [u8], x: u32, y: u32, width: u32, height: u32) -> Result<()> {
        let target = self
            .target
            .ok_or_else(|| OverlayError::Capture("xcap: захват не инициализирован".to_string()))?;
        check_buffer(buffer, width, height)?;

        let image = Self::find_target(target)?
            .capture_image()
            .map_err(|e| OverlayError::Capture(format!("xcap: не удалось захватить окно {}: {}", target, e)))?;

        copy_region_bgra(&image, buffer, x, y, width, height);
        Ok(())
    }

    fn destroy(&mut self) {
        if let Some(target) = self.target.take() {
            debug!("xcap: захват окна {} освобождён", target);
        }
    }
}

/// Скопировать область изображения в BGRA-буфер; всё вне изображения - нули
fn copy_region_bgra(image: &RgbaImage, buffer: &mut [u8], x: u32, y: u32, width: u32, height: u32) {
    buffer.fill(0);

    let copy_width = image.width().saturating_sub(x).min(width) as usize;
    let copy_height = image.height().saturating_sub(y).min(height);
    if copy_width == 0 || copy_height == 0 {
        return;
    }

    let src_stride = image.width() as usize * BYTES_PER_PIXEL;
    let dst_stride = width as usize * BYTES_PER_PIXEL;
    let raw = image.as_raw();

    for row in 0..copy_height as usize {
        let src_start = (y as usize + row) * src_stride + x as usize * BYTES_PER_PIXEL;
        let src = &raw[src_start..src_start + copy_width * BYTES_PER_PIXEL];
        let dst = &mut buffer[row * dst_stride..row * dst_stride + copy_width * BYTES_PER_PIXEL];

        for (d, s) in dst.chunks_exact_mut(BYTES_PER_PIXEL).zip(src.chunks_exact(BYTES_PER_PIXEL)) {
            d[0] = s[2];
            d[1] = s[1];
            d[2] = s[0];
            d[3] = s[3];
        }
    }
}
