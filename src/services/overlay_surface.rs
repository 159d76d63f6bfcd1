//! Overlay surface: the transparent, borderless, always-on-top window the
//! renderer presents its canvas to. Lives on the UI thread only.

use crate::error::{OverlayError, Result};
use crate::model::Size;
use image::RgbaImage;
use minifb::{Key, Window, WindowOptions};
use tracing::{debug, info};

/// Trait for overlay windows
pub trait OverlaySurface {
    /// Current client size; the renderer sizes its canvas from it
    fn client_size(&self) -> Size;

    /// Show a full canvas in one buffer swap
    fn present(&mut self, canvas: &RgbaImage) -> Result<()>;

    /// Process window events without changing the shown buffer
    fn pump(&mut self);

    /// `false` once the window is closed or Escape is pressed
    fn is_open(&self) -> bool;
}

pub struct MinifbSurface {
    window: Window,
    /// Упакованные пиксели ARGB, переиспользуются между кадрами
    buffer: Vec<u32>,
}

impl MinifbSurface {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        let options = WindowOptions {
            borderless: true,
            topmost: true,
            transparency: true,
            resize: true,
            ..WindowOptions::default()
        };

        let window = Window::new(title, width as usize, height as usize, options)
            .map_err(|e| OverlayError::Surface(format!("не удалось создать окно '{}': {}", title, e)))?;

        info!("Окно оверлея '{}' создано: {}x{}", title, width, height);
        Ok(Self {
            window,
            buffer: Vec::new(),
        })
    }
}

impl OverlaySurface for MinifbSurface {
    fn client_size(&self) -> Size {
        let (width, height) = self.window.get_size();
        Size::new(width as u32, height as u32)
    }

    fn present(&mut self, canvas: &RgbaImage) -> Result<()> {
        pack_argb(canvas, &mut self.buffer);
        self.window
            .update_with_buffer(&self.buffer, canvas.width() as usize, canvas.height() as usize)
            .map_err(|e| OverlayError::Surface(format!("не удалось показать холст: {}", e)))
    }

    fn pump(&mut self) {
        self.window.update();
    }

    fn is_open(&self) -> bool {
        self.window.is_open() && !self.window.is_key_down(Key::Escape)
    }
}

impl Drop for MinifbSurface {
    fn drop(&mut self) {
        debug!("Окно оверлея закрыто");
    }
}

/// RGBA -> 0xAARRGGBB
fn pack_argb(canvas: &RgbaImage, buffer: &mut Vec<u32>) {
    buffer.clear();
    buffer.extend(canvas.pixels().map(|p| {
        let [r, g, b, a] = p.0;
        (u32::from(a) << 24) | (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
    }));
}
