use crate::config::Config;
use crate::error::{OverlayError, Result};
use crate::model::WindowHandle;
use tracing::info;

/// BGRA
pub const BYTES_PER_PIXEL: usize = 4;

/// Trait for native capture backends
pub trait CaptureBackend: Send {
    fn name(&self) -> &'static str;

    /// Bind the backend to the target window
    fn init(&mut self, target: WindowHandle) -> Result<()>;

    /// Write BGRA pixels of the client region into `buffer`
    /// (`buffer.len() == width * height * 4`)
    fn grab(&mut self, buffer: &mut [u8], x: u32, y: u32, width: u32, height: u32) -> Result<()>;

    /// Release native resources. Called exactly once by the owning FrameSource.
    fn destroy(&mut self);
}

/// Factory function to create the capture backend selected in the config
pub fn create_capture_backend(config: &Config) -> Result<Box<dyn CaptureBackend>> {
    let backend: Box<dyn CaptureBackend> = match config.capture.backend.as_str() {
        "xcap" => Box::new(super::xcap::XcapCapture::new()),
        "dry_run" => Box::new(super::dry_run::DryRunCapture::new()),
        other => {
            return Err(OverlayError::Internal(format!(
                "Неизвестный бэкенд захвата: {}",
                other
            )))
        }
    };

    info!("Бэкенд захвата: {}", backend.name());
    Ok(backend)
}

/// Проверить, что буфер соответствует запрошенной области
pub(super) fn check_buffer(buffer: &[u8], width: u32, height: u32) -> Result<()> {
    let expected = width as usize * height as usize * BYTES_PER_PIXEL;
    if buffer.len() != expected {
        return Err(OverlayError::Capture(format!(
            "Размер буфера {} не совпадает с областью {}x{} ({} байт)",
            buffer.len(),
            width,
            height,
            expected
        )));
    }
    Ok(())
}
