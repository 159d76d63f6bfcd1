use crate::error::{OverlayError, Result};
use crate::model::{Point, Rect, WindowHandle};
use tracing::debug;
use ::xcap::Window;

use super::r#trait::WindowTracker;

/// Трекер на базе xcap: окна перечисляются заново на каждый запрос,
/// поэтому закрытое окно сразу проявляется как `WindowNotFound`.
pub struct XcapTracker;

impl XcapTracker {
    pub fn new() -> Self {
        Self
    }

    fn all_windows() -> Result<Vec<Window>> {
        Window::all().map_err(|e| OverlayError::WindowSystem(format!("xcap: не удалось получить список окон: {}", e)))
    }

    fn find(handle: WindowHandle) -> Result<Window> {
        Self::all_windows()?
            .into_iter()
            .find(|w| w.id().map(u64::from).ok() == Some(handle.value()))
            .ok_or_else(|| OverlayError::WindowNotFound(format!("окно {} закрыто", handle)))
    }
}

fn query_error(what: &str, handle: WindowHandle, e: impl std::fmt::Display) -> OverlayError {
    OverlayError::WindowSystem(format!("xcap: не удалось получить {} окна {}: {}", what, handle, e))
}

impl WindowTracker for XcapTracker {
    fn name(&self) -> &'static str {
        "xcap"
    }

    fn resolve(&self, title: &str) -> Result<WindowHandle> {
        debug!("Поиск окна '{}' через xcap", title);

        let window = Self::all_windows()?
            .into_iter()
            .find(|w| w.title().map(|t| t == title).unwrap_or(false));

        match window {
            Some(window) => {
                let id = window
                    .id()
                    .map_err(|e| OverlayError::WindowSystem(format!("xcap: нет id у окна '{}': {}", title, e)))?;
                Ok(WindowHandle(u64::from(id)))
            }
            None => OverlayError::window_not_found(title),
        }
    }

    fn is_minimized(&self, handle: WindowHandle) -> Result<bool> {
        Self::find(handle)?
            .is_minimized()
            .map_err(|e| query_error("состояние", handle, e))
    }

    fn client_rect(&self, handle: WindowHandle) -> Result<Rect> {
        let window = Self::find(handle)?;
        let width = window.width().map_err(|e| query_error("ширину", handle, e))?;
        let height = window.height().map_err(|e| query_error("высоту", handle, e))?;
        Ok(Rect::from_size(width, height))
    }

    fn screen_origin(&self, handle: WindowHandle) -> Result<Point> {
        let window = Self::find(handle)?;
        let x = window.x().map_err(|e| query_error("позицию", handle, e))?;
        let y = window.y().map_err(|e| query_error("позицию", handle, e))?;
        Ok(Point::new(x, y))
    }
}
