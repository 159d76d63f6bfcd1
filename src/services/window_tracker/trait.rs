use crate::config::Config;
use crate::error::{OverlayError, Result};
use crate::model::{Point, Rect, WindowHandle};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info};

/// Trait for window trackers backed by different window-system tools
pub trait WindowTracker: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &'static str;

    /// Find a window whose title matches exactly
    fn resolve(&self, title: &str) -> Result<WindowHandle>;

    fn is_minimized(&self, handle: WindowHandle) -> Result<bool>;

    /// Client rectangle in window coordinates (left = top = 0)
    fn client_rect(&self, handle: WindowHandle) -> Result<Rect>;

    /// Client-area origin in screen coordinates
    fn screen_origin(&self, handle: WindowHandle) -> Result<Point>;
}

/// Factory function to create the tracker selected in the config
pub fn create_window_tracker(config: &Config) -> Result<Arc<dyn WindowTracker>> {
    let tracker: Arc<dyn WindowTracker> = match config.window.backend.as_str() {
        "xcap" => Arc::new(super::xcap::XcapTracker::new()),
        "xdotool" => Arc::new(super::xdotool::XdotoolTracker::new()),
        "dry_run" => Arc::new(super::dry_run::DryRunTracker::from_config(config)),
        other => {
            return Err(OverlayError::Internal(format!(
                "Неизвестный бэкенд трекера окон: {}",
                other
            )))
        }
    };

    info!("Трекер окон: {}", tracker.name());
    Ok(tracker)
}

/// Найти окно по заголовку с ограниченным числом попыток.
///
/// Окно оверлея отображается оконной системой асинхронно, поэтому сразу после
/// создания его может ещё не быть в списке окон. Исчерпание попыток - та же
/// фатальная ошибка `WindowNotFound`.
pub async fn resolve_with_retry(
    tracker: &dyn WindowTracker,
    title: &str,
    attempts: u32,
    interval: Duration,
) -> Result<WindowHandle> {
    let attempts = attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        match tracker.resolve(title) {
            Ok(handle) => {
                info!("Окно '{}' найдено: {} (попытка {})", title, handle, attempt);
                return Ok(handle);
            }
            Err(OverlayError::WindowNotFound(msg)) => {
                debug!("Окно '{}' ещё не найдено (попытка {}/{})", title, attempt, attempts);
                last_error = Some(msg);
            }
            Err(e) => return Err(e),
        }

        if attempt < attempts {
            sleep(interval).await;
        }
    }

    Err(OverlayError::WindowNotFound(
        last_error.unwrap_or_else(|| title.to_string()),
    ))
}
