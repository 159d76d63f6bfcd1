use crate::config::Config;
use crate::error::{OverlayError, Result};
use crate::model::{Point, Rect, WindowHandle};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

use super::r#trait::WindowTracker;

/// Геометрия окна, которое создаётся для неизвестного заголовка
const DEFAULT_RECT: Rect = Rect {
    left: 0,
    top: 0,
    right: 640,
    bottom: 480,
};

#[derive(Debug, Clone)]
struct FakeWindow {
    title: String,
    /// Клиентская область в экранных координатах
    screen_rect: Rect,
    minimized: bool,
}

/// Трекер-эмулятор: окна живут в памяти, их геометрию можно менять на лету
pub struct DryRunTracker {
    windows: RwLock<HashMap<u64, FakeWindow>>,
    next_id: AtomicU64,
    lenient: bool,
}

impl DryRunTracker {
    pub fn new() -> Self {
        Self {
            windows: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            lenient: true,
        }
    }

    /// Неизвестные заголовки дают `WindowNotFound` вместо создания окна
    #[allow(dead_code)]
    pub fn strict(mut self) -> Self {
        self.lenient = false;
        self
    }

    pub fn from_config(config: &Config) -> Self {
        info!("Dry-run режим - WindowTracker работает в режиме эмуляции");

        let tracker = Self::new();
        tracker.add_window(&config.window.target_title, config.window.dry_run.target);
        tracker.add_window(&config.overlay.title, config.window.dry_run.overlay);
        tracker
    }

    pub fn add_window(&self, title: &str, screen_rect: Rect) -> WindowHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.windows.write().insert(
            id,
            FakeWindow {
                title: title.to_string(),
                screen_rect,
                minimized: false,
            },
        );
        WindowHandle(id)
    }

    #[allow(dead_code)]
    pub fn set_minimized(&self, handle: WindowHandle, minimized: bool) {
        if let Some(window) = self.windows.write().get_mut(&handle.value()) {
            window.minimized = minimized;
        }
    }

    #[allow(dead_code)]
    pub fn set_rect(&self, handle: WindowHandle, screen_rect: Rect) {
        if let Some(window) = self.windows.write().get_mut(&handle.value()) {
            window.screen_rect = screen_rect;
        }
    }

    /// Переместить окно, сохранив размер
    #[allow(dead_code)]
    pub fn move_to(&self, handle: WindowHandle, origin: Point) {
        if let Some(window) = self.windows.write().get_mut(&handle.value()) {
            let rect = window.screen_rect;
            window.screen_rect = rect.translate(origin.x - rect.left, origin.y - rect.top);
        }
    }

    /// Эмулировать закрытие окна
    #[allow(dead_code)]
    pub fn remove(&self, handle: WindowHandle) {
        self.windows.write().remove(&handle.value());
    }

    fn window(&self, handle: WindowHandle) -> Result<FakeWindow> {
        self.windows
            .read()
            .get(&handle.value())
            .cloned()
            .ok_or_else(|| OverlayError::WindowNotFound(format!("окно {} закрыто", handle)))
    }
}

impl Default for DryRunTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowTracker for DryRunTracker {
    fn name(&self) -> &'static str {
        "dry_run"
    }

    fn resolve(&self, title: &str) -> Result<WindowHandle> {
        let existing = self
            .windows
            .read()
            .iter()
            .filter(|(_, w)| w.title == title)
            .map(|(id, _)| *id)
            .min();

        match existing {
            Some(id) => Ok(WindowHandle(id)),
            None if self.lenient => Ok(self.add_window(title, DEFAULT_RECT)),
            None => OverlayError::window_not_found(title),
        }
    }

    fn is_minimized(&self, handle: WindowHandle) -> Result<bool> {
        Ok(self.window(handle)?.minimized)
    }

    fn client_rect(&self, handle: WindowHandle) -> Result<Rect> {
        let size = self.window(handle)?.screen_rect.size();
        Ok(Rect::from_size(size.width, size.height))
    }

    fn screen_origin(&self, handle: WindowHandle) -> Result<Point> {
        Ok(self.window(handle)?.screen_rect.origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_registers_both_windows() {
        let config = Config::default();
        let tracker = DryRunTracker::from_config(&config);

        let target = tracker.resolve(&config.window.target_title).unwrap();
        let overlay = tracker.resolve(&config.overlay.title).unwrap();
        assert_ne!(target, overlay);

        assert_eq!(tracker.client_rect(target).unwrap(), Rect::new(0, 0, 640, 480));
        assert_eq!(tracker.screen_origin(target).unwrap(), Point::new(100, 100));
        assert_eq!(tracker.client_rect(overlay).unwrap(), Rect::new(0, 0, 1280, 960));
    }

    #[test]
    fn test_geometry_updates_are_visible() {
        let tracker = DryRunTracker::new();
        let handle = tracker.add_window("game", Rect::new(10, 20, 110, 70));
        assert!(!tracker.is_minimized(handle).unwrap());

        tracker.set_minimized(handle, true);
        tracker.set_rect(handle, Rect::new(0, 0, 300, 200));
        assert!(tracker.is_minimized(handle).unwrap());
        assert_eq!(tracker.client_rect(handle).unwrap().size().width, 300);

        tracker.move_to(handle, Point::new(-50, 40));
        assert_eq!(tracker.screen_origin(handle).unwrap(), Point::new(-50, 40));
        assert_eq!(tracker.client_rect(handle).unwrap(), Rect::new(0, 0, 300, 200));
    }

    #[test]
    fn test_removed_window_is_not_found() {
        let tracker = DryRunTracker::new();
        let handle = tracker.add_window("game", Rect::new(0, 0, 10, 10));
        tracker.remove(handle);
        assert!(matches!(
            tracker.client_rect(handle),
            Err(OverlayError::WindowNotFound(_))
        ));
    }

    #[test]
    fn test_lenient_resolve_creates_window() {
        let tracker = DryRunTracker::new();
        let handle = tracker.resolve("anything").unwrap();
        assert_eq!(tracker.resolve("anything").unwrap(), handle);

        let strict = DryRunTracker::new().strict();
        assert!(strict.resolve("anything").is_err());
    }
}
