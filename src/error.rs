use thiserror::Error;

#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Окно не найдено: {0}")]
    WindowNotFound(String),

    #[error("Ошибка оконной системы: {0}")]
    WindowSystem(String),

    #[error("Ошибка захвата кадра: {0}")]
    Capture(String),

    #[error("Ошибка детекции: {0}")]
    Detection(String),

    #[error("Ошибка окна оверлея: {0}")]
    Surface(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl OverlayError {
    pub fn window_not_found<T>(title: impl Into<String>) -> Result<T> {
        Err(OverlayError::WindowNotFound(title.into()))
    }

    /// Транзиентные ошибки восстанавливаются внутри своего цикла и не завершают работу
    pub fn is_transient(&self) -> bool {
        matches!(self, OverlayError::Capture(_) | OverlayError::Detection(_))
    }
}

pub type Result<T> = std::result::Result<T, OverlayError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! overlay_error {
    (window_not_found, $($arg:tt)*) => {
        $crate::error::OverlayError::WindowNotFound(format!($($arg)*))
    };
    (window_system, $($arg:tt)*) => {
        $crate::error::OverlayError::WindowSystem(format!($($arg)*))
    };
    (capture, $($arg:tt)*) => {
        $crate::error::OverlayError::Capture(format!($($arg)*))
    };
    (detection, $($arg:tt)*) => {
        $crate::error::OverlayError::Detection(format!($($arg)*))
    };
    (surface, $($arg:tt)*) => {
        $crate::error::OverlayError::Surface(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::OverlayError::Internal(format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(overlay_error!(capture, "окно {} закрыто", 42).is_transient());
        assert!(overlay_error!(detection, "пустой кадр").is_transient());
        assert!(!overlay_error!(window_not_found, "abc.png").is_transient());
    }

    #[test]
    fn test_window_not_found_helper() {
        let result: Result<()> = OverlayError::window_not_found("abc.png");
        match result {
            Err(OverlayError::WindowNotFound(title)) => assert_eq!(title, "abc.png"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}
