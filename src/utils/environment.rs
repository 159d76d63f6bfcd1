use crate::error::Result;
use tracing::{info, warn};

/// Проверить, что процессу доступен графический сеанс
pub fn check_environment(dry_run: bool) -> Result<()> {
    info!("Проверка окружения...");

    if dry_run {
        info!("Dry-run: проверка дисплея пропущена");
        return Ok(());
    }

    check_display()?;
    warn_if_wayland();

    info!("Проверка окружения завершена успешно");
    Ok(())
}

#[cfg(target_os = "linux")]
fn check_display() -> Result<()> {
    let x11 = std::env::var("DISPLAY").ok();
    let wayland = std::env::var("WAYLAND_DISPLAY").ok();

    match session_summary(x11.as_deref(), wayland.as_deref()) {
        Some(summary) => {
            info!("Графический сеанс: {}", summary);
            Ok(())
        }
        None => Err(crate::error::OverlayError::WindowSystem(
            "Не заданы ни DISPLAY, ни WAYLAND_DISPLAY: нет графического сеанса".to_string(),
        )),
    }
}

/// Описание графического сеанса; `None`, если не задана ни одна переменная
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn session_summary(x11: Option<&str>, wayland: Option<&str>) -> Option<String> {
    let x11 = x11.filter(|v| !v.is_empty());
    let wayland = wayland.filter(|v| !v.is_empty());
    if x11.is_none() && wayland.is_none() {
        return None;
    }
    Some(format!(
        "DISPLAY={}, WAYLAND_DISPLAY={}",
        x11.unwrap_or("-"),
        wayland.unwrap_or("-")
    ))
}

#[cfg(not(target_os = "linux"))]
fn check_display() -> Result<()> {
    Ok(())
}

fn warn_if_wayland() {
    if std::env::var("XDG_SESSION_TYPE").map(|s| s == "wayland").unwrap_or(false) {
        warn!("Сеанс Wayland: координаты чужих окон и захват могут быть недоступны");
        warn!("   Используйте XWayland-окно игры или window.backend = \"xdotool\"");
    }
}

/// Рекомендации по запуску, выводятся при фатальной ошибке поиска окна
pub fn get_setup_hints(target_title: &str) -> Vec<String> {
    vec![
        format!("# Окно с заголовком '{}' должно быть открыто до запуска", target_title),
        "# Список окон и их заголовков:".to_string(),
        "xdotool search --name '.*' getwindowname %@".to_string(),
        "".to_string(),
        "# Заголовок можно передать аргументом:".to_string(),
        "balls-overlay --target '<заголовок окна>'".to_string(),
        "".to_string(),
        "# Проверка без реальных окон:".to_string(),
        "balls-overlay --dry-run".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_skips_display_check() {
        assert!(check_environment(true).is_ok());
    }

    #[test]
    fn test_session_summary() {
        assert_eq!(session_summary(None, None), None);
        assert_eq!(session_summary(Some(""), Some("")), None);
        assert_eq!(
            session_summary(Some(":0"), None).as_deref(),
            Some("DISPLAY=:0, WAYLAND_DISPLAY=-")
        );
        assert_eq!(
            session_summary(None, Some("wayland-0")).as_deref(),
            Some("DISPLAY=-, WAYLAND_DISPLAY=wayland-0")
        );
    }

    #[test]
    fn test_setup_hints() {
        let hints = get_setup_hints("abc.png");
        assert!(!hints.is_empty());
        assert!(hints.iter().any(|h| h.contains("abc.png")));
        assert!(hints.iter().any(|h| h.contains("--dry-run")));
    }
}
