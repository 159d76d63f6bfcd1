use crate::error::{OverlayError, Result};
use crate::model::{Point, Rect, Size, WindowHandle};
use std::process::{Command, Output};
use tracing::debug;

use super::r#trait::WindowTracker;

pub struct XdotoolTracker;

impl XdotoolTracker {
    pub fn new() -> Self {
        Self
    }

    fn output(program: &str, args: &[&str]) -> Result<Output> {
        Command::new(program).args(args).output().map_err(|e| {
            debug!("{} не найден или не работает: {}", program, e);
            OverlayError::WindowSystem(format!("{} не найден: {}", program, e))
        })
    }

    fn run(program: &str, args: &[&str]) -> Result<String> {
        let output = Self::output(program, args)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("{} {:?} вернул ошибку: {}", program, args, stderr.trim());
            return Err(OverlayError::WindowSystem(format!(
                "{} вернул ошибку: {}",
                program,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn geometry(&self, handle: WindowHandle) -> Result<(Point, Size)> {
        let id = handle.value().to_string();
        let stdout = Self::run("xdotool", &["getwindowgeometry", "--shell", &id])
            // Для закрытого окна xdotool завершается с ошибкой BadWindow
            .map_err(|e| OverlayError::WindowNotFound(format!("окно {}: {}", handle, e)))?;
        parse_geometry_shell(&stdout)
    }
}

impl WindowTracker for XdotoolTracker {
    fn name(&self) -> &'static str {
        "xdotool"
    }

    fn resolve(&self, title: &str) -> Result<WindowHandle> {
        debug!("Попытка найти окно '{}' через xdotool", title);
        let pattern = format!("^{}$", escape_regex(title));

        // Пустой результат поиска xdotool сообщает ненулевым кодом выхода
        let output = Self::output("xdotool", &["search", "--name", &pattern])?;
        if !output.status.success() {
            return OverlayError::window_not_found(title);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        match parse_window_ids(&stdout).first() {
            Some(id) => {
                debug!("xdotool нашёл окно '{}': {}", title, id);
                Ok(WindowHandle(*id))
            }
            None => OverlayError::window_not_found(title),
        }
    }

    fn is_minimized(&self, handle: WindowHandle) -> Result<bool> {
        let id = handle.value().to_string();
        let stdout = Self::run("xprop", &["-id", &id, "_NET_WM_STATE"])?;
        Ok(parse_hidden_state(&stdout))
    }

    fn client_rect(&self, handle: WindowHandle) -> Result<Rect> {
        let (_, size) = self.geometry(handle)?;
        Ok(Rect::from_size(size.width, size.height))
    }

    fn screen_origin(&self, handle: WindowHandle) -> Result<Point> {
        let (origin, _) = self.geometry(handle)?;
        Ok(origin)
    }
}

/// Экранировать метасимволы регулярного выражения в заголовке
fn escape_regex(title: &str) -> String {
    let mut escaped = String::with_capacity(title.len());
    for ch in title.chars() {
        if "\\.+*?()|[]{}^$".contains(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Вывод `xdotool search`: по одному десятичному id на строку
fn parse_window_ids(stdout: &str) -> Vec<u64> {
    stdout
        .lines()
        .filter_map(|line| line.trim().parse::<u64>().ok())
        .collect()
}

/// Вывод `xdotool getwindowgeometry --shell`: строки KEY=VALUE
fn parse_geometry_shell(stdout: &str) -> Result<(Point, Size)> {
    let mut x = None;
    let mut y = None;
    let mut width = None;
    let mut height = None;

    for line in stdout.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "X" => x = value.parse::<i32>().ok(),
            "Y" => y = value.parse::<i32>().ok(),
            "WIDTH" => width = value.parse::<u32>().ok(),
            "HEIGHT" => height = value.parse::<u32>().ok(),
            _ => {}
        }
    }

    match (x, y, width, height) {
        (Some(x), Some(y), Some(width), Some(height)) => {
            Ok((Point::new(x, y), Size::new(width, height)))
        }
        _ => Err(OverlayError::WindowSystem(format!(
            "Неполный вывод getwindowgeometry: {:?}",
            stdout.trim()
        ))),
    }
}

/// Свёрнутое окно несёт атом _NET_WM_STATE_HIDDEN
fn parse_hidden_state(stdout: &str) -> bool {
    stdout
        .split_once('=')
        .map(|(_, atoms)| atoms.split(',').any(|atom| atom.trim() == "_NET_WM_STATE_HIDDEN"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_geometry_shell() {
        let stdout = "WINDOW=62914566\nX=100\nY=120\nWIDTH=200\nHEIGHT=150\nSCREEN=0\n";
        let (origin, size) = parse_geometry_shell(stdout).unwrap();
        assert_eq!(origin, Point::new(100, 120));
        assert_eq!(size, Size::new(200, 150));
    }

    #[test]
    fn test_parse_geometry_shell_negative_origin() {
        let stdout = "WINDOW=1\nX=-40\nY=-8\nWIDTH=800\nHEIGHT=600\n";
        let (origin, _) = parse_geometry_shell(stdout).unwrap();
        assert_eq!(origin, Point::new(-40, -8));
    }

    #[test]
    fn test_parse_geometry_shell_incomplete() {
        assert!(parse_geometry_shell("WINDOW=1\nX=0\n").is_err());
    }

    #[test]
    fn test_parse_window_ids() {
        assert_eq!(parse_window_ids("62914566\n71303175\n"), vec![62914566, 71303175]);
        assert!(parse_window_ids("").is_empty());
    }

    #[test]
    fn test_parse_hidden_state() {
        assert!(parse_hidden_state(
            "_NET_WM_STATE(ATOM) = _NET_WM_STATE_HIDDEN, _NET_WM_STATE_MAXIMIZED_VERT"
        ));
        assert!(!parse_hidden_state("_NET_WM_STATE(ATOM) = _NET_WM_STATE_FOCUSED"));
        assert!(!parse_hidden_state("_NET_WM_STATE:  not found."));
    }

    #[test]
    fn test_escape_regex() {
        assert_eq!(escape_regex("abc.png"), "abc\\.png");
        assert_eq!(escape_regex("Game (x64)"), "Game \\(x64\\)");
    }
}
