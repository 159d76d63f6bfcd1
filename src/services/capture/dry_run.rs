use crate::error::{OverlayError, Result};
use crate::model::WindowHandle;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

use super::r#trait::{check_buffer, CaptureBackend, BYTES_PER_PIXEL};

/// Цвет сукна (BGRA)
const TABLE: [u8; 4] = [40, 90, 20, 255];
const BALL: [u8; 4] = [245, 245, 245, 255];
const HOLE: [u8; 4] = [5, 5, 5, 255];

/// Счётчики эмулятора, разделяемые с тестами и логами
#[derive(Debug, Default)]
pub struct DryRunStats {
    pub grabs: AtomicU64,
    pub destroys: AtomicUsize,
}

/// Эмулятор захвата: рисует бильярдный стол с лузами по углам и шаром,
/// который движется от кадра к кадру.
pub struct DryRunCapture {
    target: Option<WindowHandle>,
    stats: Arc<DryRunStats>,
}

impl DryRunCapture {
    pub fn new() -> Self {
        Self {
            target: None,
            stats: Arc::new(DryRunStats::default()),
        }
    }

    #[allow(dead_code)]
    pub fn stats(&self) -> Arc<DryRunStats> {
        Arc::clone(&self.stats)
    }
}

impl Default for DryRunCapture {
    fn default() -> Self {
        Self::new()
    }
}

fn fill_disc(buffer: &mut [u8], width: u32, height: u32, cx: i64, cy: i64, r: i64, color: [u8; 4]) {
    for y in (cy - r).max(0)..=(cy + r).min(height as i64 - 1) {
        for x in (cx - r).max(0)..=(cx + r).min(width as i64 - 1) {
            if (x - cx).pow(2) + (y - cy).pow(2) <= r * r {
                let offset = (y as usize * width as usize + x as usize) * BYTES_PER_PIXEL;
                buffer[offset..offset + BYTES_PER_PIXEL].copy_from_slice(&color);
            }
        }
    }
}

impl CaptureBackend for DryRunCapture {
    fn name(&self) -> &'static str {
        "dry_run"
    }

    fn init(&mut self, target: WindowHandle) -> Result<()> {
        info!("Dry-run: захват эмулируется для окна {}", target);
        self.target = Some(target);
        Ok(())
    }

    fn grab(&mut self, buffer: &mut [u8], _x: u32, _y: u32, width: u32, height: u32) -> Result<()> {
        if self.target.is_none() {
            return Err(OverlayError::Capture("dry-run: захват не инициализирован".to_string()));
        }
        check_buffer(buffer, width, height)?;

        let tick = self.stats.grabs.fetch_add(1, Ordering::Relaxed) as i64;

        for pixel in buffer.chunks_exact_mut(BYTES_PER_PIXEL) {
            pixel.copy_from_slice(&TABLE);
        }

        let (w, h) = (width as i64, height as i64);
        let hole_r = (w.min(h) / 20).max(3);
        // Лузы не касаются края: иначе они сольются с чёрным полем вокруг цели
        let inset = hole_r * 2;
        for (cx, cy) in [(inset, inset), (w - inset - 1, inset), (inset, h - inset - 1), (w - inset - 1, h - inset - 1)] {
            fill_disc(buffer, width, height, cx, cy, hole_r, HOLE);
        }

        // Шар ходит по горизонтали туда и обратно
        let ball_r = (hole_r * 2 / 3).max(2);
        let span = (w - 6 * hole_r).max(1);
        let phase = (tick * 4) % (2 * span);
        let offset = if phase < span { phase } else { 2 * span - phase };
        fill_disc(buffer, width, height, 3 * hole_r + offset, h / 2, ball_r, BALL);

        Ok(())
    }

    fn destroy(&mut self) {
        self.target = None;
        let destroys = self.stats.destroys.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            "Dry-run: захват остановлен после {} кадров (destroy #{})",
            self.stats.grabs.load(Ordering::Relaxed),
            destroys
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grab_draws_scene() {
        let mut capture = DryRunCapture::new();
        capture.init(WindowHandle(1)).unwrap();

        let (w, h) = (200u32, 100u32);
        let mut buffer = vec![0u8; (w * h) as usize * BYTES_PER_PIXEL];
        capture.grab(&mut buffer, 0, 0, w, h).unwrap();

        let pixel = |x: u32, y: u32| {
            let o = ((y * w + x) as usize) * BYTES_PER_PIXEL;
            [buffer[o], buffer[o + 1], buffer[o + 2], buffer[o + 3]]
        };
        assert_eq!(pixel(10, 10), HOLE);
        assert_eq!(pixel(0, 0), TABLE);
        assert_eq!(pixel(100, 20), TABLE);
        assert!(buffer.chunks_exact(4).any(|p| p == BALL));
        assert_eq!(capture.stats().grabs.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_grab_rejects_wrong_buffer() {
        let mut capture = DryRunCapture::new();
        capture.init(WindowHandle(1)).unwrap();
        let mut buffer = vec![0u8; 10];
        assert!(capture.grab(&mut buffer, 0, 0, 4, 4).is_err());
    }
}
