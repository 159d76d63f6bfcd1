//! FrameSource: pull-based, rate-limited stream of composited frames.
//!
//! Every call to [`FrameSource::next_frame`] produces exactly one frame. When
//! a window is minimized or a capture fails, the last valid frame (or a blank
//! placeholder) is handed out instead, so the consumer never sees a gap. The
//! stream ends only when the stop signal is observed.

use crate::error::{OverlayError, Result};
use crate::model::{Frame, Size, WindowHandle};
use crate::services::capture::{CaptureBackend, BYTES_PER_PIXEL};
use crate::services::compositor;
use crate::services::pipeline_context::{PipelineContext, StopSignal};
use crate::services::window_tracker::WindowTracker;
use crate::{debug_if_enabled, trace_if_enabled};
use image::RgbImage;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Шаг ожидания, пока не истёк интервал кадра
const THROTTLE_STEP: Duration = Duration::from_millis(1);

/// Итог одной итерации внутреннего цикла
enum Tick {
    /// Интервал кадра ещё не истёк
    Throttled,
    /// Одно из окон свёрнуто
    Paused,
    Captured(Frame),
    Failed(OverlayError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSourceStats {
    pub captured: u64,
    pub substituted: u64,
    pub reallocations: u64,
}

pub struct FrameSource {
    tracker: Arc<dyn WindowTracker>,
    capture: Box<dyn CaptureBackend>,
    target: WindowHandle,
    overlay: WindowHandle,
    stop: StopSignal,
    interval: Duration,

    /// BGRA-буфер под текущий размер клиентской области цели
    buffer: Vec<u8>,
    buffer_size: Size,

    last_frame: Option<Frame>,
    last_capture: Option<Instant>,
    /// Момент, до которого следующий вызов должен подождать
    resume_at: Option<Instant>,
    sequence: u64,
    stats: FrameSourceStats,
    closed: bool,
}

impl FrameSource {
    /// Инициализировать захват цели. Ошибка инициализации фатальна.
    pub fn new(ctx: &PipelineContext, mut capture: Box<dyn CaptureBackend>) -> Result<Self> {
        let fps = ctx.config.capture.fps.max(1);
        capture.init(ctx.target)?;

        info!(
            "FrameSource: захват окна {} через {} ({} fps), оверлей {}",
            ctx.target,
            capture.name(),
            fps,
            ctx.overlay
        );

        Ok(Self {
            tracker: Arc::clone(&ctx.tracker),
            capture,
            target: ctx.target,
            overlay: ctx.overlay,
            stop: ctx.stop.clone(),
            interval: Duration::from_secs(1) / fps,
            buffer: Vec::new(),
            buffer_size: Size::default(),
            last_frame: None,
            last_capture: None,
            resume_at: None,
            sequence: 0,
            stats: FrameSourceStats::default(),
            closed: false,
        })
    }

    pub fn stats(&self) -> FrameSourceStats {
        self.stats
    }

    /// Следующий кадр. `None` - только после сигнала остановки или `close()`.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            if self.closed || self.stop.is_set() {
                return None;
            }

            if let Some(resume_at) = self.resume_at.take() {
                let wait = resume_at.saturating_duration_since(Instant::now());
                if !wait.is_zero() {
                    thread::sleep(wait);
                }
                if self.stop.is_set() {
                    return None;
                }
            }

            // Шаг отсчитывается от начала тика, в том числе неудачного
            let tick_start = Instant::now();
            match self.tick() {
                Tick::Throttled => {
                    thread::sleep(THROTTLE_STEP);
                }
                Tick::Paused => {
                    trace_if_enabled!("Окно свёрнуто, повтор последнего кадра");
                    self.resume_at = Some(tick_start + self.interval);
                    return Some(self.substitute());
                }
                Tick::Captured(frame) => {
                    self.resume_at = Some(tick_start + self.interval);
                    self.stats.captured += 1;
                    self.last_frame = Some(frame.clone());
                    return Some(frame);
                }
                Tick::Failed(e) => {
                    warn!("Не удалось захватить кадр: {}", e);
                    self.resume_at = Some(tick_start + self.interval);
                    return Some(self.substitute());
                }
            }
        }
    }

    /// Освободить нативный захват. Повторный вызов ничего не делает.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.capture.destroy();
        debug!("FrameSource закрыт, захват {} освобождён", self.capture.name());
    }

    fn tick(&mut self) -> Tick {
        if let Some(last) = self.last_capture {
            if last.elapsed() < self.interval {
                return Tick::Throttled;
            }
        }

        match self.any_minimized() {
            Ok(true) => return Tick::Paused,
            Ok(false) => {}
            Err(e) => return Tick::Failed(e),
        }

        self.last_capture = Some(Instant::now());
        match self.capture_frame() {
            Ok(frame) => Tick::Captured(frame),
            Err(e) => Tick::Failed(e),
        }
    }

    fn any_minimized(&self) -> Result<bool> {
        Ok(self.tracker.is_minimized(self.target)? || self.tracker.is_minimized(self.overlay)?)
    }

    fn capture_frame(&mut self) -> Result<Frame> {
        let size = self.tracker.client_rect(self.target)?.size();
        if size.is_empty() {
            return Err(OverlayError::Capture(format!(
                "клиентская область окна {} пуста ({})",
                self.target, size
            )));
        }

        if self.buffer.is_empty() || self.buffer_size != size {
            debug!("Буфер захвата: {} -> {}", self.buffer_size, size);
            self.buffer = vec![0u8; size.area() * BYTES_PER_PIXEL];
            self.buffer_size = size;
            self.stats.reallocations += 1;
        }

        self.capture
            .grab(&mut self.buffer, 0, 0, size.width, size.height)?;
        let image = bgra_to_rgb(&self.buffer, size);

        let target_origin = self.tracker.screen_origin(self.target)?;
        let overlay_size = self.tracker.client_rect(self.overlay)?.size();
        let overlay_origin = self.tracker.screen_origin(self.overlay)?;
        if overlay_size.is_empty() {
            return Err(OverlayError::Capture(format!(
                "клиентская область оверлея {} пуста",
                self.overlay
            )));
        }

        let pixels = compositor::composite(&image, target_origin, overlay_size, overlay_origin);
        self.sequence += 1;
        debug_if_enabled!(
            "Кадр {}: цель {} в {}, оверлей {} в {}",
            self.sequence,
            size,
            target_origin,
            overlay_size,
            overlay_origin
        );

        Ok(Frame::new(pixels, self.sequence))
    }

    fn substitute(&mut self) -> Frame {
        self.stats.substituted += 1;
        self.last_frame.clone().unwrap_or_else(Frame::placeholder)
    }
}

impl Drop for FrameSource {
    fn drop(&mut self) {
        self.close();
    }
}

/// BGRA -> RGB, альфа отбрасывается
fn bgra_to_rgb(buffer: &[u8], size: Size) -> RgbImage {
    let mut image = RgbImage::new(size.width, size.height);
    for (dst, src) in image.chunks_exact_mut(3).zip(buffer.chunks_exact(BYTES_PER_PIXEL)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::model::{Point, Rect};
    use crate::services::window_tracker::DryRunTracker;
    use parking_lot::Mutex;

    /// Что происходило с тестовым захватом
    #[derive(Debug, Default)]
    struct CaptureLog {
        grabs: Vec<(u32, u32)>,
        buffer_lens: Vec<usize>,
        destroys: usize,
        fail_next: bool,
    }

    /// Захват, заливающий буфер одним BGRA-цветом
    struct SolidCapture {
        bgra: [u8; 4],
        log: Arc<Mutex<CaptureLog>>,
    }

    impl CaptureBackend for SolidCapture {
        fn name(&self) -> &'static str {
            "solid"
        }

        fn init(&mut self, _target: WindowHandle) -> Result<()> {
            Ok(())
        }

        fn grab(&mut self, buffer: &mut [u8], _x: u32, _y: u32, width: u32, height: u32) -> Result<()> {
            let mut log = self.log.lock();
            if log.fail_next {
                log.fail_next = false;
                return Err(OverlayError::Capture("окно уничтожено".to_string()));
            }
            log.grabs.push((width, height));
            log.buffer_lens.push(buffer.len());
            for pixel in buffer.chunks_exact_mut(BYTES_PER_PIXEL) {
                pixel.copy_from_slice(&self.bgra);
            }
            Ok(())
        }

        fn destroy(&mut self) {
            self.log.lock().destroys += 1;
        }
    }

    struct Fixture {
        tracker: Arc<DryRunTracker>,
        target: WindowHandle,
        overlay: WindowHandle,
        ctx: PipelineContext,
        log: Arc<Mutex<CaptureLog>>,
    }

    fn fixture(fps: u32) -> Fixture {
        let tracker = Arc::new(DryRunTracker::new().strict());
        let target = tracker.add_window("abc.png", Rect::new(20, 10, 60, 40));
        let overlay = tracker.add_window("balls-overlay", Rect::new(0, 0, 80, 60));

        let mut config = Config::default();
        config.capture.fps = fps;
        let ctx = PipelineContext::new(Arc::new(config), tracker.clone(), target, overlay);

        Fixture {
            tracker,
            target,
            overlay,
            ctx,
            log: Arc::new(Mutex::new(CaptureLog::default())),
        }
    }

    fn source(fx: &Fixture) -> FrameSource {
        let capture = SolidCapture {
            bgra: [30, 20, 10, 255],
            log: fx.log.clone(),
        };
        FrameSource::new(&fx.ctx, Box::new(capture)).unwrap()
    }

    #[test]
    fn test_frames_are_composited_into_overlay_space() {
        let fx = fixture(240);
        let mut source = source(&fx);

        let frame = source.next_frame().unwrap();
        assert_eq!(frame.size(), Size::new(80, 60));
        assert_eq!(frame.sequence(), 1);
        // Цель 40x30 в (20, 10), BGRA -> RGB
        assert_eq!(frame.pixels().get_pixel(20, 10).0, [10, 20, 30]);
        assert_eq!(frame.pixels().get_pixel(59, 39).0, [10, 20, 30]);
        assert_eq!(frame.pixels().get_pixel(60, 40).0, [0, 0, 0]);
        assert_eq!(frame.pixels().get_pixel(19, 10).0, [0, 0, 0]);
    }

    #[test]
    fn test_minimized_before_first_capture_yields_placeholder() {
        let fx = fixture(240);
        fx.tracker.set_minimized(fx.target, true);
        let mut source = source(&fx);

        let frame = source.next_frame().unwrap();
        assert!(frame.is_placeholder());
        assert_eq!(frame.size(), Size::new(100, 100));
        assert!(fx.log.lock().grabs.is_empty());
    }

    #[test]
    fn test_minimized_repeats_last_frame_without_capture() {
        let fx = fixture(240);
        let mut source = source(&fx);
        let first = source.next_frame().unwrap();

        fx.tracker.set_minimized(fx.overlay, true);
        let repeated = source.next_frame().unwrap();
        let again = source.next_frame().unwrap();
        assert_eq!(repeated, first);
        assert_eq!(again, first);
        assert_eq!(fx.log.lock().grabs.len(), 1);

        fx.tracker.set_minimized(fx.overlay, false);
        let fresh = source.next_frame().unwrap();
        assert_eq!(fresh.sequence(), 2);
        assert_eq!(source.stats().substituted, 2);
    }

    #[test]
    fn test_resize_reallocates_buffer() {
        let fx = fixture(240);
        let mut source = source(&fx);
        source.next_frame().unwrap();
        source.next_frame().unwrap();

        fx.tracker.set_rect(fx.target, Rect::new(20, 10, 70, 30));
        let frame = source.next_frame().unwrap();

        let log = fx.log.lock();
        assert_eq!(log.grabs, vec![(40, 30), (40, 30), (50, 20)]);
        assert_eq!(log.buffer_lens, vec![40 * 30 * 4, 40 * 30 * 4, 50 * 20 * 4]);
        assert_eq!(source.stats().reallocations, 2);
        assert_eq!(frame.pixels().get_pixel(69, 29).0, [10, 20, 30]);
    }

    #[test]
    fn test_capture_failure_substitutes_last_frame() {
        let fx = fixture(240);
        let mut source = source(&fx);
        let first = source.next_frame().unwrap();

        fx.log.lock().fail_next = true;
        let substituted = source.next_frame().unwrap();
        assert_eq!(substituted, first);

        let next = source.next_frame().unwrap();
        assert_eq!(next.sequence(), 2);
        assert_eq!(source.stats().captured, 2);
        assert_eq!(source.stats().substituted, 1);
    }

    #[test]
    fn test_closed_target_is_a_transient_failure() {
        let fx = fixture(240);
        let mut source = source(&fx);
        fx.tracker.remove(fx.target);

        let frame = source.next_frame().unwrap();
        assert!(frame.is_placeholder());
    }

    #[test]
    fn test_closed_target_is_still_paced() {
        let fx = fixture(10);
        let mut source = source(&fx);
        fx.tracker.remove(fx.target);

        let started = Instant::now();
        let mut frames = 0;
        while started.elapsed() < Duration::from_millis(500) {
            assert!(source.next_frame().unwrap().is_placeholder());
            frames += 1;
        }
        // 10 кадров/с за 0.5 с: не больше шести тиков
        assert!(frames <= 6, "слишком много кадров: {}", frames);
        assert!(fx.log.lock().grabs.is_empty());
    }

    #[test]
    fn test_both_windows_minimized_pause_capture() {
        let fx = fixture(240);
        let mut source = source(&fx);
        let first = source.next_frame().unwrap();

        fx.tracker.set_minimized(fx.target, true);
        fx.tracker.set_minimized(fx.overlay, true);
        for _ in 0..3 {
            assert_eq!(source.next_frame().unwrap(), first);
        }
        assert_eq!(fx.log.lock().grabs.len(), 1);
        assert_eq!(source.stats().substituted, 3);

        fx.tracker.set_minimized(fx.overlay, false);
        assert_eq!(source.next_frame().unwrap(), first);
        assert_eq!(fx.log.lock().grabs.len(), 1);

        fx.tracker.set_minimized(fx.target, false);
        assert_eq!(source.next_frame().unwrap().sequence(), 2);
        assert_eq!(fx.log.lock().grabs.len(), 2);
    }

    #[test]
    fn test_zero_sized_target_is_a_failure() {
        let fx = fixture(240);
        fx.tracker.set_rect(fx.target, Rect::new(20, 10, 20, 10));
        let mut source = source(&fx);

        assert!(source.next_frame().unwrap().is_placeholder());
        assert!(fx.log.lock().grabs.is_empty());
    }

    #[test]
    fn test_moving_overlay_shifts_composition() {
        let fx = fixture(240);
        let mut source = source(&fx);
        fx.tracker.move_to(fx.overlay, Point::new(20, 10));

        let frame = source.next_frame().unwrap();
        assert_eq!(frame.pixels().get_pixel(0, 0).0, [10, 20, 30]);
        assert_eq!(frame.pixels().get_pixel(40, 0).0, [0, 0, 0]);
    }

    #[test]
    fn test_capture_rate_is_limited() {
        let fx = fixture(30);
        let mut source = source(&fx);

        let started = Instant::now();
        let mut frames = 0;
        while started.elapsed() < Duration::from_secs(1) {
            source.next_frame().unwrap();
            frames += 1;
        }

        let grabs = fx.log.lock().grabs.len();
        assert_eq!(grabs, frames);
        assert!(grabs <= 31, "слишком много захватов: {}", grabs);
        assert!(grabs >= 10, "слишком мало захватов: {}", grabs);
    }

    #[test]
    fn test_stop_signal_ends_stream() {
        let fx = fixture(240);
        let mut source = source(&fx);
        assert!(source.next_frame().is_some());

        fx.ctx.stop.signal();
        assert!(source.next_frame().is_none());
    }

    #[test]
    fn test_close_destroys_capture_once() {
        let fx = fixture(240);
        let mut source = source(&fx);
        source.next_frame().unwrap();

        source.close();
        source.close();
        assert!(source.next_frame().is_none());
        drop(source);

        assert_eq!(fx.log.lock().destroys, 1);
    }

    #[test]
    fn test_drop_destroys_capture() {
        let fx = fixture(240);
        drop(source(&fx));
        assert_eq!(fx.log.lock().destroys, 1);
    }
}
