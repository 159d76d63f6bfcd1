//! DetectionPipeline: the background worker.
//!
//! Pulls frames from [`FrameSource`], runs the detector, normalizes the raw
//! boxes and publishes one [`DetectionBatch`] per frame to the bounded queue.
//! Publishing never blocks; a full queue means the new batch is discarded.

use crate::model::DetectionBatch;
use crate::services::batch_queue::{BatchSender, PublishOutcome};
use crate::services::detector::Detector;
use crate::services::frame_source::FrameSource;
use crate::services::pipeline_context::{PipelineContext, StopSignal};
use crate::{debug_if_enabled, trace_if_enabled};
use std::io;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info, warn};

/// Имя потока воркера
pub const WORKER_THREAD_NAME: &str = "detection-worker";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub processed: u64,
    pub published: u64,
    pub dropped: u64,
    pub failed: u64,
}

pub struct DetectionPipeline {
    frames: FrameSource,
    detector: Box<dyn Detector>,
    sender: BatchSender,
    stop: StopSignal,
    yield_interval: Duration,
    stats: PipelineStats,
}

impl DetectionPipeline {
    pub fn new(ctx: &PipelineContext, frames: FrameSource, detector: Box<dyn Detector>) -> Self {
        Self {
            frames,
            detector,
            sender: ctx.publisher(),
            stop: ctx.stop.clone(),
            yield_interval: Duration::from_millis(ctx.config.pipeline.worker_yield_ms),
            stats: PipelineStats::default(),
        }
    }

    /// Запустить цикл в отдельном именованном потоке
    pub fn spawn(self) -> io::Result<JoinHandle<PipelineStats>> {
        thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || self.run())
    }

    /// Цикл воркера; возвращается после сигнала остановки
    pub fn run(mut self) -> PipelineStats {
        info!("Воркер детекции запущен (детектор {})", self.detector.name());

        while let Some(frame) = self.frames.next_frame() {
            self.stats.processed += 1;

            match self.detector.detect(&frame) {
                Ok(boxes) => {
                    let batch = DetectionBatch::from_raw_boxes(&boxes, frame.sequence());
                    trace_if_enabled!("Кадр {}: {} детекций", frame.sequence(), batch.len());
                    self.publish(batch);
                }
                Err(e) if e.is_transient() => {
                    self.stats.failed += 1;
                    warn!("Ошибка детекции на кадре {}: {}", frame.sequence(), e);
                }
                Err(e) => {
                    self.stats.failed += 1;
                    error!("Детектор вернул ошибку на кадре {}: {}", frame.sequence(), e);
                }
            }

            if self.stop.is_set() {
                break;
            }
            if !self.yield_interval.is_zero() {
                thread::sleep(self.yield_interval);
            }
        }

        self.frames.close();
        let frames = self.frames.stats();
        info!(
            "Кадры: захвачено {}, подставлено {}, перевыделений буфера {}",
            frames.captured, frames.substituted, frames.reallocations
        );
        info!(
            "Воркер детекции остановлен: обработано {}, опубликовано {}, отброшено {}, ошибок {}",
            self.stats.processed, self.stats.published, self.stats.dropped, self.stats.failed
        );
        self.stats
    }

    fn publish(&mut self, batch: DetectionBatch) {
        match self.sender.try_publish(batch) {
            PublishOutcome::Published => self.stats.published += 1,
            PublishOutcome::Dropped => self.stats.dropped += 1,
            PublishOutcome::Disconnected => {
                self.stats.dropped += 1;
                debug_if_enabled!("Рендерер отключён, батч не доставлен");
            }
        }
    }
}
