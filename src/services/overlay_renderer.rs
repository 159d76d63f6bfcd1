//! OverlayRenderer: UI-side consumer of detection batches.
//!
//! On each tick the renderer takes the newest queued batch, if any, and
//! redraws the whole overlay from it. Without a new batch nothing is presented
//! and the surface keeps showing the previous canvas, unless the overlay was
//! resized: then the last batch is redrawn at the new size.

use crate::error::Result;
use crate::model::{Detection, DetectionBatch, DetectionKind, Point, Size};
use crate::services::batch_queue::BatchReceiver;
use crate::services::overlay_surface::OverlaySurface;
use crate::{debug_if_enabled, trace_if_enabled};
use crate::utils::color::{Palette, TRANSPARENT};
use crate::utils::draw::{draw_circle_outline, draw_outlined_text, draw_rect_outline, fill_disc};
use image::RgbaImage;
use tracing::warn;

/// Смещение подписи от левого верхнего угла рамки
const LABEL_OFFSET: i32 = 5;
/// Радиус метки центра: закрашенный квадрат 3x3
const MARKER_RADIUS: i32 = 1;

pub struct OverlayRenderer {
    receiver: BatchReceiver,
    palette: Palette,
    presented: u64,
    last_batch: Option<DetectionBatch>,
    /// Размер последнего показанного холста
    last_size: Option<Size>,
}

impl OverlayRenderer {
    pub fn new(receiver: BatchReceiver, palette: Palette) -> Self {
        Self {
            receiver,
            palette,
            presented: 0,
            last_batch: None,
            last_size: None,
        }
    }

    /// Сколько холстов показано
    pub fn presented(&self) -> u64 {
        self.presented
    }

    /// Один тик UI: забрать последний батч и перерисовать оверлей
    pub fn tick(&mut self, surface: &mut dyn OverlaySurface) {
        let size = surface.client_size();
        match self.receiver.drain_latest() {
            // Пустой батч тоже рисуется: оверлей очищается
            Some(batch) => self.last_batch = Some(batch),
            None if self.last_size != Some(size) && self.last_batch.is_some() => {
                debug_if_enabled!("Размер оверлея изменился: {}, перерисовка", size);
            }
            None => return,
        }
        let Some(batch) = self.last_batch.as_ref() else {
            return;
        };

        let canvas = self.render(batch, size.width, size.height);
        let (sequence, balls, holes) = (
            batch.sequence(),
            batch.count_of(DetectionKind::Ball),
            batch.count_of(DetectionKind::Hole),
        );

        if let Err(e) = self.present(surface, &canvas) {
            warn!("Не удалось обновить оверлей: {}", e);
            return;
        }
        self.last_size = Some(size);
        trace_if_enabled!(
            "Оверлей обновлён: кадр {}, шаров {}, луз {}",
            sequence,
            balls,
            holes
        );
    }

    /// Нарисовать батч на новом прозрачном холсте
    pub fn render(&self, batch: &DetectionBatch, width: u32, height: u32) -> RgbaImage {
        let mut canvas = RgbaImage::from_pixel(width, height, TRANSPARENT);
        for (idx, detection) in batch.detections().iter().enumerate() {
            self.draw_detection(&mut canvas, detection, idx + 1);
        }
        canvas
    }

    fn draw_detection(&self, canvas: &mut RgbaImage, detection: &Detection, label: usize) {
        let color = self.palette.color_for(detection.kind);

        draw_rect_outline(canvas, &detection.bbox, color);
        draw_circle_outline(canvas, detection.center, detection.radius, color);
        fill_disc(canvas, detection.center, MARKER_RADIUS, self.palette.marker);

        let origin = Point::new(detection.bbox.left + LABEL_OFFSET, detection.bbox.top + LABEL_OFFSET);
        draw_outlined_text(
            canvas,
            origin.x,
            origin.y,
            &label.to_string(),
            self.palette.label,
            self.palette.label_outline,
        );
    }

    fn present(&mut self, surface: &mut dyn OverlaySurface, canvas: &RgbaImage) -> Result<()> {
        surface.present(canvas)?;
        self.presented += 1;
        Ok(())
    }
}
