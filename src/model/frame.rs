use crate::model::Size;
use image::RgbImage;
use std::fmt;
use std::sync::Arc;

/// Сторона заглушки, которая отдаётся до первого успешного захвата
pub const PLACEHOLDER_SIDE: u32 = 100;

/// Скомпонованный кадр в координатах холста оверлея (3 канала RGB).
///
/// Пиксели разделяются через `Arc`: повтор последнего валидного кадра при
/// свёрнутых окнах не копирует буфер.
#[derive(Clone, PartialEq)]
pub struct Frame {
    pixels: Arc<RgbImage>,
    sequence: u64,
}

impl Frame {
    pub fn new(pixels: RgbImage, sequence: u64) -> Self {
        Self {
            pixels: Arc::new(pixels),
            sequence,
        }
    }

    /// Заполненная нулями заглушка 100x100
    pub fn placeholder() -> Self {
        Self::new(RgbImage::new(PLACEHOLDER_SIDE, PLACEHOLDER_SIDE), 0)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn size(&self) -> Size {
        Size::new(self.width(), self.height())
    }

    /// Порядковый номер захвата, неявная метка времени
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }

    #[allow(dead_code)]
    pub fn is_placeholder(&self) -> bool {
        self.sequence == 0
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("size", &self.size())
            .field("sequence", &self.sequence)
            .finish()
    }
}
