//! Compositor: places the captured client image of the target window into
//! the coordinate space of the overlay canvas.
//!
//! Pure functions, no OS access. The overlay canvas is always returned at the
//! overlay's current client size; only the part of the target that overlaps the
//! overlay is copied, everything else stays zero (black).

use crate::model::{Point, Size};
use image::RgbImage;

const CHANNELS: usize = 3;

/// Пересечение целевого окна с холстом оверлея
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRegion {
    /// Начало области в координатах холста
    pub dest: Point,
    /// Начало области в координатах захваченного изображения
    pub src: Point,
    pub width: u32,
    pub height: u32,
}

/// Посчитать область копирования. `None`, если окна не пересекаются.
pub fn plan(
    target_size: Size,
    target_origin: Point,
    overlay_size: Size,
    overlay_origin: Point,
) -> Option<CopyRegion> {
    let offset = target_origin - overlay_origin;

    let (dest_x, src_x, width) = axis(offset.x, target_size.width, overlay_size.width)?;
    let (dest_y, src_y, height) = axis(offset.y, target_size.height, overlay_size.height)?;

    Some(CopyRegion {
        dest: Point::new(dest_x, dest_y),
        src: Point::new(src_x, src_y),
        width,
        height,
    })
}

/// Одна ось: [max(0, off), min(overlay, off + target)) и начало источника max(0, -off)
fn axis(offset: i32, target_len: u32, overlay_len: u32) -> Option<(i32, i32, u32)> {
    let offset = i64::from(offset);
    let start = offset.max(0);
    let end = (offset + i64::from(target_len)).min(i64::from(overlay_len));
    if end <= start {
        return None;
    }
    let src = (-offset).max(0);
    Some((start as i32, src as i32, (end - start) as u32))
}

/// Собрать кадр размером с оверлей: пересечение скопировано, остальное нули
pub fn composite(
    target: &RgbImage,
    target_origin: Point,
    overlay_size: Size,
    overlay_origin: Point,
) -> RgbImage {
    let mut canvas = RgbImage::new(overlay_size.width, overlay_size.height);
    let target_size = Size::new(target.width(), target.height());

    let Some(region) = plan(target_size, target_origin, overlay_size, overlay_origin) else {
        return canvas;
    };

    let src_stride = target.width() as usize * CHANNELS;
    let dst_stride = overlay_size.width as usize * CHANNELS;
    let row_len = region.width as usize * CHANNELS;
    let src_raw = target.as_raw();
    let dst_raw: &mut [u8] = &mut canvas;

    for row in 0..region.height as usize {
        let src_start = (region.src.y as usize + row) * src_stride + region.src.x as usize * CHANNELS;
        let dst_start = (region.dest.y as usize + row) * dst_stride + region.dest.x as usize * CHANNELS;
        dst_raw[dst_start..dst_start + row_len].copy_from_slice(&src_raw[src_start..src_start + row_len]);
    }

    canvas
}
