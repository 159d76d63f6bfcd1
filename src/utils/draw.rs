//! Примитивы отрисовки на RGBA-холсте оверлея.
//!
//! Все функции принимают координаты в i32 и молча отсекают всё, что выходит
//! за пределы холста: рамки детекций могут частично лежать вне оверлея.

use crate::model::{Point, Rect};
use font8x8::{UnicodeFonts, BASIC_FONTS};
use image::{Rgba, RgbaImage};

/// Ширина и высота глифа bitmap-шрифта
pub const GLYPH_SIZE: i32 = 8;

/// Смещения обводки подписи: четыре диагонали
const OUTLINE_OFFSETS: [(i32, i32); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];

#[inline]
fn put_pixel_clipped(img: &mut RgbaImage, x: i32, y: i32, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Контур прямоугольника толщиной 1 пиксель, обе границы включительно
pub fn draw_rect_outline(img: &mut RgbaImage, rect: &Rect, color: Rgba<u8>) {
    let (x0, x1) = (rect.left.min(rect.right), rect.left.max(rect.right));
    let (y0, y1) = (rect.top.min(rect.bottom), rect.top.max(rect.bottom));

    // Отсекаем заранее, чтобы не обходить огромные рамки попиксельно
    let w = img.width() as i32;
    let h = img.height() as i32;
    if x1 < 0 || y1 < 0 || x0 >= w || y0 >= h {
        return;
    }

    for x in x0.max(0)..=x1.min(w - 1) {
        put_pixel_clipped(img, x, y0, color);
        put_pixel_clipped(img, x, y1, color);
    }
    for y in y0.max(0)..=y1.min(h - 1) {
        put_pixel_clipped(img, x0, y, color);
        put_pixel_clipped(img, x1, y, color);
    }
}

/// Контур окружности (алгоритм средней точки)
pub fn draw_circle_outline(img: &mut RgbaImage, center: Point, radius: i32, color: Rgba<u8>) {
    if radius <= 0 {
        put_pixel_clipped(img, center.x, center.y, color);
        return;
    }
    if !circle_touches_canvas(img, center, radius) {
        return;
    }

    // i64: центр и радиус могут быть у границ i32
    let (cx, cy) = (i64::from(center.x), i64::from(center.y));
    let mut x = i64::from(radius);
    let mut y = 0i64;
    let mut err = 1 - x;

    while x >= y {
        for (dx, dy) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            put_pixel_clipped_wide(img, cx + dx, cy + dy, color);
        }

        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// Может ли контур окружности задеть холст
fn circle_touches_canvas(img: &RgbaImage, center: Point, radius: i32) -> bool {
    let (w, h) = (i64::from(img.width()), i64::from(img.height()));
    if w == 0 || h == 0 {
        return false;
    }
    let (cx, cy, r) = (i64::from(center.x), i64::from(center.y), i64::from(radius));

    // Рамка окружности целиком вне холста
    if cx + r < 0 || cy + r < 0 || cx - r >= w || cy - r >= h {
        return false;
    }

    // Холст целиком внутри окружности: дальний угол ближе внутреннего края контура
    let far_x = i128::from(cx.abs().max((cx - (w - 1)).abs()));
    let far_y = i128::from(cy.abs().max((cy - (h - 1)).abs()));
    let inner = i128::from(r - 1);
    far_x * far_x + far_y * far_y >= inner * inner
}

fn put_pixel_clipped_wide(img: &mut RgbaImage, x: i64, y: i64, color: Rgba<u8>) {
    if x >= 0 && y >= 0 && x < i64::from(img.width()) && y < i64::from(img.height()) {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Закрашенный диск; при radius = 1 получается квадрат 3x3
pub fn fill_disc(img: &mut RgbaImage, center: Point, radius: i32, color: Rgba<u8>) {
    let radius = radius.max(0);
    let limit = radius * radius + radius;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= limit {
                put_pixel_clipped(img, center.x + dx, center.y + dy, color);
            }
        }
    }
}

/// Текст bitmap-шрифтом 8x8, левый верхний угол в (x, y)
pub fn draw_text(img: &mut RgbaImage, x: i32, y: i32, text: &str, color: Rgba<u8>) {
    let mut cursor_x = x;
    for ch in text.chars() {
        let Some(glyph) = BASIC_FONTS.get(ch).or_else(|| BASIC_FONTS.get('?')) else {
            cursor_x += GLYPH_SIZE;
            continue;
        };

        for (row_idx, &row) in glyph.iter().enumerate() {
            for col_idx in 0..GLYPH_SIZE {
                if (row >> col_idx) & 1 == 1 {
                    put_pixel_clipped(img, cursor_x + col_idx, y + row_idx as i32, color);
                }
            }
        }
        cursor_x += GLYPH_SIZE;
    }
}

/// Подпись с тёмной обводкой под светлой заливкой: читается на любом фоне
pub fn draw_outlined_text(
    img: &mut RgbaImage,
    x: i32,
    y: i32,
    text: &str,
    fill: Rgba<u8>,
    outline: Rgba<u8>,
) {
    for (dx, dy) in OUTLINE_OFFSETS {
        draw_text(img, x + dx, y + dy, text, outline);
    }
    draw_text(img, x, y, text, fill);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::color::{BLACK, TRANSPARENT, WHITE};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn opaque_count(img: &RgbaImage) -> usize {
        img.pixels().filter(|p| p.0[3] != 0).count()
    }

    #[test]
    fn test_rect_outline_draws_only_border() {
        let mut img = RgbaImage::new(20, 20);
        draw_rect_outline(&mut img, &Rect::new(2, 3, 10, 8), RED);

        assert_eq!(*img.get_pixel(2, 3), RED);
        assert_eq!(*img.get_pixel(10, 8), RED);
        assert_eq!(*img.get_pixel(6, 3), RED);
        assert_eq!(*img.get_pixel(6, 5), TRANSPARENT);
        // периметр 9x6: 2*9 + 2*4
        assert_eq!(opaque_count(&img), 26);
    }

    #[test]
    fn test_rect_outline_clips_off_canvas() {
        let mut img = RgbaImage::new(10, 10);
        draw_rect_outline(&mut img, &Rect::new(-5, -5, 4, 4), RED);
        assert_eq!(*img.get_pixel(4, 0), RED);
        assert_eq!(*img.get_pixel(0, 4), RED);

        let mut img = RgbaImage::new(10, 10);
        draw_rect_outline(&mut img, &Rect::new(50, 50, 60, 60), RED);
        assert_eq!(opaque_count(&img), 0);
    }

    #[test]
    fn test_circle_outline_is_symmetric() {
        let mut img = RgbaImage::new(21, 21);
        draw_circle_outline(&mut img, Point::new(10, 10), 5, RED);

        assert_eq!(*img.get_pixel(15, 10), RED);
        assert_eq!(*img.get_pixel(5, 10), RED);
        assert_eq!(*img.get_pixel(10, 15), RED);
        assert_eq!(*img.get_pixel(10, 5), RED);
        assert_eq!(*img.get_pixel(10, 10), TRANSPARENT);
    }

    #[test]
    fn test_circle_outline_off_canvas_is_skipped() {
        let mut img = RgbaImage::new(16, 16);
        draw_circle_outline(&mut img, Point::new(100, 100), 20, RED);
        draw_circle_outline(&mut img, Point::new(i32::MAX - 1, i32::MAX - 1), 1000, RED);
        draw_circle_outline(&mut img, Point::new(i32::MIN + 1, 8), i32::MAX - 10, RED);
        // Холст внутри окружности: контур его не касается
        draw_circle_outline(&mut img, Point::new(8, 8), 1_000_000, RED);
        assert_eq!(opaque_count(&img), 0);

        // Частично видимая окружность рисуется
        draw_circle_outline(&mut img, Point::new(-3, 8), 5, RED);
        assert_eq!(*img.get_pixel(2, 8), RED);
    }

    #[test]
    fn test_marker_is_three_by_three() {
        let mut img = RgbaImage::new(5, 5);
        fill_disc(&mut img, Point::new(2, 2), 1, WHITE);
        assert_eq!(opaque_count(&img), 9);
        assert_eq!(*img.get_pixel(1, 1), WHITE);
        assert_eq!(*img.get_pixel(0, 0), TRANSPARENT);
    }

    #[test]
    fn test_outlined_text_keeps_fill_on_top() {
        let mut img = RgbaImage::new(20, 20);
        draw_outlined_text(&mut img, 5, 5, "1", WHITE, BLACK);

        let white = img.pixels().filter(|p| **p == WHITE).count();
        let black = img.pixels().filter(|p| **p == BLACK).count();
        assert!(white > 0);
        assert!(black > 0);
    }
}
