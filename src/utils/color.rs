use crate::model::DetectionKind;
use anyhow::Result;
use image::Rgba;

pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);
pub const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
pub const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Разобрать цвет вида `#RRGGBB` (решётка необязательна)
pub fn parse_hex_color(value: &str) -> Result<Rgba<u8>> {
    let hex = value.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        anyhow::bail!("ожидался цвет в формате #RRGGBB, получено '{}'", value);
    }

    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16);
    Ok(Rgba([channel(0..2)?, channel(2..4)?, channel(4..6)?, 255]))
}

/// Цвета отрисовки по классам и служебные цвета подписи
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub ball: Rgba<u8>,
    pub hole: Rgba<u8>,
    pub marker: Rgba<u8>,
    pub label: Rgba<u8>,
    pub label_outline: Rgba<u8>,
}

impl Palette {
    pub fn new(ball: Rgba<u8>, hole: Rgba<u8>) -> Self {
        Self {
            ball,
            hole,
            marker: WHITE,
            label: WHITE,
            label_outline: BLACK,
        }
    }

    pub fn color_for(&self, kind: DetectionKind) -> Rgba<u8> {
        match kind {
            DetectionKind::Ball => self.ball,
            DetectionKind::Hole => self.hole,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#00FF00").unwrap(), Rgba([0, 255, 0, 255]));
        assert_eq!(parse_hex_color("ff00ff").unwrap(), Rgba([255, 0, 255, 255]));
        assert!(parse_hex_color("#0F0").is_err());
        assert!(parse_hex_color("#GG0000").is_err());
        assert!(parse_hex_color("").is_err());
    }

    #[test]
    fn test_palette_lookup() {
        let palette = Palette::new(Rgba([0, 255, 0, 255]), Rgba([255, 0, 255, 255]));
        assert_eq!(palette.color_for(DetectionKind::Ball), Rgba([0, 255, 0, 255]));
        assert_eq!(palette.color_for(DetectionKind::Hole), Rgba([255, 0, 255, 255]));
    }
}
