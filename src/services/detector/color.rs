use crate::config::DetectorConfig;
use crate::error::{OverlayError, Result};
use crate::model::{Frame, RawBox};
use crate::trace_if_enabled;
use anyhow::Context;
use figment::{
    providers::{Format, Toml},
    Figment,
};
use image::RgbImage;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f32::consts::FRAC_PI_4;
use std::path::Path;
use tracing::info;

/// Диапазон цвета одного класса, границы включительно
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColorClass {
    pub class_id: u32,
    pub min: [u8; 3],
    pub max: [u8; 3],
}

impl ColorClass {
    fn matches(&self, rgb: &[u8]) -> bool {
        (0..3).all(|c| rgb[c] >= self.min[c] && rgb[c] <= self.max[c])
    }
}

/// Модель цветового детектора: классы проверяются по порядку, побеждает первый
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ColorModel {
    pub classes: Vec<ColorClass>,
}

impl Default for ColorModel {
    fn default() -> Self {
        Self {
            classes: vec![
                // Светлые шары
                ColorClass {
                    class_id: 0,
                    min: [200, 200, 200],
                    max: [255, 255, 255],
                },
                // Тёмные лузы
                ColorClass {
                    class_id: 1,
                    min: [0, 0, 0],
                    max: [40, 40, 40],
                },
            ],
        }
    }
}

impl ColorModel {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(OverlayError::Config(anyhow::anyhow!(
                "Файл модели детектора не найден: {:?}",
                path
            )));
        }

        let model: ColorModel = Figment::new()
            .merge(Toml::file(path))
            .extract()
            .with_context(|| format!("Не удалось прочитать модель детектора из {:?}", path))?;

        if model.classes.is_empty() {
            return Err(OverlayError::Config(anyhow::anyhow!(
                "Модель {:?} не содержит ни одного класса",
                path
            )));
        }

        info!("Модель детектора загружена из {:?}: {} классов", path, model.classes.len());
        Ok(model)
    }
}

/// Связная область одного класса
#[derive(Debug, Clone, Copy)]
struct Component {
    class: usize,
    area: usize,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
}

impl Component {
    fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }

    /// Округлость: пропорции рамки, умноженные на близость заполнения к pi/4
    fn confidence(&self) -> f32 {
        let (w, h) = (self.width() as f32, self.height() as f32);
        let aspect = w.min(h) / w.max(h);
        let fill = self.area as f32 / (w * h);
        let fill_score = (1.0 - (fill - FRAC_PI_4).abs() / FRAC_PI_4).clamp(0.0, 1.0);
        aspect * fill_score
    }
}

/// Детектор по цветовым порогам: маска классов, связные области, фильтр по форме
pub struct ColorDetector {
    model: ColorModel,
    confidence_threshold: f32,
    min_area: usize,
    max_area_ratio: f32,
}

impl ColorDetector {
    pub fn new(model: ColorModel, config: &DetectorConfig) -> Self {
        Self {
            model,
            confidence_threshold: config.confidence_threshold,
            min_area: config.min_area as usize,
            max_area_ratio: config.max_area_ratio,
        }
    }

    /// Маска: 0 - фон, k + 1 - класс с индексом k
    fn build_mask(&self, image: &RgbImage) -> Vec<u8> {
        let width = image.width() as usize;
        let mut mask = vec![0u8; width * image.height() as usize];
        if width == 0 {
            return mask;
        }
        let raw = image.as_raw();

        mask.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
            let line = &raw[y * width * 3..(y + 1) * width * 3];
            for (slot, rgb) in row.iter_mut().zip(line.chunks_exact(3)) {
                if let Some(idx) = self.model.classes.iter().position(|c| c.matches(rgb)) {
                    *slot = (idx + 1) as u8;
                }
            }
        });

        mask
    }

    /// 4-связная разметка областей обходом в ширину
    fn components(mask: &[u8], width: u32, height: u32) -> Vec<Component> {
        let (w, h) = (width as usize, height as usize);
        let mut visited = vec![false; mask.len()];
        let mut queue = VecDeque::new();
        let mut found = Vec::new();

        for start in 0..mask.len() {
            let label = mask[start];
            if label == 0 || visited[start] {
                continue;
            }

            let (sx, sy) = ((start % w) as u32, (start / w) as u32);
            let mut component = Component {
                class: label as usize - 1,
                area: 0,
                min_x: sx,
                min_y: sy,
                max_x: sx,
                max_y: sy,
            };

            visited[start] = true;
            queue.push_back(start);

            while let Some(idx) = queue.pop_front() {
                let (x, y) = (idx % w, idx / w);
                component.area += 1;
                component.min_x = component.min_x.min(x as u32);
                component.min_y = component.min_y.min(y as u32);
                component.max_x = component.max_x.max(x as u32);
                component.max_y = component.max_y.max(y as u32);

                let neighbours = [
                    (x > 0).then(|| idx - 1),
                    (x + 1 < w).then(|| idx + 1),
                    (y > 0).then(|| idx - w),
                    (y + 1 < h).then(|| idx + w),
                ];
                for next in neighbours.into_iter().flatten() {
                    if !visited[next] && mask[next] == label {
                        visited[next] = true;
                        queue.push_back(next);
                    }
                }
            }

            found.push(component);
        }

        found
    }
}

impl super::Detector for ColorDetector {
    fn name(&self) -> &'static str {
        "color"
    }

    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawBox>> {
        if self.model.classes.len() >= u8::MAX as usize {
            return Err(OverlayError::Detection(format!(
                "слишком много классов в модели: {}",
                self.model.classes.len()
            )));
        }

        let image = frame.pixels();
        let mask = self.build_mask(image);
        let max_area = (frame.size().area() as f32 * self.max_area_ratio) as usize;

        let boxes: Vec<RawBox> = Self::components(&mask, image.width(), image.height())
            .into_iter()
            .filter(|c| c.area >= self.min_area && c.area <= max_area)
            .filter_map(|c| {
                let confidence = c.confidence();
                (confidence >= self.confidence_threshold).then(|| {
                    RawBox::new(
                        [
                            c.min_x as f32,
                            c.min_y as f32,
                            (c.max_x + 1) as f32,
                            (c.max_y + 1) as f32,
                        ],
                        self.model.classes[c.class].class_id,
                        confidence,
                    )
                })
            })
            .collect();

        trace_if_enabled!("Кадр {}: найдено {} объектов", frame.sequence(), boxes.len());
        Ok(boxes)
    }
}
