use crate::model::{Point, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Коэффициент, с которым радиус вписывается в рамку
const RADIUS_FACTOR: f64 = 0.9;

/// Класс обнаруженного объекта. Классификация бинарная.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionKind {
    Ball,
    Hole,
}

impl DetectionKind {
    /// class_id 0 - шар, любой другой - луза
    pub fn from_class_id(class_id: u32) -> Self {
        if class_id == 0 {
            DetectionKind::Ball
        } else {
            DetectionKind::Hole
        }
    }
}

impl fmt::Display for DetectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionKind::Ball => write!(f, "Ball"),
            DetectionKind::Hole => write!(f, "Hole"),
        }
    }
}

/// Сырой результат детектора: углы рамки и класс. Порог уверенности уже применён.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBox {
    /// x1, y1, x2, y2
    pub corners: [f32; 4],
    pub class_id: u32,
    pub confidence: f32,
}

impl RawBox {
    pub fn new(corners: [f32; 4], class_id: u32, confidence: f32) -> Self {
        Self {
            corners,
            class_id,
            confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Detection {
    pub kind: DetectionKind,
    pub bbox: Rect,
    pub center: Point,
    pub radius: i32,
}

impl Detection {
    /// Нормализация сырой рамки: целочисленные углы, центр в середине рамки,
    /// радиус floor(min(w, h) / 2 * 0.9).
    pub fn from_raw(raw: &RawBox) -> Self {
        // `as` отбрасывает дробную часть и насыщает за пределами i32
        let [x1, y1, x2, y2] = raw.corners.map(|v| v as i32);
        let (left, right) = (x1.min(x2), x1.max(x2));
        let (top, bottom) = (y1.min(y2), y1.max(y2));

        let width = right.saturating_sub(left);
        let height = bottom.saturating_sub(top);

        let bbox = Rect::new(left, top, right, bottom);
        let center = Point::new(left + width / 2, top + height / 2);
        debug_assert!(bbox.contains(center));

        Self {
            kind: DetectionKind::from_class_id(raw.class_id),
            bbox,
            center,
            radius: Self::max_radius(&bbox),
        }
    }

    /// Верхняя граница радиуса для данной рамки
    pub fn max_radius(bbox: &Rect) -> i32 {
        (f64::from(bbox.width().min(bbox.height()) / 2) * RADIUS_FACTOR).floor() as i32
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bbox={} center={} r={}",
            self.kind, self.bbox, self.center, self.radius
        )
    }
}

/// Все детекции одного кадра. Единица замены: батчи никогда не объединяются.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetectionBatch {
    detections: Vec<Detection>,
    sequence: u64,
}

impl DetectionBatch {
    pub fn new(detections: Vec<Detection>, sequence: u64) -> Self {
        Self {
            detections,
            sequence,
        }
    }

    pub fn from_raw_boxes(boxes: &[RawBox], sequence: u64) -> Self {
        Self::new(boxes.iter().map(Detection::from_raw).collect(), sequence)
    }

    /// Номер кадра, из которого получен батч
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    pub fn len(&self) -> usize {
        self.detections.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }

    pub fn count_of(&self, kind: DetectionKind) -> usize {
        self.detections.iter().filter(|d| d.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_mapping_is_binary() {
        assert_eq!(DetectionKind::from_class_id(0), DetectionKind::Ball);
        assert_eq!(DetectionKind::from_class_id(1), DetectionKind::Hole);
        assert_eq!(DetectionKind::from_class_id(7), DetectionKind::Hole);
        assert_eq!(DetectionKind::from_class_id(u32::MAX), DetectionKind::Hole);
    }

    #[test]
    fn test_normalize_truncates_corners() {
        let det = Detection::from_raw(&RawBox::new([10.9, 20.2, 51.7, 40.99], 0, 0.8));
        assert_eq!(det.bbox, Rect::new(10, 20, 51, 40));
        // w = 41, h = 20 -> center (10 + 20, 20 + 10), r = floor(10 * 0.9)
        assert_eq!(det.center, Point::new(30, 30));
        assert_eq!(det.radius, 9);
        assert_eq!(det.kind, DetectionKind::Ball);
    }

    #[test]
    fn test_normalize_orders_swapped_corners() {
        let det = Detection::from_raw(&RawBox::new([60.0, 60.0, 20.0, 30.0], 3, 0.9));
        assert_eq!(det.bbox, Rect::new(20, 30, 60, 60));
        assert_eq!(det.kind, DetectionKind::Hole);
    }

    #[test]
    fn test_radius_and_center_invariants() {
        let samples = [
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 1.0],
            [5.0, 5.0, 6.0, 40.0],
            [100.0, 100.0, 300.0, 250.0],
            [-30.5, -10.0, 12.0, 3.0],
            [7.0, 3.0, 1000.0, 999.0],
        ];
        for corners in samples {
            let det = Detection::from_raw(&RawBox::new(corners, 0, 1.0));
            assert!(det.radius >= 0);
            assert!(det.radius <= Detection::max_radius(&det.bbox), "{}", det);
            assert!(det.bbox.contains(det.center), "{}", det);
        }
    }

    #[test]
    fn test_batch_preserves_order() {
        let boxes = [
            RawBox::new([0.0, 0.0, 10.0, 10.0], 1, 0.6),
            RawBox::new([20.0, 20.0, 30.0, 30.0], 0, 0.7),
        ];
        let batch = DetectionBatch::from_raw_boxes(&boxes, 3);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.sequence(), 3);
        assert_eq!(batch.detections()[0].kind, DetectionKind::Hole);
        assert_eq!(batch.detections()[1].kind, DetectionKind::Ball);
        assert_eq!(batch.count_of(DetectionKind::Ball), 1);
    }
}
