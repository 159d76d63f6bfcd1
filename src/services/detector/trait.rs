use crate::config::Config;
use crate::error::{OverlayError, Result};
use crate::model::{Frame, RawBox};
use tracing::info;

use super::color::{ColorDetector, ColorModel};

/// Trait for object detectors
pub trait Detector: Send {
    fn name(&self) -> &'static str;

    /// Detect objects on a frame. Returned boxes are already confidence-filtered.
    fn detect(&mut self, frame: &Frame) -> Result<Vec<RawBox>>;
}

/// Factory function to create the detector selected in the config
pub fn create_detector(config: &Config) -> Result<Box<dyn Detector>> {
    let detector: Box<dyn Detector> = match config.detector.backend.as_str() {
        "color" => {
            let model = match &config.detector.model {
                Some(path) => ColorModel::load(path)?,
                None => ColorModel::default(),
            };
            Box::new(ColorDetector::new(model, &config.detector))
        }
        other => {
            return Err(OverlayError::Internal(format!(
                "Неизвестный бэкенд детектора: {}",
                other
            )))
        }
    };

    info!(
        "Детектор: {} (порог уверенности {})",
        detector.name(),
        config.detector.confidence_threshold
    );
    Ok(detector)
}
