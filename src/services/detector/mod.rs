//! Detector collaborator: turns one frame into raw boxes.
//!
//! The pipeline only depends on the [`Detector`] trait. Boxes coming out of a
//! detector are already filtered by the confidence threshold; normalization into
//! `Detection` happens in the pipeline.

mod color;
mod r#trait;

pub use self::color::{ColorClass, ColorDetector, ColorModel};
pub use self::r#trait::{create_detector, Detector};
