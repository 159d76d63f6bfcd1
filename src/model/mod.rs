pub mod detection;
pub mod frame;
pub mod geometry;

pub use detection::{Detection, DetectionBatch, DetectionKind, RawBox};
pub use frame::Frame;
pub use geometry::{Point, Rect, Size, WindowHandle};
