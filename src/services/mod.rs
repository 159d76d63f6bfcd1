pub mod batch_queue;
pub mod capture;
pub mod compositor;
pub mod detection_pipeline;
pub mod detector;
pub mod frame_source;
pub mod overlay_renderer;
pub mod overlay_surface;
pub mod pipeline_context;
pub mod window_tracker;

pub use capture::create_capture_backend;
pub use detection_pipeline::DetectionPipeline;
pub use detector::create_detector;
pub use frame_source::FrameSource;
pub use overlay_renderer::OverlayRenderer;
pub use overlay_surface::{MinifbSurface, OverlaySurface};
pub use pipeline_context::PipelineContext;
pub use window_tracker::{create_window_tracker, resolve_with_retry};
