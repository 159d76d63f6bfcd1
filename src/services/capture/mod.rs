//! Native capture collaborator: fills a caller-owned BGRA buffer with the
//! client area of the target window. The caller reallocates the buffer when
//! the client size changes; a destroyed target surfaces as a capture error.

mod dry_run;
mod r#trait;
mod xcap;

pub use self::dry_run::DryRunCapture;
pub use self::r#trait::{create_capture_backend, CaptureBackend, BYTES_PER_PIXEL};
