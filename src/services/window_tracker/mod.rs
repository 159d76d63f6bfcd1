//! WindowTracker service: responsibility and boundaries
//!
//! This module and its submodules resolve OS window handles by title and answer
//! geometry queries about them: client size, client origin in screen space and
//! minimized state. Queries never mutate OS state. Capture, compositing and
//! rendering decisions live in FrameSource and OverlayRenderer.

mod dry_run;
mod r#trait;
mod xcap;
mod xdotool;

pub use self::dry_run::DryRunTracker;
pub use self::r#trait::{create_window_tracker, resolve_with_retry, WindowTracker};
