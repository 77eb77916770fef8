//! Render backend implementations

pub mod headless;

pub use headless::{HeadlessBackend, RecordedFrame};
