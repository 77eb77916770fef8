//! Foundation layer
//!
//! Building blocks shared by every other layer: `mdcla` math re-exports,
//! slot-map handles, arena and pool allocators, frame timing and logger
//! setup.

pub mod collections;
pub mod logging;
pub mod math;
pub mod memory;
pub mod time;
