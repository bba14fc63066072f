//! Strata engine crate.
//!
//! Turns a positioned widget tree into depth-sorted, clipped vertex streams
//! and submits them through a double-buffered frame protocol. Also owns the
//! platform + GPU runtime pieces used by higher layers.

pub mod coords;
pub mod paint;
pub mod scene;
pub mod text;
pub mod render;
pub mod submit;
pub mod renderer;

pub mod device;
pub mod window;
pub mod time;
pub mod core;

pub mod logging;
