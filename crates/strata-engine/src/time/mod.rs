//! Time subsystem.
//!
//! Provides stable, testable frame timing utilities without coupling to the runtime.
//! Intended usage:
//! - one `FrameClock` per window (or per render loop)
//! - call `tick()` once per presented frame to obtain `FrameTime`
//! - poll `take_report()` to drive periodic statistics

mod frame_clock;

pub use frame_clock::{FrameClock, FrameReport, FrameTime};
