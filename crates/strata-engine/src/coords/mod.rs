//! Coordinate and geometry types shared by composition, meshing and submission.
//!
//! Two spaces are in play:
//! - logical space: DPI-independent layout units, origin top-left, +Y down
//! - device space: logical scaled by the DPI factor, in framebuffer pixels
//!
//! `DeviceTransform` is the only bridge between the two.

mod rect;
mod transform;
mod vec2;
mod viewport;

pub use rect::Rect;
pub use transform::{DeviceTransform, Mat4};
pub use vec2::Vec2;
pub use viewport::Viewport;
