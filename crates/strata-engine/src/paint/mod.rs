//! Color model shared by widgets, view models and vertex emission.
//!
//! Colors travel through the pipeline premultiplied and are copied verbatim
//! into vertices; blending in the pipeline assumes premultiplied alpha.

pub mod color;

pub use color::Color;
