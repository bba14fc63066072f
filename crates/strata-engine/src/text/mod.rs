//! Text: font loading, a CPU glyph atlas and single-line shaping.

mod atlas;
mod font_system;
mod shaper;

pub use atlas::{AtlasError, AtlasGlyph, DirtyRegion, GlyphAtlas, GlyphKey};
pub use font_system::{FontId, FontLoadError, FontSystem, LineMetrics};
pub use shaper::{shape_line, ShapedGlyph};
