use crate::coords::{Rect, Vec2};
use crate::paint::Color;

use super::WidgetId;

/// Draw category, used as a sort tie-break after layer and widget order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub enum RenderPhase {
    #[default]
    Background = 0,
    Content = 1,
    Overlay = 2,
}

/// Clip attached to a view model or glyph quad.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ClipRegion {
    /// Clip in logical pixels.
    pub logical: Rect,
    /// Precomputed device-space clip; resolved from `logical` when absent.
    pub device: Option<Rect>,
}

impl ClipRegion {
    #[inline]
    pub const fn logical(logical: Rect) -> Self {
        Self { logical, device: None }
    }
}

/// One flat-color quad.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewModel {
    pub widget: WidgetId,
    pub logical_box: Rect,
    pub clip: Option<ClipRegion>,
    pub layer: i32,
    pub phase: RenderPhase,
    pub widget_order: usize,
    pub ordinal: usize,
    pub color: Color,
}

/// One textured glyph quad sampling the glyph atlas.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphQuad {
    pub widget: WidgetId,
    pub logical_box: Rect,
    /// Atlas UV of `logical_box.min()`.
    pub uv_min: Vec2,
    /// Atlas UV of `logical_box.max()`.
    pub uv_max: Vec2,
    pub clip: Option<ClipRegion>,
    pub layer: i32,
    pub phase: RenderPhase,
    pub widget_order: usize,
    pub ordinal: usize,
    pub color: Color,
}
