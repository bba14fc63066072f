use crate::coords::{Rect, Vec2};
use crate::paint::Color;
use crate::scene::{RenderPhase, WidgetId};

/// Sort key for render commands.
///
/// Ordering is lexicographic in field order: layer, widget order, phase,
/// ordinal. Upstream computes every field; nothing here invents order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RenderSortKey {
    pub layer: i32,
    pub widget_order: usize,
    pub phase: RenderPhase,
    pub ordinal: usize,
}

/// Flat-color quad, already resolved to device space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BackgroundCmd {
    pub device_box: Rect,
    pub device_clip: Option<Rect>,
    pub color: Color,
}

/// Glyph quad; clipped in logical space first so UVs can be trimmed.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphCmd {
    pub logical_box: Rect,
    pub logical_clip: Option<Rect>,
    pub uv_min: Vec2,
    pub uv_max: Vec2,
    pub color: Color,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CommandKind {
    Background(BackgroundCmd),
    Glyph(GlyphCmd),
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RenderCommand {
    pub key: RenderSortKey,
    pub widget: WidgetId,
    pub kind: CommandKind,
}
