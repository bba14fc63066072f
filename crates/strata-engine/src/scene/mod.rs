//! Scene composition: from a positioned widget tree to ordered view models.
//!
//! Responsibilities:
//! - walk the layout tree and record one display item per leaf widget
//! - deterministic paint order (z-group, z-index, traversal order)
//! - minimal clip push/pop deltas between neighbouring items
//! - expand items into layered view models and glyph quads

mod clip;
mod compositor;
mod display;
mod key;
pub mod layer;
mod tree;
mod view;
mod view_builder;
mod widget;
mod z_index;

pub use clip::{ClipStack, MAX_CLIP_DEPTH};
pub use compositor::Compositor;
pub use display::{common_prefix, DisplayItem, DisplayList, CLIP_EPSILON};
pub use key::DisplayKey;
pub use layer::SubLayer;
pub use tree::{Arrangement, LayoutNode, LayoutTree, NodeId};
pub use view::{ClipRegion, GlyphQuad, RenderPhase, ViewModel};
pub use view_builder::ViewBuilder;
pub use widget::{Border, TextRun, Widget, WidgetId, WidgetKind};
pub use z_index::{ZGroup, ZIndex};

/// Inputs for one frame: the positioned tree and its widgets.
#[derive(Debug, Clone, Default)]
pub struct UiScene {
    pub tree: LayoutTree,
    pub widgets: Vec<Widget>,
}

impl UiScene {
    pub fn clear(&mut self) {
        self.tree.clear();
        self.widgets.clear();
    }
}
