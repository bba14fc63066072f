use crate::coords::Rect;
use crate::paint::Color;
use crate::text::FontId;

use super::{ZGroup, ZIndex};

/// Index of a widget in the flat widget array.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct WidgetId(pub u32);

impl WidgetId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Border drawn as four edge quads around a widget.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Border {
    pub thickness: f32,
    pub color: Color,
}

/// A single line of text attached to a widget.
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub font: FontId,
    /// Font size in logical pixels.
    pub size: f32,
    pub color: Color,
}

impl TextRun {
    pub fn new(text: impl Into<String>, font: FontId, size: f32, color: Color) -> Self {
        Self { text: text.into(), font, size, color }
    }
}

/// Per-kind widget payload.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetKind {
    /// Background and border only.
    Panel,
    Label(TextRun),
    Button(TextRun),
    Checkbox {
        label: TextRun,
        checked: bool,
        box_color: Color,
        mark_color: Color,
    },
    Slider {
        min: f32,
        max: f32,
        value: f32,
        track: Color,
        fill: Color,
        knob: Color,
    },
    /// Vertical scrollbar along the widget's right edge.
    Scrollbar {
        /// Total scrollable extent in logical pixels.
        content: f32,
        /// Visible extent in logical pixels.
        visible: f32,
        /// Current scroll offset in logical pixels.
        offset: f32,
        width: f32,
        track: Color,
        thumb: Color,
    },
}

/// A materialized widget: geometry, stacking and visuals.
#[derive(Debug, Clone, PartialEq)]
pub struct Widget {
    /// Final rectangle in logical pixels.
    pub rect: Rect,
    pub z_group: ZGroup,
    pub z_index: ZIndex,
    /// Extra clip applied to this widget and everything below it.
    pub clip: Option<Rect>,
    /// Inner spacing between the rect and its text.
    pub padding: f32,
    pub background: Color,
    pub border: Option<Border>,
    pub kind: WidgetKind,
}

impl Widget {
    pub fn new(rect: Rect, kind: WidgetKind) -> Self {
        Self {
            rect,
            z_group: ZGroup::CONTENT,
            z_index: ZIndex(0),
            clip: None,
            padding: 0.0,
            background: Color::transparent(),
            border: None,
            kind,
        }
    }

    pub fn panel(rect: Rect, background: Color) -> Self {
        Self::new(rect, WidgetKind::Panel).with_background(background)
    }

    pub fn with_z(mut self, z_group: i32, z_index: i32) -> Self {
        self.z_group = ZGroup(z_group);
        self.z_index = ZIndex(z_index);
        self
    }

    pub fn with_clip(mut self, clip: Rect) -> Self {
        self.clip = Some(clip);
        self
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn with_border(mut self, thickness: f32, color: Color) -> Self {
        self.border = Some(Border { thickness, color });
        self
    }

    /// Text shown by this widget, if any.
    pub fn text(&self) -> Option<&TextRun> {
        match &self.kind {
            WidgetKind::Label(run) | WidgetKind::Button(run) => Some(run),
            WidgetKind::Checkbox { label, .. } => Some(label),
            WidgetKind::Panel | WidgetKind::Slider { .. } | WidgetKind::Scrollbar { .. } => None,
        }
    }
}
