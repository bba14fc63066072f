//! Layer packing: a widget's z-order plus a fixed sub-layer per visual part.
//!
//! Each widget owns a band of [`LAYER_STRIDE`] consecutive layers, so the
//! relative order of its border, fill, slider parts and text never depends
//! on emission order. The z-group is folded in above the z-index so a
//! higher group outranks any z-index of a lower one.

use super::{ZGroup, ZIndex};

pub const LAYER_STRIDE: i32 = 16;

/// Offset that lifts scrollbars above the content they scroll.
pub const Z_ORDER_SCALE: i32 = 1000;

/// Composite z span of one group: content z-indices plus the scrollbar band.
pub const GROUP_SPAN: i32 = Z_ORDER_SCALE * 2;

/// Visual part of a widget, in back-to-front order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum SubLayer {
    Border = 0,
    Fill = 1,
    SliderTrack = 2,
    SliderFill = 3,
    SliderKnob = 4,
    Text = 5,
    ScrollbarTrack = 14,
    ScrollbarThumb = 15,
}

impl SubLayer {
    #[inline]
    pub const fn offset(self) -> i32 {
        self as i32
    }

    #[inline]
    pub const fn is_scrollbar(self) -> bool {
        matches!(self, SubLayer::ScrollbarTrack | SubLayer::ScrollbarThumb)
    }
}

/// Packs `group`, `z` and `sub` into a single sortable layer.
///
/// z-indices are expected in `0..Z_ORDER_SCALE`; scrollbars take the upper
/// half of their group's span.
#[inline]
pub fn pack(group: ZGroup, z: ZIndex, sub: SubLayer) -> i32 {
    let mut band = group.0.saturating_mul(GROUP_SPAN).saturating_add(z.0);
    if sub.is_scrollbar() {
        band = band.saturating_add(Z_ORDER_SCALE);
    }
    band.saturating_mul(LAYER_STRIDE).saturating_add(sub.offset())
}
