use core::cmp::Ordering;

use super::{ZGroup, ZIndex};

/// Sort key for display items.
///
/// Ordering rules:
/// 1) `z_group`: ascending (overlays after content)
/// 2) `z_index`: ascending (back-to-front within a group)
/// 3) `appearance_order`: ascending (traversal order, always unique)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DisplayKey {
    pub z_group: ZGroup,
    pub z_index: ZIndex,
    /// Pre-sort traversal index; the final tie-break.
    pub appearance_order: u32,
}

impl DisplayKey {
    #[inline]
    pub const fn new(z_group: ZGroup, z_index: ZIndex, appearance_order: u32) -> Self {
        Self { z_group, z_index, appearance_order }
    }
}

impl Ord for DisplayKey {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.z_group
            .cmp(&other.z_group)
            .then(self.z_index.cmp(&other.z_index))
            .then(self.appearance_order.cmp(&other.appearance_order))
    }
}

impl PartialOrd for DisplayKey {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
