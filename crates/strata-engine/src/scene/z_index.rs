use core::cmp::Ordering;

/// Stacking order inside a z-group.
///
/// Higher values appear on top of lower values.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct ZIndex(pub i32);

impl ZIndex {
    #[inline]
    pub const fn new(v: i32) -> Self {
        Self(v)
    }
}

impl Ord for ZIndex {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl PartialOrd for ZIndex {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cross-cutting UI layer (normal content, overlays, modals...).
///
/// Every item of a higher group draws above every item of a lower group,
/// whatever their `ZIndex`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct ZGroup(pub i32);

impl ZGroup {
    pub const CONTENT: ZGroup = ZGroup(0);

    #[inline]
    pub const fn new(v: i32) -> Self {
        Self(v)
    }
}
