use crate::coords::Rect;

/// Maximum number of nested clip rectangles tracked at once.
pub const MAX_CLIP_DEPTH: usize = 16;

/// Nested clip rectangles for a tree walk or a display-list replay.
///
/// `rects` holds the rectangles as pushed; `active` holds the running
/// intersection so `active()` is O(1). Pushes past [`MAX_CLIP_DEPTH`] are
/// dropped, and the matching pops are swallowed so push/pop pairs stay
/// balanced.
#[derive(Debug, Clone, Default)]
pub struct ClipStack {
    rects: Vec<Rect>,
    active: Vec<Rect>,
    overflow: usize,
    dropped: usize,
}

impl ClipStack {
    #[inline]
    pub fn new() -> Self {
        Self {
            rects: Vec::with_capacity(MAX_CLIP_DEPTH),
            active: Vec::with_capacity(MAX_CLIP_DEPTH),
            overflow: 0,
            dropped: 0,
        }
    }

    /// Pushes `rect`, intersecting it with the current active rectangle.
    ///
    /// The active rectangle is snapped inward to whole pixels before the
    /// intersection. An empty result becomes [`Rect::ZERO`]: everything below
    /// it is clipped away. Returns `false` when the push was dropped because
    /// the stack is full.
    pub fn push(&mut self, rect: Rect) -> bool {
        if self.rects.len() >= MAX_CLIP_DEPTH {
            self.overflow += 1;
            self.dropped += 1;
            return false;
        }

        let combined = match self.active.last() {
            Some(&top) => rect.clip_snapped(top).unwrap_or(Rect::ZERO),
            None => rect,
        };

        self.rects.push(rect);
        self.active.push(combined);
        true
    }

    /// Restores the previous active rectangle; no-op at depth 0.
    pub fn pop(&mut self) {
        if self.overflow > 0 {
            self.overflow -= 1;
            return;
        }
        self.rects.pop();
        self.active.pop();
    }

    /// Current effective clip, or `None` when nothing is clipping.
    #[inline]
    pub fn active(&self) -> Option<Rect> {
        self.active.last().copied()
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.rects.len()
    }

    /// Rectangles as pushed, bottom first.
    #[inline]
    pub fn rects(&self) -> &[Rect] {
        &self.rects
    }

    /// Pushes that were dropped for depth since the last `clear`.
    #[inline]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Empties the stack. Keeps allocated capacity for reuse.
    pub fn clear(&mut self) {
        self.rects.clear();
        self.active.clear();
        self.overflow = 0;
        self.dropped = 0;
    }

    /// Moves the current contents out, leaving an empty stack behind.
    ///
    /// Used by overlays that must not inherit their ancestors' clips; hand the
    /// result back to [`ClipStack::restore`] when the overlay subtree is done.
    pub fn detach(&mut self) -> ClipStack {
        let dropped = self.dropped;
        let mut saved = core::mem::replace(self, ClipStack::new());
        self.dropped = dropped;
        saved.dropped = 0;
        saved
    }

    /// Reinstates a stack returned by [`ClipStack::detach`].
    pub fn restore(&mut self, saved: ClipStack) {
        let dropped = self.dropped;
        *self = saved;
        self.dropped += dropped;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── push / pop ────────────────────────────────────────────────────────

    #[test]
    fn empty_stack_has_no_active_clip() {
        assert_eq!(ClipStack::new().active(), None);
    }

    #[test]
    fn first_push_is_taken_verbatim() {
        let mut s = ClipStack::new();
        s.push(r(0.5, 0.5, 10.0, 10.0));
        assert_eq!(s.active(), Some(r(0.5, 0.5, 10.0, 10.0)));
    }

    #[test]
    fn nested_push_intersects_with_snapped_parent() {
        let mut s = ClipStack::new();
        s.push(r(0.5, 0.5, 10.0, 10.0));
        s.push(r(5.0, 5.0, 20.0, 20.0));
        // Parent snaps to [1, 10].
        assert_eq!(s.active(), Some(r(5.0, 5.0, 5.0, 5.0)));
    }

    #[test]
    fn disjoint_push_collapses_to_zero_area() {
        let mut s = ClipStack::new();
        s.push(r(0.0, 0.0, 10.0, 10.0));
        s.push(r(50.0, 50.0, 10.0, 10.0));
        assert_eq!(s.active(), Some(Rect::ZERO));

        // Anything under an empty clip stays empty.
        s.push(r(0.0, 0.0, 100.0, 100.0));
        assert_eq!(s.active(), Some(Rect::ZERO));
    }

    #[test]
    fn pop_restores_previous_and_then_none() {
        let mut s = ClipStack::new();
        s.push(r(0.0, 0.0, 10.0, 10.0));
        s.push(r(2.0, 2.0, 4.0, 4.0));
        s.pop();
        assert_eq!(s.active(), Some(r(0.0, 0.0, 10.0, 10.0)));
        s.pop();
        assert_eq!(s.active(), None);
        s.pop();
        assert_eq!(s.depth(), 0);
    }

    // ── overflow ──────────────────────────────────────────────────────────

    #[test]
    fn pushes_beyond_max_depth_are_ignored() {
        let mut s = ClipStack::new();
        for i in 0..MAX_CLIP_DEPTH {
            assert!(s.push(r(i as f32, 0.0, 100.0, 100.0)));
        }
        assert!(!s.push(r(0.0, 0.0, 1.0, 1.0)));
        assert_eq!(s.depth(), MAX_CLIP_DEPTH);
        assert_eq!(s.dropped(), 1);

        let before = s.active();
        // The pop pairs with the dropped push.
        s.pop();
        assert_eq!(s.active(), before);
        s.pop();
        assert_eq!(s.depth(), MAX_CLIP_DEPTH - 1);
    }

    // ── detach / restore ──────────────────────────────────────────────────

    #[test]
    fn detach_leaves_empty_stack_and_restore_brings_it_back() {
        let mut s = ClipStack::new();
        s.push(r(0.0, 0.0, 10.0, 10.0));
        let saved = s.detach();
        assert_eq!(s.depth(), 0);
        s.push(r(100.0, 100.0, 5.0, 5.0));
        s.pop();
        s.restore(saved);
        assert_eq!(s.rects(), &[r(0.0, 0.0, 10.0, 10.0)]);
    }
}
