use crate::coords::Rect;

use super::{DisplayKey, NodeId, WidgetId, ZGroup, ZIndex};

/// Two clip rectangles closer than this on every edge count as the same.
pub const CLIP_EPSILON: f32 = 1e-4;

/// One leaf widget, positioned in paint order.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayItem {
    pub node: NodeId,
    pub widget: WidgetId,
    pub key: DisplayKey,
    /// Clip rectangles in effect for this item, bottom first, as pushed.
    pub clip_stack: Vec<Rect>,

    /// Pops to apply to the previous item's stack before drawing this one.
    pub clip_pop_count: usize,
    /// Pushes to apply after the pops; equals `push_rects.len()`.
    pub clip_push_count: usize,
    pub push_rects: Vec<Rect>,
}

impl DisplayItem {
    pub fn new(node: NodeId, widget: WidgetId, key: DisplayKey, clip_stack: Vec<Rect>) -> Self {
        Self {
            node,
            widget,
            key,
            clip_stack,
            clip_pop_count: 0,
            clip_push_count: 0,
            push_rects: Vec::new(),
        }
    }

    #[inline]
    pub fn z_group(&self) -> ZGroup {
        self.key.z_group
    }

    #[inline]
    pub fn z_index(&self) -> ZIndex {
        self.key.z_index
    }

    #[inline]
    pub fn appearance_order(&self) -> u32 {
        self.key.appearance_order
    }

    #[inline]
    pub fn clip_depth(&self) -> usize {
        self.clip_stack.len()
    }
}

/// Leaf widgets in paint order, with clip transitions between neighbours.
///
/// Items are sorted by [`DisplayKey`]. Each item's `clip_pop_count`,
/// `clip_push_count` and `push_rects` describe only the change from the
/// previous item's stack (the first item starts from an empty stack).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplayList {
    items: Vec<DisplayItem>,
}

impl DisplayList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorts `items` into paint order and derives the clip deltas.
    pub fn from_unsorted(mut items: Vec<DisplayItem>) -> Self {
        items.sort_by_key(|item| item.key);
        compute_clip_deltas(&mut items);
        Self { items }
    }

    #[inline]
    pub fn items(&self) -> &[DisplayItem] {
        &self.items
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, DisplayItem> {
        self.items.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<'a> IntoIterator for &'a DisplayList {
    type Item = &'a DisplayItem;
    type IntoIter = core::slice::Iter<'a, DisplayItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Length of the shared bottom part of two clip stacks.
pub fn common_prefix(a: &[Rect], b: &[Rect]) -> usize {
    a.iter()
        .zip(b)
        .take_while(|(x, y)| x.approx_eq(**y, CLIP_EPSILON))
        .count()
}

fn compute_clip_deltas(items: &mut [DisplayItem]) {
    let mut prev: Vec<Rect> = Vec::new();

    for item in items.iter_mut() {
        let common = common_prefix(&prev, &item.clip_stack);
        item.clip_pop_count = prev.len() - common;
        item.clip_push_count = item.clip_stack.len() - common;
        item.push_rects.clear();
        item.push_rects.extend_from_slice(&item.clip_stack[common..]);

        prev.clear();
        prev.extend_from_slice(&item.clip_stack);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    fn item(order: u32, z: i32, clips: Vec<Rect>) -> DisplayItem {
        DisplayItem::new(
            NodeId(order),
            WidgetId(order),
            DisplayKey::new(ZGroup(0), ZIndex(z), order),
            clips,
        )
    }

    /// Replays every item's delta and checks it rebuilds the item's stack.
    fn assert_replay(list: &DisplayList) {
        let mut stack: Vec<Rect> = Vec::new();
        for it in list {
            for _ in 0..it.clip_pop_count {
                stack.pop();
            }
            stack.extend_from_slice(&it.push_rects);
            assert_eq!(it.clip_push_count, it.push_rects.len());
            assert_eq!(stack, it.clip_stack);
        }
    }

    // ── deltas ────────────────────────────────────────────────────────────

    #[test]
    fn first_item_pushes_its_whole_stack() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let list = DisplayList::from_unsorted(vec![item(0, 0, vec![a])]);
        let first = &list.items()[0];
        assert_eq!(first.clip_pop_count, 0);
        assert_eq!(first.push_rects, vec![a]);
    }

    #[test]
    fn shared_prefix_is_not_re_pushed() {
        let a = r(0.0, 0.0, 100.0, 100.0);
        let b = r(10.0, 10.0, 10.0, 10.0);
        let c = r(50.0, 50.0, 10.0, 10.0);
        let list = DisplayList::from_unsorted(vec![
            item(0, 0, vec![a, b]),
            item(1, 0, vec![a, c]),
            item(2, 0, vec![]),
        ]);

        let second = &list.items()[1];
        assert_eq!((second.clip_pop_count, second.clip_push_count), (1, 1));
        assert_eq!(second.push_rects, vec![c]);

        let third = &list.items()[2];
        assert_eq!((third.clip_pop_count, third.clip_push_count), (2, 0));
        assert_replay(&list);
    }

    #[test]
    fn nearly_equal_rects_share_prefix() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let a2 = r(0.00001, 0.0, 10.0, 10.0);
        assert_eq!(common_prefix(&[a], &[a2]), 1);
    }

    #[test]
    fn deltas_follow_sorted_order_not_input_order() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let list = DisplayList::from_unsorted(vec![item(0, 5, vec![a]), item(1, 0, vec![])]);
        assert_eq!(list.items()[0].widget, WidgetId(1));
        assert_eq!(list.items()[1].push_rects, vec![a]);
        assert_replay(&list);
    }

    // ── properties ────────────────────────────────────────────────────────

    #[quickcheck_macros::quickcheck]
    fn replay_reproduces_every_stack(shapes: Vec<(i8, Vec<u8>)>) -> bool {
        // Stacks drawn from a small pool of rects so prefixes actually repeat.
        let pool = [
            r(0.0, 0.0, 100.0, 100.0),
            r(10.0, 10.0, 50.0, 50.0),
            r(20.0, 20.0, 5.0, 5.0),
        ];
        let items = shapes
            .iter()
            .take(32)
            .enumerate()
            .map(|(i, (z, picks))| {
                let clips = picks.iter().take(6).map(|p| pool[*p as usize % pool.len()]).collect();
                item(i as u32, *z as i32, clips)
            })
            .collect();

        let list = DisplayList::from_unsorted(items);
        let mut stack: Vec<Rect> = Vec::new();
        list.iter().all(|it| {
            for _ in 0..it.clip_pop_count {
                stack.pop();
            }
            stack.extend_from_slice(&it.push_rects);
            stack == it.clip_stack
        })
    }

    #[quickcheck_macros::quickcheck]
    fn sorted_keys_are_non_decreasing(zs: Vec<(i8, i8)>) -> bool {
        let items = zs
            .iter()
            .enumerate()
            .map(|(i, (g, z))| {
                DisplayItem::new(
                    NodeId(i as u32),
                    WidgetId(i as u32),
                    DisplayKey::new(ZGroup(*g as i32 % 3), ZIndex(*z as i32 % 4), i as u32),
                    Vec::new(),
                )
            })
            .collect();

        let list = DisplayList::from_unsorted(items);
        list.items().windows(2).all(|w| {
            let (a, b) = (&w[0], &w[1]);
            let same_z = a.z_group() == b.z_group() && a.z_index() == b.z_index();
            a.key <= b.key && (!same_z || a.appearance_order() < b.appearance_order())
        })
    }
}
