use crate::coords::Rect;

use super::{
    ClipStack, DisplayItem, DisplayKey, DisplayList, LayoutTree, NodeId, Widget, WidgetId, ZGroup,
};

/// Turns a positioned layout tree plus its widgets into a [`DisplayList`].
///
/// Widgets are consumed in depth-first order, one per node that
/// [`carries_widget`](super::LayoutNode::carries_widget). The compositor owns
/// its clip stack and item buffer so repeated builds reuse their capacity.
#[derive(Debug, Default)]
pub struct Compositor {
    clips: ClipStack,
}

struct Walk<'a> {
    tree: &'a LayoutTree,
    widgets: &'a [Widget],
    cursor: usize,
    next_order: u32,
    items: Vec<DisplayItem>,
}

impl Compositor {
    pub fn new() -> Self {
        Self { clips: ClipStack::new() }
    }

    /// Builds the sorted display list for one frame.
    ///
    /// An empty tree or widget array yields an empty list.
    pub fn build(&mut self, tree: &LayoutTree, widgets: &[Widget]) -> DisplayList {
        self.clips.clear();

        let Some(root) = tree.root() else {
            return DisplayList::new();
        };
        if widgets.is_empty() {
            return DisplayList::new();
        }

        let mut walk = Walk {
            tree,
            widgets,
            cursor: 0,
            next_order: 0,
            items: Vec::with_capacity(widgets.len()),
        };
        self.visit(&mut walk, root, ZGroup::CONTENT);

        if self.clips.dropped() > 0 {
            log::warn!(
                "clip stack overflow: {} nested clips beyond depth {} ignored",
                self.clips.dropped(),
                super::MAX_CLIP_DEPTH
            );
        }
        if walk.cursor < widgets.len() {
            log::debug!(
                "compositor: {} widget(s) left without a layout node",
                widgets.len() - walk.cursor
            );
        }

        let list = DisplayList::from_unsorted(walk.items);
        log::trace!("compositor: {} display items", list.len());
        list
    }

    fn visit(&mut self, walk: &mut Walk<'_>, id: NodeId, group: ZGroup) {
        let (tree, widgets) = (walk.tree, walk.widgets);
        let Some(node) = tree.node(id) else {
            return;
        };

        let widget = if node.carries_widget() && walk.cursor < widgets.len() {
            let index = walk.cursor;
            walk.cursor += 1;
            Some((WidgetId(index as u32), &widgets[index]))
        } else {
            None
        };

        // A widget raised into a higher group escapes every ancestor clip.
        let detached = match widget {
            Some((_, w)) if w.z_group > group => Some(self.clips.detach()),
            _ => None,
        };
        let child_group = match widget {
            Some((_, w)) => w.z_group.max(group),
            None => group,
        };

        let widget_clip: Option<Rect> = widget.and_then(|(_, w)| w.clip);
        if let Some(clip) = widget_clip {
            self.clips.push(clip);
        }

        if let Some((widget_id, w)) = widget {
            let key = DisplayKey::new(w.z_group, w.z_index, walk.next_order);
            walk.next_order += 1;
            walk.items.push(DisplayItem::new(id, widget_id, key, self.clips.rects().to_vec()));
        }

        if node.clips {
            self.clips.push(node.rect);
        }
        for &child in &node.children {
            self.visit(walk, child, child_group);
        }
        if node.clips {
            self.clips.pop();
        }

        if widget_clip.is_some() {
            self.clips.pop();
        }
        if let Some(saved) = detached {
            self.clips.restore(saved);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::paint::Color;
    use crate::scene::{Arrangement, WidgetKind, ZIndex};

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    fn leaf(rect: Rect) -> Widget {
        Widget::new(rect, WidgetKind::Panel).with_background(Color::WHITE)
    }

    /// Clipped column holding a popup (group 1) first, then a two-widget row.
    fn popup_scene() -> (LayoutTree, Vec<Widget>) {
        let mut t = LayoutTree::new();
        let root = t.set_root(r(0.0, 0.0, 200.0, 200.0), Arrangement::Column);
        t.set_clips(root, true);
        t.add_child(root, r(20.0, 20.0, 300.0, 50.0), Arrangement::None).unwrap();
        let row = t.add_child(root, r(0.0, 100.0, 200.0, 40.0), Arrangement::Row).unwrap();
        t.add_child(row, r(0.0, 100.0, 100.0, 40.0), Arrangement::None).unwrap();
        t.add_child(row, r(100.0, 100.0, 100.0, 40.0), Arrangement::None).unwrap();

        let widgets = vec![
            leaf(r(20.0, 20.0, 300.0, 50.0)).with_z(1, 0),
            leaf(r(0.0, 100.0, 100.0, 40.0)),
            leaf(r(100.0, 100.0, 100.0, 40.0)),
        ];
        (t, widgets)
    }

    // ── traversal ─────────────────────────────────────────────────────────

    #[test]
    fn empty_inputs_give_empty_list() {
        let mut c = Compositor::new();
        assert!(c.build(&LayoutTree::new(), &[]).is_empty());

        let (tree, _) = popup_scene();
        assert!(c.build(&tree, &[]).is_empty());
    }

    #[test]
    fn records_one_item_per_leaf_in_traversal_order() {
        let mut t = LayoutTree::new();
        let root = t.set_root(r(0.0, 0.0, 100.0, 100.0), Arrangement::Row);
        t.add_child(root, r(0.0, 0.0, 50.0, 100.0), Arrangement::None);
        t.add_child(root, r(50.0, 0.0, 50.0, 100.0), Arrangement::None);
        let widgets = vec![leaf(r(0.0, 0.0, 50.0, 100.0)), leaf(r(50.0, 0.0, 50.0, 100.0))];

        let list = Compositor::new().build(&t, &widgets);
        let order: Vec<_> = list.iter().map(|i| (i.widget, i.appearance_order())).collect();
        assert_eq!(order, vec![(WidgetId(0), 0), (WidgetId(1), 1)]);
    }

    #[test]
    fn scroll_static_node_is_recorded_before_its_children() {
        let mut t = LayoutTree::new();
        let root = t.set_root(r(0.0, 0.0, 100.0, 100.0), Arrangement::Column);
        t.set_scroll_static(root, true);
        t.set_clips(root, true);
        t.add_child(root, r(0.0, 0.0, 100.0, 300.0), Arrangement::None);
        let widgets = vec![leaf(r(0.0, 0.0, 100.0, 100.0)), leaf(r(0.0, 0.0, 100.0, 300.0))];

        let list = Compositor::new().build(&t, &widgets);
        assert_eq!(list.len(), 2);
        // The container itself draws outside its own clip; its content does not.
        assert_eq!(list.items()[0].clip_depth(), 0);
        assert_eq!(list.items()[1].clip_stack, vec![r(0.0, 0.0, 100.0, 100.0)]);
    }

    #[test]
    fn widget_clip_applies_to_itself() {
        let mut t = LayoutTree::new();
        t.set_root(r(0.0, 0.0, 100.0, 100.0), Arrangement::None);
        let widgets = vec![leaf(r(0.0, 0.0, 100.0, 100.0)).with_clip(r(0.0, 0.0, 10.0, 10.0))];

        let list = Compositor::new().build(&t, &widgets);
        assert_eq!(list.items()[0].clip_stack, vec![r(0.0, 0.0, 10.0, 10.0)]);
    }

    // ── sorting ───────────────────────────────────────────────────────────

    #[test]
    fn z_index_reorders_but_ties_keep_traversal_order() {
        let mut t = LayoutTree::new();
        let root = t.set_root(r(0.0, 0.0, 100.0, 100.0), Arrangement::Stack);
        for _ in 0..3 {
            t.add_child(root, r(0.0, 0.0, 10.0, 10.0), Arrangement::None);
        }
        let widgets = vec![
            leaf(r(0.0, 0.0, 10.0, 10.0)).with_z(0, 2),
            leaf(r(0.0, 0.0, 10.0, 10.0)).with_z(0, 1),
            leaf(r(0.0, 0.0, 10.0, 10.0)).with_z(0, 1),
        ];

        let list = Compositor::new().build(&t, &widgets);
        let ids: Vec<_> = list.iter().map(|i| i.widget.0).collect();
        assert_eq!(ids, vec![1, 2, 0]);
        assert_eq!(list.items()[0].z_index(), ZIndex(1));
    }

    // ── popup scenario ────────────────────────────────────────────────────

    #[test]
    fn popup_sorts_after_row_and_escapes_parent_clip() {
        let (tree, widgets) = popup_scene();
        let list = Compositor::new().build(&tree, &widgets);

        let ids: Vec<_> = list.iter().map(|i| i.widget.0).collect();
        assert_eq!(ids, vec![1, 2, 0]);

        let popup = &list.items()[2];
        assert_eq!(popup.z_group(), ZGroup(1));
        assert_eq!(popup.clip_depth(), 0);

        // Row widgets stay under the root clip.
        assert_eq!(list.items()[0].clip_depth(), 1);
        assert_eq!(list.items()[1].clip_depth(), 1);
        assert_eq!(popup.clip_pop_count, 1);
    }

    #[test]
    fn siblings_after_popup_keep_parent_clip() {
        let (tree, widgets) = popup_scene();
        let list = Compositor::new().build(&tree, &widgets);
        let row_item = list.iter().find(|i| i.widget == WidgetId(2)).unwrap();
        assert_eq!(row_item.clip_stack, vec![r(0.0, 0.0, 200.0, 200.0)]);
    }

    // ── clip overflow ─────────────────────────────────────────────────────

    #[test]
    fn deep_nesting_caps_clip_depth() {
        let mut t = LayoutTree::new();
        let mut parent = t.set_root(r(0.0, 0.0, 1000.0, 1000.0), Arrangement::Column);
        t.set_clips(parent, true);
        for i in 0..20 {
            let rect = r(i as f32, i as f32, 900.0, 900.0);
            parent = t.add_child(parent, rect, Arrangement::Column).unwrap();
            t.set_clips(parent, true);
        }
        t.add_child(parent, r(30.0, 30.0, 10.0, 10.0), Arrangement::None);
        let widgets = vec![leaf(r(30.0, 30.0, 10.0, 10.0))];

        let list = Compositor::new().build(&t, &widgets);
        assert_eq!(list.items()[0].clip_depth(), crate::scene::MAX_CLIP_DEPTH);
    }
}
