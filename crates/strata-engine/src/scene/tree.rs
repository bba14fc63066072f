use crate::coords::Rect;

/// Index of a node in a [`LayoutTree`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a node lays out its children.
///
/// Only `None` marks a leaf that carries a widget; the sizing algorithms
/// behind the other variants live with the layout engine, not here.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum Arrangement {
    #[default]
    None,
    Row,
    Column,
    Stack,
}

/// A positioned node, as produced by layout.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    /// Final rectangle in logical pixels.
    pub rect: Rect,
    pub arrangement: Arrangement,
    /// Children are clipped to `rect`.
    pub clips: bool,
    /// Scroll container whose own frame stays put while content scrolls;
    /// it carries a widget even though it arranges children.
    pub scroll_static: bool,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl LayoutNode {
    /// Whether this node consumes the next widget during composition.
    #[inline]
    pub fn carries_widget(&self) -> bool {
        self.arrangement == Arrangement::None || self.scroll_static
    }
}

/// Arena of positioned layout nodes.
///
/// Nodes live in one contiguous pool and refer to each other by index, so
/// dropping the tree is a single deallocation regardless of depth.
#[derive(Debug, Clone, Default)]
pub struct LayoutTree {
    nodes: Vec<LayoutNode>,
    root: Option<NodeId>,
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every node. Keeps allocated capacity for reuse.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    #[inline]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.get(id.index())
    }

    /// Adds the root node, replacing any previous root reference.
    pub fn set_root(&mut self, rect: Rect, arrangement: Arrangement) -> NodeId {
        let id = self.alloc(rect, arrangement, None);
        self.root = Some(id);
        id
    }

    /// Appends a child under `parent`. Returns `None` if `parent` is unknown.
    pub fn add_child(&mut self, parent: NodeId, rect: Rect, arrangement: Arrangement) -> Option<NodeId> {
        if parent.index() >= self.nodes.len() {
            return None;
        }
        let id = self.alloc(rect, arrangement, Some(parent));
        self.nodes[parent.index()].children.push(id);
        Some(id)
    }

    /// Marks `id` as clipping its children.
    pub fn set_clips(&mut self, id: NodeId, clips: bool) {
        if let Some(n) = self.nodes.get_mut(id.index()) {
            n.clips = clips;
        }
    }

    pub fn set_scroll_static(&mut self, id: NodeId, scroll_static: bool) {
        if let Some(n) = self.nodes.get_mut(id.index()) {
            n.scroll_static = scroll_static;
        }
    }

    fn alloc(&mut self, rect: Rect, arrangement: Arrangement, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(LayoutNode {
            rect,
            arrangement,
            clips: false,
            scroll_static: false,
            parent,
            children: Vec::new(),
        });
        id
    }
}
