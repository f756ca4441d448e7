//! Leaf and internal nodes and the entries they hold.

use crate::geometry::Rectangle;
use crate::rtree::RecordId;

/// Anything stored in a node: it must report the rectangle it occupies.
pub(crate) trait Bounded {
    fn rect(&self) -> &Rectangle;
}

/// A leaf entry: the bounding rectangle of an indexed geometry and its record identifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeafEntry {
    pub(crate) rect: Rectangle,
    pub(crate) id: RecordId,
}

impl LeafEntry {
    pub fn new(rect: Rectangle, id: RecordId) -> Self {
        Self { rect, id }
    }

    /// The bounding rectangle of the indexed geometry.
    pub fn rect(&self) -> &Rectangle {
        &self.rect
    }

    pub fn id(&self) -> RecordId {
        self.id
    }
}

/// An internal entry: the tight bounding rectangle of `child` and the child itself.
#[derive(Debug, Clone)]
pub(crate) struct ChildEntry {
    pub(crate) rect: Rectangle,
    pub(crate) child: Box<Node>,
}

impl Bounded for LeafEntry {
    #[inline]
    fn rect(&self) -> &Rectangle {
        &self.rect
    }
}

impl Bounded for ChildEntry {
    #[inline]
    fn rect(&self) -> &Rectangle {
        &self.rect
    }
}

impl ChildEntry {
    /// Wrap a non-empty node, computing its tight rectangle.
    pub(crate) fn new(child: Node) -> Option<Self> {
        let rect = child.mbr()?;
        Some(Self {
            rect,
            child: Box::new(child),
        })
    }

    /// Recompute this entry's rectangle from its child.
    #[inline]
    pub(crate) fn retighten(&mut self) {
        if let Some(rect) = self.child.mbr() {
            self.rect = rect;
        }
    }
}

/// A tree node. Leaves hold records, internal nodes own their children.
#[derive(Debug, Clone)]
pub(crate) enum Node {
    Leaf(Vec<LeafEntry>),
    Internal(Vec<ChildEntry>),
}

impl Node {
    pub(crate) fn len(&self) -> usize {
        match self {
            Node::Leaf(entries) => entries.len(),
            Node::Internal(entries) => entries.len(),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf(_))
    }

    /// The tight bounding rectangle of all entries, or `None` for an empty node.
    pub(crate) fn mbr(&self) -> Option<Rectangle> {
        match self {
            Node::Leaf(entries) => union_all(entries),
            Node::Internal(entries) => union_all(entries),
        }
    }
}

pub(crate) fn union_all<T: Bounded>(entries: &[T]) -> Option<Rectangle> {
    let (first, rest) = entries.split_first()?;
    Some(
        rest.iter()
            .fold(*first.rect(), |acc, entry| acc.union(entry.rect())),
    )
}

/// Pick the entry whose rectangle needs the least area enlargement to cover `rect`.
///
/// Ties go to the smallest resulting area, then to the lowest index. Panics on an empty slice.
pub(crate) fn choose_subtree(entries: &[ChildEntry], rect: &Rectangle) -> usize {
    debug_assert!(!entries.is_empty());

    let mut best = 0;
    let mut best_enlargement = f64::INFINITY;
    let mut best_area = f64::INFINITY;

    for (i, entry) in entries.iter().enumerate() {
        let combined = entry.rect.union(rect);
        let area = combined.area();
        let enlargement = area - entry.rect.area();
        if enlargement < best_enlargement
            || (enlargement == best_enlargement && area < best_area)
        {
            best = i;
            best_enlargement = enlargement;
            best_area = area;
        }
    }

    best
}
