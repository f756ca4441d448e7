//! Shared fixtures for unit tests.

use rand::rngs::StdRng;
use rand::Rng;

use crate::geometry::{Point, Rectangle};
use crate::rtree::node::Node;
use crate::rtree::{RTree, RecordId};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Collect and sort ids so results can be compared regardless of traversal order.
pub(crate) fn sorted(ids: impl IntoIterator<Item = RecordId>) -> Vec<RecordId> {
    let mut ids: Vec<RecordId> = ids.into_iter().collect();
    ids.sort_unstable();
    ids
}

/// `n` entries with ids `0..n` inside `[0, extent]²`. About a third are points, the rest
/// small rectangles.
pub(crate) fn random_rects(rng: &mut StdRng, n: usize, extent: f64) -> Vec<(Rectangle, RecordId)> {
    (0..n)
        .map(|i| {
            let x = rng.gen_range(0.0..extent);
            let y = rng.gen_range(0.0..extent);
            let rect = if rng.gen_bool(0.33) {
                Rectangle::from_point(Point::new(x, y)).unwrap()
            } else {
                let w = rng.gen_range(0.0..extent / 50.);
                let h = rng.gen_range(0.0..extent / 50.);
                Rectangle::new(x, y, x + w, y + h).unwrap()
            };
            (rect, i as RecordId)
        })
        .collect()
}

/// Walk the whole tree and panic on any broken structural invariant:
///
/// - every leaf is at depth `height - 1`;
/// - every internal entry's rectangle equals the union of its child's entries;
/// - every non-root node holds between `min_entries` and `max_entries` entries, and an
///   internal root holds at least two;
/// - the number of leaf entries equals `len`.
pub(crate) fn check_invariants(tree: &RTree) {
    let Some(root) = tree.root.as_ref() else {
        assert_eq!(tree.len(), 0, "empty root with non-zero len");
        assert_eq!(tree.height(), 0, "empty root with non-zero height");
        return;
    };
    assert!(tree.height() >= 1);

    let max = tree.config().max_entries();
    assert!(root.len() <= max, "root overflow: {}", root.len());
    match root {
        Node::Leaf(entries) => assert!(!entries.is_empty(), "empty leaf root"),
        Node::Internal(children) => assert!(children.len() >= 2, "internal root with one child"),
    }

    let count = check_node(tree, root, tree.height() - 1, true);
    assert_eq!(count, tree.len(), "leaf entry count differs from len");
}

fn check_node(tree: &RTree, node: &Node, level: usize, is_root: bool) -> usize {
    let config = tree.config();
    if !is_root {
        assert!(
            node.len() >= config.min_entries() && node.len() <= config.max_entries(),
            "node at level {} has {} entries",
            level,
            node.len()
        );
    }

    match node {
        Node::Leaf(entries) => {
            assert_eq!(level, 0, "leaf found at level {}", level);
            entries.len()
        }
        Node::Internal(children) => {
            assert!(level > 0, "internal node at leaf level");
            children
                .iter()
                .map(|child| {
                    assert_eq!(Some(child.rect), child.child.mbr(), "loose rectangle");
                    check_node(tree, &child.child, level - 1, false)
                })
                .sum()
        }
    }
}
