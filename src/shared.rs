//! A thread-safe handle to an [`RTree`].

use std::mem;
use std::sync::Arc;

use log::debug;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::Result;
use crate::geometry::{Point, Rectangle};
use crate::query::QueryEngine;
use crate::rtree::{RTree, RTreeConfig, RecordId};

/// Thread-safe wrapper around [`RTree`] using `Arc<RwLock<RTree>>`.
///
/// One readers-writer lock covers the whole tree: any number of searches may run at once,
/// while inserts and deletes take exclusive access. Cloning the handle shares the same tree.
///
/// For a full rebuild, bulk load the new tree without holding the lock and install it with
/// [`replace`][Self::replace]; writers are blocked only for the swap.
///
/// ```
/// use geo_rtree::rtree::sort::HilbertSort;
/// use geo_rtree::rtree::{RTree, RTreeConfig};
/// use geo_rtree::{Point, Rectangle, SharedRTree};
///
/// let shared = SharedRTree::new(RTreeConfig::default());
/// shared.insert(Rectangle::from_point(Point::new(1., 1.)).unwrap(), 1);
///
/// let rebuilt = RTree::bulk_load::<HilbertSort>(
///     RTreeConfig::default(),
///     vec![(Rectangle::from_point(Point::new(2., 2.)).unwrap(), 2)],
/// );
/// let old = shared.replace(rebuilt);
/// assert_eq!(old.len(), 1);
/// assert_eq!(shared.nearest_neighbors(&Point::new(0., 0.), 1), vec![2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedRTree {
    inner: Arc<RwLock<RTree>>,
}

impl SharedRTree {
    /// Create a handle to a new, empty tree.
    pub fn new(config: RTreeConfig) -> Self {
        Self::from_tree(RTree::new(config))
    }

    pub fn from_tree(tree: RTree) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tree)),
        }
    }

    pub fn insert(&self, rect: Rectangle, id: RecordId) {
        self.inner.write().insert(rect, id)
    }

    pub fn delete(&self, rect: &Rectangle, id: RecordId) -> Result<()> {
        self.inner.write().delete(rect, id)
    }

    pub fn clear(&self) {
        self.inner.write().clear()
    }

    /// Collect the ids intersecting `query` under a single read lock.
    pub fn range_search(&self, query: &Rectangle) -> Vec<RecordId> {
        self.inner.read().range_search(query).collect()
    }

    pub fn nearest_neighbors(&self, point: &Point, k: usize) -> Vec<RecordId> {
        self.inner.read().nearest_neighbors(point, k)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// Run `f` against a [`QueryEngine`] while holding the read lock.
    pub fn query<R>(&self, f: impl FnOnce(QueryEngine<'_>) -> R) -> R {
        let tree = self.inner.read();
        f(QueryEngine::new(&tree))
    }

    /// Install `tree` in place of the current one, returning the old tree. The write lock is
    /// held only for the swap.
    pub fn replace(&self, tree: RTree) -> RTree {
        let old = mem::replace(&mut *self.inner.write(), tree);
        debug!("replaced shared tree of {} records", old.len());
        old
    }

    /// Acquires a read lock for direct access to the tree.
    ///
    /// This allows multiple read operations under a single lock.
    pub fn read(&self) -> RwLockReadGuard<'_, RTree> {
        self.inner.read()
    }

    /// Acquires a write lock for direct access to the tree.
    pub fn write(&self) -> RwLockWriteGuard<'_, RTree> {
        self.inner.write()
    }
}

impl From<RTree> for SharedRTree {
    fn from(tree: RTree) -> Self {
        Self::from_tree(tree)
    }
}

// Ensure SharedRTree is Send + Sync
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    let _ = assert_send_sync::<SharedRTree>;
};
