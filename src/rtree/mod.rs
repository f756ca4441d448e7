//! A dynamic R-tree over axis-aligned rectangles.
//!
//! Records are stored as `(Rectangle, RecordId)` pairs. Build a tree incrementally with
//! [`RTree::insert`], or all at once with [`RTreeBuilder`] / [`RTree::bulk_load`].

mod builder;
mod config;
mod index;
pub(crate) mod node;
mod search;
pub mod sort;
mod split;

pub use builder::RTreeBuilder;
pub use config::{RTreeConfig, SplitStrategy, DEFAULT_MAX_ENTRIES};
pub use index::RTree;
pub use node::LeafEntry;
pub use search::SearchIter;
pub use sort::{HilbertSort, STRSort};

/// Opaque identifier of an indexed record, typically a foreign key into the caller's storage.
pub type RecordId = u64;
