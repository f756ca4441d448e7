#![doc = include_str!("../README.md")]

mod error;
pub mod geometry;
pub mod query;
pub mod rtree;
mod shared;

pub use error::{GeoRTreeError, Result};
pub use geometry::{km_to_degrees, Point, Polygon, Rectangle};
pub use query::QueryEngine;
pub use rtree::{RTree, RTreeBuilder, RTreeConfig, RecordId};
pub use shared::SharedRTree;

#[cfg(test)]
pub(crate) mod test;
