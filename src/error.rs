use std::fmt::Debug;
use thiserror::Error;

use crate::rtree::RecordId;

/// Enum with all errors in this crate.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeoRTreeError {
    /// A rectangle or point could not be constructed, e.g. `min > max` or a non-finite
    /// coordinate.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// A polygon supplied to a query was rejected before it reached the tree.
    #[error("Invalid polygon: {0}")]
    InvalidPolygon(String),

    /// The fan-out bounds of an [`RTreeConfig`][crate::rtree::RTreeConfig] are inconsistent.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No leaf entry matched both the rectangle and the identifier.
    #[error("No entry found for record {id}")]
    NotFound {
        /// The identifier that was looked up.
        id: RecordId,
    },
}

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, GeoRTreeError>;
