//! Geometry primitives: points, axis-aligned rectangles and polygons.
//!
//! These are plain values. Everything that could be malformed is checked when it is
//! constructed, so the tree never has to validate geometry during traversal.

mod point;
mod polygon;
mod rect;

pub use point::{km_to_degrees, Point};
pub use polygon::Polygon;
pub use rect::Rectangle;
