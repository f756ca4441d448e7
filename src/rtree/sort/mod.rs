//! Space-filling orderings used by bulk loading.

mod hilbert;
mod str;
mod r#trait;
mod util;

pub use hilbert::HilbertSort;
pub use r#str::STRSort;
pub use r#trait::{Sort, SortParams};
