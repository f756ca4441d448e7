use crate::error::{GeoRTreeError, Result};

/// The default fan-out used by [`RTreeConfig::default`].
pub const DEFAULT_MAX_ENTRIES: usize = 16;

/// Heuristic used to divide an overflowing node in two.
///
/// Both produce valid trees; they differ only in how well the resulting nodes are packed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SplitStrategy {
    /// Guttman's quadratic split. Picks the pair of entries wasting the most area as seeds.
    #[default]
    Quadratic,
    /// Guttman's linear split. Picks seeds by greatest normalized separation along an axis.
    /// Cheaper to compute, looser nodes.
    Linear,
}

/// Fan-out bounds and split heuristic of an [`RTree`][crate::rtree::RTree]. Fixed for the
/// lifetime of a tree.
///
/// ```
/// use geo_rtree::rtree::{RTreeConfig, SplitStrategy};
///
/// let config = RTreeConfig::new(8)
///     .unwrap()
///     .with_split(SplitStrategy::Linear);
/// assert_eq!(config.min_entries(), 4);
///
/// assert!(RTreeConfig::new(1).is_err());
/// assert!(RTreeConfig::new(8).unwrap().with_min_entries(5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RTreeConfig {
    max_entries: usize,
    min_entries: usize,
    split: SplitStrategy,
}

impl RTreeConfig {
    /// Create a config with the given fan-out and `min_entries = max_entries / 2`.
    pub fn new(max_entries: usize) -> Result<Self> {
        Self::with_bounds(max_entries, (max_entries / 2).max(1))
    }

    /// Create a config with explicit bounds.
    ///
    /// Requires `max_entries >= 2` and `1 <= min_entries <= (max_entries + 1) / 2`, so that an
    /// overflowing node of `max_entries + 1` entries can always be split into two valid nodes.
    pub fn with_bounds(max_entries: usize, min_entries: usize) -> Result<Self> {
        if max_entries < 2 {
            return Err(GeoRTreeError::InvalidConfig(format!(
                "max_entries must be at least 2, got {}",
                max_entries
            )));
        }
        if min_entries < 1 || min_entries > (max_entries + 1) / 2 {
            return Err(GeoRTreeError::InvalidConfig(format!(
                "min_entries must be in [1, {}] for max_entries {}, got {}",
                (max_entries + 1) / 2,
                max_entries,
                min_entries
            )));
        }
        Ok(Self {
            max_entries,
            min_entries,
            split: SplitStrategy::default(),
        })
    }

    /// Replace the lower bound, keeping the fan-out.
    pub fn with_min_entries(self, min_entries: usize) -> Result<Self> {
        Ok(Self::with_bounds(self.max_entries, min_entries)?.with_split(self.split))
    }

    pub fn with_split(mut self, split: SplitStrategy) -> Self {
        self.split = split;
        self
    }

    /// The maximum number of entries in each node.
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// The minimum number of entries in every node except the root.
    pub fn min_entries(&self) -> usize {
        self.min_entries
    }

    pub fn split(&self) -> SplitStrategy {
        self.split
    }
}

impl Default for RTreeConfig {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            min_entries: DEFAULT_MAX_ENTRIES / 2,
            split: SplitStrategy::Quadratic,
        }
    }
}
