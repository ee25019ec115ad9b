//! RFM scoring, filtering, and grid bucketing.
//!
//! Everything here is a pure function of its input: records flow through
//! [`scoring`], are narrowed by [`filters`], and are grouped by [`grid`].

pub mod filters;
pub mod grid;
pub mod scoring;
pub mod types;

pub use filters::{derive_ranges, filter_customers, DimensionRange, RangeFilters};
pub use grid::{organize_grid, CellTier, GridBuckets, GridKey, Segment};
pub use scoring::{calculate_scores, PercentileColumn, ScoreCalculator, ScoreThresholds};
pub use types::{CustomerMetrics, Dimension, Score, ScoredCustomer};
