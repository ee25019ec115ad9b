pub mod config;
pub mod dashboard;
pub mod dataset;
pub mod errors;
pub mod rfm;
pub mod submission;

pub use dashboard::{DashboardCounts, DashboardState, GridCellView, Selection, SelectionSummary};
pub use dataset::{DataSource, DatasetError};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use rfm::{
    calculate_scores, derive_ranges, filter_customers, organize_grid, CellTier, CustomerMetrics,
    Dimension, DimensionRange, GridBuckets, GridKey, RangeFilters, Score, ScoreCalculator,
    ScoreThresholds, ScoredCustomer, Segment,
};
pub use submission::{
    EchoSubmitter, SelectionReceipt, SelectionRequest, SelectionSubmitter, SubmissionError,
};
