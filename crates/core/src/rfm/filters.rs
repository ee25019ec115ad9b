use serde::{Deserialize, Serialize};

use super::types::{CustomerMetrics, Dimension, ScoredCustomer};

/// Inclusive bounds on one raw dimension.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionRange {
    pub min: f64,
    pub max: f64,
}

impl DimensionRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `min > max` contains nothing.
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// Per-dimension bounds applied to raw metric values.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeFilters {
    pub recency: DimensionRange,
    pub frequency: DimensionRange,
    pub monetary: DimensionRange,
}

impl RangeFilters {
    /// Used when there is no data to derive ranges from.
    pub const FALLBACK: RangeFilters = RangeFilters {
        recency: DimensionRange::new(0.0, 365.0),
        frequency: DimensionRange::new(0.0, 50.0),
        monetary: DimensionRange::new(0.0, 10_000.0),
    };

    pub fn get(&self, dimension: Dimension) -> DimensionRange {
        match dimension {
            Dimension::Recency => self.recency,
            Dimension::Frequency => self.frequency,
            Dimension::Monetary => self.monetary,
        }
    }

    pub fn with(mut self, dimension: Dimension, range: DimensionRange) -> Self {
        match dimension {
            Dimension::Recency => self.recency = range,
            Dimension::Frequency => self.frequency = range,
            Dimension::Monetary => self.monetary = range,
        }
        self
    }

    pub fn matches(&self, metrics: &CustomerMetrics) -> bool {
        Dimension::ALL.iter().all(|dimension| self.get(*dimension).contains(metrics.value(*dimension)))
    }
}

impl Default for RangeFilters {
    fn default() -> Self {
        Self::FALLBACK
    }
}

/// Keeps the customers whose raw metrics fall inside every bound, in order.
pub fn filter_customers(customers: &[ScoredCustomer], filters: &RangeFilters) -> Vec<ScoredCustomer> {
    customers.iter().filter(|customer| filters.matches(&customer.metrics)).cloned().collect()
}

/// Observed min/max of each raw dimension, or [`RangeFilters::FALLBACK`] when empty.
pub fn derive_ranges(customers: &[ScoredCustomer]) -> RangeFilters {
    if customers.is_empty() {
        return RangeFilters::FALLBACK;
    }

    let observed = |dimension: Dimension| {
        customers.iter().map(|customer| customer.metrics.value(dimension)).fold(
            DimensionRange::new(f64::INFINITY, f64::NEG_INFINITY),
            |range, value| DimensionRange::new(range.min.min(value), range.max.max(value)),
        )
    };

    RangeFilters {
        recency: observed(Dimension::Recency),
        frequency: observed(Dimension::Frequency),
        monetary: observed(Dimension::Monetary),
    }
}
