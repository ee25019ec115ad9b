//! Percentile scoring of raw RFM metrics.
//!
//! Every dimension is ranked against the values observed in the same input
//! collection. The percentile of a value `v` is `i / n`, where `i` is the
//! first index of the ascending column whose value is `>= v`. Ties are not
//! averaged: all tied values share the percentile of the first one. Recency
//! is inverted after that (`1 - percentile`) so recent customers score high.

use serde::{Deserialize, Serialize};

use super::types::{CustomerMetrics, Dimension, Score, ScoredCustomer};
use crate::errors::DomainError;

/// Four ascending breakpoints in `(0, 1)` that split percentiles into five scores.
///
/// A percentile `p` gets score `1 + |{b : p > b}|`, so with the default
/// breakpoints `p <= 0.2` scores 1 and `p > 0.8` scores 5.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ScoreThresholds([f64; 4]);

impl ScoreThresholds {
    pub const DEFAULT: ScoreThresholds = ScoreThresholds([0.2, 0.4, 0.6, 0.8]);

    pub fn new(breakpoints: [f64; 4]) -> Result<Self, DomainError> {
        let in_unit_interval = breakpoints.iter().all(|b| b.is_finite() && *b > 0.0 && *b < 1.0);
        if !in_unit_interval {
            return Err(DomainError::InvalidThresholds(
                "breakpoints must lie strictly between 0 and 1".to_string(),
            ));
        }
        if breakpoints.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(DomainError::InvalidThresholds(
                "breakpoints must be strictly ascending".to_string(),
            ));
        }
        Ok(Self(breakpoints))
    }

    pub fn breakpoints(&self) -> [f64; 4] {
        self.0
    }

    pub fn score(&self, percentile: f64) -> Score {
        let exceeded = self.0.iter().filter(|breakpoint| percentile > **breakpoint).count();
        Score::from_rank(exceeded + 1)
    }
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<Vec<f64>> for ScoreThresholds {
    type Error = DomainError;

    fn try_from(values: Vec<f64>) -> Result<Self, Self::Error> {
        let breakpoints: [f64; 4] = values.try_into().map_err(|values: Vec<f64>| {
            DomainError::InvalidThresholds(format!(
                "expected exactly 4 breakpoints, got {}",
                values.len()
            ))
        })?;
        Self::new(breakpoints)
    }
}

impl From<ScoreThresholds> for Vec<f64> {
    fn from(thresholds: ScoreThresholds) -> Self {
        thresholds.0.to_vec()
    }
}

/// Sorted values of one dimension, used to rank individual values.
#[derive(Clone, Debug)]
pub struct PercentileColumn {
    sorted: Vec<f64>,
    inverted: bool,
}

impl PercentileColumn {
    pub fn new(values: impl IntoIterator<Item = f64>, inverted: bool) -> Self {
        let mut sorted: Vec<f64> = values.into_iter().collect();
        sorted.sort_by(f64::total_cmp);
        Self { sorted, inverted }
    }

    pub fn for_dimension(records: &[CustomerMetrics], dimension: Dimension) -> Self {
        Self::new(records.iter().map(|record| record.value(dimension)), dimension.is_inverted())
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Percentile of `value` within the column, in `[0, 1]`.
    ///
    /// A value larger than every element matches no index and keeps the
    /// initial percentile of 0 before inversion.
    pub fn percentile(&self, value: f64) -> f64 {
        let index = self.sorted.partition_point(|candidate| *candidate < value);
        let percentile = if index < self.sorted.len() {
            index as f64 / self.sorted.len() as f64
        } else {
            0.0
        };

        if self.inverted {
            1.0 - percentile
        } else {
            percentile
        }
    }
}

/// Converts raw metrics into scored customers.
#[derive(Clone, Debug, Default)]
pub struct ScoreCalculator {
    thresholds: ScoreThresholds,
}

impl ScoreCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: ScoreThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> ScoreThresholds {
        self.thresholds
    }

    pub fn percentile_score(&self, value: f64, column: &PercentileColumn) -> Score {
        self.thresholds.score(column.percentile(value))
    }

    /// Scores every record against the collection it belongs to.
    ///
    /// Output order matches input order; an empty input yields an empty output.
    pub fn score_all(&self, records: &[CustomerMetrics]) -> Vec<ScoredCustomer> {
        let recency = PercentileColumn::for_dimension(records, Dimension::Recency);
        let frequency = PercentileColumn::for_dimension(records, Dimension::Frequency);
        let monetary = PercentileColumn::for_dimension(records, Dimension::Monetary);

        records
            .iter()
            .map(|record| ScoredCustomer {
                recency_score: self.percentile_score(record.recency, &recency),
                frequency_score: self.percentile_score(record.frequency, &frequency),
                monetary_score: self.percentile_score(record.monetary, &monetary),
                metrics: record.clone(),
            })
            .collect()
    }
}

/// Scores records with the default breakpoints.
pub fn calculate_scores(records: &[CustomerMetrics]) -> Vec<ScoredCustomer> {
    ScoreCalculator::new().score_all(records)
}

#[cfg(test)]
mod tests {
    use super::{calculate_scores, PercentileColumn, ScoreCalculator, ScoreThresholds};
    use crate::rfm::types::{CustomerMetrics, Score};

    fn score(value: u8) -> Score {
        Score::new(value).expect("valid score")
    }

    fn record(id: &str, recency: f64, frequency: f64, monetary: f64) -> CustomerMetrics {
        CustomerMetrics::new(id, recency, frequency, monetary)
    }

    #[test]
    fn default_thresholds_map_boundaries_inclusively() {
        let thresholds = ScoreThresholds::DEFAULT;
        assert_eq!(thresholds.score(0.0), score(1));
        assert_eq!(thresholds.score(0.2), score(1));
        assert_eq!(thresholds.score(0.21), score(2));
        assert_eq!(thresholds.score(0.4), score(2));
        assert_eq!(thresholds.score(0.6), score(3));
        assert_eq!(thresholds.score(0.8), score(4));
        assert_eq!(thresholds.score(0.81), score(5));
        assert_eq!(thresholds.score(1.0), score(5));
    }

    #[test]
    fn thresholds_reject_unsorted_or_out_of_range_breakpoints() {
        assert!(ScoreThresholds::new([0.2, 0.4, 0.4, 0.8]).is_err());
        assert!(ScoreThresholds::new([0.0, 0.4, 0.6, 0.8]).is_err());
        assert!(ScoreThresholds::new([0.2, 0.4, 0.6, 1.0]).is_err());
        assert!(ScoreThresholds::try_from(vec![0.2, 0.4]).is_err());
        assert!(ScoreThresholds::try_from(vec![0.1, 0.3, 0.5, 0.7]).is_ok());
    }

    #[test]
    fn percentile_uses_first_index_at_or_above_value() {
        let column = PercentileColumn::new([10.0, 20.0, 20.0, 20.0, 50.0], false);
        assert_eq!(column.percentile(10.0), 0.0);
        assert_eq!(column.percentile(20.0), 0.2);
        assert_eq!(column.percentile(50.0), 0.8);
        assert_eq!(column.percentile(15.0), 0.2);
    }

    #[test]
    fn percentile_of_value_above_every_element_stays_at_zero() {
        let column = PercentileColumn::new([1.0, 2.0], false);
        assert_eq!(column.percentile(3.0), 0.0);

        let inverted = PercentileColumn::new([1.0, 2.0], true);
        assert_eq!(inverted.percentile(3.0), 1.0);
    }

    #[test]
    fn empty_column_has_zero_percentile() {
        let column = PercentileColumn::new(Vec::new(), false);
        assert!(column.is_empty());
        assert_eq!(column.percentile(42.0), 0.0);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(calculate_scores(&[]).is_empty());
    }

    #[test]
    fn identical_values_score_one_except_recency_which_scores_five() {
        let records: Vec<_> =
            (0..4).map(|i| record(&format!("c{i}"), 30.0, 3.0, 250.0)).collect();

        for scored in calculate_scores(&records) {
            assert_eq!(scored.recency_score, score(5));
            assert_eq!(scored.frequency_score, score(1));
            assert_eq!(scored.monetary_score, score(1));
        }
    }

    #[test]
    fn two_record_collection_ranks_lower_values_first() {
        let scored = calculate_scores(&[
            record("c1", 10.0, 5.0, 100.0),
            record("c2", 100.0, 50.0, 10_000.0),
        ]);

        assert_eq!(scored[0].id(), "c1");
        assert_eq!(scored[0].recency_score, score(5));
        assert_eq!(scored[0].frequency_score, score(1));
        assert_eq!(scored[0].monetary_score, score(1));

        // c2 sits at index 1 of 2, so its percentile is 0.5 on every dimension.
        assert_eq!(scored[1].recency_score, score(3));
        assert_eq!(scored[1].frequency_score, score(3));
        assert_eq!(scored[1].monetary_score, score(3));
        assert!(scored[1].frequency_score > scored[0].frequency_score);
        assert!(scored[1].monetary_score > scored[0].monetary_score);
        assert!(scored[1].recency_score < scored[0].recency_score);
    }

    #[test]
    fn ten_distinct_values_spread_across_all_scores() {
        let records: Vec<_> = (0..10)
            .map(|i| record(&format!("c{i}"), f64::from(i), f64::from(i), f64::from(i)))
            .collect();
        let scored = calculate_scores(&records);

        let frequency: Vec<u8> = scored.iter().map(|s| s.frequency_score.value()).collect();
        assert_eq!(frequency, vec![1, 1, 1, 2, 2, 3, 3, 4, 4, 5]);

        let recency: Vec<u8> = scored.iter().map(|s| s.recency_score.value()).collect();
        assert_eq!(recency, vec![5, 5, 4, 4, 3, 3, 2, 2, 1, 1]);
    }

    #[test]
    fn scoring_preserves_input_order_and_metrics() {
        let records =
            vec![record("b", 3.0, 1.0, 9.0), record("a", 1.0, 2.0, 8.0), record("c", 2.0, 3.0, 7.0)];
        let scored = calculate_scores(&records);

        let ids: Vec<&str> = scored.iter().map(|s| s.id()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
        for (scored, raw) in scored.iter().zip(&records) {
            assert_eq!(&scored.metrics, raw);
        }
    }

    #[test]
    fn custom_thresholds_change_score_boundaries() {
        let calculator =
            ScoreCalculator::with_thresholds(ScoreThresholds::new([0.1, 0.2, 0.3, 0.4]).unwrap());
        let column = PercentileColumn::new([1.0, 2.0], false);
        assert_eq!(calculator.percentile_score(2.0, &column), score(5));
    }
}
