use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// A percentile bucket score, always in `1..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: Score = Score(1);
    pub const MAX: Score = Score(5);

    pub fn new(value: u8) -> Result<Self, DomainError> {
        if (1..=5).contains(&value) {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidScore(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// All five scores in ascending order.
    pub fn all() -> [Score; 5] {
        [Score(1), Score(2), Score(3), Score(4), Score(5)]
    }

    pub(crate) fn from_rank(rank: usize) -> Self {
        Self((rank.clamp(1, 5)) as u8)
    }
}

impl TryFrom<u8> for Score {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Recency,
    Frequency,
    Monetary,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Recency, Dimension::Frequency, Dimension::Monetary];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Recency => "recency",
            Self::Frequency => "frequency",
            Self::Monetary => "monetary",
        }
    }

    /// Lower recency means a more recent purchase, so its ranking is reversed.
    pub fn is_inverted(self) -> bool {
        matches!(self, Self::Recency)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw purchase metrics for one customer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CustomerMetrics {
    pub id: String,
    /// Days since the last purchase.
    pub recency: f64,
    /// Number of purchases.
    pub frequency: f64,
    /// Total spend.
    pub monetary: f64,
}

impl CustomerMetrics {
    pub fn new(id: impl Into<String>, recency: f64, frequency: f64, monetary: f64) -> Self {
        Self { id: id.into(), recency, frequency, monetary }
    }

    pub fn value(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Recency => self.recency,
            Dimension::Frequency => self.frequency,
            Dimension::Monetary => self.monetary,
        }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::InvalidRecord {
                id: self.id.clone(),
                reason: "customer id must not be empty".to_string(),
            });
        }

        for dimension in Dimension::ALL {
            let value = self.value(dimension);
            if !value.is_finite() || value < 0.0 {
                return Err(DomainError::InvalidRecord {
                    id: self.id.clone(),
                    reason: format!("{dimension} must be a finite non-negative number, got {value}"),
                });
            }
        }

        Ok(())
    }
}

/// Customer metrics annotated with their percentile scores.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredCustomer {
    #[serde(flatten)]
    pub metrics: CustomerMetrics,
    pub recency_score: Score,
    pub frequency_score: Score,
    pub monetary_score: Score,
}

impl ScoredCustomer {
    pub fn id(&self) -> &str {
        &self.metrics.id
    }

    pub fn score(&self, dimension: Dimension) -> Score {
        match dimension {
            Dimension::Recency => self.recency_score,
            Dimension::Frequency => self.frequency_score,
            Dimension::Monetary => self.monetary_score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CustomerMetrics, Dimension, Score, ScoredCustomer};
    use crate::errors::DomainError;

    #[test]
    fn score_rejects_values_outside_one_to_five() {
        assert_eq!(Score::new(0), Err(DomainError::InvalidScore(0)));
        assert_eq!(Score::new(6), Err(DomainError::InvalidScore(6)));
        assert_eq!(Score::new(3).map(Score::value), Ok(3));
    }

    #[test]
    fn scored_customer_serializes_flat_with_score_fields() {
        let scored = ScoredCustomer {
            metrics: CustomerMetrics::new("customer_001", 12.0, 7.0, 1500.0),
            recency_score: Score::MAX,
            frequency_score: Score::MIN,
            monetary_score: Score::new(3).expect("valid score"),
        };

        let value = serde_json::to_value(&scored).expect("serialize");
        assert_eq!(value["id"], "customer_001");
        assert_eq!(value["recency"], 12.0);
        assert_eq!(value["recency_score"], 5);
        assert_eq!(value["frequency_score"], 1);
        assert_eq!(value["monetary_score"], 3);

        let decoded: ScoredCustomer = serde_json::from_value(value).expect("deserialize");
        assert_eq!(decoded, scored);
    }

    #[test]
    fn deserializing_out_of_range_score_fails() {
        let raw = r#"{"id":"c1","recency":1,"frequency":1,"monetary":1,
            "recency_score":9,"frequency_score":1,"monetary_score":1}"#;
        assert!(serde_json::from_str::<ScoredCustomer>(raw).is_err());
    }

    #[test]
    fn validate_rejects_negative_and_non_finite_values() {
        assert!(CustomerMetrics::new("c1", 0.0, 0.0, 0.0).validate().is_ok());
        assert!(CustomerMetrics::new("c1", -1.0, 0.0, 0.0).validate().is_err());
        assert!(CustomerMetrics::new("c1", 0.0, f64::NAN, 0.0).validate().is_err());
        assert!(CustomerMetrics::new(" ", 0.0, 0.0, 0.0).validate().is_err());
    }

    #[test]
    fn only_recency_is_inverted() {
        assert!(Dimension::Recency.is_inverted());
        assert!(!Dimension::Frequency.is_inverted());
        assert!(!Dimension::Monetary.is_inverted());
    }
}
