//! Where customer metrics come from.

pub mod fixture;
pub mod synthetic;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::errors::{ApplicationError, DomainError};
use crate::rfm::CustomerMetrics;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("could not parse customer fixture: {0}")]
    Parse(#[from] serde_json::Error),
    #[error(transparent)]
    InvalidRecord(#[from] DomainError),
    #[error("duplicate customer id `{0}`")]
    DuplicateId(String),
}

impl From<DatasetError> for ApplicationError {
    fn from(value: DatasetError) -> Self {
        ApplicationError::Dataset(value.to_string())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    /// The bundled 150-customer fixture.
    Fixture,
    /// Generated data; `seed: None` draws a fresh seed.
    Synthetic { seed: Option<u64> },
}

impl Default for DataSource {
    fn default() -> Self {
        Self::Fixture
    }
}

impl DataSource {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fixture => "fixture",
            Self::Synthetic { .. } => "synthetic",
        }
    }

    pub fn seed(&self) -> Option<u64> {
        match self {
            Self::Fixture => None,
            Self::Synthetic { seed } => *seed,
        }
    }

    /// Pins an unseeded synthetic source to a concrete seed so it can be reproduced.
    pub fn resolve(self) -> Self {
        match self {
            Self::Synthetic { seed: None } => Self::Synthetic { seed: Some(rand::random()) },
            other => other,
        }
    }

    pub fn load(&self) -> Result<Vec<CustomerMetrics>, DatasetError> {
        let records = match self {
            Self::Fixture => fixture::load_fixture()?,
            Self::Synthetic { seed } => match seed {
                Some(seed) => synthetic::generate_seeded(*seed),
                None => synthetic::generate(&mut rand::thread_rng()),
            },
        };
        debug!(
            event_name = "dataset.loaded",
            source = self.name(),
            seed = ?self.seed(),
            record_count = records.len(),
            "customer dataset loaded"
        );
        Ok(records)
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataSource {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixture" | "json" => Ok(Self::Fixture),
            "synthetic" | "dynamic" => Ok(Self::Synthetic { seed: None }),
            other => Err(DomainError::UnknownDataSource(other.to_string())),
        }
    }
}

/// Validates every record and rejects repeated ids.
pub fn validate_records(records: &[CustomerMetrics]) -> Result<(), DatasetError> {
    let mut seen = std::collections::HashSet::with_capacity(records.len());
    for record in records {
        record.validate()?;
        if !seen.insert(record.id.as_str()) {
            return Err(DatasetError::DuplicateId(record.id.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{validate_records, DataSource, DatasetError};
    use crate::rfm::CustomerMetrics;

    #[test]
    fn parses_source_names_and_aliases() {
        assert_eq!("fixture".parse::<DataSource>().unwrap(), DataSource::Fixture);
        assert_eq!("JSON".parse::<DataSource>().unwrap(), DataSource::Fixture);
        assert_eq!(
            "dynamic".parse::<DataSource>().unwrap(),
            DataSource::Synthetic { seed: None }
        );
        assert!("csv".parse::<DataSource>().is_err());
    }

    #[test]
    fn resolve_pins_unseeded_synthetic_sources_only() {
        assert_eq!(DataSource::Fixture.resolve(), DataSource::Fixture);
        assert_eq!(DataSource::Synthetic { seed: Some(7) }.resolve().seed(), Some(7));
        assert!(DataSource::Synthetic { seed: None }.resolve().seed().is_some());
    }

    #[test]
    fn seeded_synthetic_source_is_reproducible() {
        let source = DataSource::Synthetic { seed: Some(99) };
        assert_eq!(source.load().unwrap(), source.load().unwrap());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let records = vec![
            CustomerMetrics::new("c1", 1.0, 1.0, 1.0),
            CustomerMetrics::new("c1", 2.0, 2.0, 2.0),
        ];
        assert!(matches!(validate_records(&records), Err(DatasetError::DuplicateId(id)) if id == "c1"));
    }
}
