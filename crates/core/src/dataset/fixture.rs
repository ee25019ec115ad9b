use super::{validate_records, DatasetError};
use crate::rfm::CustomerMetrics;

const FIXTURE_JSON: &str = include_str!("../../fixtures/customers.json");

pub fn load_fixture() -> Result<Vec<CustomerMetrics>, DatasetError> {
    parse_records(FIXTURE_JSON)
}

/// Parses a JSON array of `{id, recency, frequency, monetary}` objects.
pub fn parse_records(raw: &str) -> Result<Vec<CustomerMetrics>, DatasetError> {
    let records: Vec<CustomerMetrics> = serde_json::from_str(raw)?;
    validate_records(&records)?;
    Ok(records)
}
