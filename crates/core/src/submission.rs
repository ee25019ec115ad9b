//! Wire contract for submitting selected customer ids.
//!
//! The endpoint accepts `{"selectedIds": [...]}` and answers with a
//! [`SelectionReceipt`] echoing the ids back. It does not persist anything,
//! so any service with the same request/response shape can stand in for it.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::dashboard::Selection;
use crate::errors::DomainError;

pub const SELECTED_IDS_PATH: &str = "/api/selected-ids";
pub const SELECTED_IDS_FIELD: &str = "selectedIds";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionRequest {
    pub selected_ids: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionReceipt {
    pub success: bool,
    pub message: String,
    pub selected_ids: Vec<String>,
    pub timestamp: String,
}

impl SelectionReceipt {
    pub fn acknowledge(selected_ids: Vec<String>, at: DateTime<Utc>) -> Self {
        Self {
            success: true,
            message: format!("{} customers selected successfully", selected_ids.len()),
            selected_ids,
            timestamp: at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Self-description returned by `GET` on the endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointInfo {
    pub message: String,
    pub endpoint: &'static str,
    pub method: &'static str,
    pub expected_body: SelectionRequest,
}

impl Default for EndpointInfo {
    fn default() -> Self {
        Self {
            message: "RFM segmentation API is running".to_string(),
            endpoint: SELECTED_IDS_PATH,
            method: "POST",
            expected_body: SelectionRequest {
                selected_ids: vec!["customer_001".to_string(), "customer_002".to_string()],
            },
        }
    }
}

/// Extracts the id list from an arbitrary JSON request body.
pub fn parse_selection_body(body: &Value) -> Result<Vec<String>, DomainError> {
    let Some(Value::Array(items)) = body.get(SELECTED_IDS_FIELD) else {
        return Err(DomainError::InvalidSelection(format!("{SELECTED_IDS_FIELD} must be an array")));
    };

    items
        .iter()
        .map(|item| match item {
            Value::String(id) => Ok(id.clone()),
            _ => Err(DomainError::InvalidSelection(format!(
                "{SELECTED_IDS_FIELD} must contain only strings"
            ))),
        })
        .collect()
}

/// Logs the ids and acknowledges them. No state is kept.
pub fn record_selection(
    selected_ids: Vec<String>,
    correlation_id: &str,
    at: DateTime<Utc>,
) -> SelectionReceipt {
    info!(
        event_name = "selection.received",
        correlation_id,
        selected_count = selected_ids.len(),
        selected_ids = ?selected_ids,
        "selected customer ids received"
    );
    SelectionReceipt::acknowledge(selected_ids, at)
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("no customers selected; select at least one customer first")]
    EmptySelection,
    #[error("submission rejected with status {status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("submission transport failed: {0}")]
    Transport(String),
    #[error("submission response could not be decoded: {0}")]
    InvalidResponse(String),
}

/// Something that accepts a selection and returns a receipt. One attempt per call.
#[async_trait]
pub trait SelectionSubmitter: Send + Sync {
    async fn submit(&self, selected_ids: &[String]) -> Result<SelectionReceipt, SubmissionError>;
}

/// In-process stand-in for the endpoint.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoSubmitter;

#[async_trait]
impl SelectionSubmitter for EchoSubmitter {
    async fn submit(&self, selected_ids: &[String]) -> Result<SelectionReceipt, SubmissionError> {
        Ok(record_selection(selected_ids.to_vec(), "local", Utc::now()))
    }
}

/// Rejects an empty selection locally, otherwise makes a single submission attempt.
pub async fn submit_selection(
    submitter: &dyn SelectionSubmitter,
    selection: &Selection,
) -> Result<SelectionReceipt, SubmissionError> {
    if selection.is_empty() {
        return Err(SubmissionError::EmptySelection);
    }
    submitter.submit(selection.ids()).await
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::{
        parse_selection_body, submit_selection, EchoSubmitter, EndpointInfo, SelectionReceipt,
        SubmissionError,
    };
    use crate::dashboard::Selection;
    use crate::errors::DomainError;

    #[test]
    fn parses_string_arrays() {
        let ids = parse_selection_body(&json!({"selectedIds": ["customer_001", "customer_002"]}))
            .expect("valid body");
        assert_eq!(ids, vec!["customer_001", "customer_002"]);

        let empty = parse_selection_body(&json!({"selectedIds": []})).expect("empty is valid");
        assert!(empty.is_empty());
    }

    #[test]
    fn rejects_non_array_or_missing_field() {
        for body in [json!({"selectedIds": "not-an-array"}), json!({}), json!([1, 2]), json!(null)] {
            assert_eq!(
                parse_selection_body(&body),
                Err(DomainError::InvalidSelection("selectedIds must be an array".to_string()))
            );
        }
    }

    #[test]
    fn rejects_non_string_items() {
        let error = parse_selection_body(&json!({"selectedIds": ["a", 7]})).unwrap_err();
        assert!(error.to_string().contains("only strings"));
    }

    #[test]
    fn receipt_echoes_ids_and_mentions_count() {
        let at = Utc.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();
        let receipt = SelectionReceipt::acknowledge(
            vec!["customer_001".to_string(), "customer_002".to_string()],
            at,
        );
        assert!(receipt.success);
        assert!(receipt.message.contains('2'));
        assert_eq!(receipt.timestamp, "2024-05-17T09:30:00.000Z");

        let value = serde_json::to_value(&receipt).unwrap();
        assert_eq!(value["selectedIds"], json!(["customer_001", "customer_002"]));
    }

    #[test]
    fn endpoint_info_shows_expected_body_shape() {
        let value = serde_json::to_value(EndpointInfo::default()).unwrap();
        assert_eq!(value["endpoint"], "/api/selected-ids");
        assert_eq!(value["method"], "POST");
        assert_eq!(value["expectedBody"]["selectedIds"][0], "customer_001");
    }

    #[tokio::test]
    async fn empty_selection_is_rejected_before_submitting() {
        let result = submit_selection(&EchoSubmitter, &Selection::new()).await;
        assert_eq!(result, Err(SubmissionError::EmptySelection));
    }

    #[tokio::test]
    async fn echo_submitter_acknowledges_selection() {
        let selection = Selection::from_ids(["customer_003"]);
        let receipt = submit_selection(&EchoSubmitter, &selection).await.expect("echo succeeds");
        assert_eq!(receipt.selected_ids, vec!["customer_003"]);
        assert!(receipt.message.starts_with("1 "));
    }
}
