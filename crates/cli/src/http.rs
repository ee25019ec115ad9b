//! reqwest-backed client for the selected-ids endpoint.

use std::time::Duration;

use async_trait::async_trait;
use rfmgrid_core::submission::{ErrorBody, SelectionReceipt, SelectionRequest};
use rfmgrid_core::{SelectionSubmitter, SubmissionError};

#[derive(Clone, Debug)]
pub struct HttpSelectionSubmitter {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpSelectionSubmitter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SubmissionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| SubmissionError::Transport(error.to_string()))?;
        Ok(Self { client, endpoint: endpoint.into() })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SelectionSubmitter for HttpSelectionSubmitter {
    /// Single POST; a non-2xx answer is decoded as `{error}` when possible.
    async fn submit(&self, selected_ids: &[String]) -> Result<SelectionReceipt, SubmissionError> {
        let request = SelectionRequest { selected_ids: selected_ids.to_vec() };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|error| SubmissionError::Transport(error.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|error| SubmissionError::Transport(error.to_string()))?;

        if status.is_success() {
            return serde_json::from_slice::<SelectionReceipt>(&body)
                .map_err(|error| SubmissionError::InvalidResponse(error.to_string()));
        }

        let message = serde_json::from_slice::<ErrorBody>(&body)
            .map(|body| body.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        Err(SubmissionError::Rejected { status: status.as_u16(), message })
    }
}
