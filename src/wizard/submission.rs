//! Submission collaborator seam.
//!
//! The wizard hands the finished payload to a [`Submission`] backend and
//! knows nothing else about it. [`SimulatedSubmission`] stands in for a real
//! listings API in the binary.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use uuid::Uuid;

use super::payload::FormPayload;

/// Whether the wizard is creating a listing or editing an existing one
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema)]
#[serde(tag = "mode", rename_all = "lowercase")]
#[ts(export)]
pub enum SubmissionMode {
    Create,
    Edit { id: String },
}

impl SubmissionMode {
    pub fn listing_id(&self) -> Option<&str> {
        match self {
            SubmissionMode::Create => None,
            SubmissionMode::Edit { id } => Some(id),
        }
    }
}

/// Everything a backend receives on submit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionRequest {
    #[serde(flatten)]
    pub mode: SubmissionMode,
    pub payload: FormPayload,
}

/// Acknowledgement of an accepted listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, JsonSchema)]
#[ts(export)]
pub struct SubmissionReceipt {
    pub listing_id: String,
    pub submitted_at: DateTime<Utc>,
}

/// Errors surfaced by the terminal submit action
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("a submission is already in progress")]
    InFlight,

    #[error("listing was rejected: {0}")]
    Rejected(String),

    #[error("submission service unavailable: {0}")]
    Unavailable(String),
}

/// Backend that accepts finished listings
#[async_trait]
pub trait Submission: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &str;

    async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionReceipt, SubmissionError>;
}

/// Accepts every listing after a fixed delay
pub struct SimulatedSubmission {
    latency: Duration,
}

impl SimulatedSubmission {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl Submission for SimulatedSubmission {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn submit(
        &self,
        request: &SubmissionRequest,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        tokio::time::sleep(self.latency).await;

        let listing_id = request
            .mode
            .listing_id()
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        Ok(SubmissionReceipt {
            listing_id,
            submitted_at: Utc::now(),
        })
    }
}
