// src/sheets/systems/ai/collaborator.rs
//! Collaborator contract
//!
//! The four remote operations the sheet views depend on. Views only ever
//! see `&dyn Collaborator`; the prompt-backed implementation lives in
//! `handlers.rs` and tests use `test_support::StubCollaborator`.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },
    #[error("empty response from model")]
    EmptyResponse,
    #[error("no API key configured (set GEMINI_API_KEY or run `sheetflow api-key set`)")]
    MissingApiKey,
    #[error("cache I/O error: {0}")]
    Cache(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// Input for one aggregation call: a whole sub-sheet plus the row it was
/// generated from.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateRequest {
    pub cells: Vec<Vec<String>>,
    pub origin_row: String,
    /// Header list of the aggregation view (the keys we want back).
    pub columns: Vec<String>,
    /// Header list of the sub-sheet being summarised.
    pub prev_headers: Vec<String>,
    pub instruction: String,
    pub sheet_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateResponse {
    pub sheet_name: String,
    pub aggregated_insights: HashMap<String, String>,
}

#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Flat list of entity names matching `query`.
    async fn find(&self, query: &str, sheet_level: bool) -> Result<Vec<String>, AiError>;

    /// One value per requested column for a single input entity.
    async fn run_cells(
        &self,
        input: &str,
        columns: &[String],
    ) -> Result<HashMap<String, String>, AiError>;

    async fn aggregate(&self, request: &AggregateRequest) -> Result<AggregateResponse, AiError>;

    async fn complete(&self, input: &str, instruction_template: &str) -> Result<String, AiError>;

    /// One completion per input, same order, issued concurrently.
    async fn complete_batch(
        &self,
        inputs: &[String],
        instruction_template: &str,
    ) -> Vec<Result<String, AiError>> {
        join_all(
            inputs
                .iter()
                .map(|input| self.complete(input, instruction_template)),
        )
        .await
    }
}
