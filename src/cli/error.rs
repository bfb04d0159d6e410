// src/cli/error.rs

use thiserror::Error;

use crate::sheets::database::StoreError;
use crate::sheets::systems::ai::AiError;
use crate::sheets::workflow::WorkflowError;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Ai(#[from] AiError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("workflow file is not valid JSON: {0}")]
    WorkflowFile(#[from] serde_json::Error),
    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),
    #[error("no API key configured; set GEMINI_API_KEY or run `sheetflow api-key set <KEY>`")]
    NoApiKey,
    #[error("{0}")]
    Rejected(String),
}

pub type CliResult<T> = Result<T, CliError>;
