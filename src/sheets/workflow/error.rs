// src/sheets/workflow/error.rs

use thiserror::Error;

use super::step::StepKind;
use crate::sheets::database::StoreError;

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("workflow has no step {0}")]
    StepOutOfRange(usize),
    #[error("workflow already has an initial sheet")]
    AlreadyStarted,
    #[error("only the last step (#{last}) can create the next step, not #{requested}")]
    NotLastStep { requested: usize, last: usize },
    #[error("cannot create a {to} step from a {from} step")]
    IncompatibleSource { from: StepKind, to: StepKind },
    #[error("step {index} is a {expected} step, got {actual} data")]
    KindMismatch {
        index: usize,
        expected: StepKind,
        actual: StepKind,
    },
    #[error("{op} is not supported by {kind} steps")]
    Unsupported { kind: StepKind, op: &'static str },
    #[error("aggregation source step {0} is not a 3D stack")]
    AggregationSource(usize),
    #[error("library error: {0}")]
    Store(#[from] StoreError),
}

pub type WorkflowResult<T> = Result<T, WorkflowError>;
