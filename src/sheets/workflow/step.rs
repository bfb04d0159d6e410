// src/sheets/workflow/step.rs
use std::fmt;

use serde::{Deserialize, Serialize};

use super::runnable::RunnableStep;
use crate::sheets::aggregation::AggregationSheet;
use crate::sheets::llm_pipe::LlmPipe;
use crate::sheets::sheet_grid_data::Cell;
use crate::sheets::single_sheet::SingleSheet;
use crate::sheets::three_d::ThreeDStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Single,
    ThreeD,
    Aggregation,
    LlmPipe,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StepKind::Single => "single-sheet",
            StepKind::ThreeD => "3D",
            StepKind::Aggregation => "aggregation",
            StepKind::LlmPipe => "LLM-pipe",
        };
        f.write_str(name)
    }
}

/// One stage of the workflow with its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkflowStep {
    Single(SingleSheet),
    ThreeD(ThreeDStack),
    Aggregation(AggregationSheet),
    LlmPipe(LlmPipe),
}

impl WorkflowStep {
    pub fn kind(&self) -> StepKind {
        match self {
            WorkflowStep::Single(_) => StepKind::Single,
            WorkflowStep::ThreeD(_) => StepKind::ThreeD,
            WorkflowStep::Aggregation(_) => StepKind::Aggregation,
            WorkflowStep::LlmPipe(_) => StepKind::LlmPipe,
        }
    }

    pub fn runnable(&self) -> &dyn RunnableStep {
        match self {
            WorkflowStep::Single(sheet) => sheet,
            WorkflowStep::ThreeD(stack) => stack,
            WorkflowStep::Aggregation(view) => view,
            WorkflowStep::LlmPipe(pipe) => pipe,
        }
    }

    pub fn runnable_mut(&mut self) -> &mut dyn RunnableStep {
        match self {
            WorkflowStep::Single(sheet) => sheet,
            WorkflowStep::ThreeD(stack) => stack,
            WorkflowStep::Aggregation(view) => view,
            WorkflowStep::LlmPipe(pipe) => pipe,
        }
    }

    pub fn headers(&self) -> Vec<String> {
        self.runnable().get_headers()
    }

    /// Header list and rows a following step derives from. A 3D stack
    /// hands over the rows of all its sub-sheets in stack order.
    pub fn downstream_rows(&self) -> (Vec<String>, Vec<Vec<Cell>>) {
        let rows = match self {
            WorkflowStep::Single(sheet) => sheet.grid.rows.clone(),
            WorkflowStep::ThreeD(stack) => stack.flattened_rows(),
            WorkflowStep::Aggregation(view) => view.sheet.grid.rows.clone(),
            WorkflowStep::LlmPipe(pipe) => pipe.grid.rows.clone(),
        };
        (self.headers(), rows)
    }

    pub fn as_three_d(&self) -> Option<&ThreeDStack> {
        match self {
            WorkflowStep::ThreeD(stack) => Some(stack),
            _ => None,
        }
    }
}
