// src/sheets/workflow/runnable.rs
//! The operations the orchestrator can invoke on a step. Each view kind
//! implements the subset it supports; the rest report `Unsupported`.

use async_trait::async_trait;

use super::error::{WorkflowError, WorkflowResult};
use super::step::StepKind;
use crate::sheets::aggregation::AggregationSheet;
use crate::sheets::llm_pipe::LlmPipe;
use crate::sheets::single_sheet::SingleSheet;
use crate::sheets::systems::ai::Collaborator;
use crate::sheets::three_d::ThreeDStack;

#[async_trait]
pub trait RunnableStep: Send {
    fn kind(&self) -> StepKind;

    fn get_headers(&self) -> Vec<String>;

    async fn run_find(&mut self, _ai: &dyn Collaborator) -> WorkflowResult<()> {
        Err(WorkflowError::Unsupported { kind: self.kind(), op: "find" })
    }

    async fn run_cells(&mut self, _ai: &dyn Collaborator) -> WorkflowResult<()> {
        Err(WorkflowError::Unsupported { kind: self.kind(), op: "run cells" })
    }

    async fn run_aggregation(
        &mut self,
        _ai: &dyn Collaborator,
        _source: &ThreeDStack,
    ) -> WorkflowResult<()> {
        Err(WorkflowError::Unsupported { kind: self.kind(), op: "aggregation" })
    }

    async fn run_llm(&mut self, _ai: &dyn Collaborator) -> WorkflowResult<()> {
        Err(WorkflowError::Unsupported { kind: self.kind(), op: "LLM" })
    }
}

#[async_trait]
impl RunnableStep for SingleSheet {
    fn kind(&self) -> StepKind {
        StepKind::Single
    }

    fn get_headers(&self) -> Vec<String> {
        self.headers.clone()
    }

    async fn run_find(&mut self, ai: &dyn Collaborator) -> WorkflowResult<()> {
        SingleSheet::run_find(self, ai).await;
        Ok(())
    }

    async fn run_cells(&mut self, ai: &dyn Collaborator) -> WorkflowResult<()> {
        SingleSheet::run_cells(self, ai).await;
        Ok(())
    }
}

#[async_trait]
impl RunnableStep for ThreeDStack {
    fn kind(&self) -> StepKind {
        StepKind::ThreeD
    }

    fn get_headers(&self) -> Vec<String> {
        self.headers.clone()
    }

    async fn run_find(&mut self, ai: &dyn Collaborator) -> WorkflowResult<()> {
        ThreeDStack::run_find(self, ai).await;
        Ok(())
    }

    async fn run_cells(&mut self, ai: &dyn Collaborator) -> WorkflowResult<()> {
        ThreeDStack::run_cells(self, ai).await;
        Ok(())
    }
}

#[async_trait]
impl RunnableStep for AggregationSheet {
    fn kind(&self) -> StepKind {
        StepKind::Aggregation
    }

    fn get_headers(&self) -> Vec<String> {
        self.sheet.headers.clone()
    }

    async fn run_aggregation(
        &mut self,
        ai: &dyn Collaborator,
        source: &ThreeDStack,
    ) -> WorkflowResult<()> {
        AggregationSheet::run_aggregation(self, ai, source).await;
        Ok(())
    }
}

#[async_trait]
impl RunnableStep for LlmPipe {
    fn kind(&self) -> StepKind {
        StepKind::LlmPipe
    }

    fn get_headers(&self) -> Vec<String> {
        self.headers()
    }

    async fn run_llm(&mut self, ai: &dyn Collaborator) -> WorkflowResult<()> {
        LlmPipe::run_llm(self, ai).await;
        Ok(())
    }
}
