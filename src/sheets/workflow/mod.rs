// src/sheets/workflow/mod.rs
//! Workflow Orchestrator
//!
//! An ordered list of steps plus the rules that keep adjacent steps in
//! sync.
//!
//! ## Responsibilities
//!
//! - Create the initial sheet and append derived steps from the last step
//! - Replace a step's data and cascade one hop downstream (`derive_next`)
//! - Run every step in order, isolating failures per step
//! - Cascade library deletions into the 3D steps that reference them
//!
//! Steps are never mutated in place by a run: a copy is worked on and
//! then swapped in through `edit_step`.

pub mod derive;
pub mod error;
pub mod runnable;
pub mod step;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

pub use derive::derive_next;
pub use error::{WorkflowError, WorkflowResult};
pub use runnable::RunnableStep;
pub use step::{StepKind, WorkflowStep};

use crate::sheets::aggregation::AggregationSheet;
use crate::sheets::database::{SheetLibrary, SpreadsheetStore};
use crate::sheets::llm_pipe::LlmPipe;
use crate::sheets::single_sheet::SingleSheet;
use crate::sheets::systems::ai::Collaborator;
use crate::sheets::three_d::ThreeDStack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Empty,
    Active,
}

/// Outcome of `run_all`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub completed: Vec<usize>,
    pub failed: Vec<(usize, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workflow {
    steps: Vec<WorkflowStep>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WorkflowState {
        if self.is_empty() {
            WorkflowState::Empty
        } else {
            WorkflowState::Active
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn step(&self, index: usize) -> WorkflowResult<&WorkflowStep> {
        self.steps.get(index).ok_or(WorkflowError::StepOutOfRange(index))
    }

    /// Only the last step accepts "create next step" actions.
    pub fn can_append(&self, index: usize) -> bool {
        !self.steps.is_empty() && index == self.steps.len() - 1
    }

    pub fn create_initial_sheet(&mut self) -> WorkflowResult<usize> {
        if !self.steps.is_empty() {
            return Err(WorkflowError::AlreadyStarted);
        }
        self.steps.push(WorkflowStep::Single(SingleSheet::default()));
        info!("Workflow: created initial sheet");
        Ok(0)
    }

    fn appendable(&self, index: usize) -> WorkflowResult<&WorkflowStep> {
        let step = self.step(index)?;
        if !self.can_append(index) {
            return Err(WorkflowError::NotLastStep {
                requested: index,
                last: self.steps.len() - 1,
            });
        }
        Ok(step)
    }

    fn push(&mut self, step: WorkflowStep) -> usize {
        info!("Workflow: appended {} step #{}", step.kind(), self.steps.len());
        self.steps.push(step);
        self.steps.len() - 1
    }

    /// New 3D step with one sub-sheet per current row of step `index`.
    pub fn append_three_d(&mut self, index: usize) -> WorkflowResult<usize> {
        let step = self.appendable(index)?;
        let stack = match step {
            WorkflowStep::Single(_) | WorkflowStep::Aggregation(_) => {
                let (headers, rows) = step.downstream_rows();
                ThreeDStack::from_rows(headers, &rows)
            }
            other => {
                return Err(WorkflowError::IncompatibleSource {
                    from: other.kind(),
                    to: StepKind::ThreeD,
                })
            }
        };
        Ok(self.push(WorkflowStep::ThreeD(stack)))
    }

    /// New aggregation step bound to the 3D step `index`.
    pub fn append_aggregation(&mut self, index: usize, instruction: impl Into<String>) -> WorkflowResult<usize> {
        let step = self.appendable(index)?;
        if step.kind() != StepKind::ThreeD {
            return Err(WorkflowError::IncompatibleSource {
                from: step.kind(),
                to: StepKind::Aggregation,
            });
        }
        Ok(self.push(WorkflowStep::Aggregation(AggregationSheet::new(index, instruction))))
    }

    pub fn append_llm_pipe(&mut self, index: usize, instruction: impl Into<String>) -> WorkflowResult<usize> {
        let step = self.appendable(index)?;
        let (headers, rows) = step.downstream_rows();
        let pipe = LlmPipe::from_source(&headers, &rows, instruction);
        Ok(self.push(WorkflowStep::LlmPipe(pipe)))
    }

    /// Replaces the data of step `index` and recomputes step `index + 1`
    /// when its kind derives from this one. Returns whether it cascaded.
    /// Propagation stops after one hop.
    pub fn edit_step(&mut self, index: usize, data: WorkflowStep) -> WorkflowResult<bool> {
        let current = self.step(index)?;
        if current.kind() != data.kind() {
            return Err(WorkflowError::KindMismatch {
                index,
                expected: current.kind(),
                actual: data.kind(),
            });
        }
        let derived = self
            .steps
            .get(index + 1)
            .and_then(|next| derive_next(&data, next));
        self.steps[index] = data;
        match derived {
            Some(next) => {
                debug!("Workflow: step {} cascaded into step {}", index, index + 1);
                self.steps[index + 1] = next;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Applies `edit` to a copy of step `index` and commits it with `edit_step`.
    pub fn update_step<R>(
        &mut self,
        index: usize,
        edit: impl FnOnce(&mut WorkflowStep) -> R,
    ) -> WorkflowResult<R> {
        let mut working = self.step(index)?.clone();
        let result = edit(&mut working);
        self.edit_step(index, working)?;
        Ok(result)
    }

    /// Deletes an entity from the library and from every 3D step that
    /// references it. Returns how many steps changed.
    pub fn delete_entity<S: SpreadsheetStore>(
        &mut self,
        library: &mut SheetLibrary<S>,
        entity_id: &str,
    ) -> WorkflowResult<usize> {
        library.delete_entity(entity_id)?;
        let mut changed = 0;
        for index in 0..self.steps.len() {
            let WorkflowStep::ThreeD(stack) = &self.steps[index] else {
                continue;
            };
            let mut stack = stack.clone();
            if stack.remove_entity(entity_id) {
                self.edit_step(index, WorkflowStep::ThreeD(stack))?;
                changed += 1;
            }
        }
        info!("Workflow: entity {} removed from {} steps", entity_id, changed);
        Ok(changed)
    }

    fn aggregation_source(&self, source_step: usize) -> WorkflowResult<&ThreeDStack> {
        self.steps
            .get(source_step)
            .and_then(WorkflowStep::as_three_d)
            .ok_or(WorkflowError::AggregationSource(source_step))
    }

    /// Runs the operations of one step: find then run-cells for sheets and
    /// stacks, aggregation for aggregation views, LLM for pipes. The
    /// result is committed through `edit_step`, so the next step is
    /// re-derived before this returns.
    pub async fn run_step(&mut self, index: usize, ai: &dyn Collaborator) -> WorkflowResult<()> {
        let mut working = self.step(index)?.clone();
        match &mut working {
            WorkflowStep::Aggregation(view) => {
                let source = self.aggregation_source(view.source_step)?;
                RunnableStep::run_aggregation(view, ai, source).await?;
            }
            WorkflowStep::LlmPipe(pipe) => {
                RunnableStep::run_llm(pipe, ai).await?;
            }
            step => {
                let step = step.runnable_mut();
                step.run_find(ai).await?;
                step.run_cells(ai).await?;
            }
        }
        self.edit_step(index, working)?;
        Ok(())
    }

    /// Runs every step in order, each fully settled before the next one
    /// starts. A failing step is logged and skipped. `settle` adds an
    /// optional pause between steps.
    pub async fn run_all(&mut self, ai: &dyn Collaborator, settle: Duration) -> RunSummary {
        let mut summary = RunSummary::default();
        let total = self.steps.len();
        for index in 0..total {
            info!("Run all: step {}/{} ({})", index + 1, total, self.steps[index].kind());
            match self.run_step(index, ai).await {
                Ok(()) => summary.completed.push(index),
                Err(e) => {
                    error!("Run all: step {} failed: {}", index, e);
                    summary.failed.push((index, e.to_string()));
                }
            }
            if !settle.is_zero() && index + 1 < total {
                tokio::time::sleep(settle).await;
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::database::MemoryStore;
    use crate::sheets::systems::ai::test_support::StubCollaborator;

    fn with_initial(values: &[&str]) -> Workflow {
        let mut workflow = Workflow::new();
        workflow.create_initial_sheet().unwrap();
        workflow
            .update_step(0, |step| {
                if let WorkflowStep::Single(sheet) = step {
                    for (r, v) in values.iter().enumerate() {
                        sheet.set_cell(r, 0, *v);
                    }
                }
            })
            .unwrap();
        workflow
    }

    fn single(workflow: &Workflow, index: usize) -> &SingleSheet {
        match workflow.step(index).unwrap() {
            WorkflowStep::Single(sheet) => sheet,
            other => panic!("expected single sheet, got {}", other.kind()),
        }
    }

    fn stack(workflow: &Workflow, index: usize) -> &ThreeDStack {
        workflow.step(index).unwrap().as_three_d().unwrap()
    }

    #[test]
    fn test_initial_sheet_transition() {
        let mut workflow = Workflow::new();
        assert_eq!(workflow.state(), WorkflowState::Empty);
        assert_eq!(workflow.create_initial_sheet().unwrap(), 0);
        assert_eq!(workflow.state(), WorkflowState::Active);
        assert_eq!(single(&workflow, 0).headers, vec!["Input"]);
        assert_eq!(single(&workflow, 0).grid.row_count(), 1);
        assert!(matches!(workflow.create_initial_sheet(), Err(WorkflowError::AlreadyStarted)));
    }

    #[test]
    fn test_append_three_d_from_edited_row() {
        let mut workflow = with_initial(&["Acme Corp"]);
        assert_eq!(workflow.append_three_d(0).unwrap(), 1);
        let stack = stack(&workflow, 1);
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.sub_sheets[0].origin_cell().unwrap().value, "Acme Corp");
    }

    #[test]
    fn test_append_rules() {
        let mut workflow = with_initial(&["a"]);
        assert!(matches!(
            workflow.append_aggregation(0, ""),
            Err(WorkflowError::IncompatibleSource { from: StepKind::Single, to: StepKind::Aggregation })
        ));
        workflow.append_three_d(0).unwrap();
        assert!(matches!(
            workflow.append_three_d(0),
            Err(WorkflowError::NotLastStep { requested: 0, last: 1 })
        ));
        assert!(matches!(
            workflow.append_three_d(1),
            Err(WorkflowError::IncompatibleSource { from: StepKind::ThreeD, to: StepKind::ThreeD })
        ));
        workflow.append_aggregation(1, "sum").unwrap();
        workflow.append_three_d(2).unwrap();
        workflow.append_llm_pipe(3, "describe").unwrap();
        assert_eq!(workflow.len(), 5);
        assert!(matches!(workflow.append_llm_pipe(9, ""), Err(WorkflowError::StepOutOfRange(9))));
        assert!(workflow.can_append(4));
        assert!(!workflow.can_append(3));
    }

    #[test]
    fn test_edit_single_cascades_into_three_d() {
        let mut workflow = with_initial(&["a"]);
        workflow.append_three_d(0).unwrap();
        let mut data = single(&workflow, 0).clone();
        data.set_cell(1, 0, "b");
        data.set_cell(2, 0, "c");
        assert!(workflow.edit_step(0, WorkflowStep::Single(data.clone())).unwrap());
        let stack = stack(&workflow, 1);
        assert_eq!(stack.len(), data.grid.row_count());
        for (k, sub) in stack.sub_sheets.iter().enumerate() {
            assert_eq!(sub.origin, data.grid.rows[k]);
        }
    }

    #[test]
    fn test_cascade_stops_after_one_hop() {
        let mut workflow = with_initial(&["a"]);
        workflow.append_three_d(0).unwrap();
        workflow.append_llm_pipe(1, "x").unwrap();
        let pipe_before = workflow.step(2).unwrap().clone();

        workflow
            .update_step(0, |step| {
                if let WorkflowStep::Single(sheet) = step {
                    sheet.set_cell(1, 0, "b");
                }
            })
            .unwrap();
        assert_eq!(stack(&workflow, 1).len(), 2);
        assert_eq!(workflow.step(2).unwrap(), &pipe_before);
    }

    #[test]
    fn test_edit_with_wrong_kind_rejected() {
        let mut workflow = with_initial(&["a"]);
        let err = workflow
            .edit_step(0, WorkflowStep::LlmPipe(LlmPipe::from_source(&[], &[], "")))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::KindMismatch { index: 0, .. }));
    }

    #[test]
    fn test_delete_entity_cascades_to_steps() {
        let mut workflow = with_initial(&["a", "b"]);
        workflow.append_three_d(0).unwrap();
        let mut library = SheetLibrary::open(MemoryStore::new()).unwrap();
        library.store_stack(stack(&workflow, 1)).unwrap();
        let id = stack(&workflow, 1).sub_sheets[0].entity_id.clone();

        assert_eq!(workflow.delete_entity(&mut library, &id).unwrap(), 1);
        assert_eq!(stack(&workflow, 1).len(), 1);
        assert_eq!(stack(&workflow, 1).sub_sheets[0].name(), "b");
        assert!(library.entity(&id).is_none());
        assert!(matches!(
            workflow.delete_entity(&mut library, &id),
            Err(WorkflowError::Store(_))
        ));
    }

    #[tokio::test]
    async fn test_run_all_single_three_d_aggregation() {
        let ai = StubCollaborator::new()
            .with_find("Input", &["Acme", "Globex"])
            .with_find("Acme", &["Rockets", "Anvils"])
            .with_find("Globex", &["Hammocks"]);
        let mut workflow = with_initial(&[""]);
        workflow.append_three_d(0).unwrap();
        workflow.append_aggregation(1, "summarise").unwrap();

        let summary = workflow.run_all(&ai, Duration::ZERO).await;
        assert_eq!(summary.completed, vec![0, 1, 2]);
        assert!(summary.failed.is_empty());

        let stack = stack(&workflow, 1);
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.sub_sheets[0].grid.row_count(), 2);

        let WorkflowStep::Aggregation(view) = workflow.step(2).unwrap() else {
            panic!("expected aggregation");
        };
        assert_eq!(view.sheet.grid.row_count(), 2);
        assert_eq!(view.sheet.grid.value(0, 0), "Acme");
        assert_eq!(view.sheet.grid.value(1, 0), "Globex");
        assert_eq!(view.sheet.grid.value(1, 1), "Summary of Globex");
    }

    #[tokio::test]
    async fn test_run_all_continues_past_failing_step() {
        let ai = StubCollaborator::new().with_find("Input", &["x"]);
        let mut workflow = with_initial(&["a"]);
        workflow.append_three_d(0).unwrap();
        workflow.append_aggregation(1, "").unwrap();
        workflow
            .update_step(2, |step| {
                if let WorkflowStep::Aggregation(view) = step {
                    view.sheet.set_cell(0, 0, "Acme");
                }
            })
            .unwrap();
        workflow.append_llm_pipe(2, "Describe").unwrap();
        // Point the aggregation at a step that is not a 3D stack
        workflow.steps[2] = match workflow.steps[2].clone() {
            WorkflowStep::Aggregation(mut view) => {
                view.source_step = 0;
                WorkflowStep::Aggregation(view)
            }
            other => other,
        };

        let summary = workflow.run_all(&ai, Duration::ZERO).await;
        assert_eq!(summary.completed, vec![0, 1, 3]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].0, 2);
        let WorkflowStep::LlmPipe(pipe) = workflow.step(3).unwrap() else {
            panic!("expected LLM pipe");
        };
        assert!(pipe.output(0).starts_with("Describe => "));
    }

    #[tokio::test]
    async fn test_run_step_aggregation_commits_and_cascades() {
        let ai = StubCollaborator::new();
        let mut workflow = with_initial(&["Acme", "Globex"]);
        workflow.append_three_d(0).unwrap();
        workflow.append_aggregation(1, "").unwrap();
        workflow.append_llm_pipe(2, "Tag").unwrap();

        workflow.run_step(2, &ai).await.unwrap();
        assert_eq!(ai.calls(), vec!["aggregate:Acme", "aggregate:Globex"]);
        let WorkflowStep::LlmPipe(pipe) = workflow.step(3).unwrap() else {
            panic!("expected LLM pipe");
        };
        assert_eq!(pipe.grid.value(0, 0), "Name: Acme\nSummary: Summary of Acme");
        assert_eq!(pipe.grid.row_count(), 2);
    }

    #[tokio::test]
    async fn test_run_step_llm_pipe_batch() {
        let ai = StubCollaborator::new();
        let mut workflow = with_initial(&["a", "b"]);
        workflow.append_llm_pipe(0, "Tag").unwrap();
        workflow.run_step(1, &ai).await.unwrap();
        let WorkflowStep::LlmPipe(pipe) = workflow.step(1).unwrap() else {
            panic!("expected LLM pipe");
        };
        assert_eq!(pipe.output(0), "Tag => Input: a");
        assert_eq!(pipe.output(1), "Tag => Input: b");

        // Re-editing the source keeps the reply for the unchanged row
        workflow
            .update_step(0, |step| {
                if let WorkflowStep::Single(sheet) = step {
                    sheet.set_cell(0, 0, "a2");
                }
            })
            .unwrap();
        let WorkflowStep::LlmPipe(pipe) = workflow.step(1).unwrap() else {
            panic!("expected LLM pipe");
        };
        assert_eq!(pipe.output(0), "");
        assert_eq!(pipe.output(1), "Tag => Input: b");
    }

    #[test]
    fn test_workflow_serde_round_trip_keeps_kinds() {
        let mut workflow = with_initial(&["a"]);
        workflow.append_three_d(0).unwrap();
        let json = serde_json::to_string(&workflow).unwrap();
        assert!(json.contains("\"kind\":\"three_d\""));
        let back: Workflow = serde_json::from_str(&json).unwrap();
        assert_eq!(back, workflow);
    }
}
