// src/cli/edit.rs
//! `sheetflow edit`: one grid edit applied to a copy of a step, then
//! committed through the workflow so the next step is re-derived.

use clap::Subcommand;

use super::context::CliContext;
use super::error::{CliError, CliResult};
use crate::sheets::workflow::{WorkflowError, WorkflowStep};

#[derive(Subcommand, Debug, Clone)]
pub enum EditOp {
    /// Set one cell. `--sheet` picks the sub-sheet of a 3D step
    SetCell {
        row: usize,
        col: usize,
        value: String,
        #[arg(long, default_value_t = 0)]
        sheet: usize,
    },
    /// Append a column with a placeholder header
    AddColumn,
    /// Delete a column (the last one is kept)
    DeleteColumn { col: usize },
    /// Rename a column header
    RenameHeader { col: usize, name: String },
    /// Append a blank row
    AddRow {
        #[arg(long, default_value_t = 0)]
        sheet: usize,
    },
    /// Delete a row (the last one is kept)
    DeleteRow {
        row: usize,
        #[arg(long, default_value_t = 0)]
        sheet: usize,
    },
    /// Clear all rows, or all sub-sheets of a 3D step
    ClearRows,
    /// Set the sheet title used as the Find query
    Title { title: String },
    /// Add a sub-sheet to a 3D step
    AddSubSheet { name: String },
    /// Delete a sub-sheet of a 3D step
    DeleteSubSheet { sheet: usize },
    /// Select a sub-sheet of a 3D step (scrolls the visible window)
    Select { sheet: usize },
    /// Replace the instruction of an aggregation or LLM-pipe step
    Instruction { text: String },
}

impl EditOp {
    fn name(&self) -> &'static str {
        match self {
            EditOp::SetCell { .. } => "set cell",
            EditOp::AddColumn => "add column",
            EditOp::DeleteColumn { .. } => "delete column",
            EditOp::RenameHeader { .. } => "rename header",
            EditOp::AddRow { .. } => "add row",
            EditOp::DeleteRow { .. } => "delete row",
            EditOp::ClearRows => "clear rows",
            EditOp::Title { .. } => "title",
            EditOp::AddSubSheet { .. } => "add sub-sheet",
            EditOp::DeleteSubSheet { .. } => "delete sub-sheet",
            EditOp::Select { .. } => "select",
            EditOp::Instruction { .. } => "instruction",
        }
    }
}

/// Applies `op` to `step`. `Ok(false)` means the op was valid for this
/// kind of step but had no effect (out of range, or a refused delete).
pub fn apply(step: &mut WorkflowStep, op: &EditOp) -> Result<bool, WorkflowError> {
    let unsupported = WorkflowError::Unsupported {
        kind: step.kind(),
        op: op.name(),
    };
    let applied = match step {
        WorkflowStep::Single(sheet) => match op {
            EditOp::SetCell { row, col, value, .. } => sheet.set_cell(*row, *col, value.as_str()),
            EditOp::AddColumn => {
                sheet.add_column();
                true
            }
            EditOp::DeleteColumn { col } => sheet.delete_column(*col),
            EditOp::RenameHeader { col, name } => sheet.rename_header(*col, name.as_str()),
            EditOp::AddRow { .. } => {
                sheet.add_row();
                true
            }
            EditOp::DeleteRow { row, .. } => sheet.delete_row(*row),
            EditOp::ClearRows => {
                sheet.clear_rows();
                true
            }
            EditOp::Title { title } => {
                sheet.title = Some(title.clone()).filter(|t| !t.trim().is_empty());
                true
            }
            _ => return Err(unsupported),
        },
        WorkflowStep::ThreeD(stack) => match op {
            EditOp::SetCell { row, col, value, sheet } => stack.set_cell(*sheet, *row, *col, value.as_str()),
            EditOp::AddColumn => {
                stack.add_column();
                true
            }
            EditOp::DeleteColumn { col } => stack.delete_column(*col),
            EditOp::RenameHeader { col, name } => stack.rename_header(*col, name.as_str()),
            EditOp::AddRow { sheet } => stack.add_row(*sheet),
            EditOp::DeleteRow { row, sheet } => stack.delete_row(*sheet, *row),
            EditOp::ClearRows => {
                stack.clear_sub_sheets();
                true
            }
            EditOp::AddSubSheet { name } => {
                stack.add_sub_sheet(name.as_str());
                true
            }
            EditOp::DeleteSubSheet { sheet } => stack.delete_sub_sheet(*sheet),
            EditOp::Select { sheet } => {
                stack.select(*sheet);
                true
            }
            _ => return Err(unsupported),
        },
        WorkflowStep::Aggregation(view) => match op {
            EditOp::SetCell { row, col, value, .. } => view.sheet.set_cell(*row, *col, value.as_str()),
            EditOp::AddColumn => {
                view.sheet.add_column();
                true
            }
            EditOp::DeleteColumn { col } => view.sheet.delete_column(*col),
            EditOp::RenameHeader { col, name } => view.sheet.rename_header(*col, name.as_str()),
            EditOp::AddRow { .. } => {
                view.sheet.add_row();
                true
            }
            EditOp::DeleteRow { row, .. } => view.sheet.delete_row(*row),
            EditOp::ClearRows => {
                view.sheet.clear_rows();
                true
            }
            EditOp::Instruction { text } => {
                view.instruction = text.clone();
                true
            }
            _ => return Err(unsupported),
        },
        WorkflowStep::LlmPipe(pipe) => match op {
            EditOp::Instruction { text } => {
                pipe.instruction = text.clone();
                true
            }
            _ => return Err(unsupported),
        },
    };
    Ok(applied)
}

pub fn run(ctx: &CliContext, step: usize, op: EditOp) -> CliResult<()> {
    let mut workflow = ctx.load_workflow()?;
    let applied = workflow.update_step(step, |data| apply(data, &op))??;
    if !applied {
        return Err(CliError::Rejected(format!("{} had no effect on step {}", op.name(), step)));
    }
    ctx.save_workflow(&workflow)?;
    println!("Step {}: {} applied.", step, op.name());
    Ok(())
}
