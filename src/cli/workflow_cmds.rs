// src/cli/workflow_cmds.rs
use clap::Subcommand;
use tracing::info;

use super::context::CliContext;
use super::error::{CliError, CliResult};
use crate::sheets::sheet_grid_data::SheetGridData;
use crate::sheets::three_d::VisibleWindow;
use crate::sheets::workflow::{WorkflowState, WorkflowStep};

#[derive(Subcommand, Debug, Clone)]
pub enum AppendKind {
    /// One sub-sheet per row of the source step
    ThreeD,
    /// One summary row per sub-sheet of a 3D step
    Aggregation {
        #[arg(long, default_value = "")]
        instruction: String,
    },
    /// One LLM call per source row
    LlmPipe {
        /// Defaults to the `default_llm_instruction` setting
        #[arg(long)]
        instruction: Option<String>,
    },
}

pub fn init(ctx: &CliContext) -> CliResult<()> {
    let mut workflow = ctx.load_workflow()?;
    workflow.create_initial_sheet()?;
    ctx.save_workflow(&workflow)?;
    println!("Created initial sheet (step 0).");
    Ok(())
}

pub fn append(ctx: &CliContext, from: Option<usize>, kind: AppendKind) -> CliResult<()> {
    let mut workflow = ctx.load_workflow()?;
    let from = match from.or_else(|| workflow.len().checked_sub(1)) {
        Some(index) => index,
        None => return Err(CliError::Rejected("workflow is empty; run `sheetflow init` first".into())),
    };
    let index = match kind {
        AppendKind::ThreeD => {
            let index = workflow.append_three_d(from)?;
            let size = ctx.settings.visible_window;
            workflow.update_step(index, |step| {
                if let WorkflowStep::ThreeD(stack) = step {
                    stack.window = VisibleWindow::with_size(size);
                    stack.select(0);
                }
            })?;
            index
        }
        AppendKind::Aggregation { instruction } => workflow.append_aggregation(from, instruction)?,
        AppendKind::LlmPipe { instruction } => {
            let instruction = instruction.unwrap_or_else(|| ctx.settings.default_llm_instruction.clone());
            workflow.append_llm_pipe(from, instruction)?
        }
    };
    ctx.save_workflow(&workflow)?;
    println!("Appended {} step {}.", workflow.step(index)?.kind(), index);
    Ok(())
}

pub async fn run(ctx: &CliContext, step: Option<usize>) -> CliResult<()> {
    let mut workflow = ctx.load_workflow()?;
    let ai = ctx.collaborator()?;
    match step {
        Some(index) => {
            workflow.run_step(index, ai.as_ref()).await?;
            ctx.save_workflow(&workflow)?;
            println!("Step {} finished.", index);
        }
        None => {
            let summary = workflow.run_all(ai.as_ref(), ctx.settings.settle_delay()).await;
            ctx.save_workflow(&workflow)?;
            info!("Run all: {} completed, {} failed", summary.completed.len(), summary.failed.len());
            println!("Completed steps: {:?}", summary.completed);
            for (index, reason) in &summary.failed {
                println!("Step {} failed: {}", index, reason);
            }
        }
    }
    Ok(())
}

pub fn show(ctx: &CliContext, step: Option<usize>) -> CliResult<()> {
    let workflow = ctx.load_workflow()?;
    if workflow.state() == WorkflowState::Empty {
        println!("Workflow is empty. Run `sheetflow init` to create the initial sheet.");
        return Ok(());
    }
    match step {
        Some(index) => print!("{}", render_step(index, workflow.step(index)?)),
        None => {
            for (index, step) in workflow.steps().iter().enumerate() {
                print!("{}", render_step(index, step));
                println!();
            }
        }
    }
    Ok(())
}

fn render_step(index: usize, step: &WorkflowStep) -> String {
    let mut out = format!("=== Step {} ({}) ===\n", index, step.kind());
    let headers = step.headers();
    match step {
        WorkflowStep::Single(sheet) => {
            if let Some(title) = &sheet.title {
                out.push_str(&format!("Title: {}\n", title));
            }
            out.push_str(&render_grid(&headers, &sheet.grid));
        }
        WorkflowStep::ThreeD(stack) => {
            let range = stack.window.range(stack.len());
            out.push_str(&format!(
                "{} sub-sheets, showing {}..{} (selected {})\n",
                stack.len(),
                range.start,
                range.end,
                stack.window.selected
            ));
            for (offset, sub) in stack.visible().iter().enumerate() {
                out.push_str(&format!("--- [{}] {} ({})\n", range.start + offset, sub.name(), sub.entity_id));
                out.push_str(&render_grid(&headers, &sub.grid));
            }
        }
        WorkflowStep::Aggregation(view) => {
            out.push_str(&format!("Source: step {}\n", view.source_step));
            if !view.instruction.is_empty() {
                out.push_str(&format!("Instruction: {}\n", view.instruction));
            }
            out.push_str(&render_grid(&headers, &view.sheet.grid));
        }
        WorkflowStep::LlmPipe(pipe) => {
            out.push_str(&format!("Instruction: {}\n", pipe.instruction));
            for r in 0..pipe.grid.row_count() {
                out.push_str(&format!("[{}] {}\n    => {}\n", r, pipe.grid.value(r, 0).replace('\n', " | "), pipe.output(r)));
            }
        }
    }
    out
}

fn render_grid(headers: &[String], grid: &SheetGridData) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(c, h)| {
            (0..grid.row_count())
                .map(|r| grid.value(r, c).chars().count())
                .chain(std::iter::once(h.chars().count()))
                .max()
                .unwrap_or(0)
                .min(40)
        })
        .collect();
    let line = |values: Vec<&str>| -> String {
        let cells: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(v, w)| format!("{:<width$}", truncate(v, *w), width = *w))
            .collect();
        format!("| {} |\n", cells.join(" | "))
    };
    let mut out = line(headers.iter().map(String::as_str).collect());
    out.push_str(&format!("|{}|\n", widths.iter().map(|w| "-".repeat(w + 2)).collect::<Vec<_>>().join("|")));
    for r in 0..grid.row_count() {
        out.push_str(&line((0..headers.len()).map(|c| grid.value(r, c)).collect()));
    }
    out
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let mut s: String = value.chars().take(max.saturating_sub(1)).collect();
        s.push('~');
        s
    }
}
