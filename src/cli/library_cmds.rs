// src/cli/library_cmds.rs
//! Commands over the entity library: direct entity edits, and moving 3D
//! stacks in and out of it.

use clap::Subcommand;

use super::context::CliContext;
use super::error::{CliError, CliResult};
use crate::sheets::database::{SheetLibrary, SpreadsheetStore};
use crate::sheets::workflow::WorkflowStep;

#[derive(Subcommand, Debug, Clone)]
pub enum LibraryAction {
    /// List stored entities
    List,
    /// Print one entity's rows
    Show { id: String },
    /// Add an empty sheet
    Add { name: String },
    /// Set one cell of an entity
    SetCell {
        id: String,
        row: usize,
        col: usize,
        value: String,
    },
    /// Rename a shared header in every entity
    RenameHeader { col: usize, name: String },
    /// Remove every entity, leaving one empty sheet
    Clear,
}

pub fn save_stack(ctx: &CliContext, step: usize) -> CliResult<()> {
    let workflow = ctx.load_workflow()?;
    let stack = workflow
        .step(step)?
        .as_three_d()
        .ok_or_else(|| CliError::Rejected(format!("step {} is not a 3D step", step)))?;
    let mut library = ctx.open_library()?;
    library.store_stack(stack)?;
    println!("Stored {} sub-sheets in {}", stack.len(), ctx.storage.db_path().display());
    Ok(())
}

pub fn load_stack(ctx: &CliContext, step: usize) -> CliResult<()> {
    let mut workflow = ctx.load_workflow()?;
    let library = ctx.open_library()?;
    let stack = library
        .load_stack()
        .ok_or_else(|| CliError::Rejected("library holds no sheets".into()))?;
    let count = stack.len();
    workflow.edit_step(step, WorkflowStep::ThreeD(stack))?;
    ctx.save_workflow(&workflow)?;
    println!("Loaded {} sub-sheets into step {}.", count, step);
    Ok(())
}

pub fn library(ctx: &CliContext, action: LibraryAction) -> CliResult<()> {
    let mut library = ctx.open_library()?;
    print!("{}", apply(&mut library, &action)?);
    Ok(())
}

/// Runs one library action and returns the text to print.
fn apply<S: SpreadsheetStore>(library: &mut SheetLibrary<S>, action: &LibraryAction) -> CliResult<String> {
    let out = match action {
        LibraryAction::List => {
            let mut out = format!("Headers: {}\n", library.headers().join(", "));
            out.push_str(&format!("{:<38} {:<30} {}\n", "Id", "Name", "Rows"));
            out.push_str(&format!("{}\n", "-".repeat(76)));
            for entity in library.entities() {
                out.push_str(&format!("{:<38} {:<30} {}\n", entity.id, entity.name, entity.rows.len()));
            }
            out
        }
        LibraryAction::Show { id } => {
            let entity = library
                .entity(id)
                .ok_or_else(|| CliError::Rejected(format!("no entity with id {}", id)))?;
            let mut out = format!("{} ({})\n", entity.name, entity.id);
            for (row, cells) in &entity.rows {
                let values: Vec<&str> = library
                    .headers()
                    .iter()
                    .map(|h| cells.get(h).map(String::as_str).unwrap_or(""))
                    .collect();
                out.push_str(&format!("[{}] {}\n", row, values.join(" | ")));
            }
            out
        }
        LibraryAction::Add { name } => {
            let id = library.add_sheet(name.as_str())?;
            format!("Added sheet '{}' ({}).\n", name, id)
        }
        LibraryAction::SetCell { id, row, col, value } => {
            library.set_cell(id, *row, *col, value.as_str())?;
            format!("Set {}[{}][{}].\n", id, row, col)
        }
        LibraryAction::RenameHeader { col, name } => {
            library.rename_header(*col, name.as_str())?;
            format!("Header {} renamed to '{}'.\n", col, name)
        }
        LibraryAction::Clear => {
            library.clear_all()?;
            "Library cleared; one empty sheet remains.\n".to_string()
        }
    };
    Ok(out)
}

/// Deletes from the library, then from every 3D step in the workflow.
pub fn delete_entity(ctx: &CliContext, id: &str) -> CliResult<()> {
    let mut workflow = ctx.load_workflow()?;
    let mut library = ctx.open_library()?;
    let changed = workflow.delete_entity(&mut library, id)?;
    ctx.save_workflow(&workflow)?;
    println!("Deleted entity {} ({} workflow steps updated).", id, changed);
    Ok(())
}
