// src/cli/mod.rs
// Command-line surface over the workflow, the entity library and settings

pub mod config_cmds;
pub mod context;
pub mod edit;
pub mod error;
pub mod library_cmds;
pub mod workflow_cmds;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use config_cmds::{ApiKeyAction, SettingsAction};
use context::CliContext;
use edit::EditOp;
use error::CliResult;
use library_cmds::LibraryAction;
use workflow_cmds::AppendKind;

#[derive(Parser)]
#[command(name = "sheetflow")]
#[command(about = "sheetflow - spreadsheet workflows with an LLM collaborator", long_about = None)]
pub struct Cli {
    /// Directory holding workflow.json, sheets.db and the response cache
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the initial single sheet
    Init,

    /// Print one step, or every step
    Show {
        #[arg(long)]
        step: Option<usize>,
    },

    /// Edit a step; the following step is re-derived
    Edit {
        #[arg(long)]
        step: usize,
        #[command(subcommand)]
        op: EditOp,
    },

    /// Create the next step from the last one
    Append {
        /// Source step; defaults to the last step
        #[arg(long)]
        from: Option<usize>,
        #[command(subcommand)]
        kind: AppendKind,
    },

    /// Run one step, or every step in order
    Run {
        #[arg(long)]
        step: Option<usize>,
    },

    /// Store a 3D step's sub-sheets in the entity library
    SaveStack { step: usize },

    /// Replace a 3D step with the stack stored in the library
    LoadStack { step: usize },

    /// Inspect and edit the entity library
    Library {
        #[command(subcommand)]
        action: LibraryAction,
    },

    /// Delete an entity from the library and from every 3D step
    DeleteEntity { id: String },

    /// Manage the LLM API key
    ApiKey {
        #[command(subcommand)]
        action: ApiKeyAction,
    },

    /// Show or reset settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
}

pub async fn dispatch(cli: Cli) -> CliResult<()> {
    if let Commands::ApiKey { action } = cli.command {
        return config_cmds::api_key(action);
    }
    let ctx = CliContext::load(cli.data_dir)?;
    match cli.command {
        Commands::Init => workflow_cmds::init(&ctx),
        Commands::Show { step } => workflow_cmds::show(&ctx, step),
        Commands::Edit { step, op } => edit::run(&ctx, step, op),
        Commands::Append { from, kind } => workflow_cmds::append(&ctx, from, kind),
        Commands::Run { step } => workflow_cmds::run(&ctx, step).await,
        Commands::SaveStack { step } => library_cmds::save_stack(&ctx, step),
        Commands::LoadStack { step } => library_cmds::load_stack(&ctx, step),
        Commands::Library { action } => library_cmds::library(&ctx, action),
        Commands::DeleteEntity { id } => library_cmds::delete_entity(&ctx, &id),
        Commands::ApiKey { action } => config_cmds::api_key(action),
        Commands::Settings { action } => config_cmds::settings(&ctx, action),
    }
}
