// src/cli/context.rs
//! Shared state for one CLI invocation: where data lives, the loaded
//! settings, and constructors for the workflow, library and collaborator.

use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::PathBuf;

use tracing::{debug, info};

use super::error::{CliError, CliResult};
use crate::settings::api_key::resolve_api_key;
use crate::settings::io::SettingsFile;
use crate::settings::AppSettings;
use crate::sheets::database::{SheetLibrary, SqliteStore, StorageConfig};
use crate::sheets::systems::ai::{
    CachedGenerator, Collaborator, GeminiMessenger, PromptCollaborator, ResponseCache,
};
use crate::sheets::workflow::Workflow;

pub struct CliContext {
    pub storage: StorageConfig,
    pub settings_file: SettingsFile,
    pub settings: AppSettings,
}

impl CliContext {
    pub fn load(data_dir: Option<PathBuf>) -> CliResult<Self> {
        let storage = match data_dir {
            Some(dir) => StorageConfig::at(dir),
            None => StorageConfig::new(),
        };
        storage.ensure_directories()?;
        let settings_file = SettingsFile::in_config_dir()?;
        let settings = settings_file.load()?;
        debug!("Data directory: {:?}, settings: {:?}", storage.data_dir, settings_file.path());
        Ok(Self {
            storage,
            settings_file,
            settings,
        })
    }

    /// A missing workflow file is an empty workflow.
    pub fn load_workflow(&self) -> CliResult<Workflow> {
        let path = self.storage.workflow_path();
        match fs::File::open(&path) {
            Ok(file) => Ok(serde_json::from_reader(BufReader::new(file))?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Workflow::new()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn save_workflow(&self, workflow: &Workflow) -> CliResult<()> {
        let path = self.storage.workflow_path();
        let file = fs::File::create(&path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), workflow)?;
        info!("Workflow saved to {:?} ({} steps)", path, workflow.len());
        Ok(())
    }

    pub fn open_library(&self) -> CliResult<SheetLibrary<SqliteStore>> {
        let store = SqliteStore::open(&self.storage.db_path())?;
        Ok(SheetLibrary::open(store)?)
    }

    pub fn collaborator(&self) -> CliResult<Box<dyn Collaborator>> {
        let (api_key, source) = resolve_api_key().ok_or(CliError::NoApiKey)?;
        debug!("Using API key from {:?}", source);
        let messenger = GeminiMessenger::new(&self.settings, api_key)?;
        if self.settings.cache_responses {
            let cache = ResponseCache::open(self.storage.cache_dir())?;
            Ok(Box::new(PromptCollaborator::new(CachedGenerator::new(messenger, cache))))
        } else {
            Ok(Box::new(PromptCollaborator::new(messenger)))
        }
    }
}
