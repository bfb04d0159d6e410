// src/cli/config_cmds.rs
use clap::Subcommand;

use super::context::CliContext;
use super::error::CliResult;
use crate::settings::api_key::{api_key_status, clear_api_key, store_api_key};
use crate::settings::AppSettings;

#[derive(Subcommand, Debug, Clone)]
pub enum ApiKeyAction {
    /// Store the key in the OS keyring
    Set { key: String },
    /// Remove the key from the OS keyring
    Clear,
    /// Report where the key would be read from
    Status,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsAction {
    /// Print the effective settings as JSON
    Show,
    /// Overwrite the settings file with defaults
    Reset,
}

pub fn api_key(action: ApiKeyAction) -> CliResult<()> {
    match action {
        ApiKeyAction::Set { key } => {
            store_api_key(&key)?;
            println!("API key stored.");
        }
        ApiKeyAction::Clear => {
            clear_api_key()?;
            println!("API key cleared.");
        }
        ApiKeyAction::Status => println!("{}", api_key_status()),
    }
    Ok(())
}

pub fn settings(ctx: &CliContext, action: SettingsAction) -> CliResult<()> {
    match action {
        SettingsAction::Show => println!("{}", serde_json::to_string_pretty(&ctx.settings)?),
        SettingsAction::Reset => {
            ctx.settings_file.save(&AppSettings::default())?;
            println!("Settings reset to defaults ({}).", ctx.settings_file.path().display());
        }
    }
    Ok(())
}
