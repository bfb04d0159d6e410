// src/settings/api_key.rs
//! API key lookup. The environment (including a `.env` file loaded at
//! startup) wins over the OS keyring.

use tracing::{error, info};

pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";
pub const KEYRING_SERVICE_NAME: &str = "sheetflow";
pub const KEYRING_API_KEY_USERNAME: &str = "llm_api_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeySource {
    Environment,
    Keyring,
}

fn keyring_entry() -> keyring::Result<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE_NAME, KEYRING_API_KEY_USERNAME)
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

pub fn resolve_api_key() -> Option<(String, ApiKeySource)> {
    if let Some(key) = std::env::var(API_KEY_ENV_VAR).ok().and_then(non_blank) {
        return Some((key, ApiKeySource::Environment));
    }
    match keyring_entry().and_then(|entry| entry.get_password()) {
        Ok(key) => non_blank(key).map(|k| (k, ApiKeySource::Keyring)),
        Err(keyring::Error::NoEntry) => None,
        Err(e) => {
            error!("Error accessing keyring: {}", e);
            None
        }
    }
}

pub fn store_api_key(key: &str) -> keyring::Result<()> {
    keyring_entry()?.set_password(key.trim())?;
    info!("API key stored in keyring.");
    Ok(())
}

pub fn clear_api_key() -> keyring::Result<()> {
    match keyring_entry()?.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => {
            info!("API key removed from keyring.");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Short human-readable status, as shown by `api-key status`.
pub fn api_key_status() -> &'static str {
    match resolve_api_key() {
        Some((_, ApiKeySource::Environment)) => "Key Set (environment)",
        Some((_, ApiKeySource::Keyring)) => "Key Set (keyring)",
        None => "No Key Set",
    }
}
