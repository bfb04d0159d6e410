// src/settings/mod.rs
pub mod api_key;
pub mod io;

use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL_ID: &str = "gemini-2.0-flash";
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// User-tunable settings, persisted as JSON in the platform config dir.
/// Missing fields fall back to their defaults so older files keep loading.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    pub model_id: String,
    pub api_base_url: String,
    pub request_timeout_secs: u64,
    pub temperature: f32,
    /// Reuse stored responses for identical (model, temperature, prompt).
    pub cache_responses: bool,
    /// How many sub-sheets of a 3D stack are shown at once.
    pub visible_window: usize,
    /// Pause between steps during "run all". Zero disables it.
    pub settle_delay_ms: u64,
    pub default_llm_instruction: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL_ID.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 120,
            temperature: 0.0,
            cache_responses: true,
            visible_window: 3,
            settle_delay_ms: 0,
            default_llm_instruction: "Process the following row.".to_string(),
        }
    }
}

impl AppSettings {
    pub fn settle_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.settle_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_file_uses_defaults() {
        let parsed: AppSettings = serde_json::from_str(r#"{"model_id":"gemini-pro","settle_delay_ms":250}"#).unwrap();
        assert_eq!(parsed.model_id, "gemini-pro");
        assert_eq!(parsed.settle_delay().as_millis(), 250);
        assert_eq!(parsed.api_base_url, DEFAULT_API_BASE_URL);
        assert!(parsed.cache_responses);
    }
}
