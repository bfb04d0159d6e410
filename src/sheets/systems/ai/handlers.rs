// src/sheets/systems/ai/handlers.rs
//! Request handlers that serve the collaborator contract by prompting a
//! text generator and parsing what comes back.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::collaborator::{AggregateRequest, AggregateResponse, AiError, Collaborator};
use super::messenger::TextGenerator;
use super::{parser, prompts};

pub struct PromptCollaborator<G> {
    generator: G,
}

impl<G: TextGenerator> PromptCollaborator<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }
}

#[async_trait]
impl<G: TextGenerator> Collaborator for PromptCollaborator<G> {
    async fn find(&self, query: &str, sheet_level: bool) -> Result<Vec<String>, AiError> {
        let raw = self
            .generator
            .generate(&prompts::find_prompt(query, sheet_level))
            .await?;
        let results = parser::parse_string_list(&raw);
        if results.is_empty() {
            warn!("Find '{}': no usable results in model output", query);
        }
        debug!("Find '{}': {} results", query, results.len());
        Ok(results)
    }

    async fn run_cells(
        &self,
        input: &str,
        columns: &[String],
    ) -> Result<HashMap<String, String>, AiError> {
        let raw = self
            .generator
            .generate(&prompts::run_cells_prompt(input, columns))
            .await?;
        let mut values = parser::parse_string_map(&raw, None);
        values.retain(|k, _| columns.iter().any(|c| c == k));
        Ok(values)
    }

    async fn aggregate(&self, request: &AggregateRequest) -> Result<AggregateResponse, AiError> {
        let raw = self
            .generator
            .generate(&prompts::aggregate_prompt(request))
            .await?;
        let mut aggregated_insights = parser::parse_string_map(&raw, Some("aggregatedInsights"));
        let sheet_name = aggregated_insights
            .remove("sheetName")
            .unwrap_or_else(|| request.sheet_name.clone());
        Ok(AggregateResponse {
            sheet_name,
            aggregated_insights,
        })
    }

    async fn complete(&self, input: &str, instruction_template: &str) -> Result<String, AiError> {
        self.generator
            .generate(&prompts::render_instruction(instruction_template, input))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Returns canned text and records prompts.
    struct ScriptedGenerator {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn model_id(&self) -> &str {
            "scripted"
        }
    }

    #[tokio::test]
    async fn test_find_parses_fenced_list() {
        let ai = PromptCollaborator::new(ScriptedGenerator::new("```json\n[\"A\", \"B\"]\n```"));
        assert_eq!(ai.find("cars", false).await.unwrap(), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_run_cells_drops_unrequested_keys() {
        let ai = PromptCollaborator::new(ScriptedGenerator::new(r#"{"CEO": "Jane", "Extra": "x"}"#));
        let values = ai.run_cells("Acme", &["CEO".to_string()]).await.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values["CEO"], "Jane");
    }

    #[tokio::test]
    async fn test_run_cells_malformed_output_is_empty_map() {
        let ai = PromptCollaborator::new(ScriptedGenerator::new("I cannot help with that"));
        assert!(ai.run_cells("Acme", &["CEO".to_string()]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_unwraps_insights() {
        let ai = PromptCollaborator::new(ScriptedGenerator::new(
            r#"{"sheetName": "Acme", "aggregatedInsights": {"Total": "3"}}"#,
        ));
        let request = AggregateRequest {
            cells: vec![],
            origin_row: "Acme".into(),
            columns: vec!["Name".into(), "Total".into()],
            prev_headers: vec!["Item".into()],
            instruction: "count".into(),
            sheet_name: "Acme".into(),
        };
        let response = ai.aggregate(&request).await.unwrap();
        assert_eq!(response.sheet_name, "Acme");
        assert_eq!(response.aggregated_insights["Total"], "3");
    }

    #[tokio::test]
    async fn test_complete_batch_renders_each_input() {
        let ai = PromptCollaborator::new(ScriptedGenerator::new("ok"));
        let results = ai
            .complete_batch(&["a".to_string(), "b".to_string()], "Do {input}")
            .await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.as_deref().ok() == Some("ok")));
        let mut prompts = ai.generator.prompts.lock().unwrap().clone();
        prompts.sort();
        assert_eq!(prompts, vec!["Do a", "Do b"]);
    }
}
