// src/sheets/systems/ai/test_support.rs
// Deterministic collaborator for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use super::collaborator::{AggregateRequest, AggregateResponse, AiError, Collaborator};

#[derive(Default)]
pub struct StubCollaborator {
    /// query → results; unknown queries return an empty list.
    pub find_results: HashMap<String, Vec<String>>,
    /// input → column → value; unknown inputs echo `"{input}/{column}"`.
    pub cell_values: HashMap<String, HashMap<String, String>>,
    /// sheet name → insights; unknown sheets get `"{column} of {sheet}"`.
    pub insights: HashMap<String, HashMap<String, String>>,
    /// Inputs / queries / sheet names for which every call fails.
    pub failing: HashSet<String>,
    pub calls: Mutex<Vec<String>>,
}

impl StubCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_find(mut self, query: &str, results: &[&str]) -> Self {
        self.find_results
            .insert(query.to_string(), results.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_cells(mut self, input: &str, values: &[(&str, &str)]) -> Self {
        self.cell_values.insert(
            input.to_string(),
            values.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        );
        self
    }

    pub fn with_insights(mut self, sheet: &str, values: &[(&str, &str)]) -> Self {
        self.insights.insert(
            sheet.to_string(),
            values.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        );
        self
    }

    pub fn failing_on(mut self, key: &str) -> Self {
        self.failing.insert(key.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, key: &str) -> Result<(), AiError> {
        if self.failing.contains(key) {
            Err(AiError::Other(format!("stub failure for {}", key)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Collaborator for StubCollaborator {
    async fn find(&self, query: &str, sheet_level: bool) -> Result<Vec<String>, AiError> {
        self.record(format!("find:{}:{}", query, sheet_level));
        self.check(query)?;
        Ok(self.find_results.get(query).cloned().unwrap_or_default())
    }

    async fn run_cells(
        &self,
        input: &str,
        columns: &[String],
    ) -> Result<HashMap<String, String>, AiError> {
        self.record(format!("cells:{}", input));
        self.check(input)?;
        Ok(match self.cell_values.get(input) {
            Some(values) => values.clone(),
            None => columns
                .iter()
                .map(|c| (c.clone(), format!("{}/{}", input, c)))
                .collect(),
        })
    }

    async fn aggregate(&self, request: &AggregateRequest) -> Result<AggregateResponse, AiError> {
        self.record(format!("aggregate:{}", request.sheet_name));
        self.check(&request.sheet_name)?;
        let aggregated_insights = match self.insights.get(&request.sheet_name) {
            Some(values) => values.clone(),
            None => request
                .columns
                .iter()
                .map(|c| (c.clone(), format!("{} of {}", c, request.sheet_name)))
                .collect(),
        };
        Ok(AggregateResponse {
            // Not the sheet name; callers force column 0 themselves
            sheet_name: "stub".to_string(),
            aggregated_insights,
        })
    }

    async fn complete(&self, input: &str, instruction_template: &str) -> Result<String, AiError> {
        self.record(format!("complete:{}", input));
        self.check(input)?;
        Ok(format!("{} => {}", instruction_template, input))
    }
}
