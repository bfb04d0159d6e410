// src/sheets/llm_pipe.rs
//! LLM pipe view
//!
//! Every source row becomes a `header: value` text block (Row Content);
//! the model reply for that block lands next to it (LLM Output).

use std::collections::{HashMap, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::sheet_grid_data::{Cell, SheetGridData};
use super::systems::ai::Collaborator;

pub const ROW_CONTENT_HEADER: &str = "Row Content";
pub const LLM_OUTPUT_HEADER: &str = "LLM Output";

const CONTENT_COL: usize = 0;
const OUTPUT_COL: usize = 1;
const PIPE_WIDTH: usize = 2;

/// `"{header}: {value}"` lines joined by newline. Cells past the header
/// list get a placeholder label. A row with no text serializes to "".
pub fn serialize_row(headers: &[String], row: &[Cell]) -> String {
    if row.iter().all(|cell| cell.value.trim().is_empty()) {
        return String::new();
    }
    row.iter()
        .enumerate()
        .map(|(i, cell)| {
            let label = headers
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("Column {}", i + 1));
            format!("{}: {}", label, cell.value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmPipe {
    pub instruction: String,
    pub grid: SheetGridData,
}

impl LlmPipe {
    pub fn from_source(headers: &[String], rows: &[Vec<Cell>], instruction: impl Into<String>) -> Self {
        let values: Vec<Vec<String>> = rows
            .iter()
            .map(|row| vec![serialize_row(headers, row), String::new()])
            .collect();
        let grid = if values.is_empty() {
            SheetGridData::blank(PIPE_WIDTH, 1)
        } else {
            SheetGridData::from_values(values, PIPE_WIDTH)
        };
        Self {
            instruction: instruction.into(),
            grid,
        }
    }

    /// Re-derives from new source rows, carrying over outputs whose Row
    /// Content is unchanged. Duplicate contents are matched in order.
    pub fn rederive(&self, headers: &[String], rows: &[Vec<Cell>]) -> Self {
        let mut outputs: HashMap<String, VecDeque<String>> = HashMap::new();
        for r in 0..self.grid.row_count() {
            outputs
                .entry(self.grid.value(r, CONTENT_COL).to_string())
                .or_default()
                .push_back(self.grid.value(r, OUTPUT_COL).to_string());
        }
        let mut next = Self::from_source(headers, rows, self.instruction.clone());
        for r in 0..next.grid.row_count() {
            let content = next.grid.value(r, CONTENT_COL).to_string();
            if let Some(output) = outputs.get_mut(&content).and_then(VecDeque::pop_front) {
                next.grid.set_cell(r, OUTPUT_COL, output, PIPE_WIDTH);
            }
        }
        next
    }

    pub fn headers(&self) -> Vec<String> {
        vec![ROW_CONTENT_HEADER.to_string(), LLM_OUTPUT_HEADER.to_string()]
    }

    pub fn output(&self, row: usize) -> &str {
        self.grid.value(row, OUTPUT_COL)
    }

    /// Sends every non-blank Row Content with the shared instruction in one
    /// concurrent batch. A failed row keeps its previous output.
    pub async fn run_llm(&mut self, ai: &dyn Collaborator) -> usize {
        let targets: Vec<usize> = (0..self.grid.row_count())
            .filter(|&r| !self.grid.value(r, CONTENT_COL).trim().is_empty())
            .collect();
        let inputs: Vec<String> = targets
            .iter()
            .map(|&r| self.grid.value(r, CONTENT_COL).to_string())
            .collect();
        let results = ai.complete_batch(&inputs, &self.instruction).await;

        let mut written = 0;
        for (&row, result) in targets.iter().zip(results) {
            match result {
                Ok(text) => {
                    self.grid.set_cell(row, OUTPUT_COL, text, PIPE_WIDTH);
                    written += 1;
                }
                Err(e) => warn!("LLM pipe row {} failed: {}", row, e),
            }
        }
        info!("LLM pipe: {}/{} rows answered", written, targets.len());
        written
    }
}
