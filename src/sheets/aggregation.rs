// src/sheets/aggregation.rs
//! Aggregation view
//!
//! A single-sheet view bound to an earlier 3D step. Running it produces
//! exactly one row per sub-sheet of that stack, in stack order.

use std::collections::{HashMap, VecDeque};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::sheet_grid_data::SheetGridData;
use super::single_sheet::SingleSheet;
use super::systems::ai::{AggregateRequest, Collaborator};
use super::three_d::ThreeDStack;

pub const DEFAULT_AGGREGATION_HEADERS: [&str; 2] = ["Name", "Summary"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationSheet {
    pub sheet: SingleSheet,
    /// Index of the 3D step this view summarises.
    pub source_step: usize,
    #[serde(default)]
    pub instruction: String,
}

impl AggregationSheet {
    pub fn new(source_step: usize, instruction: impl Into<String>) -> Self {
        Self {
            sheet: SingleSheet::new(
                DEFAULT_AGGREGATION_HEADERS.iter().map(|h| h.to_string()).collect(),
            ),
            source_step,
            instruction: instruction.into(),
        }
    }

    fn request_for(&self, source: &ThreeDStack, index: usize) -> Option<AggregateRequest> {
        let sub = source.sub_sheet(index)?;
        Some(AggregateRequest {
            cells: sub.grid.values(),
            origin_row: sub
                .origin_cell()
                .map(|c| c.value.clone())
                .unwrap_or_default(),
            columns: self.sheet.headers.clone(),
            prev_headers: source.headers.clone(),
            instruction: self.instruction.clone(),
            sheet_name: sub.name().to_string(),
        })
    }

    /// One Aggregate call per sub-sheet, issued concurrently. Column 0 of
    /// each output row is the sub-sheet's name whatever the collaborator
    /// says; a failed call keeps the previous values of that row.
    pub async fn run_aggregation(&mut self, ai: &dyn Collaborator, source: &ThreeDStack) -> usize {
        let requests: Vec<AggregateRequest> = (0..source.len())
            .filter_map(|i| self.request_for(source, i))
            .collect();
        let responses = join_all(requests.iter().map(|r| ai.aggregate(r))).await;

        let width = self.sheet.width();
        let mut previous: HashMap<String, VecDeque<Vec<String>>> = HashMap::new();
        for r in 0..self.sheet.grid.row_count() {
            previous
                .entry(self.sheet.grid.key_of(r).to_string())
                .or_default()
                .push_back(self.sheet.grid.row_values(r));
        }

        let mut succeeded = 0;
        let mut values: Vec<Vec<String>> = Vec::with_capacity(requests.len());
        for (request, response) in requests.iter().zip(responses) {
            let prior = previous
                .get_mut(&request.sheet_name)
                .and_then(VecDeque::pop_front);
            let mut row: Vec<String> = match response {
                Ok(response) => {
                    succeeded += 1;
                    self.sheet
                        .headers
                        .iter()
                        .map(|h| response.aggregated_insights.get(h).cloned().unwrap_or_default())
                        .collect()
                }
                Err(e) => {
                    warn!("Aggregate for sub-sheet '{}' failed: {}", request.sheet_name, e);
                    prior.unwrap_or_else(|| vec![String::new(); width])
                }
            };
            row.resize(width, String::new());
            if let Some(first) = row.first_mut() {
                *first = request.sheet_name.clone();
            }
            values.push(row);
        }

        self.sheet.grid = if values.is_empty() {
            SheetGridData::blank(width, 1)
        } else {
            SheetGridData::from_values(values, width)
        };
        info!("Aggregation: {}/{} sub-sheets summarised", succeeded, requests.len());
        succeeded
    }
}
