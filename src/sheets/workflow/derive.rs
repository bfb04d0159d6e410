// src/sheets/workflow/derive.rs
//! One-hop propagation between adjacent steps.
//!
//! `derive_next` is pure: given the new data of step `i` and the current
//! data of step `i + 1`, it returns the recomputed step `i + 1`, or `None`
//! when that pair of kinds does not propagate. Outputs already computed
//! downstream are carried over by row identity, never by position.

use std::collections::{HashMap, VecDeque};

use super::step::WorkflowStep;
use crate::sheets::sheet_grid_data::Cell;
use crate::sheets::three_d::{SubSheet, ThreeDStack};

pub fn derive_next(data: &WorkflowStep, previous_next: &WorkflowStep) -> Option<WorkflowStep> {
    match (data, previous_next) {
        (
            WorkflowStep::Single(_) | WorkflowStep::Aggregation(_),
            WorkflowStep::ThreeD(previous),
        ) => {
            let (headers, rows) = data.downstream_rows();
            Some(WorkflowStep::ThreeD(rederive_stack(previous, headers, &rows)))
        }
        (_, WorkflowStep::LlmPipe(previous)) => {
            let (headers, rows) = data.downstream_rows();
            Some(WorkflowStep::LlmPipe(previous.rederive(&headers, &rows)))
        }
        _ => None,
    }
}

fn row_key(row: &[Cell]) -> String {
    row.first().map(|c| c.value.trim().to_string()).unwrap_or_default()
}

/// One sub-sheet per new row. A sub-sheet whose origin key (column 0)
/// survives keeps its grid and entity id; its origin is refreshed.
pub fn rederive_stack(previous: &ThreeDStack, origin_headers: Vec<String>, rows: &[Vec<Cell>]) -> ThreeDStack {
    let mut by_key: HashMap<String, VecDeque<&SubSheet>> = HashMap::new();
    for sub in &previous.sub_sheets {
        by_key.entry(sub.name().to_string()).or_default().push_back(sub);
    }

    let width = previous.width();
    let mut sub_sheets: Vec<SubSheet> = rows
        .iter()
        .map(|row| match by_key.get_mut(&row_key(row)).and_then(VecDeque::pop_front) {
            Some(kept) => SubSheet {
                entity_id: kept.entity_id.clone(),
                origin: row.clone(),
                grid: kept.grid.clone(),
            },
            None => SubSheet::new(row.clone(), width),
        })
        .collect();
    if sub_sheets.is_empty() {
        sub_sheets.push(SubSheet::new(Vec::new(), width));
    }

    let mut next = ThreeDStack {
        headers: previous.headers.clone(),
        origin_headers,
        sub_sheets,
        window: previous.window,
    };
    let selected = next.window.selected;
    next.select(selected);
    next
}
