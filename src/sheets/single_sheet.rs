// src/sheets/single_sheet.rs
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::sheet_grid_data::SheetGridData;
use super::systems::ai::Collaborator;
use super::systems::logic::{fill_cells, find_rows, FillReport};

pub const DEFAULT_INPUT_HEADER: &str = "Input";

/// Placeholder name for the `n`-th column (1-based).
pub fn placeholder_header(n: usize) -> String {
    format!("Column {}", n)
}

/// One grid plus its column headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleSheet {
    #[serde(default)]
    pub title: Option<String>,
    pub headers: Vec<String>,
    pub grid: SheetGridData,
}

impl Default for SingleSheet {
    fn default() -> Self {
        Self::new(vec![DEFAULT_INPUT_HEADER.to_string()])
    }
}

impl SingleSheet {
    /// Sheet with the given headers and one blank row. An empty header list
    /// is replaced by a single placeholder column.
    pub fn new(mut headers: Vec<String>) -> Self {
        if headers.is_empty() {
            headers.push(placeholder_header(1));
        }
        let grid = SheetGridData::blank(headers.len(), 1);
        Self {
            title: None,
            headers,
            grid,
        }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    /// Query sent to Find: the title when set, otherwise the first header.
    pub fn find_query(&self) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => self.headers.first().cloned().unwrap_or_default(),
        }
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) -> bool {
        let applied = self.grid.set_cell(row, col, value, self.width());
        if !applied {
            debug!("set_cell({}, {}) ignored: only {} columns", row, col, self.width());
        }
        applied
    }

    pub fn add_column(&mut self) {
        self.headers.push(placeholder_header(self.headers.len() + 1));
        self.grid.push_column();
    }

    /// Refuses to remove the last remaining column.
    pub fn delete_column(&mut self, col: usize) -> bool {
        if self.headers.len() <= 1 || col >= self.headers.len() {
            debug!("delete_column({}) ignored", col);
            return false;
        }
        self.headers.remove(col);
        self.grid.remove_column(col);
        true
    }

    pub fn rename_header(&mut self, col: usize, name: impl Into<String>) -> bool {
        match self.headers.get_mut(col) {
            Some(header) => {
                *header = name.into();
                true
            }
            None => false,
        }
    }

    pub fn add_row(&mut self) {
        self.grid.push_row(self.width());
    }

    /// Refuses to remove the last remaining row.
    pub fn delete_row(&mut self, row: usize) -> bool {
        if self.grid.row_count() <= 1 || row >= self.grid.row_count() {
            debug!("delete_row({}) ignored", row);
            return false;
        }
        self.grid.remove_row(row);
        true
    }

    pub fn clear_rows(&mut self) {
        self.grid.clear(self.width());
    }

    /// Replaces all rows with the Find results for `find_query()`.
    /// Failures leave the grid as it was.
    pub async fn run_find(&mut self, ai: &dyn Collaborator) -> bool {
        let query = self.find_query();
        match find_rows(ai, &query, false, self.width()).await {
            Some(grid) => {
                info!("Find '{}' populated {} rows", query, grid.row_count());
                self.grid = grid;
                true
            }
            None => false,
        }
    }

    pub async fn run_cells(&mut self, ai: &dyn Collaborator) -> FillReport {
        let (grid, report) = fill_cells(ai, &self.headers, &self.grid).await;
        self.grid = grid;
        info!(
            "RunCells: {} updated, {} skipped, {} failed",
            report.updated, report.skipped, report.failed
        );
        report
    }
}
