// src/sheets/three_d.rs
//! 3D sheet stack
//!
//! An ordered collection of grids, one per source row, sharing a single
//! header list. Each sub-sheet keeps the row that generated it as its
//! origin and carries an entity id linking it to the persisted library.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::sheet_grid_data::{Cell, SheetGridData};
use super::single_sheet::placeholder_header;
use super::systems::ai::Collaborator;
use super::systems::logic::{fill_cells, find_rows, FillReport};

pub const DEFAULT_STACK_HEADER: &str = "Name";
pub const DEFAULT_VISIBLE_WINDOW: usize = 3;

pub fn new_entity_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubSheet {
    pub entity_id: String,
    /// The source row this sub-sheet was generated from.
    pub origin: Vec<Cell>,
    pub grid: SheetGridData,
}

impl SubSheet {
    pub fn new(origin: Vec<Cell>, width: usize) -> Self {
        Self {
            entity_id: new_entity_id(),
            origin,
            grid: SheetGridData::blank(width, 1),
        }
    }

    /// Sub-sheet name: the origin row's identifying (column 0) value.
    pub fn name(&self) -> &str {
        self.origin.first().map(|c| c.value.trim()).unwrap_or("")
    }

    pub fn origin_cell(&self) -> Option<&Cell> {
        self.origin.first()
    }
}

/// Which sub-sheets are on screen. Presentation only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleWindow {
    pub start: usize,
    pub size: usize,
    pub selected: usize,
}

impl Default for VisibleWindow {
    fn default() -> Self {
        Self {
            start: 0,
            size: DEFAULT_VISIBLE_WINDOW,
            selected: 0,
        }
    }
}

impl VisibleWindow {
    pub fn with_size(size: usize) -> Self {
        Self {
            size: size.max(1),
            ..Self::default()
        }
    }

    /// Selects `index` and shifts the window just enough to show it.
    pub fn select(&mut self, index: usize, len: usize) {
        if len == 0 {
            *self = Self::with_size(self.size);
            return;
        }
        let index = index.min(len - 1);
        self.selected = index;
        if index < self.start {
            self.start = index;
        } else if index >= self.start + self.size {
            self.start = index + 1 - self.size;
        }
        self.clamp(len);
    }

    pub fn range(&self, len: usize) -> std::ops::Range<usize> {
        let start = self.start.min(len);
        start..(start + self.size).min(len)
    }

    fn clamp(&mut self, len: usize) {
        if len == 0 {
            self.start = 0;
            self.selected = 0;
            return;
        }
        self.selected = self.selected.min(len - 1);
        self.start = self.start.min(len.saturating_sub(self.size));
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreeDStack {
    /// Shared by every sub-sheet.
    pub headers: Vec<String>,
    /// Headers of the step the origins came from.
    #[serde(default)]
    pub origin_headers: Vec<String>,
    pub sub_sheets: Vec<SubSheet>,
    #[serde(default)]
    pub window: VisibleWindow,
}

impl ThreeDStack {
    /// One sub-sheet per source row.
    pub fn from_rows(origin_headers: Vec<String>, rows: &[Vec<Cell>]) -> Self {
        let headers = vec![DEFAULT_STACK_HEADER.to_string()];
        let mut sub_sheets: Vec<SubSheet> = rows
            .iter()
            .map(|row| SubSheet::new(row.clone(), headers.len()))
            .collect();
        if sub_sheets.is_empty() {
            sub_sheets.push(SubSheet::new(Vec::new(), headers.len()));
        }
        Self {
            headers,
            origin_headers,
            sub_sheets,
            window: VisibleWindow::default(),
        }
    }

    pub fn width(&self) -> usize {
        self.headers.len()
    }

    pub fn len(&self) -> usize {
        self.sub_sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_sheets.is_empty()
    }

    pub fn sub_sheet(&self, index: usize) -> Option<&SubSheet> {
        self.sub_sheets.get(index)
    }

    /// Every row of every sub-sheet, in stack order.
    pub fn flattened_rows(&self) -> Vec<Vec<Cell>> {
        self.sub_sheets
            .iter()
            .flat_map(|s| s.grid.rows.iter().cloned())
            .collect()
    }

    pub fn set_cell(&mut self, sheet: usize, row: usize, col: usize, value: impl Into<String>) -> bool {
        let width = self.width();
        match self.sub_sheets.get_mut(sheet) {
            Some(sub) => sub.grid.set_cell(row, col, value, width),
            None => false,
        }
    }

    pub fn add_column(&mut self) {
        self.headers.push(placeholder_header(self.headers.len() + 1));
        for sub in self.sub_sheets.iter_mut() {
            sub.grid.push_column();
        }
    }

    pub fn delete_column(&mut self, col: usize) -> bool {
        if self.headers.len() <= 1 || col >= self.headers.len() {
            debug!("3D delete_column({}) ignored", col);
            return false;
        }
        self.headers.remove(col);
        for sub in self.sub_sheets.iter_mut() {
            sub.grid.remove_column(col);
        }
        true
    }

    /// Renames the shared header, i.e. in every sub-sheet at once.
    pub fn rename_header(&mut self, col: usize, name: impl Into<String>) -> bool {
        match self.headers.get_mut(col) {
            Some(header) => {
                *header = name.into();
                true
            }
            None => false,
        }
    }

    pub fn add_row(&mut self, sheet: usize) -> bool {
        let width = self.width();
        match self.sub_sheets.get_mut(sheet) {
            Some(sub) => {
                sub.grid.push_row(width);
                true
            }
            None => false,
        }
    }

    pub fn delete_row(&mut self, sheet: usize, row: usize) -> bool {
        match self.sub_sheets.get_mut(sheet) {
            Some(sub) if sub.grid.row_count() > 1 && row < sub.grid.row_count() => {
                sub.grid.remove_row(row);
                true
            }
            _ => false,
        }
    }

    /// Appends a sub-sheet whose origin is a single cell holding `name`.
    pub fn add_sub_sheet(&mut self, name: impl Into<String>) -> usize {
        let sub = SubSheet::new(vec![Cell::new(name, 0, 0)], self.width());
        self.sub_sheets.push(sub);
        self.sub_sheets.len() - 1
    }

    /// Refuses to remove the last remaining sub-sheet.
    pub fn delete_sub_sheet(&mut self, index: usize) -> bool {
        if self.sub_sheets.len() <= 1 || index >= self.sub_sheets.len() {
            return false;
        }
        self.sub_sheets.remove(index);
        self.window.clamp(self.sub_sheets.len());
        true
    }

    /// Drops every sub-sheet and leaves exactly one blank one.
    pub fn clear_sub_sheets(&mut self) {
        self.sub_sheets = vec![SubSheet::new(Vec::new(), self.width())];
        self.window = VisibleWindow::with_size(self.window.size);
    }

    /// Removes the sub-sheet linked to `entity_id`. If that was the last
    /// one, a blank sub-sheet takes its place.
    pub fn remove_entity(&mut self, entity_id: &str) -> bool {
        let before = self.sub_sheets.len();
        self.sub_sheets.retain(|s| s.entity_id != entity_id);
        if self.sub_sheets.len() == before {
            return false;
        }
        if self.is_empty() {
            self.sub_sheets.push(SubSheet::new(Vec::new(), self.width()));
        }
        self.window.clamp(self.sub_sheets.len());
        true
    }

    pub fn select(&mut self, index: usize) {
        self.window.select(index, self.sub_sheets.len());
    }

    pub fn visible(&self) -> &[SubSheet] {
        &self.sub_sheets[self.window.range(self.sub_sheets.len())]
    }

    /// Find per sub-sheet, concurrently, using each sub-sheet's name as the
    /// query. Results land only in the sub-sheet that asked.
    pub async fn run_find(&mut self, ai: &dyn Collaborator) -> usize {
        let width = self.width();
        let results = join_all(
            self.sub_sheets
                .iter()
                .map(|sub| find_rows(ai, sub.name(), true, width)),
        )
        .await;
        let mut populated = 0;
        for (sub, result) in self.sub_sheets.iter_mut().zip(results) {
            if let Some(grid) = result {
                sub.grid = grid;
                populated += 1;
            }
        }
        info!("3D Find populated {}/{} sub-sheets", populated, self.sub_sheets.len());
        populated
    }

    pub async fn run_cells(&mut self, ai: &dyn Collaborator) -> FillReport {
        let headers = self.headers.clone();
        let results = join_all(
            self.sub_sheets
                .iter()
                .map(|sub| fill_cells(ai, &headers, &sub.grid)),
        )
        .await;
        let mut total = FillReport::default();
        for (sub, (grid, report)) in self.sub_sheets.iter_mut().zip(results) {
            sub.grid = grid;
            total.merge(report);
        }
        info!(
            "3D RunCells: {} updated, {} skipped, {} failed",
            total.updated, total.skipped, total.failed
        );
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::systems::ai::test_support::StubCollaborator;

    fn rows(names: &[&str]) -> Vec<Vec<Cell>> {
        names
            .iter()
            .enumerate()
            .map(|(r, n)| vec![Cell::new(*n, r, 0)])
            .collect()
    }

    #[test]
    fn test_one_sub_sheet_per_row() {
        let stack = ThreeDStack::from_rows(vec!["Input".into()], &rows(&["Acme Corp"]));
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.sub_sheets[0].origin_cell().unwrap().value, "Acme Corp");
        assert_eq!(stack.sub_sheets[0].name(), "Acme Corp");
        assert!(stack.sub_sheets[0].grid.is_rectangular(stack.width()));
    }

    #[test]
    fn test_entity_ids_are_unique() {
        let stack = ThreeDStack::from_rows(vec![], &rows(&["a", "b"]));
        assert_ne!(stack.sub_sheets[0].entity_id, stack.sub_sheets[1].entity_id);
    }

    #[test]
    fn test_shared_header_edits_apply_to_all_sub_sheets() {
        let mut stack = ThreeDStack::from_rows(vec![], &rows(&["a", "b"]));
        stack.add_column();
        assert!(stack.sub_sheets.iter().all(|s| s.grid.is_rectangular(2)));
        assert!(stack.rename_header(1, "Price"));
        assert_eq!(stack.headers, vec!["Name", "Price"]);
        assert!(stack.delete_column(0));
        assert!(!stack.delete_column(0));
        assert!(stack.sub_sheets.iter().all(|s| s.grid.is_rectangular(1)));
    }

    #[test]
    fn test_sub_sheets_never_drop_to_zero() {
        let mut stack = ThreeDStack::from_rows(vec![], &rows(&["a", "b"]));
        assert!(stack.delete_sub_sheet(0));
        assert!(!stack.delete_sub_sheet(0));
        let id = stack.sub_sheets[0].entity_id.clone();
        assert!(stack.remove_entity(&id));
        assert_eq!(stack.len(), 1);
        assert_ne!(stack.sub_sheets[0].entity_id, id);
        stack.add_sub_sheet("x");
        stack.clear_sub_sheets();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.sub_sheets[0].name(), "");
    }

    #[test]
    fn test_window_follows_selection() {
        let mut stack = ThreeDStack::from_rows(vec![], &rows(&["a", "b", "c", "d", "e"]));
        assert_eq!(stack.window.range(stack.len()), 0..3);
        stack.select(4);
        assert_eq!(stack.window.range(stack.len()), 2..5);
        stack.select(1);
        assert_eq!(stack.window.range(stack.len()), 1..4);
        assert_eq!(stack.visible()[0].name(), "b");
        // hidden sub-sheets stay editable
        assert!(stack.set_cell(4, 0, 0, "edited"));
        assert_eq!(stack.sub_sheets[4].grid.value(0, 0), "edited");
    }

    #[tokio::test]
    async fn test_run_find_writes_back_per_sub_sheet() {
        let ai = StubCollaborator::new()
            .with_find("a", &["a1", "a2"])
            .failing_on("b");
        let mut stack = ThreeDStack::from_rows(vec![], &rows(&["a", "b"]));
        stack.set_cell(1, 0, 0, "keep");
        assert_eq!(stack.run_find(&ai).await, 1);
        assert_eq!(stack.sub_sheets[0].grid.values(), vec![vec!["a1".to_string()], vec!["a2".to_string()]]);
        assert_eq!(stack.sub_sheets[1].grid.value(0, 0), "keep");
    }

    #[tokio::test]
    async fn test_run_cells_fans_out() {
        let ai = StubCollaborator::new().failing_on("x2");
        let mut stack = ThreeDStack::from_rows(vec![], &rows(&["a", "b"]));
        stack.add_column();
        stack.set_cell(0, 0, 0, "x1");
        stack.set_cell(1, 0, 0, "x2");
        let report = stack.run_cells(&ai).await;
        assert_eq!(stack.sub_sheets[0].grid.value(0, 1), "x1/Column 2");
        assert_eq!(stack.sub_sheets[1].grid.value(0, 1), "");
        assert_eq!(report, FillReport { updated: 1, skipped: 0, failed: 1 });
    }
}
