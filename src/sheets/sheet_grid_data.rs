// src/sheets/sheet_grid_data.rs
use serde::{Deserialize, Serialize};

/// A single addressable cell. `row`/`col` are positional and kept contiguous
/// by the owning grid after every structural edit.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: String,
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(value: impl Into<String>, row: usize, col: usize) -> Self {
        Self {
            value: value.into(),
            row,
            col,
        }
    }

    pub fn blank(row: usize, col: usize) -> Self {
        Self::new(String::new(), row, col)
    }
}

/// Row-major cell storage. The column count lives with the owner's header
/// list, so structural methods take the current width where they need it.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetGridData {
    pub rows: Vec<Vec<Cell>>,
}

impl SheetGridData {
    /// `height` rows of `width` blank cells.
    pub fn blank(width: usize, height: usize) -> Self {
        let rows = (0..height)
            .map(|r| (0..width).map(|c| Cell::blank(r, c)).collect())
            .collect();
        Self { rows }
    }

    /// Builds a grid from plain values, padding or truncating each row to `width`.
    pub fn from_values(values: Vec<Vec<String>>, width: usize) -> Self {
        let rows = values
            .into_iter()
            .enumerate()
            .map(|(r, row)| {
                let mut cells: Vec<Cell> = row
                    .into_iter()
                    .take(width)
                    .enumerate()
                    .map(|(c, value)| Cell::new(value, r, c))
                    .collect();
                while cells.len() < width {
                    cells.push(Cell::blank(r, cells.len()));
                }
                cells
            })
            .collect();
        Self { rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn value(&self, row: usize, col: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|c| c.value.as_str())
            .unwrap_or("")
    }

    pub fn row_values(&self, row: usize) -> Vec<String> {
        self.rows
            .get(row)
            .map(|r| r.iter().map(|c| c.value.clone()).collect())
            .unwrap_or_default()
    }

    pub fn values(&self) -> Vec<Vec<String>> {
        (0..self.rows.len()).map(|r| self.row_values(r)).collect()
    }

    /// Identifying (column 0) value of a row, trimmed.
    pub fn key_of(&self, row: usize) -> &str {
        self.value(row, 0).trim()
    }

    /// Writes `value` at (`row`, `col`). Rows past the end are filled with
    /// blank cells up to `row`. Returns `false` when `col` is outside `width`.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>, width: usize) -> bool {
        if col >= width {
            return false;
        }
        while self.rows.len() <= row {
            self.push_row(width);
        }
        let cells = &mut self.rows[row];
        while cells.len() < width {
            cells.push(Cell::blank(row, cells.len()));
        }
        cells[col].value = value.into();
        true
    }

    /// Appends a blank cell to every row at the current end index.
    pub fn push_column(&mut self) {
        for (r, row) in self.rows.iter_mut().enumerate() {
            let col = row.len();
            row.push(Cell::blank(r, col));
        }
    }

    pub fn remove_column(&mut self, col: usize) {
        for row in self.rows.iter_mut() {
            if col < row.len() {
                row.remove(col);
            }
        }
        self.reindex();
    }

    pub fn push_row(&mut self, width: usize) {
        let r = self.rows.len();
        self.rows.push((0..width).map(|c| Cell::blank(r, c)).collect());
    }

    pub fn remove_row(&mut self, row: usize) {
        if row < self.rows.len() {
            self.rows.remove(row);
            self.reindex();
        }
    }

    /// Replaces every row with a single blank one.
    pub fn clear(&mut self, width: usize) {
        *self = Self::blank(width, 1);
    }

    /// Restores contiguous `row`/`col` labels after a structural edit.
    pub fn reindex(&mut self) {
        for (r, row) in self.rows.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                cell.row = r;
                cell.col = c;
            }
        }
    }

    /// True when every row has exactly `width` cells.
    #[cfg(test)]
    pub fn is_rectangular(&self, width: usize) -> bool {
        self.rows.iter().all(|r| r.len() == width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_grid_labels() {
        let grid = SheetGridData::blank(2, 3);
        assert_eq!(grid.row_count(), 3);
        assert!(grid.is_rectangular(2));
        assert_eq!(grid.rows[2][1], Cell::blank(2, 1));
    }

    #[test]
    fn test_set_cell_extends_with_blanks() {
        let mut grid = SheetGridData::blank(2, 1);
        assert!(grid.set_cell(3, 1, "x", 2));
        assert_eq!(grid.row_count(), 4);
        assert!(grid.is_rectangular(2));
        assert_eq!(grid.value(3, 1), "x");
        assert_eq!(grid.value(2, 0), "");
        assert_eq!(grid.rows[3][1].row, 3);
    }

    #[test]
    fn test_set_cell_rejects_column_outside_width() {
        let mut grid = SheetGridData::blank(2, 1);
        assert!(!grid.set_cell(0, 2, "x", 2));
        assert_eq!(grid, SheetGridData::blank(2, 1));
    }

    #[test]
    fn test_remove_column_reindexes() {
        let mut grid = SheetGridData::from_values(
            vec![vec!["a".into(), "b".into(), "c".into()]],
            3,
        );
        grid.remove_column(1);
        assert_eq!(grid.row_values(0), vec!["a", "c"]);
        assert_eq!(grid.rows[0][1].col, 1);
    }

    #[test]
    fn test_remove_row_reindexes() {
        let mut grid = SheetGridData::from_values(
            vec![vec!["a".into()], vec!["b".into()], vec!["c".into()]],
            1,
        );
        grid.remove_row(0);
        assert_eq!(grid.values(), vec![vec!["b".to_string()], vec!["c".to_string()]]);
        assert_eq!(grid.rows[1][0].row, 1);
    }

    #[test]
    fn test_from_values_pads_and_truncates() {
        let grid = SheetGridData::from_values(
            vec![vec!["a".into()], vec!["b".into(), "c".into(), "d".into()]],
            2,
        );
        assert!(grid.is_rectangular(2));
        assert_eq!(grid.row_values(0), vec!["a", ""]);
        assert_eq!(grid.row_values(1), vec!["b", "c"]);
    }
}
