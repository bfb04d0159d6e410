// src/sheets/systems/logic/fill_cells.rs
use futures::future::join_all;
use tracing::{debug, warn};

use crate::sheets::sheet_grid_data::SheetGridData;
use crate::sheets::systems::ai::Collaborator;

/// Outcome counts of one fill pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FillReport {
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl FillReport {
    pub fn merge(&mut self, other: FillReport) {
        self.updated += other.updated;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

/// Fills columns 1.. of every row from one RunCells call per row, keyed
/// by header name. Calls run concurrently; a failed row keeps its values,
/// rows with a blank column 0 are not sent.
pub async fn fill_cells(
    ai: &dyn Collaborator,
    headers: &[String],
    grid: &SheetGridData,
) -> (SheetGridData, FillReport) {
    let mut report = FillReport::default();
    let mut next = grid.clone();
    if headers.len() < 2 {
        debug!("RunCells skipped: no columns to fill");
        report.skipped = grid.row_count();
        return (next, report);
    }
    let columns: Vec<String> = headers[1..].to_vec();

    let targets: Vec<(usize, String)> = (0..grid.row_count())
        .filter_map(|r| {
            let key = grid.key_of(r);
            (!key.is_empty()).then(|| (r, key.to_string()))
        })
        .collect();
    report.skipped = grid.row_count() - targets.len();

    let results = join_all(
        targets
            .iter()
            .map(|(_, input)| ai.run_cells(input, &columns)),
    )
    .await;

    for ((row, input), result) in targets.iter().zip(results) {
        match result {
            Ok(values) => {
                for (offset, header) in columns.iter().enumerate() {
                    let value = values.get(header).cloned().unwrap_or_default();
                    next.set_cell(*row, offset + 1, value, headers.len());
                }
                report.updated += 1;
            }
            Err(e) => {
                warn!("RunCells for row {} ('{}') failed: {}", row, input, e);
                report.failed += 1;
            }
        }
    }
    (next, report)
}
