// src/sheets/systems/logic/find_rows.rs
use tracing::{debug, warn};

use crate::sheets::sheet_grid_data::SheetGridData;
use crate::sheets::systems::ai::Collaborator;

/// Asks the Find collaborator for `query` and lays the results out as one
/// row per result (column 0 = result, other columns blank).
///
/// Returns `None` when the grid should stay as it is: blank query, failed
/// call, or no results.
pub async fn find_rows(
    ai: &dyn Collaborator,
    query: &str,
    sheet_level: bool,
    width: usize,
) -> Option<SheetGridData> {
    let query = query.trim();
    if query.is_empty() {
        debug!("Find skipped: blank query");
        return None;
    }
    match ai.find(query, sheet_level).await {
        Ok(results) if results.is_empty() => {
            warn!("Find '{}' returned no results; keeping existing rows", query);
            None
        }
        Ok(results) => {
            debug!("Find '{}' -> {} rows", query, results.len());
            let values = results.into_iter().map(|r| vec![r]).collect();
            Some(SheetGridData::from_values(values, width))
        }
        Err(e) => {
            warn!("Find '{}' failed: {}", query, e);
            None
        }
    }
}
