// src/sheets/database/library.rs
//! Spreadsheet entity library
//!
//! The persisted side of the 3D stacks: one entity per sub-sheet, all
//! sharing one header list, saved as a single JSON blob under
//! `STORAGE_KEY`. Every mutating call writes the blob back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::error::{StoreError, StoreResult};
use super::store::{SpreadsheetStore, STORAGE_KEY};
use crate::sheets::sheet_grid_data::{Cell, SheetGridData};
use crate::sheets::three_d::{new_entity_id, SubSheet, ThreeDStack, VisibleWindow};

/// Row key → header name → text.
pub type EntityRows = BTreeMap<usize, BTreeMap<String, String>>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpreadsheetEntity {
    pub id: String,
    pub name: String,
    pub rows: EntityRows,
}

impl SpreadsheetEntity {
    fn blank(name: impl Into<String>, headers: &[String]) -> Self {
        let row = headers.iter().map(|h| (h.clone(), String::new())).collect();
        Self {
            id: new_entity_id(),
            name: name.into(),
            rows: BTreeMap::from([(0, row)]),
        }
    }

    /// Grid rows follow the row keys; keys never written come back blank.
    fn to_grid(&self, headers: &[String]) -> SheetGridData {
        let Some(&last) = self.rows.keys().next_back() else {
            return SheetGridData::blank(headers.len(), 1);
        };
        let values: Vec<Vec<String>> = (0..=last)
            .map(|r| {
                headers
                    .iter()
                    .map(|h| {
                        self.rows
                            .get(&r)
                            .and_then(|row| row.get(h))
                            .cloned()
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        SheetGridData::from_values(values, headers.len())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    pub headers: Vec<String>,
    pub entities: Vec<SpreadsheetEntity>,
}

pub struct SheetLibrary<S> {
    store: S,
    state: PersistedState,
}

impl<S: SpreadsheetStore> SheetLibrary<S> {
    /// Loads the library; a missing or unreadable blob starts empty.
    pub fn open(store: S) -> StoreResult<Self> {
        let state = match store.load(STORAGE_KEY)? {
            Some(blob) => match serde_json::from_str(&blob) {
                Ok(state) => state,
                Err(e) => {
                    warn!("Library: stored blob is unreadable, starting empty: {}", e);
                    PersistedState::default()
                }
            },
            None => PersistedState::default(),
        };
        Ok(Self { store, state })
    }

    pub fn headers(&self) -> &[String] {
        &self.state.headers
    }

    pub fn entities(&self) -> &[SpreadsheetEntity] {
        &self.state.entities
    }

    pub fn entity(&self, id: &str) -> Option<&SpreadsheetEntity> {
        self.state.entities.iter().find(|e| e.id == id)
    }

    fn entity_mut(&mut self, id: &str) -> StoreResult<&mut SpreadsheetEntity> {
        self.state
            .entities
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StoreError::EntityNotFound(id.to_string()))
    }

    pub fn save(&mut self) -> StoreResult<()> {
        let blob = serde_json::to_string(&self.state)?;
        self.store.save(STORAGE_KEY, &blob)
    }

    pub fn add_sheet(&mut self, name: impl Into<String>) -> StoreResult<String> {
        if self.state.headers.is_empty() {
            self.state.headers.push(crate::sheets::three_d::DEFAULT_STACK_HEADER.to_string());
        }
        let entity = SpreadsheetEntity::blank(name, &self.state.headers);
        let id = entity.id.clone();
        self.state.entities.push(entity);
        self.save()?;
        Ok(id)
    }

    pub fn set_cell(&mut self, id: &str, row: usize, col: usize, value: impl Into<String>) -> StoreResult<()> {
        let header = self
            .state
            .headers
            .get(col)
            .cloned()
            .ok_or(StoreError::HeaderOutOfRange(col))?;
        self.entity_mut(id)?
            .rows
            .entry(row)
            .or_default()
            .insert(header, value.into());
        self.save()
    }

    /// Renames the shared header and the matching key in every entity row.
    pub fn rename_header(&mut self, col: usize, name: impl Into<String>) -> StoreResult<()> {
        let name = name.into();
        let old = self
            .state
            .headers
            .get(col)
            .cloned()
            .ok_or(StoreError::HeaderOutOfRange(col))?;
        self.state.headers[col] = name.clone();
        for entity in self.state.entities.iter_mut() {
            for row in entity.rows.values_mut() {
                if let Some(value) = row.remove(&old) {
                    row.insert(name.clone(), value);
                }
            }
        }
        self.save()
    }

    pub fn delete_entity(&mut self, id: &str) -> StoreResult<()> {
        let before = self.state.entities.len();
        self.state.entities.retain(|e| e.id != id);
        if self.state.entities.len() == before {
            return Err(StoreError::EntityNotFound(id.to_string()));
        }
        info!("Library: deleted entity {}", id);
        self.save()
    }

    /// Removes every entity and leaves one empty sheet.
    pub fn clear_all(&mut self) -> StoreResult<()> {
        if self.state.headers.is_empty() {
            self.state.headers.push(crate::sheets::three_d::DEFAULT_STACK_HEADER.to_string());
        }
        self.state.entities = vec![SpreadsheetEntity::blank("Sheet 1", &self.state.headers)];
        self.save()
    }

    /// Replaces the library contents with a 3D stack.
    pub fn store_stack(&mut self, stack: &ThreeDStack) -> StoreResult<()> {
        self.state.headers = stack.headers.clone();
        self.state.entities = stack
            .sub_sheets
            .iter()
            .map(|sub| SpreadsheetEntity {
                id: sub.entity_id.clone(),
                name: sub.name().to_string(),
                rows: sub
                    .grid
                    .rows
                    .iter()
                    .enumerate()
                    .map(|(r, row)| {
                        let cells = row
                            .iter()
                            .zip(stack.headers.iter())
                            .map(|(cell, h)| (h.clone(), cell.value.clone()))
                            .collect();
                        (r, cells)
                    })
                    .collect(),
            })
            .collect();
        info!("Library: stored {} sheets", self.state.entities.len());
        self.save()
    }

    /// Rebuilds a 3D stack from the library, one sub-sheet per entity.
    pub fn load_stack(&self) -> Option<ThreeDStack> {
        if self.state.entities.is_empty() || self.state.headers.is_empty() {
            return None;
        }
        let headers = self.state.headers.clone();
        let sub_sheets = self
            .state
            .entities
            .iter()
            .map(|entity| SubSheet {
                entity_id: entity.id.clone(),
                origin: vec![Cell::new(entity.name.clone(), 0, 0)],
                grid: entity.to_grid(&headers),
            })
            .collect();
        Some(ThreeDStack {
            headers,
            origin_headers: Vec::new(),
            sub_sheets,
            window: VisibleWindow::default(),
        })
    }
}
