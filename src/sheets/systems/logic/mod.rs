// src/sheets/systems/logic/mod.rs

pub mod fill_cells;
pub mod find_rows;

pub use fill_cells::{fill_cells, FillReport};
pub use find_rows::find_rows;
