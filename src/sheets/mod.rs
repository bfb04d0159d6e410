// src/sheets/mod.rs

// --- Sheet views ---
pub mod aggregation;
pub mod llm_pipe;
pub mod sheet_grid_data;
pub mod single_sheet;
pub mod three_d;

// --- Orchestration and persistence ---
pub mod database;
pub mod workflow;

// AI collaborator plumbing and the grid logic built on it
pub mod systems;
