// src/sheets/systems/mod.rs

pub mod ai;     // Collaborator trait, Gemini messenger, response cache
pub mod logic;  // Find / RunCells grid logic shared by the sheet views
