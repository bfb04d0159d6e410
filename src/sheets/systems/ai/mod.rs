// src/sheets/systems/ai/mod.rs
//! AI collaborators
//!
//! - **Collaborator**: the Find / RunCells / Aggregate / LLMComplete contract
//! - **Handlers**: prompt-backed implementation of that contract
//! - **Messenger**: outbound text generation (Gemini REST)
//! - **Cache**: disk-backed response cache keyed by request fingerprint
//! - **Parser**: model output → lists / maps, degrading to empty

pub mod cache;
pub mod collaborator;
pub mod handlers;
pub mod messenger;
pub mod parser;
pub mod prompts;

#[cfg(test)]
pub mod test_support;

pub use cache::{CachedGenerator, ResponseCache};
pub use collaborator::{AggregateRequest, AiError, Collaborator};
pub use handlers::PromptCollaborator;
pub use messenger::GeminiMessenger;
