// Generation: cover letters, skill lists and project recommendations.
// Every LLM-backed operation has a deterministic fallback, used when the model
// is not configured or the call fails. All LLM calls go through llm_client.

pub mod cover_letter;
pub mod handlers;
pub mod projects;
pub mod prompts;
pub mod skills;
pub mod tone;

use serde::Serialize;

/// Where a generated result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationSource {
    Llm,
    Fallback,
}
