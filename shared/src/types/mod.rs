//! Core types used throughout the tracker workspace

pub mod entities;
pub mod execution;
pub mod response;

pub use entities::*;
pub use execution::*;
pub use response::*;

use uuid::Uuid;

/// Identifier of a stored prompt
pub type PromptId = Uuid;

/// Identifier of a stored LLM configuration
pub type LlmId = Uuid;

/// Identifier of a stored schedule
pub type ScheduleId = Uuid;

/// Identifier of a stored response
pub type ResponseId = Uuid;

/// Normalize a provider name for registry lookups and grouping
pub fn normalize_provider_name(name: &str) -> String {
    name.trim().to_lowercase()
}
