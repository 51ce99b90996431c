//! Executor error types

use shared::{ApiFailure, Response, SharedError};
use thiserror::Error;

/// Result type for executor operations
pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Executor error types
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Unknown provider: {provider}")]
    UnknownProvider { provider: String },

    #[error("No credential for LLM '{llm}' and provider '{provider}' has no default")]
    MissingCredential { provider: String, llm: String },

    /// Terminal provider failure; the failed response has already been persisted
    #[error("Provider call failed after {attempts} attempt(s): {failure}")]
    ProviderFailed {
        failure: ApiFailure,
        attempts: u32,
        response: Box<Response>,
    },

    #[error("Execution cancelled after {attempts} attempt(s)")]
    Cancelled { attempts: u32 },

    #[error("Storage error: {0}")]
    Storage(#[from] SharedError),
}

impl ExecutorError {
    /// Configuration errors are fatal and never reach a provider
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ExecutorError::UnknownProvider { .. } | ExecutorError::MissingCredential { .. }
        )
    }
}
