//! Scheduler error types

use analytics::AnalyticsError;
use executor::ExecutorError;
use shared::{ScheduleId, SharedError};
use thiserror::Error;

/// Result type for scheduler operations
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Scheduler error types
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid cron expression '{expression}': {message}")]
    InvalidCron { expression: String, message: String },

    #[error("Schedule not found: {id}")]
    NotFound { id: ScheduleId },

    #[error("Schedule {id} is already running")]
    AlreadyRunning { id: ScheduleId },

    #[error("Scheduler is shutting down")]
    ShuttingDown,

    #[error("Configuration error: {field} - {message}")]
    Config { field: String, message: String },

    #[error("Execution error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Analytics error: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("Shared component error: {0}")]
    Shared(#[from] SharedError),
}

impl SchedulerError {
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        SchedulerError::Config {
            field: field.into(),
            message: message.into(),
        }
    }
}
