//! Execution pipeline: provider registry, retrying coordinator and batch runner

pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

pub use crate::core::{BatchRunner, Coordinator, ProviderRegistry};
pub use error::{ExecutorError, ExecutorResult};
pub use services::{bootstrap_registry, ProviderKeys};
pub use traits::{MockProvider, Provider};
pub use types::{
    BatchOptions, BatchSummary, GenerationRequest, ModelInfo, PairFailure, ProviderResponse,
};
