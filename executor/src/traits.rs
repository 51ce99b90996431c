//! Executor trait definitions for dependency injection

use async_trait::async_trait;

use crate::types::{GenerationRequest, ModelInfo, ProviderResponse};
use shared::ApiFailure;

/// Uniform capability of a generative model provider
#[mockall::automock]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Registry name of the provider
    fn name(&self) -> String;

    /// Whether a bootstrap credential was configured for this provider
    fn has_default_credential(&self) -> bool {
        false
    }

    /// Providers that run offline need no credential at all
    fn requires_credential(&self) -> bool {
        true
    }

    /// Run one generation call
    async fn generate(&self, request: &GenerationRequest) -> Result<ProviderResponse, ApiFailure>;

    /// List the models available to `credential` at `endpoint` (or the default endpoint)
    async fn list_models(
        &self,
        credential: &str,
        endpoint: Option<String>,
    ) -> Result<Vec<ModelInfo>, ApiFailure>;
}
