//! Execution of a single (prompt, LLM) pair with bounded retries

use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use shared::logging::Component;
use shared::{
    component_debug, component_info, component_warn, ApiFailure, ExecutionConfig, LlmConfig,
    Prompt, Response, Store,
};

use crate::core::registry::ProviderRegistry;
use crate::error::{ExecutorError, ExecutorResult};
use crate::types::{GenerationRequest, ProviderResponse};

/// Runs prompts against registered providers and persists the final outcome
pub struct Coordinator {
    store: Arc<dyn Store>,
    registry: Arc<ProviderRegistry>,
}

impl Coordinator {
    pub fn new(store: Arc<dyn Store>, registry: Arc<ProviderRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &Arc<ProviderRegistry> {
        &self.registry
    }

    /// Execute `prompt` against `llm`, retrying transient failures.
    ///
    /// Exactly one response is persisted once a terminal provider outcome is
    /// reached. Configuration errors and cancellation persist nothing.
    pub async fn execute_prompt_with_llm(
        &self,
        prompt: &Prompt,
        llm: &LlmConfig,
        config: &ExecutionConfig,
        cancel: &CancellationToken,
    ) -> ExecutorResult<Response> {
        let provider = self
            .registry
            .get(&llm.provider)
            .ok_or_else(|| ExecutorError::UnknownProvider {
                provider: llm.provider.clone(),
            })?;

        if llm.credential.is_empty() && provider.requires_credential() && !provider.has_default_credential() {
            return Err(ExecutorError::MissingCredential {
                provider: llm.provider.clone(),
                llm: llm.name.clone(),
            });
        }

        let request = GenerationRequest::for_llm(prompt, llm, config.temperature);
        let max_attempts = config.max_attempts();
        let mut attempts = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(ExecutorError::Cancelled { attempts });
            }

            attempts += 1;
            let started = Instant::now();
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ExecutorError::Cancelled { attempts }),
                result = tokio::time::timeout(config.call_timeout, provider.generate(&request)) => {
                    result.unwrap_or(Err(ApiFailure::Timeout))
                }
            };
            let latency_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(generated) => {
                    let response = Self::success_response(prompt, llm, config, generated, attempts, latency_ms);
                    self.store.create_response(response.clone()).await?;
                    component_info!(
                        Component::Executor,
                        "✅ {} answered prompt {} in {}ms ({} attempt(s), {} tokens)",
                        llm.name,
                        prompt.id,
                        latency_ms,
                        attempts,
                        response.tokens_used
                    );
                    return Ok(response);
                }
                Err(failure) if failure.is_retryable() && attempts < max_attempts => {
                    component_warn!(
                        Component::Executor,
                        "⏳ {} failed (attempt {}/{}): {}, retrying in {}s",
                        llm.name,
                        attempts,
                        max_attempts,
                        failure,
                        config.retry_delay.as_secs_f32()
                    );
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(ExecutorError::Cancelled { attempts }),
                        _ = tokio::time::sleep(config.retry_delay) => {}
                    }
                }
                Err(failure) => {
                    let mut response = Response::for_pair(prompt, llm, config.temperature);
                    response.attempts = attempts;
                    response.latency_ms = latency_ms;
                    response.error = Some(failure.to_string());
                    self.store.create_response(response.clone()).await?;
                    component_warn!(
                        Component::Executor,
                        "❌ {} gave up on prompt {} after {} attempt(s): {}",
                        llm.name,
                        prompt.id,
                        attempts,
                        failure
                    );
                    return Err(ExecutorError::ProviderFailed {
                        failure,
                        attempts,
                        response: Box::new(response),
                    });
                }
            }
        }
    }

    fn success_response(
        prompt: &Prompt,
        llm: &LlmConfig,
        config: &ExecutionConfig,
        generated: ProviderResponse,
        attempts: u32,
        latency_ms: u64,
    ) -> Response {
        let mut response = Response::for_pair(prompt, llm, config.temperature);
        if !generated.model_used.is_empty() && generated.model_used != llm.model {
            component_debug!(
                Component::Executor,
                "Provider served model {} for requested {}",
                generated.model_used,
                llm.model
            );
        }
        response.response_text = generated.content;
        response.tokens_used = generated.tokens_used;
        response.sources = generated.sources;
        response.attempts = attempts;
        response.latency_ms = latency_ms;
        response
    }
}
