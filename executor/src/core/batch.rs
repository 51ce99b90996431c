//! Bounded-concurrency execution of the prompt × LLM cross-product

use futures_util::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use shared::logging::{log_progress, Component};
use shared::{component_info, component_warn, LlmConfig, Prompt, Store};

use crate::core::coordinator::Coordinator;
use crate::error::{ExecutorError, ExecutorResult};
use crate::types::{BatchOptions, BatchSummary, PairFailure};

enum PairOutcome {
    Succeeded,
    Failed(PairFailure),
    Skipped,
}

/// Runs every (prompt, LLM) pair of a batch through the coordinator
pub struct BatchRunner {
    coordinator: Arc<Coordinator>,
    store: Arc<dyn Store>,
}

impl BatchRunner {
    pub fn new(coordinator: Arc<Coordinator>, store: Arc<dyn Store>) -> Self {
        Self { coordinator, store }
    }

    pub async fn enabled_prompts(&self) -> ExecutorResult<Vec<Prompt>> {
        Ok(self.store.list_prompts(true).await?)
    }

    pub async fn enabled_llms(&self) -> ExecutorResult<Vec<LlmConfig>> {
        Ok(self.store.list_llms(true).await?)
    }

    /// Run every enabled prompt against every enabled LLM
    pub async fn run_enabled(
        &self,
        options: &BatchOptions,
        cancel: &CancellationToken,
    ) -> ExecutorResult<BatchSummary> {
        let prompts = self.enabled_prompts().await?;
        let llms = self.enabled_llms().await?;
        self.run_once(prompts, llms, options, cancel).await
    }

    /// Run the cross-product of `prompts` × `llms`.
    ///
    /// Continues past per-pair failures. Pairs not yet started when `cancel`
    /// fires are counted as skipped.
    pub async fn run_once(
        &self,
        prompts: Vec<Prompt>,
        llms: Vec<LlmConfig>,
        options: &BatchOptions,
        cancel: &CancellationToken,
    ) -> ExecutorResult<BatchSummary> {
        let prompts = if options.new_only {
            self.unanswered(prompts).await?
        } else {
            prompts
        };

        // One temperature per prompt, shared by every LLM that runs it
        let temperatures: Vec<f32> = {
            let mut rng = rand::thread_rng();
            prompts.iter().map(|_| options.temperature.resolve(&mut rng)).collect()
        };

        let pairs: Vec<(Prompt, f32, LlmConfig)> = prompts
            .iter()
            .zip(temperatures)
            .flat_map(|(prompt, temperature)| {
                llms.iter().map(move |llm| (prompt.clone(), temperature, llm.clone()))
            })
            .collect();

        let total = pairs.len();
        log_progress(
            Component::Executor,
            "Batch started",
            &format!(
                "{} prompts × {} llms = {} pairs (pool {})",
                prompts.len(),
                llms.len(),
                total,
                options.worker_pool_size
            ),
        );

        let outcomes: Vec<PairOutcome> = stream::iter(pairs)
            .map(|(prompt, temperature, llm)| async move {
                self.run_pair(&prompt, temperature, &llm, options, cancel).await
            })
            .buffer_unordered(options.worker_pool_size.max(1))
            .collect()
            .await;

        let mut summary = BatchSummary {
            total,
            ..BatchSummary::default()
        };
        for outcome in outcomes {
            match outcome {
                PairOutcome::Succeeded => summary.succeeded += 1,
                PairOutcome::Skipped => summary.skipped += 1,
                PairOutcome::Failed(failure) => {
                    summary.failed += 1;
                    summary.failures.push(failure);
                }
            }
        }

        component_info!(Component::Executor, "📊 Batch finished: {}", summary);
        Ok(summary)
    }

    async fn run_pair(
        &self,
        prompt: &Prompt,
        temperature: f32,
        llm: &LlmConfig,
        options: &BatchOptions,
        cancel: &CancellationToken,
    ) -> PairOutcome {
        if cancel.is_cancelled() {
            return PairOutcome::Skipped;
        }

        let config = options.config.with_temperature(temperature);
        match self.coordinator.execute_prompt_with_llm(prompt, llm, &config, cancel).await {
            Ok(_) => PairOutcome::Succeeded,
            Err(ExecutorError::Cancelled { .. }) => PairOutcome::Skipped,
            Err(error) => {
                component_warn!(
                    Component::Executor,
                    "⚠️ Pair (prompt {}, llm {}) failed: {}",
                    prompt.id,
                    llm.name,
                    error
                );
                PairOutcome::Failed(PairFailure {
                    prompt_id: prompt.id,
                    llm_id: llm.id,
                    llm_name: llm.name.clone(),
                    error: error.to_string(),
                })
            }
        }
    }

    /// Drop prompts that already have at least one stored response
    async fn unanswered(&self, prompts: Vec<Prompt>) -> ExecutorResult<Vec<Prompt>> {
        let mut remaining = Vec::with_capacity(prompts.len());
        for prompt in prompts {
            if !self.store.has_responses_for_prompt(prompt.id).await? {
                remaining.push(prompt);
            }
        }
        Ok(remaining)
    }
}
