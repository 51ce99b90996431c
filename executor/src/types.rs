//! Executor-specific data types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use shared::{
    ExecutionConfig, GroundingSource, LlmConfig, LlmId, Prompt, PromptId, TemperatureSetting,
};

/// A single generation call handed to a provider
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub temperature: f32,
    /// Per-LLM credential; `None` means use the provider's bootstrap credential
    pub credential: Option<String>,
    /// Per-LLM endpoint override
    pub base_url: Option<String>,
    /// Free-form extra parameters from the LLM config
    pub config: HashMap<String, serde_json::Value>,
}

impl GenerationRequest {
    pub fn for_llm(prompt: &Prompt, llm: &LlmConfig, temperature: f32) -> Self {
        Self {
            prompt: prompt.text.clone(),
            model: llm.model.clone(),
            temperature,
            credential: (!llm.credential.is_empty()).then(|| llm.credential.clone()),
            base_url: llm.base_url.clone(),
            config: llm.config.clone(),
        }
    }
}

/// Provider response data
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderResponse {
    pub content: String,
    pub tokens_used: u32,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub model_used: String,
    pub sources: Vec<GroundingSource>,
}

/// A model advertised by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub display_name: Option<String>,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }
}

/// Parameters of one batch run
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOptions {
    /// Retry policy and timeout; its temperature is replaced per prompt
    pub config: ExecutionConfig,
    pub temperature: TemperatureSetting,
    /// Skip prompts that already have at least one stored response
    pub new_only: bool,
    pub worker_pool_size: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            config: ExecutionConfig::default(),
            temperature: TemperatureSetting::default(),
            new_only: false,
            worker_pool_size: 4,
        }
    }
}

/// A (prompt, LLM) pair that did not produce a successful response
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairFailure {
    pub prompt_id: PromptId,
    pub llm_id: LlmId,
    pub llm_name: String,
    pub error: String,
}

/// Outcome counts of a batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failures: Vec<PairFailure>,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pairs: {} succeeded, {} failed, {} skipped",
            self.total, self.succeeded, self.failed, self.skipped
        )
    }
}
