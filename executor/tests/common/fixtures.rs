//! Test fixtures and data for executor tests

use std::time::Duration;

use executor::ProviderResponse;
use shared::{ExecutionConfig, LlmConfig, Prompt};

/// Standard test data and fixtures
pub struct TestFixtures;

impl TestFixtures {
    pub const SCRIPTED_PROVIDER: &'static str = "scripted";
    pub const TEST_CREDENTIAL: &'static str = "test-key";

    pub fn prompt(text: &str) -> Prompt {
        Prompt::new(text)
    }

    /// LLM bound to the scripted provider with its own credential
    pub fn scripted_llm(name: &str) -> LlmConfig {
        LlmConfig::new(name, Self::SCRIPTED_PROVIDER, "scripted-model").with_credential(Self::TEST_CREDENTIAL)
    }

    pub fn answer(content: &str) -> ProviderResponse {
        ProviderResponse {
            content: content.to_string(),
            tokens_used: 20,
            prompt_tokens: 8,
            completion_tokens: 12,
            model_used: "scripted-model".to_string(),
            sources: Vec::new(),
        }
    }

    /// Execution config with the given retry policy and a generous timeout
    pub fn config(max_retries: u32, retry_delay: Duration) -> ExecutionConfig {
        ExecutionConfig {
            temperature: 0.5,
            max_retries,
            retry_delay,
            call_timeout: Duration::from_secs(30),
        }
    }
}
