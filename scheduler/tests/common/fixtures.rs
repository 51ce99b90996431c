//! Test fixtures and data for scheduler tests

use std::time::Duration;

use executor::{BatchOptions, ProviderResponse};
use shared::{ExecutionConfig, LlmConfig, Prompt, TemperatureSetting};

pub struct TestFixtures;

impl TestFixtures {
    pub const PROVIDER: &'static str = "gated";
    pub const DAILY_NINE: &'static str = "0 9 * * *";

    pub fn prompt(text: &str) -> Prompt {
        Prompt::new(text)
    }

    pub fn llm(name: &str) -> LlmConfig {
        LlmConfig::new(name, Self::PROVIDER, "gated-model").with_credential("test-key")
    }

    pub fn answer() -> ProviderResponse {
        ProviderResponse {
            content: "Try Acme or Globex.".to_string(),
            tokens_used: 10,
            prompt_tokens: 4,
            completion_tokens: 6,
            model_used: "gated-model".to_string(),
            sources: Vec::new(),
        }
    }

    /// No retries, short timeout
    pub fn batch_options() -> BatchOptions {
        BatchOptions {
            config: ExecutionConfig {
                temperature: 0.7,
                max_retries: 0,
                retry_delay: Duration::from_millis(0),
                call_timeout: Duration::from_secs(30),
            },
            temperature: TemperatureSetting::Fixed(0.4),
            new_only: false,
            worker_pool_size: 4,
        }
    }
}
