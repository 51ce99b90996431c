//! Provider implementations

pub mod anthropic;
pub mod gemini;
pub(crate) mod http;
pub mod openai;
pub mod random;

#[cfg(test)]
pub mod tests;

pub use anthropic::*;
pub use gemini::*;
pub use openai::*;
pub use random::*;

use std::env;
use std::sync::Arc;

use shared::component_info;
use shared::logging::Component;

use crate::core::registry::ProviderRegistry;

/// Bootstrap credentials for the remote providers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderKeys {
    pub openai: Option<String>,
    pub anthropic: Option<String>,
    pub gemini: Option<String>,
}

impl ProviderKeys {
    /// Read `OPENAI_API_KEY`, `ANTHROPIC_API_KEY` and `GOOGLE_API_KEY` (or `GEMINI_API_KEY`)
    pub fn from_env() -> Self {
        let read = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            openai: read("OPENAI_API_KEY"),
            anthropic: read("ANTHROPIC_API_KEY"),
            gemini: read("GOOGLE_API_KEY").or_else(|| read("GEMINI_API_KEY")),
        }
    }
}

/// Registry holding every built-in provider
pub fn bootstrap_registry(keys: ProviderKeys) -> ProviderRegistry {
    let registry = ProviderRegistry::new();

    for (name, found) in [
        ("openai", keys.openai.is_some()),
        ("anthropic", keys.anthropic.is_some()),
        ("gemini", keys.gemini.is_some()),
    ] {
        if found {
            component_info!(Component::Executor, "🔑 Found bootstrap credential for {}", name);
        }
    }

    registry.register("openai", Arc::new(OpenAiProvider::new(keys.openai)));
    registry.register("anthropic", Arc::new(AnthropicProvider::new(keys.anthropic)));
    registry.register("gemini", Arc::new(GeminiProvider::new(keys.gemini)));
    registry.register("random", Arc::new(RandomProvider::new()));
    registry
}
