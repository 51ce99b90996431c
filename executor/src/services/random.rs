//! Offline provider producing brand-mention text without any network calls

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::Mutex;

use shared::ApiFailure;

use crate::traits::Provider;
use crate::types::{GenerationRequest, ModelInfo, ProviderResponse};

const BRANDS: &[&str] = &[
    "Acme", "Globex", "Initech", "Umbrella", "Hooli", "Stark Industries", "Wayne Enterprises",
    "Soylent", "Vandelay", "Cyberdyne", "Tyrell", "Wonka",
];

const TEMPLATES: &[&str] = &[
    "For \"{prompt}\" most reviewers point to {a}, with {b} and {c} close behind.",
    "If you are asking about \"{prompt}\", I would recommend {a} over {b}. Some people also like {c}.",
    "The usual shortlist for \"{prompt}\" is {a}, {b} and {c}; {a} tends to lead on value.",
];

/// Provider that fabricates plausible answers; used for demos and tests
pub struct RandomProvider {
    rng: Mutex<StdRng>,
}

impl RandomProvider {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible output sequence for a given seed
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn compose(&self, prompt: &str) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let picks: Vec<&str> = BRANDS.choose_multiple(&mut *rng, 3).copied().collect();
        let template = TEMPLATES.choose(&mut *rng).copied().unwrap_or(TEMPLATES[0]);
        template
            .replace("{prompt}", prompt.trim())
            .replace("{a}", picks[0])
            .replace("{b}", picks[1])
            .replace("{c}", picks[2])
    }
}

impl Default for RandomProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for RandomProvider {
    fn name(&self) -> String {
        "random".to_string()
    }

    fn requires_credential(&self) -> bool {
        false
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ProviderResponse, ApiFailure> {
        let content = self.compose(&request.prompt);
        let prompt_tokens = request.prompt.split_whitespace().count() as u32;
        let completion_tokens = content.split_whitespace().count() as u32;

        Ok(ProviderResponse {
            content,
            tokens_used: prompt_tokens + completion_tokens,
            prompt_tokens,
            completion_tokens,
            model_used: request.model.clone(),
            sources: Vec::new(),
        })
    }

    async fn list_models(
        &self,
        _credential: &str,
        _endpoint: Option<String>,
    ) -> Result<Vec<ModelInfo>, ApiFailure> {
        Ok(vec![ModelInfo::new("random-brands")])
    }
}
