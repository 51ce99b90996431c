//! OpenAI chat completions provider

use async_trait::async_trait;
use serde_json::json;

use shared::ApiFailure;

use crate::services::http::{endpoint, merge_config, send_json, token_count};
use crate::traits::Provider;
use crate::types::{GenerationRequest, ModelInfo, ProviderResponse};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn credential<'a>(&'a self, credential: Option<&'a str>) -> Result<&'a str, ApiFailure> {
        credential
            .filter(|c| !c.is_empty())
            .or(self.api_key.as_deref())
            .ok_or(ApiFailure::MissingCredential)
    }
}

#[async_trait]
impl Provider for OpenAiProvider {
    fn name(&self) -> String {
        "openai".to_string()
    }

    fn has_default_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ProviderResponse, ApiFailure> {
        let api_key = self.credential(request.credential.as_deref())?;
        let base = endpoint(request.base_url.as_deref(), &self.base_url);

        let mut body = json!({
            "model": request.model,
            "messages": [
                {
                    "role": "user",
                    "content": request.prompt
                }
            ],
            "temperature": request.temperature
        });
        merge_config(&mut body, &request.config, &["model", "messages", "temperature"]);

        let response_json = send_json(
            self.client
                .post(format!("{}/chat/completions", base))
                .bearer_auth(api_key)
                .json(&body),
        )
        .await?;

        let content = response_json
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(|content| content.as_str())
            .ok_or_else(|| ApiFailure::InvalidRequest("No content in response".to_string()))?;

        let usage = response_json.get("usage");
        let model_used = response_json
            .get("model")
            .and_then(|m| m.as_str())
            .unwrap_or(&request.model);

        Ok(ProviderResponse {
            content: content.to_string(),
            tokens_used: token_count(usage, "total_tokens"),
            prompt_tokens: token_count(usage, "prompt_tokens"),
            completion_tokens: token_count(usage, "completion_tokens"),
            model_used: model_used.to_string(),
            sources: Vec::new(),
        })
    }

    async fn list_models(
        &self,
        credential: &str,
        endpoint_url: Option<String>,
    ) -> Result<Vec<ModelInfo>, ApiFailure> {
        let api_key = self.credential(Some(credential))?;
        let base = endpoint(endpoint_url.as_deref(), &self.base_url);

        let response_json = send_json(self.client.get(format!("{}/models", base)).bearer_auth(api_key)).await?;

        let mut models: Vec<ModelInfo> = response_json
            .get("data")
            .and_then(|data| data.as_array())
            .map(|data| {
                data.iter()
                    .filter_map(|model| model.get("id").and_then(|id| id.as_str()))
                    .map(ModelInfo::new)
                    .collect()
            })
            .unwrap_or_default();
        models.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(models)
    }
}
