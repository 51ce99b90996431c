//! Anthropic messages provider

use async_trait::async_trait;
use serde_json::json;

use shared::ApiFailure;

use crate::services::http::{endpoint, merge_config, send_json, token_count};
use crate::traits::Provider;
use crate::types::{GenerationRequest, ModelInfo, ProviderResponse};

pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 1024;

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl AnthropicProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: ANTHROPIC_BASE_URL.to_string(),
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
impl Provider for AnthropicProvider {
    fn name(&self) -> String {
        "anthropic".to_string()
    }

    fn has_default_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ProviderResponse, ApiFailure> {
        let api_key = self.credential(request.credential.as_deref())?;
        let base = endpoint(request.base_url.as_deref(), &self.base_url);

        let mut body = json!({
            "model": request.model,
            "max_tokens": DEFAULT_MAX_TOKENS,
            "temperature": request.temperature,
            "messages": [
                {
                    "role": "user",
                    "content": request.prompt
                }
            ]
        });
        merge_config(&mut body, &request.config, &["model", "messages", "temperature"]);

        let response_json = send_json(
            self.client
                .post(format!("{}/messages", base))
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&body),
        )
        .await?;

        // Text blocks are concatenated; tool-use blocks carry no text
        let content: String = response_json
            .get("content")
            .and_then(|content| content.as_array())
            .map(|blocks| {
                blocks
                    .iter()
                    .filter_map(|block| block.get("text").and_then(|text| text.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ApiFailure::InvalidRequest("No content in response".to_string()))?;

        let usage = response_json.get("usage");
        let input_tokens = token_count(usage, "input_tokens");
        let output_tokens = token_count(usage, "output_tokens");

        Ok(ProviderResponse {
            content,
            tokens_used: input_tokens + output_tokens,
            prompt_tokens: input_tokens,
            completion_tokens: output_tokens,
            model_used: response_json
                .get("model")
                .and_then(|m| m.as_str())
                .unwrap_or(&request.model)
                .to_string(),
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

        let response_json = send_json(
            self.client
                .get(format!("{}/models", base))
                .header("x-api-key", api_key)
                .header("anthropic-version", ANTHROPIC_VERSION),
        )
        .await?;

        Ok(response_json
            .get("data")
            .and_then(|data| data.as_array())
            .map(|data| {
                data.iter()
                    .filter_map(|model| {
                        let id = model.get("id")?.as_str()?;
                        Some(ModelInfo {
                            id: id.to_string(),
                            display_name: model
                                .get("display_name")
                                .and_then(|n| n.as_str())
                                .map(str::to_string),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
