//! Google Gemini generateContent provider, with optional search grounding

use async_trait::async_trait;
use serde_json::{json, Value};

use shared::{ApiFailure, GroundingSource};

use crate::services::http::{endpoint, merge_config, send_json, token_count};
use crate::traits::Provider;
use crate::types::{GenerationRequest, ModelInfo, ProviderResponse};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// LLM config flag enabling Google Search grounding
pub const GROUNDING_KEY: &str = "grounding";

pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.filter(|k| !k.is_empty()),
            base_url: GEMINI_BASE_URL.to_string(),
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

/// Citations from `groundingMetadata.groundingChunks[].web`
fn grounding_sources(candidate: &Value) -> Vec<GroundingSource> {
    candidate
        .get("groundingMetadata")
        .and_then(|meta| meta.get("groundingChunks"))
        .and_then(|chunks| chunks.as_array())
        .map(|chunks| {
            chunks
                .iter()
                .filter_map(|chunk| {
                    let web = chunk.get("web")?;
                    let url = web.get("uri")?.as_str()?;
                    Some(GroundingSource {
                        title: web.get("title").and_then(|t| t.as_str()).map(str::to_string),
                        url: url.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> String {
        "gemini".to_string()
    }

    fn has_default_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<ProviderResponse, ApiFailure> {
        let api_key = self.credential(request.credential.as_deref())?;
        let base = endpoint(request.base_url.as_deref(), &self.base_url);

        let mut generation_config = json!({ "temperature": request.temperature });
        merge_config(&mut generation_config, &request.config, &[GROUNDING_KEY, "temperature"]);

        let mut body = json!({
            "contents": [
                {
                    "parts": [
                        {
                            "text": request.prompt
                        }
                    ]
                }
            ],
            "generationConfig": generation_config
        });

        let grounding = request
            .config
            .get(GROUNDING_KEY)
            .and_then(|g| g.as_bool())
            .unwrap_or(false);
        if grounding {
            body["tools"] = json!([{ "google_search": {} }]);
        }

        let response_json = send_json(
            self.client
                .post(format!("{}/models/{}:generateContent", base, request.model))
                .query(&[("key", api_key)])
                .json(&body),
        )
        .await?;

        let candidate = response_json
            .get("candidates")
            .and_then(|candidates| candidates.get(0))
            .ok_or_else(|| ApiFailure::InvalidRequest("No candidates in response".to_string()))?;

        let content: String = candidate
            .get("content")
            .and_then(|content| content.get("parts"))
            .and_then(|parts| parts.as_array())
            .map(|parts| {
                parts
                    .iter()
                    .filter_map(|part| part.get("text").and_then(|text| text.as_str()))
                    .collect::<Vec<_>>()
                    .join("")
            })
            .filter(|text| !text.is_empty())
            .ok_or_else(|| ApiFailure::InvalidRequest("No content in response".to_string()))?;

        // Gemini doesn't always provide token counts in the response
        let usage_metadata = response_json.get("usageMetadata");
        let prompt_token_count = token_count(usage_metadata, "promptTokenCount");
        let candidates_token_count = token_count(usage_metadata, "candidatesTokenCount");

        Ok(ProviderResponse {
            content,
            tokens_used: prompt_token_count + candidates_token_count,
            prompt_tokens: prompt_token_count,
            completion_tokens: candidates_token_count,
            model_used: request.model.clone(),
            sources: grounding_sources(candidate),
        })
    }

    async fn list_models(
        &self,
        credential: &str,
        endpoint_url: Option<String>,
    ) -> Result<Vec<ModelInfo>, ApiFailure> {
        let api_key = self.credential(Some(credential))?;
        let base = endpoint(endpoint_url.as_deref(), &self.base_url);

        let response_json =
            send_json(self.client.get(format!("{}/models", base)).query(&[("key", api_key)])).await?;

        Ok(response_json
            .get("models")
            .and_then(|models| models.as_array())
            .map(|models| {
                models
                    .iter()
                    .filter_map(|model| {
                        let name = model.get("name")?.as_str()?;
                        Some(ModelInfo {
                            id: name.trim_start_matches("models/").to_string(),
                            display_name: model
                                .get("displayName")
                                .and_then(|n| n.as_str())
                                .map(str::to_string),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}
