//! Stored execution outcomes and the filters used to query them

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{LlmConfig, LlmId, Prompt, PromptId, ResponseId};

/// A citation attached by a provider when web-search grounding is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: Option<String>,
    pub url: String,
}

/// Final outcome of one (prompt, LLM) execution. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub id: ResponseId,
    pub prompt_id: PromptId,
    /// Prompt text as sent, so later prompt edits do not rewrite history
    pub prompt_text: String,
    pub llm_id: LlmId,
    pub llm_name: String,
    pub provider: String,
    pub model: String,
    pub response_text: String,
    pub tokens_used: u32,
    pub latency_ms: u64,
    pub temperature: f32,
    /// Number of provider calls made before this outcome
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub sources: Vec<GroundingSource>,
    pub created_at: DateTime<Utc>,
}

impl Response {
    /// Start a response record for `prompt` executed against `llm`
    pub fn for_pair(prompt: &Prompt, llm: &LlmConfig, temperature: f32) -> Self {
        Self {
            id: Uuid::new_v4(),
            prompt_id: prompt.id,
            prompt_text: prompt.text.clone(),
            llm_id: llm.id,
            llm_name: llm.name.clone(),
            provider: llm.provider.clone(),
            model: llm.model.clone(),
            response_text: String::new(),
            tokens_used: 0,
            latency_ms: 0,
            temperature,
            attempts: 0,
            error: None,
            sources: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Half-open time range `[since, until)`; unbounded sides are `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn all() -> Self {
        Self::default()
    }

    /// Window covering the `duration` before `now`
    pub fn last(duration: Duration, now: DateTime<Utc>) -> Self {
        Self {
            since: Some(now - duration),
            until: None,
        }
    }

    pub fn between(since: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            since: Some(since),
            until: Some(until),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.since.map_or(true, |since| at >= since) && self.until.map_or(true, |until| at < until)
    }
}

/// Filter for listing stored responses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseFilter {
    pub prompt_id: Option<PromptId>,
    pub llm_id: Option<LlmId>,
    /// Case-insensitive substring match on the response text
    pub keyword: Option<String>,
    pub window: TimeWindow,
    pub include_failed: bool,
    pub limit: Option<usize>,
}

impl ResponseFilter {
    pub fn successful_in(window: TimeWindow) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn for_prompt(prompt_id: PromptId) -> Self {
        Self {
            prompt_id: Some(prompt_id),
            include_failed: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, response: &Response) -> bool {
        if !self.include_failed && !response.is_success() {
            return false;
        }
        if self.prompt_id.is_some_and(|id| id != response.prompt_id) {
            return false;
        }
        if self.llm_id.is_some_and(|id| id != response.llm_id) {
            return false;
        }
        if !self.window.contains(response.created_at) {
            return false;
        }
        match &self.keyword {
            Some(keyword) => response
                .response_text
                .to_lowercase()
                .contains(&keyword.to_lowercase()),
            None => true,
        }
    }
}
