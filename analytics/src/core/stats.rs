//! Keyword statistics folded on demand from stored responses

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use shared::logging::Component;
use shared::{
    component_debug, normalize_provider_name, LlmId, PromptId, Response, ResponseFilter, Store,
    TimeWindow,
};

use crate::core::keywords::KeywordEngine;
use crate::error::AnalyticsResult;

/// Occurrences of one keyword across a set of responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub by_prompt: BTreeMap<PromptId, u64>,
    pub by_llm: BTreeMap<LlmId, u64>,
    pub by_provider: BTreeMap<String, u64>,
    pub by_model: BTreeMap<String, u64>,
}

impl KeywordCount {
    fn new(keyword: &str, at: DateTime<Utc>) -> Self {
        Self {
            keyword: keyword.to_string(),
            count: 0,
            first_seen: at,
            last_seen: at,
            by_prompt: BTreeMap::new(),
            by_llm: BTreeMap::new(),
            by_provider: BTreeMap::new(),
            by_model: BTreeMap::new(),
        }
    }

    fn record(&mut self, response: &Response, occurrences: u64) {
        self.count += occurrences;
        self.first_seen = self.first_seen.min(response.created_at);
        self.last_seen = self.last_seen.max(response.created_at);
        *self.by_prompt.entry(response.prompt_id).or_insert(0) += occurrences;
        *self.by_llm.entry(response.llm_id).or_insert(0) += occurrences;
        *self
            .by_provider
            .entry(normalize_provider_name(&response.provider))
            .or_insert(0) += occurrences;
        *self.by_model.entry(response.model.clone()).or_insert(0) += occurrences;
    }

    fn merge(&mut self, other: &KeywordCount) {
        self.count += other.count;
        self.first_seen = self.first_seen.min(other.first_seen);
        self.last_seen = self.last_seen.max(other.last_seen);
        for (id, n) in &other.by_prompt {
            *self.by_prompt.entry(*id).or_insert(0) += n;
        }
        for (id, n) in &other.by_llm {
            *self.by_llm.entry(*id).or_insert(0) += n;
        }
        for (provider, n) in &other.by_provider {
            *self.by_provider.entry(provider.clone()).or_insert(0) += n;
        }
        for (model, n) in &other.by_model {
            *self.by_model.entry(model.clone()).or_insert(0) += n;
        }
    }
}

/// Breakdown of a single keyword, case variants merged
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordDetail {
    pub keyword: String,
    pub total: u64,
    pub unique_prompts: usize,
    pub unique_llms: usize,
    pub by_prompt: BTreeMap<PromptId, u64>,
    pub by_llm: BTreeMap<LlmId, u64>,
    pub by_provider: BTreeMap<String, u64>,
    pub by_model: BTreeMap<String, u64>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl From<KeywordCount> for KeywordDetail {
    fn from(count: KeywordCount) -> Self {
        Self {
            unique_prompts: count.by_prompt.len(),
            unique_llms: count.by_llm.len(),
            keyword: count.keyword,
            total: count.count,
            by_prompt: count.by_prompt,
            by_llm: count.by_llm,
            by_provider: count.by_provider,
            by_model: count.by_model,
            first_seen: count.first_seen,
            last_seen: count.last_seen,
        }
    }
}

/// Descending count, then ascending keyword (byte order)
fn rank(a: &KeywordCount, b: &KeywordCount) -> std::cmp::Ordering {
    b.count.cmp(&a.count).then_with(|| a.keyword.cmp(&b.keyword))
}

/// On-demand rollups over the successful responses in the store
pub struct StatsAggregator {
    store: Arc<dyn Store>,
    engine: Arc<KeywordEngine>,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn Store>, engine: Arc<KeywordEngine>) -> Self {
        Self { store, engine }
    }

    async fn successful_responses(&self, window: TimeWindow) -> AnalyticsResult<Vec<Response>> {
        Ok(self.store.list_responses(ResponseFilter::successful_in(window)).await?)
    }

    fn fold(&self, responses: &[Response]) -> Vec<KeywordCount> {
        let exclusions = self.engine.exclusions().snapshot();
        let mut counts: HashMap<String, KeywordCount> = HashMap::new();

        for response in responses.iter().filter(|r| r.is_success()) {
            let extracted = super::keywords::extract_keywords(&response.response_text, &exclusions);
            for (keyword, occurrences) in extracted {
                counts
                    .entry(keyword)
                    .or_insert_with_key(|k| KeywordCount::new(k, response.created_at))
                    .record(response, u64::from(occurrences));
            }
        }

        let mut rows: Vec<KeywordCount> = counts.into_values().collect();
        rows.sort_by(rank);
        component_debug!(
            Component::Analytics,
            "Folded {} responses into {} keywords",
            responses.len(),
            rows.len()
        );
        rows
    }

    /// Every keyword in `window` with its full breakdown, ranked
    pub async fn keyword_counts(&self, window: TimeWindow) -> AnalyticsResult<Vec<KeywordCount>> {
        let responses = self.successful_responses(window).await?;
        Ok(self.fold(&responses))
    }

    /// At most `limit` keywords by descending count, ties by ascending keyword
    pub async fn top_keywords(&self, limit: usize, window: TimeWindow) -> AnalyticsResult<Vec<(String, u64)>> {
        let rows = self.keyword_counts(window).await?;
        Ok(rows.into_iter().take(limit).map(|row| (row.keyword, row.count)).collect())
    }

    /// Case-insensitive breakdown of `keyword`; `None` if it never occurs in `window`
    pub async fn keyword_detail(&self, keyword: &str, window: TimeWindow) -> AnalyticsResult<Option<KeywordDetail>> {
        let wanted = keyword.trim().to_lowercase();
        if wanted.is_empty() {
            return Ok(None);
        }

        let rows = self.keyword_counts(window).await?;
        let mut variants = rows.iter().filter(|row| row.keyword.to_lowercase() == wanted);

        // Rows are ranked, so the first variant is the dominant spelling
        let Some(first) = variants.next() else {
            return Ok(None);
        };
        let mut merged = first.clone();
        for variant in variants {
            merged.merge(variant);
        }
        Ok(Some(merged.into()))
    }

    /// Keywords containing `query` (case-insensitive), ranked, at most `limit`
    pub async fn search_keyword(
        &self,
        query: &str,
        window: TimeWindow,
        limit: usize,
    ) -> AnalyticsResult<Vec<(String, u64)>> {
        let needle = query.trim().to_lowercase();
        let rows = self.keyword_counts(window).await?;
        Ok(rows
            .into_iter()
            .filter(|row| row.keyword.to_lowercase().contains(&needle))
            .take(limit)
            .map(|row| (row.keyword, row.count))
            .collect())
    }

    /// Successful responses in `window` whose keywords include `keyword` (case-insensitive)
    pub async fn responses_mentioning(
        &self,
        keyword: &str,
        window: TimeWindow,
        limit: usize,
    ) -> AnalyticsResult<Vec<Response>> {
        let wanted = keyword.trim().to_lowercase();
        let responses = self.successful_responses(window).await?;
        let exclusions = self.engine.exclusions().snapshot();

        Ok(responses
            .into_iter()
            .filter(|response| {
                super::keywords::extract_keywords(&response.response_text, &exclusions)
                    .keys()
                    .any(|k| k.to_lowercase() == wanted)
            })
            .take(limit)
            .collect())
    }
}
