//! Keyword statistics over a populated store

use chrono::{Duration, Utc};
use std::sync::Arc;

use analytics::{AnalyticsError, ExclusionList, KeywordEngine, StatsAggregator};
use shared::{LlmConfig, MemoryStore, MockStore, Prompt, Response, SharedError, Store, TimeWindow};

struct Fixture {
    store: Arc<MemoryStore>,
    stats: StatsAggregator,
    prompt_a: Prompt,
    prompt_b: Prompt,
    gpt: LlmConfig,
    claude: LlmConfig,
}

impl Fixture {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let engine = Arc::new(KeywordEngine::new(Arc::new(ExclusionList::new(["i", "the", "for"]))));
        let stats = StatsAggregator::new(store.clone(), engine);
        Self {
            store,
            stats,
            prompt_a: Prompt::new("best crm"),
            prompt_b: Prompt::new("best helpdesk"),
            gpt: LlmConfig::new("gpt", "OpenAI", "gpt-4o-mini"),
            claude: LlmConfig::new("claude", "anthropic", "claude-3-5-haiku-latest"),
        }
    }

    async fn answer(&self, prompt: &Prompt, llm: &LlmConfig, text: &str, age: Duration) -> Response {
        let mut response = Response::for_pair(prompt, llm, 0.5);
        response.response_text = text.to_string();
        response.created_at = Utc::now() - age;
        self.store.create_response(response.clone()).await.unwrap();
        response
    }

    async fn failure(&self, prompt: &Prompt, llm: &LlmConfig, text: &str) {
        let mut response = Response::for_pair(prompt, llm, 0.5);
        response.response_text = text.to_string();
        response.error = Some("rate limit exceeded".to_string());
        self.store.create_response(response).await.unwrap();
    }
}

#[tokio::test]
async fn test_top_keywords_ranked_with_lexical_ties() {
    // Arrange
    let f = Fixture::new();
    f.answer(&f.prompt_a, &f.gpt, "I recommend Acme over Globex. Acme is cheaper.", Duration::hours(1)).await;
    f.answer(&f.prompt_b, &f.claude, "For support, Zendesk or Globex or Acme.", Duration::hours(2)).await;
    f.failure(&f.prompt_b, &f.gpt, "Zendesk Zendesk Zendesk").await;

    // Act
    let top = f.stats.top_keywords(10, TimeWindow::all()).await.unwrap();

    // Assert
    assert_eq!(
        top,
        vec![
            ("Acme".to_string(), 3),
            ("Globex".to_string(), 2),
            ("Zendesk".to_string(), 1),
        ]
    );

    let limited = f.stats.top_keywords(2, TimeWindow::all()).await.unwrap();
    assert_eq!(limited.len(), 2);
    assert!(limited.windows(2).all(|pair| pair[0].1 >= pair[1].1));
}

#[tokio::test]
async fn test_window_excludes_old_responses() {
    let f = Fixture::new();
    f.answer(&f.prompt_a, &f.gpt, "Acme", Duration::days(10)).await;
    f.answer(&f.prompt_a, &f.gpt, "Globex", Duration::hours(1)).await;

    let recent = TimeWindow::last(Duration::days(7), Utc::now());
    let top = f.stats.top_keywords(10, recent).await.unwrap();
    assert_eq!(top, vec![("Globex".to_string(), 1)]);
}

#[tokio::test]
async fn test_keyword_detail_merges_case_variants() {
    // Arrange
    let f = Fixture::new();
    let older = f.answer(&f.prompt_a, &f.gpt, "Acme and ACME", Duration::hours(5)).await;
    let newer = f.answer(&f.prompt_b, &f.claude, "Acme wins", Duration::hours(1)).await;

    // Act
    let detail = f.stats.keyword_detail("acme", TimeWindow::all()).await.unwrap().unwrap();

    // Assert
    assert_eq!(detail.keyword, "Acme");
    assert_eq!(detail.total, 3);
    assert_eq!(detail.unique_prompts, 2);
    assert_eq!(detail.unique_llms, 2);
    assert_eq!(detail.by_prompt[&f.prompt_a.id], 2);
    assert_eq!(detail.by_llm[&f.claude.id], 1);
    assert_eq!(detail.by_provider["openai"], 2);
    assert_eq!(detail.by_provider["anthropic"], 1);
    assert_eq!(detail.by_model["claude-3-5-haiku-latest"], 1);
    assert_eq!(detail.first_seen, older.created_at);
    assert_eq!(detail.last_seen, newer.created_at);

    assert!(f.stats.keyword_detail("Initech", TimeWindow::all()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_search_and_mentions() {
    let f = Fixture::new();
    f.answer(&f.prompt_a, &f.gpt, "Salesforce and SalesLoft, not Hubspot", Duration::hours(1)).await;
    f.answer(&f.prompt_b, &f.gpt, "Hubspot only", Duration::hours(1)).await;

    let found = f.stats.search_keyword("sales", TimeWindow::all(), 10).await.unwrap();
    let names: Vec<&str> = found.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(names, vec!["SalesLoft", "Salesforce"]);

    let mentions = f.stats.responses_mentioning("HUBSPOT", TimeWindow::all(), 10).await.unwrap();
    assert_eq!(mentions.len(), 2);
    let limited = f.stats.responses_mentioning("hubspot", TimeWindow::all(), 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

#[tokio::test]
async fn test_keyword_counts_carry_breakdowns() {
    let f = Fixture::new();
    f.answer(&f.prompt_a, &f.gpt, "Acme", Duration::hours(1)).await;
    f.answer(&f.prompt_a, &f.claude, "Acme", Duration::hours(1)).await;

    let rows = f.stats.keyword_counts(TimeWindow::all()).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].count, 2);
    assert_eq!(rows[0].by_llm.len(), 2);
    assert_eq!(rows[0].by_prompt.len(), 1);
}

#[tokio::test]
async fn test_storage_errors_surface() {
    let mut store = MockStore::new();
    store
        .expect_list_responses()
        .returning(|_| Err(SharedError::storage("list responses", "disk gone")));
    let engine = Arc::new(KeywordEngine::new(Arc::new(ExclusionList::builtin())));
    let stats = StatsAggregator::new(Arc::new(store), engine);

    let result = stats.top_keywords(5, TimeWindow::all()).await;
    assert!(matches!(result, Err(AnalyticsError::Storage(_))));
}
