//! Tests for the OpenAI provider

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared::ApiFailure;
use super::request_for;
use crate::services::openai::OpenAiProvider;
use crate::traits::Provider;

#[tokio::test]
async fn test_generate_parses_content_and_usage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_partial_json(json!({"model": "gpt-4o-mini"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{"message": {"role": "assistant", "content": "Try HubSpot or Pipedrive."}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 6, "total_tokens": 18}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(None);
    let response = provider.generate(&request_for(&server.uri(), "gpt-4o-mini")).await.unwrap();

    assert_eq!(response.content, "Try HubSpot or Pipedrive.");
    assert_eq!(response.tokens_used, 18);
    assert_eq!(response.prompt_tokens, 12);
    assert_eq!(response.completion_tokens, 6);
    assert_eq!(response.model_used, "gpt-4o-mini-2024-07-18");
}

#[tokio::test]
async fn test_status_codes_are_classified() {
    let cases = [
        (401, ApiFailure::AuthenticationFailed),
        (429, ApiFailure::RateLimitExceeded),
    ];

    for (status, expected) in cases {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"error": {"message": "nope"}})))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(None);
        let failure = provider
            .generate(&request_for(&server.uri(), "gpt-4o-mini"))
            .await
            .unwrap_err();
        assert_eq!(failure, expected);
    }
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let failure = OpenAiProvider::new(None)
        .generate(&request_for(&server.uri(), "gpt-4o-mini"))
        .await
        .unwrap_err();
    assert_eq!(
        failure,
        ApiFailure::ServerError { status: 503, message: "overloaded".to_string() }
    );
    assert!(failure.is_retryable());
}

#[tokio::test]
async fn test_embedded_error_in_ok_body_is_permanent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": {"message": "content policy violation"}
        })))
        .mount(&server)
        .await;

    let failure = OpenAiProvider::new(None)
        .generate(&request_for(&server.uri(), "gpt-4o-mini"))
        .await
        .unwrap_err();
    assert_eq!(failure, ApiFailure::ProviderError("content policy violation".to_string()));
    assert!(!failure.is_retryable());
}

#[tokio::test]
async fn test_missing_credential_without_bootstrap_key() {
    let provider = OpenAiProvider::new(None);
    assert!(!provider.has_default_credential());

    let mut request = request_for("http://127.0.0.1:9", "gpt-4o-mini");
    request.credential = None;
    assert_eq!(provider.generate(&request).await.unwrap_err(), ApiFailure::MissingCredential);
}

#[tokio::test]
async fn test_list_models_sorted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/models"))
        .and(header("authorization", "Bearer boot-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": "gpt-4o"}, {"id": "gpt-4o-mini"}, {"id": "dall-e-3"}]
        })))
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(Some("boot-key".to_string()));
    let models = provider.list_models("", Some(server.uri())).await.unwrap();
    let ids: Vec<&str> = models.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["dall-e-3", "gpt-4o", "gpt-4o-mini"]);
}

#[tokio::test]
async fn test_truncated_success_body_is_transient() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"choices": [{"message": {"content": "Try Hub"#, "application/json"),
        )
        .mount(&server)
        .await;

    let provider = OpenAiProvider::new(None);
    let failure = provider
        .generate(&request_for(&server.uri(), "gpt-4o-mini"))
        .await
        .unwrap_err();

    assert!(matches!(failure, ApiFailure::NetworkError(_)));
    assert!(failure.is_retryable());
}
