//! HTTP plumbing shared by the remote providers

use serde_json::Value;
use std::collections::HashMap;

use shared::ApiFailure;

/// Send a request and return the JSON body, classifying every failure mode
pub(crate) async fn send_json(request: reqwest::RequestBuilder) -> Result<Value, ApiFailure> {
    let response = request.send().await.map_err(network_failure)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiFailure::from_status(status.as_u16(), error_message(&body)));
    }

    let body: Value = response
        .json()
        .await
        .map_err(|e| ApiFailure::NetworkError(format!("Unreadable response body: {}", e)))?;

    if let Some(failure) = embedded_error(&body) {
        return Err(failure);
    }
    Ok(body)
}

fn network_failure(error: reqwest::Error) -> ApiFailure {
    if error.is_timeout() {
        ApiFailure::Timeout
    } else {
        ApiFailure::NetworkError(error.to_string())
    }
}

/// An `error` object inside a 200 body
pub(crate) fn embedded_error(body: &Value) -> Option<ApiFailure> {
    let error = body.get("error").filter(|e| !e.is_null())?;
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| error.to_string());
    Some(ApiFailure::ProviderError(message))
}

/// Best-effort human message from an error body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("error")
                .and_then(|e| e.get("message").or(Some(e)))
                .and_then(|m| m.as_str().map(str::to_string))
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Read a token counter, treating absence as zero
pub(crate) fn token_count(usage: Option<&Value>, field: &str) -> u32 {
    usage
        .and_then(|u| u.get(field))
        .and_then(|t| t.as_u64())
        .unwrap_or(0) as u32
}

/// Copy free-form LLM config entries into a JSON request object
pub(crate) fn merge_config(target: &mut Value, config: &HashMap<String, Value>, skip: &[&str]) {
    if let Value::Object(map) = target {
        for (key, value) in config {
            if !skip.contains(&key.as_str()) {
                map.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Endpoint with any trailing slash removed
pub(crate) fn endpoint<'a>(override_url: Option<&'a str>, default: &'a str) -> &'a str {
    override_url.unwrap_or(default).trim_end_matches('/')
}
