//! Tests for the provider implementations
//!
//! Remote providers are exercised against a local mock HTTP server.

pub mod openai;

use std::collections::HashMap;

use crate::types::GenerationRequest;

/// Request against `base_url` using an explicit credential
pub fn request_for(base_url: &str, model: &str) -> GenerationRequest {
    GenerationRequest {
        prompt: "Which CRM should a small agency use?".to_string(),
        model: model.to_string(),
        temperature: 0.3,
        credential: Some("test-key".to_string()),
        base_url: Some(base_url.to_string()),
        config: HashMap::new(),
    }
}
