//! Mock generation provider for tests
//!
//! Returns scripted objects keyed by schema name and records every request,
//! so tests can assert on prompts without network calls.

use super::traits::{GenerationError, GenerationProvider, StructuredRequest};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Scripted mock generation provider.
///
/// # Example
///
/// ```rust
/// use issue_tree::llm::{GenerationProvider, MockGenerationProvider, StructuredRequest};
/// use serde_json::json;
///
/// # tokio_test::block_on(async {
/// let provider = MockGenerationProvider::new()
///     .with_response("synthesized_title", json!({"synthesizedTitle": "Why is profit falling?"}));
/// let request = StructuredRequest {
///     schema_name: "synthesized_title".into(),
///     schema: json!({}),
///     system_prompt: String::new(),
///     user_prompt: String::new(),
/// };
/// let value = provider.generate_object(&request).await.unwrap();
/// assert_eq!(value["synthesizedTitle"], "Why is profit falling?");
/// assert_eq!(provider.calls(), 1);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MockGenerationProvider {
    responses: Mutex<HashMap<String, serde_json::Value>>,
    failure: Mutex<Option<String>>,
    requests: Mutex<Vec<StructuredRequest>>,
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the object returned for `schema_name`
    pub fn with_response(self, schema_name: &str, value: serde_json::Value) -> Self {
        self.set_response(schema_name, value);
        self
    }

    pub fn set_response(&self, schema_name: &str, value: serde_json::Value) {
        if let Ok(mut responses) = self.responses.lock() {
            responses.insert(schema_name.to_string(), value);
        }
    }

    /// Make every call fail with an upstream error
    pub fn failing(message: &str) -> Self {
        let mock = Self::default();
        if let Ok(mut failure) = mock.failure.lock() {
            *failure = Some(message.to_string());
        }
        mock
    }

    /// Number of calls received so far
    pub fn calls(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    /// Copy of every request received so far
    pub fn requests(&self) -> Vec<StructuredRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate_object(
        &self,
        request: &StructuredRequest,
    ) -> Result<serde_json::Value, GenerationError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        if let Some(message) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(GenerationError::Upstream(message));
        }

        self.responses
            .lock()
            .ok()
            .and_then(|r| r.get(&request.schema_name).cloned())
            .ok_or_else(|| {
                GenerationError::InvalidOutput(format!(
                    "No scripted response for schema '{}'",
                    request.schema_name
                ))
            })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}
