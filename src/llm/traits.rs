//! GenerationProvider trait definition
//!
//! Defines the abstract interface for schema-constrained generation.
//! Follows the same pattern as `IssueTreeStore` and `CacheStore`:
//! async trait + Send + Sync for `Arc<dyn GenerationProvider>` usage.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// One structured-generation call: prompts plus the JSON schema the output
/// must satisfy.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StructuredRequest {
    /// Schema name, e.g. `generated_nodes`
    pub schema_name: String,
    /// JSON Schema of the expected object
    pub schema: serde_json::Value,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl StructuredRequest {
    /// Same prompts, different output schema
    pub fn with_schema(self, name: &str, schema: serde_json::Value) -> Self {
        Self {
            schema_name: name.to_string(),
            schema,
            ..self
        }
    }
}

/// Why a generation call failed
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Transport, HTTP status or provider-side error
    #[error("Generation provider error: {0}")]
    Upstream(String),

    /// The provider answered but the answer is not a usable JSON object
    #[error("Invalid generation output: {0}")]
    InvalidOutput(String),
}

/// Abstract interface for structured (JSON-schema constrained) generation.
///
/// # Implementations
///
/// - [`HttpGenerationProvider`](super::HttpGenerationProvider): any
///   OpenAI-compatible `/v1/chat/completions` endpoint with `json_schema`
///   response format
/// - [`MockGenerationProvider`](super::MockGenerationProvider): scripted
///   responses for tests
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate one JSON object for `request`. All-or-nothing: no partial
    /// results, no retries.
    async fn generate_object(
        &self,
        request: &StructuredRequest,
    ) -> Result<serde_json::Value, GenerationError>;

    /// The model name used for generation
    fn model_name(&self) -> &str;
}
