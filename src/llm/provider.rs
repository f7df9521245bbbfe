//! HTTP generation provider implementation
//!
//! Implements `GenerationProvider` using any OpenAI-compatible
//! `/v1/chat/completions` endpoint with `response_format: json_schema`.
//!
//! Supported providers:
//! - **OpenAI**: `https://api.openai.com/v1/chat/completions`
//! - **Ollama**: `http://localhost:11434/v1/chat/completions`
//! - **LiteLLM / vLLM / any OpenAI-compatible gateway**: just set the URL

use super::traits::{GenerationError, GenerationProvider, StructuredRequest};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// HTTP-based structured generation provider.
///
/// Cheaply cloneable (shares the reqwest client internally).
#[derive(Clone)]
pub struct HttpGenerationProvider {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat<'a>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat<'a> {
    r#type: &'static str,
    json_schema: JsonSchemaFormat<'a>,
}

#[derive(Debug, Serialize)]
struct JsonSchemaFormat<'a> {
    name: &'a str,
    schema: &'a serde_json::Value,
    strict: bool,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

/// OpenAI-compatible error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

const TEMPERATURE: f32 = 0.4;

impl HttpGenerationProvider {
    /// Create a new provider with explicit configuration.
    ///
    /// * `url` - full chat completions endpoint
    /// * `model` - model name sent with every request
    /// * `api_key` - optional bearer token
    /// * `timeout` - per-request timeout
    pub fn new(
        url: String,
        model: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            url,
            model,
            api_key,
        })
    }
}

#[async_trait]
impl GenerationProvider for HttpGenerationProvider {
    async fn generate_object(
        &self,
        request: &StructuredRequest,
    ) -> Result<serde_json::Value, GenerationError> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user_prompt,
                },
            ],
            response_format: ResponseFormat {
                r#type: "json_schema",
                json_schema: JsonSchemaFormat {
                    name: &request.schema_name,
                    schema: &request.schema,
                    strict: true,
                },
            },
            temperature: TEMPERATURE,
        };

        let mut req = self.client.post(&self.url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {}", key));
        }

        tracing::debug!(schema = %request.schema_name, model = %self.model, "Sending generation request");

        let response = req.send().await.map_err(|e| {
            GenerationError::Upstream(format!(
                "Failed to connect to generation API at {}: {}",
                self.url, e
            ))
        })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            // Try to parse OpenAI-style error
            if let Ok(ErrorResponse {
                error: Some(detail),
            }) = serde_json::from_str::<ErrorResponse>(&text)
            {
                return Err(GenerationError::Upstream(format!(
                    "Generation API error ({}): {}",
                    status.as_u16(),
                    detail.message
                )));
            }
            return Err(GenerationError::Upstream(format!(
                "Generation API returned {}: {}",
                status.as_u16(),
                text
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            GenerationError::Upstream(format!("Failed to parse generation API response: {}", e))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| GenerationError::InvalidOutput("No choices returned".to_string()))?;

        if let Some(refusal) = choice.message.refusal {
            return Err(GenerationError::InvalidOutput(format!(
                "Model refused: {}",
                refusal
            )));
        }
        if choice.finish_reason.as_deref() == Some("length") {
            return Err(GenerationError::InvalidOutput(
                "Output truncated (finish_reason=length)".to_string(),
            ));
        }

        let content = choice
            .message
            .content
            .ok_or_else(|| GenerationError::InvalidOutput("Empty message content".to_string()))?;

        let value: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| GenerationError::InvalidOutput(format!("Content is not JSON: {}", e)))?;
        if !value.is_object() {
            return Err(GenerationError::InvalidOutput(
                "Expected a JSON object".to_string(),
            ));
        }
        Ok(value)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
