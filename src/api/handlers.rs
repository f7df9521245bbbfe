//! Shared API state, error mapping and the health handler

use crate::ai::{AiError, IssueTreeAiService};
use crate::issue_trees::IssueTreeManager;
use crate::tree::{TreeError, ValidationError, ValidationIssue};
use crate::AuthConfig;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::sync::Arc;

/// Shared server state
pub struct ServerState {
    pub trees: Arc<IssueTreeManager>,
    pub ai: Arc<IssueTreeAiService>,
    /// Auth config; None means deny-by-default
    pub auth_config: Option<AuthConfig>,
}

/// Shared issue tree state
pub type IssueTreeState = Arc<ServerState>;

// ============================================================================
// Health check
// ============================================================================

/// Per-service health status in the health response
#[derive(Serialize)]
pub struct ServiceHealthStatus {
    pub neo4j: String,
    pub llm_model: String,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub services: Option<ServiceHealthStatus>,
}

/// Health check handler. Verifies connectivity to Neo4j.
///
/// Returns 200 + `"ok"` when the store answers, 503 + `"unhealthy"` otherwise.
/// The cache is never checked: it is best-effort.
pub async fn health(State(state): State<IssueTreeState>) -> (StatusCode, Json<HealthResponse>) {
    let neo4j_ok = state
        .trees
        .store()
        .health_check()
        .await
        .unwrap_or(false);

    let (http_status, status) = if neo4j_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        http_status,
        Json(HealthResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            services: Some(ServiceHealthStatus {
                neo4j: if neo4j_ok {
                    "connected".to_string()
                } else {
                    "disconnected".to_string()
                },
                llm_model: state.ai.model_name().to_string(),
            }),
        }),
    )
}

// ============================================================================
// Error handling
// ============================================================================

/// API error type
#[derive(Debug)]
pub enum AppError {
    Internal(anyhow::Error),
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    Validation(ValidationError),
    TargetNotFound(String),
    InvalidOperation(String),
    GenerationFailed(String),
    Upstream(String),
}

impl AppError {
    /// Machine-readable kind sent in every error body
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Internal(_) => "internal",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized(_) => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::Validation(_) => "validation_error",
            AppError::TargetNotFound(_) => "target_not_found",
            AppError::InvalidOperation(_) => "invalid_operation",
            AppError::GenerationFailed(_) => "generation_failed",
            AppError::Upstream(_) => "upstream_failure",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Internal(_) | AppError::GenerationFailed(_) | AppError::Upstream(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_)
            | AppError::TargetNotFound(_)
            | AppError::InvalidOperation(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Shorthand for a single-field validation failure
    pub fn invalid(path: &str, message: impl Into<String>) -> Self {
        AppError::Validation(ValidationError::single(path, message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let kind = self.kind();
        let (message, details): (String, Option<Vec<ValidationIssue>>) = match self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                ("Internal server error".to_string(), None)
            }
            AppError::Validation(e) => ("Validation failed".to_string(), Some(e.issues)),
            AppError::TargetNotFound(id) => (format!("Target node not found: {}", id), None),
            AppError::Upstream(msg) => {
                tracing::warn!("Upstream failure: {}", msg);
                ("Generation failed".to_string(), None)
            }
            AppError::GenerationFailed(msg) => {
                tracing::warn!("Generation failed: {}", msg);
                (format!("Generation failed: {}", msg), None)
            }
            AppError::NotFound(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::InvalidOperation(msg) => (msg, None),
        };

        let mut body = serde_json::json!({
            "error": message,
            "kind": kind,
        });
        if let Some(details) = details {
            body["details"] = serde_json::json!(details);
        }

        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<TreeError> for AppError {
    fn from(err: TreeError) -> Self {
        match err {
            TreeError::NodeNotFound(id) => AppError::TargetNotFound(id),
            TreeError::InvalidOperation(msg) => AppError::InvalidOperation(msg),
        }
    }
}

impl From<AiError> for AppError {
    fn from(err: AiError) -> Self {
        match err {
            AiError::Validation(e) => AppError::Validation(e),
            AiError::TargetNotFound(id) => AppError::TargetNotFound(id),
            AiError::InvalidOperation(msg) => AppError::InvalidOperation(msg),
            AiError::Generation(msg) => AppError::GenerationFailed(msg),
            AiError::Upstream(msg) => AppError::Upstream(msg),
        }
    }
}
