//! AI operation handlers: edit suggestions, title synthesis and assessment

use super::handlers::{AppError, IssueTreeState};
use super::query::ApiJson;
use crate::ai::{Assessment, IssueTreeOperation, SuggestionResponse, SynthesisResponse};
use crate::auth::extractor::AuthUser;
use crate::issue_trees::models::check_tree;
use crate::tree::{IssueTree, ValidationError, ValidationIssue};
use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::Value;

/// Body of `POST /api/issue-tree-edit`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    #[serde(default)]
    pub tree: Value,
    #[serde(default)]
    pub target_node_id: String,
    #[serde(default)]
    pub operation: Value,
}

impl EditRequest {
    /// Parse tree and operation, collecting issues from both
    fn parse(&self) -> Result<(IssueTree, IssueTreeOperation), ValidationError> {
        let mut issues = Vec::new();
        let tree = check_tree(&self.tree, &mut issues);

        if self.target_node_id.trim().is_empty() {
            issues.push(ValidationIssue::new("targetNodeId", "is required"));
        }

        let operation = match serde_json::from_value::<IssueTreeOperation>(self.operation.clone()) {
            Ok(op) => Some(op),
            Err(e) => {
                issues.push(ValidationIssue::new("operation", e.to_string()));
                None
            }
        };

        match (tree, operation) {
            (Some(tree), Some(op)) if issues.is_empty() => Ok((tree, op)),
            _ => Err(ValidationError::new(issues)),
        }
    }
}

/// Body of `POST /api/issue-tree-synthesis`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    #[serde(default)]
    pub problem_statement: String,
    #[serde(default)]
    pub context: Option<String>,
}

/// Body of `POST /api/issue-tree-assessment`
#[derive(Debug, Deserialize)]
pub struct AssessmentRequest {
    #[serde(default)]
    pub tree: Value,
}

/// Generate a suggestion for one node. The tree is never modified.
pub async fn edit_issue_tree(
    State(state): State<IssueTreeState>,
    user: AuthUser,
    ApiJson(req): ApiJson<EditRequest>,
) -> Result<Json<SuggestionResponse>, AppError> {
    let (tree, operation) = req.parse()?;
    tracing::info!(
        user_id = %user.user_id,
        operation = operation.name(),
        target = %req.target_node_id,
        "Issue tree edit requested"
    );

    let response = state
        .ai
        .generate_issue_tree_suggestion(&tree, &req.target_node_id, &operation)
        .await?;
    Ok(Json(response))
}

/// Propose a title for a free-text problem statement
pub async fn synthesize_title(
    State(state): State<IssueTreeState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<SynthesisRequest>,
) -> Result<Json<SynthesisResponse>, AppError> {
    let response = state
        .ai
        .synthesize_title(&req.problem_statement, req.context.as_deref())
        .await?;
    Ok(Json(response))
}

/// Assess the whole tree, served from cache when possible
pub async fn assess_issue_tree(
    State(state): State<IssueTreeState>,
    _user: AuthUser,
    ApiJson(req): ApiJson<AssessmentRequest>,
) -> Result<Json<Assessment>, AppError> {
    let mut issues = Vec::new();
    let tree = check_tree(&req.tree, &mut issues).ok_or_else(|| ValidationError::new(issues))?;

    Ok(Json(state.ai.assess_issue_tree(&tree).await?))
}
