//! Issue tree document handlers: CRUD, fork and revisions
//!
//! Any authenticated user may read or fork a document. Update, delete and
//! restore require ownership; documents without an owner are open.

use super::handlers::{AppError, IssueTreeState};
use super::query::{optional_json, ApiJson, CursorParams};
use crate::auth::extractor::AuthUser;
use crate::issue_trees::{
    CreateIssueTreeRequest, ForkIssueTreeRequest, Page, UpdateIssueTreeRequest,
};
use crate::tree::{IssueTreeDocument, TreeRevision};
use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

async fn load(state: &IssueTreeState, id: Uuid) -> Result<IssueTreeDocument, AppError> {
    state
        .trees
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue tree {} not found", id)))
}

async fn load_owned(
    state: &IssueTreeState,
    id: Uuid,
    user: &AuthUser,
) -> Result<IssueTreeDocument, AppError> {
    let doc = load(state, id).await?;
    if !doc.is_modifiable_by(user.user_id) {
        return Err(AppError::Forbidden(
            "Issue tree belongs to another user".to_string(),
        ));
    }
    Ok(doc)
}

/// List the caller's issue trees, most recently updated first
pub async fn list_issue_trees(
    State(state): State<IssueTreeState>,
    user: AuthUser,
    Query(params): Query<CursorParams>,
) -> Result<Json<Page<IssueTreeDocument>>, AppError> {
    params.validate()?;
    let page = state
        .trees
        .get_recent(user.user_id, params.parsed_cursor()?, params.limit)
        .await?;
    Ok(Json(page))
}

/// Create an issue tree owned by the caller
pub async fn create_issue_tree(
    State(state): State<IssueTreeState>,
    user: AuthUser,
    ApiJson(req): ApiJson<CreateIssueTreeRequest>,
) -> Result<(StatusCode, Json<IssueTreeDocument>), AppError> {
    let new = req.validate()?;
    let doc = state.trees.create(new, Some(user.user_id)).await?;
    Ok((StatusCode::CREATED, Json(doc)))
}

/// Get an issue tree by ID
pub async fn get_issue_tree(
    State(state): State<IssueTreeState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<IssueTreeDocument>, AppError> {
    Ok(Json(load(&state, id).await?))
}

/// Replace tree, title or description; `semantic` snapshots the old tree first
pub async fn update_issue_tree(
    State(state): State<IssueTreeState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateIssueTreeRequest>,
) -> Result<Json<IssueTreeDocument>, AppError> {
    let (update, options) = req.validate()?;
    load_owned(&state, id, &user).await?;

    let doc = state
        .trees
        .update(id, update, options)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue tree {} not found", id)))?;
    Ok(Json(doc))
}

/// Delete an issue tree and its revisions
pub async fn delete_issue_tree(
    State(state): State<IssueTreeState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    load_owned(&state, id, &user).await?;
    if state.trees.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Issue tree {} not found", id)))
    }
}

/// Fork an issue tree into a new document owned by the caller
pub async fn fork_issue_tree(
    State(state): State<IssueTreeState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<(StatusCode, Json<IssueTreeDocument>), AppError> {
    let req: ForkIssueTreeRequest = optional_json(&body)?;
    let title = req.validate()?;

    let fork = state
        .trees
        .fork(id, Some(user.user_id), title, req.source)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Issue tree {} not found", id)))?;
    Ok((StatusCode::CREATED, Json(fork)))
}

// ============================================================================
// Revisions
// ============================================================================

/// List revisions of an issue tree, newest first
pub async fn list_revisions(
    State(state): State<IssueTreeState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<TreeRevision>>, AppError> {
    load(&state, id).await?;
    Ok(Json(state.trees.list_revisions(id).await?))
}

/// Get one revision
pub async fn get_revision(
    State(state): State<IssueTreeState>,
    _user: AuthUser,
    Path((id, revision_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TreeRevision>, AppError> {
    load(&state, id).await?;
    state
        .trees
        .get_revision(id, revision_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Revision {} not found", revision_id)))
}

/// Restore a revision's tree, snapshotting the current tree first
pub async fn restore_revision(
    State(state): State<IssueTreeState>,
    user: AuthUser,
    Path((id, revision_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<IssueTreeDocument>, AppError> {
    load_owned(&state, id, &user).await?;
    state
        .trees
        .restore_revision(id, revision_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Revision {} not found", revision_id)))
}
