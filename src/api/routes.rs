//! API route definitions

use super::ai_handlers;
use super::handlers::{self, IssueTreeState};
use super::tree_handlers;
use crate::auth::middleware::require_auth;
use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the API router
pub fn create_router(state: IssueTreeState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        // ====================================================================
        // Documents
        // ====================================================================
        .route(
            "/api/issue-trees",
            get(tree_handlers::list_issue_trees).post(tree_handlers::create_issue_tree),
        )
        .route(
            "/api/issue-trees/{id}",
            get(tree_handlers::get_issue_tree)
                .patch(tree_handlers::update_issue_tree)
                .delete(tree_handlers::delete_issue_tree),
        )
        .route(
            "/api/issue-trees/{id}/fork",
            post(tree_handlers::fork_issue_tree),
        )
        // ====================================================================
        // Revisions
        // ====================================================================
        .route(
            "/api/issue-trees/{id}/revisions",
            get(tree_handlers::list_revisions),
        )
        .route(
            "/api/issue-trees/{id}/revisions/{revision_id}",
            get(tree_handlers::get_revision),
        )
        .route(
            "/api/issue-trees/{id}/revisions/{revision_id}/restore",
            post(tree_handlers::restore_revision),
        )
        // ====================================================================
        // AI operations
        // ====================================================================
        .route("/api/issue-tree-edit", post(ai_handlers::edit_issue_tree))
        .route(
            "/api/issue-tree-synthesis",
            post(ai_handlers::synthesize_title),
        )
        .route(
            "/api/issue-tree-assessment",
            post(ai_handlers::assess_issue_tree),
        )
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        .merge(protected)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
