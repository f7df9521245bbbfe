//! IssueTreeStore trait definition
//!
//! Defines the abstract interface for document and revision persistence.
//! `Neo4jClient` implements it against the graph database and
//! `MockIssueTreeStore` in memory, so managers and handlers can be tested
//! without a running database.

use crate::tree::{IssueTreeDocument, ListCursor, TreeRevision};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Abstract interface for issue tree persistence.
///
/// Authorization is not checked here; callers decide who may write.
#[async_trait]
pub trait IssueTreeStore: Send + Sync {
    // ========================================================================
    // Issue tree documents
    // ========================================================================

    /// Persist a new document (and its FORKED_FROM link when the origin exists)
    async fn create_issue_tree(&self, doc: &IssueTreeDocument) -> Result<()>;

    /// Get a document by ID
    async fn get_issue_tree(&self, id: Uuid) -> Result<Option<IssueTreeDocument>>;

    /// Documents owned by `user_id`, ordered by `(updated_at, id)` descending,
    /// strictly after `after` when given
    async fn list_recent_issue_trees(
        &self,
        user_id: Uuid,
        after: Option<ListCursor>,
        limit: usize,
    ) -> Result<Vec<IssueTreeDocument>>;

    /// Replace title, description, tree and updated_at. Returns false when the
    /// document does not exist.
    async fn update_issue_tree(&self, doc: &IssueTreeDocument) -> Result<bool>;

    /// Delete a document and its revisions. Returns false when it did not exist.
    async fn delete_issue_tree(&self, id: Uuid) -> Result<bool>;

    // ========================================================================
    // Revisions
    // ========================================================================

    /// Append a revision to its document. Fails when the document is missing.
    async fn create_tree_revision(&self, revision: &TreeRevision) -> Result<()>;

    /// Revisions of a document, newest first
    async fn list_tree_revisions(&self, issue_tree_id: Uuid) -> Result<Vec<TreeRevision>>;

    /// A single revision, only if it belongs to `issue_tree_id`
    async fn get_tree_revision(
        &self,
        issue_tree_id: Uuid,
        revision_id: Uuid,
    ) -> Result<Option<TreeRevision>>;

    // ========================================================================
    // Health
    // ========================================================================

    /// Check connectivity to the backing store
    async fn health_check(&self) -> Result<bool>;
}
