//! `IssueTreeStore` implementation for `Neo4jClient`.
//!
//! Every method simply delegates to the corresponding inherent method on `Neo4jClient`.

use async_trait::async_trait;
use uuid::Uuid;

use super::client::Neo4jClient;
use super::traits::IssueTreeStore;
use crate::tree::{IssueTreeDocument, ListCursor, TreeRevision};

#[async_trait]
impl IssueTreeStore for Neo4jClient {
    // ========================================================================
    // Issue tree documents
    // ========================================================================

    async fn create_issue_tree(&self, doc: &IssueTreeDocument) -> anyhow::Result<()> {
        self.create_issue_tree(doc).await
    }

    async fn get_issue_tree(&self, id: Uuid) -> anyhow::Result<Option<IssueTreeDocument>> {
        self.get_issue_tree(id).await
    }

    async fn list_recent_issue_trees(
        &self,
        user_id: Uuid,
        after: Option<ListCursor>,
        limit: usize,
    ) -> anyhow::Result<Vec<IssueTreeDocument>> {
        self.list_recent_issue_trees(user_id, after, limit).await
    }

    async fn update_issue_tree(&self, doc: &IssueTreeDocument) -> anyhow::Result<bool> {
        self.update_issue_tree(doc).await
    }

    async fn delete_issue_tree(&self, id: Uuid) -> anyhow::Result<bool> {
        self.delete_issue_tree(id).await
    }

    // ========================================================================
    // Revisions
    // ========================================================================

    async fn create_tree_revision(&self, revision: &TreeRevision) -> anyhow::Result<()> {
        self.create_tree_revision(revision).await
    }

    async fn list_tree_revisions(&self, issue_tree_id: Uuid) -> anyhow::Result<Vec<TreeRevision>> {
        self.list_tree_revisions(issue_tree_id).await
    }

    async fn get_tree_revision(
        &self,
        issue_tree_id: Uuid,
        revision_id: Uuid,
    ) -> anyhow::Result<Option<TreeRevision>> {
        self.get_tree_revision(issue_tree_id, revision_id).await
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        match self.execute("RETURN 1 AS ping").await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}
