//! Issue tree document operations
//!
//! Ownership checks happen in the HTTP layer; everything here assumes the
//! caller is allowed to perform the operation.

use super::models::*;
use crate::neo4j::IssueTreeStore;
use crate::tree::{
    IssueTree, IssueTreeDocument, IssueTreeUpdate, ListCursor, TreeRevision, TreeSource,
};
use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: usize = 20;
pub const MAX_PAGE_SIZE: usize = 100;

const FORK_SUFFIX: &str = " (fork)";

/// Manager for issue tree documents and their revisions
pub struct IssueTreeManager {
    store: Arc<dyn IssueTreeStore>,
}

impl IssueTreeManager {
    /// Create a new issue tree manager
    pub fn new(store: Arc<dyn IssueTreeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn IssueTreeStore> {
        &self.store
    }

    // ========================================================================
    // Documents
    // ========================================================================

    /// Create a new document owned by `user_id`
    pub async fn create(&self, new: NewIssueTree, user_id: Option<Uuid>) -> Result<IssueTreeDocument> {
        let tree = new
            .tree
            .unwrap_or_else(|| IssueTree::with_problem(new.title.clone()));
        let doc = IssueTreeDocument::new(new.title, new.description, user_id, new.source, tree);

        self.store.create_issue_tree(&doc).await?;
        tracing::info!(id = %doc.id, nodes = doc.tree_json.root.node_count(), "Created issue tree");
        Ok(doc)
    }

    /// Get a document by ID
    pub async fn get(&self, id: Uuid) -> Result<Option<IssueTreeDocument>> {
        self.store.get_issue_tree(id).await
    }

    /// A page of the user's documents, most recently updated first
    pub async fn get_recent(
        &self,
        user_id: Uuid,
        cursor: Option<ListCursor>,
        limit: Option<usize>,
    ) -> Result<Page<IssueTreeDocument>> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let items = self
            .store
            .list_recent_issue_trees(user_id, cursor, limit)
            .await?;
        let next_cursor = if items.len() == limit {
            items.last().map(ListCursor::at)
        } else {
            None
        };
        Ok(Page { items, next_cursor })
    }

    /// Replace fields of a document. With `semantic`, the pre-update tree is
    /// snapshotted first; a failed snapshot does not block the update.
    ///
    /// Returns `None` when the document does not exist.
    pub async fn update(
        &self,
        id: Uuid,
        update: IssueTreeUpdate,
        options: UpdateOptions,
    ) -> Result<Option<IssueTreeDocument>> {
        let Some(mut doc) = self.store.get_issue_tree(id).await? else {
            return Ok(None);
        };

        if options.semantic {
            let label = options
                .revision_label
                .unwrap_or_else(|| format!("Snapshot at {}", human_timestamp(&Utc::now())));
            self.snapshot(&doc, label).await;
        }

        if let Some(tree) = update.tree {
            doc.tree_json = tree;
        }
        if let Some(title) = update.title {
            doc.title = title;
        }
        if let Some(description) = update.description {
            doc.description = Some(description).filter(|d| !d.is_empty());
        }
        doc.updated_at = Utc::now();

        if !self.store.update_issue_tree(&doc).await? {
            // deleted between read and write
            return Ok(None);
        }
        tracing::debug!(id = %id, semantic = options.semantic, "Updated issue tree");
        Ok(Some(doc))
    }

    /// Delete a document and its revisions
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let deleted = self.store.delete_issue_tree(id).await?;
        if deleted {
            tracing::info!(id = %id, "Deleted issue tree");
        }
        Ok(deleted)
    }

    /// Copy a document into a new, independent one owned by `user_id`.
    /// Revisions are not copied. Returns `None` when the origin does not exist.
    pub async fn fork(
        &self,
        source_id: Uuid,
        user_id: Option<Uuid>,
        title: Option<String>,
        source: Option<TreeSource>,
    ) -> Result<Option<IssueTreeDocument>> {
        let Some(origin) = self.store.get_issue_tree(source_id).await? else {
            return Ok(None);
        };

        let title = title.unwrap_or_else(|| fork_title(&origin.title));
        let mut fork = IssueTreeDocument::new(
            title,
            origin.description.clone(),
            user_id,
            source.unwrap_or(TreeSource::Fork),
            origin.tree_json.clone(),
        );
        fork.forked_from_id = Some(origin.id);

        self.store
            .create_issue_tree(&fork)
            .await
            .with_context(|| format!("Failed to fork issue tree {}", source_id))?;
        tracing::info!(id = %fork.id, origin = %source_id, "Forked issue tree");
        Ok(Some(fork))
    }

    // ========================================================================
    // Revisions
    // ========================================================================

    /// Revisions of a document, newest first
    pub async fn list_revisions(&self, id: Uuid) -> Result<Vec<TreeRevision>> {
        self.store.list_tree_revisions(id).await
    }

    pub async fn get_revision(&self, id: Uuid, revision_id: Uuid) -> Result<Option<TreeRevision>> {
        self.store.get_tree_revision(id, revision_id).await
    }

    /// Replace the current tree with a revision's tree, snapshotting the
    /// current tree first. Returns `None` when the document or the revision
    /// does not exist.
    pub async fn restore_revision(
        &self,
        id: Uuid,
        revision_id: Uuid,
    ) -> Result<Option<IssueTreeDocument>> {
        let Some(revision) = self.store.get_tree_revision(id, revision_id).await? else {
            return Ok(None);
        };

        let update = IssueTreeUpdate {
            tree: Some(revision.tree_json),
            ..Default::default()
        };
        let options = UpdateOptions {
            semantic: true,
            revision_label: Some(format!(
                "Restored from revision at {}",
                human_timestamp(&revision.created_at)
            )),
        };
        self.update(id, update, options).await
    }

    /// Best-effort revision write: failures are logged, never returned
    async fn snapshot(&self, doc: &IssueTreeDocument, label: String) -> Option<TreeRevision> {
        let revision = TreeRevision::new(doc.id, label, doc.tree_json.clone());
        match self.store.create_tree_revision(&revision).await {
            Ok(()) => Some(revision),
            Err(e) => {
                tracing::warn!(id = %doc.id, "Revision snapshot failed, continuing update: {:#}", e);
                None
            }
        }
    }
}

fn human_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `"<origin> (fork)"`, shortening the origin so the result fits the title limit
fn fork_title(origin: &str) -> String {
    let room = MAX_TITLE_CHARS - FORK_SUFFIX.len();
    let base: String = origin.chars().take(room).collect();
    format!("{}{}", base.trim_end(), FORK_SUFFIX)
}
