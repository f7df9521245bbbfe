//! In-memory mock implementation of IssueTreeStore for testing.
//!
//! Mirrors the Neo4j client's ordering and cascade rules using
//! `tokio::sync::RwLock<HashMap<K, V>>` collections.
//! Conditionally compiled with `#[cfg(test)]`.

use crate::neo4j::traits::IssueTreeStore;
use crate::tree::{IssueTreeDocument, ListCursor, TreeRevision};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory mock implementation of IssueTreeStore for testing.
#[derive(Default)]
pub struct MockIssueTreeStore {
    pub issue_trees: RwLock<HashMap<Uuid, IssueTreeDocument>>,
    pub revisions: RwLock<HashMap<Uuid, TreeRevision>>,
    /// When set, revision writes fail (to exercise best-effort snapshots)
    pub fail_revision_writes: AtomicBool,
}

impl MockIssueTreeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IssueTreeStore for MockIssueTreeStore {
    async fn create_issue_tree(&self, doc: &IssueTreeDocument) -> Result<()> {
        self.issue_trees.write().await.insert(doc.id, doc.clone());
        Ok(())
    }

    async fn get_issue_tree(&self, id: Uuid) -> Result<Option<IssueTreeDocument>> {
        Ok(self.issue_trees.read().await.get(&id).cloned())
    }

    async fn list_recent_issue_trees(
        &self,
        user_id: Uuid,
        after: Option<ListCursor>,
        limit: usize,
    ) -> Result<Vec<IssueTreeDocument>> {
        let trees = self.issue_trees.read().await;
        let mut items: Vec<IssueTreeDocument> = trees
            .values()
            .filter(|t| t.user_id == Some(user_id))
            .filter(|t| after.map_or(true, |c| c.precedes(t)))
            .cloned()
            .collect();
        items.sort_by(|a, b| (b.updated_at, b.id).cmp(&(a.updated_at, a.id)));
        items.truncate(limit);
        Ok(items)
    }

    async fn update_issue_tree(&self, doc: &IssueTreeDocument) -> Result<bool> {
        let mut trees = self.issue_trees.write().await;
        match trees.get_mut(&doc.id) {
            Some(existing) => {
                existing.title = doc.title.clone();
                existing.description = doc.description.clone();
                existing.tree_json = doc.tree_json.clone();
                existing.updated_at = doc.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_issue_tree(&self, id: Uuid) -> Result<bool> {
        let removed = self.issue_trees.write().await.remove(&id).is_some();
        if removed {
            self.revisions
                .write()
                .await
                .retain(|_, r| r.issue_tree_id != id);
        }
        Ok(removed)
    }

    async fn create_tree_revision(&self, revision: &TreeRevision) -> Result<()> {
        if self.fail_revision_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("revision store unavailable"));
        }
        if !self
            .issue_trees
            .read()
            .await
            .contains_key(&revision.issue_tree_id)
        {
            return Err(anyhow!(
                "Issue tree {} not found for revision",
                revision.issue_tree_id
            ));
        }
        self.revisions
            .write()
            .await
            .insert(revision.id, revision.clone());
        Ok(())
    }

    async fn list_tree_revisions(&self, issue_tree_id: Uuid) -> Result<Vec<TreeRevision>> {
        let revisions = self.revisions.read().await;
        let mut items: Vec<TreeRevision> = revisions
            .values()
            .filter(|r| r.issue_tree_id == issue_tree_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    async fn get_tree_revision(
        &self,
        issue_tree_id: Uuid,
        revision_id: Uuid,
    ) -> Result<Option<TreeRevision>> {
        Ok(self
            .revisions
            .read()
            .await
            .get(&revision_id)
            .filter(|r| r.issue_tree_id == issue_tree_id)
            .cloned())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{IssueTree, TreeSource};
    use chrono::{Duration, Utc};

    fn doc(user: Uuid, title: &str, age_secs: i64) -> IssueTreeDocument {
        let mut d = IssueTreeDocument::new(
            title.to_string(),
            None,
            Some(user),
            TreeSource::User,
            IssueTree::with_problem(title),
        );
        d.updated_at = Utc::now() - Duration::seconds(age_secs);
        d
    }

    #[tokio::test]
    async fn test_list_recent_orders_and_filters() {
        let store = MockIssueTreeStore::new();
        let user = Uuid::new_v4();
        let other = Uuid::new_v4();
        for (title, age) in [("old", 30), ("new", 10), ("mid", 20)] {
            store.create_issue_tree(&doc(user, title, age)).await.unwrap();
        }
        store.create_issue_tree(&doc(other, "theirs", 0)).await.unwrap();

        let page = store.list_recent_issue_trees(user, None, 2).await.unwrap();
        let titles: Vec<_> = page.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["new", "mid"]);

        let rest = store
            .list_recent_issue_trees(user, Some(ListCursor::at(&page[1])), 10)
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].title, "old");
    }

    #[tokio::test]
    async fn test_list_recent_keeps_ties_across_pages() {
        let store = MockIssueTreeStore::new();
        let user = Uuid::new_v4();
        let first = doc(user, "a", 5);
        for title in ["a", "b", "c"] {
            let mut d = doc(user, title, 5);
            d.updated_at = first.updated_at;
            store.create_issue_tree(&d).await.unwrap();
        }

        let mut seen = Vec::new();
        let mut cursor = None;
        loop {
            let page = store.list_recent_issue_trees(user, cursor, 1).await.unwrap();
            let Some(last) = page.last() else { break };
            cursor = Some(ListCursor::at(last));
            seen.extend(page.iter().map(|d| d.id));
        }
        assert_eq!(seen.len(), 3);
        assert!(seen.windows(2).all(|w| w[0] > w[1]));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_revisions() {
        let store = MockIssueTreeStore::new();
        let d = doc(Uuid::new_v4(), "t", 0);
        store.create_issue_tree(&d).await.unwrap();
        let rev = TreeRevision::new(d.id, "r".into(), d.tree_json.clone());
        store.create_tree_revision(&rev).await.unwrap();

        assert!(store.delete_issue_tree(d.id).await.unwrap());
        assert!(!store.delete_issue_tree(d.id).await.unwrap());
        assert!(store.list_tree_revisions(d.id).await.unwrap().is_empty());
        assert!(store.create_tree_revision(&rev).await.is_err());
    }
}
