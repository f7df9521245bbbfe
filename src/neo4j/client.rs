//! Neo4j client for issue tree documents and revisions

use crate::tree::{IssueTree, IssueTreeDocument, ListCursor, TreeRevision, TreeSource};
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use neo4rs::{query, Graph, Query};
use std::sync::Arc;
use uuid::Uuid;

/// Client for Neo4j operations
pub struct Neo4jClient {
    graph: Arc<Graph>,
}

/// Fixed-width UTC timestamp, so string order equals time order
pub(crate) fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("Invalid timestamp '{}'", s))?
        .with_timezone(&Utc))
}

fn optional_uuid(value: Option<Uuid>) -> String {
    value.map(|u| u.to_string()).unwrap_or_default()
}

fn encode_tree(tree: &IssueTree) -> Result<String> {
    serde_json::to_string(tree).context("Failed to serialize tree_json")
}

impl Neo4jClient {
    /// Create a new Neo4j client
    pub async fn new(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .context("Failed to connect to Neo4j")?;

        let client = Self {
            graph: Arc::new(graph),
        };

        // Initialize schema
        client.init_schema().await?;

        Ok(client)
    }

    /// Initialize the graph schema with constraints and indexes
    async fn init_schema(&self) -> Result<()> {
        let constraints = vec![
            "CREATE CONSTRAINT issue_tree_id IF NOT EXISTS FOR (t:IssueTree) REQUIRE t.id IS UNIQUE",
            "CREATE CONSTRAINT tree_revision_id IF NOT EXISTS FOR (r:TreeRevision) REQUIRE r.id IS UNIQUE",
        ];

        let indexes = vec![
            "CREATE INDEX issue_tree_user IF NOT EXISTS FOR (t:IssueTree) ON (t.user_id)",
            "CREATE INDEX issue_tree_updated IF NOT EXISTS FOR (t:IssueTree) ON (t.updated_at)",
            "CREATE INDEX tree_revision_tree IF NOT EXISTS FOR (r:TreeRevision) ON (r.issue_tree_id)",
        ];

        for constraint in constraints {
            if let Err(e) = self.graph.run(query(constraint)).await {
                tracing::warn!("Constraint may already exist: {}", e);
            }
        }

        for index in indexes {
            if let Err(e) = self.graph.run(query(index)).await {
                tracing::warn!("Index may already exist: {}", e);
            }
        }

        Ok(())
    }

    /// Execute a raw Cypher query (internal use only)
    pub(crate) async fn execute(&self, cypher: &str) -> Result<Vec<neo4rs::Row>> {
        self.execute_with_params(query(cypher)).await
    }

    /// Execute a parameterized Cypher query (internal use only)
    pub(crate) async fn execute_with_params(&self, q: Query) -> Result<Vec<neo4rs::Row>> {
        let mut result = self.graph.execute(q).await?;
        let mut rows = Vec::new();
        while let Some(row) = result.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    // ========================================================================
    // Issue tree operations
    // ========================================================================

    /// Create a new issue tree document
    pub async fn create_issue_tree(&self, doc: &IssueTreeDocument) -> Result<()> {
        let q = query(
            r#"
            CREATE (t:IssueTree {
                id: $id,
                title: $title,
                description: $description,
                user_id: $user_id,
                source: $source,
                forked_from_id: $forked_from_id,
                tree_json: $tree_json,
                created_at: $created_at,
                updated_at: $updated_at
            })
            WITH t
            OPTIONAL MATCH (origin:IssueTree {id: $forked_from_id})
            FOREACH (_ IN CASE WHEN origin IS NULL THEN [] ELSE [1] END |
                CREATE (t)-[:FORKED_FROM]->(origin))
            "#,
        )
        .param("id", doc.id.to_string())
        .param("title", doc.title.clone())
        .param("description", doc.description.clone().unwrap_or_default())
        .param("user_id", optional_uuid(doc.user_id))
        .param("source", doc.source.to_string())
        .param("forked_from_id", optional_uuid(doc.forked_from_id))
        .param("tree_json", encode_tree(&doc.tree_json)?)
        .param("created_at", format_timestamp(&doc.created_at))
        .param("updated_at", format_timestamp(&doc.updated_at));

        self.graph
            .run(q)
            .await
            .with_context(|| format!("Failed to create issue tree {}", doc.id))?;
        Ok(())
    }

    /// Get an issue tree by ID
    pub async fn get_issue_tree(&self, id: Uuid) -> Result<Option<IssueTreeDocument>> {
        let q = query(
            r#"
            MATCH (t:IssueTree {id: $id})
            RETURN t
            "#,
        )
        .param("id", id.to_string());

        let rows = self.execute_with_params(q).await?;
        match rows.first() {
            Some(row) => {
                let node: neo4rs::Node = row.get("t")?;
                Ok(Some(self.node_to_issue_tree(&node)?))
            }
            None => Ok(None),
        }
    }

    /// List a user's issue trees, most recently updated first
    pub async fn list_recent_issue_trees(
        &self,
        user_id: Uuid,
        after: Option<ListCursor>,
        limit: usize,
    ) -> Result<Vec<IssueTreeDocument>> {
        let q = query(
            r#"
            MATCH (t:IssueTree {user_id: $user_id})
            WHERE $before = ''
               OR t.updated_at < $before
               OR (t.updated_at = $before AND t.id < $before_id)
            RETURN t
            ORDER BY t.updated_at DESC, t.id DESC
            LIMIT $limit
            "#,
        )
        .param("user_id", user_id.to_string())
        .param(
            "before",
            after
                .map(|c| format_timestamp(&c.updated_at))
                .unwrap_or_default(),
        )
        .param(
            "before_id",
            after.map(|c| c.id.to_string()).unwrap_or_default(),
        )
        .param("limit", limit as i64);

        let rows = self.execute_with_params(q).await?;
        rows.iter()
            .map(|row| {
                let node: neo4rs::Node = row.get("t")?;
                self.node_to_issue_tree(&node)
            })
            .collect()
    }

    /// Replace the mutable fields of an issue tree
    pub async fn update_issue_tree(&self, doc: &IssueTreeDocument) -> Result<bool> {
        let q = query(
            r#"
            MATCH (t:IssueTree {id: $id})
            SET t.title = $title,
                t.description = $description,
                t.tree_json = $tree_json,
                t.updated_at = $updated_at
            RETURN t.id AS id
            "#,
        )
        .param("id", doc.id.to_string())
        .param("title", doc.title.clone())
        .param("description", doc.description.clone().unwrap_or_default())
        .param("tree_json", encode_tree(&doc.tree_json)?)
        .param("updated_at", format_timestamp(&doc.updated_at));

        let rows = self
            .execute_with_params(q)
            .await
            .with_context(|| format!("Failed to update issue tree {}", doc.id))?;
        Ok(!rows.is_empty())
    }

    /// Delete an issue tree and all its revisions
    pub async fn delete_issue_tree(&self, id: Uuid) -> Result<bool> {
        let q = query(
            r#"
            MATCH (t:IssueTree {id: $id})
            OPTIONAL MATCH (t)-[:HAS_REVISION]->(r:TreeRevision)
            WITH t, collect(r) AS revisions
            FOREACH (r IN revisions | DETACH DELETE r)
            DETACH DELETE t
            RETURN 1 AS deleted
            "#,
        )
        .param("id", id.to_string());

        let rows = self
            .execute_with_params(q)
            .await
            .with_context(|| format!("Failed to delete issue tree {}", id))?;
        Ok(!rows.is_empty())
    }

    /// Helper to convert Neo4j node to IssueTreeDocument
    fn node_to_issue_tree(&self, node: &neo4rs::Node) -> Result<IssueTreeDocument> {
        let tree_json: String = node.get("tree_json")?;
        let source: String = node.get("source")?;
        Ok(IssueTreeDocument {
            id: node.get::<String>("id")?.parse()?,
            title: node.get("title")?,
            description: node
                .get::<String>("description")
                .ok()
                .filter(|s| !s.is_empty()),
            user_id: node
                .get::<String>("user_id")
                .ok()
                .and_then(|s| s.parse().ok()),
            source: source.parse::<TreeSource>().map_err(|e| anyhow!(e))?,
            forked_from_id: node
                .get::<String>("forked_from_id")
                .ok()
                .and_then(|s| s.parse().ok()),
            tree_json: serde_json::from_str(&tree_json).context("Stored tree_json is invalid")?,
            created_at: parse_timestamp(&node.get::<String>("created_at")?)?,
            updated_at: parse_timestamp(&node.get::<String>("updated_at")?)?,
        })
    }

    // ========================================================================
    // Revision operations
    // ========================================================================

    /// Attach a new revision to its issue tree
    pub async fn create_tree_revision(&self, revision: &TreeRevision) -> Result<()> {
        let q = query(
            r#"
            MATCH (t:IssueTree {id: $issue_tree_id})
            CREATE (r:TreeRevision {
                id: $id,
                issue_tree_id: $issue_tree_id,
                label: $label,
                tree_json: $tree_json,
                created_at: $created_at
            })
            CREATE (t)-[:HAS_REVISION]->(r)
            RETURN r.id AS id
            "#,
        )
        .param("id", revision.id.to_string())
        .param("issue_tree_id", revision.issue_tree_id.to_string())
        .param("label", revision.label.clone())
        .param("tree_json", encode_tree(&revision.tree_json)?)
        .param("created_at", format_timestamp(&revision.created_at));

        let rows = self.execute_with_params(q).await?;
        if rows.is_empty() {
            return Err(anyhow!(
                "Issue tree {} not found for revision",
                revision.issue_tree_id
            ));
        }
        Ok(())
    }

    /// List revisions of an issue tree, newest first
    pub async fn list_tree_revisions(&self, issue_tree_id: Uuid) -> Result<Vec<TreeRevision>> {
        let q = query(
            r#"
            MATCH (:IssueTree {id: $issue_tree_id})-[:HAS_REVISION]->(r:TreeRevision)
            RETURN r
            ORDER BY r.created_at DESC
            "#,
        )
        .param("issue_tree_id", issue_tree_id.to_string());

        let rows = self.execute_with_params(q).await?;
        rows.iter()
            .map(|row| {
                let node: neo4rs::Node = row.get("r")?;
                self.node_to_revision(&node)
            })
            .collect()
    }

    /// Get one revision of an issue tree
    pub async fn get_tree_revision(
        &self,
        issue_tree_id: Uuid,
        revision_id: Uuid,
    ) -> Result<Option<TreeRevision>> {
        let q = query(
            r#"
            MATCH (:IssueTree {id: $issue_tree_id})-[:HAS_REVISION]->(r:TreeRevision {id: $id})
            RETURN r
            "#,
        )
        .param("issue_tree_id", issue_tree_id.to_string())
        .param("id", revision_id.to_string());

        let rows = self.execute_with_params(q).await?;
        match rows.first() {
            Some(row) => {
                let node: neo4rs::Node = row.get("r")?;
                Ok(Some(self.node_to_revision(&node)?))
            }
            None => Ok(None),
        }
    }

    /// Helper to convert Neo4j node to TreeRevision
    fn node_to_revision(&self, node: &neo4rs::Node) -> Result<TreeRevision> {
        let tree_json: String = node.get("tree_json")?;
        Ok(TreeRevision {
            id: node.get::<String>("id")?.parse()?,
            issue_tree_id: node.get::<String>("issue_tree_id")?.parse()?,
            label: node.get("label")?,
            created_at: parse_timestamp(&node.get::<String>("created_at")?)?,
            tree_json: serde_json::from_str(&tree_json).context("Stored tree_json is invalid")?,
        })
    }
}
