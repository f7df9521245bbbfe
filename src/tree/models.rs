//! Issue tree models and DTOs
//!
//! An issue tree is a recursive decomposition of a problem statement into
//! hypotheses, questions, actions and data points. The whole tree lives inside
//! one persisted document; revisions are immutable snapshots of it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Core Enums
// ============================================================================

/// Kind of a node in an issue tree
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    /// The problem statement (exactly one per tree)
    Root,
    /// A candidate explanation to prove or disprove
    Hypothesis,
    /// An open question that decomposes its parent
    Question,
    /// Something to do
    Action,
    /// A fact or data point supporting its parent
    Data,
}

impl NodeType {
    /// All node types, in declaration order
    pub const ALL: [NodeType; 5] = [
        NodeType::Root,
        NodeType::Hypothesis,
        NodeType::Question,
        NodeType::Action,
        NodeType::Data,
    ];

    /// Node types a generated (non-root) node may have
    pub const NON_ROOT: [NodeType; 4] = [
        NodeType::Hypothesis,
        NodeType::Question,
        NodeType::Action,
        NodeType::Data,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Root => "root",
            Self::Hypothesis => "hypothesis",
            Self::Question => "question",
            Self::Action => "action",
            Self::Data => "data",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "root" => Ok(Self::Root),
            "hypothesis" => Ok(Self::Hypothesis),
            "question" => Ok(Self::Question),
            "action" => Ok(Self::Action),
            "data" => Ok(Self::Data),
            _ => Err(format!("Unknown node type: {}", s)),
        }
    }
}

/// Where a persisted tree came from
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TreeSource {
    /// Authored by a user
    #[default]
    User,
    /// Seeded by the system (templates, examples)
    System,
    /// Copied from another document
    Fork,
}

impl fmt::Display for TreeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::System => write!(f, "system"),
            Self::Fork => write!(f, "fork"),
        }
    }
}

impl FromStr for TreeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Self::User),
            "system" => Ok(Self::System),
            "fork" => Ok(Self::Fork),
            _ => Err(format!("Unknown tree source: {}", s)),
        }
    }
}

// ============================================================================
// Tree nodes
// ============================================================================

/// A label attached to a node
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeTag {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// A node of an issue tree. Children order is meaningful.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IssueNode {
    pub id: String,
    pub content: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default)]
    pub children: Vec<IssueNode>,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Display-only flag, never load-bearing
    #[serde(default = "default_expanded")]
    pub is_expanded: bool,
    #[serde(default)]
    pub tags: Vec<NodeTag>,
}

fn default_expanded() -> bool {
    true
}

impl IssueNode {
    /// Create a detached node with a fresh id
    pub fn new(content: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: new_node_id(),
            content: content.into(),
            node_type,
            children: Vec::new(),
            parent_id: None,
            is_expanded: true,
            tags: Vec::new(),
        }
    }

    /// Create a root node (problem statement)
    pub fn new_root(content: impl Into<String>) -> Self {
        Self::new(content, NodeType::Root)
    }

    /// Attach `child` as the last child, fixing its back-reference
    pub fn with_child(mut self, mut child: IssueNode) -> Self {
        child.parent_id = Some(self.id.clone());
        self.children.push(child);
        self
    }

    /// Number of nodes in this subtree, including self
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

/// Generate a fresh node id
pub fn new_node_id() -> String {
    Uuid::new_v4().to_string()
}

/// The normalized tree shape stored in documents: `{ "root": IssueNode }`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueTree {
    pub root: IssueNode,
}

impl IssueTree {
    pub fn new(root: IssueNode) -> Self {
        Self { root }
    }

    /// A tree made of a single root node
    pub fn with_problem(problem_statement: impl Into<String>) -> Self {
        Self::new(IssueNode::new_root(problem_statement))
    }
}

// ============================================================================
// Persisted entities
// ============================================================================

/// A persisted issue tree document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IssueTreeDocument {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    /// Owner; `None` for anonymous or system-authored trees
    pub user_id: Option<Uuid>,
    pub source: TreeSource,
    pub forked_from_id: Option<Uuid>,
    pub tree_json: IssueTree,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IssueTreeDocument {
    /// Create a new document
    pub fn new(
        title: String,
        description: Option<String>,
        user_id: Option<Uuid>,
        source: TreeSource,
        tree: IssueTree,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            user_id,
            source,
            forked_from_id: None,
            tree_json: tree,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `user_id` may modify this document. Unowned documents are open.
    pub fn is_modifiable_by(&self, user_id: Uuid) -> bool {
        self.user_id.map_or(true, |owner| owner == user_id)
    }
}

/// Position in a newest-first listing: the last `(updated_at, id)` seen.
///
/// Travels as `<RFC 3339 timestamp>_<uuid>`. The id breaks ties between
/// documents updated in the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListCursor {
    pub updated_at: DateTime<Utc>,
    pub id: Uuid,
}

impl ListCursor {
    pub fn at(doc: &IssueTreeDocument) -> Self {
        Self {
            updated_at: doc.updated_at,
            id: doc.id,
        }
    }

    /// Whether `doc` sorts strictly after this position (older, or same
    /// instant with a smaller id)
    pub fn precedes(&self, doc: &IssueTreeDocument) -> bool {
        (doc.updated_at, doc.id) < (self.updated_at, self.id)
    }
}

impl fmt::Display for ListCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}",
            self.updated_at
                .to_rfc3339_opts(chrono::SecondsFormat::AutoSi, true),
            self.id
        )
    }
}

impl FromStr for ListCursor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts, id) = s
            .rsplit_once('_')
            .ok_or_else(|| format!("Malformed cursor: {}", s))?;
        let updated_at = DateTime::parse_from_rfc3339(ts)
            .map_err(|e| format!("Malformed cursor timestamp '{}': {}", ts, e))?
            .with_timezone(&Utc);
        let id = Uuid::parse_str(id).map_err(|e| format!("Malformed cursor id '{}': {}", id, e))?;
        Ok(Self { updated_at, id })
    }
}

impl Serialize for ListCursor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Immutable snapshot of a document's tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeRevision {
    pub id: Uuid,
    pub issue_tree_id: Uuid,
    pub label: String,
    pub created_at: DateTime<Utc>,
    pub tree_json: IssueTree,
}

impl TreeRevision {
    pub fn new(issue_tree_id: Uuid, label: String, tree: IssueTree) -> Self {
        Self {
            id: Uuid::new_v4(),
            issue_tree_id,
            label,
            created_at: Utc::now(),
            tree_json: tree,
        }
    }
}

/// Fields replaced by a document update
#[derive(Debug, Clone, Default)]
pub struct IssueTreeUpdate {
    pub tree: Option<IssueTree>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl IssueTreeUpdate {
    pub fn is_empty(&self) -> bool {
        self.tree.is_none() && self.title.is_none() && self.description.is_none()
    }
}
