//! Generation-model views of an issue tree
//!
//! Two projections are built from a tree for prompt context:
//! - a compact JSON document ([`ProjectionDoc`]) without display-only fields
//! - a line-oriented outline with an optional focus marker
//!
//! Both are deterministic for a given tree: node order is children order.

use super::models::{IssueNode, IssueTree, NodeTag, NodeType};
use serde::{Deserialize, Serialize};

/// Default marker written next to the focused node
pub const DEFAULT_FOCUS_LABEL: &str = "FOCUS";

/// A node as seen by the generation model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectionNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<NodeTag>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ProjectionNode>,
}

/// JSON projection of a whole tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectionDoc {
    pub root: ProjectionNode,
}

/// Strip display-only fields and back-references
pub fn to_llm_projection(tree: &IssueTree) -> ProjectionDoc {
    ProjectionDoc {
        root: project_node(&tree.root),
    }
}

fn project_node(node: &IssueNode) -> ProjectionNode {
    ProjectionNode {
        id: node.id.clone(),
        node_type: node.node_type,
        content: node.content.clone(),
        tags: node.tags.clone(),
        children: node.children.iter().map(project_node).collect(),
    }
}

/// Rebuild a tree from its projection. `parentId` comes from the structure and
/// `isExpanded` is reset to `true`.
pub fn from_llm_projection(doc: ProjectionDoc) -> IssueTree {
    IssueTree::new(unproject_node(doc.root, None))
}

fn unproject_node(node: ProjectionNode, parent_id: Option<&str>) -> IssueNode {
    let children = node
        .children
        .into_iter()
        .map(|c| unproject_node(c, Some(&node.id)))
        .collect();
    IssueNode {
        parent_id: parent_id.map(str::to_string),
        is_expanded: true,
        children,
        tags: node.tags,
        content: node.content,
        node_type: node.node_type,
        id: node.id,
    }
}

/// Options for [`build_issue_tree_yaml`]
#[derive(Debug, Clone, Copy, Default)]
pub struct OutlineOptions<'a> {
    /// Node to mark
    pub focus_node_id: Option<&'a str>,
    /// Marker text, e.g. the pending operation; defaults to `FOCUS`
    pub focus_label: Option<&'a str>,
}

/// Render the tree as an indented outline, one line per node:
///
/// ```text
/// - id: r | type: root | content: "Profitability is declining"
///   - id: a | type: hypothesis | content: "Revenue is decreasing"  # <-- generate-child
/// ```
pub fn build_issue_tree_yaml(tree: &IssueTree, options: OutlineOptions<'_>) -> String {
    let mut out = String::new();
    render_line(&tree.root, 0, &options, &mut out);
    out
}

fn render_line(node: &IssueNode, depth: usize, options: &OutlineOptions<'_>, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    // JSON string quoting keeps multi-line content on one line
    let content = serde_json::to_string(&node.content).unwrap_or_default();
    out.push_str(&format!(
        "- id: {} | type: {} | content: {}",
        node.id, node.node_type, content
    ));
    if !node.tags.is_empty() {
        let labels: Vec<&str> = node.tags.iter().map(|t| t.label.as_str()).collect();
        out.push_str(&format!(" | tags: [{}]", labels.join(", ")));
    }
    if options.focus_node_id == Some(node.id.as_str()) {
        out.push_str("  # <-- ");
        out.push_str(options.focus_label.unwrap_or(DEFAULT_FOCUS_LABEL));
    }
    out.push('\n');

    for child in &node.children {
        render_line(child, depth + 1, options, out);
    }
}
