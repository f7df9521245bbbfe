//! Pure tree operations
//!
//! Lookups borrow the input; edits clone it and return the new tree. No
//! function here mutates its argument.

use super::error::TreeError;
use super::models::{new_node_id, IssueNode, IssueTree, NodeTag, NodeType};
use serde::{Deserialize, Serialize};

/// Content for a node that does not exist yet. Ids are assigned on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeDraft {
    pub content: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeDraft>,
}

impl NodeDraft {
    pub fn new(content: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            content: content.into(),
            node_type,
            children: Vec::new(),
        }
    }

    /// Materialize the draft under `parent_id`, assigning fresh ids recursively.
    pub fn into_node(self, parent_id: &str) -> IssueNode {
        let id = new_node_id();
        let children = self
            .children
            .into_iter()
            .map(|c| c.into_node(&id))
            .collect();
        IssueNode {
            id,
            content: self.content,
            node_type: self.node_type,
            children,
            parent_id: Some(parent_id.to_string()),
            is_expanded: true,
            tags: Vec::new(),
        }
    }
}

// ============================================================================
// Lookups
// ============================================================================

/// Unwrap the root node of a tree
pub fn get_root_node(tree: &IssueTree) -> &IssueNode {
    &tree.root
}

/// Depth-first search for `id`. Absence is not an error.
pub fn find_node_by_id<'a>(root: &'a IssueNode, id: &str) -> Option<&'a IssueNode> {
    if root.id == id {
        return Some(root);
    }
    root.children.iter().find_map(|c| find_node_by_id(c, id))
}

/// Ids from the root down to `id`, inclusive on both ends
pub fn get_node_path(root: &IssueNode, id: &str) -> Option<Vec<String>> {
    let mut path = Vec::new();
    if collect_path(root, id, &mut path) {
        Some(path.into_iter().map(|n| n.id.clone()).collect())
    } else {
        None
    }
}

/// Nodes from the root down to `id`, inclusive on both ends
pub fn get_node_chain<'a>(root: &'a IssueNode, id: &str) -> Option<Vec<&'a IssueNode>> {
    let mut path = Vec::new();
    collect_path(root, id, &mut path).then_some(path)
}

fn collect_path<'a>(node: &'a IssueNode, id: &str, path: &mut Vec<&'a IssueNode>) -> bool {
    path.push(node);
    if node.id == id || node.children.iter().any(|c| collect_path(c, id, path)) {
        return true;
    }
    path.pop();
    false
}

/// The node whose children contain `id`; `None` for the root or a missing id
pub fn find_parent<'a>(root: &'a IssueNode, id: &str) -> Option<&'a IssueNode> {
    if root.children.iter().any(|c| c.id == id) {
        return Some(root);
    }
    root.children.iter().find_map(|c| find_parent(c, id))
}

/// All ids in depth-first pre-order
pub fn collect_ids(root: &IssueNode) -> Vec<String> {
    let mut ids = Vec::with_capacity(root.node_count());
    walk(root, &mut |n| ids.push(n.id.clone()));
    ids
}

/// Visit every node in depth-first pre-order
pub fn walk<F: FnMut(&IssueNode)>(node: &IssueNode, f: &mut F) {
    f(node);
    for child in &node.children {
        walk(child, f);
    }
}

// ============================================================================
// Edits
// ============================================================================

fn find_node_mut<'a>(node: &'a mut IssueNode, id: &str) -> Option<&'a mut IssueNode> {
    if node.id == id {
        return Some(node);
    }
    node.children.iter_mut().find_map(|c| find_node_mut(c, id))
}

fn remove_descendant(node: &mut IssueNode, id: &str) -> bool {
    if let Some(pos) = node.children.iter().position(|c| c.id == id) {
        node.children.remove(pos);
        return true;
    }
    node.children.iter_mut().any(|c| remove_descendant(c, id))
}

fn insert_at(
    children: &mut Vec<IssueNode>,
    node: IssueNode,
    position: Option<usize>,
) -> Result<(), TreeError> {
    let index = position.unwrap_or(children.len());
    if index > children.len() {
        return Err(TreeError::InvalidOperation(format!(
            "Position {} is out of range (0..={})",
            index,
            children.len()
        )));
    }
    children.insert(index, node);
    Ok(())
}

fn reject_root_type(draft: &NodeDraft) -> Result<(), TreeError> {
    if draft.node_type == NodeType::Root {
        return Err(TreeError::InvalidOperation(
            "Only the tree root may have type 'root'".to_string(),
        ));
    }
    draft.children.iter().try_for_each(reject_root_type)
}

/// Insert `draft` as a child of `parent_id`, appended unless `position` is given.
///
/// Returns the new tree and the id assigned to the inserted node.
pub fn insert_child(
    tree: &IssueTree,
    parent_id: &str,
    draft: NodeDraft,
    position: Option<usize>,
) -> Result<(IssueTree, String), TreeError> {
    reject_root_type(&draft)?;
    let mut next = tree.clone();
    let parent = find_node_mut(&mut next.root, parent_id)
        .ok_or_else(|| TreeError::NodeNotFound(parent_id.to_string()))?;
    let node = draft.into_node(parent_id);
    let new_id = node.id.clone();
    insert_at(&mut parent.children, node, position)?;
    Ok((next, new_id))
}

/// Insert `draft` next to `sibling_id` (same parent), appended to the parent's
/// children unless `position` is given. The root has no siblings.
pub fn insert_sibling(
    tree: &IssueTree,
    sibling_id: &str,
    draft: NodeDraft,
    position: Option<usize>,
) -> Result<(IssueTree, String), TreeError> {
    if tree.root.id == sibling_id {
        return Err(TreeError::InvalidOperation(
            "The root node cannot have siblings".to_string(),
        ));
    }
    let parent_id = find_parent(&tree.root, sibling_id)
        .map(|p| p.id.clone())
        .ok_or_else(|| TreeError::NodeNotFound(sibling_id.to_string()))?;
    insert_child(tree, &parent_id, draft, position)
}

/// Remove a node and its subtree. Deleting the root is rejected.
pub fn delete_node(tree: &IssueTree, id: &str) -> Result<IssueTree, TreeError> {
    if tree.root.id == id {
        return Err(TreeError::InvalidOperation(
            "The root node cannot be deleted".to_string(),
        ));
    }
    let mut next = tree.clone();
    if remove_descendant(&mut next.root, id) {
        Ok(next)
    } else {
        Err(TreeError::NodeNotFound(id.to_string()))
    }
}

/// Replace a node's content
pub fn update_content(tree: &IssueTree, id: &str, content: &str) -> Result<IssueTree, TreeError> {
    let mut next = tree.clone();
    let node =
        find_node_mut(&mut next.root, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    node.content = content.to_string();
    Ok(next)
}

/// Replace a node's tags. Labels must be non-empty.
pub fn update_tags(
    tree: &IssueTree,
    id: &str,
    tags: Vec<NodeTag>,
) -> Result<IssueTree, TreeError> {
    if let Some(bad) = tags.iter().find(|t| t.label.trim().is_empty()) {
        return Err(TreeError::InvalidOperation(format!(
            "Tag '{}' has an empty label",
            bad.id
        )));
    }
    let mut next = tree.clone();
    let node =
        find_node_mut(&mut next.root, id).ok_or_else(|| TreeError::NodeNotFound(id.to_string()))?;
    node.tags = tags;
    Ok(next)
}
