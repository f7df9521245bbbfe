//! Issue tree validation and normalization
//!
//! Turns arbitrary JSON into a typed [`IssueTree`], collecting every problem
//! with its location instead of stopping at the first one. Accepts both the
//! wrapped `{ "root": node }` shape and a bare root node.

use super::error::{ValidationError, ValidationIssue};
use super::models::{IssueNode, IssueTree, NodeTag, NodeType};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Maximum number of nodes in one tree
pub const MAX_NODES: usize = 1000;
/// Maximum depth (root is depth 0)
pub const MAX_DEPTH: usize = 20;
/// Maximum length of a node's content, in characters
pub const MAX_CONTENT_CHARS: usize = 2000;

/// Locate the root node inside either accepted top-level shape.
///
/// An object with a `root` object and no `content` of its own is the wrapped
/// shape; any other object is taken to be the root node itself.
pub fn get_root_value(input: &Value) -> Option<&Value> {
    let obj = input.as_object()?;
    match obj.get("root") {
        Some(root) if root.is_object() && !obj.contains_key("content") => Some(root),
        _ => Some(input),
    }
}

/// Validate `input` and return the normalized tree.
///
/// Defaults applied: `tags = []`, `isExpanded = true`, `children = []`, and a
/// missing `parentId` is filled in from the structure.
pub fn validate_issue_tree(input: &Value) -> Result<IssueTree, ValidationError> {
    let root_value = get_root_value(input)
        .ok_or_else(|| ValidationError::single("", "Expected an issue tree object"))?;

    let mut validator = Validator::default();
    let root = validator.node(root_value, "root", None, 0);

    match root {
        Some(root) if validator.issues.is_empty() => Ok(IssueTree::new(root)),
        _ => {
            if validator.issues.is_empty() {
                validator
                    .issues
                    .push(ValidationIssue::new("root", "Invalid issue tree"));
            }
            Err(ValidationError::new(validator.issues))
        }
    }
}

/// Re-check an already typed tree (e.g. after a mutation or when loaded
/// from storage).
pub fn check_issue_tree(tree: &IssueTree) -> Result<(), ValidationError> {
    let value = serde_json::to_value(tree)
        .map_err(|e| ValidationError::single("", format!("Unserializable tree: {}", e)))?;
    validate_issue_tree(&value).map(|_| ())
}

#[derive(Default)]
struct Validator {
    issues: Vec<ValidationIssue>,
    /// id -> path where it was first seen
    seen_ids: HashMap<String, String>,
    count: usize,
    too_many_reported: bool,
}

impl Validator {
    fn issue(&mut self, path: &str, message: impl Into<String>) {
        self.issues.push(ValidationIssue::new(path, message));
    }

    fn node(
        &mut self,
        value: &Value,
        path: &str,
        parent_id: Option<&str>,
        depth: usize,
    ) -> Option<IssueNode> {
        let Some(obj) = value.as_object() else {
            self.issue(path, "Expected a node object");
            return None;
        };

        self.count += 1;
        if self.count > MAX_NODES {
            if !self.too_many_reported {
                self.too_many_reported = true;
                self.issue(path, format!("Tree exceeds {} nodes", MAX_NODES));
            }
            return None;
        }
        if depth > MAX_DEPTH {
            self.issue(path, format!("Tree exceeds maximum depth of {}", MAX_DEPTH));
            return None;
        }

        let id = self.id_field(obj, path);
        let content = self.content_field(obj, path);
        let node_type = self.type_field(obj, path, depth);
        let parent = self.parent_field(obj, path, parent_id, depth);
        let is_expanded = self.expanded_field(obj, path);
        let tags = self.tags_field(obj, path);

        let mut children = Vec::new();
        let mut children_ok = true;
        match obj.get("children") {
            None | Some(Value::Null) => {}
            Some(Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    let child_path = format!("{}.children[{}]", path, i);
                    match self.node(item, &child_path, id.as_deref(), depth + 1) {
                        Some(child) => children.push(child),
                        None => children_ok = false,
                    }
                }
            }
            Some(_) => {
                self.issue(&format!("{}.children", path), "Expected an array");
                children_ok = false;
            }
        }

        let (id, content, node_type, parent, is_expanded, tags) =
            (id?, content?, node_type?, parent?, is_expanded?, tags?);
        if !children_ok {
            return None;
        }

        Some(IssueNode {
            // A missing parentId is derived from the owning node
            parent_id: parent.or_else(|| parent_id.map(str::to_string)),
            id,
            content,
            node_type,
            children,
            is_expanded,
            tags,
        })
    }

    fn id_field(&mut self, obj: &Map<String, Value>, path: &str) -> Option<String> {
        let field = format!("{}.id", path);
        match obj.get("id") {
            None | Some(Value::Null) => {
                self.issue(&field, "Required");
                None
            }
            Some(Value::String(s)) if s.trim().is_empty() => {
                self.issue(&field, "Must not be empty");
                None
            }
            Some(Value::String(s)) => {
                if let Some(first) = self.seen_ids.get(s) {
                    let message = format!("Duplicate id '{}' (first used at {})", s, first);
                    self.issue(&field, message);
                    return None;
                }
                self.seen_ids.insert(s.clone(), path.to_string());
                Some(s.clone())
            }
            Some(_) => {
                self.issue(&field, "Expected a string");
                None
            }
        }
    }

    fn content_field(&mut self, obj: &Map<String, Value>, path: &str) -> Option<String> {
        let field = format!("{}.content", path);
        match obj.get("content") {
            None | Some(Value::Null) => {
                self.issue(&field, "Required");
                None
            }
            Some(Value::String(s)) if s.chars().count() > MAX_CONTENT_CHARS => {
                self.issue(
                    &field,
                    format!("Must be at most {} characters", MAX_CONTENT_CHARS),
                );
                None
            }
            Some(Value::String(s)) => Some(s.clone()),
            Some(_) => {
                self.issue(&field, "Expected a string");
                None
            }
        }
    }

    fn type_field(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        depth: usize,
    ) -> Option<NodeType> {
        let field = format!("{}.type", path);
        let raw = match obj.get("type") {
            None | Some(Value::Null) => {
                self.issue(&field, "Required");
                return None;
            }
            Some(Value::String(s)) => s,
            Some(_) => {
                self.issue(&field, "Expected a string");
                return None;
            }
        };

        let node_type = match raw.parse::<NodeType>() {
            Ok(t) => t,
            Err(_) => {
                let allowed: Vec<&str> = NodeType::ALL.iter().map(|t| t.as_str()).collect();
                self.issue(
                    &field,
                    format!("Invalid type '{}', expected one of: {}", raw, allowed.join(", ")),
                );
                return None;
            }
        };

        if depth == 0 && node_type != NodeType::Root {
            self.issue(&field, "The tree root must have type 'root'");
            return None;
        }
        if depth > 0 && node_type == NodeType::Root {
            self.issue(&field, "Only the tree root may have type 'root'");
            return None;
        }
        Some(node_type)
    }

    /// Returns `Some(None)` for a valid absent/null parent.
    fn parent_field(
        &mut self,
        obj: &Map<String, Value>,
        path: &str,
        expected: Option<&str>,
        depth: usize,
    ) -> Option<Option<String>> {
        let field = format!("{}.parentId", path);
        match obj.get("parentId") {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => {
                if depth == 0 {
                    self.issue(&field, "The tree root must not have a parent");
                    return None;
                }
                match expected {
                    Some(parent) if parent != s => {
                        self.issue(
                            &field,
                            format!("Expected '{}' (the owning node), got '{}'", parent, s),
                        );
                        None
                    }
                    _ => Some(Some(s.clone())),
                }
            }
            Some(_) => {
                self.issue(&field, "Expected a string or null");
                None
            }
        }
    }

    fn expanded_field(&mut self, obj: &Map<String, Value>, path: &str) -> Option<bool> {
        match obj.get("isExpanded") {
            None | Some(Value::Null) => Some(true),
            Some(Value::Bool(b)) => Some(*b),
            Some(_) => {
                self.issue(&format!("{}.isExpanded", path), "Expected a boolean");
                None
            }
        }
    }

    fn tags_field(&mut self, obj: &Map<String, Value>, path: &str) -> Option<Vec<NodeTag>> {
        let items = match obj.get("tags") {
            None | Some(Value::Null) => return Some(Vec::new()),
            Some(Value::Array(items)) => items,
            Some(_) => {
                self.issue(&format!("{}.tags", path), "Expected an array");
                return None;
            }
        };

        let mut tags = Vec::with_capacity(items.len());
        let mut ok = true;
        for (i, item) in items.iter().enumerate() {
            let tag_path = format!("{}.tags[{}]", path, i);
            match self.tag(item, &tag_path) {
                Some(tag) => tags.push(tag),
                None => ok = false,
            }
        }
        ok.then_some(tags)
    }

    fn tag(&mut self, value: &Value, path: &str) -> Option<NodeTag> {
        let Some(obj) = value.as_object() else {
            self.issue(path, "Expected a tag object");
            return None;
        };

        let id = match obj.get("id") {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::String(_)) => {
                self.issue(&format!("{}.id", path), "Must not be empty");
                None
            }
            None | Some(Value::Null) => {
                self.issue(&format!("{}.id", path), "Required");
                None
            }
            Some(_) => {
                self.issue(&format!("{}.id", path), "Expected a string");
                None
            }
        };
        let label = match obj.get("label") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            Some(Value::String(_)) => {
                self.issue(&format!("{}.label", path), "Must not be empty");
                None
            }
            None | Some(Value::Null) => {
                self.issue(&format!("{}.label", path), "Required");
                None
            }
            Some(_) => {
                self.issue(&format!("{}.label", path), "Expected a string");
                None
            }
        };
        let color = self.optional_string(obj, "color", path);
        let kind = self.optional_string(obj, "kind", path);

        Some(NodeTag {
            id: id?,
            label: label?,
            color: color?,
            kind: kind?,
        })
    }

    fn optional_string(
        &mut self,
        obj: &Map<String, Value>,
        key: &str,
        path: &str,
    ) -> Option<Option<String>> {
        match obj.get(key) {
            None | Some(Value::Null) => Some(None),
            Some(Value::String(s)) => Some(Some(s.clone())),
            Some(_) => {
                self.issue(&format!("{}.{}", path, key), "Expected a string");
                None
            }
        }
    }
}
