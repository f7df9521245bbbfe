//! Content fingerprints for issue trees
//!
//! The fingerprint covers everything the generation model sees (ids, types,
//! content, tags, child order) and nothing display-only, so collapsing a node
//! does not change it.

use super::models::IssueTree;
use super::projection::to_llm_projection;
use sha2::{Digest, Sha256};

/// Hex-encoded SHA-256 of the tree's canonical projection. Order-sensitive.
pub fn hash_issue_tree(tree: &IssueTree) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"issue-tree:v1:");
    // Struct fields serialize in declaration order, so this is canonical
    let canonical = serde_json::to_vec(&to_llm_projection(tree)).unwrap_or_default();
    hasher.update(&canonical);
    hex::encode(hasher.finalize())
}

/// Cache key for an assessment of `tree`
pub fn assessment_cache_key(tree: &IssueTree) -> String {
    format!("assessment:{}", hash_issue_tree(tree))
}
