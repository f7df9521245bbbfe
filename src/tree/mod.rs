//! Issue tree document model
//!
//! - `models`: node, tree, document and revision types
//! - `validate`: JSON → typed tree, with path-addressed issues
//! - `ops`: pure lookups and edits
//! - `projection`: views of a tree for the generation model
//! - `hashing`: content fingerprints used as cache keys

pub mod error;
pub mod hashing;
pub mod models;
pub mod ops;
pub mod projection;
pub mod validate;

pub use error::{TreeError, ValidationError, ValidationIssue};
pub use hashing::{assessment_cache_key, hash_issue_tree};
pub use models::*;
pub use ops::{
    delete_node, find_node_by_id, find_parent, get_node_path, get_root_node, insert_child,
    insert_sibling, update_content, update_tags, NodeDraft,
};
pub use projection::{
    build_issue_tree_yaml, from_llm_projection, to_llm_projection, OutlineOptions, ProjectionDoc,
};
pub use validate::validate_issue_tree;
