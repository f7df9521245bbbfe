//! Issue tree documents: create, list, update, fork, delete and revisions

pub mod manager;
pub mod models;

pub use manager::IssueTreeManager;
pub use models::*;
