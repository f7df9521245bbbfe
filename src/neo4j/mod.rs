//! Neo4j persistence for issue trees and their revisions

pub mod client;
mod impl_store;
pub mod traits;

pub use client::Neo4jClient;
pub use traits::IssueTreeStore;

#[cfg(test)]
pub(crate) mod mock;
