//! AI-assisted issue tree operations
//!
//! - `operations`: the closed set of operations and the suggestions they yield
//! - `schemas`: per-operation response schemas and output checks
//! - `prompts`: system prompts and focus-annotated user prompts
//! - `service`: `IssueTreeAiService`, the entry point used by the HTTP layer
//! - `apply`: turning a suggestion into a new tree

pub mod apply;
pub mod operations;
pub mod prompts;
pub mod schemas;
pub mod service;

pub use apply::apply_suggestion;
pub use operations::{
    IssueTreeOperation, IssueTreeSuggestion, SuggestionResponse, SynthesisResponse,
};
pub use schemas::{Assessment, CriterionScore};
pub use service::{AiError, IssueTreeAiService};
