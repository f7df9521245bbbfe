//! Structured generation
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - `GenerationProvider` trait: async interface for schema-constrained generation
//! - `HttpGenerationProvider`: OpenAI-compatible chat completions client
//! - `MockGenerationProvider`: scripted responses for tests

pub mod mock;
pub mod provider;
pub mod traits;

pub use mock::MockGenerationProvider;
pub use provider::HttpGenerationProvider;
pub use traits::{GenerationError, GenerationProvider, StructuredRequest};
