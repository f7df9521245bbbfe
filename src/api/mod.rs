//! HTTP API for issue trees

pub mod ai_handlers;
pub mod handlers;
pub mod query;
pub mod routes;
pub mod tree_handlers;

pub use query::*;
pub use routes::create_router;
