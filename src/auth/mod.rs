//! Authentication: JWT bearer tokens issued by the hosted auth provider
//!
//! Provides:
//! - JWT token encoding/decoding (`jwt` submodule)
//! - `require_auth` middleware for protected routes (`middleware` submodule)
//! - `AuthUser` extractor for handlers (`extractor` submodule)

pub mod extractor;
pub mod jwt;
pub mod middleware;
