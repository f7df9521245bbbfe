//! Test helper factories and mock state builders
//!
//! Builds `ServerState` over in-memory backends and mints bearer tokens
//! for router tests.
#![allow(dead_code)]

use crate::ai::IssueTreeAiService;
use crate::api::handlers::{IssueTreeState, ServerState};
use crate::auth::jwt::encode_jwt;
use crate::cache::{CacheStore, MemoryCache};
use crate::issue_trees::IssueTreeManager;
use crate::llm::{GenerationProvider, MockGenerationProvider};
use crate::neo4j::mock::MockIssueTreeStore;
use crate::AuthConfig;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// HS256 secret shared by `test_auth_config` and `test_bearer_token`
pub const TEST_SECRET: &str = "test-secret-key-minimum-32-chars!!";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        allowed_email_domain: None,
    }
}

/// `Authorization` header value for `user_id`, whose email is `<simple uuid>@example.com`
pub fn test_bearer_token(user_id: Uuid) -> String {
    let email = format!("{}@example.com", user_id.simple());
    let token = encode_jwt(user_id, &email, None, TEST_SECRET, 3600).expect("encode test token");
    format!("Bearer {}", token)
}

// ============================================================================
// Mock state builders
// ============================================================================

/// Server state with an empty store, an unscripted generation provider and
/// an in-memory cache
pub fn mock_server_state(auth_config: Option<AuthConfig>) -> IssueTreeState {
    mock_server_state_with(
        Arc::new(MockGenerationProvider::new()),
        Arc::new(MemoryCache::new(100)),
        auth_config,
    )
}

/// Server state with the given provider and cache over an empty store
pub fn mock_server_state_with(
    provider: Arc<dyn GenerationProvider>,
    cache: Arc<dyn CacheStore>,
    auth_config: Option<AuthConfig>,
) -> IssueTreeState {
    Arc::new(ServerState {
        trees: Arc::new(IssueTreeManager::new(Arc::new(MockIssueTreeStore::default()))),
        ai: Arc::new(IssueTreeAiService::new(
            provider,
            cache,
            Duration::from_secs(60),
        )),
        auth_config,
    })
}
