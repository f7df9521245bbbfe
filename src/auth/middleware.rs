//! Auth middleware for Axum routes.
//!
//! Validates JWT Bearer tokens and injects Claims into request extensions.
//! Implements deny-by-default: if `auth_config` is None, all requests are rejected.

use crate::api::handlers::{AppError, IssueTreeState};
use crate::auth::jwt::decode_jwt;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Middleware that requires a valid JWT Bearer token.
///
/// # Behavior
/// 1. If `auth_config` is `None` → 403 Forbidden (deny-by-default)
/// 2. Extract `Authorization: Bearer <token>` header → 401 if missing
/// 3. Validate JWT with the configured secret → 401 if invalid/expired
/// 4. Check `allowed_email_domain` if configured → 403 if domain mismatch
/// 5. Inject `Claims` into request extensions for downstream handlers
pub async fn require_auth(
    State(state): State<IssueTreeState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_config = state.auth_config.as_ref().ok_or_else(|| {
        AppError::Forbidden("Authentication not configured, access denied".to_string())
    })?;

    let auth_header = req
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header format".to_string()))?;

    let claims = decode_jwt(token, &auth_config.jwt_secret).map_err(|e| {
        tracing::debug!("Rejected bearer token: {:#}", e);
        AppError::Unauthorized("Invalid or expired token".to_string())
    })?;

    if let Some(ref domain) = auth_config.allowed_email_domain {
        if !claims.email.ends_with(&format!("@{}", domain)) {
            return Err(AppError::Forbidden(format!(
                "Email domain not allowed (expected @{})",
                domain
            )));
        }
    }

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::extractor::AuthUser;
    use crate::auth::jwt::{encode_jwt, Claims};
    use crate::test_helpers::{mock_server_state, test_auth_config, test_bearer_token, TEST_SECRET};
    use crate::AuthConfig;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::middleware::from_fn_with_state;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt; // for `oneshot`

    /// Build a test router with the auth middleware applied
    fn test_app(auth_config: Option<AuthConfig>) -> Router {
        let state = mock_server_state(auth_config);

        async fn whoami(user: AuthUser) -> String {
            user.email
        }

        Router::new()
            .route("/test", get(whoami))
            .layer(from_fn_with_state(state.clone(), require_auth))
            .with_state(state)
    }

    async fn send(app: Router, authorization: Option<String>) -> (StatusCode, String) {
        let mut builder = HttpRequest::builder().uri("/test");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        let resp = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_no_auth_config_returns_403() {
        let (status, _) = send(test_app(None), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_no_header_returns_401() {
        let (status, body) = send(test_app(Some(test_auth_config())), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.contains("\"kind\":\"unauthorized\""));
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_returns_401() {
        let (status, _) = send(
            test_app(Some(test_auth_config())),
            Some("Basic dXNlcjpwYXNz".to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_invalid_token_returns_401() {
        let (status, _) = send(
            test_app(Some(test_auth_config())),
            Some("Bearer invalid.token.here".to_string()),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_expired_token_returns_401() {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: uuid::Uuid::new_v4().to_string(),
            email: "test@example.com".to_string(),
            name: None,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        let (status, _) = send(
            test_app(Some(test_auth_config())),
            Some(format!("Bearer {}", token)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_valid_token_reaches_handler() {
        let user_id = uuid::Uuid::new_v4();
        let (status, body) = send(
            test_app(Some(test_auth_config())),
            Some(test_bearer_token(user_id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, format!("{}@example.com", user_id.simple()));
    }

    #[tokio::test]
    async fn test_non_uuid_subject_returns_401() {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "service-account".to_string(),
            email: "svc@example.com".to_string(),
            name: None,
            iat: now,
            exp: now + 600,
        };
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap();

        let (status, _) = send(
            test_app(Some(test_auth_config())),
            Some(format!("Bearer {}", token)),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_domain_returns_403() {
        let mut config = test_auth_config();
        config.allowed_email_domain = Some("example.org".to_string());

        let token = encode_jwt(
            uuid::Uuid::new_v4(),
            "alice@gmail.com",
            Some("Alice"),
            TEST_SECRET,
            3600,
        )
        .unwrap();

        let (status, _) = send(test_app(Some(config)), Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_correct_domain_passes() {
        let mut config = test_auth_config();
        config.allowed_email_domain = Some("example.org".to_string());

        let token = encode_jwt(
            uuid::Uuid::new_v4(),
            "alice@example.org",
            Some("Alice"),
            TEST_SECRET,
            3600,
        )
        .unwrap();

        let (status, body) = send(test_app(Some(config)), Some(format!("Bearer {}", token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "alice@example.org");
    }
}
