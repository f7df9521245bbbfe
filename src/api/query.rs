//! Query parameters and request-body extraction

use super::handlers::AppError;
use axum::extract::{FromRequest, Request};
use axum::Json;
use crate::tree::ListCursor;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

/// Helper to deserialize optional numbers from query string
fn deserialize_option_from_str<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    use serde::de::Error;
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if !s.is_empty() => s.parse().map(Some).map_err(D::Error::custom),
        _ => Ok(None),
    }
}

/// Cursor pagination for `GET /api/issue-trees`
#[derive(Debug, Deserialize, Default, Clone)]
pub struct CursorParams {
    /// Max items to return (default: 20, max: 100)
    #[serde(default, deserialize_with = "deserialize_option_from_str")]
    pub limit: Option<usize>,
    /// `next_cursor` of the previous page
    #[serde(default)]
    pub cursor: Option<String>,
}

impl CursorParams {
    /// Validate pagination parameters
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(limit) = self.limit {
            if limit == 0 || limit > 100 {
                return Err(AppError::invalid("limit", "must be between 1 and 100"));
            }
        }
        self.parsed_cursor().map(|_| ())
    }

    /// The decoded cursor, if one was given
    pub fn parsed_cursor(&self) -> Result<Option<ListCursor>, AppError> {
        match self.cursor.as_deref().filter(|c| !c.is_empty()) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| AppError::invalid("cursor", "must be a next_cursor value")),
        }
    }
}

/// JSON body extractor whose rejections use the API error format
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(AppError::invalid("body", rejection.body_text())),
        }
    }
}

/// Parse an optional JSON body: empty means `T::default()`
pub fn optional_json<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::invalid("body", e.to_string()))
}
