//! Mapping of failures to HTTP responses.
//!
//! Every error body is a small JSON object with a single string field. The
//! not-found body uses `message` on the get route and `error` on replace and
//! delete; existing clients read those keys, so both shapes are kept.

use crate::scrapers::ScrapeError;
use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use thiserror::Error;
use tracing::error;

pub const RECORD_NOT_FOUND: &str = "record not found";

/// Which key the not-found body carries its text under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKey {
    Message,
    Error,
}

impl NotFoundKey {
    fn as_str(self) -> &'static str {
        match self {
            NotFoundKey::Message => "message",
            NotFoundKey::Error => "error",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("record not found")]
    NotFound(NotFoundKey),
    #[error("invalid request body: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Scrape(ScrapeError::AllSourcesFailed { .. }) => StatusCode::BAD_GATEWAY,
            ApiError::Scrape(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::NotFound(key) => {
                let mut body = Map::new();
                body.insert(key.as_str().to_string(), Value::from(RECORD_NOT_FOUND));
                Value::Object(body)
            }
            other => {
                if status.is_server_error() {
                    error!(%status, error = %other, "Request failed");
                }
                json!({ "error": other.to_string() })
            }
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreCause;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::NotFound(NotFoundKey::Message).status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);

        let store = StoreError::Write {
            path: PathBuf::from("noticias.json"),
            source: StoreCause::Io(io::Error::other("disk full")),
        };
        assert_eq!(ApiError::from(store).status(), StatusCode::INTERNAL_SERVER_ERROR);

        let scrape = ScrapeError::AllSourcesFailed { attempted: 2 };
        assert_eq!(ApiError::from(scrape).status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_not_found_key_names() {
        assert_eq!(NotFoundKey::Message.as_str(), "message");
        assert_eq!(NotFoundKey::Error.as_str(), "error");
    }
}
