//! Record routes: list, get, create, replace and delete by position.
//!
//! Each handler does one full read of the store, mutates the in-memory
//! collection if it needs to, writes the whole collection back, and answers
//! with JSON. Records are addressed by their current index, so deleting one
//! shifts every later record down by one.

use super::error::{ApiError, NotFoundKey};
use crate::models::{Record, RecordBody};
use crate::store::RecordStore;
use crate::utils::truncate_for_log;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, Path, Request, State};
use axum::http::header;
use axum::routing::get;
use axum::{Form, Json, Router};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Body of a successful delete.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub message: &'static str,
    pub record: Record,
}

/// Build the `/records` router over `store`.
///
/// # Arguments
/// * `store` - backend every handler reads from and writes back to
///
/// # Returns
/// A stateless `Router` ready to be merged into the app.
pub fn record_routes<S: RecordStore>(store: Arc<S>) -> Router {
    Router::new()
        .route("/records", get(list_records::<S>).post(create_record::<S>))
        .route(
            "/records/:index",
            get(get_record::<S>)
                .put(replace_record::<S>)
                .delete(delete_record::<S>),
        )
        .with_state(store)
}

/// Load the collection, treating a data file that does not exist yet as empty.
///
/// Any other read failure is returned so the caller answers 500 instead of
/// carrying on with no collection.
pub(crate) async fn load<S: RecordStore>(store: &S) -> Result<Vec<Record>, ApiError> {
    match store.read().await {
        Ok(records) => Ok(records),
        Err(e) if e.is_missing() => {
            warn!(error = %e, "No data file yet; starting from an empty collection");
            Ok(Vec::new())
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolve a path segment to a position in a collection of `len` records.
///
/// Negative, non-numeric and out-of-range values all resolve to `None`.
fn position(raw: &str, len: usize) -> Option<usize> {
    raw.parse::<usize>().ok().filter(|&i| i < len)
}

/// `GET /records`: every record in stored order.
#[instrument(level = "info", skip_all)]
async fn list_records<S: RecordStore>(
    State(store): State<Arc<S>>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let records = load(store.as_ref()).await?;
    info!(count = records.len(), "Listed records");
    Ok(Json(records))
}

/// `GET /records/:index`.
///
/// # Errors
/// 404 `{message}` when `index` is not a valid position.
#[instrument(level = "info", skip_all)]
async fn get_record<S: RecordStore>(
    State(store): State<Arc<S>>,
    Path(index): Path<String>,
) -> Result<Json<Record>, ApiError> {
    let mut records = load(store.as_ref()).await?;
    let i = position(&index, records.len()).ok_or(ApiError::NotFound(NotFoundKey::Message))?;
    Ok(Json(records.swap_remove(i)))
}

/// Append a record and answer with the whole updated collection.
///
/// # Errors
/// 400 for a malformed JSON body, 500 when the store cannot be read or written.
#[instrument(level = "info", skip_all)]
async fn create_record<S: RecordStore>(
    State(store): State<Arc<S>>,
    RecordPayload(body): RecordPayload,
) -> Result<Json<Vec<Record>>, ApiError> {
    let mut records = load(store.as_ref()).await?;
    records.push(Record::from(body));
    store.write(&records).await?;
    info!(index = records.len() - 1, count = records.len(), "Created record");
    Ok(Json(records))
}

/// Overwrite the record at `index` with exactly the submitted fields.
///
/// # Returns
/// The new record as stored.
///
/// # Errors
/// 404 `{error}` for an invalid position; the file is left untouched.
#[instrument(level = "info", skip_all)]
async fn replace_record<S: RecordStore>(
    State(store): State<Arc<S>>,
    Path(index): Path<String>,
    RecordPayload(body): RecordPayload,
) -> Result<Json<Record>, ApiError> {
    let mut records = load(store.as_ref()).await?;
    let i = position(&index, records.len()).ok_or(ApiError::NotFound(NotFoundKey::Error))?;
    records[i] = Record::from(body);
    store.write(&records).await?;
    info!(index = i, "Replaced record");
    Ok(Json(records.swap_remove(i)))
}

/// Remove the record at `index`; later records shift down by one.
///
/// # Returns
/// `{message: "record deleted", record}` with the removed record.
#[instrument(level = "info", skip_all)]
async fn delete_record<S: RecordStore>(
    State(store): State<Arc<S>>,
    Path(index): Path<String>,
) -> Result<Json<DeletedResponse>, ApiError> {
    let mut records = load(store.as_ref()).await?;
    let i = position(&index, records.len()).ok_or(ApiError::NotFound(NotFoundKey::Error))?;
    let removed = records.remove(i);
    store.write(&records).await?;
    info!(index = i, remaining = records.len(), "Deleted record");
    Ok(Json(DeletedResponse {
        message: "record deleted",
        record: removed,
    }))
}

/// A create/replace body, read leniently.
///
/// JSON and URL-encoded form bodies are both accepted. A request without a
/// recognised content type, or with an empty JSON body, yields a body with no
/// fields. Only a JSON body that does not parse is rejected.
pub struct RecordPayload(pub RecordBody);

#[async_trait]
impl<S> FromRequest<S> for RecordPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if content_type.starts_with("application/json") {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            if bytes.iter().all(u8::is_ascii_whitespace) {
                return Ok(Self(RecordBody::default()));
            }
            let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
                warn!(
                    error = %e,
                    body_preview = %truncate_for_log(&String::from_utf8_lossy(&bytes), 200),
                    "Rejected malformed JSON body"
                );
                ApiError::BadRequest(e.to_string())
            })?;
            Ok(Self(RecordBody::from_json(value)))
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(form) = Form::<HashMap<String, String>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            Ok(Self(RecordBody::from_form(form)))
        } else {
            Ok(Self(RecordBody::default()))
        }
    }
}
