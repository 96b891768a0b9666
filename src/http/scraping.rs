//! Route that runs the collector on demand.

use super::error::ApiError;
use crate::models::Record;
use crate::scrapers::Collector;
use crate::scrapers::fetch::FetchPage;
use crate::store::RecordStore;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tracing::instrument;

pub struct ScrapingState<S, F> {
    pub store: Arc<S>,
    pub collector: Collector<F>,
}

pub fn scraping_routes<S: RecordStore, F: FetchPage>(state: Arc<ScrapingState<S, F>>) -> Router {
    Router::new()
        .route("/scraping", get(run_collector::<S, F>))
        .with_state(state)
}

/// Scrape, replace the stored collection, and answer with what was stored.
#[instrument(level = "info", skip_all)]
async fn run_collector<S: RecordStore, F: FetchPage>(
    State(state): State<Arc<ScrapingState<S, F>>>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let records = state.collector.refresh(state.store.as_ref()).await?;
    Ok(Json(records))
}
