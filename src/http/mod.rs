//! HTTP surface: the record routes, the collector route, and the server loop.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/records` | list every record |
//! | GET | `/records/{index}` | one record by position |
//! | POST | `/records` | append, answers with the whole collection |
//! | PUT | `/records/{index}` | overwrite one record |
//! | DELETE | `/records/{index}` | remove one record |
//! | GET | `/scraping` | run the collector and store its output |

pub mod error;
pub mod records;
pub mod scraping;

use crate::scrapers::Collector;
use crate::scrapers::fetch::FetchPage;
use crate::store::RecordStore;
use axum::Router;
use records::record_routes;
use scraping::{ScrapingState, scraping_routes};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Build the full application router over one shared store.
pub fn app<S: RecordStore, F: FetchPage>(store: Arc<S>, collector: Collector<F>) -> Router {
    let scraping_state = Arc::new(ScrapingState {
        store: store.clone(),
        collector,
    });

    Router::new()
        .merge(record_routes(store))
        .merge(scraping_routes(scraping_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Bind `addr` and serve `router` until Ctrl-C.
pub async fn serve(addr: SocketAddr, router: Router) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    info!(addr = %local, "Listening on http://{local}/records, http://{local}/scraping");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C; shutting down");
        return;
    }
    info!("Ctrl-C received; shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrapers::ScraperConfig;
    use crate::scrapers::fetch::tests::ScriptedFetcher;
    use crate::store::JsonFileStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use tower::ServiceExt;

    fn test_app(dir: &tempfile::TempDir) -> Router {
        let store = Arc::new(JsonFileStore::new(dir.path().join("noticias.json")));
        let config = ScraperConfig {
            sources: vec!["https://a.example.com/".to_string()],
            ..ScraperConfig::default()
        };
        let collector = Collector::new(ScriptedFetcher::default(), &config).unwrap();
        app(store, collector)
    }

    #[tokio::test]
    async fn test_app_routes_records_and_scraping() {
        let dir = tempfile::tempdir().unwrap();

        let response = test_app(&dir)
            .oneshot(Request::builder().uri("/records").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = test_app(&dir)
            .oneshot(Request::builder().uri("/scraping").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_unknown_route_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(Request::builder().uri("/noticias").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cors_headers_present() {
        let dir = tempfile::tempdir().unwrap();
        let response = test_app(&dir)
            .oneshot(
                Request::builder()
                    .uri("/records")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    }
}
