//! News collector that fills the data file from listing pages.
//!
//! Collection runs in two phases:
//!
//! 1. **Fetching**: download every configured listing page concurrently,
//!    retrying transient failures with backoff ([`fetch`])
//! 2. **Extraction**: turn each page's teasers into records ([`listing`])
//!
//! The records from all pages are concatenated in source order, duplicates by
//! link are dropped, and the result replaces the stored collection wholesale.
//!
//! # Configuration
//!
//! Everything is driven by a YAML file; every key is optional:
//!
//! ```yaml
//! sources:
//!   - https://elpais.com/ultimas-noticias/
//! selectors:
//!   item: article
//!   title: h2
//!   image: img
//!   description: p
//!   link: a[href]
//! concurrency: 4
//! max_retries: 3
//! base_delay_ms: 500
//! timeout_secs: 20
//! ```

pub mod fetch;
pub mod listing;

use crate::models::Record;
use crate::store::{RecordStore, StoreError};
use fetch::{FetchPage, HttpFetcher, RetryFetch};
use futures::stream::{self, StreamExt};
use itertools::Itertools;
use listing::{ListingSelectors, extract_records};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("empty page at {url}")]
    EmptyPage { url: String },
    #[error("invalid source URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid CSS selector {0}")]
    Selector(String),
    #[error("failed to read scraper config {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid scraper config: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
    #[error("no sources configured")]
    NoSources,
    #[error("all {attempted} sources failed")]
    AllSourcesFailed { attempted: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// CSS selectors locating a teaser and its parts.
///
/// `title`, `image`, `description` and `link` are matched inside each `item`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub item: String,
    pub title: String,
    pub image: String,
    pub description: String,
    pub link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            item: "article".to_string(),
            title: "h2".to_string(),
            image: "img".to_string(),
            description: "p".to_string(),
            link: "a[href]".to_string(),
        }
    }
}

/// Collector settings, usually loaded from YAML.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Listing pages to scrape, in output order.
    pub sources: Vec<String>,
    pub selectors: SelectorConfig,
    /// How many pages are fetched at once.
    pub concurrency: usize,
    /// Retries per page after the first attempt.
    pub max_retries: usize,
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            sources: vec!["https://elpais.com/ultimas-noticias/".to_string()],
            selectors: SelectorConfig::default(),
            concurrency: 4,
            max_retries: 3,
            base_delay_ms: 500,
            timeout_secs: 20,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ScrapeError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, ScrapeError> {
        let yaml = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ScrapeError::ConfigRead {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_yaml(&yaml)?;
        info!(sources = config.sources.len(), "Loaded scraper config");
        Ok(config)
    }

    /// Load from `path` if given, otherwise use the defaults.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, ScrapeError> {
        match path {
            Some(path) => Self::load(path).await,
            None => Ok(Self::default()),
        }
    }
}

/// Fetches listing pages and turns them into records.
#[derive(Debug)]
pub struct Collector<F> {
    fetcher: F,
    sources: Vec<Url>,
    selectors: ListingSelectors,
    concurrency: usize,
}

impl Collector<RetryFetch<HttpFetcher>> {
    /// A collector that fetches over HTTP with the configured retry policy.
    pub fn from_config(config: &ScraperConfig) -> Result<Self, ScrapeError> {
        let http = HttpFetcher::new(&config.user_agent, Duration::from_secs(config.timeout_secs))?;
        let fetcher = RetryFetch::new(
            http,
            config.max_retries,
            Duration::from_millis(config.base_delay_ms),
        );
        Self::new(fetcher, config)
    }
}

impl<F: FetchPage> Collector<F> {
    /// Build a collector around any page fetcher.
    ///
    /// # Arguments
    /// * `fetcher` - fetches one listing page, retrying if it wants to
    /// * `config` - sources, selectors and concurrency
    ///
    /// # Errors
    /// [`ScrapeError::NoSources`] for an empty source list,
    /// [`ScrapeError::InvalidUrl`] for a source that is not an absolute URL and
    /// [`ScrapeError::Selector`] for a selector that does not compile.
    pub fn new(fetcher: F, config: &ScraperConfig) -> Result<Self, ScrapeError> {
        if config.sources.is_empty() {
            return Err(ScrapeError::NoSources);
        }
        let sources = config
            .sources
            .iter()
            .map(|raw| {
                Url::parse(raw).map_err(|source| ScrapeError::InvalidUrl {
                    url: raw.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            fetcher,
            sources,
            selectors: ListingSelectors::compile(&config.selectors)?,
            concurrency: config.concurrency.max(1),
        })
    }

    /// Scrape every source and return the combined records.
    ///
    /// A source that still fails after retries is logged and skipped. Only
    /// when every source fails is the whole collection an error.
    #[instrument(level = "info", skip_all, fields(sources = self.sources.len()))]
    pub async fn collect(&self) -> Result<Vec<Record>, ScrapeError> {
        let pages: Vec<(Url, Result<Vec<Record>, ScrapeError>)> = stream::iter(self.sources.clone())
            .map(|url| async move {
                let result = self
                    .fetcher
                    .fetch(url.as_str())
                    .await
                    .map(|html| extract_records(&html, &url, &self.selectors));
                (url, result)
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let attempted = pages.len();
        let mut failed = 0usize;
        let mut records = Vec::new();
        for (url, result) in pages {
            match result {
                Ok(found) => {
                    debug!(%url, count = found.len(), "Scraped listing page");
                    if found.is_empty() {
                        warn!(%url, "No items matched on listing page");
                    }
                    records.extend(found);
                }
                Err(e) => {
                    failed += 1;
                    error!(%url, error = %e, "Listing page failed; skipping");
                }
            }
        }

        if failed == attempted {
            return Err(ScrapeError::AllSourcesFailed { attempted });
        }

        let scraped = records.len();
        let records: Vec<Record> = records
            .into_iter()
            .enumerate()
            .unique_by(|(i, r)| r.enlace_str().map(str::to_owned).ok_or(*i))
            .map(|(_, r)| r)
            .collect();

        info!(
            attempted,
            failed,
            scraped,
            kept = records.len(),
            "Collected records"
        );
        Ok(records)
    }

    /// Collect, then replace the stored collection with the result.
    ///
    /// Nothing is written when collection fails.
    #[instrument(level = "info", skip_all)]
    pub async fn refresh<S: RecordStore>(&self, store: &S) -> Result<Vec<Record>, ScrapeError> {
        let records = self.collect().await?;
        store.write(&records).await?;
        info!(count = records.len(), "Replaced stored collection with scraped records");
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use fetch::tests::ScriptedFetcher;
    use serde_json::json;

    const PAGE_A: &str = r#"
        <article><h2><a href="/a1">Primera</a></h2><p>Uno</p></article>
        <article><h2><a href="/a2">Segunda</a></h2></article>
    "#;
    const PAGE_B: &str = r#"
        <article><h2><a href="https://a.example.com/a2">Segunda otra vez</a></h2></article>
        <article><h2>Sin enlace</h2></article>
        <article><h2>Sin enlace tampoco</h2></article>
    "#;

    fn config(sources: &[&str]) -> ScraperConfig {
        ScraperConfig {
            sources: sources.iter().map(|s| s.to_string()).collect(),
            ..ScraperConfig::default()
        }
    }

    #[test]
    fn test_config_from_partial_yaml() {
        let yaml = r#"
sources:
  - https://a.example.com/
  - https://b.example.com/portada
selectors:
  item: div.teaser
concurrency: 2
"#;
        let config = ScraperConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.selectors.item, "div.teaser");
        assert_eq!(config.selectors.title, "h2");
        assert_eq!(config.concurrency, 2);
        assert_eq!(config.max_retries, 3);
    }

    #[test]
    fn test_config_empty_yaml_is_default() {
        assert_eq!(ScraperConfig::from_yaml("").unwrap(), ScraperConfig::default());
    }

    #[test]
    fn test_config_bad_yaml() {
        let err = ScraperConfig::from_yaml("sources: [unterminated").unwrap_err();
        assert!(matches!(err, ScrapeError::ConfigParse(_)));
    }

    #[tokio::test]
    async fn test_config_load_missing_file() {
        let err = ScraperConfig::load(Path::new("/definitely/not/here.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::ConfigRead { .. }));
    }

    #[test]
    fn test_collector_rejects_bad_sources() {
        let err = Collector::new(ScriptedFetcher::default(), &config(&[])).unwrap_err();
        assert!(matches!(err, ScrapeError::NoSources));

        let err = Collector::new(ScriptedFetcher::default(), &config(&["not a url"])).unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_collect_keeps_source_order_and_drops_duplicate_links() {
        let fetcher = ScriptedFetcher::default()
            .with_page("https://a.example.com/", PAGE_A)
            .with_page("https://b.example.com/", PAGE_B);
        let collector = Collector::new(
            fetcher,
            &config(&["https://a.example.com/", "https://b.example.com/"]),
        )
        .unwrap();

        let records = collector.collect().await.unwrap();
        let titles: Vec<_> = records.iter().map(|r| r.titulo.clone().unwrap()).collect();
        assert_eq!(
            titles,
            vec![
                json!("Primera"),
                json!("Segunda"),
                json!("Sin enlace"),
                json!("Sin enlace tampoco"),
            ]
        );
    }

    #[tokio::test]
    async fn test_collect_skips_failed_source() {
        let fetcher = ScriptedFetcher::default().with_page("https://a.example.com/", PAGE_A);
        let collector = Collector::new(
            fetcher,
            &config(&["https://a.example.com/", "https://down.example.com/"]),
        )
        .unwrap();

        let records = collector.collect().await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn test_collect_fails_when_every_source_fails() {
        let collector = Collector::new(
            ScriptedFetcher::default(),
            &config(&["https://down.example.com/", "https://also-down.example.com/"]),
        )
        .unwrap();

        let err = collector.collect().await.unwrap_err();
        assert!(matches!(err, ScrapeError::AllSourcesFailed { attempted: 2 }));
    }

    #[tokio::test]
    async fn test_refresh_replaces_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("noticias.json"));
        store
            .write(&[Record::from_text(Some("vieja".into()), None, None, None)])
            .await
            .unwrap();

        let fetcher = ScriptedFetcher::default().with_page("https://a.example.com/", PAGE_A);
        let collector = Collector::new(fetcher, &config(&["https://a.example.com/"])).unwrap();

        let records = collector.refresh(&store).await.unwrap();
        assert_eq!(store.read().await.unwrap(), records);
        assert_eq!(records[0].enlace_str(), Some("https://a.example.com/a1"));
    }

    #[tokio::test]
    async fn test_refresh_writes_nothing_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("noticias.json"));

        let collector =
            Collector::new(ScriptedFetcher::default(), &config(&["https://down.example.com/"])).unwrap();

        assert!(collector.refresh(&store).await.is_err());
        assert!(!store.path().exists());
    }
}
