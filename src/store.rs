//! Persistence of the record collection.
//!
//! The whole collection lives in one JSON file holding a single top-level
//! array. Every read parses the file from scratch and every write replaces it
//! wholesale; there is no cache and no partial update.
//!
//! # Concurrency
//!
//! Nothing serializes a read-modify-write cycle. Two writers that overlap will
//! each write back their own snapshot, and the later one wins. Writes go
//! through a temporary sibling file and a rename, so a reader sees either the
//! old collection or the new one, never a truncated file.

use crate::models::Record;
use rand::{Rng, rng};
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// What went wrong underneath a store operation.
#[derive(Debug, Error)]
pub enum StoreCause {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A failed load or save of the collection.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: StoreCause,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: StoreCause,
    },
}

impl StoreError {
    /// `true` when a read failed only because the backing file does not exist yet.
    pub fn is_missing(&self) -> bool {
        matches!(
            self,
            StoreError::Read { source: StoreCause::Io(e), .. } if e.kind() == io::ErrorKind::NotFound
        )
    }
}

/// Loads and saves the full collection.
///
/// Route handlers only talk to this trait, so the JSON file can be swapped for
/// another backend without touching them.
pub trait RecordStore: Send + Sync + 'static {
    /// Load every record, in order.
    ///
    /// # Errors
    /// [`StoreError::Read`] when the data is missing, unreadable or not a JSON
    /// array of objects. [`StoreError::is_missing`] tells the first case apart.
    fn read(&self) -> impl Future<Output = Result<Vec<Record>, StoreError>> + Send;

    /// Replace the stored collection with `records`.
    ///
    /// # Errors
    /// [`StoreError::Write`] when the collection cannot be serialized or saved;
    /// the previous collection is then left in place.
    fn write(&self, records: &[Record]) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A [`RecordStore`] backed by a single pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store over `path`.
    ///
    /// Nothing is touched on disk until the first read or write; a file that
    /// does not exist yet is created by the first write.
    ///
    /// # Arguments
    /// * `path` - the JSON data file, e.g. `noticias.json`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling path the next write is staged in.
    ///
    /// The random suffix keeps two overlapping writers from sharing a
    /// staging file.
    fn staging_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records.json".to_string());
        let suffix: u32 = rng().random();
        self.path.with_file_name(format!(".{name}.{suffix:08x}.tmp"))
    }

    fn read_error(&self, source: impl Into<StoreCause>) -> StoreError {
        StoreError::Read {
            path: self.path.clone(),
            source: source.into(),
        }
    }

    fn write_error(&self, source: impl Into<StoreCause>) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source: source.into(),
        }
    }
}

/// Remove a staging file left by a failed write, if one was created.
async fn discard_staging(staging: &Path) {
    match fs::remove_file(staging).await {
        Ok(()) => debug!(staging = %staging.display(), "Removed staging file"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(staging = %staging.display(), error = %e, "Failed to remove staging file"),
    }
}

impl RecordStore for JsonFileStore {
    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    async fn read(&self) -> Result<Vec<Record>, StoreError> {
        let text = fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.read_error(e))?;
        let records: Vec<Record> = serde_json::from_str(&text).map_err(|e| self.read_error(e))?;
        debug!(count = records.len(), "Loaded records");
        Ok(records)
    }

    #[instrument(level = "debug", skip_all, fields(path = %self.path.display(), count = records.len()))]
    async fn write(&self, records: &[Record]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records).map_err(|e| self.write_error(e))?;

        let staging = self.staging_path();
        let swapped = async {
            fs::write(&staging, json).await?;
            fs::rename(&staging, &self.path).await
        }
        .await;
        if let Err(e) = swapped {
            discard_staging(&staging).await;
            return Err(self.write_error(e));
        }

        info!(count = records.len(), "Wrote records");
        Ok(())
    }
}
