use crate::dedup::{collapse_by_key, merge_existing_wins};
use crate::error::CatalogError;
use chrono::{DateTime, Duration, Utc};
use cinepick_models::MovieRecord;
use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const CATALOG_HEADER: [&str; 8] = [
    "title",
    "year",
    "rating",
    "genre",
    "description",
    "image_path",
    "large_image_path",
    "movie_url",
];

/// Result of merging a batch into the stored catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeSummary {
    pub added: usize,
    pub total: usize,
}

/// The CSV catalog file. Every write replaces the file atomically.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    path: PathBuf,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// All rows in file order. A missing file is an empty catalog; rows that
    /// cannot be decoded are logged and skipped.
    pub fn load(&self) -> Result<Vec<MovieRecord>, CatalogError> {
        if !self.exists() {
            debug!(path = ?self.path, "No catalog file yet");
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(&self.path)?;
        let mut records = Vec::new();
        let mut skipped = 0;
        for (row, result) in reader.deserialize::<MovieRecord>().enumerate() {
            match result {
                Ok(record) if !record.movie_url.trim().is_empty() => records.push(record),
                Ok(_) => skipped += 1,
                Err(e) => {
                    skipped += 1;
                    if skipped <= 5 {
                        warn!(row = row + 2, error = %e, "Skipping unreadable catalog row");
                    }
                }
            }
        }
        if skipped > 0 {
            warn!(skipped = skipped, path = ?self.path, "Catalog rows skipped while loading");
        }
        debug!(rows = records.len(), path = ?self.path, "Catalog loaded");
        Ok(records)
    }

    pub fn keys(&self) -> Result<HashSet<String>, CatalogError> {
        Ok(self.load()?.into_iter().map(|r| r.movie_url).collect())
    }

    pub fn find(&self, movie_url: &str) -> Result<Option<MovieRecord>, CatalogError> {
        Ok(self.load()?.into_iter().find(|r| r.movie_url == movie_url))
    }

    /// Replace the whole catalog with `records` (deduplicated by key, first wins).
    pub fn overwrite(&self, records: Vec<MovieRecord>) -> Result<usize, CatalogError> {
        let records = collapse_by_key(records);
        self.write_atomic(&records)?;
        info!(rows = records.len(), path = ?self.path, "Catalog overwritten");
        Ok(records.len())
    }

    /// Append rows whose key is not stored yet; stored rows are left unchanged.
    pub fn merge(&self, incoming: Vec<MovieRecord>) -> Result<MergeSummary, CatalogError> {
        let existing = self.load()?;
        let (merged, added) = merge_existing_wins(existing, incoming);
        self.write_atomic(&merged)?;
        info!(added = added, total = merged.len(), path = ?self.path, "Catalog merged");
        Ok(MergeSummary {
            added,
            total: merged.len(),
        })
    }

    /// Replace the stored row sharing `record.movie_url`.
    pub fn update_record(&self, record: &MovieRecord) -> Result<(), CatalogError> {
        let mut records = self.load()?;
        let slot = records
            .iter_mut()
            .find(|r| r.movie_url == record.movie_url)
            .ok_or_else(|| CatalogError::NotFound(record.movie_url.clone()))?;
        *slot = record.clone();
        self.write_atomic(&records)?;
        debug!(movie_url = %record.movie_url, "Catalog row updated");
        Ok(())
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        let modified = std::fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        Some(DateTime::<Utc>::from(modified))
    }

    /// Missing catalogs are always stale.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.last_updated() {
            Some(updated) => Utc::now() - updated > max_age,
            None => true,
        }
    }

    fn write_atomic(&self, records: &[MovieRecord]) -> Result<(), CatalogError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut temp = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(temp.as_file_mut());
            writer.write_record(CATALOG_HEADER)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
        }
        temp.as_file_mut().flush()?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path)?;
        Ok(())
    }
}
