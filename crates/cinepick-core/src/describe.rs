use crate::catalog::CatalogStore;
use crate::error::{CatalogError, ServiceError};
use cinepick_models::{DetailResult, MovieRecord};
use cinepick_sources::{large_poster_path, DetailFetcher, ImageStore};
use serde::Serialize;
use tracing::{debug, info, warn};

/// What the serving side shows for one movie.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DescribeResponse {
    pub title: String,
    pub year: String,
    pub description: String,
    pub large_image_path: Option<String>,
    pub letterboxd_url: String,
}

/// Lazily completes catalog rows with detail-page data.
pub struct DetailService {
    catalog: CatalogStore,
    fetcher: DetailFetcher,
    images: Option<ImageStore>,
}

impl DetailService {
    pub fn new(catalog: CatalogStore, fetcher: DetailFetcher, images: Option<ImageStore>) -> Self {
        Self {
            catalog,
            fetcher,
            images,
        }
    }

    pub async fn fetch_detail(&self, movie_url: &str) -> DetailResult {
        self.fetcher.fetch(movie_url).await
    }

    /// Return the stored description, fetching the detail page first when the
    /// row still holds a placeholder or lacks its large poster.
    ///
    /// A fetch error is shown to the caller but never stored, so the next call retries.
    pub async fn describe(&self, movie_url: &str) -> Result<DescribeResponse, ServiceError> {
        let mut record = self
            .catalog
            .find(movie_url)?
            .ok_or_else(|| CatalogError::NotFound(movie_url.to_string()))?;

        let needs_description = record.needs_details();
        let needs_large_image = self.images.is_some() && !self.has_large_image(&record);
        if !needs_description && !needs_large_image {
            debug!(movie_url = %movie_url, "Serving cached description");
            return Ok(Self::response(&record, record.letterboxd_url(), record.description.clone()));
        }

        let detail = self.fetcher.fetch(movie_url).await;
        if detail.is_error() {
            warn!(movie_url = %movie_url, "Detail fetch failed; catalog row left unchanged");
            let shown = if needs_description {
                detail.description.clone()
            } else {
                record.description.clone()
            };
            return Ok(Self::response(&record, record.letterboxd_url(), shown));
        }

        let mut changed = false;
        if needs_description {
            record.description = detail.description.clone();
            changed = true;
        }
        if needs_large_image {
            changed |= self.attach_large_image(&mut record, &detail).await;
        }

        if changed {
            self.catalog.update_record(&record)?;
            info!(movie_url = %movie_url, "Catalog row completed with details");
        }

        Ok(Self::response(&record, detail.letterboxd_url.clone(), record.description.clone()))
    }

    fn has_large_image(&self, record: &MovieRecord) -> bool {
        match (&self.images, &record.large_image_path) {
            (Some(images), Some(path)) => images.exists(path),
            _ => false,
        }
    }

    /// Download the large poster unless the target file already exists.
    async fn attach_large_image(&self, record: &mut MovieRecord, detail: &DetailResult) -> bool {
        let Some(images) = &self.images else {
            return false;
        };

        let relative = large_poster_path(&record.title, &record.year);
        if images.exists(&relative) {
            record.large_image_path = Some(relative);
            return true;
        }

        let Some(url) = &detail.large_image_url else {
            record.large_image_path = None;
            return false;
        };
        match images.download(url, &relative).await {
            Ok(saved) => {
                record.large_image_path = Some(saved);
                true
            }
            Err(e) => {
                warn!(movie_url = %record.movie_url, error = %e, "Large poster download failed");
                false
            }
        }
    }

    fn response(
        record: &MovieRecord,
        letterboxd_url: String,
        description: String,
    ) -> DescribeResponse {
        DescribeResponse {
            title: record.title.clone(),
            year: record.year.clone(),
            description,
            large_image_path: record.large_image_path.clone(),
            letterboxd_url,
        }
    }
}
