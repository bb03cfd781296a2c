use crate::debug::HtmlCapture;
use crate::extract::extract_detail;
use crate::session::SessionLauncher;
use cinepick_models::{DetailResult, NO_DESCRIPTION};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Fetches a single film page with a session of its own, outside the bulk pool.
pub struct DetailFetcher {
    launcher: Arc<dyn SessionLauncher>,
    base_url: String,
    settle: Duration,
    capture: HtmlCapture,
}

impl DetailFetcher {
    pub fn new(
        launcher: Arc<dyn SessionLauncher>,
        base_url: impl Into<String>,
        settle: Duration,
        capture: HtmlCapture,
    ) -> Self {
        Self {
            launcher,
            base_url: base_url.into(),
            settle,
            capture,
        }
    }

    pub fn page_url(&self, movie_url: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if movie_url.starts_with('/') {
            format!("{}{}", base, movie_url)
        } else {
            format!("{}/{}", base, movie_url)
        }
    }

    /// Never returns an error: any failure produces [`DetailResult::error`], which
    /// callers must treat as "retry later".
    pub async fn fetch(&self, movie_url: &str) -> DetailResult {
        let url = self.page_url(movie_url);

        let mut session = match self.launcher.launch().await {
            Ok(session) => session,
            Err(e) => {
                warn!(
                    movie_url = %movie_url,
                    error = %e,
                    "Could not start browser for detail fetch"
                );
                return DetailResult::error(movie_url);
            }
        };

        let html = session.fetch_html(&url, self.settle).await;

        if let Err(e) = session.close().await {
            warn!(movie_url = %movie_url, error = %e, "Failed to close detail browser");
        }

        match html {
            Ok(html) => {
                let detail = extract_detail(&html, movie_url);
                if detail.description == NO_DESCRIPTION {
                    self.capture.capture(&format!("detail_{}", movie_url), &html).await;
                }
                info!(
                    movie_url = %movie_url,
                    has_large_image = detail.large_image_url.is_some(),
                    "Fetched movie details"
                );
                detail
            }
            Err(e) => {
                warn!(movie_url = %movie_url, error = %e, "Detail page failed to load");
                DetailResult::error(movie_url)
            }
        }
    }
}
