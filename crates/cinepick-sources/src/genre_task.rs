use crate::debug::HtmlCapture;
use crate::extract::extract_listing;
use crate::images::{poster_path, ImageStore};
use crate::progress::{ProgressSink, ProgressTracker};
use crate::session::BrowserSession;
use cinepick_models::{MovieRecord, PLACEHOLDER_DESCRIPTION};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Scrape one genre listing page into placeholder-description records.
#[derive(Debug, Clone)]
pub struct GenreTask {
    pub genre: String,
    pub max_items: usize,
    pub existing_keys: Arc<HashSet<String>>,
    pub base_url: String,
    pub settle: Duration,
}

/// Side-effect collaborators shared by every genre task of a run.
#[derive(Clone)]
pub struct TaskEnv {
    /// `None` disables poster downloads.
    pub images: Option<ImageStore>,
    pub capture: HtmlCapture,
}

impl GenreTask {
    pub fn listing_url(&self) -> String {
        format!("{}/films/genre/{}/size/small/", self.base_url.trim_end_matches('/'), self.genre)
    }

    /// Never fails: navigation errors yield an empty batch for this genre only,
    /// and cancellation returns whatever was collected so far.
    pub async fn run(
        &self,
        session: &mut dyn BrowserSession,
        env: &TaskEnv,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Vec<MovieRecord> {
        if cancel.is_cancelled() {
            debug!(genre = %self.genre, "Run stopped before genre started");
            return Vec::new();
        }

        let url = self.listing_url();
        info!(genre = %self.genre, url = %url, "Scraping genre listing");
        let html = match session.fetch_html(&url, self.settle).await {
            Ok(html) => html,
            Err(e) => {
                warn!(genre = %self.genre, error = %e, "Genre listing failed; skipping genre");
                return Vec::new();
            }
        };

        let candidates = extract_listing(&html, self.max_items);
        if candidates.is_empty() {
            warn!(genre = %self.genre, "No movies found on genre listing");
            env.capture.capture(&format!("genre_{}", self.genre), &html).await;
            return Vec::new();
        }

        let total = candidates.len();
        let mut tracker = ProgressTracker::new(format!("Genre {}", self.genre), total);
        let mut records = Vec::with_capacity(total);

        for (idx, candidate) in candidates.into_iter().enumerate() {
            if cancel.is_cancelled() {
                tracker.record_stopped();
                break;
            }

            if self.existing_keys.contains(&candidate.movie_url) {
                tracker.record_already_known();
                progress.movie_done(&self.genre, idx + 1, total);
                continue;
            }

            let image_path = match (&env.images, &candidate.poster_url) {
                (Some(images), Some(poster_url)) => {
                    let relative = poster_path(&candidate.title, &candidate.year);
                    match images.download(poster_url, &relative).await {
                        Ok(saved) => Some(saved),
                        Err(e) => {
                            warn!(
                                genre = %self.genre,
                                movie_url = %candidate.movie_url,
                                error = %e,
                                "Poster download failed"
                            );
                            tracker.record_image_failure("poster download");
                            None
                        }
                    }
                }
                _ => None,
            };

            records.push(MovieRecord {
                title: candidate.title,
                year: candidate.year,
                rating: candidate.rating,
                genre: self.genre.clone(),
                description: PLACEHOLDER_DESCRIPTION.to_string(),
                image_path,
                large_image_path: None,
                movie_url: candidate.movie_url,
            });
            tracker.record_collected();
            progress.movie_done(&self.genre, idx + 1, total);
        }

        tracker.log_summary();
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::images::ImageFetcher;
    use crate::progress::NoProgress;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct FixtureSession {
        pages: HashMap<String, String>,
        visited: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl BrowserSession for FixtureSession {
        async fn fetch_html(
            &mut self,
            url: &str,
            _settle: Duration,
        ) -> Result<String, SourceError> {
            self.visited.lock().unwrap().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| SourceError::navigation(url, "404"))
        }

        async fn close(&mut self) -> Result<(), SourceError> {
            Ok(())
        }
    }

    struct FixtureImages;

    #[async_trait]
    impl ImageFetcher for FixtureImages {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>, SourceError> {
            if url.contains("broken") {
                Err(SourceError::image(url, "HTTP 500"))
            } else {
                Ok(vec![1, 2, 3])
            }
        }
    }

    fn listing(films: &[(&str, &str, &str)]) -> String {
        let items: String = films
            .iter()
            .map(|(title, slug, img)| {
                format!(
                    r#"<li class="poster-container">
                    <div class="film-poster" data-film-name="{title}">
                      <img src="https://a.ltrbxd.com/{img}.jpg">
                      <a class="frame" href="/film/{slug}/"
                         data-original-title="{title} (2001) 3.5">
                        <span class="frame-title">{title} (2001)</span></a></div></li>"#
                )
            })
            .collect();
        format!("<html><body><ul>{}</ul></body></html>", items)
    }

    fn task(genre: &str, existing: &[&str]) -> GenreTask {
        GenreTask {
            genre: genre.to_string(),
            max_items: 10,
            existing_keys: Arc::new(existing.iter().map(|s| s.to_string()).collect()),
            base_url: "https://letterboxd.test".to_string(),
            settle: Duration::ZERO,
        }
    }

    fn session_with(url: &str, html: String) -> (FixtureSession, Arc<Mutex<Vec<String>>>) {
        let visited = Arc::new(Mutex::new(Vec::new()));
        let mut pages = HashMap::new();
        pages.insert(url.to_string(), html);
        (
            FixtureSession {
                pages,
                visited: visited.clone(),
            },
            visited,
        )
    }

    fn env(dir: &std::path::Path) -> TaskEnv {
        TaskEnv {
            images: Some(ImageStore::new(dir, Arc::new(FixtureImages))),
            capture: HtmlCapture::disabled(),
        }
    }

    #[test]
    fn test_listing_url() {
        assert_eq!(
            task("science-fiction", &[]).listing_url(),
            "https://letterboxd.test/films/genre/science-fiction/size/small/"
        );
    }

    #[tokio::test]
    async fn test_run_collects_placeholder_records() {
        let dir = tempfile::tempdir().unwrap();
        let task = task("action", &[]);
        let (mut session, _) = session_with(
            &task.listing_url(),
            listing(&[("Heat", "heat", "heat"), ("Ronin", "ronin", "ronin")]),
        );

        let records = task
            .run(&mut session, &env(dir.path()), &CancellationToken::new(), &NoProgress)
            .await;

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].movie_url, "/film/heat/");
        assert_eq!(records[0].genre, "action");
        assert_eq!(records[0].description, "Details");
        assert_eq!(records[0].rating, 3.5);
        assert_eq!(records[0].image_path.as_deref(), Some("images/Heat_2001.jpg"));
        assert!(dir.path().join("images/Heat_2001.jpg").exists());
    }

    #[tokio::test]
    async fn test_existing_keys_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let task = task("drama", &["/film/heat/"]);
        let (mut session, _) = session_with(
            &task.listing_url(),
            listing(&[("Heat", "heat", "heat"), ("Ronin", "ronin", "ronin")]),
        );

        let records = task
            .run(&mut session, &env(dir.path()), &CancellationToken::new(), &NoProgress)
            .await;

        assert_eq!(records.len(), 1);
        assert!(records.iter().all(|r| r.movie_url != "/film/heat/"));
        assert!(!dir.path().join("images/Heat_2001.jpg").exists());
    }

    #[tokio::test]
    async fn test_image_failure_keeps_record() {
        let dir = tempfile::tempdir().unwrap();
        let task = task("horror", &[]);
        let (mut session, _) =
            session_with(&task.listing_url(), listing(&[("Alien", "alien", "broken")]));

        let records = task
            .run(&mut session, &env(dir.path()), &CancellationToken::new(), &NoProgress)
            .await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].image_path, None);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_skips_navigation() {
        let dir = tempfile::tempdir().unwrap();
        let task = task("action", &[]);
        let (mut session, visited) =
            session_with(&task.listing_url(), listing(&[("Heat", "heat", "heat")]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let records = task.run(&mut session, &env(dir.path()), &cancel, &NoProgress).await;

        assert!(records.is_empty());
        assert!(visited.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_mid_listing_returns_partial_batch() {
        let dir = tempfile::tempdir().unwrap();
        let task = task("action", &[]);
        let (mut session, _) = session_with(
            &task.listing_url(),
            listing(&[
                ("Heat", "heat", "heat"),
                ("Ronin", "ronin", "ronin"),
                ("Thief", "thief", "thief"),
            ]),
        );
        let cancel = CancellationToken::new();
        let stop_after_first = |_: &str, done: usize, _: usize| {
            if done == 1 {
                cancel.cancel();
            }
        };

        let records = task.run(&mut session, &env(dir.path()), &cancel, &stop_after_first).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Heat");
    }

    #[tokio::test]
    async fn test_navigation_failure_yields_empty_batch() {
        let dir = tempfile::tempdir().unwrap();
        let task = task("western", &[]);
        let (mut session, _) = session_with("https://elsewhere.test/", String::new());

        let records = task
            .run(&mut session, &env(dir.path()), &CancellationToken::new(), &NoProgress)
            .await;

        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_progress_reports_each_candidate() {
        let task = task("comedy", &["/film/ronin/"]);
        let (mut session, _) = session_with(
            &task.listing_url(),
            listing(&[("Heat", "heat", "heat"), ("Ronin", "ronin", "ronin")]),
        );
        let seen = Mutex::new(Vec::new());
        let sink = |_: &str, done: usize, total: usize| seen.lock().unwrap().push((done, total));
        let env = TaskEnv {
            images: None,
            capture: HtmlCapture::disabled(),
        };

        let records = task.run(&mut session, &env, &CancellationToken::new(), &sink).await;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].image_path, None);
        assert_eq!(*seen.lock().unwrap(), vec![(1, 2), (2, 2)]);
    }
}
