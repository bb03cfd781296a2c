use crate::catalog::CatalogStore;
use crate::dedup::collapse_by_key;
use crate::run::{ProgressCell, RunReporter};
use crate::sample::sample_catalog;
use anyhow::anyhow;
use cinepick_config::{Config, RunProfile};
use cinepick_models::{MovieRecord, RunKind, RunOutcome};
use cinepick_sources::{GenreTask, SessionLauncher, SessionPool, TaskEnv};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

const SETUP_SHARE: f64 = 0.05;
const SCRAPE_SHARE: f64 = 0.90;
const SAVING_PROGRESS: f64 = 0.95;

/// Scrape tuning shared by both run kinds.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub base_url: String,
    pub concurrency: usize,
    pub settle: Duration,
    pub full: RunProfile,
    pub quick: RunProfile,
}

impl ScrapeSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            base_url: config.scrape.base_url.clone(),
            concurrency: config.scrape.concurrency,
            settle: Duration::from_millis(config.scrape.settle_delay_ms),
            full: config.scrape.full.clone(),
            quick: config.scrape.quick.clone(),
        }
    }

    pub fn profile(&self, kind: RunKind) -> &RunProfile {
        match kind {
            RunKind::Full => &self.full,
            RunKind::Quick => &self.quick,
        }
    }
}

enum WorkerEvent {
    GenreDone {
        index: usize,
        genre: String,
        records: Vec<MovieRecord>,
    },
    LaunchFailed {
        worker: usize,
        message: String,
    },
}

enum Collected {
    Records(Vec<MovieRecord>),
    Stopped,
}

/// Fans genre tasks out over a bounded pool of browser sessions and persists the result.
pub struct Orchestrator {
    launcher: Arc<dyn SessionLauncher>,
    catalog: CatalogStore,
    env: TaskEnv,
    settings: ScrapeSettings,
}

impl Orchestrator {
    pub fn new(
        launcher: Arc<dyn SessionLauncher>,
        catalog: CatalogStore,
        env: TaskEnv,
        settings: ScrapeSettings,
    ) -> Self {
        Self {
            launcher,
            catalog,
            env,
            settings,
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn settings(&self) -> &ScrapeSettings {
        &self.settings
    }

    /// Execute one run to completion. Always ends by publishing an outcome
    /// through `reporter`; errors never escape.
    #[instrument(skip_all, fields(kind = %kind))]
    pub async fn run(&self, kind: RunKind, reporter: &RunReporter) -> RunOutcome {
        let start = Instant::now();
        let profile = self.settings.profile(kind).clone();
        let genres: Vec<String> = profile
            .genres
            .iter()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
            .collect();
        info!(
            operation = "run_start",
            genres = genres.len(),
            max_per_genre = profile.max_per_genre,
            concurrency = self.settings.concurrency,
            "Starting {}",
            kind.label()
        );

        let workers = self.settings.concurrency.max(1).min(genres.len().max(1));
        let pool = Arc::new(SessionPool::new(self.launcher.clone(), workers));

        let collected = self.collect(kind, &genres, profile.max_per_genre, &pool, reporter).await;

        // Sessions are released on every path before anything is written.
        pool.release_all().await;

        let outcome = match collected {
            Ok(Collected::Stopped) => RunOutcome::Stopped,
            Ok(Collected::Records(records)) => {
                if reporter.is_cancelled() {
                    RunOutcome::Stopped
                } else {
                    reporter.progress().update(SAVING_PROGRESS, "Saving catalog");
                    self.persist(kind, records)
                }
            }
            Err(e) if reporter.is_cancelled() => {
                warn!(
                    operation = "run_failed",
                    error = %e,
                    "{} failed after stop was requested",
                    kind.label()
                );
                RunOutcome::Stopped
            }
            Err(e) => {
                error!(operation = "run_failed", error = %e, "{} failed", kind.label());
                self.write_sample(kind);
                RunOutcome::Error { message: e.to_string() }
            }
        };

        info!(
            operation = "run_complete",
            status = %outcome.status(),
            elapsed_secs = start.elapsed().as_secs_f64(),
            "{} finished",
            kind.label()
        );
        reporter.finish(outcome.clone());
        outcome
    }

    async fn collect(
        &self,
        kind: RunKind,
        genres: &[String],
        max_per_genre: usize,
        pool: &Arc<SessionPool>,
        reporter: &RunReporter,
    ) -> anyhow::Result<Collected> {
        let progress = reporter.progress().clone();
        let cancel = reporter.cancel_token().clone();

        let existing_keys: HashSet<String> = match kind {
            RunKind::Quick => {
                progress.update(0.0, "Loading existing catalog");
                let keys = self.catalog.keys()?;
                info!(existing = keys.len(), "Loaded existing catalog keys");
                keys
            }
            RunKind::Full => HashSet::new(),
        };
        let existing_keys = Arc::new(existing_keys);

        if genres.is_empty() {
            return Ok(Collected::Records(Vec::new()));
        }

        let total = genres.len();
        progress.update(SETUP_SHARE, format!("Scraping {} genres", total));

        let queue: Arc<Mutex<VecDeque<(usize, String)>>> =
            Arc::new(Mutex::new(genres.iter().cloned().enumerate().collect()));
        let fractions: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(vec![0.0; total]));
        let (tx, mut rx) = mpsc::unbounded_channel::<WorkerEvent>();
        let mut workers = JoinSet::new();

        for worker in 0..pool.workers() {
            let ctx = WorkerContext {
                worker,
                pool: pool.clone(),
                queue: queue.clone(),
                fractions: fractions.clone(),
                progress: progress.clone(),
                cancel: cancel.clone(),
                env: self.env.clone(),
                existing_keys: existing_keys.clone(),
                base_url: self.settings.base_url.clone(),
                settle: self.settings.settle,
                max_per_genre,
                tx: tx.clone(),
            };
            workers.spawn(ctx.run());
        }
        drop(tx);

        let mut records: Vec<MovieRecord> = Vec::new();
        let mut completed = 0;
        let mut stopped = false;

        while let Some(event) = rx.recv().await {
            if cancel.is_cancelled() {
                info!("Stop requested; no further genre results will be consumed");
                stopped = true;
                break;
            }
            match event {
                WorkerEvent::GenreDone { index, genre, records: batch } => {
                    completed += 1;
                    let share = {
                        let mut fractions = fractions.lock().unwrap_or_else(|e| e.into_inner());
                        fractions[index] = 1.0;
                        fractions.iter().sum::<f64>() / total as f64
                    };
                    debug!(genre = %genre, movies = batch.len(), "Genre batch collected");
                    records.extend(batch);
                    progress.update(
                        SETUP_SHARE + SCRAPE_SHARE * share,
                        format!(
                            "Scraped {} ({}/{} genres, {} movies)",
                            genre,
                            completed,
                            total,
                            records.len()
                        ),
                    );
                }
                WorkerEvent::LaunchFailed { worker, message } => {
                    workers.abort_all();
                    while workers.join_next().await.is_some() {}
                    return Err(anyhow!(
                        "Browser could not be started (worker {}): {}",
                        worker,
                        message
                    ));
                }
            }
        }
        drop(rx);

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    warn!("Genre worker panicked: {}", e);
                }
            }
        }

        if stopped || cancel.is_cancelled() {
            return Ok(Collected::Stopped);
        }

        let before = records.len();
        let records = collapse_by_key(records);
        info!(
            collected = records.len(),
            cross_genre_duplicates = before - records.len(),
            "All genres scraped"
        );
        Ok(Collected::Records(records))
    }

    fn persist(&self, kind: RunKind, records: Vec<MovieRecord>) -> RunOutcome {
        if records.is_empty() {
            if self.write_sample(kind) {
                warn!(operation = "persist", "No movies collected; sample catalog written");
                return RunOutcome::EmptyFallback;
            }
            info!(operation = "persist", "No new movies found; catalog unchanged");
            return RunOutcome::Completed {
                collected: 0,
                written: 0,
            };
        }

        let collected = records.len();
        let written = match kind {
            RunKind::Full => self.catalog.overwrite(records),
            RunKind::Quick => self.catalog.merge(records).map(|summary| summary.added),
        };

        match written {
            Ok(written) => RunOutcome::Completed { collected, written },
            Err(e) => {
                error!(operation = "persist", error = %e, "Failed to save catalog");
                self.write_sample(kind);
                RunOutcome::Error { message: e.to_string() }
            }
        }
    }

    /// Full rebuilds always fall back to the sample; quick updates only when no catalog exists.
    /// Returns whether the sample landed on disk.
    fn write_sample(&self, kind: RunKind) -> bool {
        if kind == RunKind::Quick && self.catalog.exists() {
            debug!("Existing catalog kept; sample catalog not written");
            return false;
        }
        match self.catalog.overwrite(sample_catalog()) {
            Ok(rows) => {
                info!(rows = rows, path = ?self.catalog.path(), "Sample catalog written");
                true
            }
            Err(e) => {
                error!(error = %e, "Failed to write sample catalog");
                false
            }
        }
    }
}

struct WorkerContext {
    worker: usize,
    pool: Arc<SessionPool>,
    queue: Arc<Mutex<VecDeque<(usize, String)>>>,
    fractions: Arc<Mutex<Vec<f64>>>,
    progress: ProgressCell,
    cancel: CancellationToken,
    env: TaskEnv,
    existing_keys: Arc<HashSet<String>>,
    base_url: String,
    settle: Duration,
    max_per_genre: usize,
    tx: mpsc::UnboundedSender<WorkerEvent>,
}

impl WorkerContext {
    async fn run(self) {
        loop {
            if self.cancel.is_cancelled() {
                debug!(worker = self.worker, "Stop requested; worker takes no further genres");
                break;
            }
            let next = self.queue.lock().unwrap_or_else(|e| e.into_inner()).pop_front();
            let Some((index, genre)) = next else {
                break;
            };

            let mut lease = match self.pool.acquire(self.worker).await {
                Ok(lease) => lease,
                Err(e) => {
                    let _ = self.tx.send(WorkerEvent::LaunchFailed {
                        worker: self.worker,
                        message: e.to_string(),
                    });
                    break;
                }
            };

            let task = GenreTask {
                genre: genre.clone(),
                max_items: self.max_per_genre,
                existing_keys: self.existing_keys.clone(),
                base_url: self.base_url.clone(),
                settle: self.settle,
            };
            let total_genres = self
                .fractions
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .len()
                .max(1);
            let on_movie = |_: &str, done: usize, total: usize| {
                let share = {
                    let mut fractions = self.fractions.lock().unwrap_or_else(|e| e.into_inner());
                    fractions[index] = done as f64 / total.max(1) as f64;
                    fractions.iter().sum::<f64>() / total_genres as f64
                };
                self.progress.advance(SETUP_SHARE + SCRAPE_SHARE * share);
            };

            let records = task.run(&mut lease, &self.env, &self.cancel, &on_movie).await;
            drop(lease);

            if self.tx.send(WorkerEvent::GenreDone { index, genre, records }).is_err() {
                break;
            }
        }
    }
}
