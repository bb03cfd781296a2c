use crate::catalog::CatalogStore;
use crate::describe::{DescribeResponse, DetailService};
use crate::error::ServiceError;
use crate::orchestrator::{Orchestrator, ScrapeSettings};
use crate::run::{RunHandle, RunReporter};
use cinepick_config::{Config, PathManager};
use cinepick_models::{DetailResult, ProgressState, RunKind, RunOutcome};
use cinepick_sources::{
    ChromiumLauncher, DetailFetcher, HtmlCapture, ImageStore, ReqwestImageFetcher, SessionLauncher,
    TaskEnv,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// Entry point for callers: starts at most one scrape run at a time and
/// serves detail lookups against the same catalog.
pub struct ScrapeService {
    orchestrator: Arc<Orchestrator>,
    details: DetailService,
    active: Mutex<Option<RunHandle>>,
}

impl ScrapeService {
    pub fn new(orchestrator: Orchestrator, details: DetailService) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            details,
            active: Mutex::new(None),
        }
    }

    /// Wire up the Chromium-backed pipeline described by `config`.
    pub fn from_config(config: &Config, paths: &PathManager) -> Result<Self, ServiceError> {
        let launcher: Arc<dyn SessionLauncher> = Arc::new(ChromiumLauncher::new(
            config.browser.clone(),
            paths.data_dir().join("chromium"),
        ));
        Self::with_launcher(config, paths, launcher)
    }

    /// Same as [`ScrapeService::from_config`] with a caller-supplied browser launcher.
    pub fn with_launcher(
        config: &Config,
        paths: &PathManager,
        launcher: Arc<dyn SessionLauncher>,
    ) -> Result<Self, ServiceError> {
        let settings = ScrapeSettings::from_config(config);
        let catalog = CatalogStore::new(config.catalog_file(paths));
        let capture = HtmlCapture::new(config.debug.capture_html, config.debug_dir(paths));

        let images = if config.scrape.download_images {
            let fetcher = Arc::new(ReqwestImageFetcher::new()?);
            Some(ImageStore::new(config.static_dir(paths), fetcher))
        } else {
            None
        };

        let fetcher = DetailFetcher::new(
            launcher.clone(),
            settings.base_url.clone(),
            settings.settle,
            capture.clone(),
        );
        let details = DetailService::new(catalog.clone(), fetcher, images.clone());
        let env = TaskEnv { images, capture };

        Ok(Self::new(Orchestrator::new(launcher, catalog, env, settings), details))
    }

    pub fn catalog(&self) -> &CatalogStore {
        self.orchestrator.catalog()
    }

    /// Start a run in the background. Fails with `AlreadyRunning` while another run is live.
    pub fn start_run(&self, kind: RunKind) -> Result<RunHandle, ServiceError> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = active.as_ref() {
            if !current.is_finished() {
                warn!(
                    requested = %kind,
                    running = %current.kind(),
                    "Run rejected; another run is active"
                );
                return Err(ServiceError::AlreadyRunning(current.kind().to_string()));
            }
        }

        let (handle, reporter) = RunHandle::new(kind);
        let orchestrator = self.orchestrator.clone();
        tokio::spawn(drive(orchestrator, kind, reporter));

        info!(kind = %kind, "{} started", kind.label());
        *active = Some(handle.clone());
        Ok(handle)
    }

    pub fn active_run(&self) -> Option<RunHandle> {
        self.active.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Progress of the current or most recent run; the default state when none has started.
    pub fn progress(&self) -> ProgressState {
        self.active_run().map(|run| run.progress()).unwrap_or_default()
    }

    /// Returns false when no run is active.
    pub fn request_stop(&self) -> bool {
        match self.active_run() {
            Some(run) if !run.is_finished() => {
                info!(kind = %run.kind(), "Stop requested");
                run.request_stop();
                true
            }
            _ => false,
        }
    }

    pub async fn fetch_detail(&self, movie_url: &str) -> DetailResult {
        self.details.fetch_detail(movie_url).await
    }

    pub async fn describe(&self, movie_url: &str) -> Result<DescribeResponse, ServiceError> {
        self.details.describe(movie_url).await
    }
}

async fn drive(orchestrator: Arc<Orchestrator>, kind: RunKind, reporter: RunReporter) {
    let result = AssertUnwindSafe(orchestrator.run(kind, &reporter)).catch_unwind().await;
    if result.is_err() {
        error!(kind = %kind, "{} panicked", kind.label());
        reporter.finish(RunOutcome::Error {
            message: "scrape run panicked".to_string(),
        });
    }
}
