use crate::error::SourceError;
use crate::session::{BrowserSession, SessionLauncher};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::fetcher::{BrowserFetcher, BrowserFetcherOptions};
use chromiumoxide::{Browser, BrowserConfig};
use cinepick_config::BrowserOptions;
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use which::which;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Launches headless Chromium sessions through chromiumoxide.
pub struct ChromiumLauncher {
    options: BrowserOptions,
    download_root: PathBuf,
}

impl ChromiumLauncher {
    /// `download_root` is where a fetched Chromium is stored when no system browser exists.
    pub fn new(options: BrowserOptions, download_root: impl Into<PathBuf>) -> Self {
        Self {
            options,
            download_root: download_root.into(),
        }
    }

    async fn resolve_executable(&self) -> Result<Option<PathBuf>> {
        if let Some(path) = &self.options.chrome_executable {
            return Ok(Some(path.clone()));
        }
        if let Some(path) = find_system_chromium() {
            return Ok(Some(path));
        }

        info!("No system Chromium found, downloading via BrowserFetcher...");
        let fetcher_path = self.download_root.join("chromium_downloads");
        tokio::fs::create_dir_all(&fetcher_path).await?;

        let fetcher = BrowserFetcher::new(
            BrowserFetcherOptions::builder()
                .with_path(&fetcher_path)
                .build()
                .map_err(|e| anyhow!("Failed to create BrowserFetcherOptions: {}", e))?,
        );
        let fetched = fetcher
            .fetch()
            .await
            .map_err(|e| anyhow!("Failed to fetch Chromium: {}", e))?;

        info!("Chromium downloaded to: {:?}", fetched.executable_path);
        Ok(Some(fetched.executable_path))
    }

    fn build_browser_config(
        &self,
        chrome_path: Option<PathBuf>,
        user_data_dir: &Path,
    ) -> Result<BrowserConfig> {
        let mut builder = BrowserConfig::builder();

        if let Some(path) = chrome_path {
            builder = builder.chrome_executable(path);
        }
        if !self.options.headless {
            builder = builder.with_head();
        }

        builder = builder
            .no_sandbox()
            .user_data_dir(user_data_dir)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-notifications")
            .arg("--disable-sync")
            .arg("--disable-default-apps")
            .arg("--disable-crash-reporter")
            .arg("--disable-breakpad")
            .arg("--log-level=3")
            .arg("--window-size=1280,900")
            .arg(format!("--user-agent={}", USER_AGENT));

        for arg in &self.options.extra_args {
            builder = builder.arg(arg.as_str());
        }

        builder
            .build()
            .map_err(|e| anyhow!("Failed to build browser config: {}", e))
    }

    async fn launch_chromium(&self) -> Result<ChromiumSession> {
        let chrome_path = self.resolve_executable().await?;

        // Concurrent browsers cannot share a profile directory.
        let profile = tempfile::Builder::new().prefix("cinepick-browser-").tempdir()?;
        let config = self.build_browser_config(chrome_path, profile.path())?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow!("Failed to launch browser: {}", e))?;

        let handler_task = tokio::spawn(async move {
            let mut error_count = 0;
            const MAX_ERRORS: usize = 10;

            while let Some(event) = handler.next().await {
                match event {
                    Ok(_) => error_count = 0,
                    Err(e) => {
                        error_count += 1;
                        debug!(
                            "Browser handler error (count: {}/{}): {:?}",
                            error_count, MAX_ERRORS, e
                        );
                        if error_count >= MAX_ERRORS {
                            error!(
                                "Browser handler received {} consecutive errors. \
                                 Browser process may have crashed.",
                                error_count
                            );
                            break;
                        }
                    }
                }
            }
            debug!("Browser handler task ended");
        });

        Ok(ChromiumSession {
            browser: Some(browser),
            handler_task: Some(handler_task),
            _profile: profile,
        })
    }
}

#[async_trait]
impl SessionLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, SourceError> {
        let session = self
            .launch_chromium()
            .await
            .map_err(|e| SourceError::Launch(e.to_string()))?;
        Ok(Box::new(session))
    }
}

pub struct ChromiumSession {
    browser: Option<Browser>,
    handler_task: Option<tokio::task::JoinHandle<()>>,
    _profile: TempDir,
}

impl ChromiumSession {
    async fn render(browser: &Browser, url: &str, settle: Duration) -> Result<String> {
        let page = browser.new_page(url).await?;

        let result = async {
            page.wait_for_navigation().await?;
            if !settle.is_zero() {
                sleep(settle).await;
            }
            let html = page.content().await?;
            Ok::<_, anyhow::Error>(html)
        }
        .await;

        // Always close the page, even on error
        if let Err(e) = page.close().await {
            warn!("Failed to close page: {}", e);
        }

        result
    }
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn fetch_html(&mut self, url: &str, settle: Duration) -> Result<String, SourceError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| SourceError::navigation(url, "browser already closed"))?;
        debug!(url = %url, "Rendering page");
        Self::render(browser, url, settle)
            .await
            .map_err(|e| SourceError::navigation(url, e))
    }

    async fn close(&mut self) -> Result<(), SourceError> {
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };

        let closed = browser.close().await;
        if let Err(e) = browser.wait().await {
            debug!("Browser process wait failed: {}", e);
        }
        if let Some(handler_task) = self.handler_task.take() {
            let _ = tokio::time::timeout(Duration::from_secs(2), handler_task).await;
        }

        closed
            .map(|_| ())
            .map_err(|e| SourceError::new(format!("Failed to close browser: {}", e)))
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if self.browser.take().is_some() {
            debug!("Dropping browser session without explicit close");
        }
        if let Some(handler_task) = self.handler_task.take() {
            handler_task.abort();
        }
    }
}

fn is_docker() -> bool {
    Path::new("/.dockerenv").exists()
        || std::fs::read_to_string("/proc/self/cgroup")
            .ok()
            .map(|s| s.contains("docker") || s.contains("containerd"))
            .unwrap_or(false)
}

/// Locate an installed Chromium/Chrome, preferring container paths inside Docker.
pub fn find_system_chromium() -> Option<PathBuf> {
    if is_docker() {
        for path in ["/usr/bin/chromium", "/usr/bin/chromium-browser"] {
            if Path::new(path).exists() {
                return Some(PathBuf::from(path));
            }
        }
    }

    if cfg!(target_os = "macos") {
        let macos_paths = [
            "/Applications/Chromium.app/Contents/MacOS/Chromium",
            "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            "/opt/homebrew/bin/chromium",
        ];
        for path in &macos_paths {
            if Path::new(path).exists() {
                return Some(PathBuf::from(path));
            }
        }
    }

    let system_paths = [
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/usr/bin/google-chrome",
        "/usr/local/bin/chromium",
        "/opt/chromium/chromium",
    ];
    for path in &system_paths {
        if Path::new(path).exists() {
            return Some(PathBuf::from(path));
        }
    }

    which("chromium")
        .or_else(|_| which("chromium-browser"))
        .or_else(|_| which("google-chrome"))
        .ok()
}
