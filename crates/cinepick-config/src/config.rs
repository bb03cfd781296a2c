use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::PathManager;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub scrape: ScrapeConfig,
    #[serde(default)]
    pub browser: BrowserOptions,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub debug: DebugConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Number of parallel browser sessions (one per worker).
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Wait after navigation so client-rendered listings can settle.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    #[serde(default = "default_true")]
    pub download_images: bool,
    #[serde(default = "default_full_profile")]
    pub full: RunProfile,
    #[serde(default = "default_quick_profile")]
    pub quick: RunProfile,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunProfile {
    pub max_per_genre: usize,
    pub genres: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserOptions {
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub data_file: Option<PathBuf>,
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
    #[serde(default = "default_stale_after_hours")]
    pub stale_after_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebugConfig {
    #[serde(default = "default_capture_html")]
    pub capture_html: bool,
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "https://letterboxd.com".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_settle_delay_ms() -> u64 {
    2000
}

fn default_stale_after_hours() -> u64 {
    24
}

fn default_capture_html() -> bool {
    std::env::var("CINEPICK_CAPTURE_HTML")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn genre_list(names: &[&str]) -> Vec<String> {
    names.iter().map(|g| g.to_string()).collect()
}

pub fn default_full_profile() -> RunProfile {
    RunProfile {
        max_per_genre: 3,
        genres: genre_list(&[
            "action",
            "adventure",
            "animation",
            "comedy",
            "crime",
            "documentary",
            "drama",
            "family",
            "fantasy",
            "history",
            "horror",
            "music",
            "mystery",
            "romance",
            "science-fiction",
            "thriller",
            "war",
            "western",
        ]),
    }
}

pub fn default_quick_profile() -> RunProfile {
    RunProfile {
        max_per_genre: 10,
        genres: genre_list(&["action", "drama", "comedy", "thriller", "horror", "science-fiction"]),
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            concurrency: default_concurrency(),
            settle_delay_ms: default_settle_delay_ms(),
            download_images: true,
            full: default_full_profile(),
            quick: default_quick_profile(),
        }
    }
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            headless: true,
            extra_args: Vec::new(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            data_file: None,
            static_dir: None,
            stale_after_hours: default_stale_after_hours(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            capture_html: default_capture_html(),
            output_dir: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file if present, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let scrape = &self.scrape;
        if !(scrape.base_url.starts_with("http://") || scrape.base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "scrape.base_url must be an http(s) URL, got '{}'",
                scrape.base_url
            ));
        }
        if scrape.concurrency == 0 {
            return Err(anyhow::anyhow!("scrape.concurrency must be at least 1"));
        }
        for (name, profile) in [("full", &scrape.full), ("quick", &scrape.quick)] {
            if profile.max_per_genre == 0 {
                return Err(anyhow::anyhow!("scrape.{}.max_per_genre must be at least 1", name));
            }
            if profile.genres.iter().all(|g| g.trim().is_empty()) {
                return Err(anyhow::anyhow!("scrape.{}.genres cannot be empty", name));
            }
        }
        Ok(())
    }

    pub fn catalog_file(&self, paths: &PathManager) -> PathBuf {
        self.catalog.data_file.clone().unwrap_or_else(|| paths.catalog_file())
    }

    pub fn static_dir(&self, paths: &PathManager) -> PathBuf {
        self.catalog.static_dir.clone().unwrap_or_else(|| paths.static_dir())
    }

    pub fn debug_dir(&self, paths: &PathManager) -> PathBuf {
        self.debug.output_dir.clone().unwrap_or_else(|| paths.debug_dir())
    }
}
