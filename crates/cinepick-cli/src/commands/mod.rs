pub mod catalog;
pub mod config;
pub mod detail;
pub mod progress_ui;
pub mod update;

use cinepick_config::{Config, PathManager};
use cinepick_core::CatalogStore;
use color_eyre::Result;

/// Configuration and paths shared by every command.
pub struct Context {
    pub paths: PathManager,
    pub config: Config,
}

impl Context {
    /// A missing config file means defaults.
    pub fn load() -> Result<Self> {
        let paths = PathManager::default();
        let config_file = paths.config_file();
        let config = Config::load_or_default(&config_file).map_err(|e| {
            color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_file.display(), e)
        })?;
        Ok(Self { paths, config })
    }

    pub fn catalog(&self) -> CatalogStore {
        CatalogStore::new(self.config.catalog_file(&self.paths))
    }
}
