pub mod config;
pub mod paths;

pub use config::{
    default_full_profile, default_quick_profile, BrowserOptions, CatalogConfig, Config,
    DebugConfig, LoggingConfig, RunProfile, ScrapeConfig,
};
pub use paths::{PathManager, container_base_path};
