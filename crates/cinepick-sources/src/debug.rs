use chrono::Utc;
use std::path::PathBuf;
use tracing::{info, warn};

/// Writes raw page HTML to disk when extraction comes back empty, so selector
/// drift can be inspected offline.
#[derive(Debug, Clone)]
pub struct HtmlCapture {
    enabled: bool,
    output_dir: PathBuf,
}

impl HtmlCapture {
    pub fn new(enabled: bool, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            enabled,
            output_dir: output_dir.into(),
        }
    }

    pub fn disabled() -> Self {
        Self::new(false, PathBuf::new())
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Save `html` as `<label>_<timestamp>.html`. Failures are logged and ignored.
    pub async fn capture(&self, label: &str, html: &str) -> Option<PathBuf> {
        if !self.enabled {
            return None;
        }

        let safe_label: String = label
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        let filename = format!("{}_{}.html", safe_label, Utc::now().format("%Y%m%dT%H%M%S%.3f"));
        let path = self.output_dir.join(filename);

        if let Err(e) = tokio::fs::create_dir_all(&self.output_dir).await {
            warn!("Failed to create debug directory {:?}: {}", self.output_dir, e);
            return None;
        }
        match tokio::fs::write(&path, html).await {
            Ok(()) => {
                info!(path = ?path, "Captured page HTML for inspection");
                Some(path)
            }
            Err(e) => {
                warn!("Failed to write debug HTML {:?}: {}", path, e);
                None
            }
        }
    }
}
