use serde::{Deserialize, Serialize};

/// Snapshot of a scrape run's progress, as shown to polling clients.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgressState {
    pub progress: f64,
    pub status: String,
    pub complete: bool,
}

impl Default for ProgressState {
    fn default() -> Self {
        Self {
            progress: 0.0,
            status: "Not started".to_string(),
            complete: false,
        }
    }
}

impl ProgressState {
    pub fn percent(&self) -> u8 {
        (self.progress.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}
