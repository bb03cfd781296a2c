use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunKind {
    /// Shallow pass over a wide genre list; overwrites the catalog.
    Full,
    /// Deeper pass over fewer genres; merges new titles into the catalog.
    Quick,
}

impl RunKind {
    pub fn label(&self) -> &'static str {
        match self {
            RunKind::Full => "Full Database Update",
            RunKind::Quick => "Quick Update",
        }
    }
}

impl fmt::Display for RunKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunKind::Full => write!(f, "full"),
            RunKind::Quick => write!(f, "quick"),
        }
    }
}

/// How a run terminated. Every run ends in exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RunOutcome {
    Completed { collected: usize, written: usize },
    Stopped,
    /// Nothing was collected; the built-in sample catalog was written instead.
    EmptyFallback,
    Error { message: String },
}

impl RunOutcome {
    pub fn status(&self) -> String {
        match self {
            RunOutcome::Completed { .. } => "Complete".to_string(),
            RunOutcome::Stopped => "Stopped".to_string(),
            RunOutcome::EmptyFallback => {
                "Failed: no movies collected, sample catalog written".to_string()
            }
            RunOutcome::Error { message } => format!("Error: {}", message),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed { .. })
    }
}
