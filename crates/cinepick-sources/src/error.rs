use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to launch browser: {0}")]
    Launch(String),

    #[error("Failed to load {url}: {message}")]
    Navigation { url: String, message: String },

    #[error("Failed to download image {url}: {message}")]
    Image { url: String, message: String },

    #[error("Browser session for worker {0} is not available")]
    SessionUnavailable(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        SourceError::Other(message.into())
    }

    pub fn navigation(url: &str, message: impl std::fmt::Display) -> Self {
        SourceError::Navigation {
            url: url.to_string(),
            message: message.to_string(),
        }
    }

    pub fn image(url: &str, message: impl std::fmt::Display) -> Self {
        SourceError::Image {
            url: url.to_string(),
            message: message.to_string(),
        }
    }
}
