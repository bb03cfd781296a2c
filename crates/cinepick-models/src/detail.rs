use serde::{Deserialize, Serialize};

use crate::movie::{letterboxd_url, DescriptionState, DESCRIPTION_ERROR};

/// Output of a single detail-page fetch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailResult {
    pub description: String,
    pub large_image_url: Option<String>,
    pub letterboxd_url: String,
}

impl DetailResult {
    /// Result handed back when the page could not be fetched. Callers treat it as "retry later".
    pub fn error(movie_url: &str) -> Self {
        Self {
            description: DESCRIPTION_ERROR.to_string(),
            large_image_url: None,
            letterboxd_url: letterboxd_url(movie_url),
        }
    }

    pub fn is_error(&self) -> bool {
        DescriptionState::of(&self.description) == DescriptionState::FetchError
    }
}
