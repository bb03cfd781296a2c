pub mod chromium;
pub mod debug;
pub mod detail;
pub mod error;
pub mod extract;
pub mod genre_task;
pub mod images;
pub mod progress;
pub mod session;

pub use chromium::{find_system_chromium, ChromiumLauncher, ChromiumSession};
pub use debug::HtmlCapture;
pub use detail::DetailFetcher;
pub use error::SourceError;
pub use extract::{extract_detail, extract_listing, FieldSource, FieldStrategy, MovieSummary};
pub use genre_task::{GenreTask, TaskEnv};
pub use images::{
    large_poster_path, poster_path, sanitize_title, ImageFetcher, ImageStore, ReqwestImageFetcher,
};
pub use progress::{NoProgress, ProgressSink, ProgressTracker};
pub use session::{BrowserSession, SessionLauncher, SessionLease, SessionPool};
