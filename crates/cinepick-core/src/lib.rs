pub mod catalog;
pub mod dedup;
pub mod describe;
pub mod error;
pub mod orchestrator;
pub mod query;
pub mod run;
pub mod sample;
pub mod service;

pub use catalog::{CatalogStore, MergeSummary, CATALOG_HEADER};
pub use dedup::{collapse_by_key, merge_existing_wins};
pub use describe::{DescribeResponse, DetailService};
pub use error::{CatalogError, ServiceError};
pub use orchestrator::{Orchestrator, ScrapeSettings};
pub use query::{
    genres, pick_random, recommend, search, SearchQuery, ANY_GENRE, RECOMMEND_LIMIT, SEARCH_LIMIT,
};
pub use run::{ProgressCell, RunHandle, RunReporter};
pub use sample::sample_catalog;
pub use service::ScrapeService;
