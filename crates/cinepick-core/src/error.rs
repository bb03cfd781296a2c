use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Catalog CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to replace catalog file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Movie not found in catalog: {0}")]
    NotFound(String),
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("A {0} run is already in progress")]
    AlreadyRunning(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Source(#[from] cinepick_sources::SourceError),
}
