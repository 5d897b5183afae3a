pub mod boundary_loader;
pub mod performance;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream returned {0}")]
    Status(reqwest::StatusCode),
    #[error(transparent)]
    Boundary(#[from] ndc_shared::BoundaryError),
    #[error("performance source is not configured")]
    NotConfigured,
}
