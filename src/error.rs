use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Failures of a dataset fetch. Both variants are transparent: the caller
/// sees the underlying error as-is.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request not sent, response not received, or body not readable.
    #[error(transparent)]
    Network(BoxError),

    /// Body is not valid JSON.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FetchError>;
