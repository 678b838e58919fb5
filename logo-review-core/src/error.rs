use thiserror::Error;

#[derive(Error, Debug)]
pub enum LogoReviewError {
    #[error("Search failed: {0}")]
    SearchFailure(String),

    #[error("Annotation submit failed: {0}")]
    SubmitFailure(String),

    #[error("Invalid search parameters: {0}")]
    InvalidParams(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[cfg(feature = "network")]
    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),
}

impl LogoReviewError {
    /// Collapse any failure of the two-stage fetch into a single search failure.
    pub(crate) fn into_search_failure(self) -> Self {
        match self {
            err @ LogoReviewError::SearchFailure(_) => err,
            other => LogoReviewError::SearchFailure(other.to_string()),
        }
    }

    pub(crate) fn into_submit_failure(self) -> Self {
        match self {
            err @ LogoReviewError::SubmitFailure(_) => err,
            other => LogoReviewError::SubmitFailure(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, LogoReviewError>;
