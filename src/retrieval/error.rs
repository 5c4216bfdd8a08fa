//! Error types for content retrieval

use crate::error::AppError;
use crate::search::SearchError;

/// Result type for retrieval operations
pub type RetrievalResult<T> = std::result::Result<T, RetrievalError>;

/// Why a retrieval call could not produce a confirmed answer.
///
/// An empty result is not an error; these variants let callers tell an engine
/// failure apart from "nothing relevant" when logging.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RetrievalError {
    /// The text search engine failed (unavailable, IO, corrupted index)
    #[error("Search engine failure: {0}")]
    Engine(String),

    /// The query could not be turned into an engine query
    #[error("Query construction failed: {0}")]
    Query(String),

    /// Retrieval settings are unusable
    #[error("Invalid retrieval configuration: {0}")]
    InvalidConfiguration(String),
}

impl RetrievalError {
    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            RetrievalError::Engine(_) => "engine",
            RetrievalError::Query(_) => "query",
            RetrievalError::InvalidConfiguration(_) => "configuration",
        }
    }
}

impl From<SearchError> for RetrievalError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::QueryParsingFailed(msg) => RetrievalError::Query(msg),
            other => RetrievalError::Engine(other.to_string()),
        }
    }
}

impl From<RetrievalError> for AppError {
    fn from(err: RetrievalError) -> Self {
        match err {
            RetrievalError::InvalidConfiguration(msg) => AppError::Configuration(msg),
            other => AppError::Search(other.to_string()),
        }
    }
}
