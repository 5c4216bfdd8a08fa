//! Weighted content retrieval
//!
//! Given a visitor question, finds the few stored documents most relevant to
//! it by blending bag-of-words rank, phrase rank and trigram similarity, with
//! an OR-of-words fallback for weak queries and a TTL cache in front.

pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod predicate;
pub mod query;
pub mod retriever;
pub mod scorer;
pub mod trigram;

pub use cache::ResultCache;
pub use config::{RetrievalConfig, RetrievalConfigBuilder};
pub use engine::SearchEngine;
pub use error::{RetrievalError, RetrievalResult};
pub use predicate::{MatchClause, MatchField, MatchOperator, Predicate};
pub use query::{NormalizedQuery, TermMode, TextQuery};
pub use retriever::{ContentRetriever, RetrievalOutcome, SearchPhase};
pub use scorer::{RelevanceScorer, RelevanceScores, ScoredDocument};
