//! Text search engine seam used by the retriever

use crate::models::{Document, DocumentId};
use crate::retrieval::error::RetrievalResult;
use crate::retrieval::predicate::Predicate;
use crate::retrieval::query::TextQuery;
use crate::retrieval::trigram;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Ranking primitives the retriever composes.
///
/// Ranks are non-negative; a document absent from a rank map did not match
/// and scores 0.0.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Documents satisfying any clause of `predicate`, in ascending id order
    async fn select(&self, predicate: &Predicate) -> RetrievalResult<Vec<Document>>;

    /// Bag-of-words rank of every matching document
    async fn rank(&self, query: &TextQuery) -> RetrievalResult<HashMap<DocumentId, f32>>;

    /// Rank of every document containing `text` as a contiguous phrase
    async fn phrase_rank(&self, text: &str) -> RetrievalResult<HashMap<DocumentId, f32>>;

    /// Fuzzy similarity in [0, 1] between a field value and query text
    fn trigram_similarity(&self, field_text: &str, text: &str) -> f32 {
        trigram::similarity(field_text, text)
    }

    /// Best trigram similarity between a field value and any single word
    fn max_word_similarity(&self, field_text: &str, words: &[&str]) -> f32 {
        trigram::max_word_similarity(field_text, words.iter().copied())
    }
}

#[async_trait]
impl<T: SearchEngine + ?Sized> SearchEngine for Arc<T> {
    async fn select(&self, predicate: &Predicate) -> RetrievalResult<Vec<Document>> {
        (**self).select(predicate).await
    }

    async fn rank(&self, query: &TextQuery) -> RetrievalResult<HashMap<DocumentId, f32>> {
        (**self).rank(query).await
    }

    async fn phrase_rank(&self, text: &str) -> RetrievalResult<HashMap<DocumentId, f32>> {
        (**self).phrase_rank(text).await
    }

    fn trigram_similarity(&self, field_text: &str, text: &str) -> f32 {
        (**self).trigram_similarity(field_text, text)
    }

    fn max_word_similarity(&self, field_text: &str, words: &[&str]) -> f32 {
        (**self).max_word_similarity(field_text, words)
    }
}
