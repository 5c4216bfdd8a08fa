//! Weighted multi-signal relevance scoring

use crate::models::Document;
use crate::retrieval::config::RetrievalConfig;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// The four raw relevance signals of one document plus their weighted total
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RelevanceScores {
    pub fulltext_rank: f32,
    pub phrase_rank: f32,
    pub title_trigram: f32,
    pub content_trigram: f32,
    pub combined_rank: f32,
}

/// A document with the scores that ranked it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    pub document: Document,
    pub scores: RelevanceScores,
}

impl ScoredDocument {
    pub fn combined_rank(&self) -> f32 {
        self.scores.combined_rank
    }
}

/// Combines raw signals with the configured weights
#[derive(Debug, Clone)]
pub struct RelevanceScorer {
    fulltext_weight: f32,
    content_rank_weight: f32,
    phrase_weight: f32,
    title_trigram_weight: f32,
    content_trigram_weight: f32,
}

impl RelevanceScorer {
    pub fn new(config: &RetrievalConfig) -> Self {
        Self {
            fulltext_weight: config.fulltext_weight,
            content_rank_weight: config.content_rank_weight,
            phrase_weight: config.phrase_weight,
            title_trigram_weight: config.title_trigram_weight,
            content_trigram_weight: config.content_trigram_weight,
        }
    }

    /// Weighted total.
    ///
    /// The full-text rank is counted under both the full-text and the
    /// content weight. Only the better of the two trigram terms contributes.
    pub fn score(
        &self,
        fulltext_rank: f32,
        phrase_rank: f32,
        title_trigram: f32,
        content_trigram: f32,
    ) -> RelevanceScores {
        let fulltext_rank = sanitize(fulltext_rank);
        let phrase_rank = sanitize(phrase_rank);
        let title_trigram = sanitize(title_trigram);
        let content_trigram = sanitize(content_trigram);

        let trigram_term = (title_trigram * self.title_trigram_weight)
            .max(content_trigram * self.content_trigram_weight);

        let combined_rank = fulltext_rank * self.fulltext_weight
            + phrase_rank * self.phrase_weight
            + fulltext_rank * self.content_rank_weight
            + trigram_term;

        RelevanceScores {
            fulltext_rank,
            phrase_rank,
            title_trigram,
            content_trigram,
            combined_rank,
        }
    }
}

/// Missing or broken engine scores count as "no match"
fn sanitize(value: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Descending by combined rank. `sort_by` is stable, so ties keep the
/// engine's enumeration order.
pub fn by_combined_rank_desc(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    b.combined_rank()
        .partial_cmp(&a.combined_rank())
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;

    fn scorer() -> RelevanceScorer {
        RelevanceScorer::new(&RetrievalConfig::default())
    }

    #[test]
    fn test_formula_counts_fulltext_twice() {
        let scores = scorer().score(0.5, 0.0, 0.0, 0.0);
        // 0.5 * 2 + 0.5 * 1.5
        assert!((scores.combined_rank - 1.75).abs() < 1e-6);
    }

    #[test]
    fn test_phrase_is_weighted_highest() {
        let phrase = scorer().score(0.0, 0.2, 0.0, 0.0);
        let fulltext = scorer().score(0.2, 0.0, 0.0, 0.0);
        assert!((phrase.combined_rank - 0.6).abs() < 1e-6);
        assert!((fulltext.combined_rank - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_trigram_term_takes_max() {
        // title 0.3 * 2 = 0.6 beats content 0.5 * 1
        let title_wins = scorer().score(0.0, 0.0, 0.3, 0.5);
        assert!((title_wins.combined_rank - 0.6).abs() < 1e-6);

        // content 0.9 * 1 beats title 0.4 * 2
        let content_wins = scorer().score(0.0, 0.0, 0.4, 0.9);
        assert!((content_wins.combined_rank - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_signals_are_zeroed() {
        let scores = scorer().score(f32::NAN, -1.0, f32::INFINITY, 0.0);
        assert_eq!(scores.combined_rank, 0.0);
        assert_eq!(scores.fulltext_rank, 0.0);
    }

    #[test]
    fn test_custom_weights() {
        let config = RetrievalConfig {
            phrase_weight: 10.0,
            ..Default::default()
        };
        let scores = RelevanceScorer::new(&config).score(0.0, 0.1, 0.0, 0.0);
        assert!((scores.combined_rank - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_descending_sort_is_stable() {
        let doc = |id| Document::new(id, "t", "c", ContentType::Text);
        let scored = |id, rank| ScoredDocument {
            document: doc(id),
            scores: RelevanceScores {
                combined_rank: rank,
                ..Default::default()
            },
        };

        let mut list = vec![scored(1, 0.2), scored(2, 0.5), scored(3, 0.2)];
        list.sort_by(by_combined_rank_desc);

        let ids: Vec<_> = list.iter().map(|s| s.document.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }
}
