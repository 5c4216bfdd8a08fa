//! Candidate selection predicates
//!
//! A [`Predicate`] is a flat list of [`MatchClause`]s folded with logical OR.
//! Clauses that only need the document text are evaluated here; full-text
//! clauses are answered by the search engine.

use crate::models::Document;
use crate::retrieval::query::{TermMode, TextQuery};
use crate::retrieval::trigram;
use serde::{Deserialize, Serialize};

/// Document field a clause looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchField {
    Title,
    Content,
    /// The indexed text of title and content together
    Indexed,
}

/// How a clause compares its value against the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MatchOperator {
    /// Case-insensitive substring
    Contains,
    /// Text-search match with the given term semantics
    FullText(TermMode),
    /// Trigram similarity strictly above the threshold
    TrigramAbove(f32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchClause {
    pub field: MatchField,
    pub operator: MatchOperator,
    pub value: String,
}

impl MatchClause {
    pub fn new(field: MatchField, operator: MatchOperator, value: impl Into<String>) -> Self {
        let value = value.into();
        let value = match operator {
            MatchOperator::Contains => value.to_lowercase(),
            _ => value,
        };
        Self {
            field,
            operator,
            value,
        }
    }

    pub fn contains(field: MatchField, value: impl Into<String>) -> Self {
        Self::new(field, MatchOperator::Contains, value)
    }

    pub fn full_text(query: &TextQuery) -> Self {
        Self::new(
            MatchField::Indexed,
            MatchOperator::FullText(query.mode),
            query.text.clone(),
        )
    }

    pub fn trigram_above(field: MatchField, value: impl Into<String>, threshold: f32) -> Self {
        Self::new(field, MatchOperator::TrigramAbove(threshold), value)
    }

    /// Engine query for a full-text clause
    pub fn text_query(&self) -> Option<TextQuery> {
        match self.operator {
            MatchOperator::FullText(mode) => Some(TextQuery::new(self.value.clone(), mode)),
            _ => None,
        }
    }

    /// Evaluate without the engine; `None` for full-text clauses
    pub fn matches_locally(&self, document: &Document) -> Option<bool> {
        match self.operator {
            MatchOperator::FullText(_) => None,
            MatchOperator::Contains => Some(self.on_fields(document, |text| {
                !self.value.is_empty() && text.to_lowercase().contains(&self.value)
            })),
            MatchOperator::TrigramAbove(threshold) => Some(self.on_fields(document, |text| {
                trigram::similarity(text, &self.value) > threshold
            })),
        }
    }

    fn on_fields(&self, document: &Document, test: impl Fn(&str) -> bool) -> bool {
        match self.field {
            MatchField::Title => test(&document.title),
            MatchField::Content => test(&document.content),
            MatchField::Indexed => test(&document.title) || test(&document.content),
        }
    }
}

/// OR-fold of match clauses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    clauses: Vec<MatchClause>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Satisfied when any clause matches
    pub fn any(clauses: impl IntoIterator<Item = MatchClause>) -> Self {
        Self {
            clauses: clauses.into_iter().collect(),
        }
    }

    pub fn or(mut self, clause: MatchClause) -> Self {
        self.clauses.push(clause);
        self
    }

    pub fn clauses(&self) -> &[MatchClause] {
        &self.clauses
    }

    /// An empty predicate matches nothing
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate against a document.
    ///
    /// `full_text` answers clauses the engine owns; it receives the clause
    /// index and the document.
    pub fn matches_with<F>(&self, document: &Document, full_text: F) -> bool
    where
        F: Fn(usize, &Document) -> bool,
    {
        self.clauses.iter().enumerate().any(|(idx, clause)| {
            clause
                .matches_locally(document)
                .unwrap_or_else(|| full_text(idx, document))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;

    fn pricing_doc() -> Document {
        Document::new(
            1,
            "Autopod Pricing",
            "Our Autopod-based pricing model",
            ContentType::Text,
        )
    }

    #[test]
    fn test_contains_clause_is_case_insensitive() {
        let clause = MatchClause::contains(MatchField::Title, "AUTOPOD");
        assert_eq!(clause.value, "autopod");
        assert_eq!(clause.matches_locally(&pricing_doc()), Some(true));

        let miss = MatchClause::contains(MatchField::Title, "model");
        assert_eq!(miss.matches_locally(&pricing_doc()), Some(false));
    }

    #[test]
    fn test_full_text_clause_defers_to_engine() {
        let clause = MatchClause::full_text(&TextQuery::new("pricing", TermMode::All));
        assert_eq!(clause.matches_locally(&pricing_doc()), None);
        assert!(clause.text_query().is_some());
    }

    #[test]
    fn test_predicate_or_fold() {
        let predicate = Predicate::any([
            MatchClause::contains(MatchField::Indexed, "careers"),
            MatchClause::contains(MatchField::Indexed, "model"),
        ]);
        assert!(predicate.matches_with(&pricing_doc(), |_, _| false));

        let engine_only =
            Predicate::new().or(MatchClause::full_text(&TextQuery::new("x", TermMode::Any)));
        assert!(!engine_only.matches_with(&pricing_doc(), |_, _| false));
        assert!(engine_only.matches_with(&pricing_doc(), |idx, _| idx == 0));
    }

    #[test]
    fn test_empty_predicate_matches_nothing() {
        let predicate = Predicate::new();
        assert!(predicate.is_empty());
        assert!(!predicate.matches_with(&pricing_doc(), |_, _| true));
    }

    #[test]
    fn test_trigram_clause() {
        let clause = MatchClause::trigram_above(MatchField::Title, "autopod pricng", 0.1);
        assert_eq!(clause.matches_locally(&pricing_doc()), Some(true));

        let strict = MatchClause::trigram_above(MatchField::Title, "careers", 0.1);
        assert_eq!(strict.matches_locally(&pricing_doc()), Some(false));
    }
}
