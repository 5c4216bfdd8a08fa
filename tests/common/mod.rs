//! Shared fixtures for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tour_concierge::models::{ContentType, Document, DocumentId, Quiz, TourStep};
use tour_concierge::retrieval::{Predicate, RetrievalResult, SearchEngine, TextQuery};
use tour_concierge::search::{ContentIndex, SearchConfig};

/// The site content used across tests
pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new(
            1,
            "Autopod Pricing",
            "Our Autopod-based pricing model charges per delivery pod per month.",
            ContentType::Text,
        ),
        Document::new(
            2,
            "Careers",
            "Open roles in Bangalore for engineers and product designers.",
            ContentType::Blog,
        ),
        Document::new(
            3,
            "Services",
            "We build AI products, data platforms and cloud-native applications.",
            ContentType::Text,
        ),
        Document::new(
            4,
            "Company Overview Video",
            "https://www.youtube.com/watch?v=think41-overview",
            ContentType::Video,
        ),
    ]
}

/// In-memory index holding [`sample_documents`]
pub async fn sample_index() -> Arc<ContentIndex> {
    let index = ContentIndex::new(SearchConfig::default()).await.unwrap();
    index.index_documents(&sample_documents()).await.unwrap();
    Arc::new(index)
}

/// Engine wrapper counting calls that reach the index
pub struct CountingEngine<E> {
    inner: E,
    selects: AtomicUsize,
    ranks: AtomicUsize,
}

impl<E: SearchEngine> CountingEngine<E> {
    pub fn new(inner: E) -> Self {
        Self {
            inner,
            selects: AtomicUsize::new(0),
            ranks: AtomicUsize::new(0),
        }
    }

    pub fn selects(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    pub fn ranks(&self) -> usize {
        self.ranks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl<E: SearchEngine> SearchEngine for CountingEngine<E> {
    async fn select(&self, predicate: &Predicate) -> RetrievalResult<Vec<Document>> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.inner.select(predicate).await
    }

    async fn rank(&self, query: &TextQuery) -> RetrievalResult<HashMap<DocumentId, f32>> {
        self.ranks.fetch_add(1, Ordering::SeqCst);
        self.inner.rank(query).await
    }

    async fn phrase_rank(&self, text: &str) -> RetrievalResult<HashMap<DocumentId, f32>> {
        self.inner.phrase_rank(text).await
    }
}

pub fn tour_step(id: u64, order: i32, page_name: &str) -> TourStep {
    TourStep {
        id,
        order,
        title: format!("Welcome to {}", page_name),
        description: format!("The {} page", page_name),
        page_name: page_name.to_string(),
        section_id: None,
        content_type: ContentType::Text,
        content: String::new(),
    }
}

/// Home, services, about, contact
pub fn sample_steps() -> Vec<TourStep> {
    vec![
        tour_step(1, 1, "home"),
        tour_step(2, 2, "services"),
        tour_step(3, 3, "about"),
        tour_step(4, 4, "contact"),
    ]
}

pub fn sample_quiz() -> Quiz {
    Quiz {
        id: 1,
        tour_step_id: 2,
        question: "What does the company build?".to_string(),
        options: vec!["Product".to_string(), "Furniture".to_string()],
        correct_answer: "Product".to_string(),
    }
}
