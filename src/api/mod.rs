pub mod handlers;
pub mod routes;

pub use routes::*;

use crate::concierge::{create_language_model, ConciergeAssistant};
use crate::config::Config;
use crate::error::Result;
use crate::retrieval::{ContentRetriever, SearchEngine};
use crate::search::ContentIndex;
use crate::state::create_tour_store;
use crate::tour::TourService;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub index: Arc<ContentIndex>,
    pub retriever: Arc<ContentRetriever>,
    pub tours: Arc<TourService>,
    pub assistant: Arc<ConciergeAssistant>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        index: Arc<ContentIndex>,
        retriever: Arc<ContentRetriever>,
        tours: Arc<TourService>,
        assistant: Arc<ConciergeAssistant>,
    ) -> Self {
        Self {
            config,
            index,
            retriever,
            tours,
            assistant,
            started_at: Instant::now(),
        }
    }

    /// Wire every component from configuration: content index (seeded when
    /// `search.seed_path` is set), retriever, tour store and language model
    pub async fn bootstrap(config: Config) -> Result<Self> {
        let index = Arc::new(ContentIndex::new(config.search.clone()).await?);
        if let Some(seed) = &config.search.seed_path {
            let loaded = index.load_seed(seed).await?;
            tracing::info!(documents = loaded, path = ?seed, "Content seeded");
        }

        let engine: Arc<dyn SearchEngine> = index.clone();
        let retriever = Arc::new(ContentRetriever::new(engine, config.retrieval.clone())?);

        tracing::info!(backend = ?config.tour.backend, "Initializing tour storage");
        let tours = Arc::new(TourService::new(create_tour_store(&config.tour).await?));

        let model = create_language_model(&config.llm)?;
        let assistant = Arc::new(ConciergeAssistant::new(
            retriever.clone(),
            model,
            tours.clone(),
            config.company.clone(),
            config.chat.clone(),
        ));

        Ok(Self::new(Arc::new(config), index, retriever, tours, assistant))
    }
}
