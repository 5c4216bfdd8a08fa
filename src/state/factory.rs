use crate::config::{StorageBackend, TourConfig};
use crate::error::{AppError, Result};
use crate::models::{Quiz, TourStep};
use crate::state::{InMemoryTourStore, SledTourStore, TourStore};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use validator::Validate;

/// Create a tour store based on configuration
pub async fn create_tour_store(config: &TourConfig) -> Result<Arc<dyn TourStore>> {
    let store: Arc<dyn TourStore> = match config.backend {
        StorageBackend::Sled => {
            let path = config.path.as_ref().ok_or_else(|| {
                AppError::Configuration("Sled backend requires 'tour.path' configuration".to_string())
            })?;

            tracing::info!(path = ?path, "Initializing Sled tour storage backend");
            Arc::new(SledTourStore::new(path)?)
        }

        StorageBackend::Memory => create_in_memory_store(),
    };

    if let Some(seed_path) = &config.seed_path {
        seed_tour_store(store.as_ref(), seed_path).await?;
    }

    Ok(store)
}

/// Create an in-memory store (for testing and development)
pub fn create_in_memory_store() -> Arc<dyn TourStore> {
    tracing::info!("Initializing in-memory tour storage backend");
    Arc::new(InMemoryTourStore::new())
}

/// Contents of a tour seed file
#[derive(Debug, Default, Deserialize)]
pub struct TourSeed {
    #[serde(default)]
    pub steps: Vec<TourStep>,

    #[serde(default)]
    pub quizzes: Vec<Quiz>,
}

/// Load steps and quizzes from a JSON seed file
pub async fn seed_tour_store(store: &dyn TourStore, path: &Path) -> Result<(usize, usize)> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::Configuration(format!("Failed to read tour seed {}: {}", path.display(), e))
    })?;
    let seed: TourSeed = serde_json::from_str(&raw)?;

    for step in &seed.steps {
        step.validate()?;
        store.save_step(step).await?;
    }
    for quiz in &seed.quizzes {
        quiz.validate()?;
        store.save_quiz(quiz).await?;
    }

    tracing::info!(
        path = %path.display(),
        steps = seed.steps.len(),
        quizzes = seed.quizzes.len(),
        "Loaded tour seed"
    );
    Ok((seed.steps.len(), seed.quizzes.len()))
}
