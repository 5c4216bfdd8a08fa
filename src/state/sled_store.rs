use crate::error::{AppError, Result};
use crate::models::{Quiz, TourStep, UserProgress};
use crate::state::store::{sort_steps, TourStore};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent tour store using Sled embedded database
#[derive(Clone)]
pub struct SledTourStore {
    db: Arc<Db>,
    steps_tree: sled::Tree,
    quizzes_tree: sled::Tree,
    progress_tree: sled::Tree,
}

impl SledTourStore {
    /// Create a new Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref).map_err(|e| {
            AppError::Storage(format!("Failed to open Sled database: {}", e))
        })?;

        let open_tree = |name: &str| {
            db.open_tree(name).map_err(|e| {
                AppError::Storage(format!("Failed to open {} tree: {}", name, e))
            })
        };
        let steps_tree = open_tree("tour_steps")?;
        let quizzes_tree = open_tree("quizzes")?;
        let progress_tree = open_tree("user_progress")?;

        tracing::info!("Initialized Sled tour store at {:?}", path_ref);

        Ok(Self {
            db: Arc::new(db),
            steps_tree,
            quizzes_tree,
            progress_tree,
        })
    }

    fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize record: {}", e)))
    }

    fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes)
            .map_err(|e| AppError::Serialization(format!("Failed to deserialize record: {}", e)))
    }

    fn put<T: Serialize>(tree: &sled::Tree, key: &[u8], value: &T) -> Result<()> {
        tree.insert(key, Self::serialize(value)?)
            .map_err(|e| AppError::Storage(format!("Failed to write record: {}", e)))?;
        tree.flush()
            .map_err(|e| AppError::Storage(format!("Failed to flush tree: {}", e)))?;
        Ok(())
    }

    fn fetch<T: DeserializeOwned>(tree: &sled::Tree, key: &[u8]) -> Result<Option<T>> {
        match tree.get(key) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Storage(format!("Failed to read record: {}", e))),
        }
    }

    fn scan<T: DeserializeOwned>(tree: &sled::Tree) -> Result<Vec<T>> {
        tree.iter()
            .map(|result| {
                let (_, value) = result
                    .map_err(|e| AppError::Storage(format!("Failed to iterate tree: {}", e)))?;
                Self::deserialize(&value)
            })
            .collect()
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| AppError::Storage(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl TourStore for SledTourStore {
    async fn save_step(&self, step: &TourStep) -> Result<()> {
        Self::put(&self.steps_tree, &step.id.to_be_bytes(), step)?;
        tracing::debug!(step_id = step.id, "Tour step saved to Sled");
        Ok(())
    }

    async fn list_steps(&self) -> Result<Vec<TourStep>> {
        let mut steps: Vec<TourStep> = Self::scan(&self.steps_tree)?;
        sort_steps(&mut steps);
        Ok(steps)
    }

    async fn save_quiz(&self, quiz: &Quiz) -> Result<()> {
        Self::put(&self.quizzes_tree, &quiz.id.to_be_bytes(), quiz)
    }

    async fn get_quiz(&self, id: u64) -> Result<Option<Quiz>> {
        Self::fetch(&self.quizzes_tree, &id.to_be_bytes())
    }

    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        Self::fetch(&self.progress_tree, user_id.as_bytes())
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        Self::put(&self.progress_tree, progress.user_id.as_bytes(), progress)?;
        tracing::debug!(user_id = %progress.user_id, "Progress saved to Sled");
        Ok(())
    }

    async fn list_progress(&self) -> Result<Vec<UserProgress>> {
        Self::scan(&self.progress_tree)
    }
}
