use crate::error::Result;
use crate::models::{Quiz, TourStep, UserProgress};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Trait for tour storage operations
#[async_trait]
pub trait TourStore: Send + Sync {
    /// Insert or replace a tour step
    async fn save_step(&self, step: &TourStep) -> Result<()>;

    /// All steps ordered by `order`, then id
    async fn list_steps(&self) -> Result<Vec<TourStep>>;

    /// Insert or replace a quiz
    async fn save_quiz(&self, quiz: &Quiz) -> Result<()>;

    /// Get a quiz by ID
    async fn get_quiz(&self, id: u64) -> Result<Option<Quiz>>;

    /// Get a visitor's progress
    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>>;

    /// Insert or replace a visitor's progress
    async fn save_progress(&self, progress: &UserProgress) -> Result<()>;

    /// Progress of every visitor
    async fn list_progress(&self) -> Result<Vec<UserProgress>>;
}

/// Sort steps the way every store returns them
pub(crate) fn sort_steps(steps: &mut [TourStep]) {
    steps.sort_by(|a, b| a.order.cmp(&b.order).then(a.id.cmp(&b.id)));
}

/// In-memory tour store (for development and testing)
#[derive(Clone, Default)]
pub struct InMemoryTourStore {
    steps: Arc<DashMap<u64, TourStep>>,
    quizzes: Arc<DashMap<u64, Quiz>>,
    progress: Arc<DashMap<String, UserProgress>>,
}

impl InMemoryTourStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TourStore for InMemoryTourStore {
    async fn save_step(&self, step: &TourStep) -> Result<()> {
        self.steps.insert(step.id, step.clone());
        tracing::debug!(step_id = step.id, order = step.order, "Tour step saved");
        Ok(())
    }

    async fn list_steps(&self) -> Result<Vec<TourStep>> {
        let mut steps: Vec<TourStep> = self
            .steps
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        sort_steps(&mut steps);
        Ok(steps)
    }

    async fn save_quiz(&self, quiz: &Quiz) -> Result<()> {
        self.quizzes.insert(quiz.id, quiz.clone());
        Ok(())
    }

    async fn get_quiz(&self, id: u64) -> Result<Option<Quiz>> {
        Ok(self.quizzes.get(&id).map(|entry| entry.clone()))
    }

    async fn get_progress(&self, user_id: &str) -> Result<Option<UserProgress>> {
        Ok(self.progress.get(user_id).map(|entry| entry.clone()))
    }

    async fn save_progress(&self, progress: &UserProgress) -> Result<()> {
        self.progress
            .insert(progress.user_id.clone(), progress.clone());
        tracing::debug!(user_id = %progress.user_id, "Progress saved");
        Ok(())
    }

    async fn list_progress(&self) -> Result<Vec<UserProgress>> {
        Ok(self
            .progress
            .iter()
            .map(|entry| entry.value().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;

    fn step(id: u64, order: i32, page: &str) -> TourStep {
        TourStep {
            id,
            order,
            title: format!("Step {}", order),
            description: "Description".to_string(),
            page_name: page.to_string(),
            section_id: None,
            content_type: ContentType::Text,
            content: String::new(),
        }
    }

    #[tokio::test]
    async fn test_steps_listed_by_order() {
        let store = InMemoryTourStore::new();
        store.save_step(&step(1, 30, "about")).await.unwrap();
        store.save_step(&step(2, 10, "home")).await.unwrap();
        store.save_step(&step(3, 20, "pricing")).await.unwrap();

        let orders: Vec<_> = store
            .list_steps()
            .await
            .unwrap()
            .iter()
            .map(|s| s.order)
            .collect();
        assert_eq!(orders, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn test_progress_round_trip() {
        let store = InMemoryTourStore::new();
        assert!(store.get_progress("visitor").await.unwrap().is_none());

        let mut progress = UserProgress::new("visitor", Some(2));
        progress.points = 20;
        store.save_progress(&progress).await.unwrap();

        let loaded = store.get_progress("visitor").await.unwrap().unwrap();
        assert_eq!(loaded.points, 20);
        assert_eq!(store.list_progress().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_quiz_lookup() {
        let store = InMemoryTourStore::new();
        let quiz = Quiz {
            id: 5,
            tour_step_id: 1,
            question: "Q?".to_string(),
            options: vec!["A".to_string()],
            correct_answer: "A".to_string(),
        };
        store.save_quiz(&quiz).await.unwrap();

        assert_eq!(store.get_quiz(5).await.unwrap(), Some(quiz));
        assert!(store.get_quiz(6).await.unwrap().is_none());
    }
}
