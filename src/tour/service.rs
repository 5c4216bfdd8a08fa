use crate::error::{AppError, Result};
use crate::metrics::TOUR_EVENTS_TOTAL;
use crate::models::{TourStep, UserProgress};
use crate::state::{TourStore, UserLocks};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Points awarded for a correct quiz answer
pub const QUIZ_POINTS: u32 = 10;

/// Result of starting the tour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TourStart {
    pub message: String,
    pub tour_started: bool,
    pub current_step: TourStep,
    pub total_steps: usize,
}

/// Result of any step movement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOutcome {
    pub message: String,
    /// `None` when nothing moved (no previous step, unknown page, tour done)
    pub current_step: Option<TourStep>,
    pub progress_percentage: f64,
    pub completed: bool,
}

/// Where a visitor stands in the tour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub user_id: String,
    pub current_step: TourStep,
    pub total_steps: usize,
    pub progress_percentage: f64,
    pub completed: bool,
    pub points: u32,
}

/// Aggregate tour statistics
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TourAnalytics {
    pub total_users: usize,
    pub completed_tours: usize,
    /// Mean progress percentage of visitors on a step, two decimals
    pub average_progress: f64,
}

/// Result of answering a quiz question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizFeedback {
    pub is_correct: bool,
    pub feedback: String,
    pub current_points: u32,
}

/// Guided tour navigation, progress tracking and quizzes.
///
/// Every mutation of a visitor's progress holds that visitor's lock, so
/// concurrent requests for one visitor apply in sequence.
pub struct TourService {
    store: Arc<dyn TourStore>,
    user_locks: UserLocks,
}

impl TourService {
    pub fn new(store: Arc<dyn TourStore>) -> Self {
        Self {
            store,
            user_locks: UserLocks::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn TourStore> {
        &self.store
    }

    fn check_user(user_id: &str) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(AppError::Validation("user_id must not be empty".to_string()));
        }
        Ok(())
    }

    /// Steps in tour order; error when the tour has none
    async fn tour_steps(&self) -> Result<Vec<TourStep>> {
        let steps = self.store.list_steps().await?;
        if steps.is_empty() {
            return Err(AppError::TourUnavailable(
                "No tour steps available. Please add tour steps.".to_string(),
            ));
        }
        Ok(steps)
    }

    async fn load_progress(&self, user_id: &str) -> Result<UserProgress> {
        Ok(self
            .store
            .get_progress(user_id)
            .await?
            .unwrap_or_else(|| UserProgress::new(user_id, None)))
    }

    /// Start (or resume) the tour at its first step
    pub async fn start_tour(&self, user_id: &str) -> Result<TourStart> {
        Self::check_user(user_id)?;
        let steps = self.tour_steps().await?;
        let first = steps[0].clone();

        let _guard = self.user_locks.lock(user_id).await;

        let mut progress = self.load_progress(user_id).await?;
        if current_step(&steps, &progress).is_none() {
            progress.move_to(first.id);
            self.store.save_progress(&progress).await?;
        }

        TOUR_EVENTS_TOTAL.with_label_values(&["started"]).inc();
        info!(user_id, total_steps = steps.len(), "Tour started");

        Ok(TourStart {
            message: "Tour started successfully".to_string(),
            tour_started: true,
            current_step: first,
            total_steps: steps.len(),
        })
    }

    /// Advance to the next step by order
    pub async fn next_step(&self, user_id: &str) -> Result<StepOutcome> {
        Self::check_user(user_id)?;
        let steps = self.tour_steps().await?;

        let _guard = self.user_locks.lock(user_id).await;

        let mut progress = self.load_progress(user_id).await?;
        let next = match current_step(&steps, &progress) {
            None => Some(&steps[0]),
            Some(current) => steps.iter().find(|s| s.order > current.order),
        };

        match next {
            Some(step) => {
                progress.move_to(step.id);
                self.store.save_progress(&progress).await?;
                TOUR_EVENTS_TOTAL.with_label_values(&["advanced"]).inc();
                debug!(user_id, step = step.order, "Moved to next step");

                Ok(StepOutcome {
                    message: "Next step".to_string(),
                    current_step: Some(step.clone()),
                    progress_percentage: progress_percentage(&steps, step),
                    completed: progress.is_completed(),
                })
            }
            None => {
                if !progress.is_completed() {
                    TOUR_EVENTS_TOTAL.with_label_values(&["completed"]).inc();
                    info!(user_id, "Tour completed");
                }
                progress.complete();
                self.store.save_progress(&progress).await?;

                Ok(StepOutcome {
                    message: "Tour completed".to_string(),
                    current_step: None,
                    progress_percentage: 100.0,
                    completed: true,
                })
            }
        }
    }

    /// Go back to the previous step by order
    pub async fn previous_step(&self, user_id: &str) -> Result<StepOutcome> {
        Self::check_user(user_id)?;
        let steps = self.tour_steps().await?;

        let _guard = self.user_locks.lock(user_id).await;

        let mut progress = self.load_progress(user_id).await?;
        let previous = current_step(&steps, &progress)
            .and_then(|current| steps.iter().rev().find(|s| s.order < current.order));

        match previous {
            Some(step) => {
                progress.move_to(step.id);
                self.store.save_progress(&progress).await?;

                Ok(StepOutcome {
                    message: "Previous step".to_string(),
                    current_step: Some(step.clone()),
                    progress_percentage: progress_percentage(&steps, step),
                    completed: progress.is_completed(),
                })
            }
            None => Ok(StepOutcome {
                message: "No previous step available".to_string(),
                current_step: None,
                progress_percentage: current_step(&steps, &progress)
                    .map_or(0.0, |s| progress_percentage(&steps, s)),
                completed: progress.is_completed(),
            }),
        }
    }

    /// Jump to the step with the given order
    pub async fn go_to_step(&self, user_id: &str, order: i32) -> Result<StepOutcome> {
        Self::check_user(user_id)?;
        let steps = self.tour_steps().await?;
        let step = steps
            .iter()
            .find(|s| s.order == order)
            .ok_or_else(|| AppError::NotFound(format!("Tour step {} not found", order)))?;

        let _guard = self.user_locks.lock(user_id).await;

        let mut progress = self.load_progress(user_id).await?;
        progress.move_to(step.id);
        self.store.save_progress(&progress).await?;

        Ok(StepOutcome {
            message: "Step updated".to_string(),
            current_step: Some(step.clone()),
            progress_percentage: progress_percentage(&steps, step),
            completed: progress.is_completed(),
        })
    }

    /// Move to the first step shown on `page_name` (case-insensitive)
    pub async fn navigate_to_page(&self, user_id: &str, page_name: &str) -> Result<StepOutcome> {
        Self::check_user(user_id)?;
        let steps = self.tour_steps().await?;

        let _guard = self.user_locks.lock(user_id).await;

        let mut progress = self.load_progress(user_id).await?;
        let target = steps
            .iter()
            .find(|s| s.page_name.eq_ignore_ascii_case(page_name.trim()));

        match target {
            Some(step) => {
                progress.move_to(step.id);
                self.store.save_progress(&progress).await?;

                Ok(StepOutcome {
                    message: format!("Navigated to {}", page_name),
                    current_step: Some(step.clone()),
                    progress_percentage: progress_percentage(&steps, step),
                    completed: progress.is_completed(),
                })
            }
            None => Ok(StepOutcome {
                message: format!("No tour step found for page {}", page_name),
                current_step: None,
                progress_percentage: current_step(&steps, &progress)
                    .map_or(0.0, |s| progress_percentage(&steps, s)),
                completed: progress.is_completed(),
            }),
        }
    }

    /// Current position; visitors without one are placed on the first step
    pub async fn progress(&self, user_id: &str) -> Result<ProgressReport> {
        Self::check_user(user_id)?;
        let steps = self.tour_steps().await?;

        let _guard = self.user_locks.lock(user_id).await;

        let mut progress = self.load_progress(user_id).await?;
        let step = match current_step(&steps, &progress) {
            Some(step) => step.clone(),
            None => {
                let first = steps[0].clone();
                progress.move_to(first.id);
                self.store.save_progress(&progress).await?;
                first
            }
        };

        Ok(ProgressReport {
            user_id: user_id.to_string(),
            progress_percentage: progress_percentage(&steps, &step),
            current_step: step,
            total_steps: steps.len(),
            completed: progress.is_completed(),
            points: progress.points,
        })
    }

    /// All steps in tour order
    pub async fn steps(&self) -> Result<Vec<TourStep>> {
        self.store.list_steps().await
    }

    pub async fn analytics(&self) -> Result<TourAnalytics> {
        let steps = self.store.list_steps().await?;
        let users = self.store.list_progress().await?;

        let completed_tours = users.iter().filter(|p| p.is_completed()).count();
        let on_step: Vec<f64> = users
            .iter()
            .filter_map(|p| current_step(&steps, p))
            .map(|step| progress_percentage(&steps, step))
            .collect();

        let average_progress = if on_step.is_empty() {
            0.0
        } else {
            let mean = on_step.iter().sum::<f64>() / on_step.len() as f64;
            (mean * 100.0).round() / 100.0
        };

        Ok(TourAnalytics {
            total_users: users.len(),
            completed_tours,
            average_progress,
        })
    }

    /// Check a quiz answer; correct answers earn [`QUIZ_POINTS`]
    pub async fn answer_quiz(
        &self,
        user_id: &str,
        quiz_id: u64,
        answer: &str,
    ) -> Result<QuizFeedback> {
        Self::check_user(user_id)?;
        let quiz = self
            .store
            .get_quiz(quiz_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Quiz {} not found", quiz_id)))?;

        let _guard = self.user_locks.lock(user_id).await;

        let mut progress = self.load_progress(user_id).await?;
        let is_correct = quiz.is_correct(answer);

        if is_correct {
            progress.points = progress.points.saturating_add(QUIZ_POINTS);
            self.store.save_progress(&progress).await?;
            TOUR_EVENTS_TOTAL.with_label_values(&["quiz_correct"]).inc();
        } else {
            TOUR_EVENTS_TOTAL.with_label_values(&["quiz_incorrect"]).inc();
        }

        Ok(QuizFeedback {
            is_correct,
            feedback: if is_correct {
                format!("Correct! You earned {} points.", QUIZ_POINTS)
            } else {
                "Sorry, that's not correct. Try again!".to_string()
            },
            current_points: progress.points,
        })
    }

    pub async fn points(&self, user_id: &str) -> Result<u32> {
        Self::check_user(user_id)?;
        Ok(self
            .store
            .get_progress(user_id)
            .await?
            .map_or(0, |p| p.points))
    }

    /// The visitor's current step without creating a progress record
    pub async fn peek_step(&self, user_id: &str) -> Result<Option<TourStep>> {
        let Some(progress) = self.store.get_progress(user_id).await? else {
            return Ok(None);
        };
        let steps = self.store.list_steps().await?;
        Ok(current_step(&steps, &progress).cloned())
    }
}

/// The step a visitor is on, if it still exists
fn current_step<'a>(steps: &'a [TourStep], progress: &UserProgress) -> Option<&'a TourStep> {
    progress
        .current_step_id
        .and_then(|id| steps.iter().find(|s| s.id == id))
}

/// Share of steps at or before `step`, in percent
pub fn progress_percentage(steps: &[TourStep], step: &TourStep) -> f64 {
    if steps.is_empty() {
        return 0.0;
    }
    let reached = steps.iter().filter(|s| s.order <= step.order).count();
    reached as f64 / steps.len() as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;

    fn step(id: u64, order: i32) -> TourStep {
        TourStep {
            id,
            order,
            title: format!("Step {}", order),
            description: String::new(),
            page_name: format!("page{}", order),
            section_id: None,
            content_type: ContentType::Text,
            content: String::new(),
        }
    }

    #[test]
    fn test_percentage_tolerates_gaps() {
        let steps = vec![step(1, 10), step(2, 20), step(3, 50), step(4, 90)];
        assert_eq!(progress_percentage(&steps, &steps[0]), 25.0);
        assert_eq!(progress_percentage(&steps, &steps[2]), 75.0);
        assert_eq!(progress_percentage(&steps, &steps[3]), 100.0);
    }

    #[test]
    fn test_current_step_ignores_removed_steps() {
        let steps = vec![step(1, 1)];
        let progress = UserProgress::new("visitor", Some(99));
        assert!(current_step(&steps, &progress).is_none());
    }

    #[tokio::test]
    async fn test_visitor_locks_released_after_use() {
        let store = crate::state::create_in_memory_store();
        store.save_step(&step(1, 1)).await.unwrap();
        store.save_step(&step(2, 2)).await.unwrap();
        let tours = Arc::new(TourService::new(store));

        let handles: Vec<_> = (0..50)
            .map(|n| {
                let tours = tours.clone();
                tokio::spawn(async move { tours.next_step(&format!("visitor-{}", n % 5)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert!(tours.user_locks.is_empty());
        assert_eq!(tours.analytics().await.unwrap().total_users, 5);
    }
}
