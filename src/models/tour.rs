use crate::models::ContentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One stop of the guided tour, tied to a page of the site
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct TourStep {
    /// Unique identifier
    pub id: u64,

    /// Position in the tour (unique, gaps allowed)
    pub order: i32,

    /// Step title
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// What the visitor sees at this step
    pub description: String,

    /// Page this step lives on
    #[validate(length(min = 1, max = 100))]
    pub page_name: String,

    /// Optional anchor within the page
    #[serde(default)]
    pub section_id: Option<String>,

    /// Kind of media attached to the step
    #[serde(default)]
    pub content_type: ContentType,

    /// Attached media URL or text
    #[serde(default)]
    pub content: String,
}

/// A visitor's position in the tour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProgress {
    /// Visitor identifier supplied by the frontend
    pub user_id: String,

    /// Step the visitor is currently on
    pub current_step_id: Option<u64>,

    /// Quiz points earned
    pub points: u32,

    /// When the visitor first started the tour
    pub started_at: DateTime<Utc>,

    /// Last progress change
    pub updated_at: DateTime<Utc>,

    /// Set once the visitor advanced past the last step
    pub completed_at: Option<DateTime<Utc>>,
}

impl UserProgress {
    /// Create progress for a visitor positioned at `step_id`
    pub fn new(user_id: impl Into<String>, step_id: Option<u64>) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            current_step_id: step_id,
            points: 0,
            started_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Move to another step
    pub fn move_to(&mut self, step_id: u64) {
        self.current_step_id = Some(step_id);
        self.updated_at = Utc::now();
    }

    /// Mark the tour as finished
    pub fn complete(&mut self) {
        let now = Utc::now();
        self.completed_at.get_or_insert(now);
        self.updated_at = now;
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// A multiple-choice question attached to a tour step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Validate)]
pub struct Quiz {
    pub id: u64,
    pub tour_step_id: u64,
    #[validate(length(min = 1))]
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
}

impl Quiz {
    /// Exact-match answer check
    pub fn is_correct(&self, answer: &str) -> bool {
        answer == self.correct_answer
    }
}
