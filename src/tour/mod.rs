//! Guided site tour
//!
//! Visitors walk an ordered list of steps, each tied to a page. Progress is
//! kept per visitor in a [`crate::state::TourStore`]; quizzes attached to
//! steps award points.

mod service;

pub use service::{
    progress_percentage, ProgressReport, QuizFeedback, StepOutcome, TourAnalytics, TourService,
    TourStart, QUIZ_POINTS,
};
