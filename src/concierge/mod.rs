//! Website concierge
//!
//! Turns a visitor message into a prompt (company profile, tour position,
//! recent conversation and retrieved content), asks a language model for an
//! answer, and splits that answer into a short reply plus a detailed
//! follow-up served by [`ConciergeAssistant::more_info`].

pub mod actions;
pub mod assistant;
pub mod llm;
pub mod prompt;

pub use actions::{extract_actions, Action};
pub use assistant::{ChatReply, ChatRequest, ConciergeAssistant, MoreInfoReply};
pub use llm::{create_language_model, HttpLanguageModel, LanguageModel, UnconfiguredModel};
pub use prompt::{PromptBuilder, PromptContext, MORE_INFO_QUESTION};
