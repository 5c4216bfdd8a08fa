//! Tour concierge backend
//!
//! A website concierge that walks visitors through a guided tour and answers
//! their questions from stored site content. The core is [`retrieval`]: a
//! weighted blend of full-text, phrase and trigram relevance over a tantivy
//! index ([`search`]), with a fallback phase and a result cache. The
//! [`concierge`] turns retrieved content into language-model prompts, and
//! [`tour`] tracks per-visitor tour progress and quiz points.

pub mod api;
pub mod concierge;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod retrieval;
pub mod search;
pub mod state;
pub mod tour;

pub use error::{AppError, Result};
