//! Site content storage and full-text search powered by Tantivy
//!
//! [`ContentIndex`] stores the documents the concierge can cite and
//! implements [`crate::retrieval::SearchEngine`] on top of an English
//! analyzer (lower-casing, stop words, stemming) with positions indexed for
//! phrase queries.
//!
//! # Example
//!
//! ```no_run
//! use tour_concierge::models::{ContentType, Document};
//! use tour_concierge::search::{ContentIndex, SearchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let index = ContentIndex::new(SearchConfig::default()).await?;
//!     index
//!         .index_document(&Document::new(1, "Pricing", "Plans and prices", ContentType::Text))
//!         .await?;
//!
//!     println!("{} documents", index.len());
//!     Ok(())
//! }
//! ```

mod config;
mod document;
mod error;
mod index;

pub use config::{SearchConfig, SearchConfigBuilder};
pub use document::{build_content_schema, english_analyzer, ContentFields, CONTENT_TOKENIZER};
pub use error::{SearchError, SearchResult};
pub use index::{ContentIndex, IndexStats};
