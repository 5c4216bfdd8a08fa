//! Index schema and document conversion

use crate::models::{ContentType, Document};
use crate::search::error::{SearchError, SearchResult};
use std::str::FromStr;
use tantivy::schema::*;
use tantivy::tokenizer::{
    Language, LowerCaser, RemoveLongFilter, SimpleTokenizer, Stemmer, StopWordFilter,
    TextAnalyzer,
};
use tantivy::TantivyDocument;

/// Name the English analyzer is registered under
pub const CONTENT_TOKENIZER: &str = "concierge_en";

/// Resolved schema fields
#[derive(Debug, Clone, Copy)]
pub struct ContentFields {
    pub id: Field,
    pub title: Field,
    pub content: Field,
    pub content_type: Field,
}

impl ContentFields {
    pub fn from_schema(schema: &Schema) -> SearchResult<Self> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|e| SearchError::SchemaError(format!("missing field {}: {}", name, e)))
        };

        Ok(Self {
            id: field("id")?,
            title: field("title")?,
            content: field("content")?,
            content_type: field("content_type")?,
        })
    }

    /// Fields searched by text queries
    pub fn text_fields(&self) -> [Field; 2] {
        [self.title, self.content]
    }
}

/// Build the schema for site content
pub fn build_content_schema() -> Schema {
    let mut schema_builder = Schema::builder();

    // ID - numeric key, used for deletes and result mapping
    schema_builder.add_u64_field("id", INDEXED | STORED | FAST);

    // Title and content - English-analyzed with positions for phrase queries
    let text_options = TextOptions::default()
        .set_indexing_options(
            TextFieldIndexing::default()
                .set_tokenizer(CONTENT_TOKENIZER)
                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
        )
        .set_stored();
    schema_builder.add_text_field("title", text_options.clone());
    schema_builder.add_text_field("content", text_options);

    // Content type - exact string
    schema_builder.add_text_field("content_type", STRING | STORED);

    schema_builder.build()
}

/// English analyzer: tokenize, lower-case, drop stop words, stem
pub fn english_analyzer() -> SearchResult<TextAnalyzer> {
    let stop_words = StopWordFilter::new(Language::English).ok_or_else(|| {
        SearchError::SchemaError("no English stop-word list available".to_string())
    })?;

    Ok(TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(RemoveLongFilter::limit(40))
        .filter(LowerCaser)
        .filter(stop_words)
        .filter(Stemmer::new(Language::English))
        .build())
}

/// Convert to a tantivy document
pub fn to_tantivy_doc(document: &Document, fields: &ContentFields) -> TantivyDocument {
    let mut doc = TantivyDocument::new();
    doc.add_u64(fields.id, document.id);
    doc.add_text(fields.title, &document.title);
    doc.add_text(fields.content, &document.content);
    doc.add_text(fields.content_type, document.content_type.to_string());
    doc
}

/// Rebuild a document from its stored fields
pub fn from_tantivy_doc(doc: &TantivyDocument, fields: &ContentFields) -> SearchResult<Document> {
    let id = doc
        .get_first(fields.id)
        .and_then(|v| v.as_u64())
        .ok_or_else(|| SearchError::SchemaError("stored document has no id".to_string()))?;

    let text = |field: Field| {
        doc.get_first(field)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    let content_type = doc
        .get_first(fields.content_type)
        .and_then(|v| v.as_str())
        .and_then(|s| ContentType::from_str(s).ok())
        .unwrap_or_default();

    Ok(Document {
        id,
        title: text(fields.title),
        content: text(fields.content),
        content_type,
    })
}
