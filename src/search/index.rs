//! Tantivy-backed content index

use crate::models::{ContentType, Document, DocumentId};
use crate::retrieval::{Predicate, RetrievalResult, SearchEngine, TermMode, TextQuery};
use crate::search::config::SearchConfig;
use crate::search::document::{
    build_content_schema, english_analyzer, from_tantivy_doc, to_tantivy_doc, ContentFields,
    CONTENT_TOKENIZER,
};
use crate::search::error::{SearchError, SearchResult};
use async_trait::async_trait;
use parking_lot::RwLock as SyncRwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::{DocSetCollector, TopDocs};
use tantivy::query::{AllQuery, BooleanQuery, Occur, PhraseQuery, Query, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::tokenizer::{TextAnalyzer, TokenStream};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use validator::Validate;

/// Index statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexStats {
    /// Total number of documents in the index
    pub total_documents: u64,

    /// Number of segments
    pub num_segments: usize,

    /// Document count per content type
    pub by_content_type: BTreeMap<String, usize>,
}

/// An analyzed query term and its token position
type AnalyzedTerm = (usize, String);

/// Drop every operation queued since the last commit, keeping the index and
/// the document mirror in step
fn discard_staged(writer: &mut IndexWriter) {
    if let Err(e) = writer.rollback() {
        warn!(error = %e, "Failed to roll back staged index operations");
    }
}

/// Site content store with English full-text search.
///
/// Text queries run against tantivy. A copy of every document is kept in
/// memory, ordered by id, for substring and trigram predicates.
pub struct ContentIndex {
    index: Index,

    fields: ContentFields,

    /// Index writer (wrapped in RwLock for thread-safety)
    writer: Arc<RwLock<IndexWriter>>,

    reader: IndexReader,

    analyzer: TextAnalyzer,

    documents: SyncRwLock<BTreeMap<DocumentId, Document>>,

    config: SearchConfig,
}

impl ContentIndex {
    /// Open the configured index, creating it when missing
    pub async fn new(config: SearchConfig) -> SearchResult<Self> {
        config
            .validate()
            .map_err(SearchError::InvalidConfiguration)?;

        let index = match &config.index_path {
            Some(path) => Self::open_or_create(path)?,
            None => Index::create_in_ram(build_content_schema()),
        };

        let analyzer = english_analyzer()?;
        index
            .tokenizers()
            .register(CONTENT_TOKENIZER, analyzer.clone());

        let fields = ContentFields::from_schema(&index.schema())?;

        let writer: IndexWriter = index
            .writer_with_num_threads(1, config.writer_heap_size)
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create writer: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| SearchError::IndexInitFailed(format!("Failed to create reader: {}", e)))?;

        let documents = Self::load_stored(&reader, &fields)?;
        if !documents.is_empty() {
            info!(documents = documents.len(), "Opened existing content index");
        }

        Ok(Self {
            index,
            fields,
            writer: Arc::new(RwLock::new(writer)),
            reader,
            analyzer,
            documents: SyncRwLock::new(documents),
            config,
        })
    }

    fn open_or_create(path: &Path) -> SearchResult<Index> {
        std::fs::create_dir_all(path).map_err(|e| {
            SearchError::IndexInitFailed(format!("Failed to create index directory: {}", e))
        })?;

        if path.join("meta.json").exists() {
            Index::open_in_dir(path).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to open existing index: {}", e))
            })
        } else {
            Index::create_in_dir(path, build_content_schema()).map_err(|e| {
                SearchError::IndexInitFailed(format!("Failed to create new index: {}", e))
            })
        }
    }

    fn load_stored(
        reader: &IndexReader,
        fields: &ContentFields,
    ) -> SearchResult<BTreeMap<DocumentId, Document>> {
        let searcher = reader.searcher();
        let mut documents = BTreeMap::new();

        for address in searcher.search(&AllQuery, &DocSetCollector)? {
            let doc: TantivyDocument = searcher.doc(address)?;
            let document = from_tantivy_doc(&doc, fields)?;
            documents.insert(document.id, document);
        }

        Ok(documents)
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn index(&self) -> &Index {
        &self.index
    }

    /// Add or replace a single document
    pub async fn index_document(&self, document: &Document) -> SearchResult<()> {
        self.index_documents(std::slice::from_ref(document))
            .await
            .map(|_| ())
    }

    /// Add or replace documents in one commit
    pub async fn index_documents(&self, documents: &[Document]) -> SearchResult<usize> {
        for document in documents {
            document.validate().map_err(|e| {
                SearchError::IndexingFailed(format!("Invalid document {}: {}", document.id, e))
            })?;
        }

        let mut writer = self.writer.write().await;

        let staged = documents.iter().try_for_each(|document| {
            writer.delete_term(Term::from_field_u64(self.fields.id, document.id));
            writer
                .add_document(to_tantivy_doc(document, &self.fields))
                .map(|_| ())
                .map_err(|e| {
                    SearchError::IndexingFailed(format!(
                        "Failed to add document {}: {}",
                        document.id, e
                    ))
                })
        });
        if let Err(e) = staged {
            discard_staged(&mut writer);
            return Err(e);
        }

        if let Err(e) = writer.commit() {
            discard_staged(&mut writer);
            return Err(SearchError::IndexingFailed(format!(
                "Failed to commit batch: {}",
                e
            )));
        }
        self.reader.reload()?;

        let mut mirror = self.documents.write();
        for document in documents {
            mirror.insert(document.id, document.clone());
        }

        debug!(count = documents.len(), "Indexed documents");
        Ok(documents.len())
    }

    /// Remove a document; `false` when it was not present
    pub async fn delete_document(&self, id: DocumentId) -> SearchResult<bool> {
        if !self.documents.read().contains_key(&id) {
            return Ok(false);
        }

        let mut writer = self.writer.write().await;
        writer.delete_term(Term::from_field_u64(self.fields.id, id));
        writer.commit().map_err(|e| {
            SearchError::DeletionFailed(format!("Failed to commit deletion: {}", e))
        })?;
        self.reader.reload()?;

        Ok(self.documents.write().remove(&id).is_some())
    }

    /// Load documents from a JSON array file
    pub async fn load_seed(&self, path: &Path) -> SearchResult<usize> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            SearchError::SeedFailed(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let documents: Vec<Document> = serde_json::from_str(&raw).map_err(|e| {
            SearchError::SeedFailed(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let count = self.index_documents(&documents).await?;
        info!(path = %path.display(), documents = count, "Loaded content seed");
        Ok(count)
    }

    pub fn get(&self, id: DocumentId) -> Option<Document> {
        self.documents.read().get(&id).cloned()
    }

    /// Documents in ascending id order, optionally of one type
    pub fn list(&self, content_type: Option<ContentType>) -> Vec<Document> {
        self.documents
            .read()
            .values()
            .filter(|d| content_type.map_or(true, |ct| d.content_type == ct))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }

    pub fn stats(&self) -> IndexStats {
        let searcher = self.reader.searcher();

        let mut by_content_type = BTreeMap::new();
        for document in self.documents.read().values() {
            *by_content_type
                .entry(document.content_type.to_string())
                .or_insert(0) += 1;
        }

        IndexStats {
            total_documents: searcher.num_docs(),
            num_segments: searcher.segment_readers().len(),
            by_content_type,
        }
    }

    /// Run the English analyzer over `text`
    fn analyze(&self, text: &str) -> Vec<AnalyzedTerm> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(text);
        let mut terms = Vec::new();
        while stream.advance() {
            let token = stream.token();
            terms.push((token.position, token.text.clone()));
        }
        terms
    }

    /// Each term must (All) or may (Any) appear in title or content
    fn terms_query(&self, terms: &[AnalyzedTerm], mode: TermMode) -> Box<dyn Query> {
        let occur = match mode {
            TermMode::All => Occur::Must,
            TermMode::Any => Occur::Should,
        };

        let clauses = terms
            .iter()
            .map(|(_, text)| {
                let per_field: Vec<(Occur, Box<dyn Query>)> = self
                    .fields
                    .text_fields()
                    .iter()
                    .map(|&field| {
                        let query: Box<dyn Query> = Box::new(TermQuery::new(
                            Term::from_field_text(field, text),
                            IndexRecordOption::WithFreqs,
                        ));
                        (Occur::Should, query)
                    })
                    .collect();
                let query: Box<dyn Query> = Box::new(BooleanQuery::new(per_field));
                (occur, query)
            })
            .collect();

        Box::new(BooleanQuery::new(clauses))
    }

    /// Terms at their relative positions in title or content
    fn phrase_query(&self, terms: &[AnalyzedTerm]) -> Box<dyn Query> {
        let first = terms.first().map_or(0, |(position, _)| *position);

        let per_field: Vec<(Occur, Box<dyn Query>)> = self
            .fields
            .text_fields()
            .iter()
            .map(|&field| {
                let query: Box<dyn Query> = match terms {
                    [(_, text)] => Box::new(TermQuery::new(
                        Term::from_field_text(field, text),
                        IndexRecordOption::WithFreqs,
                    )),
                    _ => Box::new(PhraseQuery::new_with_offset(
                        terms
                            .iter()
                            .map(|(position, text)| {
                                (position - first, Term::from_field_text(field, text))
                            })
                            .collect(),
                    )),
                };
                (Occur::Should, query)
            })
            .collect();

        Box::new(BooleanQuery::new(per_field))
    }

    /// Normalized score of every matching document
    fn scored_ids(&self, query: &dyn Query) -> SearchResult<HashMap<DocumentId, f32>> {
        let searcher = self.reader.searcher();
        let limit = (searcher.num_docs() as usize).max(1);

        let top_docs = searcher
            .search(query, &TopDocs::with_limit(limit))
            .map_err(|e| SearchError::SearchFailed(e.to_string()))?;

        let mut ranks = HashMap::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            if let Some(id) = doc.get_first(self.fields.id).and_then(|v| v.as_u64()) {
                ranks.insert(id, normalize_score(score));
            }
        }
        Ok(ranks)
    }

    fn text_rank(&self, query: &TextQuery) -> SearchResult<HashMap<DocumentId, f32>> {
        let terms = self.analyze(&query.text);
        if terms.is_empty() {
            return Ok(HashMap::new());
        }
        self.scored_ids(self.terms_query(&terms, query.mode).as_ref())
    }

    fn phrase_text_rank(&self, text: &str) -> SearchResult<HashMap<DocumentId, f32>> {
        let terms = self.analyze(text);
        if terms.is_empty() {
            return Ok(HashMap::new());
        }
        self.scored_ids(self.phrase_query(&terms).as_ref())
    }

    fn select_documents(&self, predicate: &Predicate) -> SearchResult<Vec<Document>> {
        let mut full_text: HashMap<usize, HashSet<DocumentId>> = HashMap::new();
        for (idx, clause) in predicate.clauses().iter().enumerate() {
            if let Some(query) = clause.text_query() {
                full_text.insert(idx, self.text_rank(&query)?.into_keys().collect());
            }
        }

        let documents = self.documents.read();
        Ok(documents
            .values()
            .filter(|document| {
                predicate.matches_with(document, |idx, document| {
                    full_text
                        .get(&idx)
                        .map_or(false, |ids| ids.contains(&document.id))
                })
            })
            .cloned()
            .collect())
    }
}

/// Map an unbounded BM25 score into [0, 1)
fn normalize_score(score: f32) -> f32 {
    if score.is_finite() && score > 0.0 {
        score / (1.0 + score)
    } else {
        0.0
    }
}

#[async_trait]
impl SearchEngine for ContentIndex {
    async fn select(&self, predicate: &Predicate) -> RetrievalResult<Vec<Document>> {
        Ok(self.select_documents(predicate)?)
    }

    async fn rank(&self, query: &TextQuery) -> RetrievalResult<HashMap<DocumentId, f32>> {
        Ok(self.text_rank(query)?)
    }

    async fn phrase_rank(&self, text: &str) -> RetrievalResult<HashMap<DocumentId, f32>> {
        Ok(self.phrase_text_rank(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retrieval::{MatchClause, MatchField};
    use tempfile::TempDir;

    async fn seeded() -> ContentIndex {
        let index = ContentIndex::new(SearchConfig::default()).await.unwrap();
        index
            .index_documents(&[
                Document::new(
                    1,
                    "Autopod Pricing",
                    "Our Autopod-based pricing model",
                    ContentType::Text,
                ),
                Document::new(2, "Careers", "Open roles in Bangalore", ContentType::Blog),
            ])
            .await
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_discarded_batch_never_reaches_index() {
        let index = seeded().await;

        {
            let mut writer = index.writer.write().await;
            writer.delete_term(Term::from_field_u64(index.fields.id, 1));
            writer
                .add_document(to_tantivy_doc(
                    &Document::new(7, "Half Written", "never committed", ContentType::Text),
                    &index.fields,
                ))
                .unwrap();
            discard_staged(&mut writer);
        }

        index
            .index_document(&Document::new(
                3,
                "Services",
                "Cloud platforms",
                ContentType::Text,
            ))
            .await
            .unwrap();

        assert_eq!(index.stats().total_documents, 3);
        let staged_only = index
            .rank(&TextQuery::new("committed", TermMode::Any))
            .await
            .unwrap();
        assert!(staged_only.is_empty());
        let kept = index
            .rank(&TextQuery::new("autopod", TermMode::Any))
            .await
            .unwrap();
        assert!(kept.contains_key(&1));
    }

    #[tokio::test]
    async fn test_index_creation() {
        let index = ContentIndex::new(SearchConfig::default()).await.unwrap();
        assert!(index.is_empty());
        assert_eq!(index.stats().total_documents, 0);
    }

    #[tokio::test]
    async fn test_reopen_from_disk() {
        let temp_dir = TempDir::new().unwrap();
        let config = SearchConfig {
            index_path: Some(temp_dir.path().to_path_buf()),
            ..Default::default()
        };

        {
            let index = ContentIndex::new(config.clone()).await.unwrap();
            index
                .index_document(&Document::new(3, "Demo", "Product demo", ContentType::Video))
                .await
                .unwrap();
        }

        let reopened = ContentIndex::new(config).await.unwrap();
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get(3).unwrap().content_type, ContentType::Video);
    }

    #[tokio::test]
    async fn test_stemmed_rank() {
        let index = seeded().await;
        let ranks = index
            .rank(&TextQuery::new("priced models", TermMode::All))
            .await
            .unwrap();
        assert!(ranks[&1] > 0.0 && ranks[&1] < 1.0);
        assert!(!ranks.contains_key(&2));
    }

    #[tokio::test]
    async fn test_all_terms_requires_every_word() {
        let index = seeded().await;
        let all = index
            .rank(&TextQuery::new("pricing careers", TermMode::All))
            .await
            .unwrap();
        assert!(all.is_empty());

        let any = index
            .rank(&TextQuery::new("pricing careers", TermMode::Any))
            .await
            .unwrap();
        assert_eq!(any.len(), 2);
    }

    #[tokio::test]
    async fn test_phrase_rank_needs_adjacent_terms() {
        let index = seeded().await;
        let adjacent = index.phrase_rank("pricing model").await.unwrap();
        assert!(adjacent.contains_key(&1));

        let reversed = index.phrase_rank("model pricing").await.unwrap();
        assert!(reversed.is_empty());

        let stop_words_only = index.phrase_rank("the of").await.unwrap();
        assert!(stop_words_only.is_empty());
    }

    #[tokio::test]
    async fn test_select_in_id_order() {
        let index = seeded().await;
        let predicate = Predicate::any([
            MatchClause::contains(MatchField::Indexed, "bangalore"),
            MatchClause::full_text(&TextQuery::new("autopod", TermMode::All)),
        ]);

        let ids: Vec<_> = index
            .select(&predicate)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_replace_and_delete() {
        let index = seeded().await;
        index
            .index_document(&Document::new(2, "Jobs", "Hiring now", ContentType::Blog))
            .await
            .unwrap();
        assert_eq!(index.len(), 2);
        assert_eq!(index.get(2).unwrap().title, "Jobs");
        assert_eq!(index.stats().total_documents, 2);

        assert!(index.delete_document(2).await.unwrap());
        assert!(!index.delete_document(2).await.unwrap());
        assert_eq!(index.list(Some(ContentType::Blog)).len(), 0);
        assert_eq!(index.stats().total_documents, 1);
    }

    #[tokio::test]
    async fn test_invalid_document_rejected() {
        let index = ContentIndex::new(SearchConfig::default()).await.unwrap();
        let result = index
            .index_document(&Document::new(1, "", "no title", ContentType::Text))
            .await;
        assert!(matches!(result, Err(SearchError::IndexingFailed(_))));
    }
}
