// Retrieval engine
// Orchestrates chunking, embedding, the vector store, and the document
// ledger: documents go in, grounded answers come out. Every public
// operation returns a Result; nothing here panics across the boundary.

pub mod context;


use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chunking::{self, ChunkingConfig};
use crate::config::RetrievalConfig;
use crate::embeddings::EmbeddingClient;
use crate::generation::{self, GenerationOptions, Generator};
use crate::ledger::{Document, DocumentLedger};
use crate::store::{RecordMetadata, VectorStore};
use crate::{GistError, Result};

pub use context::{ContextStrategy, FullDocumentContext, KeywordRankedContext, StrategyKind};

/// Documents shorter than this (trimmed) are rejected outright
const MIN_DOCUMENT_CHARS: usize = 10;
/// Questions shorter than this (trimmed) are rejected outright
const MIN_QUESTION_CHARS: usize = 3;

/// Caller-visible engine status, scoped to one user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    pub user_id: String,
    pub documents_count: usize,
    pub chunks_count: usize,
    pub vectors_ready: bool,
    pub ready_for_questions: bool,
    pub embedding_dimension: Option<usize>,
    pub memory_bytes: usize,
}

/// Per-document summary for listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub doc_id: Uuid,
    pub title: String,
    pub upload_time: DateTime<Utc>,
    pub chunk_count: usize,
}

/// The retrieval engine. The store may be shared across engines (and
/// users); all structural mutation happens under its write lock, reads
/// under the read lock, and persistence under the same lock as mutation.
pub struct RetrievalEngine {
    embedder: EmbeddingClient,
    generator: Box<dyn Generator>,
    store: Arc<RwLock<VectorStore>>,
    ledger: Mutex<DocumentLedger>,
    chunking: ChunkingConfig,
    retention_cap: usize,
    generation_options: GenerationOptions,
}

impl RetrievalEngine {
    #[inline]
    pub fn new(
        embedder: EmbeddingClient,
        generator: Box<dyn Generator>,
        store: Arc<RwLock<VectorStore>>,
        chunking: ChunkingConfig,
        retrieval: &RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            generator,
            store,
            ledger: Mutex::new(DocumentLedger::new()),
            chunking,
            retention_cap: retrieval.retention_cap,
            generation_options: GenerationOptions::default(),
        }
    }

    /// Ingest a document for `user_id`, returning its freshly assigned id.
    ///
    /// Enforces the per-user retention cap before inserting, embeds the
    /// whole chunk batch before touching the store (a document is never
    /// partially visible), and persists on success. Chunks whose
    /// embedding failed are dropped from the store with a warning; the
    /// ledger's document still lists them.
    #[inline]
    pub fn add_document(&self, text: &str, title: &str, user_id: &str) -> Result<Uuid> {
        if text.trim().chars().count() < MIN_DOCUMENT_CHARS {
            return Err(GistError::Validation(
                "Document too short to add".to_string(),
            ));
        }

        self.enforce_retention(user_id);

        let normalized = chunking::normalize_text(text);
        let chunks = chunking::chunk_text(&normalized, &self.chunking);
        if chunks.is_empty() {
            return Err(GistError::Validation(
                "No chunks created from document".to_string(),
            ));
        }

        let document = Document::new(user_id, title, normalized, chunks.clone());
        let doc_id = document.doc_id;
        let upload_time = document.created_at;

        // Embed the entire batch before any append; a mid-batch transport
        // failure must not leave the store partially mutated.
        let embeddings = self.embedder.embed_many(&chunks);

        let mut stored = 0usize;
        {
            let mut store = self.store_write();
            for (index, (chunk, embedding)) in chunks.iter().zip(embeddings).enumerate() {
                let Some(vector) = embedding else {
                    continue;
                };

                let metadata = RecordMetadata {
                    user_id: user_id.to_string(),
                    doc_id,
                    chunk_index: index as u32,
                    doc_title: title.to_string(),
                    upload_time,
                    text: chunk.clone(),
                };

                match store.add(vector, metadata) {
                    Ok(_) => stored += 1,
                    Err(e) => warn!("Dropping chunk {index} of document {doc_id}: {e}"),
                }
            }

            if stored < chunks.len() {
                warn!(
                    "Stored {}/{} chunks for document '{}'; failed chunks were dropped",
                    stored,
                    chunks.len(),
                    title
                );
            }

            self.ledger_lock().register(document);

            // Persist under the same lock as the mutation. A failure is
            // surfaced to the caller; in-memory state is not rolled back.
            store.save()?;
        }

        info!(
            "Added document '{}' ({}) with {} chunks for user {}",
            title, doc_id, stored, user_id
        );
        Ok(doc_id)
    }

    /// Assemble answer context for a question using the given strategy
    #[inline]
    pub fn context_for(
        &self,
        question: &str,
        user_id: &str,
        strategy: &dyn ContextStrategy,
    ) -> String {
        let store = self.store_read();
        let ledger = self.ledger_lock();
        strategy.assemble(question, user_id, &store, &ledger)
    }

    /// Answer a question from the user's stored material.
    ///
    /// Fails fast when the user has nothing stored, or when the chosen
    /// strategy produces no context; otherwise delegates to the generator
    /// with the grounding instruction template.
    #[inline]
    pub fn answer(
        &self,
        question: &str,
        user_id: &str,
        strategy: &dyn ContextStrategy,
    ) -> Result<String> {
        if question.trim().chars().count() < MIN_QUESTION_CHARS {
            return Err(GistError::Validation(
                "Please provide a valid question".to_string(),
            ));
        }

        {
            let store = self.store_read();
            let ledger = self.ledger_lock();
            let user_chunks = store
                .metadata()
                .iter()
                .filter(|m| m.user_id == user_id)
                .count();
            if user_chunks == 0 && ledger.count_for(user_id) == 0 {
                return Err(GistError::NotFound(
                    "No documents have been uploaded yet. Please upload a document first, \
                     then ask your question."
                        .to_string(),
                ));
            }
        }

        debug!("Answering question for user {}: {}", user_id, question);

        let context = self.context_for(question, user_id, strategy);
        if context.is_empty() {
            return Err(GistError::NotFound(
                "I couldn't find relevant information in the uploaded documents to answer \
                 your question."
                    .to_string(),
            ));
        }

        let user_prompt = generation::answer_prompt(question, &context);
        let answer = self
            .generator
            .complete(
                generation::ANSWER_SYSTEM_PROMPT,
                &user_prompt,
                &self.generation_options,
            )
            .map_err(|e| GistError::Transport(format!("Answer generation failed: {e:#}")))?;

        Ok(answer.trim().to_string())
    }

    /// Delete one of the user's documents by id, returning how many chunk
    /// records were removed.
    ///
    /// Ownership is validated first: a `doc_id` that does not exist, or
    /// belongs to a different user, is NotFound and nothing is deleted.
    #[inline]
    pub fn delete_document(&self, doc_id: Uuid, user_id: &str) -> Result<usize> {
        let mut store = self.store_write();

        let owned = store
            .metadata()
            .iter()
            .any(|m| m.doc_id == doc_id && m.user_id == user_id);
        if !owned {
            return Err(GistError::NotFound(format!(
                "Document {doc_id} not found for user {user_id}"
            )));
        }

        let removed = store.remove_by_doc_id(doc_id);
        self.ledger_lock().remove(doc_id);
        store.save()?;

        info!(
            "Deleted document {} for user {} ({} chunks removed)",
            doc_id, user_id, removed
        );
        Ok(removed)
    }

    /// Summaries of the user's stored documents, newest first
    #[inline]
    pub fn list_documents(&self, user_id: &str) -> Vec<DocumentSummary> {
        let store = self.store_read();

        // A document's chunks are stored contiguously, so grouping
        // consecutive doc ids is enough.
        let grouped = store
            .metadata()
            .iter()
            .filter(|m| m.user_id == user_id)
            .chunk_by(|m| m.doc_id);

        let mut summaries: Vec<DocumentSummary> = Vec::new();
        for (doc_id, group) in &grouped {
            let group: Vec<_> = group.collect();
            summaries.push(DocumentSummary {
                doc_id,
                title: group[0].doc_title.clone(),
                upload_time: group[0].upload_time,
                chunk_count: group.len(),
            });
        }

        summaries.sort_by_key(|s| std::cmp::Reverse(s.upload_time));
        summaries
    }

    /// Current engine status scoped to `user_id`
    #[inline]
    pub fn status(&self, user_id: &str) -> EngineStatus {
        let store = self.store_read();
        let stats = store.stats();

        let user_chunks = store
            .metadata()
            .iter()
            .filter(|m| m.user_id == user_id)
            .count();
        let user_documents = store
            .metadata()
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.doc_id)
            .unique()
            .count();

        EngineStatus {
            user_id: user_id.to_string(),
            documents_count: user_documents,
            chunks_count: user_chunks,
            vectors_ready: user_chunks > 0,
            ready_for_questions: user_chunks > 0,
            embedding_dimension: stats.dimension,
            memory_bytes: stats.memory_bytes,
        }
    }

    /// Remove every stored document and persist the empty state
    #[inline]
    pub fn clear(&self) -> Result<()> {
        let mut store = self.store_write();
        store.clear();
        self.ledger_lock().clear();
        store.save()?;
        info!("Cleared all documents and vectors");
        Ok(())
    }

    /// Evict the user's oldest documents until there is room for one more
    /// under the retention cap. The persisted store is the authority on
    /// which documents exist and how old they are.
    fn enforce_retention(&self, user_id: &str) {
        let mut store = self.store_write();

        let mut user_docs: Vec<(Uuid, DateTime<Utc>)> = Vec::new();
        for metadata in store.metadata() {
            if metadata.user_id == user_id && !user_docs.iter().any(|(id, _)| *id == metadata.doc_id)
            {
                user_docs.push((metadata.doc_id, metadata.upload_time));
            }
        }

        if user_docs.len() < self.retention_cap {
            return;
        }

        user_docs.sort_by_key(|(_, upload_time)| *upload_time);
        let excess = user_docs.len() - self.retention_cap + 1;

        for (doc_id, _) in user_docs.iter().take(excess) {
            let removed = store.remove_by_doc_id(*doc_id);
            self.ledger_lock().remove(*doc_id);
            info!(
                "Evicted oldest document {} for user {} ({} chunks removed)",
                doc_id, user_id, removed
            );
        }
    }

    fn store_read(&self) -> RwLockReadGuard<'_, VectorStore> {
        self.store.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn store_write(&self) -> RwLockWriteGuard<'_, VectorStore> {
        self.store.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn ledger_lock(&self) -> MutexGuard<'_, DocumentLedger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
