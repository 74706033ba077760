// Document ledger
// In-process bookkeeping of ingested documents per user. The persisted
// vector store is the durable authority; the ledger carries the document
// objects created this session and feeds the context fallback path.


use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// A contiguous slice of a document's normalized text; immutable once
/// produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub index: u32,
}

/// An ingested document. Never mutated after creation; destroyed only by
/// explicit deletion or retention eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Globally unique; the sole handle used for deletion
    pub doc_id: Uuid,
    pub user_id: String,
    pub title: String,
    /// Normalized source text
    pub raw_text: String,
    pub chunks: Vec<Chunk>,
    pub created_at: DateTime<Utc>,
}

impl Document {
    /// Create a document from its normalized text and chunked segments,
    /// assigning a fresh id and timestamp.
    #[inline]
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        raw_text: impl Into<String>,
        chunk_texts: Vec<String>,
    ) -> Self {
        let chunks = chunk_texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Chunk {
                text,
                index: index as u32,
            })
            .collect();

        Self {
            doc_id: Uuid::new_v4(),
            user_id: user_id.into(),
            title: title.into(),
            raw_text: raw_text.into(),
            chunks,
            created_at: Utc::now(),
        }
    }
}

/// Per-user document bookkeeping
#[derive(Debug, Default)]
pub struct DocumentLedger {
    documents: Vec<Document>,
}

impl DocumentLedger {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn register(&mut self, document: Document) {
        debug!(
            "Registered document '{}' ({}) with {} chunks for user {}",
            document.title,
            document.doc_id,
            document.chunks.len(),
            document.user_id
        );
        self.documents.push(document);
    }

    /// Remove a document by id; true if it was present
    #[inline]
    pub fn remove(&mut self, doc_id: Uuid) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.doc_id != doc_id);
        self.documents.len() != before
    }

    #[inline]
    pub fn get(&self, doc_id: Uuid) -> Option<&Document> {
        self.documents.iter().find(|d| d.doc_id == doc_id)
    }

    /// All of a user's documents in insertion order
    #[inline]
    pub fn user_documents(&self, user_id: &str) -> Vec<&Document> {
        self.documents
            .iter()
            .filter(|d| d.user_id == user_id)
            .collect()
    }

    #[inline]
    pub fn count_for(&self, user_id: &str) -> usize {
        self.documents.iter().filter(|d| d.user_id == user_id).count()
    }

    /// The user's earliest document by creation time
    #[inline]
    pub fn oldest_for(&self, user_id: &str) -> Option<&Document> {
        self.documents
            .iter()
            .filter(|d| d.user_id == user_id)
            .min_by_key(|d| d.created_at)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    #[inline]
    pub fn clear(&mut self) {
        self.documents.clear();
    }
}
