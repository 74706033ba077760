// Vector store
// Parallel (vector, metadata) sequences with linear-scan similarity
// search and single-file persistence. Index i in one sequence always
// corresponds to index i in the other.


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{GistError, Result};

/// Metadata stored alongside each embedding vector
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordMetadata {
    /// Owner of the document this chunk belongs to
    pub user_id: String,
    /// Document the chunk was produced from; the sole deletion handle
    pub doc_id: Uuid,
    /// Position of the chunk within its document
    pub chunk_index: u32,
    pub doc_title: String,
    pub upload_time: DateTime<Utc>,
    /// Full chunk text, kept so context can be rebuilt without re-reading
    /// the source document
    pub text: String,
}

/// A search result referencing a stored record
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord<'a> {
    pub score: f32,
    pub index: usize,
    pub metadata: &'a RecordMetadata,
}

/// Store statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub total_vectors: usize,
    pub dimension: Option<usize>,
    /// Rough in-memory footprint of vectors plus metadata
    pub memory_bytes: usize,
}

/// On-disk representation: the full (dimension, vectors, metadata) triple
#[derive(Debug, Serialize, Deserialize)]
struct PersistedState {
    dimension: Option<usize>,
    vectors: Vec<Vec<f32>>,
    metadata: Vec<RecordMetadata>,
}

/// Append-mostly vector store shared by all users; tenant isolation is
/// logical, via the `user_id` metadata field.
#[derive(Debug)]
pub struct VectorStore {
    vectors: Vec<Vec<f32>>,
    metadata: Vec<RecordMetadata>,
    dimension: Option<usize>,
    persist_path: PathBuf,
}

impl VectorStore {
    /// Create an empty store persisting to `persist_path`. Nothing is
    /// read from disk until [`load`](Self::load) is called.
    #[inline]
    pub fn new(persist_path: impl Into<PathBuf>) -> Self {
        Self {
            vectors: Vec::new(),
            metadata: Vec::new(),
            dimension: None,
            persist_path: persist_path.into(),
        }
    }

    /// Create a store and load any previously persisted state
    #[inline]
    pub fn open(persist_path: impl Into<PathBuf>) -> Self {
        let mut store = Self::new(persist_path);
        store.load();
        store
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Embedding dimension, unset until the first vector is stored
    #[inline]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    #[inline]
    pub fn persist_path(&self) -> &Path {
        &self.persist_path
    }

    /// Append a record to both parallel sequences, returning its index.
    ///
    /// The first stored vector fixes the store's dimension; later vectors
    /// must match it.
    #[inline]
    pub fn add(&mut self, vector: Vec<f32>, metadata: RecordMetadata) -> Result<usize> {
        if vector.is_empty() {
            return Err(GistError::Validation(
                "Cannot store an empty vector".to_string(),
            ));
        }

        match self.dimension {
            None => self.dimension = Some(vector.len()),
            Some(dimension) if dimension != vector.len() => {
                return Err(GistError::Validation(format!(
                    "Vector dimension mismatch: store has {}, got {}",
                    dimension,
                    vector.len()
                )));
            }
            Some(_) => {}
        }

        self.vectors.push(vector);
        self.metadata.push(metadata);
        debug_assert_eq!(self.vectors.len(), self.metadata.len());

        Ok(self.vectors.len() - 1)
    }

    /// Full scan over all stored (vector, metadata) pairs in insertion order
    #[inline]
    pub fn records(&self) -> impl Iterator<Item = (&[f32], &RecordMetadata)> {
        self.vectors
            .iter()
            .map(Vec::as_slice)
            .zip(self.metadata.iter())
    }

    /// All stored metadata in insertion order
    #[inline]
    pub fn metadata(&self) -> &[RecordMetadata] {
        &self.metadata
    }

    /// Rank all stored vectors against `query` by cosine similarity,
    /// descending. Ties keep insertion order (earlier record wins).
    #[inline]
    pub fn search(&self, query: &[f32], top_k: usize) -> Vec<ScoredRecord<'_>> {
        let mut scored: Vec<ScoredRecord<'_>> = self
            .vectors
            .iter()
            .zip(self.metadata.iter())
            .enumerate()
            .map(|(index, (vector, metadata))| ScoredRecord {
                score: cosine_similarity(query, vector),
                index,
                metadata,
            })
            .collect();

        // Stable sort so equal scores preserve insertion order
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }

    /// Remove every record belonging to `doc_id` from both sequences,
    /// returning how many were removed.
    #[inline]
    pub fn remove_by_doc_id(&mut self, doc_id: Uuid) -> usize {
        // Collect first, then delete from the back, so earlier removals
        // never invalidate the remaining indices.
        let indices: Vec<usize> = self
            .metadata
            .iter()
            .enumerate()
            .filter(|(_, m)| m.doc_id == doc_id)
            .map(|(i, _)| i)
            .collect();

        for &i in indices.iter().rev() {
            self.vectors.remove(i);
            self.metadata.remove(i);
        }

        debug_assert_eq!(self.vectors.len(), self.metadata.len());

        if !indices.is_empty() {
            debug!("Removed {} records for document {}", indices.len(), doc_id);
        }
        indices.len()
    }

    /// Persist the full store state to disk.
    ///
    /// Writes to a temporary file in the same directory and renames it
    /// into place, so a crash mid-write can never leave a file the next
    /// [`load`](Self::load) cannot parse.
    #[inline]
    pub fn save(&self) -> Result<()> {
        let state = PersistedState {
            dimension: self.dimension,
            vectors: self.vectors.clone(),
            metadata: self.metadata.clone(),
        };

        let json = serde_json::to_string(&state)
            .map_err(|e| GistError::Persistence(format!("Failed to serialize store: {e}")))?;

        if let Some(parent) = self.persist_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    GistError::Persistence(format!(
                        "Failed to create store directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let tmp_path = temp_path_for(&self.persist_path);
        fs::write(&tmp_path, json).map_err(|e| {
            GistError::Persistence(format!(
                "Failed to write store file {}: {e}",
                tmp_path.display()
            ))
        })?;

        fs::rename(&tmp_path, &self.persist_path).map_err(|e| {
            GistError::Persistence(format!(
                "Failed to move store file into place at {}: {e}",
                self.persist_path.display()
            ))
        })?;

        debug!(
            "Saved {} vectors to {}",
            self.vectors.len(),
            self.persist_path.display()
        );
        Ok(())
    }

    /// Load persisted state, replacing the in-memory contents.
    ///
    /// A missing file results in an empty store. An unreadable or corrupt
    /// file is backed up, logged, and also degrades to an empty store;
    /// loading never fails. Returns the number of records loaded.
    #[inline]
    pub fn load(&mut self) -> usize {
        self.vectors.clear();
        self.metadata.clear();
        self.dimension = None;

        if !self.persist_path.exists() {
            debug!(
                "No store file at {}, starting empty",
                self.persist_path.display()
            );
            return 0;
        }

        let content = match fs::read_to_string(&self.persist_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Failed to read store file {}: {e}",
                    self.persist_path.display()
                );
                self.backup_corrupt_file();
                return 0;
            }
        };

        let state: PersistedState = match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                warn!(
                    "Store file {} is corrupt: {e}",
                    self.persist_path.display()
                );
                self.backup_corrupt_file();
                return 0;
            }
        };

        if state.vectors.len() != state.metadata.len() {
            warn!(
                "Store file {} has desynchronized sequences ({} vectors, {} metadata)",
                self.persist_path.display(),
                state.vectors.len(),
                state.metadata.len()
            );
            self.backup_corrupt_file();
            return 0;
        }

        self.dimension = state
            .dimension
            .or_else(|| state.vectors.first().map(Vec::len));
        self.vectors = state.vectors;
        self.metadata = state.metadata;

        info!(
            "Loaded {} vectors from {}",
            self.vectors.len(),
            self.persist_path.display()
        );
        self.vectors.len()
    }

    /// Empty both sequences and reset the dimension. The backing file is
    /// left untouched until the next [`save`](Self::save).
    #[inline]
    pub fn clear(&mut self) {
        self.vectors.clear();
        self.metadata.clear();
        self.dimension = None;
        info!("Cleared vector store");
    }

    #[inline]
    pub fn stats(&self) -> StoreStats {
        let vector_bytes: usize = self
            .vectors
            .iter()
            .map(|v| v.len() * std::mem::size_of::<f32>())
            .sum();
        let metadata_bytes: usize = self
            .metadata
            .iter()
            .map(|m| {
                m.text.len()
                    + m.doc_title.len()
                    + m.user_id.len()
                    + std::mem::size_of::<RecordMetadata>()
            })
            .sum();

        StoreStats {
            total_vectors: self.vectors.len(),
            dimension: self.dimension,
            memory_bytes: vector_bytes + metadata_bytes,
        }
    }

    fn backup_corrupt_file(&self) {
        let backup_path = temp_backup_path_for(&self.persist_path);
        match fs::rename(&self.persist_path, &backup_path) {
            Ok(()) => info!("Backed up unreadable store file to {}", backup_path.display()),
            Err(e) => warn!("Failed to back up unreadable store file: {e}"),
        }
    }
}

/// Cosine similarity between two vectors; 0.0 when either has no magnitude
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "store".to_string(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!("{name}.tmp"))
}

fn temp_backup_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "store".to_string(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!("{name}.corrupted_backup"))
}
