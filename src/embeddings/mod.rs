// Embedding adapter
// Wraps the opaque embedding capability with the batch semantics the
// engine relies on: empty inputs are skipped, failures are isolated per
// item, and output order always mirrors the input.


use anyhow::Result;
use tracing::{debug, warn};

/// The opaque embedding capability: one text in, one fixed-dimension
/// vector out. Implementations may fail per call.
pub trait EmbeddingBackend: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Adapter over an [`EmbeddingBackend`].
///
/// No batch API is assumed from the backend; each text is embedded with
/// an independent call.
pub struct EmbeddingClient {
    backend: Box<dyn EmbeddingBackend>,
}

impl EmbeddingClient {
    #[inline]
    pub fn new(backend: Box<dyn EmbeddingBackend>) -> Self {
        Self { backend }
    }

    /// Embed a single text. Returns `None` for empty input or a backend
    /// failure; both are logged, neither is an error for the caller.
    #[inline]
    pub fn embed_one(&self, text: &str) -> Option<Vec<f32>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            warn!("Empty text provided for embedding");
            return None;
        }

        match self.backend.embed(trimmed) {
            Ok(vector) => {
                debug!(
                    "Created embedding for text ({} chars) -> {} dims",
                    trimmed.len(),
                    vector.len()
                );
                Some(vector)
            }
            Err(e) => {
                warn!("Failed to create embedding: {e:#}");
                None
            }
        }
    }

    /// Embed many texts, preserving input order and length.
    ///
    /// Empty inputs and failed items come back as `None` at their
    /// original index, so callers can zip the result against the input
    /// list and its metadata. A failure on one text never aborts the
    /// remaining calls.
    #[inline]
    pub fn embed_many(&self, texts: &[String]) -> Vec<Option<Vec<f32>>> {
        let mut results: Vec<Option<Vec<f32>>> = vec![None; texts.len()];

        for (i, text) in texts.iter().enumerate() {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }

            match self.backend.embed(trimmed) {
                Ok(vector) => results[i] = Some(vector),
                Err(e) => {
                    warn!("Failed to embed text {i}: {e:#}");
                }
            }
        }

        let succeeded = results.iter().filter(|r| r.is_some()).count();
        debug!("Created {} embeddings from {} texts", succeeded, texts.len());

        results
    }
}
