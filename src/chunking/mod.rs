// Text normalization and chunking
// Splits normalized text into overlapping, embedding-sized segments


use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How far back from a window end to look for a sentence terminator.
const SENTENCE_LOOKBACK: usize = 100;

/// Configuration for text chunking
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Window size in characters
    pub chunk_size: usize,
    /// Characters carried over between adjacent chunks
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    #[inline]
    fn default() -> Self {
        Self {
            chunk_size: 600,
            overlap: 100,
        }
    }
}

/// Collapse all whitespace runs to single spaces and trim the ends
#[inline]
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace().join(" ")
}

/// Split text into overlapping chunks of at most `chunk_size` characters.
///
/// Windows are cut at the nearest sentence terminator within the last
/// `min(100, chunk_size)` characters when one exists, and adjacent chunks
/// share up to `overlap` characters. Operates on characters, so multi-byte
/// text never splits inside a code point. Empty segments are discarded.
#[inline]
pub fn chunk_text(text: &str, config: &ChunkingConfig) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();

    if chars.is_empty() || text.trim().is_empty() {
        return Vec::new();
    }

    if chars.len() <= config.chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        // The nominal window end; intentionally not clamped so the next
        // start keeps advancing by chunk_size - overlap on the final window.
        let mut end = start + config.chunk_size;

        if end < chars.len() {
            // Prefer cutting at a sentence boundary near the window end.
            let lookback = SENTENCE_LOOKBACK.min(config.chunk_size);
            for i in 0..lookback {
                if matches!(chars[end - i - 1], '.' | '!' | '?') {
                    end -= i;
                    break;
                }
            }
        }

        let slice_end = end.min(chars.len());
        let chunk: String = chars[start..slice_end].iter().collect();
        let chunk = chunk.trim();
        if !chunk.is_empty() {
            chunks.push(chunk.to_string());
        }

        // Overlap the next window with this one; force advancement when
        // overlap >= chunk_size would otherwise stall the scan.
        let next = end.saturating_sub(config.overlap);
        start = if next > start { next } else { slice_end };
    }

    debug!(
        "Chunked {} chars into {} chunks (chunk_size={}, overlap={})",
        chars.len(),
        chunks.len(),
        config.chunk_size,
        config.overlap
    );

    chunks
}
