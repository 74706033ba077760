// Context assembly strategies
// Two interchangeable ways of turning a user's stored chunks into the
// context string handed to the generator. The caller picks one; the
// store contract is the same for both.

#[cfg(test)]
mod tests;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use crate::ledger::DocumentLedger;
use crate::store::{RecordMetadata, VectorStore};

/// Divider between document blocks in an assembled context
const DOCUMENT_DIVIDER: &str = "\n\n---\n\n";

/// Question words and glue dropped before keyword scoring
const STOP_WORDS: &[&str] = &[
    "when", "where", "what", "who", "how", "why", "is", "are", "was", "were", "the", "a", "an",
    "do", "does", "did",
];

/// Small fixed synonym table; expansions score at half the weight of the
/// question's own terms.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("established", &["founded", "created", "started", "began"]),
    ("founded", &["established", "created", "started", "began"]),
    ("located", &["location", "place", "site", "address"]),
    ("price", &["cost", "fee", "amount"]),
    ("author", &["writer", "creator"]),
];

/// Weight multiplier for terms taken verbatim from the question
const QUESTION_TERM_WEIGHT: f32 = 2.0;
/// Weight multiplier for synonym-expanded terms
const SYNONYM_TERM_WEIGHT: f32 = 1.0;

/// Strategy for assembling answer context from a user's stored material
pub trait ContextStrategy: Send + Sync {
    fn assemble(
        &self,
        question: &str,
        user_id: &str,
        store: &VectorStore,
        ledger: &DocumentLedger,
    ) -> String;
}

/// Caller-facing strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Everything the user has stored, grouped per document (shipped default)
    #[default]
    Full,
    /// Top-k chunks by keyword overlap with the question
    Keyword,
}

impl StrategyKind {
    #[inline]
    pub fn strategy(self, keyword_top_k: usize) -> Box<dyn ContextStrategy> {
        match self {
            Self::Full => Box::new(FullDocumentContext),
            Self::Keyword => Box::new(KeywordRankedContext {
                top_k: keyword_top_k,
            }),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    #[inline]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(Self::Full),
            "keyword" => Ok(Self::Keyword),
            other => Err(format!(
                "Unknown context strategy '{other}' (expected 'full' or 'keyword')"
            )),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Keyword => write!(f, "keyword"),
        }
    }
}

/// Concatenates the full text of every chunk the user has stored, grouped
/// and re-joined per document. Not similarity-ranked; the question only
/// matters to the generator downstream.
pub struct FullDocumentContext;

impl ContextStrategy for FullDocumentContext {
    #[inline]
    fn assemble(
        &self,
        _question: &str,
        user_id: &str,
        store: &VectorStore,
        ledger: &DocumentLedger,
    ) -> String {
        let user_records: Vec<&RecordMetadata> = store
            .metadata()
            .iter()
            .filter(|m| m.user_id == user_id)
            .collect();

        if !user_records.is_empty() {
            // Group chunks per document, first-seen order, chunks in
            // insertion order within each group.
            let doc_order: Vec<Uuid> = user_records.iter().map(|m| m.doc_id).unique().collect();

            let blocks: Vec<String> = doc_order
                .iter()
                .map(|doc_id| {
                    let chunks: Vec<&RecordMetadata> = user_records
                        .iter()
                        .filter(|m| m.doc_id == *doc_id)
                        .copied()
                        .collect();
                    let title = &chunks[0].doc_title;
                    let body = chunks.iter().map(|m| m.text.as_str()).join(" ");
                    format!("Document: {title}\n{body}")
                })
                .collect();

            let context = blocks.join(DOCUMENT_DIVIDER);
            debug!(
                "Assembled full context: {} chars from {} documents",
                context.len(),
                doc_order.len()
            );
            return context;
        }

        // The persisted store has nothing for this user; fall back to
        // documents ingested in this process.
        let documents = ledger.user_documents(user_id);
        if documents.is_empty() {
            return String::new();
        }

        let context = documents
            .iter()
            .map(|d| format!("Document: {}\n{}", d.title, d.raw_text))
            .join(DOCUMENT_DIVIDER);
        debug!(
            "Assembled fallback context from {} in-process documents",
            documents.len()
        );
        context
    }
}

/// Ranks the user's chunks by weighted keyword overlap with the question
/// and keeps the best `top_k`.
pub struct KeywordRankedContext {
    pub top_k: usize,
}

impl ContextStrategy for KeywordRankedContext {
    #[inline]
    fn assemble(
        &self,
        question: &str,
        user_id: &str,
        store: &VectorStore,
        _ledger: &DocumentLedger,
    ) -> String {
        let keywords = extract_keywords(question);
        if keywords.is_empty() {
            return String::new();
        }
        let expansions = expand_keywords(&keywords);

        debug!(
            "Keyword search: terms={:?}, expansions={:?}",
            keywords, expansions
        );

        let mut scored: Vec<(f32, &RecordMetadata)> = store
            .metadata()
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                let score = score_text(&m.text, &keywords, &expansions);
                (score > 0.0).then_some((score, m))
            })
            .collect();

        // Stable sort: equal scores keep insertion order
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.top_k);

        scored
            .iter()
            .map(|(_, m)| format!("Document: {}\n{}", m.doc_title, m.text))
            .join(DOCUMENT_DIVIDER)
    }
}

/// Lowercased question terms with stop words and short tokens dropped
fn extract_keywords(question: &str) -> Vec<String> {
    question
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.len() > 2 && !STOP_WORDS.contains(word))
        .map(str::to_string)
        .unique()
        .collect()
}

/// Synonym expansions for the given keywords, minus the keywords themselves
fn expand_keywords(keywords: &[String]) -> Vec<String> {
    keywords
        .iter()
        .flat_map(|keyword| {
            SYNONYMS
                .iter()
                .filter(move |(term, _)| *term == keyword.as_str())
                .flat_map(|(_, expansions)| expansions.iter().map(|e| (*e).to_string()))
        })
        .filter(|expansion| !keywords.contains(expansion))
        .unique()
        .collect()
}

/// Weighted term frequency of the keywords within `text`
fn score_text(text: &str, keywords: &[String], expansions: &[String]) -> f32 {
    let text_lower = text.to_lowercase();

    let question_hits: usize = keywords
        .iter()
        .map(|k| text_lower.matches(k.as_str()).count())
        .sum();
    let synonym_hits: usize = expansions
        .iter()
        .map(|k| text_lower.matches(k.as_str()).count())
        .sum();

    (question_hits as f32).mul_add(QUESTION_TERM_WEIGHT, synonym_hits as f32 * SYNONYM_TERM_WEIGHT)
}
