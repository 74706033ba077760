// Answer generation boundary
// The engine hands a question and its assembled context to an opaque
// Generator; everything about the model call lives behind this trait.

#[cfg(test)]
mod tests;

use anyhow::Result;

/// Instruction template for grounded answering. The generator must answer
/// from the supplied context, directly and specifically, and only declare
/// information unavailable when it truly is absent.
pub const ANSWER_SYSTEM_PROMPT: &str = "\
You are a helpful AI assistant that answers questions based on provided context.

Instructions:
1. ALWAYS try to find the answer in the provided context first
2. If the information exists in the context, provide it directly and confidently
3. Extract specific facts, dates, numbers, and details from the context
4. Be direct and specific - don't say \"the context doesn't specify\" if the information is there
5. Only say information is not available if it truly cannot be found in the context";

/// Sampling options for a completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for GenerationOptions {
    #[inline]
    fn default() -> Self {
        Self {
            temperature: 0.1,
            top_p: 0.95,
        }
    }
}

/// The opaque generation capability
pub trait Generator: Send + Sync {
    fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> Result<String>;
}

/// Build the user prompt pairing a question with its assembled context
#[inline]
pub fn answer_prompt(question: &str, context: &str) -> String {
    format!(
        "Context:\n{context}\n\nQuestion: {question}\n\n\
         Please answer the question based on the context provided above."
    )
}
