//! Abstractive summary of the whole corpus.

use std::sync::Arc;

use crate::error::SummarizationError;
use crate::llm::{ChatRequest, LlmBackend};

pub const DEFAULT_MAX_WORDS: usize = 50;

pub struct Summarizer {
    backend: Arc<dyn LlmBackend>,
    max_words: usize,
}

impl Summarizer {
    pub fn new(backend: Arc<dyn LlmBackend>, max_words: usize) -> Self {
        Summarizer {
            backend,
            max_words: max_words.max(1),
        }
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    /// Summarize all `texts` as one document.
    ///
    /// The reply is cut to `max_words` words if the model overshoots, so the
    /// bound always holds.
    pub fn summarize(&self, texts: &[String]) -> Result<String, SummarizationError> {
        let document = texts.join(" ");
        let prompt = format!(
            "Summarize the text sample delimited by triple backticks in at most {} words.\n\n\
Text sample: ```{}```\n\nSummary:",
            self.max_words, document
        );
        let reply = self.backend.complete(&ChatRequest::user(prompt))?;
        Ok(limit_words(&reply, self.max_words))
    }
}

/// Keep at most `max_words` whitespace-separated words.
pub fn limit_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= max_words {
        return text.trim().to_string();
    }
    log::warn!(
        "Summary had {} words, truncating to {}",
        words.len(),
        max_words
    );
    words[..max_words].join(" ")
}

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
