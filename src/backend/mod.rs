//! Collaborator interfaces for the models behind the pipeline.
//!
//! The classifier, tokenizer and translation engine are long-lived, shared
//! read-only instances. They are handed to the pipeline explicitly so tests
//! can substitute stubs. None of them carries per-request state: the source
//! language travels as an argument to [`Tokenizer::encode`] instead of being
//! configured on the shared instance.

pub mod dev;

use anyhow::Result;
use std::sync::Arc;

/// A single label/probability pair from the language classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Raw classifier label, e.g. `__label__fr`
    pub label: String,
    /// Probability in `0.0..=1.0`
    pub probability: f32,
}

/// Label prefix used by fastText-style classifiers.
pub const LABEL_PREFIX: &str = "__label__";

impl Prediction {
    /// The ISO short code carried by the label.
    pub fn iso_code(&self) -> &str {
        self.label
            .strip_prefix(LABEL_PREFIX)
            .unwrap_or(&self.label)
    }
}

/// Language identification model.
pub trait LanguageClassifier: Send + Sync {
    /// Return up to `k` predictions for `text`, best first.
    fn predict(&self, text: &str, k: usize) -> Result<Vec<Prediction>>;
}

/// Subword tokenizer shared by every request.
pub trait Tokenizer: Send + Sync {
    /// Encode `text` as spoken in `source_lang` (an internal code).
    fn encode(&self, text: &str, source_lang: &str) -> Result<Vec<u32>>;

    /// Turn token ids back into text, skipping special tokens.
    fn decode(&self, ids: &[u32]) -> Result<String>;

    fn ids_to_tokens(&self, ids: &[u32]) -> Result<Vec<String>>;

    fn tokens_to_ids(&self, tokens: &[String]) -> Result<Vec<u32>>;
}

/// Search settings passed to the engine for one translation call.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodingOptions {
    /// Token forced as the first decoder output (the target language code)
    pub target_prefix: String,
    pub beam_size: usize,
    pub num_hypotheses: usize,
    /// Values above 1.0 penalize tokens already generated
    pub repetition_penalty: f32,
    pub length_penalty: f32,
    /// Forbid repeating any n-gram of this size (0 disables)
    pub no_repeat_ngram_size: usize,
}

/// Sequence-to-sequence translation engine.
///
/// Calls are synchronous and CPU bound; the pipeline runs them on the
/// blocking thread pool.
pub trait TranslationEngine: Send + Sync {
    /// Translate one tokenized input, returning hypotheses ranked best first.
    fn translate(&self, source: &[String], options: &DecodingOptions) -> Result<Vec<Vec<String>>>;

    /// Device the engine runs on, reported by the health endpoint.
    fn device(&self) -> &str {
        "cpu"
    }
}

/// The three collaborators a pipeline needs.
#[derive(Clone)]
pub struct Backend {
    pub classifier: Arc<dyn LanguageClassifier>,
    pub tokenizer: Arc<dyn Tokenizer>,
    pub engine: Arc<dyn TranslationEngine>,
    /// Human-readable engine name for `/health`
    pub engine_name: String,
}
