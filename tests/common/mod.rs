//! Stub collaborators shared by the integration tests.

#![allow(dead_code)]

use anyhow::{bail, Result};
use nllb_gateway::backend::dev::CharTokenizer;
use nllb_gateway::backend::{
    Backend, DecodingOptions, LanguageClassifier, Prediction, Tokenizer, TranslationEngine,
};
use nllb_gateway::config::Config;
use nllb_gateway::language::{LanguageTable, EXTENDED_LANGUAGES};
use nllb_gateway::metrics::ServiceMetrics;
use nllb_gateway::pipeline::TranslationPipeline;
use nllb_gateway::profile::{ModelProfile, ProfileSettings};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==================== Classifiers ====================

pub struct FixedClassifier {
    pub label: &'static str,
    pub probability: f32,
}

impl LanguageClassifier for FixedClassifier {
    fn predict(&self, _text: &str, _k: usize) -> Result<Vec<Prediction>> {
        Ok(vec![Prediction {
            label: format!("__label__{}", self.label),
            probability: self.probability,
        }])
    }
}

pub struct FailingClassifier;

impl LanguageClassifier for FailingClassifier {
    fn predict(&self, _text: &str, _k: usize) -> Result<Vec<Prediction>> {
        bail!("classifier unavailable")
    }
}

// ==================== Tokenizers ====================

/// Fails every `encode` call; everything else is delegated.
pub struct FailingTokenizer {
    inner: CharTokenizer,
}

impl FailingTokenizer {
    pub fn new() -> Self {
        Self {
            inner: tokenizer(),
        }
    }
}

impl Tokenizer for FailingTokenizer {
    fn encode(&self, _text: &str, _source_lang: &str) -> Result<Vec<u32>> {
        bail!("sentencepiece model missing")
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.inner.decode(ids)
    }

    fn ids_to_tokens(&self, ids: &[u32]) -> Result<Vec<String>> {
        self.inner.ids_to_tokens(ids)
    }

    fn tokens_to_ids(&self, tokens: &[String]) -> Result<Vec<u32>> {
        self.inner.tokens_to_ids(tokens)
    }
}

// ==================== Engines ====================

/// Returns fixed hypotheses (each prefixed with the forced target token),
/// optionally sleeping, and records concurrency and options.
pub struct ScriptedEngine {
    hypotheses: Vec<Vec<String>>,
    delay: Duration,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
    pub calls: AtomicUsize,
    pub seen_options: Mutex<Vec<DecodingOptions>>,
    pub seen_sources: Mutex<Vec<Vec<String>>>,
}

impl ScriptedEngine {
    pub fn new(hypotheses: &[&str]) -> Self {
        Self {
            hypotheses: hypotheses
                .iter()
                .map(|h| h.split_whitespace().map(|w| format!("▁{}", w)).collect())
                .collect(),
            delay: Duration::ZERO,
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            seen_options: Mutex::new(Vec::new()),
            seen_sources: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Calls currently inside `translate`.
    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl TranslationEngine for ScriptedEngine {
    fn translate(&self, source: &[String], options: &DecodingOptions) -> Result<Vec<Vec<String>>> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_options.lock().unwrap().push(options.clone());
        self.seen_sources.lock().unwrap().push(source.to_vec());

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let hypotheses = self
            .hypotheses
            .iter()
            .map(|h| {
                std::iter::once(options.target_prefix.clone())
                    .chain(h.iter().cloned())
                    .chain(std::iter::once("</s>".to_string()))
                    .collect()
            })
            .collect();

        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(hypotheses)
    }
}

/// Answers with the source language token it was given, as a word.
pub struct SourceEchoEngine;

impl TranslationEngine for SourceEchoEngine {
    fn translate(&self, source: &[String], options: &DecodingOptions) -> Result<Vec<Vec<String>>> {
        std::thread::sleep(Duration::from_millis(5));
        Ok(vec![vec![
            options.target_prefix.clone(),
            format!("▁{}", source[0]),
        ]])
    }
}

pub struct FailingEngine;

impl TranslationEngine for FailingEngine {
    fn translate(&self, _source: &[String], _options: &DecodingOptions) -> Result<Vec<Vec<String>>> {
        bail!("out of memory while allocating beam")
    }
}

pub struct PanickingEngine;

impl TranslationEngine for PanickingEngine {
    fn translate(&self, _source: &[String], _options: &DecodingOptions) -> Result<Vec<Vec<String>>> {
        panic!("engine crashed")
    }
}

pub struct EmptyEngine;

impl TranslationEngine for EmptyEngine {
    fn translate(&self, _source: &[String], _options: &DecodingOptions) -> Result<Vec<Vec<String>>> {
        Ok(Vec::new())
    }
}

/// Signals when a call starts and blocks until released.
pub struct HeldEngine {
    started: Mutex<mpsc::Sender<()>>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl HeldEngine {
    /// Returns the engine, a receiver for "started" signals and a sender to
    /// release one call.
    pub fn new() -> (Self, mpsc::Receiver<()>, mpsc::Sender<()>) {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        (
            Self {
                started: Mutex::new(started_tx),
                release: Mutex::new(release_rx),
            },
            started_rx,
            release_tx,
        )
    }
}

impl TranslationEngine for HeldEngine {
    fn translate(&self, _source: &[String], options: &DecodingOptions) -> Result<Vec<Vec<String>>> {
        let _ = self.started.lock().unwrap().send(());
        let _ = self.release.lock().unwrap().recv();
        Ok(vec![vec![options.target_prefix.clone(), "▁listo".to_string()]])
    }
}

// ==================== Builders ====================

pub fn languages() -> LanguageTable {
    LanguageTable::from_entries(EXTENDED_LANGUAGES)
}

pub fn tokenizer() -> CharTokenizer {
    CharTokenizer::from_table(&languages())
}

pub fn settings() -> ProfileSettings {
    ModelProfile::Nllb1_3B.settings(4)
}

pub fn backend(
    classifier: impl LanguageClassifier + 'static,
    tokenizer: impl Tokenizer + 'static,
    engine: Arc<dyn TranslationEngine>,
) -> Backend {
    Backend {
        classifier: Arc::new(classifier),
        tokenizer: Arc::new(tokenizer),
        engine,
        engine_name: "stub".to_string(),
    }
}

/// Pipeline with its own metrics so tests do not share counters.
pub fn pipeline(backend: Backend, settings: ProfileSettings) -> TranslationPipeline {
    let metrics: &'static ServiceMetrics = Box::leak(Box::new(ServiceMetrics::default()));
    TranslationPipeline::new(backend, languages(), settings)
        .with_metrics(metrics)
}

pub fn config(settings: ProfileSettings) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        profile: ModelProfile::Nllb1_3B,
        settings,
        default_target_lang: "spa_Latn".to_string(),
        language_table_path: None,
    }
}
