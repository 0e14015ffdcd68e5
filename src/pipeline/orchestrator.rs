//! The request pipeline: gate, language resolution, tokenization, engine
//! dispatch on the blocking pool, decoding and assembly.

use crate::backend::{Backend, DecodingOptions};
use crate::error::{GatewayError, Result};
use crate::gate::ConcurrencyGate;
use crate::language::{identify, DetectedLanguage, LanguageTable};
use crate::metrics::ServiceMetrics;
use crate::pipeline::hypothesis::process_hypotheses;
use crate::pipeline::response::{assemble, TranslationResult};
use crate::profile::ProfileSettings;
use crate::text::normalize_text;
use anyhow::{anyhow, Context};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// One translation request, already validated at the edge.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationRequest {
    pub text: String,
    /// `"auto"` (or empty) for detection, otherwise an ISO code
    pub source_lang: String,
    /// Internal code of the target, e.g. `spa_Latn`; never detected
    pub target_lang: String,
}

impl TranslationRequest {
    pub fn new(
        text: impl Into<String>,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        }
    }
}

/// Shared, long-lived translation pipeline.
///
/// Holds the collaborators, the language table and the gate. Cheap to share
/// behind an `Arc`; nothing in it is mutated per request.
pub struct TranslationPipeline {
    backend: Backend,
    languages: Arc<LanguageTable>,
    settings: ProfileSettings,
    gate: ConcurrencyGate,
    metrics: &'static ServiceMetrics,
}

impl TranslationPipeline {
    pub fn new(backend: Backend, languages: LanguageTable, settings: ProfileSettings) -> Self {
        let gate = ConcurrencyGate::new(settings.gate_capacity);
        Self {
            backend,
            languages: Arc::new(languages),
            settings,
            gate,
            metrics: ServiceMetrics::global(),
        }
    }

    /// Count into `metrics` instead of the process-wide instance.
    pub fn with_metrics(mut self, metrics: &'static ServiceMetrics) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    pub fn settings(&self) -> &ProfileSettings {
        &self.settings
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    pub fn metrics(&self) -> &'static ServiceMetrics {
        self.metrics
    }

    /// Translate one request.
    ///
    /// Waits for a gate permit first; the permit is held until the result
    /// (or error) is produced and released on every path.
    #[instrument(skip_all, fields(source = %request.source_lang, target = %request.target_lang))]
    pub async fn translate(&self, request: TranslationRequest) -> Result<TranslationResult> {
        if request.text.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "text must not be empty".to_string(),
            ));
        }
        if request.target_lang.trim().is_empty() {
            return Err(GatewayError::InvalidRequest(
                "target_lang must not be empty".to_string(),
            ));
        }

        self.metrics.record_request();
        let started = Instant::now();

        let outcome = self.run(&request).await;
        match &outcome {
            Ok((detected, _)) => {
                self.metrics.record_success();
                info!(
                    "Translated {} chars from {} ({:.2}%) in {:?}",
                    request.text.chars().count(),
                    detected.code,
                    detected.confidence_percent,
                    started.elapsed()
                );
            }
            Err(e) => {
                self.metrics.record_failure();
                error!("Translation failed: {}", e);
            }
        }

        let (detected, mut hypotheses) = outcome?;
        let primary = hypotheses.remove(0);
        Ok(assemble(
            detected,
            primary,
            hypotheses,
            Some(started.elapsed()),
        ))
    }

    /// Everything that happens while the permit is held.
    ///
    /// Returns the resolved language and the cleaned hypotheses, the first of
    /// which is guaranteed non-empty.
    async fn run(&self, request: &TranslationRequest) -> Result<(DetectedLanguage, Vec<String>)> {
        let permit = self
            .gate
            .acquire()
            .await
            .map_err(|_| GatewayError::GateClosed)?;
        debug!("Permit acquired ({} active)", self.gate.active());

        let detected = identify(
            self.backend.classifier.as_ref(),
            &self.languages,
            &request.source_lang,
            &request.text,
        );
        debug!(
            "Source language {} ({}, {:.2}%)",
            detected.code, detected.iso_label, detected.confidence_percent
        );

        let text = normalize_text(&request.text, self.settings.text);

        let tokenizer = &self.backend.tokenizer;
        let ids = tokenizer
            .encode(&text, &detected.code)
            .context("Failed to tokenize input")?;
        let source_tokens = tokenizer
            .ids_to_tokens(&ids)
            .context("Failed to map input ids to tokens")?;
        debug!("Encoded input as {} tokens", source_tokens.len());

        let options = self.decoding_options(&request.target_lang);
        let engine = Arc::clone(&self.backend.engine);
        self.metrics.record_engine_call();

        // The engine call is synchronous and CPU bound: keep it off the
        // runtime's worker threads. The permit moves into the blocking task and
        // is held for as long as the engine runs, even if this future is dropped.
        let (hypotheses, _permit) = tokio::task::spawn_blocking(move || {
            let hypotheses = engine.translate(&source_tokens, &options);
            (hypotheses, permit)
        })
        .await
        .map_err(|e| GatewayError::EngineTask(e.to_string()))?;
        let hypotheses = hypotheses.context("Translation engine failed")?;

        if hypotheses.is_empty() {
            return Err(anyhow!("Translation engine returned no hypotheses").into());
        }

        let cleaned = process_hypotheses(
            tokenizer.as_ref(),
            &hypotheses,
            &request.target_lang,
            self.settings.text,
        )?;

        if cleaned.first().map_or(true, |primary| primary.is_empty()) {
            return Err(anyhow!("Translation produced empty text").into());
        }

        Ok((detected, cleaned))
    }

    fn decoding_options(&self, target_lang: &str) -> DecodingOptions {
        DecodingOptions {
            target_prefix: target_lang.to_string(),
            beam_size: self.settings.beam_size,
            num_hypotheses: self.settings.num_hypotheses,
            repetition_penalty: self.settings.repetition_penalty,
            length_penalty: self.settings.length_penalty,
            no_repeat_ngram_size: self.settings.no_repeat_ngram_size,
        }
    }
}
