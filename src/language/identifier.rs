//! Resolve a request's source-language hint to the engine's language code.

use crate::backend::LanguageClassifier;
use crate::language::registry::{
    LanguageTable, DEFAULT_INTERNAL_CODE, DEFAULT_ISO_LABEL, DEFAULT_SCRIPT_SUFFIX,
};
use crate::text::flatten_newlines;
use tracing::{debug, warn};

/// Hint value that asks for automatic detection.
pub const AUTO_HINT: &str = "auto";

/// Resolved source language for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedLanguage {
    /// Engine-facing code, e.g. `fra_Latn`
    pub code: String,
    /// Caller-facing short code, e.g. `fr`
    pub iso_label: String,
    /// `0.0..=100.0`; always `100.0` for explicit hints
    pub confidence_percent: f64,
}

/// Outcome of asking the classifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Detection {
    Detected { iso: String, confidence_percent: f64 },
    Unavailable,
}

/// Is this hint a request for automatic detection?
pub fn is_auto(hint: &str) -> bool {
    hint.is_empty() || hint.eq_ignore_ascii_case(AUTO_HINT)
}

/// Run the classifier on `text`, folding any failure into [`Detection::Unavailable`].
pub fn detect(classifier: &dyn LanguageClassifier, text: &str) -> Detection {
    match classifier.predict(&flatten_newlines(text), 1) {
        Ok(predictions) => match predictions.into_iter().next() {
            Some(best) if !best.probability.is_finite() => {
                warn!(
                    "Language classifier returned a non-finite probability for '{}'",
                    best.iso_code()
                );
                Detection::Unavailable
            }
            Some(best) => Detection::Detected {
                iso: best.iso_code().to_string(),
                confidence_percent: to_percent(best.probability),
            },
            None => {
                warn!("Language classifier returned no predictions");
                Detection::Unavailable
            }
        },
        Err(e) => {
            warn!("Language classifier failed, using default language: {:#}", e);
            Detection::Unavailable
        }
    }
}

/// Scale a probability to a percentage rounded to two decimals.
fn to_percent(probability: f32) -> f64 {
    let percent = (f64::from(probability) * 100.0).clamp(0.0, 100.0);
    (percent * 100.0).round() / 100.0
}

/// Resolve `hint` for `text` against `table`.
///
/// Never fails: unknown explicit hints get a synthesized `<hint>_Latn` code,
/// and unmapped or failed detections fall back to English. When detection
/// succeeds with an unmapped code, the detected label is still reported.
pub fn identify(
    classifier: &dyn LanguageClassifier,
    table: &LanguageTable,
    hint: &str,
    text: &str,
) -> DetectedLanguage {
    if !is_auto(hint) {
        let code = table
            .internal_code(hint)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", hint, DEFAULT_SCRIPT_SUFFIX));
        return DetectedLanguage {
            code,
            iso_label: hint.to_string(),
            confidence_percent: 100.0,
        };
    }

    match detect(classifier, text) {
        Detection::Detected {
            iso,
            confidence_percent,
        } => {
            let code = match table.internal_code(&iso) {
                Some(code) => code.to_string(),
                None => {
                    debug!("Detected language '{}' is not mapped, using {}", iso, DEFAULT_INTERNAL_CODE);
                    DEFAULT_INTERNAL_CODE.to_string()
                }
            };
            DetectedLanguage {
                code,
                iso_label: iso,
                confidence_percent,
            }
        }
        Detection::Unavailable => DetectedLanguage {
            code: DEFAULT_INTERNAL_CODE.to_string(),
            iso_label: DEFAULT_ISO_LABEL.to_string(),
            confidence_percent: 0.0,
        },
    }
}
