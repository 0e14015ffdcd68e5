//! Result assembly and the JSON shapes of the translate endpoint.

use crate::language::DetectedLanguage;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of a successful translation.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    /// Best-ranked translation, never empty
    pub primary: String,
    /// Remaining hypotheses in engine order
    pub alternates: Vec<String>,
    pub detected: DetectedLanguage,
    pub elapsed: Option<Duration>,
}

/// Compose the final result from already-cleaned pieces.
pub fn assemble(
    detected: DetectedLanguage,
    primary: String,
    alternates: Vec<String>,
    elapsed: Option<Duration>,
) -> TranslationResult {
    TranslationResult {
        primary,
        alternates,
        detected,
        elapsed,
    }
}

/// Body of `POST /translate`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranslateBody {
    pub text: String,
    #[serde(default = "default_source_lang")]
    pub source_lang: String,
    /// Falls back to the configured default target when absent
    #[serde(default)]
    pub target_lang: Option<String>,
}

fn default_source_lang() -> String {
    "auto".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedLanguageBody {
    pub language: String,
    pub confidence: f64,
}

/// Response of `POST /translate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    #[serde(rename = "translatedText")]
    pub translated_text: String,
    pub alternatives: Vec<String>,
    #[serde(rename = "detectedLanguage")]
    pub detected_language: DetectedLanguageBody,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub processing_time: Option<String>,
}

impl From<TranslationResult> for TranslateResponse {
    fn from(result: TranslationResult) -> Self {
        Self {
            translated_text: result.primary,
            alternatives: result.alternates,
            detected_language: DetectedLanguageBody {
                language: result.detected.iso_label,
                confidence: result.detected.confidence_percent,
            },
            processing_time: result.elapsed.map(format_elapsed),
        }
    }
}

/// Render a duration as seconds with two decimals, e.g. `1.23s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.2}s", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn french() -> DetectedLanguage {
        DetectedLanguage {
            code: "fra_Latn".to_string(),
            iso_label: "fr".to_string(),
            confidence_percent: 93.0,
        }
    }

    #[test]
    fn test_assemble_keeps_order() {
        let result = assemble(
            french(),
            "Hola".to_string(),
            vec!["Buenas".to_string(), "Saludos".to_string()],
            None,
        );
        assert_eq!(result.primary, "Hola");
        assert_eq!(result.alternates, vec!["Buenas", "Saludos"]);
        assert_eq!(result.detected, french());
    }

    #[test]
    fn test_response_json_shape() {
        let result = assemble(
            french(),
            "Hola".to_string(),
            vec!["Buenas".to_string()],
            Some(Duration::from_millis(1234)),
        );

        let json = serde_json::to_value(TranslateResponse::from(result)).expect("serialize");

        assert_eq!(json["translatedText"], "Hola");
        assert_eq!(json["alternatives"], serde_json::json!(["Buenas"]));
        assert_eq!(json["detectedLanguage"]["language"], "fr");
        assert_eq!(json["detectedLanguage"]["confidence"], 93.0);
        assert_eq!(json["processing_time"], "1.23s");
    }

    #[test]
    fn test_response_omits_missing_processing_time() {
        let result = assemble(french(), "Hola".to_string(), Vec::new(), None);
        let json = serde_json::to_value(TranslateResponse::from(result)).expect("serialize");

        assert!(json.get("processing_time").is_none());
        assert_eq!(json["alternatives"], serde_json::json!([]));
    }

    #[test]
    fn test_body_defaults() {
        let body: TranslateBody = serde_json::from_str(r#"{"text": "Hello"}"#).expect("parse");
        assert_eq!(body.source_lang, "auto");
        assert!(body.target_lang.is_none());
    }

    #[test]
    fn test_body_rejects_missing_text() {
        let result = serde_json::from_str::<TranslateBody>(r#"{"source_lang": "en"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(50)), "0.05s");
        assert_eq!(format_elapsed(Duration::from_secs(2)), "2.00s");
    }
}
