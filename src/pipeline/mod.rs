//! Request pipeline.
//!
//! - `orchestrator`: gate → language → normalize → tokenize → engine (blocking pool)
//! - `hypothesis`: marker stripping, detokenization and cleanup of engine output
//! - `response`: result assembly and the endpoint's JSON shapes

mod hypothesis;
mod orchestrator;
mod response;

pub use hypothesis::{process_hypotheses, strip_target_marker};
pub use orchestrator::{TranslationPipeline, TranslationRequest};
pub use response::{
    assemble, format_elapsed, DetectedLanguageBody, TranslateBody, TranslateResponse,
    TranslationResult,
};
