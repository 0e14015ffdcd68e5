//! Source-language resolution.
//!
//! - `registry`: static ISO → internal code tables, one per model profile
//! - `identifier`: turns a request hint (or `"auto"`) into a [`DetectedLanguage`]

mod identifier;
mod registry;

pub use identifier::{detect, identify, is_auto, Detection, DetectedLanguage, AUTO_HINT};
pub use registry::{
    LanguageEntry, LanguageTable, COMPACT_LANGUAGES, DEFAULT_INTERNAL_CODE, DEFAULT_ISO_LABEL,
    DEFAULT_SCRIPT_SUFFIX, EXTENDED_LANGUAGES,
};
