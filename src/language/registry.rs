//! Language table: ISO short codes mapped to the engine's internal codes.
//!
//! Each model profile ships a static table. A table is built once at startup,
//! optionally extended from a JSON overrides file, and then shared read-only
//! by every request through the pipeline.

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::path::Path;

/// Internal code used when nothing better is known.
pub const DEFAULT_INTERNAL_CODE: &str = "eng_Latn";

/// Short label reported alongside [`DEFAULT_INTERNAL_CODE`].
pub const DEFAULT_ISO_LABEL: &str = "en";

/// Script suffix appended to hints that are not in the table.
pub const DEFAULT_SCRIPT_SUFFIX: &str = "_Latn";

/// One row of a static language table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguageEntry {
    /// ISO short code as produced by the classifier (e.g., "fr")
    pub iso: &'static str,

    /// Engine-facing language/script code (e.g., "fra_Latn")
    pub internal: &'static str,
}

const fn entry(iso: &'static str, internal: &'static str) -> LanguageEntry {
    LanguageEntry { iso, internal }
}

/// Full table used by the 1.3B profile.
pub const EXTENDED_LANGUAGES: &[LanguageEntry] = &[
    entry("es", "spa_Latn"),
    entry("en", "eng_Latn"),
    entry("fr", "fra_Latn"),
    entry("ar", "ary_Arab"),
    entry("it", "ita_Latn"),
    entry("de", "deu_Latn"),
    entry("pt", "por_Latn"),
    entry("nl", "nld_Latn"),
    entry("ru", "rus_Cyrl"),
    entry("ca", "cat_Latn"),
    entry("eu", "eus_Latn"),
    entry("ro", "ron_Latn"),
    entry("gl", "glg_Latn"),
    entry("tr", "tur_Latn"),
    entry("pl", "pol_Latn"),
];

/// Compact table used by the 600M profile.
pub const COMPACT_LANGUAGES: &[LanguageEntry] = &[
    entry("es", "spa_Latn"),
    entry("en", "eng_Latn"),
    entry("fr", "fra_Latn"),
    entry("de", "deu_Latn"),
    entry("it", "ita_Latn"),
    entry("pt", "por_Latn"),
];

/// Immutable ISO → internal code lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageTable {
    codes: BTreeMap<String, String>,
}

impl LanguageTable {
    /// Build a table from static entries.
    pub fn from_entries(entries: &[LanguageEntry]) -> Self {
        let codes = entries
            .iter()
            .map(|e| (e.iso.to_string(), e.internal.to_string()))
            .collect();
        Self { codes }
    }

    /// Merge extra mappings from a JSON object file (`{"sv": "swe_Latn"}`).
    ///
    /// Entries in the file replace entries with the same ISO code.
    pub fn with_overrides_file(mut self, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read language table {}", path.display()))?;
        let overrides: BTreeMap<String, String> = serde_json::from_str(&content)
            .with_context(|| format!("Invalid language table JSON in {}", path.display()))?;

        for (iso, internal) in overrides {
            if iso.trim().is_empty() || internal.trim().is_empty() {
                bail!("Language table {} contains an empty code", path.display());
            }
            self.codes.insert(iso, internal);
        }
        Ok(self)
    }

    /// Look up the internal code for an ISO short code.
    pub fn internal_code(&self, iso: &str) -> Option<&str> {
        self.codes.get(iso).map(String::as_str)
    }

    /// Iterate over all `(iso, internal)` pairs in ISO order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.codes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}
