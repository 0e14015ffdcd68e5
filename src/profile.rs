//! Named model profiles.
//!
//! A profile bundles everything that differs between model deployments:
//! thread counts, numeric precision, decoding settings, gate capacity, text
//! handling and the language table. One pipeline implementation serves all
//! of them.

use crate::language::{LanguageEntry, COMPACT_LANGUAGES, EXTENDED_LANGUAGES};
use crate::text::TextOptions;
use anyhow::{bail, Result};
use std::fmt;

/// Numeric precision the engine runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputeType {
    Float32,
    Int8,
}

impl ComputeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComputeType::Float32 => "float32",
            ComputeType::Int8 => "int8",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelProfile {
    /// NLLB-200 distilled 1.3B: full table, float32, beam 5
    Nllb1_3B,
    /// NLLB-200 distilled 600M: compact table, int8, beam 4
    Nllb600M,
}

/// Concrete settings for a profile.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileSettings {
    pub model_name: &'static str,
    pub intra_threads: usize,
    pub inter_threads: usize,
    pub compute_type: ComputeType,
    pub beam_size: usize,
    pub num_hypotheses: usize,
    pub repetition_penalty: f32,
    pub length_penalty: f32,
    pub no_repeat_ngram_size: usize,
    pub gate_capacity: usize,
    pub text: TextOptions,
    pub languages: &'static [LanguageEntry],
}

impl ModelProfile {
    /// Parse a profile name such as `nllb-1.3b` or `nllb-600m`.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "nllb-1.3b" | "1.3b" => Ok(ModelProfile::Nllb1_3B),
            "nllb-600m" | "600m" => Ok(ModelProfile::Nllb600M),
            other => bail!(
                "Unknown model profile: '{}' (expected nllb-1.3b or nllb-600m)",
                other
            ),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ModelProfile::Nllb1_3B => "nllb-1.3b",
            ModelProfile::Nllb600M => "nllb-600m",
        }
    }

    /// Settings for this profile on a machine with `cpus` logical CPUs.
    pub fn settings(&self, cpus: usize) -> ProfileSettings {
        match self {
            ModelProfile::Nllb1_3B => ProfileSettings {
                model_name: "nllb-200-distilled-1.3B",
                // Leave one core for the request-handling runtime.
                intra_threads: 4.min(cpus.saturating_sub(1)).max(1),
                inter_threads: 1,
                compute_type: ComputeType::Float32,
                beam_size: 5,
                num_hypotheses: 3,
                repetition_penalty: 1.2,
                length_penalty: 1.0,
                no_repeat_ngram_size: 3,
                gate_capacity: 2,
                text: TextOptions {
                    canonicalize_quotes: true,
                    collapse_punctuation: true,
                },
                languages: EXTENDED_LANGUAGES,
            },
            ModelProfile::Nllb600M => ProfileSettings {
                model_name: "nllb-200-distilled-600M",
                intra_threads: 2.min(cpus).max(1),
                inter_threads: 1,
                compute_type: ComputeType::Int8,
                beam_size: 4,
                num_hypotheses: 3,
                repetition_penalty: 1.2,
                length_penalty: 1.0,
                no_repeat_ngram_size: 3,
                gate_capacity: 2,
                text: TextOptions::default(),
                languages: COMPACT_LANGUAGES,
            },
        }
    }
}

impl fmt::Display for ModelProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Logical CPUs visible to the process (at least 1).
pub fn available_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
