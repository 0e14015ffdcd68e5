//! Turn raw engine hypotheses into cleaned translation strings.

use crate::backend::Tokenizer;
use crate::text::{clean_output, TextOptions};
use anyhow::{Context, Result};

/// Drop the leading target-language token the decoder echoes back.
pub fn strip_target_marker<'a>(tokens: &'a [String], marker: &str) -> &'a [String] {
    match tokens.split_first() {
        Some((first, rest)) if first == marker => rest,
        _ => tokens,
    }
}

/// Detokenize and clean every hypothesis, keeping the engine's ranking.
///
/// The first element is the primary translation. Any tokenizer failure fails
/// the whole batch; partial results are never returned.
pub fn process_hypotheses(
    tokenizer: &dyn Tokenizer,
    hypotheses: &[Vec<String>],
    target_marker: &str,
    options: TextOptions,
) -> Result<Vec<String>> {
    hypotheses
        .iter()
        .enumerate()
        .map(|(rank, tokens)| {
            let tokens = strip_target_marker(tokens, target_marker);
            let ids = tokenizer
                .tokens_to_ids(tokens)
                .with_context(|| format!("Failed to map tokens of hypothesis {}", rank))?;
            let decoded = tokenizer
                .decode(&ids)
                .with_context(|| format!("Failed to decode hypothesis {}", rank))?;
            Ok(clean_output(&decoded, options))
        })
        .collect()
}
