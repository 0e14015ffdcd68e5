//! Deterministic in-process collaborators.
//!
//! Used when no model runtime is linked into the binary: they make the whole
//! request path runnable (language detection, tokenization, engine dispatch,
//! decoding) without weights. The "translation" is the input itself.

use super::{
    Backend, DecodingOptions, LanguageClassifier, Prediction, Tokenizer, TranslationEngine,
    LABEL_PREFIX,
};
use crate::language::LanguageTable;
use anyhow::{bail, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Marks the start of a word in subword vocabularies.
pub const WORD_BOUNDARY: char = '▁';

const SPECIAL_TOKENS: &[&str] = &["<s>", "<pad>", "</s>", "<unk>"];
const EOS: &str = "</s>";
const EOS_ID: u32 = 2;
const UNK_ID: u32 = 3;

/// Build a [`Backend`] from the development collaborators, with language
/// tokens for every code in `languages`.
pub fn dev_backend(languages: &LanguageTable) -> Backend {
    Backend {
        classifier: Arc::new(ScriptClassifier),
        tokenizer: Arc::new(CharTokenizer::from_table(languages)),
        engine: Arc::new(EchoEngine),
        engine_name: "echo (development)".to_string(),
    }
}

/// Guesses the language from the writing system and a few telltale letters.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptClassifier;

impl ScriptClassifier {
    fn guess(text: &str) -> Option<(&'static str, f32)> {
        let mut letters = 0usize;
        let mut cyrillic = 0usize;
        let mut arabic = 0usize;
        let mut hints: HashMap<&'static str, usize> = HashMap::new();

        for c in text.chars().filter(|c| c.is_alphabetic()) {
            letters += 1;
            match c {
                '\u{0400}'..='\u{04FF}' => cyrillic += 1,
                '\u{0600}'..='\u{06FF}' => arabic += 1,
                'ñ' | 'Ñ' => *hints.entry("es").or_default() += 1,
                'ç' | 'è' | 'ê' | 'à' | 'ù' | 'œ' => *hints.entry("fr").or_default() += 1,
                'ã' | 'õ' => *hints.entry("pt").or_default() += 1,
                'ß' | 'ä' | 'ö' | 'ü' => *hints.entry("de").or_default() += 1,
                _ => {}
            }
        }
        // '¿' and '¡' are not alphabetic; count them separately.
        let inverted = text.chars().filter(|c| matches!(c, '¿' | '¡')).count();
        if inverted > 0 {
            *hints.entry("es").or_default() += inverted;
        }

        if letters == 0 {
            return None;
        }
        let share = |count: usize| (count as f32 / letters as f32).clamp(0.0, 1.0);

        if cyrillic * 2 > letters {
            return Some(("ru", share(cyrillic)));
        }
        if arabic * 2 > letters {
            return Some(("ar", share(arabic)));
        }
        match hints.into_iter().max_by_key(|(code, count)| (*count, *code)) {
            Some((code, _)) => Some((code, 0.75)),
            None => Some(("en", 0.5)),
        }
    }
}

impl LanguageClassifier for ScriptClassifier {
    fn predict(&self, text: &str, k: usize) -> Result<Vec<Prediction>> {
        let Some((code, probability)) = Self::guess(text) else {
            bail!("No alphabetic characters to classify");
        };
        let mut predictions = vec![Prediction {
            label: format!("{}{}", LABEL_PREFIX, code),
            probability,
        }];
        predictions.truncate(k);
        Ok(predictions)
    }
}

/// Is `token` a language code token such as `spa_Latn`?
pub fn is_language_token(token: &str) -> bool {
    let Some((language, script)) = token.split_once('_') else {
        return false;
    };
    language.len() == 3
        && language.chars().all(|c| c.is_ascii_lowercase())
        && script.len() == 4
        && script.starts_with(|c: char| c.is_ascii_uppercase())
        && script.chars().skip(1).all(|c| c.is_ascii_lowercase())
}

/// First id of the character range; ids below it are special tokens.
const CHAR_BASE: u32 = SPECIAL_TOKENS.len() as u32;
/// First id of the language-token range, just past every Unicode scalar.
const LANGUAGE_BASE: u32 = CHAR_BASE + 0x11_0000;

/// Character-level tokenizer with a fixed id space.
///
/// Ids are computed from the token itself (special tokens, then one id per
/// Unicode scalar, then the language codes given at construction), so no
/// state is shared or grown between requests. Encoded sequences follow the
/// `[source_lang] ▁ c h a r s </s>` layout; a source language outside the
/// fixed set encodes as `<unk>`. Multi-character pieces passed to
/// [`Tokenizer::tokens_to_ids`] are split into their characters.
#[derive(Debug, Clone)]
pub struct CharTokenizer {
    languages: Vec<String>,
    language_ids: HashMap<String, u32>,
}

impl CharTokenizer {
    pub fn new<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut tokenizer = Self {
            languages: Vec::new(),
            language_ids: HashMap::new(),
        };
        for code in languages {
            let code = code.into();
            if tokenizer.language_ids.contains_key(&code) {
                continue;
            }
            let id = LANGUAGE_BASE + tokenizer.languages.len() as u32;
            tokenizer.language_ids.insert(code.clone(), id);
            tokenizer.languages.push(code);
        }
        tokenizer
    }

    /// Language tokens for every internal code in `table`.
    pub fn from_table(table: &LanguageTable) -> Self {
        Self::new(table.iter().map(|(_, internal)| internal.to_string()))
    }

    fn special_id(token: &str) -> Option<u32> {
        SPECIAL_TOKENS
            .iter()
            .position(|special| *special == token)
            .map(|index| index as u32)
    }

    fn token_ids(&self, token: &str, ids: &mut Vec<u32>) {
        if let Some(id) = Self::special_id(token).or_else(|| self.language_ids.get(token).copied()) {
            ids.push(id);
            return;
        }
        ids.extend(token.chars().map(|c| CHAR_BASE + c as u32));
    }

    fn token(&self, id: u32) -> Result<String> {
        if id < CHAR_BASE {
            return Ok(SPECIAL_TOKENS[id as usize].to_string());
        }
        if id < LANGUAGE_BASE {
            return match char::from_u32(id - CHAR_BASE) {
                Some(c) => Ok(c.to_string()),
                None => bail!("Token id {} is not a valid character", id),
            };
        }
        match self.languages.get((id - LANGUAGE_BASE) as usize) {
            Some(code) => Ok(code.clone()),
            None => bail!("Token id {} is out of vocabulary", id),
        }
    }
}

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str, source_lang: &str) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(text.len() + 2);
        match self.language_ids.get(source_lang) {
            Some(id) => ids.push(*id),
            None => ids.push(UNK_ID),
        }
        for word in text.split_whitespace() {
            ids.push(CHAR_BASE + WORD_BOUNDARY as u32);
            ids.extend(word.chars().map(|c| CHAR_BASE + c as u32));
        }
        ids.push(EOS_ID);
        Ok(ids)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        let tokens = self.ids_to_tokens(ids)?;
        let text: String = tokens
            .iter()
            .filter(|t| !SPECIAL_TOKENS.contains(&t.as_str()) && !is_language_token(t))
            .map(|t| t.replace(WORD_BOUNDARY, " "))
            .collect();
        Ok(text.trim().to_string())
    }

    fn ids_to_tokens(&self, ids: &[u32]) -> Result<Vec<String>> {
        ids.iter().map(|id| self.token(*id)).collect()
    }

    fn tokens_to_ids(&self, tokens: &[String]) -> Result<Vec<u32>> {
        let mut ids = Vec::with_capacity(tokens.len());
        for token in tokens {
            self.token_ids(token, &mut ids);
        }
        Ok(ids)
    }
}

/// Returns the source sentence as the single hypothesis, behind the forced
/// target prefix.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoEngine;

impl TranslationEngine for EchoEngine {
    fn translate(&self, source: &[String], options: &DecodingOptions) -> Result<Vec<Vec<String>>> {
        if options.num_hypotheses == 0 || options.num_hypotheses > options.beam_size {
            bail!(
                "num_hypotheses ({}) must be between 1 and beam_size ({})",
                options.num_hypotheses,
                options.beam_size
            );
        }

        let body = source
            .iter()
            .filter(|t| !is_language_token(t) && t.as_str() != EOS)
            .cloned();
        let hypothesis = std::iter::once(options.target_prefix.clone())
            .chain(body)
            .chain(std::iter::once(EOS.to_string()))
            .collect();
        Ok(vec![hypothesis])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> DecodingOptions {
        DecodingOptions {
            target_prefix: "spa_Latn".to_string(),
            beam_size: 4,
            num_hypotheses: 3,
            repetition_penalty: 1.2,
            length_penalty: 1.0,
            no_repeat_ngram_size: 3,
        }
    }

    // ==================== ScriptClassifier Tests ====================

    #[test]
    fn test_classifier_scripts() {
        let classifier = ScriptClassifier;
        let ru = classifier.predict("Привет мир", 1).unwrap();
        assert_eq!(ru[0].iso_code(), "ru");
        assert_eq!(ru[0].probability, 1.0);

        let ar = classifier.predict("مرحبا بالعالم", 1).unwrap();
        assert_eq!(ar[0].iso_code(), "ar");
    }

    #[test]
    fn test_classifier_latin_hints() {
        let classifier = ScriptClassifier;
        assert_eq!(classifier.predict("¿Qué tal, señor?", 1).unwrap()[0].iso_code(), "es");
        assert_eq!(classifier.predict("Ça va très bien, garçon", 1).unwrap()[0].iso_code(), "fr");
        assert_eq!(classifier.predict("Grüße aus München", 1).unwrap()[0].iso_code(), "de");
        assert_eq!(classifier.predict("Hello world", 1).unwrap()[0].iso_code(), "en");
    }

    #[test]
    fn test_classifier_fails_without_letters() {
        assert!(ScriptClassifier.predict("1234 !!!", 1).is_err());
    }

    #[test]
    fn test_classifier_respects_k() {
        assert!(ScriptClassifier.predict("Hello", 0).unwrap().is_empty());
    }

    // ==================== Tokenizer Tests ====================

    #[test]
    fn test_is_language_token() {
        assert!(is_language_token("spa_Latn"));
        assert!(is_language_token("rus_Cyrl"));
        assert!(!is_language_token("▁spa_Latn"));
        assert!(!is_language_token("es"));
        assert!(!is_language_token("SPA_Latn"));
    }

    fn tokenizer() -> CharTokenizer {
        CharTokenizer::new(["eng_Latn", "spa_Latn", "fra_Latn"])
    }

    fn strings(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_encode_layout() {
        let tokenizer = tokenizer();
        let ids = tokenizer.encode("Hi  yo", "eng_Latn").unwrap();
        let tokens = tokenizer.ids_to_tokens(&ids).unwrap();
        assert_eq!(tokens, strings(&["eng_Latn", "▁", "H", "i", "▁", "y", "o", "</s>"]));
    }

    #[test]
    fn test_encode_uses_per_call_language() {
        let tokenizer = tokenizer();
        let en = tokenizer.encode("Hola", "eng_Latn").unwrap();
        let es = tokenizer.encode("Hola", "spa_Latn").unwrap();
        assert_ne!(en[0], es[0]);
        assert_eq!(en[1..], es[1..]);
    }

    #[test]
    fn test_encode_unknown_language_as_unk() {
        let tokenizer = tokenizer();
        let ids = tokenizer.encode("Hola", "xx_Latn").unwrap();
        assert_eq!(tokenizer.ids_to_tokens(&ids[..1]).unwrap(), vec!["<unk>"]);
    }

    #[test]
    fn test_ids_are_independent_of_history() {
        let fresh = tokenizer();
        let used = tokenizer();
        for n in 0..1_000 {
            used.encode(&format!("word{}", n), "eng_Latn").unwrap();
        }
        assert_eq!(
            fresh.encode("Ça va ?", "fra_Latn").unwrap(),
            used.encode("Ça va ?", "fra_Latn").unwrap()
        );
    }

    #[test]
    fn test_decode_skips_special_and_language_tokens() {
        let tokenizer = tokenizer();
        let ids = tokenizer.encode("Hello world", "eng_Latn").unwrap();
        assert_eq!(tokenizer.decode(&ids).unwrap(), "Hello world");
    }

    #[test]
    fn test_ids_to_tokens_rejects_unknown_id() {
        let tokenizer = tokenizer();
        assert!(tokenizer.ids_to_tokens(&[LANGUAGE_BASE + 3]).is_err());
        // Surrogate code points are not characters.
        assert!(tokenizer.ids_to_tokens(&[CHAR_BASE + 0xD800]).is_err());
    }

    #[test]
    fn test_tokens_to_ids_splits_pieces() {
        let tokenizer = tokenizer();
        let ids = tokenizer
            .tokens_to_ids(&strings(&["spa_Latn", "▁Hola", "</s>"]))
            .unwrap();
        assert_eq!(
            tokenizer.ids_to_tokens(&ids).unwrap(),
            strings(&["spa_Latn", "▁", "H", "o", "l", "a", "</s>"])
        );
        assert_eq!(tokenizer.decode(&ids).unwrap(), "Hola");
    }

    #[test]
    fn test_from_table_covers_internal_codes() {
        let table = LanguageTable::from_entries(crate::language::COMPACT_LANGUAGES);
        let tokenizer = CharTokenizer::from_table(&table);
        for (_, internal) in table.iter() {
            let ids = tokenizer.encode("x", internal).unwrap();
            assert_eq!(tokenizer.ids_to_tokens(&ids[..1]).unwrap(), vec![internal]);
        }
    }

    // ==================== EchoEngine Tests ====================

    #[test]
    fn test_echo_engine_forces_prefix() {
        let source: Vec<String> = ["eng_Latn", "▁Hello", "</s>"].iter().map(|s| s.to_string()).collect();
        let hypotheses = EchoEngine.translate(&source, &options()).unwrap();
        assert_eq!(hypotheses, vec![vec!["spa_Latn", "▁Hello", "</s>"]]);
    }

    #[test]
    fn test_echo_engine_validates_options() {
        let mut invalid = options();
        invalid.num_hypotheses = 5;
        assert!(EchoEngine.translate(&[], &invalid).is_err());
    }

    #[test]
    fn test_dev_backend_name() {
        let backend = dev_backend(&LanguageTable::from_entries(crate::language::EXTENDED_LANGUAGES));
        assert!(backend.engine_name.contains("echo"));
        assert_eq!(backend.engine.device(), "cpu");
    }
}
