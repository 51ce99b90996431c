//! Keyword extraction from response text

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use crate::core::exclusions::ExclusionList;
use crate::error::AnalyticsResult;

/// Letters/digits, optionally joined internally by apostrophes, `&`, `-` or `.`
const WORD_PATTERN: &str = r"[\p{L}\p{N}]+(?:['’&\-.][\p{L}\p{N}]+)*";

static WORD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(WORD_PATTERN).expect("word pattern is a valid regex"));

/// Keyword counts of one text, keyed by keyword with case preserved
pub type KeywordCounts = BTreeMap<String, u32>;

/// Endings dropped after a trailing apostrophe: possessive `s` and contractions
const CLITICS: [&str; 7] = ["s", "m", "ll", "re", "ve", "d", "t"];

/// `Gamble's` -> `Gamble`, `I'm` -> `I`, `Don't` -> `Don`; `O'Reilly` is kept whole
fn strip_clitic(token: &str) -> &str {
    let Some((index, apostrophe)) = token.char_indices().rev().find(|(_, c)| matches!(c, '\'' | '’')) else {
        return token;
    };
    let (stem, ending) = (&token[..index], &token[index + apostrophe.len_utf8()..]);
    if !stem.is_empty() && CLITICS.iter().any(|clitic| ending.eq_ignore_ascii_case(clitic)) {
        stem
    } else {
        token
    }
}

fn is_keyword(token: &str, exclusions: &HashSet<String>) -> bool {
    let mut chars = token.chars();
    let starts_upper = chars.next().is_some_and(char::is_uppercase);
    starts_upper && chars.next().is_some() && !exclusions.contains(&token.to_lowercase())
}

/// Count capitalised, non-excluded word tokens in `text`
pub fn extract_keywords(text: &str, exclusions: &HashSet<String>) -> KeywordCounts {
    let mut counts = KeywordCounts::new();
    for token in WORD_REGEX.find_iter(text) {
        let token = strip_clitic(token.as_str());
        if is_keyword(token, exclusions) {
            *counts.entry(token.to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Extraction bound to a live exclusion list
pub struct KeywordEngine {
    exclusions: Arc<ExclusionList>,
}

impl KeywordEngine {
    pub fn new(exclusions: Arc<ExclusionList>) -> Self {
        Self { exclusions }
    }

    pub fn exclusions(&self) -> &Arc<ExclusionList> {
        &self.exclusions
    }

    /// Extract with the exclusion snapshot active right now
    pub fn extract(&self, text: &str) -> KeywordCounts {
        extract_keywords(text, &self.exclusions.snapshot())
    }

    /// Re-read the exclusion source file and publish it atomically
    pub async fn reload_exclusion_words(&self) -> AnalyticsResult<usize> {
        self.exclusions.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn excluding(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_recommendation_sentence() {
        let counts = extract_keywords("I recommend Acme over Globex.", &excluding(&["i"]));
        let expected: KeywordCounts = [("Acme".to_string(), 1), ("Globex".to_string(), 1)].into_iter().collect();
        assert_eq!(counts, expected);
    }

    #[test]
    fn test_joined_tokens_and_possessives() {
        let text = "Procter & Gamble's rival is Johnson&Johnson. Coca-Cola's ads beat Dr.Pepper's. AT&T’s plan.";
        let counts = extract_keywords(text, &HashSet::new());

        assert_eq!(counts.get("Procter"), Some(&1));
        assert_eq!(counts.get("Gamble"), Some(&1));
        assert_eq!(counts.get("Johnson&Johnson"), Some(&1));
        assert_eq!(counts.get("Coca-Cola"), Some(&1));
        assert_eq!(counts.get("Dr.Pepper"), Some(&1));
        assert_eq!(counts.get("AT&T"), Some(&1));
        assert!(!counts.contains_key("rival"));
    }

    #[test]
    fn test_contractions_are_not_keywords() {
        let text = "I'm sure Acme wins. Don't pick Globex. I'll try Initech. They've met O'Reilly.";
        let counts = extract_keywords(text, &excluding(&["i", "don", "it", "they"]));

        let keys: Vec<&str> = counts.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Acme", "Globex", "Initech", "O'Reilly"]);
    }

    #[test]
    fn test_builtin_exclusions_cover_contraction_stems() {
        let builtin = ExclusionList::builtin().snapshot();
        let counts = extract_keywords("Don't worry, Hooli isn't Pied Piper. Doesn't matter.", &builtin);

        assert!(!counts.contains_key("Don"));
        assert!(!counts.contains_key("Doesn"));
        assert_eq!(counts.get("Hooli"), Some(&1));
    }

    #[test]
    fn test_single_letters_and_lowercase_ignored() {
        let counts = extract_keywords("A b C apple Zz 9Lives", &HashSet::new());
        let keys: Vec<&str> = counts.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["Zz"]);
    }

    #[test]
    fn test_case_preserved_and_counted_separately() {
        let counts = extract_keywords("Acme ACME Acme", &HashSet::new());
        assert_eq!(counts.get("Acme"), Some(&2));
        assert_eq!(counts.get("ACME"), Some(&1));
    }

    #[test]
    fn test_exclusions_match_lowercase_form() {
        let counts = extract_keywords("The Best choice is Hooli", &excluding(&["the", "best"]));
        assert_eq!(counts.keys().collect::<Vec<_>>(), vec!["Hooli"]);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let text = "Initech, Initech and Umbrella. Then Hooli's Hooli.";
        let exclusions = excluding(&["then"]);
        assert_eq!(extract_keywords(text, &exclusions), extract_keywords(text, &exclusions));
    }

    #[test]
    fn test_counts_bounded_by_token_count() {
        let text = "Alpha Beta gamma Delta. Epsilon-Zeta";
        let tokens = WORD_REGEX.find_iter(text).count() as u32;
        let total: u32 = extract_keywords(text, &HashSet::new()).values().sum();
        assert!(total <= tokens);
    }
}
