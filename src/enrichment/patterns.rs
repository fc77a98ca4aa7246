use crate::enrichment::evidence::EvidenceCorpus;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

static SHORT_MODEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9]{3,6}\b").expect("valid regex"));
static VENDOR_MODEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z]{2,4}-[A-Za-z0-9]{3,8}\b").expect("valid regex"));
static LABELED_SERIAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:serial(?:\s*(?:no\.?|number|#))?|s/n|sn)(?:\s*[:#]\s*|\s+)([A-Za-z0-9-]{4,})",
    )
    .expect("valid regex")
});
static BARE_SERIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Za-z0-9]{10,}\b").expect("valid regex"));
static CAPS_TOKEN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][A-Z&]{2,}\b").expect("valid regex"));
static TRADEMARK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([A-Za-z][A-Za-z0-9'&-]*)\s?(?:®|™|(?i:\(r\)|\(tm\)))").expect("valid regex")
});
static SIZE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bsize\s*:?\s*(\d{1,2}(?:\.5)?|xxs|xs|s|m|l|xl|xxl|xxxl)\b|\b(xxs|xs|xl|xxl|xxxl)\b|\b(\d{1,3}(?:\.\d)?\s?(?:in|inch|inches|cm|mm))\b|\b(\d{2}x\d{2})\b"#,
    )
    .expect("valid regex")
});

/// Shape-based tokens pulled from the corpus. Each list is deduplicated, first-seen order.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExtractedPatterns {
    pub model_numbers: Vec<String>,
    pub serial_numbers: Vec<String>,
    pub caps_tokens: Vec<String>,
    pub trademarks: Vec<String>,
    pub sizes: Vec<String>,
}

impl ExtractedPatterns {
    pub fn extract(corpus: &EvidenceCorpus) -> Self {
        let raw = corpus.raw();
        Self {
            model_numbers: model_numbers(raw),
            serial_numbers: serial_numbers(raw),
            caps_tokens: dedupe(
                CAPS_TOKEN_RE
                    .find_iter(raw)
                    .map(|m| m.as_str().to_string()),
            ),
            trademarks: dedupe(
                TRADEMARK_RE
                    .captures_iter(raw)
                    .filter_map(|caps| caps.get(1))
                    .map(|m| m.as_str().to_lowercase()),
            ),
            sizes: dedupe(SIZE_RE.captures_iter(raw).filter_map(|caps| {
                caps.iter()
                    .skip(1)
                    .flatten()
                    .next()
                    .map(|m| m.as_str().to_lowercase())
            })),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.model_numbers.is_empty()
            && self.serial_numbers.is_empty()
            && self.caps_tokens.is_empty()
            && self.trademarks.is_empty()
            && self.sizes.is_empty()
    }
}

fn model_numbers(raw: &str) -> Vec<String> {
    let vendor = VENDOR_MODEL_RE
        .find_iter(raw)
        .filter(|m| is_mixed(m.as_str()))
        .map(|m| (m.start(), m.as_str().to_uppercase()));
    let short = SHORT_MODEL_RE
        .find_iter(raw)
        .filter(|m| is_mixed(m.as_str()))
        .map(|m| (m.start(), m.as_str().to_uppercase()));
    let mut found: Vec<(usize, String)> = vendor.chain(short).collect();
    found.sort_by_key(|(start, _)| *start);
    dedupe(found.into_iter().map(|(_, token)| token))
}

fn serial_numbers(raw: &str) -> Vec<String> {
    let labeled = LABELED_SERIAL_RE
        .captures_iter(raw)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|token| has_digit(token))
        .map(str::to_uppercase);
    let bare = BARE_SERIAL_RE
        .find_iter(raw)
        .map(|m| m.as_str())
        .filter(|token| has_digit(token))
        .map(str::to_uppercase);
    dedupe(labeled.chain(bare))
}

fn is_mixed(token: &str) -> bool {
    has_digit(token) && token.chars().any(|ch| ch.is_ascii_alphabetic())
}

fn has_digit(token: &str) -> bool {
    token.chars().any(|ch| ch.is_ascii_digit())
}

fn dedupe(values: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut result = Vec::new();
    for value in values {
        if seen.insert(value.clone()) {
            result.push(value);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(raw: &str) -> ExtractedPatterns {
        ExtractedPatterns::extract(&EvidenceCorpus::from_text(raw))
    }

    #[test]
    fn finds_short_and_vendor_model_numbers() {
        let patterns = extract("Model A1234 headphones WH-1000XM4, also a1234 again");
        assert_eq!(patterns.model_numbers, vec!["A1234", "WH-1000XM4"]);
    }

    #[test]
    fn plain_words_and_numbers_are_not_models() {
        let patterns = extract("size 10 oak table 1960");
        assert!(patterns.model_numbers.is_empty());
    }

    #[test]
    fn hyphenated_words_are_not_vendor_models() {
        let patterns = extract("mid-century dresser with hand-rubbed finish");
        assert!(patterns.model_numbers.is_empty());
    }

    #[test]
    fn serials_labeled_and_bare() {
        let patterns = extract("S/N: C02XK1ABJG5H and label F4GT7H9KL2MN");
        assert_eq!(patterns.serial_numbers, vec!["C02XK1ABJG5H", "F4GT7H9KL2MN"]);
    }

    #[test]
    fn words_starting_with_sn_are_not_serials() {
        let patterns = extract("white sneakers with snapshot print");
        assert!(patterns.serial_numbers.is_empty());
    }

    #[test]
    fn spelled_out_serial_label() {
        let patterns = extract("serial number 4411-AB, sn none");
        assert_eq!(patterns.serial_numbers, vec!["4411-AB"]);
    }

    #[test]
    fn caps_tokens_and_trademarks() {
        let patterns = extract("IKEA KALLAX shelf by Lego® and IKEA");
        assert_eq!(patterns.caps_tokens, vec!["IKEA", "KALLAX"]);
        assert_eq!(patterns.trademarks, vec!["lego"]);
    }

    #[test]
    fn uppercase_ascii_trademark_marks() {
        let patterns = extract("Kleenex(TM) box and Velcro (R) straps");
        assert_eq!(patterns.trademarks, vec!["kleenex", "velcro"]);
    }

    #[test]
    fn size_tokens() {
        let patterns = extract("Size 10.5 mens, XL fit, 32x34 inseam, 24 in tall");
        assert_eq!(patterns.sizes, vec!["10.5", "xl", "32x34", "24 in"]);
    }

    #[test]
    fn empty_corpus_yields_empty_patterns() {
        assert!(extract("").is_empty());
    }
}
