//! Brand resolution as a short-circuiting chain of strategies.
//!
//! Strategies run in declaration order. Each is consulted only while the running best
//! confidence is below its activation threshold, and a later strategy replaces the running
//! best only by strictly exceeding it.

use crate::enrichment::evidence::EvidenceCorpus;
use crate::enrichment::patterns::ExtractedPatterns;
use crate::lexicon::{Lexicon, LexiconError};
use crate::models::{BrandCandidate, BrandMethod};
use regex::Regex;
use std::sync::Arc;

const MAX_CONFIDENCE: u8 = 10;
const DIRECT_BASE: u8 = 5;
const MODEL_INFERENCE_CONFIDENCE: u8 = 7;
const MODEL_INFERENCE_THRESHOLD: u8 = 7;
const FUZZY_THRESHOLD: u8 = 6;
const FUZZY_MIN_SIMILARITY: f64 = 0.7;
const FUZZY_MIN_TOKEN_LEN: usize = 3;

/// Inputs shared by every strategy for one pass.
pub struct BrandEvidence<'a> {
    pub corpus: &'a EvidenceCorpus,
    pub patterns: &'a ExtractedPatterns,
    pub category: &'a str,
}

pub trait BrandStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// The strategy runs only while the best confidence so far is below this value.
    fn activation_threshold(&self) -> u8;

    fn resolve(&self, evidence: &BrandEvidence<'_>) -> Option<BrandCandidate>;
}

pub struct BrandResolver {
    strategies: Vec<Box<dyn BrandStrategy>>,
}

impl BrandResolver {
    pub fn new(lexicon: Arc<Lexicon>) -> Result<Self, LexiconError> {
        let model = ModelInferenceMatch::new(&lexicon)?;
        Ok(Self {
            strategies: vec![
                Box::new(DirectMatch {
                    lexicon: lexicon.clone(),
                }),
                Box::new(model),
                Box::new(FuzzyMatch { lexicon }),
            ],
        })
    }

    pub fn resolve(
        &self,
        corpus: &EvidenceCorpus,
        patterns: &ExtractedPatterns,
        category: &str,
    ) -> Option<BrandCandidate> {
        let evidence = BrandEvidence {
            corpus,
            patterns,
            category,
        };
        let mut best: Option<BrandCandidate> = None;
        for strategy in &self.strategies {
            let current = best.as_ref().map(|c| c.confidence).unwrap_or(0);
            if current >= strategy.activation_threshold() {
                continue;
            }
            if let Some(candidate) = strategy.resolve(&evidence)
                && candidate.confidence > current
            {
                tracing::debug!(
                    target = "hermes.pipeline",
                    strategy = strategy.name(),
                    brand = %candidate.brand_name,
                    confidence = candidate.confidence,
                    "brand_candidate_accepted"
                );
                best = Some(candidate);
            }
        }
        best
    }
}

/// Substring match against the brand lexicon.
struct DirectMatch {
    lexicon: Arc<Lexicon>,
}

impl BrandStrategy for DirectMatch {
    fn name(&self) -> &'static str {
        "direct"
    }

    fn activation_threshold(&self) -> u8 {
        u8::MAX
    }

    fn resolve(&self, evidence: &BrandEvidence<'_>) -> Option<BrandCandidate> {
        if evidence.corpus.is_empty() {
            return None;
        }
        let category = evidence.category.to_lowercase();
        let mut best: Option<BrandCandidate> = None;

        for entry in &self.lexicon.brands {
            let matched = evidence.corpus.hits(&entry.variations);
            let Some(first) = matched.first().copied() else {
                continue;
            };

            let mut confidence = DIRECT_BASE as usize;
            let mut evidence_notes = vec![format!("text contains `{first}`")];
            if entry
                .variations
                .first()
                .is_some_and(|primary| primary.eq_ignore_ascii_case(first))
            {
                confidence += 2;
            }
            if entry
                .categories
                .iter()
                .any(|keyword| category.contains(keyword.as_str()))
            {
                confidence += 2;
                evidence_notes.push(format!("category `{category}` fits brand"));
            }
            confidence += matched.len().saturating_sub(1).min(2);
            for token in evidence.corpus.hits(&entry.identifiers) {
                confidence += 1;
                evidence_notes.push(format!("identifier `{token}`"));
            }
            if first.len() >= 4 && first.chars().all(char::is_alphabetic) {
                confidence += 1;
            }

            let confidence = confidence.min(MAX_CONFIDENCE as usize) as u8;
            if best.as_ref().is_none_or(|b| confidence > b.confidence) {
                best = Some(BrandCandidate {
                    brand_name: self.lexicon.display_name(&entry.name),
                    confidence,
                    evidence: evidence_notes,
                    method: BrandMethod::Direct,
                });
            }
        }
        best
    }
}

/// Vendor-specific model-number shapes.
struct ModelInferenceMatch {
    patterns: Vec<(String, Regex)>,
}

impl ModelInferenceMatch {
    fn new(lexicon: &Lexicon) -> Result<Self, LexiconError> {
        let patterns = lexicon
            .model_patterns
            .iter()
            .map(|entry| {
                Regex::new(&entry.pattern)
                    .map(|re| (lexicon.display_name(&entry.brand), re))
                    .map_err(|err| LexiconError::Pattern {
                        brand: entry.brand.clone(),
                        message: err.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl BrandStrategy for ModelInferenceMatch {
    fn name(&self) -> &'static str {
        "model_inference"
    }

    fn activation_threshold(&self) -> u8 {
        MODEL_INFERENCE_THRESHOLD
    }

    fn resolve(&self, evidence: &BrandEvidence<'_>) -> Option<BrandCandidate> {
        evidence.patterns.model_numbers.iter().find_map(|token| {
            self.patterns
                .iter()
                .find(|(_, re)| re.is_match(token))
                .map(|(brand, _)| BrandCandidate {
                    brand_name: brand.clone(),
                    confidence: MODEL_INFERENCE_CONFIDENCE,
                    evidence: vec![format!("model number `{token}` matches {brand} pattern")],
                    method: BrandMethod::ModelInference,
                })
        })
    }
}

/// Edit-distance match against a short list of common brands.
struct FuzzyMatch {
    lexicon: Arc<Lexicon>,
}

impl BrandStrategy for FuzzyMatch {
    fn name(&self) -> &'static str {
        "fuzzy"
    }

    fn activation_threshold(&self) -> u8 {
        FUZZY_THRESHOLD
    }

    fn resolve(&self, evidence: &BrandEvidence<'_>) -> Option<BrandCandidate> {
        let mut best: Option<BrandCandidate> = None;
        for token in evidence
            .corpus
            .tokens()
            .filter(|token| token.chars().count() >= FUZZY_MIN_TOKEN_LEN)
        {
            for brand in &self.lexicon.fuzzy_brands {
                let score = similarity(token, brand);
                if score < FUZZY_MIN_SIMILARITY {
                    continue;
                }
                let confidence = ((score * 8.0).floor() as u8).min(MAX_CONFIDENCE);
                if best.as_ref().is_none_or(|b| confidence > b.confidence) {
                    best = Some(BrandCandidate {
                        brand_name: self.lexicon.display_name(brand),
                        confidence,
                        evidence: vec![format!(
                            "token `{token}` resembles `{brand}` ({score:.2})"
                        )],
                        method: BrandMethod::Fuzzy,
                    });
                }
            }
        }
        best
    }
}

/// `1 - distance / max_len`, in `[0, 1]`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];
    for (i, ca) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b_chars.len()]
}
