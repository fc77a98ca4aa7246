use crate::enrichment::evidence::EvidenceCorpus;
use crate::lexicon::{Lexicon, StyleEntry};
use crate::models::ClassificationResult;
use serde::Serialize;
use std::sync::Arc;

const PATTERN_SCORE: u32 = 3;
const MATERIAL_HINT_SCORE: u32 = 2;
const CONSTRUCTION_HINT_SCORE: u32 = 2;
const BRAND_HINT_SCORE: u32 = 2;
const INDICATOR_SCORE: u32 = 1;
const MIN_STYLE_SCORE: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StylePartition {
    Furniture,
    Clothing,
    Electronics,
}

pub struct StyleClassifier {
    lexicon: Arc<Lexicon>,
}

impl StyleClassifier {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Electronics is checked first ("tablet" contains "table"), furniture before clothing
    /// ("dresser" contains "dress").
    pub fn partition(&self, category: &str) -> StylePartition {
        if self.lexicon.is_electronics(category) {
            StylePartition::Electronics
        } else if self.lexicon.is_furniture(category) {
            StylePartition::Furniture
        } else if self.lexicon.is_clothing(category) {
            StylePartition::Clothing
        } else {
            StylePartition::Furniture
        }
    }

    /// Best style whose corroborated score reaches the threshold. Material hints only
    /// count when they agree with the already-resolved primary material.
    pub fn classify(
        &self,
        corpus: &EvidenceCorpus,
        category: &str,
        primary_material: Option<&str>,
    ) -> Option<ClassificationResult> {
        let entries = match self.partition(category) {
            StylePartition::Furniture => &self.lexicon.styles.furniture,
            StylePartition::Clothing => &self.lexicon.styles.clothing,
            StylePartition::Electronics => &self.lexicon.styles.electronics,
        };
        let material = primary_material.map(str::to_lowercase);

        let mut best: Option<(u32, ClassificationResult)> = None;
        for entry in entries {
            let (score, tags) = score_entry(entry, corpus, material.as_deref());
            if score < MIN_STYLE_SCORE {
                continue;
            }
            if best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((
                    score,
                    ClassificationResult {
                        label: entry.label.clone(),
                        confidence: score.min(10) as u8,
                        evidence_tags: tags,
                    },
                ));
            }
        }
        best.map(|(_, result)| result)
    }
}

fn score_entry(
    entry: &StyleEntry,
    corpus: &EvidenceCorpus,
    material: Option<&str>,
) -> (u32, Vec<String>) {
    let mut score = 0;
    let mut tags = Vec::new();

    for hit in corpus.hits(&entry.patterns) {
        score += PATTERN_SCORE;
        tags.push(format!("pattern:{hit}"));
    }
    if let Some(material) = material {
        for hit in corpus.hits(&entry.material_hints) {
            if material.contains(hit) {
                score += MATERIAL_HINT_SCORE;
                tags.push(format!("material:{hit}"));
            }
        }
    }
    for hit in corpus.hits(&entry.construction_hints) {
        score += CONSTRUCTION_HINT_SCORE;
        tags.push(format!("construction:{hit}"));
    }
    for hit in corpus.hits(&entry.brand_hints) {
        score += BRAND_HINT_SCORE;
        tags.push(format!("brand:{hit}"));
    }
    for hit in corpus.hits(&entry.indicators) {
        score += INDICATOR_SCORE;
        tags.push(format!("indicator:{hit}"));
    }
    (score, tags)
}
