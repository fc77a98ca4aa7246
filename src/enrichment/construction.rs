use crate::enrichment::evidence::EvidenceCorpus;
use crate::lexicon::Lexicon;
use crate::models::ClassificationResult;
use std::sync::Arc;

const PATTERN_SCORE: u32 = 3;
const INDICATOR_SCORE: u32 = 2;
const TYPICAL_ITEM_SCORE: u32 = 1;

pub struct ConstructionClassifier {
    lexicon: Arc<Lexicon>,
}

impl ConstructionClassifier {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Furniture-like categories only; everything else has no construction method.
    pub fn classify(&self, corpus: &EvidenceCorpus, category: &str) -> Option<ClassificationResult> {
        if !self.lexicon.is_furniture(category) {
            return None;
        }
        let category = category.to_lowercase();

        let mut best: Option<(u32, ClassificationResult)> = None;
        for method in &self.lexicon.construction.methods {
            let mut score = 0;
            let mut tags = Vec::new();
            for hit in corpus.hits(&method.patterns) {
                score += PATTERN_SCORE;
                tags.push(format!("pattern:{hit}"));
            }
            for hit in corpus.hits(&method.indicators) {
                score += INDICATOR_SCORE;
                tags.push(format!("indicator:{hit}"));
            }
            if let Some(item) = method
                .typical_items
                .iter()
                .find(|item| category.contains(item.as_str()))
            {
                score += TYPICAL_ITEM_SCORE;
                tags.push(format!("typical:{item}"));
            }
            if score == 0 {
                continue;
            }
            if best.as_ref().is_none_or(|(top, _)| score > *top) {
                best = Some((
                    score,
                    ClassificationResult {
                        label: method.label.clone(),
                        confidence: (score * 2).min(10) as u8,
                        evidence_tags: tags,
                    },
                ));
            }
        }
        best.map(|(_, result)| result)
    }
}
