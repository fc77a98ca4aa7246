use crate::enrichment::evidence::EvidenceCorpus;
use crate::lexicon::Lexicon;
use crate::models::ClassificationResult;
use serde::Serialize;
use std::sync::Arc;

const PRIMARY_PATTERN_SCORE: u32 = 6;
const SUBTYPE_PATTERN_SCORE: u32 = 8;

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MaterialClassification {
    pub primary: Option<ClassificationResult>,
    pub secondary: Option<ClassificationResult>,
}

#[derive(Debug)]
struct Scored {
    label: String,
    family: String,
    score: u32,
    tags: Vec<String>,
}

pub struct MaterialClassifier {
    lexicon: Arc<Lexicon>,
}

impl MaterialClassifier {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Subtype strings outscore generic family words, so "walnut" beats "wood".
    pub fn classify(&self, corpus: &EvidenceCorpus) -> MaterialClassification {
        let mut scored: Vec<Scored> = Vec::new();
        for entry in &self.lexicon.materials {
            let hits = corpus.hits(&entry.patterns);
            if !hits.is_empty() {
                push_merged(
                    &mut scored,
                    Scored {
                        label: entry.label.clone(),
                        family: entry.label.clone(),
                        score: PRIMARY_PATTERN_SCORE * hits.len() as u32,
                        tags: hits.iter().map(|hit| hit.to_string()).collect(),
                    },
                );
            }
            for subtype in &entry.subtypes {
                let hits = corpus.hits(&subtype.patterns);
                if hits.is_empty() {
                    continue;
                }
                push_merged(
                    &mut scored,
                    Scored {
                        label: subtype.label.clone(),
                        family: entry.label.clone(),
                        score: SUBTYPE_PATTERN_SCORE * hits.len() as u32,
                        tags: hits.iter().map(|hit| hit.to_string()).collect(),
                    },
                );
            }
        }

        // stable: equal scores keep lexicon order
        scored.sort_by(|a, b| b.score.cmp(&a.score));

        let mut ranked = scored.into_iter();
        let Some(top) = ranked.next() else {
            return MaterialClassification::default();
        };
        let secondary = ranked.find(|candidate| candidate.family != top.family);
        MaterialClassification {
            primary: Some(to_result(top)),
            secondary: secondary.map(to_result),
        }
    }
}

fn push_merged(scored: &mut Vec<Scored>, candidate: Scored) {
    match scored.iter_mut().find(|existing| existing.label == candidate.label) {
        Some(existing) if candidate.score > existing.score => *existing = candidate,
        Some(_) => {}
        None => scored.push(candidate),
    }
}

fn to_result(scored: Scored) -> ClassificationResult {
    ClassificationResult {
        label: scored.label,
        confidence: scored.score.div_ceil(2).min(10) as u8,
        evidence_tags: scored.tags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> MaterialClassification {
        MaterialClassifier::new(Arc::new(Lexicon::default())).classify(&EvidenceCorpus::from_text(text))
    }

    #[test]
    fn subtype_beats_generic_family_word() {
        let result = classify("solid wood dresser in walnut with brass pulls");
        let primary = result.primary.expect("primary");
        assert_eq!(primary.label, "Walnut");
        assert_eq!(primary.confidence, 4);
        let secondary = result.secondary.expect("secondary");
        assert_eq!(secondary.label, "Metal");
        assert_eq!(secondary.evidence_tags, vec!["brass"]);
    }

    #[test]
    fn secondary_comes_from_a_different_family() {
        let result = classify("oak and maple wood table");
        assert_eq!(result.primary.expect("primary").label, "Oak");
        assert!(result.secondary.is_none());
    }

    #[test]
    fn multiple_pattern_hits_accumulate() {
        let result = classify("steel frame with chrome and aluminum accents, leather seat");
        let primary = result.primary.expect("primary");
        assert_eq!(primary.label, "Metal");
        assert_eq!(primary.confidence, 9);
        assert_eq!(result.secondary.expect("secondary").label, "Leather");
    }

    #[test]
    fn nothing_detected() {
        let result = classify("mystery object");
        assert!(result.primary.is_none());
        assert!(result.secondary.is_none());
    }

    #[test]
    fn confidence_is_bounded() {
        let result = classify("metal steel iron aluminum chrome brass");
        assert_eq!(result.primary.expect("primary").confidence, 10);
    }
}
