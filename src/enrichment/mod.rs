//! Heuristic enrichment of an upstream item description.
//!
//! Every classifier borrows the shared [`Lexicon`] and works on an [`EvidenceCorpus`] built
//! fresh for each item, so concurrent analyses share nothing mutable.

pub mod brand;
pub mod compose;
pub mod construction;
pub mod evidence;
pub mod material;
pub mod patterns;
pub mod queries;
pub mod style;

use crate::lexicon::{Lexicon, LexiconError};
use crate::models::{BrandCandidate, ClassificationResult, ItemDescription, is_meaningful, meaningful};
use brand::BrandResolver;
use compose::{CategoryComposer, EnrichmentBuilder};
use construction::ConstructionClassifier;
use evidence::EvidenceCorpus;
use material::{MaterialClassification, MaterialClassifier};
use patterns::ExtractedPatterns;
use queries::{QueryAttributes, SearchQueryRanker};
use serde::Serialize;
use std::sync::Arc;
use style::StyleClassifier;

const ELECTRONIC_SALVAGE: &[&str] = &["circuit board", "battery", "display", "casing"];

/// Output of the three independent classifiers.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Classifications {
    pub materials: MaterialClassification,
    pub style: Option<ClassificationResult>,
    pub construction: Option<ClassificationResult>,
}

/// Everything the enrichment pass derived for one item.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Enrichment {
    pub patterns: ExtractedPatterns,
    pub brand: Option<BrandCandidate>,
    pub materials: MaterialClassification,
    pub style: Option<ClassificationResult>,
    pub construction: Option<ClassificationResult>,
    pub composed_category: String,
    pub search_queries: Vec<String>,
}

pub struct Enricher {
    lexicon: Arc<Lexicon>,
    brands: BrandResolver,
    materials: MaterialClassifier,
    styles: StyleClassifier,
    construction: ConstructionClassifier,
    queries: SearchQueryRanker,
}

impl Enricher {
    pub fn new(lexicon: Arc<Lexicon>) -> Result<Self, LexiconError> {
        Ok(Self {
            brands: BrandResolver::new(lexicon.clone())?,
            materials: MaterialClassifier::new(lexicon.clone()),
            styles: StyleClassifier::new(lexicon.clone()),
            construction: ConstructionClassifier::new(lexicon.clone()),
            queries: SearchQueryRanker::new(lexicon.clone()),
            lexicon,
        })
    }

    pub fn resolve_brand(
        &self,
        corpus: &EvidenceCorpus,
        patterns: &ExtractedPatterns,
        category: &str,
    ) -> Option<BrandCandidate> {
        self.brands.resolve(corpus, patterns, category)
    }

    /// Style scoring depends on the primary material, so material runs first.
    pub fn classify(&self, corpus: &EvidenceCorpus, category: &str) -> Classifications {
        let materials = self.materials.classify(corpus);
        let primary = materials.primary.as_ref().map(|r| r.label.as_str());
        let style = self.styles.classify(corpus, category, primary);
        let construction = self.construction.classify(corpus, category);
        Classifications {
            materials,
            style,
            construction,
        }
    }

    /// Composes the category and ranks search queries from the classifier output.
    pub fn compose(
        &self,
        item: &ItemDescription,
        patterns: ExtractedPatterns,
        brand: Option<BrandCandidate>,
        classes: Classifications,
    ) -> Enrichment {
        let label = |r: &Option<ClassificationResult>| r.as_ref().map(|r| r.label.clone());
        let style = label(&classes.style);
        let material = label(&classes.materials.primary);
        let construction = label(&classes.construction);

        let composed_category = CategoryComposer::compose(
            &item.category,
            style.as_deref(),
            material.as_deref(),
            construction.as_deref(),
        );

        let brand_name = meaningful(Some(item.brand.as_str()))
            .or_else(|| brand.as_ref().map(|b| b.brand_name.as_str()));
        let search_queries = self.queries.rank(&QueryAttributes {
            brand: brand_name,
            model: item.model.as_deref(),
            style: meaningful(item.specifications.style.as_deref())
                .or(meaningful(item.style.as_deref()))
                .or(style.as_deref()),
            construction: meaningful(item.specifications.construction.as_deref())
                .or(construction.as_deref()),
            material: meaningful(item.specifications.material.as_deref())
                .or(material.as_deref()),
            category: Some(item.category.as_str()),
        });

        Enrichment {
            patterns,
            brand,
            materials: classes.materials,
            style: classes.style,
            construction: classes.construction,
            composed_category,
            search_queries,
        }
    }

    /// Runs every enrichment step for one item.
    pub fn enrich(&self, item: &ItemDescription) -> Enrichment {
        let corpus = EvidenceCorpus::from_item(item);
        let patterns = ExtractedPatterns::extract(&corpus);
        let brand = self.resolve_brand(&corpus, &patterns, &item.category);
        let classes = self.classify(&corpus, &item.category);
        self.compose(item, patterns, brand, classes)
    }

    /// New description carrying the enrichment. Unusable electronics are treated as having
    /// salvageable parts when the upstream listed none.
    pub fn apply(&self, item: &ItemDescription, enrichment: &Enrichment) -> ItemDescription {
        let mut enriched = EnrichmentBuilder::new(item).build(enrichment);
        if enriched.salvageable_components.iter().all(|c| !is_meaningful(c))
            && !enriched.condition.usable_as_is
            && self.lexicon.is_electronics(&item.category)
        {
            enriched.salvageable_components =
                ELECTRONIC_SALVAGE.iter().map(|c| c.to_string()).collect();
        }
        enriched
    }
}
