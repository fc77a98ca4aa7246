use crate::enrichment::Enrichment;
use crate::models::{ItemDescription, is_meaningful};
use std::collections::HashSet;

/// Prefixes a category with classifier labels: style, then primary material, then
/// construction. The original category always comes last.
pub struct CategoryComposer;

impl CategoryComposer {
    pub fn compose(
        category: &str,
        style: Option<&str>,
        material: Option<&str>,
        construction: Option<&str>,
    ) -> String {
        let category = category.trim();
        let mut running = category.to_lowercase();
        let mut seen: HashSet<String> = running.split_whitespace().map(str::to_string).collect();
        let mut prefix: Vec<String> = Vec::new();

        for label in [style, material, construction].into_iter().flatten() {
            let label = label.trim();
            if !is_meaningful(label) {
                continue;
            }
            let lowered = label.to_lowercase();
            if running.contains(&lowered) {
                continue;
            }
            let words: Vec<&str> = label
                .split_whitespace()
                .filter(|word| seen.insert(word.to_lowercase()))
                .collect();
            if words.is_empty() {
                continue;
            }
            let fragment = words.join(" ");
            running = format!("{running} {}", fragment.to_lowercase());
            prefix.push(fragment);
        }

        if category.is_empty() {
            return prefix.join(" ");
        }
        prefix.push(category.to_string());
        prefix.join(" ")
    }
}

/// Produces the enriched copy of an upstream description. The upstream value is never
/// modified; fields the vision collaborator already filled are kept.
pub struct EnrichmentBuilder<'a> {
    upstream: &'a ItemDescription,
}

impl<'a> EnrichmentBuilder<'a> {
    pub fn new(upstream: &'a ItemDescription) -> Self {
        Self { upstream }
    }

    pub fn build(&self, enrichment: &Enrichment) -> ItemDescription {
        let mut item = self.upstream.clone();

        if !is_meaningful(&item.brand)
            && let Some(brand) = &enrichment.brand
        {
            item.brand = brand.brand_name.clone();
        }

        let primary = enrichment.materials.primary.as_ref().map(|r| r.label.clone());
        let style = enrichment.style.as_ref().map(|r| r.label.clone());
        let construction = enrichment.construction.as_ref().map(|r| r.label.clone());

        fill(&mut item.specifications.material, primary.as_deref());
        fill(&mut item.specifications.style, style.as_deref());
        fill(&mut item.specifications.construction, construction.as_deref());
        fill(&mut item.style, style.as_deref());

        if item.materials.iter().all(|m| !is_meaningful(m)) {
            item.materials = [&enrichment.materials.primary, &enrichment.materials.secondary]
                .into_iter()
                .flatten()
                .map(|r| r.label.clone())
                .collect();
        }

        if enrichment.composed_category != self.upstream.category {
            item.original_category = Some(self.upstream.category.clone());
            item.category = enrichment.composed_category.clone();
        }
        item
    }
}

fn fill(slot: &mut Option<String>, value: Option<&str>) {
    let empty = slot.as_deref().is_none_or(|current| !is_meaningful(current));
    if empty && let Some(value) = value {
        *slot = Some(value.to_string());
    }
}
