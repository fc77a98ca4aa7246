use crate::lexicon::Lexicon;
use crate::models::meaningful;
use std::collections::HashSet;
use std::sync::Arc;

const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attr {
    Brand,
    Model,
    Style,
    Construction,
    Material,
    Category,
}

/// Most specific first.
const STRATEGIES: &[&[Attr]] = &[
    &[Attr::Brand, Attr::Style, Attr::Construction, Attr::Material],
    &[Attr::Brand, Attr::Model],
    &[Attr::Brand, Attr::Style, Attr::Material],
    &[Attr::Style, Attr::Construction, Attr::Material],
    &[Attr::Brand, Attr::Category],
    &[Attr::Style, Attr::Material],
    &[Attr::Construction, Attr::Material],
    &[Attr::Category],
];

/// Attributes a query can be assembled from. Generic values count as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryAttributes<'a> {
    pub brand: Option<&'a str>,
    pub model: Option<&'a str>,
    pub style: Option<&'a str>,
    pub construction: Option<&'a str>,
    pub material: Option<&'a str>,
    pub category: Option<&'a str>,
}

impl QueryAttributes<'_> {
    fn value<'s>(&'s self, attr: Attr, category_term: Option<&'s str>) -> Option<&'s str> {
        match attr {
            Attr::Brand => meaningful(self.brand),
            Attr::Model => meaningful(self.model),
            Attr::Style => meaningful(self.style),
            Attr::Construction => meaningful(self.construction),
            Attr::Material => meaningful(self.material),
            Attr::Category => category_term,
        }
    }
}

pub struct SearchQueryRanker {
    lexicon: Arc<Lexicon>,
}

impl SearchQueryRanker {
    pub fn new(lexicon: Arc<Lexicon>) -> Self {
        Self { lexicon }
    }

    /// Keyword-table term for a category, else its last word.
    pub fn category_term(&self, category: &str) -> Option<String> {
        let category = meaningful(Some(category))?;
        if let Some(term) = Lexicon::lookup(&self.lexicon.category_terms, category) {
            return Some(term.clone());
        }
        category
            .split_whitespace()
            .last()
            .map(str::to_lowercase)
    }

    pub fn rank(&self, attrs: &QueryAttributes<'_>) -> Vec<String> {
        let category_term = attrs.category.and_then(|c| self.category_term(c));
        let mut queries: Vec<String> = Vec::new();
        for strategy in STRATEGIES {
            let Some(terms) = strategy
                .iter()
                .map(|attr| attrs.value(*attr, category_term.as_deref()))
                .collect::<Option<Vec<&str>>>()
            else {
                continue;
            };
            let query = join_terms(&terms);
            if query.len() >= MIN_QUERY_LEN && !queries.contains(&query) {
                queries.push(query);
            }
        }
        queries
    }
}

fn join_terms(terms: &[&str]) -> String {
    let mut seen = HashSet::new();
    terms
        .iter()
        .flat_map(|term| term.split_whitespace())
        .map(str::to_lowercase)
        .filter(|word| seen.insert(word.clone()))
        .collect::<Vec<_>>()
        .join(" ")
}
