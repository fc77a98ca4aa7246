//! Comparable-driven price estimation with a manual heuristic fallback.
//!
//! Pricing never fails: every collaborator error or empty sample degrades to the manual
//! category and brand heuristic, tagged with the reason.

use super::stats::{PriceStats, median};
use super::{ComparableQuery, ListingCondition, MarketplaceSearch};
use crate::lexicon::Lexicon;
use crate::models::{
    Condition, ConditionRating, ItemDescription, MarketAnalysis, PriceConfidence, PriceEstimate,
    PriceRange, PriceSource, meaningful,
};
use std::sync::Arc;
use tracing::{info, warn};

const FINAL_VALUE_FEE_RATE: f64 = 0.1325;
const PAYMENT_FEE_RATE: f64 = 0.029;
const PAYMENT_FEE_FIXED: f64 = 0.30;
const UNUSABLE_PENALTY: f64 = 0.6;
const MANUAL_RANGE_SPREAD: f64 = 0.3;
const MAX_FALLBACK_KEYWORDS: usize = 5;

const STOPWORDS: &[&str] = &[
    "the", "and", "with", "for", "from", "this", "that", "has", "some", "very", "item",
];

pub fn condition_multiplier(rating: ConditionRating) -> f64 {
    match rating {
        ConditionRating::Excellent => 1.0,
        ConditionRating::Good => 0.85,
        ConditionRating::Fair => 0.65,
        ConditionRating::Poor => 0.35,
        ConditionRating::Unknown => 0.75,
    }
}

pub fn marketplace_fees(price: f64) -> f64 {
    if price <= 0.0 {
        return 0.0;
    }
    round2(price * (FINAL_VALUE_FEE_RATE + PAYMENT_FEE_RATE) + PAYMENT_FEE_FIXED)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub struct ComparablesPriceEstimator {
    lexicon: Arc<Lexicon>,
    limit: usize,
}

impl ComparablesPriceEstimator {
    pub fn new(lexicon: Arc<Lexicon>, limit: usize) -> Self {
        Self {
            lexicon,
            limit: limit.max(1),
        }
    }

    /// Brand, model and category term. Without a usable brand or model the most specific
    /// ranked candidate wins, then plain description keywords.
    pub fn search_query(&self, item: &ItemDescription, candidates: &[String]) -> String {
        let brand = meaningful(Some(item.brand.as_str()));
        let model = meaningful(item.model.as_deref());
        if brand.is_some() || model.is_some() {
            let mut terms: Vec<String> = Vec::new();
            for term in [brand, model].into_iter().flatten() {
                terms.push(term.to_lowercase());
            }
            if let Some(category) = self.category_term(&item.category) {
                terms.push(category);
            }
            return dedupe_words(&terms.join(" "));
        }
        if let Some(first) = candidates.first() {
            return first.clone();
        }
        description_keywords(item)
    }

    fn category_term(&self, category: &str) -> Option<String> {
        let category = meaningful(Some(category))?;
        Lexicon::lookup(&self.lexicon.category_terms, category)
            .cloned()
            .or_else(|| category.split_whitespace().last().map(str::to_lowercase))
    }

    pub async fn estimate(
        &self,
        item: &ItemDescription,
        search: Option<&dyn MarketplaceSearch>,
        condition: &Condition,
    ) -> PriceEstimate {
        self.appraise_with(item, &[], search, condition).await.0
    }

    /// Estimate plus the market analysis behind it.
    pub async fn appraise(
        &self,
        item: &ItemDescription,
        candidates: &[String],
        search: Option<&dyn MarketplaceSearch>,
    ) -> (PriceEstimate, MarketAnalysis) {
        self.appraise_with(item, candidates, search, &item.condition)
            .await
    }

    async fn appraise_with(
        &self,
        item: &ItemDescription,
        candidates: &[String],
        search: Option<&dyn MarketplaceSearch>,
        condition: &Condition,
    ) -> (PriceEstimate, MarketAnalysis) {
        let keywords = self.search_query(item, candidates);
        let mut analysis = MarketAnalysis {
            search_query: keywords.clone(),
            query_candidates: candidates.to_vec(),
            ..MarketAnalysis::default()
        };

        if keywords.trim().is_empty() {
            return (self.manual(item, condition, "no search terms"), analysis);
        }
        let Some(search) = search else {
            return (
                self.manual(item, condition, "marketplace search not configured"),
                analysis,
            );
        };

        let query = ComparableQuery {
            condition: Some(ListingCondition::Used),
            ..ComparableQuery::new(keywords.clone(), self.limit)
        };
        let listings = match search.search(&query).await {
            Ok(listings) => listings,
            Err(err) => {
                warn!(
                    target = "hermes.pricing",
                    query = %keywords,
                    error = %err,
                    "comparables_unavailable_using_manual"
                );
                return (
                    self.manual(item, condition, &format!("comparables search failed: {err}")),
                    analysis,
                );
            }
        };
        analysis.comparables_found = listings.len();
        analysis.currency = listings.first().map(|l| l.price.currency.clone());
        if listings.is_empty() {
            return (
                self.manual(item, condition, "no comparable listings found"),
                analysis,
            );
        }

        let prices: Vec<f64> = listings.iter().map(|l| l.price.amount).collect();
        let Some(stats) = PriceStats::from_prices(&prices) else {
            return (
                self.manual(item, condition, "no positive comparable prices"),
                analysis,
            );
        };
        analysis.prices_used = stats.sample_size();
        analysis.outliers_removed = stats.outliers_removed;
        analysis.mean = Some(round2(stats.mean));
        analysis.std_dev = Some(round2(stats.std_dev));
        analysis.median = Some(round2(stats.median));
        analysis.min = Some(stats.min);
        analysis.max = Some(stats.max);

        let multiplier = adjusted_multiplier(condition);
        let suggested = round2(stats.median * multiplier);
        let mut shipping: Vec<f64> = listings
            .iter()
            .filter_map(|l| l.shipping_cost)
            .filter(|cost| cost.is_finite() && *cost >= 0.0)
            .collect();
        let shipping_cost = if shipping.is_empty() {
            self.table_shipping(&item.category)
        } else {
            shipping.sort_by(f64::total_cmp);
            round2(median(&shipping))
        };
        let fees = marketplace_fees(suggested);

        info!(
            target = "hermes.pricing",
            query = %keywords,
            comparables = listings.len(),
            used = stats.sample_size(),
            outliers = stats.outliers_removed,
            suggested,
            "comparables_priced"
        );

        let estimate = PriceEstimate {
            suggested,
            confidence: stats.confidence(),
            price_range: PriceRange {
                low: round2(stats.min * multiplier),
                high: round2(stats.max * multiplier),
                median: suggested,
            },
            sample_size: stats.sample_size(),
            shipping_cost,
            fees,
            net_profit: round2((suggested - fees - shipping_cost).max(0.0)),
            source: PriceSource::Marketplace,
            reason: None,
        };
        (estimate, analysis)
    }

    /// Category base price, scaled by brand premium and condition.
    fn manual(&self, item: &ItemDescription, condition: &Condition, reason: &str) -> PriceEstimate {
        let base = Lexicon::lookup(&self.lexicon.base_prices, &item.category)
            .copied()
            .unwrap_or(self.lexicon.default_base_price);
        let premium = match meaningful(Some(item.brand.as_str())) {
            Some(brand) => Lexicon::lookup(&self.lexicon.brand_premiums, brand)
                .copied()
                .unwrap_or(self.lexicon.known_brand_multiplier),
            None => 1.0,
        };
        let suggested = round2((base * premium * adjusted_multiplier(condition)).max(0.0));
        let shipping_cost = self.table_shipping(&item.category);
        let fees = marketplace_fees(suggested);

        warn!(
            target = "hermes.pricing",
            category = %item.category,
            reason,
            suggested,
            "manual_price_fallback"
        );

        PriceEstimate {
            suggested,
            confidence: PriceConfidence::Low,
            price_range: PriceRange {
                low: round2(suggested * (1.0 - MANUAL_RANGE_SPREAD)),
                high: round2(suggested * (1.0 + MANUAL_RANGE_SPREAD)),
                median: suggested,
            },
            sample_size: 0,
            shipping_cost,
            fees,
            net_profit: round2((suggested - fees - shipping_cost).max(0.0)),
            source: PriceSource::Manual,
            reason: Some(reason.to_string()),
        }
    }

    fn table_shipping(&self, category: &str) -> f64 {
        Lexicon::lookup(&self.lexicon.shipping_costs, category)
            .copied()
            .unwrap_or(self.lexicon.default_shipping_cost)
    }
}

fn adjusted_multiplier(condition: &Condition) -> f64 {
    let multiplier = condition_multiplier(condition.rating);
    if condition.usable_as_is {
        multiplier
    } else {
        multiplier * UNUSABLE_PENALTY
    }
}

fn dedupe_words(text: &str) -> String {
    let mut seen: Vec<String> = Vec::new();
    for word in text.split_whitespace().map(str::to_lowercase) {
        if !seen.contains(&word) {
            seen.push(word);
        }
    }
    seen.join(" ")
}

fn description_keywords(item: &ItemDescription) -> String {
    let sources = [Some(item.category.as_str()), item.identifiers.visible_text.as_deref()]
        .into_iter()
        .flatten()
        .chain(item.identifiers.distinctive_features.iter().map(String::as_str))
        .chain(item.key_features.iter().map(String::as_str))
        .filter_map(|text| meaningful(Some(text)));

    let mut words: Vec<String> = Vec::new();
    for text in sources {
        for word in text
            .split(|ch: char| !ch.is_alphanumeric() && ch != '-')
            .map(str::to_lowercase)
        {
            if word.len() < 3 || STOPWORDS.contains(&word.as_str()) || words.contains(&word) {
                continue;
            }
            words.push(word);
            if words.len() == MAX_FALLBACK_KEYWORDS {
                return words.join(" ");
            }
        }
    }
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ComparableListing, Money};
    use crate::pricing::SearchError;
    use crate::pricing::testing::{ScriptedSearch, listings};

    fn estimator() -> ComparablesPriceEstimator {
        ComparablesPriceEstimator::new(Arc::new(Lexicon::default()), 50)
    }

    fn item(category: &str, brand: &str) -> ItemDescription {
        ItemDescription {
            category: category.into(),
            brand: brand.into(),
            ..ItemDescription::degraded()
        }
    }

    fn excellent() -> Condition {
        Condition {
            rating: ConditionRating::Excellent,
            ..Condition::default()
        }
    }

    #[tokio::test]
    async fn outlier_is_removed_before_median() {
        let search = ScriptedSearch::prices(&[10.0, 12.0, 11.0, 500.0]);
        let (estimate, analysis) = estimator()
            .appraise_with(&item("Chair", "IKEA"), &[], Some(&search), &excellent())
            .await;
        assert_eq!(estimate.source, PriceSource::Marketplace);
        assert_eq!(estimate.suggested, 11.0);
        assert_eq!(estimate.price_range.median, 11.0);
        assert_eq!(estimate.sample_size, 3);
        assert_eq!(analysis.outliers_removed, 1);
        assert_eq!(analysis.comparables_found, 4);
        assert_eq!(analysis.search_query, "ikea chair");
    }

    #[tokio::test]
    async fn condition_and_usability_scale_the_price() {
        let search = ScriptedSearch::prices(&[100.0, 100.0, 100.0]);
        let mut condition = Condition {
            rating: ConditionRating::Fair,
            ..Condition::default()
        };
        let estimate = estimator()
            .estimate(&item("Desk", "Herman Miller"), Some(&search), &condition)
            .await;
        assert_eq!(estimate.suggested, 65.0);

        condition.usable_as_is = false;
        let estimate = estimator()
            .estimate(&item("Desk", "Herman Miller"), Some(&search), &condition)
            .await;
        assert_eq!(estimate.suggested, 39.0);
    }

    #[tokio::test]
    async fn fees_and_shipping_net_out() {
        let mut found = listings(&[200.0, 200.0, 200.0]);
        found[0].shipping_cost = Some(20.0);
        found[1].shipping_cost = Some(30.0);
        let search = ScriptedSearch::new(vec![Ok(found)]);
        let estimate = estimator()
            .estimate(&item("Sofa", "West Elm"), Some(&search), &excellent())
            .await;
        assert_eq!(estimate.suggested, 200.0);
        assert_eq!(estimate.fees, 32.6);
        assert_eq!(estimate.shipping_cost, 25.0);
        assert_eq!(estimate.net_profit, 142.4);
    }

    #[tokio::test]
    async fn net_profit_is_never_negative() {
        let search = ScriptedSearch::prices(&[8.0, 9.0, 10.0]);
        let estimate = estimator()
            .estimate(&item("Sofa", "Generic"), Some(&search), &excellent())
            .await;
        assert_eq!(estimate.shipping_cost, 150.0);
        assert_eq!(estimate.net_profit, 0.0);
    }

    #[tokio::test]
    async fn search_error_falls_back_to_manual() {
        let search = ScriptedSearch::new(vec![Err(SearchError::Timeout(8000))]);
        let estimate = estimator()
            .estimate(&item("Office Chair", "Herman Miller"), Some(&search), &excellent())
            .await;
        assert_eq!(estimate.source, PriceSource::Manual);
        assert_eq!(estimate.confidence, PriceConfidence::Low);
        // chair base 45 * premium 4.0
        assert_eq!(estimate.suggested, 180.0);
        assert!(estimate.reason.as_deref().unwrap_or_default().contains("timed out"));
    }

    #[tokio::test]
    async fn empty_or_unpriced_comparables_fall_back() {
        let search = ScriptedSearch::prices(&[]);
        let estimate = estimator()
            .estimate(&item("Lamp", "Unknown"), Some(&search), &excellent())
            .await;
        assert_eq!(estimate.source, PriceSource::Manual);
        assert_eq!(estimate.suggested, 25.0);
        assert_eq!(estimate.reason.as_deref(), Some("no comparable listings found"));

        let search = ScriptedSearch::new(vec![Ok(vec![ComparableListing {
            title: "free".into(),
            price: Money::usd(0.0),
            condition: None,
            url: None,
            shipping_cost: None,
        }])]);
        let estimate = estimator()
            .estimate(&item("Lamp", "Acme"), Some(&search), &excellent())
            .await;
        assert_eq!(estimate.source, PriceSource::Manual);
        // unknown-premium brand multiplier 1.15
        assert_eq!(estimate.suggested, 28.75);
    }

    #[tokio::test]
    async fn missing_search_collaborator_is_manual() {
        let estimate = estimator()
            .estimate(&item("Jacket", "Patagonia"), None, &excellent())
            .await;
        assert_eq!(estimate.source, PriceSource::Manual);
        assert!(estimate.suggested >= 0.0);
    }

    #[test]
    fn search_query_falls_back_to_description() {
        let estimator = estimator();
        let mut item = item("Side Table", "Unknown");
        item.identifiers.distinctive_features = vec!["tile top with brass feet".into()];
        assert_eq!(
            estimator.search_query(&item, &[]),
            "side table tile top brass"
        );
        assert_eq!(
            estimator.search_query(&item, &["mid-century modern walnut".into()]),
            "mid-century modern walnut"
        );

        let mut branded = item.clone();
        branded.brand = "Apple".into();
        branded.model = Some("MacBook Air".into());
        branded.category = "Laptop".into();
        assert_eq!(estimator.search_query(&branded, &[]), "apple macbook air laptop");
    }

    #[test]
    fn fee_schedule() {
        assert_eq!(marketplace_fees(100.0), 16.45);
        assert_eq!(marketplace_fees(0.0), 0.0);
    }
}
