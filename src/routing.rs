//! Disposition routing: value, condition and preferences in, ranked routes out.

use crate::models::{
    ConditionRating, DispositionRoute, Effort, ItemDescription, PriceEstimate, RouteType,
    UserPreferences, is_meaningful,
};
use serde_json::{Value, json};
use std::collections::BTreeMap;

const RECYCLE_RETURN_RATIO: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    pub min_value: f64,
    pub instant_offer_ratio: f64,
    pub pickup_window_hours: u32,
    pub tax_deductible_threshold: f64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            min_value: 10.0,
            instant_offer_ratio: 0.65,
            pickup_window_hours: 4,
            tax_deductible_threshold: 50.0,
        }
    }
}

pub struct DispositionRouter {
    config: RouterConfig,
}

impl DispositionRouter {
    pub fn new(config: RouterConfig) -> Self {
        Self { config }
    }

    /// Never empty: `dispose` is emitted alone when nothing else qualifies.
    pub fn routes(
        &self,
        item: &ItemDescription,
        estimate: &PriceEstimate,
        preferences: &UserPreferences,
    ) -> Vec<DispositionRoute> {
        let value = if estimate.suggested.is_finite() {
            estimate.suggested.max(0.0)
        } else {
            0.0
        };
        let usable = item.condition.usable_as_is;
        let poor = item.condition.rating == ConditionRating::Poor;
        let components: Vec<&str> = item
            .salvageable_components
            .iter()
            .map(String::as_str)
            .filter(|c| is_meaningful(c))
            .collect();

        let mut routes = Vec::new();
        if value >= self.config.min_value && usable {
            routes.push(route(
                RouteType::InstantOffer,
                priority(RouteType::InstantOffer, preferences),
                value * self.config.instant_offer_ratio,
                "1-3 days",
                Effort::Low,
                [("offerRatio", json!(self.config.instant_offer_ratio))],
            ));
            if preferences.has_resale_account {
                routes.push(route(
                    RouteType::Resell,
                    priority(RouteType::Resell, preferences),
                    estimate.net_profit,
                    "7-14 days",
                    Effort::Medium,
                    [
                        ("fees", json!(estimate.fees)),
                        ("shippingCost", json!(estimate.shipping_cost)),
                    ],
                ));
            }
            routes.push(route(
                RouteType::LocalPickup,
                priority(RouteType::LocalPickup, preferences),
                0.0,
                "immediate",
                Effort::Minimal,
                [("pickupWindowHours", json!(self.config.pickup_window_hours))],
            ));
        }

        if !poor {
            let deductible = value > self.config.tax_deductible_threshold;
            routes.push(route(
                RouteType::Donate,
                priority(RouteType::Donate, preferences),
                0.0,
                "immediate",
                Effort::Low,
                [
                    ("taxDeductible", json!(deductible)),
                    ("estimatedDeduction", json!(if deductible { value } else { 0.0 })),
                ],
            ));
        }

        if !components.is_empty() {
            routes.push(route(
                RouteType::RecycleParts,
                priority(RouteType::RecycleParts, preferences),
                value * RECYCLE_RETURN_RATIO,
                "3-7 days",
                Effort::Medium,
                [("components", json!(components))],
            ));
        }

        if routes.is_empty() {
            let factors = self.disqualifying_factors(value, usable, poor);
            let reason = factors
                .first()
                .cloned()
                .unwrap_or_else(|| "no disposition route qualifies".to_string());
            routes.push(route(
                RouteType::Dispose,
                priority(RouteType::Dispose, preferences),
                0.0,
                "immediate",
                Effort::Minimal,
                [("reason", json!(reason)), ("factors", json!(factors))],
            ));
        }

        routes.sort_by_key(|r| r.priority);
        routes
    }

    fn disqualifying_factors(&self, value: f64, usable: bool, poor: bool) -> Vec<String> {
        let mut factors = Vec::new();
        if value < self.config.min_value {
            factors.push(format!(
                "estimated value ${value:.2} is below the ${:.2} minimum",
                self.config.min_value
            ));
        }
        if !usable {
            factors.push("item is not usable as-is".to_string());
        }
        if poor {
            factors.push("condition is poor".to_string());
        }
        factors.push("no salvageable components".to_string());
        factors
    }
}

/// 1 is best. The instant-offer preference swaps the top two.
fn priority(route_type: RouteType, preferences: &UserPreferences) -> u32 {
    match route_type {
        RouteType::Resell if preferences.prefer_instant_offer => 2,
        RouteType::InstantOffer if preferences.prefer_instant_offer => 1,
        RouteType::Resell => 1,
        RouteType::InstantOffer => 2,
        RouteType::LocalPickup => 3,
        RouteType::Donate => 4,
        RouteType::RecycleParts => 5,
        RouteType::Dispose => 6,
    }
}

fn route<const N: usize>(
    route_type: RouteType,
    priority: u32,
    estimated_return: f64,
    time_to_money: &str,
    effort: Effort,
    details: [(&str, Value); N],
) -> DispositionRoute {
    DispositionRoute {
        route_type,
        priority,
        estimated_return: ((estimated_return.max(0.0)) * 100.0).round() / 100.0,
        time_to_money: time_to_money.to_string(),
        effort,
        details: details
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect::<BTreeMap<_, _>>(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PriceConfidence, PriceRange, PriceSource};

    fn estimate(value: f64) -> PriceEstimate {
        PriceEstimate {
            suggested: value,
            confidence: PriceConfidence::Medium,
            price_range: PriceRange {
                low: value,
                high: value,
                median: value,
            },
            sample_size: 5,
            shipping_cost: 12.0,
            fees: 8.0,
            net_profit: (value - 20.0).max(0.0),
            source: PriceSource::Marketplace,
            reason: None,
        }
    }

    fn item(rating: ConditionRating, usable: bool) -> ItemDescription {
        let mut item = ItemDescription::degraded();
        item.category = "Chair".into();
        item.condition.rating = rating;
        item.condition.usable_as_is = usable;
        item
    }

    fn types(routes: &[DispositionRoute]) -> Vec<RouteType> {
        routes.iter().map(|r| r.route_type).collect()
    }

    fn router() -> DispositionRouter {
        DispositionRouter::new(RouterConfig::default())
    }

    #[test]
    fn poor_low_value_item_is_disposed() {
        let routes = router().routes(
            &item(ConditionRating::Poor, true),
            &estimate(5.0),
            &UserPreferences::default(),
        );
        assert_eq!(types(&routes), vec![RouteType::Dispose]);
        let reason = routes[0].details["reason"].as_str().unwrap_or_default();
        assert!(reason.contains("below the $10.00 minimum"), "{reason}");
    }

    #[test]
    fn valuable_item_with_resale_account() {
        let prefs = UserPreferences {
            has_resale_account: true,
            prefer_instant_offer: false,
        };
        let routes = router().routes(&item(ConditionRating::Good, true), &estimate(120.0), &prefs);
        assert_eq!(
            types(&routes),
            vec![
                RouteType::Resell,
                RouteType::InstantOffer,
                RouteType::LocalPickup,
                RouteType::Donate,
            ]
        );
        assert_eq!(routes[0].estimated_return, 100.0);
        assert_eq!(routes[1].estimated_return, 78.0);
        assert_eq!(routes[2].details["pickupWindowHours"], json!(4));
        assert_eq!(routes[3].details["taxDeductible"], json!(true));
        let priorities: Vec<u32> = routes.iter().map(|r| r.priority).collect();
        assert!(priorities.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn instant_offer_preference_swaps_priorities() {
        let prefs = UserPreferences {
            has_resale_account: true,
            prefer_instant_offer: true,
        };
        let routes = router().routes(&item(ConditionRating::Excellent, true), &estimate(80.0), &prefs);
        assert_eq!(routes[0].route_type, RouteType::InstantOffer);
        assert_eq!(routes[0].priority, 1);
        assert_eq!(routes[1].route_type, RouteType::Resell);
        assert_eq!(routes[1].priority, 2);
    }

    #[test]
    fn no_resale_account_skips_resell() {
        let routes = router().routes(
            &item(ConditionRating::Good, true),
            &estimate(30.0),
            &UserPreferences::default(),
        );
        assert_eq!(
            types(&routes),
            vec![RouteType::InstantOffer, RouteType::LocalPickup, RouteType::Donate]
        );
        assert_eq!(routes[2].details["taxDeductible"], json!(false));
    }

    #[test]
    fn salvageable_parts_are_recycled() {
        let mut broken = item(ConditionRating::Poor, false);
        broken.salvageable_components = vec!["battery".into(), "screen".into()];
        let routes = router().routes(&broken, &estimate(60.0), &UserPreferences::default());
        assert_eq!(types(&routes), vec![RouteType::RecycleParts]);
        assert_eq!(routes[0].details["components"], json!(["battery", "screen"]));
    }

    #[test]
    fn unusable_fair_item_can_still_be_donated() {
        let routes = router().routes(
            &item(ConditionRating::Fair, false),
            &estimate(60.0),
            &UserPreferences::default(),
        );
        assert_eq!(types(&routes), vec![RouteType::Donate]);
    }

    #[test]
    fn negative_value_never_yields_negative_return() {
        let mut estimate = estimate(-15.0);
        estimate.net_profit = -3.0;
        let routes = router().routes(
            &item(ConditionRating::Poor, false),
            &estimate,
            &UserPreferences::default(),
        );
        assert_eq!(types(&routes), vec![RouteType::Dispose]);
        assert!(routes.iter().all(|r| r.estimated_return >= 0.0));
        assert_eq!(routes[0].details["factors"].as_array().map(Vec::len), Some(4));
    }
}
