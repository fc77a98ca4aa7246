use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::skip_serializing_none;
use std::collections::BTreeMap;

pub const UNKNOWN: &str = "Unknown";

const GENERIC_VALUES: &[&str] = &["unknown", "generic", "unbranded", "none", "n/a", "na"];

/// True when a free-text attribute carries real information.
pub fn is_meaningful(value: &str) -> bool {
    let trimmed = value.trim().to_lowercase();
    !trimmed.is_empty() && !GENERIC_VALUES.contains(&trimmed.as_str())
}

pub fn meaningful(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| is_meaningful(v))
}

fn default_brand() -> String {
    UNKNOWN.to_string()
}

fn default_confidence() -> u8 {
    5
}

/// Structured description of a photographed item, as produced by the vision collaborator.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemDescription {
    pub category: String,
    #[serde(default = "default_brand")]
    pub brand: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub condition: Condition,
    #[serde(default)]
    pub identifiers: Identifiers,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default)]
    pub materials: Vec<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub key_features: Vec<String>,
    #[serde(default)]
    pub salvageable_components: Vec<String>,
    #[serde(default)]
    pub original_category: Option<String>,
    #[serde(default = "default_confidence")]
    pub confidence: u8,
}

impl ItemDescription {
    pub fn degraded() -> Self {
        Self {
            category: UNKNOWN.to_string(),
            brand: UNKNOWN.to_string(),
            model: None,
            condition: Condition::default(),
            identifiers: Identifiers::default(),
            specifications: Specifications::default(),
            materials: Vec::new(),
            style: None,
            key_features: Vec::new(),
            salvageable_components: Vec::new(),
            original_category: None,
            confidence: 1,
        }
    }

    /// Clamp numeric fields into their declared ranges.
    pub fn sanitized(mut self) -> Self {
        self.confidence = self.confidence.clamp(1, 10);
        self.condition.numeric_rating = self.condition.numeric_rating.clamp(1, 10);
        if self.brand.trim().is_empty() {
            self.brand = UNKNOWN.to_string();
        }
        self
    }
}

/// Unrecognised ratings deserialize to `Unknown` instead of failing the whole description.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum ConditionRating {
    Excellent,
    #[default]
    Good,
    Fair,
    Poor,
    Unknown,
}

impl From<String> for ConditionRating {
    fn from(value: String) -> Self {
        ConditionRating::parse(&value).unwrap_or(ConditionRating::Unknown)
    }
}

impl ConditionRating {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionRating::Excellent => "excellent",
            ConditionRating::Good => "good",
            ConditionRating::Fair => "fair",
            ConditionRating::Poor => "poor",
            ConditionRating::Unknown => "unknown",
        }
    }

    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "excellent" | "like new" | "like_new" | "mint" => Some(ConditionRating::Excellent),
            "good" | "very good" => Some(ConditionRating::Good),
            "fair" | "acceptable" => Some(ConditionRating::Fair),
            "poor" | "damaged" | "for parts" => Some(ConditionRating::Poor),
            _ => None,
        }
    }
}

fn default_numeric_rating() -> u8 {
    5
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub rating: ConditionRating,
    #[serde(default = "default_numeric_rating")]
    pub numeric_rating: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub usable_as_is: bool,
    #[serde(default)]
    pub issues: Vec<String>,
}

impl Default for Condition {
    fn default() -> Self {
        Self {
            rating: ConditionRating::default(),
            numeric_rating: default_numeric_rating(),
            description: String::new(),
            usable_as_is: true,
            issues: Vec::new(),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Identifiers {
    #[serde(default)]
    pub visible_text: Option<String>,
    #[serde(default)]
    pub logos_seen: Vec<String>,
    #[serde(default)]
    pub size_info: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub distinctive_features: Vec<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Specifications {
    #[serde(default)]
    pub material: Option<String>,
    #[serde(default)]
    pub construction: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub era: Option<String>,
}

impl Specifications {
    pub fn values(&self) -> impl Iterator<Item = &str> {
        [&self.material, &self.construction, &self.style, &self.era]
            .into_iter()
            .filter_map(|value| value.as_deref())
    }
}

/// Declared in tie-break priority order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum BrandMethod {
    Direct,
    ModelInference,
    Fuzzy,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BrandCandidate {
    pub brand_name: String,
    pub confidence: u8,
    pub evidence: Vec<String>,
    pub method: BrandMethod,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub label: String,
    pub confidence: u8,
    pub evidence_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Money {
    pub amount: f64,
    pub currency: String,
}

impl Money {
    pub fn usd(amount: f64) -> Self {
        Self {
            amount,
            currency: "USD".to_string(),
        }
    }
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ComparableListing {
    pub title: String,
    pub price: Money,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub shipping_cost: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PriceConfidence {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum PriceSource {
    Marketplace,
    Manual,
    /// Accepted from callers that price upstream; never produced here.
    MlModel,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceRange {
    pub low: f64,
    pub high: f64,
    pub median: f64,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PriceEstimate {
    pub suggested: f64,
    pub confidence: PriceConfidence,
    pub price_range: PriceRange,
    pub sample_size: usize,
    pub shipping_cost: f64,
    pub fees: f64,
    pub net_profit: f64,
    pub source: PriceSource,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum RouteType {
    Resell,
    InstantOffer,
    LocalPickup,
    Donate,
    RecycleParts,
    Dispose,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Minimal,
    Low,
    Medium,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DispositionRoute {
    #[serde(rename = "type")]
    pub route_type: RouteType,
    pub priority: u32,
    pub estimated_return: f64,
    pub time_to_money: String,
    pub effort: Effort,
    pub details: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct UserPreferences {
    #[serde(default)]
    pub has_resale_account: bool,
    #[serde(default)]
    pub prefer_instant_offer: bool,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MarketAnalysis {
    pub search_query: String,
    pub query_candidates: Vec<String>,
    pub comparables_found: usize,
    pub prices_used: usize,
    pub outliers_removed: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub median: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub item: Option<ItemDescription>,
    #[serde(default)]
    pub vision_response: Option<String>,
    #[serde(default)]
    pub preferences: Option<UserPreferences>,
    #[serde(default)]
    pub persist: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AnalysisResponse {
    pub analysis_id: String,
    pub enriched_description: ItemDescription,
    pub price_estimate: PriceEstimate,
    pub routes: Vec<DispositionRoute>,
    pub market_analysis: MarketAnalysis,
    pub stages: Vec<StageReport>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StageReport {
    pub name: String,
    pub elapsed_ms: u128,
    pub timestamp: DateTime<Utc>,
    pub output: Value,
}

impl StageReport {
    pub fn new(name: &str, elapsed_ms: u128, output: Value) -> Self {
        Self {
            name: name.to_string(),
            elapsed_ms,
            timestamp: Utc::now(),
            output,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_values_are_not_meaningful() {
        assert!(!is_meaningful("Unknown"));
        assert!(!is_meaningful("  unbranded "));
        assert!(!is_meaningful(""));
        assert!(is_meaningful("Nike"));
        assert_eq!(meaningful(Some(" N/A ")), None);
    }

    #[test]
    fn item_description_defaults() {
        let item: ItemDescription =
            serde_json::from_str(r#"{"category":"dresser"}"#).expect("parse");
        assert_eq!(item.brand, UNKNOWN);
        assert!(item.condition.usable_as_is);
        assert_eq!(item.condition.rating, ConditionRating::Good);
        assert_eq!(item.confidence, 5);
    }

    #[test]
    fn unrecognised_condition_rating_is_unknown() {
        let condition: Condition =
            serde_json::from_str(r#"{"rating":"Like New"}"#).expect("parse");
        assert_eq!(condition.rating, ConditionRating::Excellent);
        let condition: Condition =
            serde_json::from_str(r#"{"rating":"salvage"}"#).expect("parse");
        assert_eq!(condition.rating, ConditionRating::Unknown);
    }

    #[test]
    fn sanitized_clamps_ratings() {
        let mut item = ItemDescription::degraded();
        item.confidence = 0;
        item.condition.numeric_rating = 42;
        item.brand = "  ".into();
        let item = item.sanitized();
        assert_eq!(item.confidence, 1);
        assert_eq!(item.condition.numeric_rating, 10);
        assert_eq!(item.brand, UNKNOWN);
    }

    #[test]
    fn route_type_serializes_camel_case() {
        let json = serde_json::to_value(RouteType::InstantOffer).unwrap();
        assert_eq!(json, serde_json::json!("instantOffer"));
        let json = serde_json::to_value(RouteType::RecycleParts).unwrap();
        assert_eq!(json, serde_json::json!("recycleParts"));
    }

    #[test]
    fn upstream_model_price_source_is_accepted() {
        let source: PriceSource = serde_json::from_str(r#""mlModel""#).expect("parse");
        assert_eq!(source, PriceSource::MlModel);
        assert!(serde_json::from_str::<PriceSource>(r#""guess""#).is_err());
    }
}
