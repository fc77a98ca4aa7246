use crate::ebay::auth::{AppCredentials, AppToken, EbayAuthError, get_app_access_token};
use crate::ebay::config::{APP_ID, APP_SCOPES, APP_SECRET, MARKETPLACE_ID, ROOT, browse_search_url};
use crate::http::build_client;
use crate::models::{ComparableListing, Money};
use crate::pricing::{ComparableQuery, ListingCondition, MarketplaceSearch, SearchError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

const MAX_PAGE_SIZE: usize = 200;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    item_summaries: Vec<ItemSummary>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemSummary {
    #[serde(default)]
    title: String,
    #[serde(default)]
    price: Option<Amount>,
    #[serde(default)]
    condition: Option<String>,
    #[serde(default)]
    item_web_url: Option<String>,
    #[serde(default)]
    shipping_options: Vec<ShippingOption>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShippingOption {
    #[serde(default)]
    shipping_cost: Option<Amount>,
}

/// eBay sends amounts as decimal strings.
#[derive(Debug, Deserialize)]
struct Amount {
    value: String,
    #[serde(default)]
    currency: Option<String>,
}

impl Amount {
    fn parse(&self) -> Option<f64> {
        self.value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

/// Comparable listings from the eBay Browse API.
pub struct EbayBrowseClient {
    client: Client,
    root: String,
    marketplace: String,
    credentials: AppCredentials,
    token: Mutex<Option<AppToken>>,
}

impl EbayBrowseClient {
    pub fn new(root: impl Into<String>, marketplace: impl Into<String>, credentials: AppCredentials) -> Self {
        Self {
            client: build_client(),
            root: root.into(),
            marketplace: marketplace.into(),
            credentials,
            token: Mutex::new(None),
        }
    }

    pub fn from_env() -> Self {
        Self::new(
            ROOT.as_str(),
            MARKETPLACE_ID.as_str(),
            AppCredentials {
                app_id: APP_ID.clone(),
                app_secret: APP_SECRET.clone(),
            },
        )
    }

    pub fn has_credentials(&self) -> bool {
        self.credentials.is_complete()
    }

    async fn access_token(&self) -> Result<String, SearchError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| t.is_fresh()) {
            return Ok(token.access_token.clone());
        }
        let token = get_app_access_token(&self.client, &self.root, &self.credentials, APP_SCOPES)
            .await
            .map_err(|err| match err {
                EbayAuthError::MissingCredentials => SearchError::MissingCredentials,
                EbayAuthError::Request(message) => SearchError::Request(message),
            })?;
        debug!(target = "hermes.ebay", "app_token_refreshed");
        let access = token.access_token.clone();
        *cached = Some(token);
        Ok(access)
    }
}

#[async_trait]
impl MarketplaceSearch for EbayBrowseClient {
    async fn search(&self, query: &ComparableQuery) -> Result<Vec<ComparableListing>, SearchError> {
        if !self.has_credentials() {
            return Err(SearchError::MissingCredentials);
        }
        let token = self.access_token().await?;
        let limit = query.limit.clamp(1, MAX_PAGE_SIZE).to_string();
        let mut params = vec![("q", query.keywords.clone()), ("limit", limit)];
        if let Some(filter) = build_filter(query) {
            params.push(("filter", filter));
        }

        let response = self
            .client
            .get(browse_search_url(&self.root))
            .query(&params)
            .bearer_auth(token)
            .header("X-EBAY-C-MARKETPLACE-ID", self.marketplace.as_str())
            .send()
            .await
            .map_err(|err| SearchError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Request(format!("HTTP {}", response.status())));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|err| SearchError::InvalidResponse(err.to_string()))?;
        let listings = listings_from_response(payload);
        debug!(
            target = "hermes.ebay",
            query = %query.keywords,
            count = listings.len(),
            "browse_search_complete"
        );
        Ok(listings)
    }
}

/// `conditions:{USED}`, `price:[a..b]` and `priceCurrency:USD`, comma-joined.
fn build_filter(query: &ComparableQuery) -> Option<String> {
    let mut parts = Vec::new();
    if let Some(condition) = query.condition {
        let label = match condition {
            ListingCondition::New => "NEW",
            ListingCondition::Used => "USED",
        };
        parts.push(format!("conditions:{{{label}}}"));
    }
    if query.min_price.is_some() || query.max_price.is_some() {
        let min = query.min_price.map(|v| format!("{v:.2}")).unwrap_or_default();
        let max = query.max_price.map(|v| format!("{v:.2}")).unwrap_or_default();
        parts.push(format!("price:[{min}..{max}]"));
        parts.push("priceCurrency:USD".to_string());
    }
    (!parts.is_empty()).then(|| parts.join(","))
}

/// Summaries without a readable price are skipped.
fn listings_from_response(payload: SearchResponse) -> Vec<ComparableListing> {
    payload
        .item_summaries
        .into_iter()
        .filter_map(|summary| {
            let price = summary.price.as_ref()?;
            let amount = price.parse()?;
            let shipping_cost = summary
                .shipping_options
                .first()
                .and_then(|option| option.shipping_cost.as_ref())
                .and_then(Amount::parse);
            Some(ComparableListing {
                title: summary.title,
                price: Money {
                    amount,
                    currency: price.currency.clone().unwrap_or_else(|| "USD".to_string()),
                },
                condition: summary.condition,
                url: summary.item_web_url,
                shipping_cost,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_includes_condition_and_price_band() {
        let query = ComparableQuery {
            condition: Some(ListingCondition::Used),
            min_price: Some(10.0),
            max_price: Some(250.0),
            ..ComparableQuery::new("walnut dresser", 50)
        };
        assert_eq!(
            build_filter(&query).as_deref(),
            Some("conditions:{USED},price:[10.00..250.00],priceCurrency:USD")
        );
        assert_eq!(build_filter(&ComparableQuery::new("lamp", 10)), None);
    }

    #[test]
    fn parses_item_summaries() {
        let payload: SearchResponse = serde_json::from_value(serde_json::json!({
            "total": 3,
            "itemSummaries": [
                {
                    "title": "Walnut dresser",
                    "price": {"value": "240.00", "currency": "USD"},
                    "condition": "Used",
                    "itemWebUrl": "https://www.ebay.com/itm/1",
                    "shippingOptions": [{"shippingCost": {"value": "35.50", "currency": "USD"}}]
                },
                {"title": "No price"},
                {"title": "Bad price", "price": {"value": "call"}}
            ]
        }))
        .expect("payload");
        let listings = listings_from_response(payload);
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].price.amount, 240.0);
        assert_eq!(listings[0].shipping_cost, Some(35.5));
        assert_eq!(listings[0].url.as_deref(), Some("https://www.ebay.com/itm/1"));
    }

    #[tokio::test]
    async fn missing_credentials_fail_without_network() {
        let client = EbayBrowseClient::new(
            "http://127.0.0.1:9",
            "EBAY_US",
            AppCredentials {
                app_id: String::new(),
                app_secret: String::new(),
            },
        );
        let err = client
            .search(&ComparableQuery::new("lamp", 5))
            .await
            .expect_err("should fail");
        assert!(matches!(err, SearchError::MissingCredentials));
    }
}
