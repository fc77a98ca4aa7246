//! Resale pricing from marketplace comparables.

pub mod estimator;
pub mod retry;
pub mod stats;

use crate::models::ComparableListing;
use async_trait::async_trait;
use serde::Serialize;
use serde_with::skip_serializing_none;
use thiserror::Error;

pub use estimator::ComparablesPriceEstimator;
pub use retry::{RetryPolicy, RetryingSearch};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("marketplace credentials are not configured")]
    MissingCredentials,
    #[error("marketplace search timed out after {0} ms")]
    Timeout(u64),
    #[error("marketplace search request failed: {0}")]
    Request(String),
    #[error("marketplace returned an unreadable response: {0}")]
    InvalidResponse(String),
}

impl SearchError {
    pub fn is_retryable(&self) -> bool {
        !matches!(self, SearchError::MissingCredentials)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingCondition {
    New,
    Used,
}

#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparableQuery {
    pub keywords: String,
    pub condition: Option<ListingCondition>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub limit: usize,
}

impl ComparableQuery {
    pub fn new(keywords: impl Into<String>, limit: usize) -> Self {
        Self {
            keywords: keywords.into(),
            condition: None,
            min_price: None,
            max_price: None,
            limit,
        }
    }
}

/// Source of comparable listings.
#[async_trait]
pub trait MarketplaceSearch: Send + Sync {
    async fn search(&self, query: &ComparableQuery) -> Result<Vec<ComparableListing>, SearchError>;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::models::Money;
    use std::sync::Mutex;

    /// Scripted search: pops one response per call, repeating the last.
    pub struct ScriptedSearch {
        responses: Mutex<Vec<Result<Vec<ComparableListing>, SearchError>>>,
        pub calls: Mutex<Vec<ComparableQuery>>,
    }

    impl ScriptedSearch {
        pub fn new(responses: Vec<Result<Vec<ComparableListing>, SearchError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn prices(prices: &[f64]) -> Self {
            Self::new(vec![Ok(listings(prices))])
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    pub fn listings(prices: &[f64]) -> Vec<ComparableListing> {
        prices
            .iter()
            .enumerate()
            .map(|(i, price)| ComparableListing {
                title: format!("listing {i}"),
                price: Money::usd(*price),
                condition: Some("Used".into()),
                url: None,
                shipping_cost: None,
            })
            .collect()
    }

    fn clone_result(
        result: &Result<Vec<ComparableListing>, SearchError>,
    ) -> Result<Vec<ComparableListing>, SearchError> {
        match result {
            Ok(listings) => Ok(listings.clone()),
            Err(SearchError::MissingCredentials) => Err(SearchError::MissingCredentials),
            Err(SearchError::Timeout(ms)) => Err(SearchError::Timeout(*ms)),
            Err(SearchError::Request(msg)) => Err(SearchError::Request(msg.clone())),
            Err(SearchError::InvalidResponse(msg)) => {
                Err(SearchError::InvalidResponse(msg.clone()))
            }
        }
    }

    #[async_trait]
    impl MarketplaceSearch for ScriptedSearch {
        async fn search(
            &self,
            query: &ComparableQuery,
        ) -> Result<Vec<ComparableListing>, SearchError> {
            self.calls.lock().unwrap().push(query.clone());
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                responses.remove(0)
            } else {
                responses
                    .first()
                    .map(clone_result)
                    .unwrap_or_else(|| Ok(Vec::new()))
            }
        }
    }
}
