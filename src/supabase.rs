use crate::http::build_client;
use crate::models::{DispositionRoute, ItemDescription, MarketAnalysis, PriceEstimate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

const ANALYSES_TABLE: &str = "item_analyses";

#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("unable to encode record: {0}")]
    Encode(String),
}

/// One finished analysis, as stored.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRecord {
    pub analysis_id: String,
    pub org_id: Option<String>,
    pub original_description: ItemDescription,
    pub enriched_description: ItemDescription,
    pub price_estimate: PriceEstimate,
    pub routes: Vec<DispositionRoute>,
    pub market_analysis: MarketAnalysis,
    pub created_at: DateTime<Utc>,
}

/// Persistence collaborator for finished analyses.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    async fn save(&self, record: &AnalysisRecord) -> Result<(), SupabaseError>;
}

#[derive(Debug, Clone)]
pub struct SupabaseClient {
    base_url: String,
    service_key: String,
    http: Client,
}

impl SupabaseClient {
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("SUPABASE_URL").ok()?;
        let service_key = std::env::var("SUPABASE_SERVICE_ROLE_KEY")
            .or_else(|_| std::env::var("SUPABASE_SERVICE_KEY"))
            .or_else(|_| std::env::var("SUPABASE_KEY"))
            .ok()?;
        Some(Self::new(&base_url, service_key))
    }

    pub fn new(base_url: &str, service_key: String) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
            http: build_client(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }
}

#[async_trait]
impl AnalysisStore for SupabaseClient {
    async fn save(&self, record: &AnalysisRecord) -> Result<(), SupabaseError> {
        let body =
            serde_json::to_value(record).map_err(|err| SupabaseError::Encode(err.to_string()))?;
        let response = self
            .http
            .post(self.table_url(ANALYSES_TABLE))
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await
            .map_err(|err| SupabaseError::Request(err.to_string()))?;

        if !response.status().is_success() {
            return Err(SupabaseError::Request(format!(
                "HTTP {}",
                response.status()
            )));
        }
        Ok(())
    }
}
