use crate::ebay::EbayBrowseClient;
use crate::enrichment::{Enricher, Enrichment};
use crate::lexicon::Lexicon;
use crate::models::{
    AnalysisResponse, AnalyzeRequest, DispositionRoute, ItemDescription, PriceEstimate,
    StageReport, UserPreferences,
};
use crate::pricing::{ComparablesPriceEstimator, MarketplaceSearch, RetryPolicy, RetryingSearch};
use crate::routing::{DispositionRouter, RouterConfig};
use crate::security::AuthContext;
use crate::supabase::{AnalysisRecord, AnalysisStore, SupabaseClient};
use chrono::Utc;
use serde_json::Value;
use std::{env, future::Future, sync::Arc, time::Instant};
use thiserror::Error;
use tokio::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct Pipeline {
    enricher: Arc<Enricher>,
    estimator: Arc<ComparablesPriceEstimator>,
    router: Arc<DispositionRouter>,
    search: Option<Arc<dyn MarketplaceSearch>>,
    store: Option<Arc<dyn AnalysisStore>>,
}

impl Pipeline {
    /// Wires collaborators from the environment. Enabling network search without eBay app
    /// credentials is a configuration error.
    pub fn from_env() -> Result<Self, PipelineError> {
        let config = PipelineConfig::from_env();
        let lexicon = Lexicon::from_env()
            .map_err(|err| PipelineError::configuration("lexicon", err.to_string()))?;
        let search = marketplace_search(&config, EbayBrowseClient::from_env())?;
        let mut pipeline = Self::new(config, Arc::new(lexicon))?;
        if let Some(search) = search {
            pipeline = pipeline.with_search(search);
        }
        if let Some(store) = SupabaseClient::from_env() {
            pipeline = pipeline.with_store(Arc::new(store));
        }
        info!(
            target = "hermes.pipeline",
            network_search = pipeline.search.is_some(),
            persistence = pipeline.store.is_some(),
            "pipeline_ready"
        );
        Ok(pipeline)
    }

    pub fn new(config: PipelineConfig, lexicon: Arc<Lexicon>) -> Result<Self, PipelineError> {
        let enricher = Enricher::new(lexicon.clone())
            .map_err(|err| PipelineError::configuration("lexicon", err.to_string()))?;
        let estimator = ComparablesPriceEstimator::new(lexicon, config.search_limit);
        let router = DispositionRouter::new(RouterConfig {
            min_value: config.min_offer_value,
            ..RouterConfig::default()
        });
        Ok(Self {
            enricher: Arc::new(enricher),
            estimator: Arc::new(estimator),
            router: Arc::new(router),
            search: None,
            store: None,
        })
    }

    pub fn with_search(mut self, search: Arc<dyn MarketplaceSearch>) -> Self {
        self.search = Some(search);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn AnalysisStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Enrichment only, no pricing.
    pub fn enrich(&self, item: &ItemDescription) -> (Enrichment, ItemDescription) {
        let item = item.clone().sanitized();
        let enrichment = self.enricher.enrich(&item);
        let enriched = self.enricher.apply(&item, &enrichment);
        (enrichment, enriched)
    }

    /// Price from comparables alone, using the item's own condition.
    pub async fn estimate(&self, item: &ItemDescription) -> PriceEstimate {
        let item = item.clone().sanitized();
        self.estimator
            .estimate(&item, self.search.as_deref(), &item.condition)
            .await
    }

    pub fn routes(
        &self,
        item: &ItemDescription,
        estimate: &PriceEstimate,
        preferences: &UserPreferences,
    ) -> Vec<DispositionRoute> {
        self.router.routes(item, estimate, preferences)
    }

    pub async fn run(
        &self,
        request: AnalyzeRequest,
        auth: Option<AuthContext>,
    ) -> Result<AnalysisResponse, PipelineError> {
        let item = stages::parse_input(&request)?;
        let preferences = request.preferences.clone().unwrap_or_default();
        let mut stages = Vec::new();

        let corpus = self
            .capture_stage("aggregate_evidence", &mut stages, async {
                stages::aggregate_evidence(&item)
            })
            .await?;
        let patterns = self
            .capture_stage("extract_patterns", &mut stages, async {
                stages::extract_patterns(&corpus)
            })
            .await?;
        let brand = self
            .capture_stage("resolve_brand", &mut stages, async {
                stages::resolve_brand(&self.enricher, &corpus, &patterns, &item.category)
            })
            .await?;
        let classes = self
            .capture_stage("classify", &mut stages, async {
                stages::classify(&self.enricher, &corpus, &item.category)
            })
            .await?;
        let (enrichment, enriched) = self
            .capture_stage("compose", &mut stages, async {
                stages::compose(&self.enricher, &item, patterns, brand, classes)
            })
            .await?;
        let (price_estimate, market_analysis) = self
            .capture_stage(
                "estimate_price",
                &mut stages,
                stages::estimate_price(
                    &self.estimator,
                    &enriched,
                    &enrichment.search_queries,
                    self.search.as_deref(),
                ),
            )
            .await?;
        let routes = self
            .capture_stage("route", &mut stages, async {
                stages::route(&self.router, &enriched, &price_estimate, &preferences)
            })
            .await?;

        let response = AnalysisResponse {
            analysis_id: analysis_id(),
            enriched_description: enriched,
            price_estimate,
            routes,
            market_analysis,
            stages,
        };

        if request.persist {
            self.persist(&item, &response, auth.as_ref()).await;
        }
        Ok(response)
    }

    /// A failed save is logged; the computed analysis stands.
    async fn persist(
        &self,
        original: &ItemDescription,
        response: &AnalysisResponse,
        auth: Option<&AuthContext>,
    ) {
        let Some(store) = &self.store else {
            warn!(
                target = "hermes.supabase",
                analysis_id = %response.analysis_id,
                "persistence requested but no store is configured"
            );
            return;
        };
        let record = AnalysisRecord {
            analysis_id: response.analysis_id.clone(),
            org_id: auth.map(|ctx| ctx.org_id.clone()),
            original_description: original.clone(),
            enriched_description: response.enriched_description.clone(),
            price_estimate: response.price_estimate.clone(),
            routes: response.routes.clone(),
            market_analysis: response.market_analysis.clone(),
            created_at: Utc::now(),
        };
        match store.save(&record).await {
            Ok(()) => info!(
                target = "hermes.supabase",
                analysis_id = %record.analysis_id,
                "analysis_saved"
            ),
            Err(err) => warn!(
                target = "hermes.supabase",
                analysis_id = %record.analysis_id,
                error = %err,
                "analysis_save_failed"
            ),
        }
    }

    async fn capture_stage<T, Fut>(
        &self,
        name: &'static str,
        stages: &mut Vec<StageReport>,
        fut: Fut,
    ) -> Result<T, PipelineError>
    where
        Fut: Future<Output = Result<StageOutcome<T>, PipelineError>>,
    {
        let started = Instant::now();
        let outcome = fut.await?;
        let elapsed_ms = started.elapsed().as_millis();
        crate::metrics::stage_elapsed(name, elapsed_ms);
        stages.push(StageReport::new(name, elapsed_ms, outcome.output));
        Ok(outcome.value)
    }
}

fn marketplace_search(
    config: &PipelineConfig,
    client: EbayBrowseClient,
) -> Result<Option<Arc<dyn MarketplaceSearch>>, PipelineError> {
    if !config.network_search {
        return Ok(None);
    }
    if !client.has_credentials() {
        return Err(PipelineError::configuration(
            "estimate_price",
            "EBAY_ENABLE_NETWORK is set but eBay app credentials are missing",
        ));
    }
    Ok(Some(Arc::new(RetryingSearch::new(client, config.retry))))
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub min_offer_value: f64,
    pub search_limit: usize,
    pub retry: RetryPolicy,
    pub network_search: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_offer_value: RouterConfig::default().min_value,
            search_limit: 50,
            retry: RetryPolicy::default(),
            network_search: false,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let min_offer_value = env::var("MIN_OFFER_VALUE")
            .ok()
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|v| v.is_finite() && *v >= 0.0)
            .unwrap_or(defaults.min_offer_value);
        let search_limit = env::var("SEARCH_LIMIT")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.search_limit);
        let timeout = env::var("SEARCH_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.retry.timeout);
        let max_retries = env::var("SEARCH_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(defaults.retry.max_retries);
        let backoff_step = env::var("SEARCH_BACKOFF_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_millis)
            .unwrap_or(defaults.retry.backoff_step);
        Self {
            min_offer_value,
            search_limit,
            retry: RetryPolicy {
                timeout,
                max_retries,
                backoff_step,
                ..defaults.retry
            },
            network_search: parse_env_bool("EBAY_ENABLE_NETWORK"),
        }
    }
}

#[derive(Debug, Error)]
#[error("stage `{stage}` failed: {message}")]
pub struct PipelineError {
    stage: &'static str,
    message: String,
    kind: PipelineErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    InvalidInput,
    Configuration,
    Internal,
}

impl PipelineError {
    pub fn invalid_input(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::InvalidInput,
        }
    }

    pub fn configuration(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::Configuration,
        }
    }

    pub fn internal(stage: &'static str, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            kind: PipelineErrorKind::Internal,
        }
    }

    pub fn stage(&self) -> &'static str {
        self.stage
    }

    pub fn kind(&self) -> PipelineErrorKind {
        self.kind
    }

    pub fn detail(&self) -> &str {
        &self.message
    }
}

#[derive(Debug)]
pub struct StageOutcome<T> {
    pub value: T,
    pub output: Value,
}

impl<T> StageOutcome<T> {
    fn new(value: T, output: Value) -> Self {
        Self { value, output }
    }
}

fn parse_env_bool(key: &str) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => false,
    }
}

fn analysis_id() -> String {
    format!("ANL-{}", Uuid::new_v4().simple())
}

pub mod stages {
    use super::{PipelineError, StageOutcome};
    use crate::enrichment::evidence::EvidenceCorpus;
    use crate::enrichment::patterns::ExtractedPatterns;
    use crate::enrichment::{Classifications, Enricher, Enrichment};
    use crate::models::{
        AnalyzeRequest, BrandCandidate, DispositionRoute, ItemDescription, MarketAnalysis,
        PriceEstimate, UserPreferences,
    };
    use crate::pricing::{ComparablesPriceEstimator, MarketplaceSearch};
    use crate::routing::DispositionRouter;
    use crate::vision;
    use serde_json::json;

    /// Exactly one of `item` or `vision_response`.
    pub fn parse_input(request: &AnalyzeRequest) -> Result<ItemDescription, PipelineError> {
        match (&request.item, &request.vision_response) {
            (Some(item), None) => Ok(item.clone().sanitized()),
            (None, Some(raw)) if !raw.trim().is_empty() => Ok(vision::parse_description(raw)),
            (Some(_), Some(_)) => Err(PipelineError::invalid_input(
                "input",
                "provide either item or vision_response, not both",
            )),
            _ => Err(PipelineError::invalid_input(
                "input",
                "an item description or vision_response is required",
            )),
        }
    }

    pub fn aggregate_evidence(
        item: &ItemDescription,
    ) -> Result<StageOutcome<EvidenceCorpus>, PipelineError> {
        let corpus = EvidenceCorpus::from_item(item);
        let output = json!({
            "characters": corpus.text().len(),
            "tokens": corpus.tokens().count(),
            "empty": corpus.is_empty(),
        });
        Ok(StageOutcome::new(corpus, output))
    }

    pub fn extract_patterns(
        corpus: &EvidenceCorpus,
    ) -> Result<StageOutcome<ExtractedPatterns>, PipelineError> {
        let patterns = ExtractedPatterns::extract(corpus);
        let output = json!(patterns);
        Ok(StageOutcome::new(patterns, output))
    }

    pub fn resolve_brand(
        enricher: &Enricher,
        corpus: &EvidenceCorpus,
        patterns: &ExtractedPatterns,
        category: &str,
    ) -> Result<StageOutcome<Option<BrandCandidate>>, PipelineError> {
        let brand = enricher.resolve_brand(corpus, patterns, category);
        let output = match &brand {
            Some(candidate) => json!(candidate),
            None => json!({ "brand": null }),
        };
        Ok(StageOutcome::new(brand, output))
    }

    pub fn classify(
        enricher: &Enricher,
        corpus: &EvidenceCorpus,
        category: &str,
    ) -> Result<StageOutcome<Classifications>, PipelineError> {
        let classes = enricher.classify(corpus, category);
        let output = json!(classes);
        Ok(StageOutcome::new(classes, output))
    }

    pub fn compose(
        enricher: &Enricher,
        item: &ItemDescription,
        patterns: ExtractedPatterns,
        brand: Option<BrandCandidate>,
        classes: Classifications,
    ) -> Result<StageOutcome<(Enrichment, ItemDescription)>, PipelineError> {
        let enrichment = enricher.compose(item, patterns, brand, classes);
        let enriched = enricher.apply(item, &enrichment);
        let output = json!({
            "category": enriched.category,
            "originalCategory": enriched.original_category,
            "brand": enriched.brand,
            "searchQueries": enrichment.search_queries,
        });
        Ok(StageOutcome::new((enrichment, enriched), output))
    }

    pub async fn estimate_price(
        estimator: &ComparablesPriceEstimator,
        item: &ItemDescription,
        queries: &[String],
        search: Option<&dyn MarketplaceSearch>,
    ) -> Result<StageOutcome<(PriceEstimate, MarketAnalysis)>, PipelineError> {
        let (estimate, analysis) = estimator.appraise(item, queries, search).await;
        if !estimate.suggested.is_finite() {
            return Err(PipelineError::internal(
                "estimate_price",
                "price estimate is not a finite number",
            ));
        }
        let output = json!({
            "suggested": estimate.suggested,
            "confidence": estimate.confidence,
            "source": estimate.source,
            "searchQuery": analysis.search_query,
            "comparablesFound": analysis.comparables_found,
        });
        Ok(StageOutcome::new((estimate, analysis), output))
    }

    pub fn route(
        router: &DispositionRouter,
        item: &ItemDescription,
        estimate: &PriceEstimate,
        preferences: &UserPreferences,
    ) -> Result<StageOutcome<Vec<DispositionRoute>>, PipelineError> {
        let routes = router.routes(item, estimate, preferences);
        if routes.is_empty() {
            return Err(PipelineError::internal("route", "no disposition route produced"));
        }
        let output = json!({
            "routes": routes.iter().map(|r| r.route_type).collect::<Vec<_>>(),
            "top": routes.first().map(|r| r.route_type),
        });
        Ok(StageOutcome::new(routes, output))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Condition, ConditionRating, Identifiers, PriceSource, RouteType};
    use crate::pricing::testing::ScriptedSearch;
    use crate::supabase::SupabaseError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingStore {
        saved: Mutex<Vec<AnalysisRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl AnalysisStore for RecordingStore {
        async fn save(&self, record: &AnalysisRecord) -> Result<(), SupabaseError> {
            self.saved.lock().unwrap().push(record.clone());
            if self.fail {
                return Err(SupabaseError::Request("HTTP 503".into()));
            }
            Ok(())
        }
    }

    fn pipeline() -> Pipeline {
        Pipeline::new(PipelineConfig::default(), Arc::new(Lexicon::default())).expect("pipeline")
    }

    fn chair() -> ItemDescription {
        ItemDescription {
            category: "Chair".into(),
            brand: "IKEA".into(),
            condition: Condition {
                rating: ConditionRating::Good,
                ..Condition::default()
            },
            identifiers: Identifiers {
                visible_text: Some("IKEA".into()),
                ..Identifiers::default()
            },
            ..ItemDescription::degraded()
        }
    }

    fn request(item: ItemDescription) -> AnalyzeRequest {
        AnalyzeRequest {
            item: Some(item),
            vision_response: None,
            preferences: None,
            persist: false,
        }
    }

    fn auth() -> AuthContext {
        AuthContext {
            org_id: "acme".into(),
            api_key_id: "key-01".into(),
        }
    }

    #[tokio::test]
    async fn run_records_every_stage_in_order() {
        let response = pipeline().run(request(chair()), None).await.expect("run");
        let names: Vec<&str> = response.stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "aggregate_evidence",
                "extract_patterns",
                "resolve_brand",
                "classify",
                "compose",
                "estimate_price",
                "route",
            ]
        );
        assert!(response.analysis_id.starts_with("ANL-"));
        assert!(!response.routes.is_empty());
    }

    #[tokio::test]
    async fn without_search_prices_manually() {
        let response = pipeline().run(request(chair()), None).await.expect("run");
        assert_eq!(response.price_estimate.source, PriceSource::Manual);
        assert_eq!(response.market_analysis.comparables_found, 0);
    }

    #[tokio::test]
    async fn comparables_drive_the_estimate() {
        let search = Arc::new(ScriptedSearch::prices(&[10.0, 11.0, 12.0, 100.0]));
        let pipeline = pipeline().with_search(search.clone());
        let response = pipeline.run(request(chair()), None).await.expect("run");
        assert_eq!(response.price_estimate.source, PriceSource::Marketplace);
        assert_eq!(response.market_analysis.outliers_removed, 1);
        assert_eq!(search.call_count(), 1);
    }

    #[tokio::test]
    async fn vision_response_is_parsed() {
        let raw = "```json\n{\"category\": \"Lamp\", \"brand\": \"Unknown\", \"condition\": {\"rating\": \"good\"}}\n```";
        let response = pipeline()
            .run(
                AnalyzeRequest {
                    item: None,
                    vision_response: Some(raw.into()),
                    preferences: None,
                    persist: false,
                },
                None,
            )
            .await
            .expect("run");
        assert!(response.enriched_description.category.contains("Lamp"));
    }

    #[tokio::test]
    async fn unreadable_vision_response_degrades() {
        let response = pipeline()
            .run(
                AnalyzeRequest {
                    item: None,
                    vision_response: Some("sorry, I cannot see the image".into()),
                    preferences: None,
                    persist: false,
                },
                None,
            )
            .await
            .expect("run");
        assert_eq!(response.enriched_description.brand, "Unknown");
        assert_eq!(response.enriched_description.confidence, 1);
    }

    #[tokio::test]
    async fn input_must_be_exactly_one_source() {
        let neither = AnalyzeRequest {
            item: None,
            vision_response: None,
            preferences: None,
            persist: false,
        };
        let err = pipeline().run(neither, None).await.expect_err("missing input");
        assert_eq!(err.kind(), PipelineErrorKind::InvalidInput);
        assert_eq!(err.stage(), "input");

        let both = AnalyzeRequest {
            vision_response: Some("{}".into()),
            ..request(chair())
        };
        let err = pipeline().run(both, None).await.expect_err("both inputs");
        assert_eq!(err.kind(), PipelineErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn persists_once_when_requested() {
        let store = Arc::new(RecordingStore::default());
        let pipeline = pipeline().with_store(store.clone());

        pipeline.run(request(chair()), Some(auth())).await.expect("run");
        assert!(store.saved.lock().unwrap().is_empty());

        let response = pipeline
            .run(
                AnalyzeRequest {
                    persist: true,
                    ..request(chair())
                },
                Some(auth()),
            )
            .await
            .expect("run");
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].analysis_id, response.analysis_id);
        assert_eq!(saved[0].org_id.as_deref(), Some("acme"));
        assert_eq!(saved[0].original_description.category, "Chair");
    }

    #[tokio::test]
    async fn failed_save_keeps_the_result() {
        let store = Arc::new(RecordingStore {
            fail: true,
            ..RecordingStore::default()
        });
        let pipeline = pipeline().with_store(store.clone());
        let response = pipeline
            .run(
                AnalyzeRequest {
                    persist: true,
                    ..request(chair())
                },
                None,
            )
            .await
            .expect("run");
        assert!(!response.routes.is_empty());
        assert_eq!(store.saved.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn preferences_reach_the_router() {
        let search = Arc::new(ScriptedSearch::prices(&[200.0, 210.0, 220.0]));
        let pipeline = pipeline().with_search(search);
        let response = pipeline
            .run(
                AnalyzeRequest {
                    preferences: Some(UserPreferences {
                        has_resale_account: true,
                        prefer_instant_offer: false,
                    }),
                    ..request(chair())
                },
                None,
            )
            .await
            .expect("run");
        assert_eq!(response.routes[0].route_type, RouteType::Resell);
    }

    #[test]
    fn network_search_without_credentials_is_a_configuration_error() {
        let client = EbayBrowseClient::new(
            "http://127.0.0.1:9",
            "EBAY_US",
            crate::ebay::auth::AppCredentials {
                app_id: String::new(),
                app_secret: String::new(),
            },
        );
        let config = PipelineConfig {
            network_search: true,
            ..PipelineConfig::default()
        };
        let err = marketplace_search(&config, client).err().expect("config error");
        assert_eq!(err.kind(), PipelineErrorKind::Configuration);
    }

    #[test]
    fn network_search_disabled_means_no_collaborator() {
        let client = EbayBrowseClient::new(
            "http://127.0.0.1:9",
            "EBAY_US",
            crate::ebay::auth::AppCredentials {
                app_id: "app".into(),
                app_secret: "secret".into(),
            },
        );
        let search = marketplace_search(&PipelineConfig::default(), client).expect("ok");
        assert!(search.is_none());
    }

    #[tokio::test]
    async fn standalone_estimate_uses_the_item_condition() {
        let search = Arc::new(ScriptedSearch::prices(&[100.0, 100.0, 100.0]));
        let pipeline = pipeline().with_search(search);
        let estimate = pipeline.estimate(&chair()).await;
        assert_eq!(estimate.source, PriceSource::Marketplace);
        assert_eq!(estimate.suggested, 85.0);
    }

    #[test]
    fn stage_enrich_fills_the_category() {
        let (enrichment, enriched) = pipeline().enrich(&chair());
        assert_eq!(enriched.brand, "IKEA");
        assert!(!enrichment.search_queries.is_empty());
    }
}
