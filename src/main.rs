mod ebay;
mod enrichment;
mod http;
mod idempotency;
mod lexicon;
mod metrics;
mod models;
mod pipeline;
mod pricing;
mod routing;
mod security;
mod supabase;
mod vision;

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, State},
    http::{HeaderMap, StatusCode, header},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use enrichment::Enrichment;
use idempotency::IdempotencyCache;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use models::{
    AnalysisResponse, AnalyzeRequest, ApiError, DispositionRoute, ItemDescription, PriceEstimate,
    UserPreferences,
};
use pipeline::{Pipeline, PipelineError, PipelineErrorKind};
use security::{AuthContext, AuthState, require_api_auth};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(target = "hermes.api", "server failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> eyre::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let auth_state = AuthState::from_env();
    let pipeline = Pipeline::from_env()?;
    let prometheus_handle = PrometheusBuilder::new().install_recorder()?;
    let state = AppState {
        pipeline,
        idempotency: IdempotencyCache::from_env(),
        prometheus_handle,
    };

    let cors = CorsLayer::new()
        .allow_headers(Any)
        .allow_methods(Any)
        .allow_origin(Any);

    let protected = Router::new()
        .route("/analyses", post(create_analysis))
        .nest(
            "/stages",
            Router::new()
                .route("/enrich", post(stage_enrich))
                .route("/price", post(stage_price))
                .route("/routes", post(stage_routes)),
        )
        .route_layer(middleware::from_fn_with_state(auth_state, require_api_auth));

    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .merge(protected)
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(DefaultBodyLimit::max(body_limit_from_env())),
        );

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(8000);
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    info!(target = "hermes.api", "listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

#[derive(Clone)]
struct AppState {
    pipeline: Pipeline,
    idempotency: IdempotencyCache,
    prometheus_handle: PrometheusHandle,
}

/// - Method: `GET`
/// - Path: `/health`
/// - Auth: none
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "hermes-appraisal-rs",
    }))
}

fn body_limit_from_env() -> usize {
    std::env::var("REQUEST_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(256 * 1024)
}

async fn metrics_endpoint(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Ok(secret) = std::env::var("METRICS_KEY") {
        let presented = headers
            .get("X-Metrics-Key")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if presented != secret {
            return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
        }
    }
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.prometheus_handle.render(),
    )
        .into_response()
}

/// Analyse one item: enrichment, pricing and disposition routes.
///
/// - Method: `POST`
/// - Path: `/analyses`
/// - Auth: `Authorization: Bearer <key>` or `X-Hermes-Key: <key>`
/// - Body: `AnalyzeRequest` with exactly one of `item` / `vision_response`
/// - Response: `AnalysisResponse` with the per-stage transcript
///
/// A repeated `Idempotency-Key` replays the stored response without re-running (or
/// re-persisting) the analysis.
async fn create_analysis(
    State(state): State<AppState>,
    Extension(context): Extension<AuthContext>,
    headers: HeaderMap,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisResponse>, AppError> {
    crate::metrics::inc_requests("/analyses");
    info!(
        target = "hermes.api",
        org_id = %context.org_id,
        api_key = %context.api_key_id,
        persist = payload.persist,
        "analysis requested",
    );

    let idempotency_key = headers
        .get("Idempotency-Key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .map(|key| idempotency::scoped_key(&context.org_id, &key));

    if let Some(key) = &idempotency_key
        && let Some(existing) = state.idempotency.get(key).await
    {
        record_completion(&existing, true);
        return Ok(Json(existing));
    }

    let response = state.pipeline.run(payload, Some(context)).await?;
    if let Some(key) = &idempotency_key {
        state.idempotency.put(key, &response).await;
    }
    record_completion(&response, false);
    Ok(Json(response))
}

fn record_completion(response: &AnalysisResponse, replayed: bool) {
    let top_route = response
        .routes
        .first()
        .and_then(|route| serde_json::to_value(route.route_type).ok())
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default();
    let source = serde_json::to_value(response.price_estimate.source)
        .ok()
        .and_then(|value| value.as_str().map(str::to_string))
        .unwrap_or_default();
    crate::metrics::analysis_completed(&top_route, &source, replayed);
}

#[derive(Debug, Serialize)]
struct EnrichResponse {
    enrichment: Enrichment,
    enriched_description: ItemDescription,
}

/// Enrichment only: brand, classifiers, composed category and search queries.
async fn stage_enrich(
    State(state): State<AppState>,
    Json(item): Json<ItemDescription>,
) -> Json<EnrichResponse> {
    crate::metrics::inc_requests("/stages/enrich");
    let (enrichment, enriched_description) = state.pipeline.enrich(&item);
    Json(EnrichResponse {
        enrichment,
        enriched_description,
    })
}

async fn stage_price(
    State(state): State<AppState>,
    Json(item): Json<ItemDescription>,
) -> Json<PriceEstimate> {
    crate::metrics::inc_requests("/stages/price");
    Json(state.pipeline.estimate(&item).await)
}

#[derive(Debug, Deserialize)]
struct RoutesRequest {
    item: ItemDescription,
    price_estimate: PriceEstimate,
    #[serde(default)]
    preferences: Option<UserPreferences>,
}

#[derive(Debug, Serialize)]
struct RoutesResponse {
    routes: Vec<DispositionRoute>,
}

async fn stage_routes(
    State(state): State<AppState>,
    Json(req): Json<RoutesRequest>,
) -> Json<RoutesResponse> {
    crate::metrics::inc_requests("/stages/routes");
    let preferences = req.preferences.unwrap_or_default();
    let routes = state
        .pipeline
        .routes(&req.item, &req.price_estimate, &preferences);
    Json(RoutesResponse { routes })
}

#[derive(Debug)]
enum AppError {
    Pipeline(PipelineError),
}

impl From<PipelineError> for AppError {
    fn from(value: PipelineError) -> Self {
        Self::Pipeline(value)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Pipeline(err) => {
                let status = match err.kind() {
                    PipelineErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
                    PipelineErrorKind::Configuration => StatusCode::SERVICE_UNAVAILABLE,
                    PipelineErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let payload = ApiError {
                    error: err.stage().to_string(),
                    detail: Some(err.detail().to_string()),
                };
                (status, Json(payload)).into_response()
            }
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));
    let _ = fmt().with_env_filter(filter).try_init();
}
