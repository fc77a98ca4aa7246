use crate::models::ApiError;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{self, Request, StatusCode, header::HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::{collections::HashMap, convert::Infallible, env, sync::Arc, time::Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};

const DEFAULT_KEYS: &str = "demo-org:demo-key";

#[derive(Clone)]
pub struct AuthState {
    keys: Arc<HashMap<String, AuthContext>>,
    limiter: Arc<TokenBuckets>,
}

/// Caller identity attached to authenticated requests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthContext {
    pub org_id: String,
    pub api_key_id: String,
}

impl AuthState {
    pub fn from_env() -> Self {
        let raw = env::var("DEMO_API_KEYS").unwrap_or_else(|_| DEFAULT_KEYS.to_string());
        let rate_per_sec = env::var("RATE_LIMIT_PER_SEC")
            .ok()
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| *value > 0.0)
            .unwrap_or(5.0);
        let capacity = env::var("RATE_LIMIT_CAPACITY")
            .ok()
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| *value >= 1.0)
            .unwrap_or(10.0);
        Self::new(&raw, rate_per_sec, capacity)
    }

    pub fn new(raw_keys: &str, rate_per_sec: f64, capacity: f64) -> Self {
        let keys = parse_api_keys(raw_keys);
        info!(
            target = "hermes.api",
            key_count = keys.len(),
            rate_per_sec,
            capacity,
            "api_keys_loaded"
        );
        Self {
            keys: Arc::new(keys),
            limiter: Arc::new(TokenBuckets::new(rate_per_sec, capacity)),
        }
    }

    fn authenticate(&self, presented: &str) -> Option<AuthContext> {
        self.keys.get(presented).cloned()
    }
}

pub async fn require_api_auth(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, Infallible> {
    let Some(presented) = extract_api_key(request.headers()) else {
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            "missing_api_key",
            "Provide X-Hermes-Key or Bearer token",
        ));
    };

    let Some(context) = state.authenticate(&presented) else {
        return Ok(error_response(
            StatusCode::UNAUTHORIZED,
            "invalid_api_key",
            "Key not recognized",
        ));
    };

    match state.limiter.consume(&context.org_id).await {
        Ok(snapshot) => {
            request.extensions_mut().insert(context);
            let mut response = next.run(request).await;
            snapshot.apply_headers(response.headers_mut());
            Ok(response)
        }
        Err(snapshot) => {
            warn!(target = "hermes.api", org_id = %context.org_id, "rate_limited");
            let mut response =
                error_response(StatusCode::TOO_MANY_REQUESTS, "rate_limited", "Too many requests");
            snapshot.apply_headers(response.headers_mut());
            Ok(response)
        }
    }
}

fn extract_api_key(headers: &http::HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(http::header::AUTHORIZATION)
        && let Ok(raw) = value.to_str()
        && raw.len() >= 7
        && raw[..6].eq_ignore_ascii_case("bearer")
    {
        return Some(raw[6..].trim().to_string());
    }
    headers
        .get("X-Hermes-Key")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let payload = ApiError {
        error: code.to_string(),
        detail: Some(message.to_string()),
    };
    (status, Json(payload)).into_response()
}

/// `org:key` pairs, comma separated. Malformed entries are skipped; an empty result falls
/// back to the demo key.
fn parse_api_keys(raw: &str) -> HashMap<String, AuthContext> {
    let mut entries = HashMap::new();
    for (idx, token) in raw.split(',').enumerate() {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut parts = trimmed.splitn(2, ':');
        let org_id = parts.next().map(str::trim).filter(|s| !s.is_empty());
        let key = parts.next().map(str::trim).filter(|s| !s.is_empty());
        match (org_id, key) {
            (Some(org), Some(secret)) => {
                entries.insert(
                    secret.to_string(),
                    AuthContext {
                        org_id: org.to_string(),
                        api_key_id: format!("key-{:02}", idx + 1),
                    },
                );
            }
            _ => warn!(
                target = "hermes.api",
                "ignored malformed DEMO_API_KEYS entry: {trimmed}"
            ),
        }
    }

    if entries.is_empty() && raw != DEFAULT_KEYS {
        warn!(
            target = "hermes.api",
            "DEMO_API_KEYS produced no keys; falling back to demo credentials"
        );
        return parse_api_keys(DEFAULT_KEYS);
    }
    entries
}

struct TokenBuckets {
    rate_per_sec: f64,
    capacity: f64,
    buckets: Mutex<HashMap<String, BucketState>>,
}

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Bucket state reported back to the caller as rate-limit headers.
#[derive(Debug, Clone)]
struct BucketSnapshot {
    capacity: f64,
    tokens: f64,
    rate: f64,
    retry_after: Option<f64>,
}

impl TokenBuckets {
    fn new(rate_per_sec: f64, capacity: f64) -> Self {
        Self {
            rate_per_sec,
            capacity,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// `Err` carries the snapshot when the bucket is empty.
    async fn consume(&self, key: &str) -> Result<BucketSnapshot, BucketSnapshot> {
        let mut guard = self.buckets.lock().await;
        let now = Instant::now();
        let state = guard.entry(key.to_string()).or_insert_with(|| BucketState {
            tokens: self.capacity,
            last_refill: now,
        });

        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            state.tokens = (state.tokens + elapsed * self.rate_per_sec).min(self.capacity);
            state.last_refill = now;
        }

        let mut snapshot = BucketSnapshot {
            capacity: self.capacity,
            tokens: state.tokens,
            rate: self.rate_per_sec,
            retry_after: None,
        };
        if state.tokens >= 1.0 {
            state.tokens -= 1.0;
            snapshot.tokens = state.tokens;
            Ok(snapshot)
        } else {
            snapshot.retry_after = Some(((1.0 - state.tokens) / self.rate_per_sec).max(0.0));
            Err(snapshot)
        }
    }
}

impl BucketSnapshot {
    fn apply_headers(&self, headers: &mut http::HeaderMap) {
        let remaining = self.tokens.max(0.0).floor() as u64;
        let reset = ((self.capacity - self.tokens) / self.rate).ceil().max(0.0) as u64;
        insert_number(headers, "X-RateLimit-Limit", self.capacity as u64);
        insert_number(headers, "X-RateLimit-Remaining", remaining);
        insert_number(headers, "X-RateLimit-Reset", reset);
        if let Some(retry_after) = self.retry_after {
            insert_number(
                headers,
                http::header::RETRY_AFTER.as_str(),
                retry_after.ceil().max(1.0) as u64,
            );
        }
    }
}

fn insert_number(headers: &mut http::HeaderMap, name: &'static str, value: u64) {
    headers.insert(
        name,
        HeaderValue::from_str(&value.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0")),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_key_pairs_and_skips_malformed_entries() {
        let keys = parse_api_keys("acme:k1, broken, beta:k2,");
        assert_eq!(keys.len(), 2);
        assert_eq!(keys["k1"].org_id, "acme");
        assert_eq!(keys["k2"].api_key_id, "key-03");
    }

    #[test]
    fn empty_key_list_falls_back_to_demo_key() {
        let keys = parse_api_keys(" , ");
        assert_eq!(keys["demo-key"].org_id, "demo-org");
    }

    #[test]
    fn extracts_bearer_or_header_key() {
        let mut headers = http::HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("abc"));

        let mut headers = http::HeaderMap::new();
        headers.insert("X-Hermes-Key", HeaderValue::from_static(" xyz "));
        assert_eq!(extract_api_key(&headers).as_deref(), Some("xyz"));

        assert!(extract_api_key(&http::HeaderMap::new()).is_none());
    }

    #[tokio::test]
    async fn bucket_empties_then_rejects() {
        let buckets = TokenBuckets::new(0.001, 2.0);
        assert!(buckets.consume("org").await.is_ok());
        assert!(buckets.consume("org").await.is_ok());
        let rejected = buckets.consume("org").await.expect_err("should be limited");
        assert!(rejected.retry_after.is_some());
        assert!(buckets.consume("other-org").await.is_ok());
    }
}
