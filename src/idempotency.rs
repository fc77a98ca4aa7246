use crate::models::AnalysisResponse;
use redis::AsyncCommands;
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;
use tracing::warn;

const DEFAULT_TTL_SECS: u64 = 3600;

/// Replays a finished analysis for a repeated `Idempotency-Key`.
#[derive(Clone)]
pub enum IdempotencyCache {
    Redis {
        client: redis::Client,
        ttl: Duration,
    },
    Memory {
        entries: Arc<Mutex<HashMap<String, (Instant, AnalysisResponse)>>>,
        ttl: Duration,
    },
}

impl IdempotencyCache {
    /// Redis when `REDIS_URL` opens, otherwise an in-process map.
    pub fn from_env() -> Self {
        let ttl = std::env::var("IDEMPOTENCY_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_TTL_SECS));
        match std::env::var("REDIS_URL").ok().map(redis::Client::open) {
            Some(Ok(client)) => Self::Redis { client, ttl },
            Some(Err(err)) => {
                warn!(target = "hermes.api", error = %err, "redis_unavailable_using_memory");
                Self::memory(ttl)
            }
            None => Self::memory(ttl),
        }
    }

    pub fn memory(ttl: Duration) -> Self {
        Self::Memory {
            entries: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<AnalysisResponse> {
        match self {
            Self::Redis { client, .. } => redis_get(client, key).await,
            Self::Memory { entries, ttl } => {
                let mut guard = entries.lock().await;
                match guard.get(key) {
                    Some((stored, response)) if stored.elapsed() < *ttl => Some(response.clone()),
                    Some(_) => {
                        guard.remove(key);
                        None
                    }
                    None => None,
                }
            }
        }
    }

    pub async fn put(&self, key: &str, response: &AnalysisResponse) {
        match self {
            Self::Redis { client, ttl } => redis_set(client, key, response, ttl.as_secs()).await,
            Self::Memory { entries, ttl } => {
                let mut guard = entries.lock().await;
                guard.retain(|_, (stored, _)| stored.elapsed() < *ttl);
                guard.insert(key.to_string(), (Instant::now(), response.clone()));
            }
        }
    }
}

/// Keys are per organisation so two callers never share a cached analysis.
pub fn scoped_key(org_id: &str, key: &str) -> String {
    format!("hermes:analyses:{org_id}:{key}")
}

async fn redis_get(client: &redis::Client, key: &str) -> Option<AnalysisResponse> {
    let mut conn = match client.get_multiplexed_async_connection().await {
        Ok(c) => c,
        Err(err) => {
            warn!(target = "hermes.api", error = %err, "idempotency_lookup_failed");
            return None;
        }
    };
    let s: Option<String> = conn.get(key).await.ok();
    s.and_then(|v| serde_json::from_str(&v).ok())
}

async fn redis_set(client: &redis::Client, key: &str, value: &AnalysisResponse, ttl_secs: u64) {
    if let Ok(mut conn) = client.get_multiplexed_async_connection().await
        && let Ok(json) = serde_json::to_string(value)
    {
        let _: Result<(), _> = conn.set_ex(key, json, ttl_secs).await;
    }
}
