use super::{ComparableQuery, MarketplaceSearch, SearchError};
use crate::models::ComparableListing;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::warn;

const MAX_RETRIES: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_step: Duration,
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(8),
            max_retries: MAX_RETRIES,
            backoff_step: Duration::from_millis(250),
            jitter: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Linear: `step * attempt` plus up to `jitter`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let base = self.backoff_step * attempt;
        let jitter_ms = self.jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return base;
        }
        base + Duration::from_millis(rand::rng().random_range(0..=jitter_ms))
    }
}

/// Bounded timeout plus a small retry budget around any search collaborator.
pub struct RetryingSearch<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingSearch<S> {
    pub fn new(inner: S, mut policy: RetryPolicy) -> Self {
        policy.max_retries = policy.max_retries.min(MAX_RETRIES);
        Self { inner, policy }
    }
}

#[async_trait]
impl<S: MarketplaceSearch> MarketplaceSearch for RetryingSearch<S> {
    async fn search(&self, query: &ComparableQuery) -> Result<Vec<ComparableListing>, SearchError> {
        let mut attempt = 0;
        loop {
            let result = match timeout(self.policy.timeout, self.inner.search(query)).await {
                Ok(result) => result,
                Err(_) => Err(SearchError::Timeout(self.policy.timeout.as_millis() as u64)),
            };
            match result {
                Ok(listings) => return Ok(listings),
                Err(err) if !err.is_retryable() || attempt >= self.policy.max_retries => {
                    return Err(err);
                }
                Err(err) => {
                    attempt += 1;
                    warn!(
                        target = "hermes.pricing",
                        attempt,
                        error = %err,
                        query = %query.keywords,
                        "comparables_search_retry"
                    );
                    sleep(self.policy.backoff(attempt)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::testing::{ScriptedSearch, listings};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(200),
            max_retries: 2,
            backoff_step: Duration::from_millis(1),
            jitter: Duration::ZERO,
        }
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let inner = ScriptedSearch::new(vec![
            Err(SearchError::Request("503".into())),
            Ok(listings(&[20.0, 25.0])),
        ]);
        let search = RetryingSearch::new(inner, fast_policy());
        let found = search
            .search(&ComparableQuery::new("oak chair", 10))
            .await
            .expect("search");
        assert_eq!(found.len(), 2);
        assert_eq!(search.inner.call_count(), 2);
    }

    #[tokio::test]
    async fn gives_up_after_two_retries() {
        let inner = ScriptedSearch::new(vec![Err(SearchError::Request("down".into()))]);
        let search = RetryingSearch::new(
            inner,
            RetryPolicy {
                max_retries: 9,
                ..fast_policy()
            },
        );
        let err = search
            .search(&ComparableQuery::new("oak chair", 10))
            .await
            .expect_err("should fail");
        assert!(matches!(err, SearchError::Request(_)));
        assert_eq!(search.inner.call_count(), 3);
    }

    #[tokio::test]
    async fn missing_credentials_are_not_retried() {
        let inner = ScriptedSearch::new(vec![Err(SearchError::MissingCredentials)]);
        let search = RetryingSearch::new(inner, fast_policy());
        let err = search
            .search(&ComparableQuery::new("lamp", 10))
            .await
            .expect_err("should fail");
        assert!(matches!(err, SearchError::MissingCredentials));
        assert_eq!(search.inner.call_count(), 1);
    }

    struct StalledSearch;

    #[async_trait]
    impl MarketplaceSearch for StalledSearch {
        async fn search(&self, _: &ComparableQuery) -> Result<Vec<ComparableListing>, SearchError> {
            sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn slow_search_times_out() {
        let search = RetryingSearch::new(
            StalledSearch,
            RetryPolicy {
                timeout: Duration::from_millis(10),
                max_retries: 0,
                ..fast_policy()
            },
        );
        let err = search
            .search(&ComparableQuery::new("lamp", 10))
            .await
            .expect_err("should time out");
        assert!(matches!(err, SearchError::Timeout(10)));
    }

    #[test]
    fn backoff_is_linear() {
        let policy = fast_policy();
        assert_eq!(policy.backoff(1), Duration::from_millis(1));
        assert_eq!(policy.backoff(2), Duration::from_millis(2));
    }
}
