use rand::Rng;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument, warn};

const DEFAULT_MIN_DELAY_MS: u64 = 2_000;
const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_BASE_BACKOFF_MS: u64 = 2_000;
const DEFAULT_RATE_LIMIT_BACKOFF_MS: u64 = 30_000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_BACKOFF: Duration = Duration::from_secs(60);

const USER_AGENT: &str =
    "governance-collector/0.1 (research crawler; respects provider rate limits) reqwest/0.12";

/// Pacing and retry configuration for one named provider.
#[derive(Clone, Debug, Deserialize)]
pub struct ProviderPacing {
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
    #[serde(default = "default_rate_limit_backoff_ms")]
    pub rate_limit_backoff_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_min_delay_ms() -> u64 {
    DEFAULT_MIN_DELAY_MS
}
fn default_max_retries() -> usize {
    DEFAULT_MAX_RETRIES
}
fn default_base_backoff_ms() -> u64 {
    DEFAULT_BASE_BACKOFF_MS
}
fn default_rate_limit_backoff_ms() -> u64 {
    DEFAULT_RATE_LIMIT_BACKOFF_MS
}
fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ProviderPacing {
    fn default() -> Self {
        Self {
            min_delay_ms: DEFAULT_MIN_DELAY_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            base_backoff_ms: DEFAULT_BASE_BACKOFF_MS,
            rate_limit_backoff_ms: DEFAULT_RATE_LIMIT_BACKOFF_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("rate limited by {provider} after {attempts} attempts")]
    RateLimited { provider: String, attempts: usize },
    #[error("transient failure from {provider}: {reason}")]
    Transient { provider: String, reason: String },
    #[error("malformed response from {provider}: {reason}")]
    Malformed { provider: String, reason: String },
}

/// One HTTP client for every outbound provider call. Each provider gets a
/// minimum inter-call delay; every attempt claims the provider's next call
/// slot under the schedule lock, success or failure, so pacing holds across
/// concurrent tasks sharing one provider.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    pacing: Arc<HashMap<String, ProviderPacing>>,
    schedule: Arc<Mutex<HashMap<String, Instant>>>,
}

impl ApiClient {
    pub fn new(pacing: HashMap<String, ProviderPacing>) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            pacing: Arc::new(pacing),
            schedule: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn pacing_for(&self, provider: &str) -> ProviderPacing {
        self.pacing.get(provider).cloned().unwrap_or_default()
    }

    /// GET a JSON endpoint. Exhausted retries yield `None`, never an error;
    /// callers treat a missing result as "no data from this provider".
    #[instrument(skip(self, query), fields(provider = %provider, url = %url))]
    pub async fn get_json<T>(&self, provider: &str, url: &str, query: &[(&str, String)]) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let url = url.to_string();
        let query: Vec<(String, String)> = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let result = self
            .execute(provider, move |client| client.get(&url).query(&query))
            .await;
        match result {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(error = %e, "Provider call failed, treating as no data");
                None
            }
        }
    }

    /// POST a GraphQL query. Same failure semantics as `get_json`.
    #[instrument(skip(self, query, variables), fields(provider = %provider, url = %url))]
    pub async fn post_graphql<T>(
        &self,
        provider: &str,
        url: &str,
        query: &str,
        variables: serde_json::Value,
    ) -> Option<T>
    where
        T: DeserializeOwned,
    {
        let url = url.to_string();
        let body = serde_json::json!({ "query": query, "variables": variables });
        let result = self
            .execute(provider, move |client| client.post(&url).json(&body))
            .await;
        match result {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!(error = %e, "Provider call failed, treating as no data");
                None
            }
        }
    }

    async fn execute<T, F>(&self, provider: &str, build: F) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> reqwest::RequestBuilder,
    {
        let cfg = self.pacing_for(provider);
        let timeout = Duration::from_secs(cfg.timeout_secs);
        let mut last_reason = String::new();

        for attempt in 0..=cfg.max_retries {
            self.pace(provider, &cfg).await;

            let response = build(&self.client).timeout(timeout).send().await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        if attempt == cfg.max_retries {
                            return Err(FetchError::RateLimited {
                                provider: provider.to_string(),
                                attempts: attempt + 1,
                            });
                        }
                        let wait = Self::rate_limit_wait(attempt, &cfg);
                        warn!(provider, attempt, wait = ?wait, "Rate limited, backing off");
                        sleep(wait).await;
                        continue;
                    }
                    if !status.is_success() {
                        last_reason = format!("HTTP {status}");
                        warn!(provider, attempt, status = %status, "Request failed");
                        if attempt < cfg.max_retries {
                            sleep(Self::backoff(attempt, &cfg)).await;
                        }
                        continue;
                    }
                    let text = match response.text().await {
                        Ok(text) => text,
                        Err(e) => {
                            last_reason = e.to_string();
                            if attempt < cfg.max_retries {
                                sleep(Self::backoff(attempt, &cfg)).await;
                            }
                            continue;
                        }
                    };
                    match serde_json::from_str(&text) {
                        Ok(parsed) => {
                            debug!(provider, attempt, "Request successful");
                            return Ok(parsed);
                        }
                        Err(e) => {
                            // Shape drift is retried like any transient error.
                            last_reason = format!("JSON parse failure: {e}");
                            warn!(provider, attempt, error = %e, "Malformed response");
                            if attempt == cfg.max_retries {
                                return Err(FetchError::Malformed {
                                    provider: provider.to_string(),
                                    reason: last_reason,
                                });
                            }
                            sleep(Self::backoff(attempt, &cfg)).await;
                        }
                    }
                }
                Err(e) => {
                    last_reason = e.to_string();
                    warn!(provider, attempt, error = %e, "Transport error");
                    if attempt < cfg.max_retries {
                        sleep(Self::backoff(attempt, &cfg)).await;
                    }
                }
            }
        }

        Err(FetchError::Transient {
            provider: provider.to_string(),
            reason: last_reason,
        })
    }

    /// 429 waits grow linearly with the attempt number.
    fn rate_limit_wait(attempt: usize, cfg: &ProviderPacing) -> Duration {
        Duration::from_millis((attempt as u64 + 1) * cfg.rate_limit_backoff_ms)
    }

    fn backoff(attempt: usize, cfg: &ProviderPacing) -> Duration {
        let backoff = Duration::from_millis(cfg.base_backoff_ms)
            .saturating_mul(2u32.saturating_pow(attempt as u32));
        backoff.min(MAX_BACKOFF)
    }

    /// Claims the provider's next call slot. While the schedule lock is
    /// held, the slot is computed as the previously claimed slot plus the
    /// minimum delay plus jitter (or now, when the delay has already
    /// elapsed) and stored back, so concurrent callers to one provider
    /// queue distinct slots instead of sleeping in lockstep. The sleep
    /// happens after the lock is released.
    pub(crate) async fn pace(&self, provider: &str, cfg: &ProviderPacing) {
        let min_delay = Duration::from_millis(cfg.min_delay_ms);
        let now = Instant::now();
        let slot = {
            let mut schedule = self.schedule.lock().unwrap();
            let slot = match schedule.get(provider) {
                Some(previous) if *previous + min_delay > now => {
                    let jitter = Duration::from_millis(rand::rng().random_range(500..2_000));
                    *previous + min_delay + jitter
                }
                _ => now,
            };
            schedule.insert(provider.to_string(), slot);
            slot
        };

        if slot > now {
            debug!(provider, wait = ?(slot - now), "Pacing provider call");
            tokio::time::sleep_until(slot).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_pacing(max_retries: usize) -> HashMap<String, ProviderPacing> {
        let mut pacing = HashMap::new();
        pacing.insert(
            "test".to_string(),
            ProviderPacing {
                min_delay_ms: 0,
                max_retries,
                base_backoff_ms: 1,
                rate_limit_backoff_ms: 1,
                timeout_secs: 5,
            },
        );
        pacing
    }

    #[tokio::test(start_paused = true)]
    async fn enforces_minimum_delay_between_calls() {
        let mut pacing = HashMap::new();
        let cfg = ProviderPacing {
            min_delay_ms: 15_000,
            ..Default::default()
        };
        pacing.insert("coingecko".to_string(), cfg.clone());
        let client = ApiClient::new(pacing);

        let start = Instant::now();
        client.pace("coingecko", &cfg).await;
        client.pace("coingecko", &cfg).await;

        assert!(start.elapsed() >= Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_is_per_provider() {
        let cfg = ProviderPacing {
            min_delay_ms: 15_000,
            ..Default::default()
        };
        let client = ApiClient::new(HashMap::new());

        let start = Instant::now();
        client.pace("coingecko", &cfg).await;
        client.pace("binance", &cfg).await;

        // First call to each provider has no prior timestamp to wait on.
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_claim_distinct_slots() {
        let cfg = ProviderPacing {
            min_delay_ms: 10_000,
            ..Default::default()
        };
        let client = ApiClient::new(HashMap::new());
        client.pace("snapshot", &cfg).await;

        let start = Instant::now();
        let first = tokio::spawn({
            let client = client.clone();
            let cfg = cfg.clone();
            async move {
                client.pace("snapshot", &cfg).await;
                Instant::now()
            }
        });
        let second = tokio::spawn({
            let client = client.clone();
            let cfg = cfg.clone();
            async move {
                client.pace("snapshot", &cfg).await;
                Instant::now()
            }
        });
        let (a, b) = (first.await.unwrap(), second.await.unwrap());

        // Each caller queues a full delay behind the previous slot; neither
        // waits out the same remainder in parallel.
        let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
        assert!(earlier >= start + Duration::from_secs(10));
        assert!(later >= earlier + Duration::from_secs(10));
    }

    #[test]
    fn rate_limit_wait_scales_with_attempts() {
        let cfg = ProviderPacing {
            rate_limit_backoff_ms: 30_000,
            ..Default::default()
        };
        assert_eq!(ApiClient::rate_limit_wait(0, &cfg), Duration::from_secs(30));
        assert_eq!(ApiClient::rate_limit_wait(1, &cfg), Duration::from_secs(60));
        assert_eq!(ApiClient::rate_limit_wait(2, &cfg), Duration::from_secs(90));
    }

    #[tokio::test]
    async fn returns_parsed_body_on_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"value": 42}"#)
            .create_async()
            .await;

        #[derive(Deserialize)]
        struct Body {
            value: i64,
        }

        let client = ApiClient::new(fast_pacing(1));
        let url = format!("{}/data", server.url());
        let body: Option<Body> = client.get_json("test", &url, &[]).await;

        assert_eq!(body.map(|b| b.value), Some(42));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn exhausted_retries_yield_none() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let client = ApiClient::new(fast_pacing(2));
        let url = format!("{}/data", server.url());
        let body: Option<serde_json::Value> = client.get_json("test", &url, &[]).await;

        assert!(body.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn rate_limited_calls_are_retried_then_dropped() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data")
            .with_status(429)
            .expect(3)
            .create_async()
            .await;

        let mut pacing = fast_pacing(2);
        pacing.get_mut("test").unwrap().rate_limit_backoff_ms = 50;
        let client = ApiClient::new(pacing);
        let url = format!("{}/data", server.url());
        let started = std::time::Instant::now();
        let body: Option<serde_json::Value> = client.get_json("test", &url, &[]).await;

        assert!(body.is_none());
        // 1x then 2x the configured backoff before giving up.
        assert!(started.elapsed() >= Duration::from_millis(150));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn malformed_body_is_retried_then_dropped() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data")
            .with_status(200)
            .with_body("not json")
            .expect(2)
            .create_async()
            .await;

        let client = ApiClient::new(fast_pacing(1));
        let url = format!("{}/data", server.url());
        let body: Option<serde_json::Value> = client.get_json("test", &url, &[]).await;

        assert!(body.is_none());
        mock.assert_async().await;
    }
}
