//! Rate-Limited JSON Fetching
//!
//! Two entry points over one transport:
//! - `fetch_direct` issues the request immediately
//! - `fetch_queued` waits for a [`GapScheduler`] slot first
//!
//! Both parse the body as JSON and turn an `error` field in the payload into
//! [`FetchError::Api`]. Nothing here retries; retry policy belongs to callers.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::rate_limit::GapScheduler;

pub use reqwest::Url;

/// API codes worth retrying later (throttling, maintenance, backend hiccups)
const TRANSIENT_API_CODES: &[i64] = &[0, 5, 8, 9, 14, 15, 17, 24];

/// API codes meaning the key itself is unusable
const UNAUTHORIZED_API_CODES: &[i64] = &[1, 2, 10, 13, 16, 18];

/// API codes meaning the requested entity does not exist
const UNKNOWN_ENTITY_API_CODES: &[i64] = &[6, 7];

pub type FetchResult<T> = Result<T, FetchError>;

/// Failure of a single fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network-level failure (connect, TLS, non-success status)
    #[error("Transport error: {0}")]
    Transport(String),

    /// No response within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// Well-formed response carrying an application error
    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    /// Body was not JSON
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl FetchError {
    /// Whether the same request may succeed later
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Timeout | FetchError::Malformed(_) => true,
            FetchError::Api { code, .. } => TRANSIENT_API_CODES.contains(code),
        }
    }

    /// The upstream rejected our credential
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, FetchError::Api { code, .. } if UNAUTHORIZED_API_CODES.contains(code))
    }

    /// The upstream does not know the requested entity
    pub fn is_unknown_entity(&self) -> bool {
        matches!(self, FetchError::Api { code, .. } if UNKNOWN_ENTITY_API_CODES.contains(code))
    }

    /// Upstream asked us to slow down
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, FetchError::Api { code: 5, .. })
    }

    fn from_error_payload(error: &Value) -> Self {
        match error {
            Value::Object(fields) => FetchError::Api {
                code: fields.get("code").and_then(Value::as_i64).unwrap_or(0),
                message: fields
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("unknown error")
                    .to_string(),
            },
            Value::String(message) => FetchError::Api {
                code: 0,
                message: message.clone(),
            },
            other => FetchError::Api {
                code: 0,
                message: other.to_string(),
            },
        }
    }
}

/// How a request is admitted onto the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Immediately, for one-off user actions
    Direct,
    /// Behind the shared minimum-gap scheduler, for batch work
    Queued,
}

impl fmt::Display for FetchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStrategy::Direct => f.write_str("direct"),
            FetchStrategy::Queued => f.write_str("queued"),
        }
    }
}

/// Raw GET transport
#[trait_variant::make(HttpTransport: Send)]
pub trait LocalHttpTransport {
    /// GET `url` and return the response body
    async fn get_text(&self, url: &Url) -> FetchResult<String>;
}

/// `reqwest`-backed transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("stats-annotator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl HttpTransport for ReqwestTransport {
    async fn get_text(&self, url: &Url) -> FetchResult<String> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport(format!(
                "upstream returned status {}",
                status
            )));
        }

        response.text().await.map_err(transport_error)
    }
}

// Query strings carry the API key; keep them out of error text.
fn transport_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Transport(err.without_url().to_string())
    }
}

/// Parse a response body, surfacing an embedded `error` field as a failure
pub fn parse_payload(body: &str) -> FetchResult<Value> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Some(error) = value.get("error").filter(|e| is_truthy(e)) {
        return Err(FetchError::from_error_payload(error));
    }

    Ok(value)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Fetcher shared by every caller in the process
///
/// Only requests issued through [`RateLimitedFetcher::fetch_queued`] are
/// spaced; direct requests bypass the scheduler entirely.
#[derive(Debug)]
pub struct RateLimitedFetcher<T> {
    transport: T,
    scheduler: GapScheduler,
}

impl<T> RateLimitedFetcher<T> {
    pub fn new(transport: T, gap: Duration) -> Self {
        Self {
            transport,
            scheduler: GapScheduler::new(gap),
        }
    }

    pub fn gap(&self) -> Duration {
        self.scheduler.gap()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T> RateLimitedFetcher<T>
where
    T: HttpTransport + Sync,
{
    /// Fetch immediately
    pub async fn fetch_direct(&self, url: &Url) -> FetchResult<Value> {
        let body = self.transport.get_text(url).await?;
        parse_payload(&body)
    }

    /// Fetch once the next scheduler slot comes up
    ///
    /// The slot is reserved when this is called, before the returned future
    /// is first polled, so call order is start order.
    pub fn fetch_queued<'a>(
        &'a self,
        url: &'a Url,
    ) -> impl Future<Output = FetchResult<Value>> + Send + 'a {
        let slot = self.scheduler.reserve();
        let delay = slot.saturating_duration_since(tokio::time::Instant::now());
        if !delay.is_zero() {
            tracing::debug!(delay_ms = delay.as_millis() as u64, "Queued request delayed");
        }

        async move {
            tokio::time::sleep_until(slot).await;
            self.fetch_direct(url).await
        }
    }

    /// Fetch with the given admission strategy
    pub async fn fetch(&self, strategy: FetchStrategy, url: &Url) -> FetchResult<Value> {
        match strategy {
            FetchStrategy::Direct => self.fetch_direct(url).await,
            FetchStrategy::Queued => self.fetch_queued(url).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    struct RecordingTransport {
        body: String,
        starts: Mutex<Vec<Instant>>,
    }

    impl RecordingTransport {
        fn replying(body: &str) -> Self {
            Self {
                body: body.to_string(),
                starts: Mutex::new(Vec::new()),
            }
        }

        fn starts(&self) -> Vec<Instant> {
            self.starts.lock().unwrap().clone()
        }
    }

    impl HttpTransport for RecordingTransport {
        async fn get_text(&self, _url: &Url) -> FetchResult<String> {
            self.starts.lock().unwrap().push(Instant::now());
            Ok(self.body.clone())
        }
    }

    struct FailingTransport;

    impl HttpTransport for FailingTransport {
        async fn get_text(&self, _url: &Url) -> FetchResult<String> {
            Err(FetchError::Timeout)
        }
    }

    fn test_url() -> Url {
        Url::parse("https://api.example.test/v2/user/1/personalstats?stat=timeplayed").unwrap()
    }

    #[test]
    fn test_parse_payload_ok() {
        let value = parse_payload(r#"{"personalstats":{"drugs":{"xanax":3}}}"#).unwrap();
        assert_eq!(value["personalstats"]["drugs"]["xanax"], 3);
    }

    #[test]
    fn test_parse_payload_api_error_object() {
        let err = parse_payload(r#"{"error":{"code":5,"error":"Too many requests"}}"#).unwrap_err();
        assert_eq!(
            err,
            FetchError::Api {
                code: 5,
                message: "Too many requests".to_string()
            }
        );
        assert!(err.is_transient());
        assert!(err.is_rate_limited());
    }

    #[test]
    fn test_parse_payload_api_error_string() {
        let err = parse_payload(r#"{"error":"boom"}"#).unwrap_err();
        assert!(matches!(err, FetchError::Api { code: 0, .. }));
    }

    #[test]
    fn test_parse_payload_falsy_error_is_ignored() {
        assert!(parse_payload(r#"{"error":null,"value":1}"#).is_ok());
        assert!(parse_payload(r#"{"error":false,"value":1}"#).is_ok());
        assert!(parse_payload(r#"[{"name":"xantaken","value":1}]"#).is_ok());
    }

    #[test]
    fn test_parse_payload_malformed() {
        let err = parse_payload("<html>Bad gateway</html>").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
        assert!(err.is_transient());
    }

    #[test]
    fn test_error_classification() {
        let bad_key = FetchError::Api {
            code: 2,
            message: "Incorrect key".into(),
        };
        assert!(bad_key.is_unauthorized());
        assert!(!bad_key.is_transient());

        let unknown = FetchError::Api {
            code: 6,
            message: "Incorrect ID".into(),
        };
        assert!(unknown.is_unknown_entity());
        assert!(!unknown.is_transient());

        assert!(FetchError::Transport("reset".into()).is_transient());
        assert!(FetchError::Timeout.is_transient());
    }

    #[tokio::test(start_paused = true)]
    async fn test_direct_fetches_are_not_throttled() {
        let fetcher = RateLimitedFetcher::new(
            RecordingTransport::replying("{}"),
            Duration::from_millis(600),
        );
        let url = test_url();

        let (a, b) = tokio::join!(fetcher.fetch_direct(&url), fetcher.fetch_direct(&url));
        a.unwrap();
        b.unwrap();

        let starts = fetcher.transport().starts();
        assert_eq!(starts.len(), 2);
        assert_eq!(starts[0], starts[1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_fetches_keep_minimum_gap_under_jitter() {
        let gap = Duration::from_millis(600);
        let fetcher = Arc::new(RateLimitedFetcher::new(
            RecordingTransport::replying(r#"{"ok":true}"#),
            gap,
        ));

        let mut rng = rand::rng();
        let mut arrival_ms = 0u64;
        let mut handles = Vec::new();
        for _ in 0..25 {
            arrival_ms += rng.random_range(0..300);
            let fetcher = Arc::clone(&fetcher);
            handles.push(tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(arrival_ms)).await;
                let url = test_url();
                fetcher.fetch_queued(&url).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let mut starts = fetcher.transport().starts();
        assert_eq!(starts.len(), 25);
        starts.sort();
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= gap, "gap violated: {:?}", pair[1] - pair[0]);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_slot_is_reserved_at_call_time() {
        let gap = Duration::from_millis(600);
        let fetcher = RateLimitedFetcher::new(RecordingTransport::replying("{}"), gap);
        let url = test_url();
        let begin = Instant::now();

        // Both futures are created before either is polled
        let first = fetcher.fetch_queued(&url);
        let second = fetcher.fetch_queued(&url);
        let (b, a) = tokio::join!(second, first);
        a.unwrap();
        b.unwrap();

        let mut starts = fetcher.transport().starts();
        starts.sort();
        assert_eq!(starts[0] - begin, Duration::ZERO);
        assert_eq!(starts[1] - begin, gap);
    }

    #[tokio::test]
    async fn test_transport_failure_is_not_retried() {
        let fetcher = RateLimitedFetcher::new(FailingTransport, Duration::from_millis(1));
        let err = fetcher
            .fetch(FetchStrategy::Queued, &test_url())
            .await
            .unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(FetchStrategy::Direct.to_string(), "direct");
        assert_eq!(FetchStrategy::Queued.to_string(), "queued");
    }
}
