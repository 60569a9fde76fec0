//! Statistics API Adapter
//!
//! `GET {base}/user/{id}/personalstats?stat=a,b&timestamp=t&key=k`
//!
//! The response wraps the statistics in a `personalstats` member, either as
//! nested objects or as `{name, value}` records; the wrapper is stripped here
//! and the shape is left to extraction.

use std::sync::Arc;

use kernel::id::EntityId;
use platform::http::{FetchError, FetchStrategy, HttpTransport, RateLimitedFetcher, Url};
use serde_json::Value;

use crate::domain::repository::{CredentialProvider, StatsApi};
use crate::domain::value_objects::StatField;
use crate::error::{StatsError, StatsResult};

pub const DEFAULT_BASE_URL: &str = "https://api.torn.com/v2";

pub struct TornStatsApi<T, C> {
    fetcher: Arc<RateLimitedFetcher<T>>,
    credential: C,
    base_url: String,
}

impl<T, C> TornStatsApi<T, C>
where
    C: CredentialProvider,
{
    pub fn new(
        fetcher: Arc<RateLimitedFetcher<T>>,
        credential: C,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            credential,
            base_url: base_url.into(),
        }
    }

    pub fn fetcher(&self) -> &RateLimitedFetcher<T> {
        &self.fetcher
    }

    pub fn has_credential(&self) -> bool {
        self.credential.api_key().is_some()
    }

    fn build_url(
        &self,
        entity_id: EntityId,
        fields: &[StatField],
        at: Option<i64>,
    ) -> StatsResult<Url> {
        let key = self.credential.api_key().ok_or(StatsError::MissingCredential)?;

        let base = self.base_url.trim_end_matches('/');
        let mut url = Url::parse(&format!("{base}/user/{entity_id}/personalstats"))
            .map_err(|e| StatsError::Internal(format!("invalid API base URL: {e}")))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("stat", &StatField::query_list(fields));
            if let Some(ts) = at {
                query.append_pair("timestamp", &ts.to_string());
            }
            query.append_pair("key", key.expose());
        }

        Ok(url)
    }
}

impl<T, C> StatsApi for TornStatsApi<T, C>
where
    T: HttpTransport + Sync,
    C: CredentialProvider,
{
    async fn personal_stats(
        &self,
        entity_id: EntityId,
        fields: &[StatField],
        at: Option<i64>,
        strategy: FetchStrategy,
    ) -> StatsResult<Value> {
        let url = self.build_url(entity_id, fields, at)?;

        tracing::debug!(
            entity_id = %entity_id,
            stats = %StatField::query_list(fields),
            timestamp = ?at,
            %strategy,
            "Fetching personal stats"
        );

        let mut body = self.fetcher.fetch(strategy, &url).await?;
        match body.get_mut("personalstats").map(Value::take) {
            Some(stats) if !stats.is_null() => Ok(stats),
            _ => Err(FetchError::Malformed("missing personalstats".to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::ApiKey;
    use crate::infra::credential::StaticCredential;
    use platform::http::FetchResult;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    struct CannedTransport {
        body: String,
        urls: Mutex<Vec<Url>>,
    }

    impl CannedTransport {
        fn new(body: Value) -> Self {
            Self {
                body: body.to_string(),
                urls: Mutex::new(Vec::new()),
            }
        }

        fn urls(&self) -> Vec<Url> {
            self.urls.lock().unwrap().clone()
        }
    }

    impl HttpTransport for CannedTransport {
        async fn get_text(&self, url: &Url) -> FetchResult<String> {
            self.urls.lock().unwrap().push(url.clone());
            Ok(self.body.clone())
        }
    }

    fn api(body: Value, key: Option<&str>) -> TornStatsApi<CannedTransport, StaticCredential> {
        let fetcher = Arc::new(RateLimitedFetcher::new(
            CannedTransport::new(body),
            Duration::from_millis(600),
        ));
        let credential = StaticCredential::new(key.and_then(ApiKey::new));
        TornStatsApi::new(fetcher, credential, "https://api.example.test/v2/")
    }

    fn id(raw: u64) -> EntityId {
        EntityId::new(raw).unwrap()
    }

    #[tokio::test]
    async fn test_builds_query_with_timestamp() {
        let api = api(json!({"personalstats": {}}), Some("secret"));
        api.personal_stats(id(42), &StatField::DELTA, Some(1_700_000_000), FetchStrategy::Direct)
            .await
            .unwrap();

        let urls = api.fetcher().transport().urls();
        assert_eq!(urls.len(), 1);
        let url = &urls[0];
        assert_eq!(url.path(), "/v2/user/42/personalstats");

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("stat".to_string(), "timeplayed,xantaken".to_string()),
                ("timestamp".to_string(), "1700000000".to_string()),
                ("key".to_string(), "secret".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_omits_timestamp_for_current_snapshot() {
        let api = api(json!({"personalstats": {}}), Some("secret"));
        api.personal_stats(id(7), &StatField::ALL, None, FetchStrategy::Direct)
            .await
            .unwrap();

        let url = &api.fetcher().transport().urls()[0];
        assert!(url.query_pairs().all(|(k, _)| k != "timestamp"));
        assert!(url
            .query_pairs()
            .any(|(k, v)| k == "stat" && v == "timeplayed,xantaken,activestreak"));
    }

    #[tokio::test]
    async fn test_missing_credential_sends_nothing() {
        let api = api(json!({"personalstats": {}}), None);
        let err = api
            .personal_stats(id(1), &StatField::ALL, None, FetchStrategy::Queued)
            .await
            .unwrap_err();

        assert!(matches!(err, StatsError::MissingCredential));
        assert!(api.fetcher().transport().urls().is_empty());
        assert!(!api.has_credential());
    }

    #[tokio::test]
    async fn test_unwraps_personalstats_member() {
        let api = api(
            json!({"personalstats": [{"name": "xantaken", "value": 12}]}),
            Some("k"),
        );
        let payload = api
            .personal_stats(id(1), &[StatField::XanTaken], None, FetchStrategy::Direct)
            .await
            .unwrap();

        assert_eq!(StatField::XanTaken.extract(&payload), 12);
    }

    #[tokio::test]
    async fn test_missing_or_null_wrapper_is_malformed() {
        for body in [json!({"something": 1}), json!({"personalstats": null})] {
            let api = api(body, Some("k"));
            let err = api
                .personal_stats(id(1), &StatField::ALL, None, FetchStrategy::Direct)
                .await
                .unwrap_err();
            assert!(matches!(err, StatsError::Fetch(FetchError::Malformed(_))));
        }
    }

    #[tokio::test]
    async fn test_api_error_propagates() {
        let api = api(json!({"error": {"code": 2, "error": "Incorrect key"}}), Some("k"));
        let err = api
            .personal_stats(id(1), &StatField::ALL, None, FetchStrategy::Direct)
            .await
            .unwrap_err();

        match err {
            StatsError::Fetch(e) => assert!(e.is_unauthorized()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
