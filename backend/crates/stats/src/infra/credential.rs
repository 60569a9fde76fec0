//! Credential Sources

use crate::domain::repository::CredentialProvider;
use crate::domain::value_objects::ApiKey;

/// A key fixed at startup (or none at all)
#[derive(Debug, Clone, Default)]
pub struct StaticCredential {
    key: Option<ApiKey>,
}

impl StaticCredential {
    pub fn new(key: Option<ApiKey>) -> Self {
        Self { key }
    }

    /// Read the key from an environment variable; blank counts as absent
    pub fn from_env(var: &str) -> Self {
        let key = std::env::var(var).ok().and_then(ApiKey::new);
        if key.is_none() {
            tracing::warn!(var, "No API key in environment; upstream requests will be refused");
        }
        Self { key }
    }
}

impl CredentialProvider for StaticCredential {
    fn api_key(&self) -> Option<ApiKey> {
        self.key.clone()
    }
}
