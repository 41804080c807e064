//! Transform service configuration

use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

/// Default service endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.backgrounderase.net/v2";

/// Default header carrying the API key
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Interactive (in-editor) request deadline
pub const INTERACTIVE_TIMEOUT: Duration = Duration::from_secs(15);

/// Batch request deadline
pub const BATCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Service credential
///
/// Never printed: `Debug` is redacted and there is no `Display`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read the key from environment variable `var`
    ///
    /// Blank values count as missing.
    #[must_use]
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(Self)
    }

    /// Raw key for the request header
    #[inline]
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([REDACTED])")
    }
}

/// Configuration for [`crate::HttpTransformClient`]
///
/// There is no default key; one must always be supplied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Service URL receiving the upload
    pub endpoint: String,
    /// Credential sent with every request
    pub api_key: ApiKey,
    /// Header name for the credential
    pub api_key_header: String,
    /// Overall request deadline
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl TransformConfig {
    /// Interactive configuration with the default endpoint
    #[must_use]
    pub fn new(api_key: ApiKey) -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            timeout: INTERACTIVE_TIMEOUT,
        }
    }

    /// Batch configuration with the long deadline
    #[must_use]
    pub fn batch(api_key: ApiKey) -> Self {
        Self::new(api_key).with_timeout(BATCH_TIMEOUT)
    }

    #[inline]
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_api_key_header(mut self, header: impl Into<String>) -> Self {
        self.api_key_header = header.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_interactive() {
        let config = TransformConfig::new(ApiKey::new("k"));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.api_key_header, "x-api-key");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn batch_uses_long_timeout() {
        let config = TransformConfig::batch(ApiKey::new("k"));
        assert_eq!(config.timeout, Duration::from_secs(120));
    }

    #[test]
    fn api_key_is_redacted() {
        let config = TransformConfig::new(ApiKey::new("super-secret"));
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("REDACTED"));
    }

    #[test]
    fn missing_env_key_is_none() {
        assert!(ApiKey::from_env("CUTOUT_TEST_KEY_THAT_IS_NEVER_SET").is_none());
    }

    #[test]
    fn serde_roundtrip_keeps_timeout() {
        let config = TransformConfig::new(ApiKey::new("k")).with_timeout(Duration::from_millis(2500));
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"timeout\":2.5"));
        let back: TransformConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
