//! Pipeline configuration

use crate::resolver::DEFAULT_LOAD_TIMEOUT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default decode deadline
pub const DEFAULT_DECODE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default suffix appended to derived costume names
pub const DEFAULT_NAME_SUFFIX: &str = " (bg)";

/// Local stage settings
///
/// The transform deadline lives in the transform client's own config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Deadline for the content-addressed loader
    #[serde(rename = "load_timeout_ms", with = "duration_ms")]
    pub load_timeout: Duration,
    /// Deadline for decoding the result
    #[serde(rename = "decode_timeout_ms", with = "duration_ms")]
    pub decode_timeout: Duration,
    /// Appended to the source costume's name
    pub name_suffix: String,
}

impl PipelineConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_decode_timeout(mut self, timeout: Duration) -> Self {
        self.decode_timeout = timeout;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_name_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.name_suffix = suffix.into();
        self
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            decode_timeout: DEFAULT_DECODE_TIMEOUT,
            name_suffix: DEFAULT_NAME_SUFFIX.to_string(),
        }
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.load_timeout, Duration::from_secs(4));
        assert_eq!(config.name_suffix, " (bg)");
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: PipelineConfig = serde_json::from_str(r#"{"load_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.load_timeout, Duration::from_millis(250));
        assert_eq!(config.decode_timeout, DEFAULT_DECODE_TIMEOUT);
        assert_eq!(config.name_suffix, DEFAULT_NAME_SUFFIX);
    }
}
