//! File configuration
//!
//! ```toml
//! [transform]
//! endpoint = "https://api.backgrounderase.net/v2"
//! api_key = "..."
//! timeout_secs = 30
//!
//! [pipeline]
//! load_timeout_ms = 4000
//! name_suffix = " (bg)"
//!
//! [proxy]
//! bind = "127.0.0.1:3001"
//! save_dir = "saved"
//! allowed_origins = ["http://localhost:8601"]
//! ```
//!
//! Command-line flags override the file; the API key may also come from
//! `CUTOUT_API_KEY`.

use crate::cli::{GlobalArgs, API_KEY_ENV};
use anyhow::{bail, Context, Result};
use cutout_core::PipelineConfig;
use cutout_transform::{ApiKey, TransformConfig};
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Proxy listen port when nothing else is configured
pub const DEFAULT_PROXY_PORT: u16 = 3001;

/// Origins the proxy accepts by default
pub const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = ["http://localhost:8601", "http://127.0.0.1:8601"];

/// `[transform]` table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformSection {
    pub endpoint: Option<String>,
    pub api_key: Option<ApiKey>,
    pub api_key_header: Option<String>,
    pub timeout_secs: Option<f64>,
}

/// `[proxy]` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProxyConfig {
    pub bind: SocketAddr,
    pub save_dir: PathBuf,
    pub allowed_origins: Vec<String>,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PROXY_PORT)),
            save_dir: PathBuf::from("saved"),
            allowed_origins: DEFAULT_ALLOWED_ORIGINS.iter().map(ToString::to_string).collect(),
        }
    }
}

/// Whole configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub transform: TransformSection,
    pub pipeline: PipelineConfig,
    pub proxy: ProxyConfig,
}

impl FileConfig {
    /// Parse TOML text
    ///
    /// # Errors
    /// Returns error on malformed TOML or unknown keys
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid configuration")
    }

    /// Read and parse a file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }

    /// Load the file named by `--config`, or defaults
    ///
    /// # Errors
    /// Returns error if a named file cannot be loaded
    pub fn from_args(args: &GlobalArgs) -> Result<Self> {
        match &args.config {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Build the transform client config, flags first
    ///
    /// `batch` selects the long default deadline used by one-off commands.
    ///
    /// # Errors
    /// Returns error if no API key is available or the timeout is invalid
    pub fn transform_config(&self, args: &GlobalArgs, batch: bool) -> Result<TransformConfig> {
        let api_key = args
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ApiKey::new)
            .or_else(|| self.transform.api_key.clone());
        let Some(api_key) = api_key else {
            bail!("no API key: pass --api-key, set {API_KEY_ENV} or add api_key under [transform]");
        };

        let mut config = if batch {
            TransformConfig::batch(api_key)
        } else {
            TransformConfig::new(api_key)
        };

        if let Some(endpoint) = args.endpoint.as_ref().or(self.transform.endpoint.as_ref()) {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(header) = &self.transform.api_key_header {
            config = config.with_api_key_header(header.clone());
        }
        if let Some(secs) = self.transform.timeout_secs {
            let timeout = Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|t| !t.is_zero())
                .with_context(|| format!("timeout_secs must be positive, got {secs}"))?;
            config = config.with_timeout(timeout);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use cutout_transform::{BATCH_TIMEOUT, DEFAULT_ENDPOINT, INTERACTIVE_TIMEOUT};

    fn args(api_key: Option<&str>, endpoint: Option<&str>) -> GlobalArgs {
        GlobalArgs {
            config: None,
            api_key: api_key.map(ToString::to_string),
            endpoint: endpoint.map(ToString::to_string),
            log_format: LogFormat::Text,
        }
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = FileConfig::parse("").unwrap();
        assert_eq!(config.proxy, ProxyConfig::default());
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.proxy.bind.port(), 3001);
    }

    #[test]
    fn full_file_parses() {
        let config = FileConfig::parse(
            r#"
            [transform]
            endpoint = "http://localhost:9000/v2"
            api_key = "from-file"
            api_key_header = "authorization"
            timeout_secs = 2.5

            [pipeline]
            load_timeout_ms = 500
            name_suffix = " (cut)"

            [proxy]
            bind = "0.0.0.0:8080"
            save_dir = "/tmp/saved"
            allowed_origins = ["http://example.test"]
            "#,
        )
        .unwrap();

        assert_eq!(config.pipeline.load_timeout, Duration::from_millis(500));
        assert_eq!(config.pipeline.name_suffix, " (cut)");
        assert_eq!(config.proxy.allowed_origins, vec!["http://example.test".to_string()]);

        let transform = config.transform_config(&args(None, None), false).unwrap();
        assert_eq!(transform.endpoint, "http://localhost:9000/v2");
        assert_eq!(transform.api_key.expose(), "from-file");
        assert_eq!(transform.api_key_header, "authorization");
        assert_eq!(transform.timeout, Duration::from_millis(2500));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(FileConfig::parse("[transform]\napikey = \"typo\"").is_err());
    }

    #[test]
    fn flags_override_file() {
        let config = FileConfig::parse("[transform]\napi_key = \"file\"\nendpoint = \"http://file\"").unwrap();
        let transform = config
            .transform_config(&args(Some("flag"), Some("http://flag")), false)
            .unwrap();
        assert_eq!(transform.api_key.expose(), "flag");
        assert_eq!(transform.endpoint, "http://flag");
    }

    #[test]
    fn batch_selects_long_deadline() {
        let config = FileConfig::default();
        let batch = config.transform_config(&args(Some("k"), None), true).unwrap();
        let interactive = config.transform_config(&args(Some("k"), None), false).unwrap();
        assert_eq!(batch.timeout, BATCH_TIMEOUT);
        assert_eq!(interactive.timeout, INTERACTIVE_TIMEOUT);
        assert_eq!(batch.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn missing_or_blank_key_is_an_error() {
        let config = FileConfig::default();
        assert!(config.transform_config(&args(None, None), false).is_err());
        assert!(config.transform_config(&args(Some("  "), None), false).is_err());
    }

    #[test]
    fn zero_timeout_is_an_error() {
        let config = FileConfig::parse("[transform]\napi_key = \"k\"\ntimeout_secs = 0").unwrap();
        assert!(config.transform_config(&args(None, None), false).is_err());
    }
}
