//! Cutout Transform Client
//!
//! Sends one image to a remote background-removal service and returns the
//! processed bytes untouched.
//!
//! # Contract
//!
//! - `POST` to the configured endpoint with the API key in a header
//!   (`x-api-key` by default)
//! - `multipart/form-data` body with a single part named `image_file`
//! - Success is a 2xx status with an `image/*` content type
//!
//! The whole exchange is raced against [`TransformConfig::timeout`]; there
//! are no retries.
//!
//! # Example
//!
//! ```rust,ignore
//! use cutout_transform::{ApiKey, HttpTransformClient, TransformConfig, TransformRequest, Transformer};
//!
//! let config = TransformConfig::new(ApiKey::from_env("CUTOUT_API_KEY").unwrap());
//! let client = HttpTransformClient::new(config)?;
//! let output = client
//!     .transform(TransformRequest::new(bytes, "costume.jpg").with_format(DataFormat::Jpeg))
//!     .await?;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod client;
pub mod config;
pub mod error;
pub mod multipart;

pub use client::{HttpTransformClient, TransformOutput, TransformRequest, Transformer};
pub use config::{ApiKey, TransformConfig, BATCH_TIMEOUT, DEFAULT_ENDPOINT, INTERACTIVE_TIMEOUT};
pub use error::{ErrorBody, TransformError, TransformResult};
pub use multipart::{MultipartUpload, FIELD_NAME};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
