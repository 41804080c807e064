//! Remote background-removal client

use crate::config::TransformConfig;
use crate::error::{ErrorBody, TransformError, TransformResult};
use crate::multipart::MultipartUpload;
use async_trait::async_trait;
use cutout_asset::{DataFormat, ImageBytes};
use reqwest::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::Client;
use std::time::{Duration, Instant};

/// Bytes to send to the service
#[derive(Debug, Clone)]
pub struct TransformRequest {
    pub bytes: ImageBytes,
    pub filename: String,
    /// Format hint; picks the part's MIME type
    pub format: Option<DataFormat>,
    /// Explicit part MIME type, overriding the hint
    pub content_type: Option<String>,
}

impl TransformRequest {
    /// Request without a format hint
    #[must_use]
    pub fn new(bytes: ImageBytes, filename: impl Into<String>) -> Self {
        Self {
            bytes,
            filename: filename.into(),
            format: None,
            content_type: None,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_format(mut self, format: DataFormat) -> Self {
        self.format = Some(format);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Shape this request as an upload
    #[must_use]
    pub fn to_upload(&self) -> MultipartUpload {
        let upload = MultipartUpload::new(self.bytes.clone(), self.filename.clone(), self.format.as_ref());
        match &self.content_type {
            Some(content_type) => upload.with_content_type(content_type.clone()),
            None => upload,
        }
    }
}

/// Successful service response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutput {
    /// Response body, unmodified
    pub bytes: ImageBytes,
    /// Format declared by the response content type
    pub format: DataFormat,
    /// Raw content type header
    pub content_type: String,
}

/// Anything that can remove a background
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Send one image and return the processed bytes
    ///
    /// # Errors
    /// Returns a [`TransformError`]; there are no retries
    async fn transform(&self, request: TransformRequest) -> TransformResult<TransformOutput>;
}

/// HTTP implementation of [`Transformer`]
#[derive(Debug, Clone)]
pub struct HttpTransformClient {
    client: Client,
    config: TransformConfig,
    key_header: HeaderName,
    key_value: HeaderValue,
}

impl HttpTransformClient {
    /// Create a client for `config`
    ///
    /// # Errors
    /// Returns [`TransformError::InvalidConfig`] if the key header or key is
    /// not a valid HTTP header, or the HTTP client cannot be built
    pub fn new(config: TransformConfig) -> TransformResult<Self> {
        let key_header = HeaderName::try_from(config.api_key_header.as_str())
            .map_err(|e| TransformError::InvalidConfig(format!("api key header: {e}")))?;
        let mut key_value = HeaderValue::try_from(config.api_key.expose())
            .map_err(|_| TransformError::InvalidConfig("api key is not a valid header value".to_string()))?;
        key_value.set_sensitive(true);

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| TransformError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            client,
            config,
            key_header,
            key_value,
        })
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    async fn send(&self, form: Form) -> TransformResult<TransformOutput> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .header(self.key_header.clone(), self.key_value.clone())
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(TransformError::HttpError {
                status: status.as_u16(),
                body: ErrorBody::parse(text),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let format = content_type.as_deref().and_then(DataFormat::from_mime);
        let (Some(content_type), Some(format)) = (content_type.clone(), format) else {
            return Err(TransformError::NotImage { content_type });
        };

        let bytes = response.bytes().await.map_err(|e| self.classify(&e))?;
        Ok(TransformOutput {
            bytes: ImageBytes::from(bytes.as_ref()),
            format,
            content_type,
        })
    }

    fn classify(&self, e: &reqwest::Error) -> TransformError {
        if e.is_timeout() {
            TransformError::Timeout(self.config.timeout)
        } else {
            TransformError::NetworkError(e.to_string())
        }
    }
}

#[async_trait]
impl Transformer for HttpTransformClient {
    async fn transform(&self, request: TransformRequest) -> TransformResult<TransformOutput> {
        let upload = request.to_upload();
        tracing::debug!(
            endpoint = %self.config.endpoint,
            bytes = upload.payload_len(),
            filename = upload.filename(),
            "sending transform request"
        );
        let form = upload.into_form()?;
        let started = Instant::now();

        let deadline = self.config.timeout;
        let result = match tokio::time::timeout(deadline, self.send(form)).await {
            Ok(result) => result,
            Err(_) => Err(TransformError::Timeout(deadline)),
        };

        match &result {
            Ok(output) => tracing::debug!(
                bytes = output.bytes.len(),
                format = %output.format,
                elapsed_ms = started.elapsed().as_millis(),
                "transform succeeded"
            ),
            Err(e) => tracing::warn!(error = %e, elapsed_ms = started.elapsed().as_millis(), "transform failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;

    #[test]
    fn rejects_invalid_header_name() {
        let config = TransformConfig::new(ApiKey::new("k")).with_api_key_header("bad header");
        assert!(matches!(
            HttpTransformClient::new(config),
            Err(TransformError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_key_with_line_break() {
        let config = TransformConfig::new(ApiKey::new("k\nX-Other: 1"));
        assert!(matches!(
            HttpTransformClient::new(config),
            Err(TransformError::InvalidConfig(_))
        ));
    }

    #[test]
    fn request_content_type_overrides_hint() {
        let request = TransformRequest::new(ImageBytes::from(&b"x"[..]), "in.jpg")
            .with_format(DataFormat::Png)
            .with_content_type("image/jpeg");
        assert_eq!(request.to_upload().part_content_type(), "image/jpeg");
    }

    #[tokio::test]
    async fn empty_payload_fails_before_sending() {
        let config = TransformConfig::new(ApiKey::new("k")).with_endpoint("http://127.0.0.1:9");
        let client = HttpTransformClient::new(config).unwrap();
        let result = client
            .transform(TransformRequest::new(ImageBytes::from(Vec::new()), "a.png"))
            .await;
        assert!(matches!(result, Err(TransformError::EncodeFailed(_))));
    }
}
