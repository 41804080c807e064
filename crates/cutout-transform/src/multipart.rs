//! Single-part `multipart/form-data` upload

use crate::error::{TransformError, TransformResult};
use cutout_asset::{DataFormat, ImageBytes};
use reqwest::multipart::{Form, Part};

/// Form field the service reads the image from
pub const FIELD_NAME: &str = "image_file";

/// The image part of an upload, before it becomes a [`Form`]
///
/// reqwest frames the body and picks a fresh boundary for every form.
#[derive(Debug, Clone)]
pub struct MultipartUpload {
    payload: ImageBytes,
    filename: String,
    content_type: String,
}

impl MultipartUpload {
    /// Upload `payload` under `filename`
    ///
    /// The part's MIME type comes from `format`; without a hint the part is
    /// declared `image/png`.
    #[must_use]
    pub fn new(payload: ImageBytes, filename: impl Into<String>, format: Option<&DataFormat>) -> Self {
        Self {
            payload,
            filename: filename.into(),
            content_type: format.map_or("image/png", DataFormat::mime).to_string(),
        }
    }

    /// Override the part's MIME type
    #[inline]
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    #[inline]
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// MIME type declared for the part
    #[inline]
    #[must_use]
    pub fn part_content_type(&self) -> &str {
        &self.content_type
    }

    #[inline]
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Build the request form
    ///
    /// # Errors
    /// Returns [`TransformError::EncodeFailed`] if the payload is empty, the
    /// filename contains a line break, or the MIME type does not parse
    pub fn into_form(self) -> TransformResult<Form> {
        if self.payload.is_empty() {
            return Err(TransformError::EncodeFailed("payload is empty".to_string()));
        }
        if self.filename.contains(['\r', '\n']) {
            return Err(TransformError::EncodeFailed(format!(
                "filename {:?} contains a line break",
                self.filename
            )));
        }

        let part = Part::bytes(self.payload.to_vec())
            .file_name(self.filename)
            .mime_str(&self.content_type)
            .map_err(|e| TransformError::EncodeFailed(format!("part content type {:?}: {e}", self.content_type)))?;
        Ok(Form::new().part(FIELD_NAME, part))
    }
}
