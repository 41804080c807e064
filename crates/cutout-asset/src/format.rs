//! Asset format tags

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Format tag carried by assets and costumes
///
/// Tags are case-insensitive on input; `jpeg` and `jpg` are the same format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum DataFormat {
    #[default]
    Png,
    Jpeg,
    Gif,
    Bmp,
    Webp,
    /// Vector costume; rejected by the transform service
    Svg,
    /// Any other tag, stored lower-cased
    Other(String),
}

impl DataFormat {
    /// Parse a format tag such as `png`, `JPG` or `svg`
    #[must_use]
    pub fn parse(tag: &str) -> Self {
        let tag = tag.trim().trim_start_matches('.').to_ascii_lowercase();
        match tag.as_str() {
            "png" => Self::Png,
            "jpg" | "jpeg" => Self::Jpeg,
            "gif" => Self::Gif,
            "bmp" => Self::Bmp,
            "webp" => Self::Webp,
            "svg" => Self::Svg,
            _ => Self::Other(tag),
        }
    }

    /// Map a MIME type (parameters ignored) to a format
    ///
    /// Returns `None` for anything that is not an image type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or_default().trim();
        let subtype = essence.to_ascii_lowercase().strip_prefix("image/")?.to_string();
        Some(match subtype.as_str() {
            "svg+xml" => Self::Svg,
            other => Self::parse(other),
        })
    }

    /// MIME type used when uploading bytes of this format
    #[must_use]
    pub fn mime(&self) -> &str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
            Self::Svg => "image/svg+xml",
            Self::Other(_) => "application/octet-stream",
        }
    }

    /// Canonical file extension
    #[must_use]
    pub fn extension(&self) -> &str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Bmp => "bmp",
            Self::Webp => "webp",
            Self::Svg => "svg",
            Self::Other(tag) => tag,
        }
    }

    /// Whether the format is a bitmap encoding
    #[inline]
    #[must_use]
    pub fn is_raster(&self) -> bool {
        !matches!(self, Self::Svg)
    }
}

impl Display for DataFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl From<String> for DataFormat {
    fn from(tag: String) -> Self {
        Self::parse(&tag)
    }
}

impl From<&str> for DataFormat {
    fn from(tag: &str) -> Self {
        Self::parse(tag)
    }
}

impl From<DataFormat> for String {
    fn from(format: DataFormat) -> Self {
        format.extension().to_string()
    }
}
