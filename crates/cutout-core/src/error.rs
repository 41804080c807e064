//! Error types for the removal pipeline
//!
//! Every stage failure ends up as a [`PipelineError`]. Callers use
//! [`PipelineError::category`] to tell apart:
//! - Input the pipeline cannot handle
//! - Remote or connectivity problems
//! - Local decoding and installation problems

use crate::resolver::Attempt;
use cutout_asset::{DataFormat, TargetId};
use cutout_transform::{ErrorBody, TransformError};
use std::time::Duration;

/// Coarse failure class for callers that only branch on the kind of problem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// The costume cannot be processed as given
    Input,
    /// The remote service or the network failed
    Remote,
    /// Decoding or installing the result failed locally
    Local,
}

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Vector costumes are never sent
    #[error("unsupported costume format: {format}")]
    UnsupportedFormat { format: DataFormat },

    /// No strategy produced bytes
    #[error("could not resolve costume bytes ({})", describe_attempts(.attempts))]
    ResolutionFailed { attempts: Vec<Attempt> },

    /// The upload could not be framed
    #[error("could not encode upload: {0}")]
    EncodeFailed(String),

    /// Connectivity failure talking to the service
    #[error("network error: {0}")]
    NetworkError(String),

    /// The service did not answer within its deadline
    #[error("service did not respond within {0:?}")]
    Timeout(Duration),

    /// The service answered with an error status
    #[error("service returned {status}: {body}")]
    HttpError { status: u16, body: ErrorBody },

    /// The service answered with something other than an image
    #[error("service response is not an image (content type {content_type:?})")]
    NotImage { content_type: Option<String> },

    /// The result could not be decoded into a bitmap
    #[error("could not decode result: {0}")]
    DecodeFailed(String),

    /// The host refused the new asset, skin or binding
    #[error("could not install result: {0}")]
    InstallFailed(String),

    /// Another removal for the same target is in flight
    #[error("target {0} is already processing")]
    AlreadyProcessing(TargetId),
}

impl PipelineError {
    /// Failure class
    #[must_use]
    pub fn category(&self) -> FailureCategory {
        match self {
            Self::UnsupportedFormat { .. } | Self::ResolutionFailed { .. } | Self::EncodeFailed(_) => {
                FailureCategory::Input
            }
            Self::NetworkError(_) | Self::Timeout(_) | Self::HttpError { .. } | Self::NotImage { .. } => {
                FailureCategory::Remote
            }
            Self::DecodeFailed(_) | Self::InstallFailed(_) | Self::AlreadyProcessing(_) => {
                FailureCategory::Local
            }
        }
    }

    /// One-line alert text for the person who triggered the removal
    #[must_use]
    pub fn user_message(&self) -> String {
        let detail = match self {
            Self::UnsupportedFormat { .. } => {
                "vector costumes are not supported; convert to bitmap first.".to_string()
            }
            Self::ResolutionFailed { .. } => "could not read costume bytes.".to_string(),
            Self::EncodeFailed(_) => "could not prepare the image for upload.".to_string(),
            Self::NetworkError(_) => "network error.".to_string(),
            Self::Timeout(_) => "the service took too long to respond.".to_string(),
            Self::HttpError { status, body } => match body.message() {
                Some(message) => format!("API returned an error ({status}: {message})."),
                None => format!("API returned an error ({status})."),
            },
            Self::NotImage { .. } => "the service did not return an image.".to_string(),
            Self::DecodeFailed(_) => "could not decode PNG for renderer.".to_string(),
            Self::InstallFailed(_) => "could not add the new costume.".to_string(),
            Self::AlreadyProcessing(_) => "already working on this sprite.".to_string(),
        };
        format!("Background Remover: {detail}")
    }
}

impl From<TransformError> for PipelineError {
    fn from(err: TransformError) -> Self {
        match err {
            TransformError::EncodeFailed(msg) | TransformError::InvalidConfig(msg) => Self::EncodeFailed(msg),
            TransformError::NetworkError(msg) => Self::NetworkError(msg),
            TransformError::Timeout(after) => Self::Timeout(after),
            TransformError::HttpError { status, body } => Self::HttpError { status, body },
            TransformError::NotImage { content_type } => Self::NotImage { content_type },
        }
    }
}

fn describe_attempts(attempts: &[Attempt]) -> String {
    if attempts.is_empty() {
        return "no strategies tried".to_string();
    }
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
