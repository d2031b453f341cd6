//! Error taxonomy for the churn prediction core

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while loading the classifier or scoring a customer.
#[derive(Debug, Error)]
pub enum ChurnError {
    /// Classifier artifact (or schema sidecar) missing or corrupt at startup.
    #[error("failed to load {}: {reason}", path.display())]
    FatalLoad { path: PathBuf, reason: String },

    /// A record value or field the classifier was not trained on.
    #[error("schema mismatch on {field} = {value:?}: {reason}")]
    SchemaMismatch {
        field: String,
        value: String,
        reason: String,
    },

    /// Value outside its accepted range (strict range policy only).
    #[error("{field} = {value} is outside the accepted range {allowed}")]
    RangeViolation {
        field: String,
        value: String,
        allowed: String,
    },

    /// Payload that is not a customer record.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("inference failed: {0:#}")]
    Inference(#[source] anyhow::Error),
}

impl ChurnError {
    pub fn fatal_load(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Self::FatalLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn schema_mismatch(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::SchemaMismatch {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error is scoped to a single request.
    ///
    /// Everything except a load failure is surfaced to the caller as a
    /// rejected submission; a load failure means no request can be served.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::FatalLoad { .. })
    }

    /// Short machine-readable kind, used in replies and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FatalLoad { .. } => "fatal_load",
            Self::SchemaMismatch { .. } => "schema_mismatch",
            Self::RangeViolation { .. } => "range_violation",
            Self::InvalidRequest(_) => "invalid_request",
            Self::Inference(_) => "inference",
        }
    }
}

pub type Result<T> = std::result::Result<T, ChurnError>;
