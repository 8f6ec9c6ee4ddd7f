//! Error types for the detection runtime.
//!
//! Feature extraction, distances, landscapes and scoring are total
//! functions and never fail. Errors only arise at the configuration and
//! dispatch boundaries.

use thiserror::Error;

/// Errors surfaced by configuration validation and job dispatch.
#[derive(Debug, Error)]
pub enum TopoError {
    #[error("Invalid configuration: {field} {reason}")]
    InvalidConfig { field: &'static str, reason: String },

    #[error("Detection job already in flight; dispatch dropped")]
    Busy,

    #[error("No async runtime available for dispatch")]
    NoRuntime,

    #[error("Detection job failed: {0}")]
    JobFailed(String),

    #[error("Result channel closed before the job reported")]
    ChannelClosed,
}

impl TopoError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TopoError>;
