//! Error taxonomy for registry interactions.
//!
//! Every flow in the controller catches these at its boundary and hands them
//! to the view; none of them terminate the process.

use thiserror::Error;

/// Error code synthesized when the registry answers with a non-JSON body.
pub const HTTP_ERROR_CODE: &str = "http";

#[derive(Debug, Error)]
pub enum AdminError {
    /// Rejected locally; no request was issued.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The transport failed and no response was received.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A response arrived but its body was not JSON.
    #[error("Unexpected response (HTTP {status}): {detail}")]
    Protocol { status: u16, detail: String },

    /// A well-formed response that reports failure.
    #[error("Registry error (HTTP {status}): {error}")]
    Application {
        status: u16,
        error: String,
        detail: Option<String>,
    },
}

impl AdminError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Short error code as the registry would name it.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::Validation(_) => "validation",
            Self::Network(_) => "network",
            Self::Protocol { .. } => HTTP_ERROR_CODE,
            Self::Application { error, .. } => error.as_str(),
        }
    }

    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Validation(msg) => Some(msg.clone()),
            Self::Network(err) => Some(err.to_string()),
            Self::Protocol { detail, .. } => Some(detail.clone()),
            Self::Application { detail, .. } => detail.clone(),
        }
    }

    /// HTTP status of the response, when one was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } | Self::Application { status, .. } => Some(*status),
            Self::Validation(_) | Self::Network(_) => None,
        }
    }

    /// Human-readable message for the operator.
    #[must_use]
    pub fn operator_message(&self) -> String {
        match self.detail() {
            Some(detail) if !detail.is_empty() => {
                format!("Error: {}\nDetail: {detail}", self.code())
            }
            _ => format!("Error: {}", self.code()),
        }
    }
}
