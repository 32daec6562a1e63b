//! Error types for the booking workflow

use thiserror::Error;

/// Errors raised while turning a draft into a pending booking
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// The selected space is not in the current catalog snapshot
    #[error("Space {0} is no longer available")]
    SpaceNotFound(crate::types::SpaceId),

    /// The draft is missing data that validation should have caught
    #[error("Invalid booking draft: {0}")]
    InvalidDraft(String),
}

/// Errors from the external booking API
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The request never got a response
    #[error("Network error: {0}")]
    Network(String),

    /// The API answered with a non-success status
    #[error("API error (status {status}): {}", detail.as_deref().unwrap_or("no detail"))]
    Status {
        /// HTTP status code
        status: u16,
        /// `detail` field of the error body, when present
        detail: Option<String>,
    },

    /// A success response could not be decoded
    #[error("Response parsing failed: {0}")]
    Decode(String),
}

impl ApiError {
    /// Message meant for the user, taken verbatim from the API when it sent one
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Network(_) => Some("Network error"),
            Self::Status { detail, .. } => detail.as_deref(),
            Self::Decode(_) => None,
        }
    }

    /// A rejection carrying the given detail, as the API reports it
    #[must_use]
    pub fn rejected(status: u16, detail: impl Into<String>) -> Self {
        Self::Status {
            status,
            detail: Some(detail.into()),
        }
    }
}
