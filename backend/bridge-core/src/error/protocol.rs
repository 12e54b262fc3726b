//! Error types for exchanges with the Blender listener.
//!
//! Every exchange settles as a value or exactly one of these failures.
//! None of them are retried by the core.

use common::ErrorLocation;

use std::io::Error as IoError;
use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ProtocolError {
    #[error("Transport Error: {message} {location}")]
    Transport {
        message: String,
        location: ErrorLocation,
        #[source]
        source: IoError,
    },

    #[error("Timeout Error: no response within {timeout_ms}ms {location}")]
    Timeout {
        timeout_ms: u64,
        location: ErrorLocation,
    },

    #[error("Malformed Response Error: connection closed with unparseable data: {raw} {location}")]
    MalformedResponse {
        raw: String,
        location: ErrorLocation,
    },

    #[error("No Response Error: {message} {location}")]
    NoResponse {
        message: String,
        location: ErrorLocation,
    },

    #[error("Encode Error: {message} {location}")]
    Encode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Validation Error: {message} {location}")]
    Validation {
        message: String,
        location: ErrorLocation,
    },
}

/// Failure category, for callers that branch on the outcome without matching on fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    Timeout,
    MalformedResponse,
    NoResponse,
    Encode,
    Validation,
}

impl ProtocolError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ProtocolError::Transport { .. } => FailureKind::Transport,
            ProtocolError::Timeout { .. } => FailureKind::Timeout,
            ProtocolError::MalformedResponse { .. } => FailureKind::MalformedResponse,
            ProtocolError::NoResponse { .. } => FailureKind::NoResponse,
            ProtocolError::Encode { .. } => FailureKind::Encode,
            ProtocolError::Validation { .. } => FailureKind::Validation,
        }
    }

    pub fn location(&self) -> ErrorLocation {
        match self {
            ProtocolError::Transport { location, .. }
            | ProtocolError::Timeout { location, .. }
            | ProtocolError::MalformedResponse { location, .. }
            | ProtocolError::NoResponse { location, .. }
            | ProtocolError::Encode { location, .. }
            | ProtocolError::Validation { location, .. } => *location,
        }
    }

    #[track_caller]
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        ProtocolError::Validation {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<IoError> for ProtocolError {
    #[track_caller]
    fn from(error: IoError) -> Self {
        ProtocolError::Transport {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
            source: error,
        }
    }
}

impl From<serde_json::Error> for ProtocolError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        ProtocolError::Encode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
