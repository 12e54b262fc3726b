use bridge_core::error::{CatalogError, ConfigError, CoreError};

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

/// Errors that stop the CLI before a tool result can be produced.
///
/// Failed exchanges are not errors at this level; they are rendered into
/// tool text. These cover setup and input problems.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Error from this binary (logging, filesystem, terminal)
    #[error("Bridge Error: {message} {location}")]
    Bridge {
        message: String,
        location: ErrorLocation,
    },

    /// Error from bridge-core setup (config, catalog client construction)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },

    /// Bad command-line input
    #[error("Input Error: {message} {location}")]
    Input {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for BridgeError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        BridgeError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ConfigError> for BridgeError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        BridgeError::from(CoreError::from(error))
    }
}

impl From<CatalogError> for BridgeError {
    #[track_caller]
    fn from(error: CatalogError) -> Self {
        BridgeError::from(CoreError::from(error))
    }
}
