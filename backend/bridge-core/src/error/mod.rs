pub mod catalog;
pub mod config;
pub mod protocol;

pub use catalog::CatalogError;
pub use config::ConfigError;
pub use protocol::{FailureKind, ProtocolError};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Protocol(#[from] protocol::ProtocolError),

    #[error(transparent)]
    Catalog(#[from] catalog::CatalogError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
