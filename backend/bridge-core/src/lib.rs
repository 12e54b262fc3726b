//! Client side of the Blender bridge.
//!
//! [`BlenderClient`] speaks the add-on's unframed JSON-over-TCP protocol,
//! [`catalog::PolyHavenClient`] resolves asset downloads, and [`config`]
//! holds the settings both are built from.

pub mod catalog;
pub mod config;
pub mod error;
pub mod protocol;

#[cfg(test)]
mod tests;

pub use protocol::BlenderClient;

use const_format::concatcp;

pub const DEFAULT_BLENDER_HOST: &str = "localhost";
pub const DEFAULT_BLENDER_PORT: u16 = 8765;
pub const POLYHAVEN_API_HOSTNAME: &str = "api.polyhaven.com";
pub const POLYHAVEN_API_BASE_URL: &str = concatcp!("https://", POLYHAVEN_API_HOSTNAME);
