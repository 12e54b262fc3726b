//! Shared leaf types for the blender-bridge workspace.
//!
//! ## Architecture
//!
//! - **common** (this crate): error locations and small value types
//! - **bridge-core**: protocol client, command vocabulary, Poly Haven catalog
//! - **blender-bridge**: CLI, logging and tool-output rendering
//!
//! Nothing in here performs I/O.

pub mod error;
pub mod http_status;


pub use error::error_location::ErrorLocation;
pub use http_status::HttpStatusCode;
