//! Request/response protocol spoken with the Blender add-on's TCP listener.
//!
//! One JSON envelope goes out per connection and one JSON document comes back.
//! There is no length prefix and no delimiter; the reply is complete as soon
//! as the accumulated bytes parse, or when the remote closes.
//!
//! - [`envelope`] builds the command objects.
//! - [`codec`] turns envelopes into bytes and accumulated bytes into values.
//! - [`exchange`] runs a single connection to settlement.
//! - [`client`] is the public entry point.

pub mod client;
pub mod codec;
pub mod envelope;
pub(crate) mod exchange;

pub use client::BlenderClient;
pub use envelope::{AssetDataRequest, Command, Envelope};
