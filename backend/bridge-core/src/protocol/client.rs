use crate::config::ConnectionConfig;
use crate::error::ProtocolError;
use crate::protocol::codec::encode;
use crate::protocol::envelope::{AssetDataRequest, Envelope};
use crate::protocol::exchange::run_exchange;

use log::{info, warn};
use serde_json::Value;

/// Client for the Blender add-on listener.
///
/// Holds only read-only connection settings, so it is cheap to clone and
/// safe to share across tasks. Every call opens its own connection; failures
/// are returned as-is and never retried.
#[derive(Debug, Clone)]
pub struct BlenderClient {
    connection: ConnectionConfig,
}

impl BlenderClient {
    pub fn new(connection: ConnectionConfig) -> Self {
        Self { connection }
    }

    /// Sends any envelope and returns the remote's reply.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Transport`], [`ProtocolError::Timeout`],
    /// [`ProtocolError::MalformedResponse`] or [`ProtocolError::NoResponse`]
    /// when the exchange fails.
    pub async fn send_message(&self, envelope: &Envelope) -> Result<Value, ProtocolError> {
        let payload = encode(envelope)?;
        let address = self.connection.address();

        info!("Sending {} envelope to {address}", envelope.type_name());

        let result = run_exchange(&address, self.connection.timeout(), payload).await;
        match &result {
            Ok(_) => info!("{} exchange with {address} succeeded", envelope.type_name()),
            Err(e) => warn!("{} exchange with {address} failed: {e}", envelope.type_name()),
        }
        result
    }

    /// Executes Python source inside Blender.
    pub async fn send_code(&self, code: &str) -> Result<Value, ProtocolError> {
        let envelope = Envelope::code(code)?;
        self.send_message(&envelope).await
    }

    /// Fetches the scene name and its objects.
    pub async fn fetch_scene(&self) -> Result<Value, ProtocolError> {
        self.send_message(&Envelope::fetch_scene()).await
    }

    pub async fn download_asset(
        &self,
        asset_name: &str,
        blend_url: &str,
    ) -> Result<Value, ProtocolError> {
        let envelope = Envelope::download_asset(asset_name, blend_url)?;
        self.send_message(&envelope).await
    }

    /// Pushes a resolved catalog download for the add-on to fetch and import.
    pub async fn push_asset_data(
        &self,
        request: AssetDataRequest,
    ) -> Result<Value, ProtocolError> {
        let envelope = Envelope::asset_data(request)?;
        self.send_message(&envelope).await
    }
}
