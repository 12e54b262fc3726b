//! Command vocabulary understood by the Blender add-on.
//!
//! Envelopes are only built through the constructors on [`Envelope`], which
//! validate required fields and stamp the send timestamp. Once built an
//! envelope cannot be changed.

use crate::error::ProtocolError;

use std::time::SystemTime;

use humantime::format_rfc3339_millis;
use serde::Serialize;
use serde_json::{Map, Value};
use url::Url;

pub const TYPE_CODE: &str = "code";
pub const TYPE_FETCH_SCENE: &str = "fetch-scene";
pub const TYPE_DOWNLOAD_ASSET: &str = "download-asset";
pub const TYPE_ASSET_DATA: &str = "asset-data";

/// Type-specific payload of an envelope. Serialized with a `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Command {
    /// Python source executed verbatim inside Blender.
    Code { code: String },

    /// Ask for the scene name and the objects it contains.
    FetchScene,

    DownloadAsset {
        asset_name: String,
        blend_url: String,
    },

    /// A fully resolved catalog download: the add-on fetches `blend_url` plus
    /// every entry of `includes` and links the result into the scene.
    AssetData {
        asset_name: String,
        asset_type: String,
        resolution: String,
        format: String,
        blend_url: String,
        includes: Map<String, Value>,
    },
}

impl Command {
    pub fn type_name(&self) -> &'static str {
        match self {
            Command::Code { .. } => TYPE_CODE,
            Command::FetchScene => TYPE_FETCH_SCENE,
            Command::DownloadAsset { .. } => TYPE_DOWNLOAD_ASSET,
            Command::AssetData { .. } => TYPE_ASSET_DATA,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    #[serde(flatten)]
    command: Command,
    timestamp: String,
}

/// Caller-supplied fields of an `asset-data` push.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetDataRequest {
    pub asset_name: String,
    pub asset_type: String,
    pub resolution: String,
    pub format: String,
    pub blend_url: String,
    pub includes: Option<Map<String, Value>>,
}

impl Envelope {
    #[track_caller]
    pub fn code(code: impl Into<String>) -> Result<Self, ProtocolError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(ProtocolError::validation("code must not be blank"));
        }
        Ok(Self::stamped(Command::Code { code }))
    }

    pub fn fetch_scene() -> Self {
        Self::stamped(Command::FetchScene)
    }

    #[track_caller]
    pub fn download_asset(
        asset_name: impl Into<String>,
        blend_url: impl Into<String>,
    ) -> Result<Self, ProtocolError> {
        let asset_name = required("asset_name", asset_name.into())?;
        let blend_url = absolute_url("blend_url", blend_url.into())?;
        Ok(Self::stamped(Command::DownloadAsset {
            asset_name,
            blend_url,
        }))
    }

    /// Builds an `asset-data` envelope. A missing `includes` is sent as an
    /// empty mapping so the field is always present on the wire.
    #[track_caller]
    pub fn asset_data(request: AssetDataRequest) -> Result<Self, ProtocolError> {
        let AssetDataRequest {
            asset_name,
            asset_type,
            resolution,
            format,
            blend_url,
            includes,
        } = request;

        Ok(Self::stamped(Command::AssetData {
            asset_name: required("asset_name", asset_name)?,
            asset_type: required("asset_type", asset_type)?,
            resolution: required("resolution", resolution)?,
            format: required("format", format)?,
            blend_url: absolute_url("blend_url", blend_url)?,
            includes: includes.unwrap_or_default(),
        }))
    }

    pub fn command(&self) -> &Command {
        &self.command
    }

    /// RFC 3339 UTC timestamp taken when the envelope was built.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn type_name(&self) -> &'static str {
        self.command.type_name()
    }

    fn stamped(command: Command) -> Self {
        Self {
            command,
            timestamp: format_rfc3339_millis(SystemTime::now()).to_string(),
        }
    }
}

#[track_caller]
fn required(field: &str, value: String) -> Result<String, ProtocolError> {
    if value.trim().is_empty() {
        return Err(ProtocolError::validation(format!(
            "{field} is required and must not be empty"
        )));
    }
    Ok(value)
}

#[track_caller]
fn absolute_url(field: &str, value: String) -> Result<String, ProtocolError> {
    let value = required(field, value)?;
    if let Err(e) = Url::parse(&value) {
        return Err(ProtocolError::validation(format!(
            "{field} is not an absolute URL ({e}): {value}"
        )));
    }
    Ok(value)
}
