//! Turning a catalog file manifest into a concrete download.

use crate::error::ProtocolError;
use crate::error::catalog::CatalogError;
use crate::protocol::envelope::{AssetDataRequest, Envelope};

use common::ErrorLocation;

use std::panic::Location;

use log::debug;
use serde_json::{Map, Value};

pub const ASSET_TYPE_HDRIS: &str = "hdris";
pub const ASSET_TYPE_MODELS: &str = "models";
pub const ASSET_TYPE_TEXTURES: &str = "textures";

const HDRI_FILE_KEY: &str = "hdri";
const BLEND_FILE_KEY: &str = "blend";
const URL_KEY: &str = "url";
const INCLUDE_KEY: &str = "include";

/// What the caller asked for. Unset resolution/format fall back to the
/// per-type defaults of [`default_resolution_and_format`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadRequest {
    pub asset_id: String,
    pub asset_type: String,
    pub resolution: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAsset {
    pub asset_name: String,
    pub asset_type: String,
    pub resolution: String,
    pub format: String,
    pub url: String,
    pub includes: Option<Map<String, Value>>,
}

impl ResolvedAsset {
    pub fn into_request(self) -> AssetDataRequest {
        AssetDataRequest {
            asset_name: self.asset_name,
            asset_type: self.asset_type,
            resolution: self.resolution,
            format: self.format,
            blend_url: self.url,
            includes: self.includes,
        }
    }

    pub fn into_envelope(self) -> Result<Envelope, ProtocolError> {
        Envelope::asset_data(self.into_request())
    }
}

/// Default `(resolution, format)` for an asset type.
///
/// Anything that is not `hdris` or `models` gets the texture defaults,
/// including asset types the catalog may add later.
pub fn default_resolution_and_format(asset_type: &str) -> (&'static str, &'static str) {
    match asset_type {
        ASSET_TYPE_HDRIS => ("1k", "hdr"),
        ASSET_TYPE_MODELS => ("1k", "blend"),
        _ => ("1K", "jpg"),
    }
}

/// Picks the file to download out of a `/files/{id}` manifest.
///
/// HDRIs resolve to `hdri.<res>.<format>`; every other type resolves to the
/// `.blend` at `blend.<res>.blend` together with its `include` map. The
/// resolution key is matched case-insensitively.
#[track_caller]
pub fn resolve_download(
    request: &DownloadRequest,
    manifest: &Value,
) -> Result<ResolvedAsset, CatalogError> {
    let (default_resolution, default_format) = default_resolution_and_format(&request.asset_type);
    let resolution = request
        .resolution
        .clone()
        .unwrap_or_else(|| default_resolution.to_string());
    let format = request
        .format
        .clone()
        .unwrap_or_else(|| default_format.to_string());

    let (path, file) = if request.asset_type == ASSET_TYPE_HDRIS {
        let path = [HDRI_FILE_KEY, resolution.as_str(), format.as_str()];
        (path, lookup(manifest, &path))
    } else {
        let path = [BLEND_FILE_KEY, resolution.as_str(), BLEND_FILE_KEY];
        (path, lookup(manifest, &path))
    };

    let missing = || CatalogError::MissingFile {
        message: format!(
            "no {} entry with a url in the manifest of {}",
            path.join("/"),
            request.asset_id
        ),
        location: ErrorLocation::from(Location::caller()),
    };

    let file = file.ok_or_else(missing)?;
    let url = file
        .get(URL_KEY)
        .and_then(Value::as_str)
        .ok_or_else(missing)?
        .to_string();
    let includes = file.get(INCLUDE_KEY).and_then(Value::as_object).cloned();

    debug!(
        "Resolved {} ({}) at {resolution}/{format}: {url}",
        request.asset_id, request.asset_type
    );

    Ok(ResolvedAsset {
        asset_name: request.asset_id.clone(),
        asset_type: request.asset_type.clone(),
        resolution,
        format,
        url,
        includes,
    })
}

fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter()
        .try_fold(value, |current, key| get_ignore_case(current.as_object()?, key))
}

fn get_ignore_case<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    })
}
