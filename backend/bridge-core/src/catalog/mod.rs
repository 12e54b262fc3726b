//! Poly Haven asset catalog.
//!
//! Plain HTTP GETs against the public API. The only thing the Blender side
//! ever sees from here is a [`ResolvedAsset`] turned into an `asset-data`
//! envelope.

pub mod resolve;

pub use resolve::{DownloadRequest, ResolvedAsset, default_resolution_and_format, resolve_download};

use crate::error::catalog::CatalogError;

use common::{ErrorLocation, HttpStatusCode};

use std::collections::BTreeMap;
use std::panic::Location;
use std::time::Duration;

use const_format::concatcp;
use log::debug;
use reqwest::Client;
use serde_json::{Map, Value};
use url::Url;

const DEFAULT_TIMEOUT_DURATION: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concatcp!("blender-bridge/", env!("CARGO_PKG_VERSION"));
const TYPES_ENDPOINT: &str = "types";
const CATEGORIES_ENDPOINT: &str = "categories";
const ASSETS_ENDPOINT: &str = "assets";
const FILES_ENDPOINT: &str = "files";
const ASSET_TYPE_QUERY_KEY: &str = "t";
const CATEGORIES_QUERY_KEY: &str = "c";

#[derive(Debug, Clone)]
pub struct PolyHavenClient {
    base_url: Url,
    client: Client,
}

impl PolyHavenClient {
    pub fn new(base_url_str: &str) -> Result<Self, CatalogError> {
        let mut base_url = Url::parse(base_url_str)?;
        // `Url::join` replaces the last segment unless the path ends in '/'.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT_DURATION)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { base_url, client })
    }

    /// Asset types the catalog knows about (`hdris`, `textures`, `models`).
    pub async fn asset_types(&self) -> Result<Vec<String>, CatalogError> {
        let url = self.base_url.join(TYPES_ENDPOINT)?;
        let json = self.get_json(url).await?;
        Ok(serde_json::from_value(json)?)
    }

    /// Category name to asset count for one asset type.
    pub async fn categories(
        &self,
        asset_type: &str,
    ) -> Result<BTreeMap<String, u64>, CatalogError> {
        let url = self
            .base_url
            .join(&format!("{CATEGORIES_ENDPOINT}/{asset_type}"))?;
        let json = self.get_json(url).await?;
        Ok(serde_json::from_value(json)?)
    }

    /// Assets of one type, keyed by asset id. `categories` is a comma-separated filter.
    pub async fn assets(
        &self,
        asset_type: &str,
        categories: Option<&str>,
    ) -> Result<Map<String, Value>, CatalogError> {
        let mut url = self.base_url.join(ASSETS_ENDPOINT)?;
        {
            let mut query = url.query_pairs_mut();
            query.append_pair(ASSET_TYPE_QUERY_KEY, asset_type);
            if let Some(categories) = categories.filter(|c| !c.is_empty()) {
                query.append_pair(CATEGORIES_QUERY_KEY, categories);
            }
        }
        let json = self.get_json(url).await?;
        Ok(serde_json::from_value(json)?)
    }

    /// The file manifest of one asset.
    pub async fn files(&self, asset_id: &str) -> Result<Value, CatalogError> {
        let url = self.base_url.join(&format!("{FILES_ENDPOINT}/{asset_id}"))?;
        self.get_json(url).await
    }

    /// Fetches the manifest for `request.asset_id` and resolves the download.
    pub async fn resolve(&self, request: &DownloadRequest) -> Result<ResolvedAsset, CatalogError> {
        let manifest = self.files(&request.asset_id).await?;
        resolve_download(request, &manifest)
    }

    async fn get_json(&self, url: Url) -> Result<Value, CatalogError> {
        debug!("GET {url}");
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(CatalogError::Server {
                status: HttpStatusCode::from(response.status().as_u16()),
                message: response.text().await.unwrap_or_default(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        Ok(response.json().await?)
    }
}
