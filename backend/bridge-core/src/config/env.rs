//! Environment overrides for [`BridgeConfig`].
//!
//! Variables are read after an optional `.env` file has been loaded from the
//! working directory or from next to the executable.

use crate::config::BridgeConfig;
use crate::error::config::ConfigError;

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::PathBuf;

use log::{debug, info, warn};

pub const ENV_HOST: &str = "BLENDER_BRIDGE_HOST";
pub const ENV_PORT: &str = "BLENDER_BRIDGE_PORT";
pub const ENV_TIMEOUT_MS: &str = "BLENDER_BRIDGE_TIMEOUT_MS";
pub const ENV_CATALOG_URL: &str = "POLYHAVEN_BASE_URL";

/// Attempts to load `.env` from known locations. Returns the file used, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {:?}", path);
        return Some(path);
    }

    let exe_path = env::current_exe().ok()?;
    let env_path = exe_path.parent()?.join(".env");
    if !env_path.exists() {
        return None;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => {
            info!("Loaded .env from: {:?}", env_path);
            Some(env_path)
        }
        Err(e) => {
            warn!("Failed to parse .env at {:?}: {}", env_path, e);
            None
        }
    }
}

impl BridgeConfig {
    /// Applies `BLENDER_BRIDGE_*` / `POLYHAVEN_BASE_URL` from the process environment.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if a variable does not parse or the result fails validation.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|name| env::var(name).ok())
    }

    /// Applies overrides from an arbitrary lookup. Empty values are ignored.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(host) = get(ENV_HOST) {
            debug!("{ENV_HOST} override: {host}");
            self.connection.host = host;
        }

        if let Some(port) = get(ENV_PORT) {
            self.connection.port = parse_number(ENV_PORT, &port)?;
            debug!("{ENV_PORT} override: {}", self.connection.port);
        }

        if let Some(timeout) = get(ENV_TIMEOUT_MS) {
            self.connection.timeout_ms = parse_number(ENV_TIMEOUT_MS, &timeout)?;
            debug!("{ENV_TIMEOUT_MS} override: {}", self.connection.timeout_ms);
        }

        if let Some(url) = get(ENV_CATALOG_URL) {
            debug!("{ENV_CATALOG_URL} override: {url}");
            self.catalog.base_url = url;
        }

        self.validate()?;
        Ok(self)
    }
}

#[track_caller]
fn parse_number<T>(variable: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::EnvOverride {
            location: ErrorLocation::from(Location::caller()),
            variable,
            reason: format!("{value:?}: {e}"),
        })
}
