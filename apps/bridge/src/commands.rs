//! Runs one CLI subcommand against Blender or the Poly Haven catalog.

use crate::cli::{Cli, Command};
use crate::error::BridgeError;
use crate::tools::{Operation, ToolText, render, render_catalog};

use bridge_core::BlenderClient;
use bridge_core::catalog::{DownloadRequest, PolyHavenClient};
use bridge_core::config::env::load_dotenv;
use bridge_core::config::{BridgeConfig, default_config_dir};

use common::ErrorLocation;

use std::io::{Read, stdin};
use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, info};

const STDIN_MARKER: &str = "-";

/// Builds the effective config: `config.json`, then `.env` and environment, then CLI flags.
///
/// # Errors
///
/// Returns [`BridgeError::Core`] if any layer fails to parse or the result does not validate.
pub fn resolve_config(cli: &Cli) -> Result<BridgeConfig, BridgeError> {
    let config = match config_dir(cli) {
        Some(dir) => BridgeConfig::load(&dir)?,
        None => BridgeConfig::default(),
    };

    load_dotenv();
    let config = apply_flags(config.with_env_overrides()?, cli);
    config.validate()?;

    debug!(
        "Effective config: {} (timeout {}ms), catalog {}",
        config.connection.address(),
        config.connection.timeout_ms,
        config.catalog.base_url
    );
    Ok(config)
}

fn config_dir(cli: &Cli) -> Option<PathBuf> {
    cli.config_dir.clone().or_else(default_config_dir)
}

/// Command-line flags win over every other source.
pub fn apply_flags(mut config: BridgeConfig, cli: &Cli) -> BridgeConfig {
    if let Some(host) = &cli.host {
        config.connection.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.connection.port = port;
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.connection.timeout_ms = timeout_ms;
    }
    config
}

/// Runs the subcommand and renders its outcome.
///
/// Failed exchanges and catalog lookups come back as error tool text, not `Err`.
///
/// # Errors
///
/// Returns [`BridgeError`] for unusable input (unreadable code file, missing code)
/// or an unusable catalog URL.
pub async fn run(command: &Command, config: &BridgeConfig) -> Result<ToolText, BridgeError> {
    let blender = BlenderClient::new(config.connection.clone());

    let text = match command {
        Command::SendCode { code, file } => {
            let source = read_code(code.as_deref(), file.as_deref())?;
            render(Operation::SendCode, blender.send_code(&source).await)
        }
        Command::Scene => render(Operation::FetchScene, blender.fetch_scene().await),
        Command::DownloadAsset {
            asset_name,
            blend_url,
        } => render(
            Operation::DownloadAsset,
            blender.download_asset(asset_name, blend_url).await,
        ),
        Command::AssetTypes => {
            let catalog = PolyHavenClient::new(&config.catalog.base_url)?;
            render_catalog("Asset types", catalog.asset_types().await)
        }
        Command::Categories { asset_type } => {
            let catalog = PolyHavenClient::new(&config.catalog.base_url)?;
            render_catalog(
                &format!("Categories for {asset_type}"),
                catalog.categories(asset_type).await,
            )
        }
        Command::Assets {
            asset_type,
            categories,
        } => {
            let catalog = PolyHavenClient::new(&config.catalog.base_url)?;
            render_catalog(
                &format!("Assets of type {asset_type}"),
                catalog.assets(asset_type, categories.as_deref()).await,
            )
        }
        Command::Import {
            asset_id,
            asset_type,
            resolution,
            format,
        } => {
            let catalog = PolyHavenClient::new(&config.catalog.base_url)?;
            let request = DownloadRequest {
                asset_id: asset_id.clone(),
                asset_type: asset_type.clone(),
                resolution: resolution.clone(),
                format: format.clone(),
            };
            match catalog.resolve(&request).await {
                Ok(resolved) => {
                    info!("Importing {asset_id} from {}", resolved.url);
                    render(
                        Operation::ImportAsset,
                        blender.push_asset_data(resolved.into_request()).await,
                    )
                }
                Err(e) => ToolText::failure(format!("Asset import failed: {e}")),
            }
        }
    };

    Ok(text)
}

/// Picks the code to run from the positional argument, `--file`, or stdin (`-`).
///
/// # Errors
///
/// Returns [`BridgeError::Input`] if neither source is given or the source cannot be read.
pub fn read_code(code: Option<&str>, file: Option<&Path>) -> Result<String, BridgeError> {
    match (code, file) {
        (_, Some(path)) => std::fs::read_to_string(path).map_err(|e| BridgeError::Input {
            message: format!("Failed to read {}: {e}", path.display()),
            location: ErrorLocation::from(Location::caller()),
        }),
        (Some(STDIN_MARKER), None) => {
            let mut source = String::new();
            stdin()
                .read_to_string(&mut source)
                .map_err(|e| BridgeError::Input {
                    message: format!("Failed to read code from stdin: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                })?;
            Ok(source)
        }
        (Some(code), None) => Ok(code.to_string()),
        (None, None) => Err(BridgeError::Input {
            message: "no code given: pass it as an argument, with --file, or '-' for stdin"
                .to_string(),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
