//! Logging for the blender-bridge binary.
//!
//! Colored stderr plus an optional plain log file. Stdout is reserved for
//! tool output, so nothing here writes to it.

use crate::error::BridgeError;

use common::ErrorLocation;

use std::io::stderr;
use std::path::Path;
use std::sync::Once;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

use fern::Dispatch;
use fern::colors::Color::{Blue, Green, Magenta, Red, Yellow};
use fern::colors::ColoredLevelConfig;
use humantime::format_rfc3339;
use log::{LevelFilter, info, warn};

/// Thread-safe initialization guard.
static INIT_LOGGER_ONCE: Once = Once::new();

/// Tracks if logger initialization was already attempted.
static LOGGER_ALREADY_CALLED: AtomicBool = AtomicBool::new(false);

const LOG_FILE_NAME: &str = "blender-bridge.log";

const LOGGER_INITIALIZED_MESSAGE_PREFIX: &str = "Logger initialized with level: ";

const LOGGER_ALREADY_INITIALIZED_MESSAGE: &str = "Logger already initialized";

/// Default log level for debug builds.
#[cfg(debug_assertions)]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Debug;

/// Default log level for release builds.
#[cfg(not(debug_assertions))]
pub const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Initialize the logger: stderr always, `{log_dir}/blender-bridge.log` when a directory is given.
///
/// Safe to call more than once; later calls log a warning and return Ok.
///
/// # Errors
///
/// Returns an error if the log file cannot be created or the dispatch cannot be installed.
pub fn initialize(log_dir: Option<&Path>, level: LevelFilter) -> Result<(), BridgeError> {
    if LOGGER_ALREADY_CALLED.swap(true, Ordering::SeqCst) {
        warn!("{LOGGER_ALREADY_INITIALIZED_MESSAGE}");
        return Ok(());
    }

    let mut result = Ok(());

    INIT_LOGGER_ONCE.call_once(|| {
        result = initialize_internal(log_dir, level);
        if result.is_ok() {
            info!("{LOGGER_INITIALIZED_MESSAGE_PREFIX}{level:?}");
        }
    });

    result
}

#[track_caller]
fn initialize_internal(log_dir: Option<&Path>, level: LevelFilter) -> Result<(), BridgeError> {
    let color_configuration = ColoredLevelConfig::new()
        .debug(Blue)
        .info(Green)
        .warn(Yellow)
        .error(Red)
        .trace(Magenta);

    let stderr_dispatch = Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "[{date} - {level}] {message} [{target}]",
                date = format_rfc3339(SystemTime::now()),
                level = color_configuration.color(record.level()),
                message = message,
                target = record.target(),
            ))
        })
        .chain(stderr());

    let mut base_dispatch = Dispatch::new()
        .level(level)
        // HTTP internals drown out exchange logs at debug level.
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Info)
        .chain(stderr_dispatch);

    if let Some(log_dir) = log_dir {
        std::fs::create_dir_all(log_dir).map_err(|e| BridgeError::Bridge {
            message: format!("Failed to create log directory {}: {e}", log_dir.display()),
            location: ErrorLocation::from(std::panic::Location::caller()),
        })?;

        let file_dispatch = Dispatch::new()
            .format(move |out, message, record| {
                out.finish(format_args!(
                    "[{date} - {level}] {message} [{file}:{line}]",
                    date = format_rfc3339(SystemTime::now()),
                    level = record.level(),
                    message = message,
                    file = record.file().unwrap_or("unknown"),
                    line = record.line().unwrap_or(0)
                ))
            })
            .chain(
                fern::log_file(log_dir.join(LOG_FILE_NAME)).map_err(|e| BridgeError::Bridge {
                    message: format!("Failed to create log file: {e}"),
                    location: ErrorLocation::from(std::panic::Location::caller()),
                })?,
            );
        base_dispatch = base_dispatch.chain(file_dispatch);
    }

    base_dispatch.apply().map_err(|e| BridgeError::Bridge {
        message: format!("Failed to initialize logger: {e}"),
        location: ErrorLocation::from(std::panic::Location::caller()),
    })?;

    Ok(())
}
