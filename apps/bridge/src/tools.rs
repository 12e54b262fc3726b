//! Converts settled exchanges into the text a tool-calling front end shows.
//!
//! The protocol core treats replies as opaque. Only this layer looks at the
//! add-on's `status` / `error` / `result` keys, and only for presentation.

use bridge_core::error::{CatalogError, ProtocolError};

use serde::Serialize;
use serde_json::Value;

const STATUS_KEY: &str = "status";
const ERROR_KEY: &str = "error";
const MESSAGE_KEY: &str = "message";
const TRACEBACK_KEY: &str = "traceback";
const RESULT_KEY: &str = "result";
const WARNINGS_KEY: &str = "warnings";
const DETAILS_KEY: &str = "details";
const STATUS_ERROR: &str = "error";
const STATUS_EXECUTED: &str = "executed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolText {
    pub text: String,
    pub is_error: bool,
}

impl ToolText {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SendCode,
    FetchScene,
    DownloadAsset,
    ImportAsset,
}

impl Operation {
    fn label(self) -> &'static str {
        match self {
            Operation::SendCode => "Code execution",
            Operation::FetchScene => "Scene fetch",
            Operation::DownloadAsset => "Asset download",
            Operation::ImportAsset => "Asset import",
        }
    }
}

/// Renders the outcome of one exchange.
pub fn render(operation: Operation, result: Result<Value, ProtocolError>) -> ToolText {
    match result {
        Ok(value) => render_reply(operation, &value),
        Err(error) => render_failure(operation, &error),
    }
}

/// Renders a catalog listing (types, categories, assets) as pretty JSON.
pub fn render_catalog<T: Serialize>(what: &str, result: Result<T, CatalogError>) -> ToolText {
    match result {
        Ok(listing) => match serde_json::to_string_pretty(&listing) {
            Ok(json) => ToolText::success(format!("{what}:\n{json}")),
            Err(e) => ToolText::failure(format!("Failed to format {what}: {e}")),
        },
        Err(CatalogError::Server { status, .. }) if status.is_not_found() => {
            ToolText::failure(format!("Failed to fetch {what}: not found in the catalog"))
        }
        Err(e) => ToolText::failure(format!("Failed to fetch {what}: {e}")),
    }
}

fn render_failure(operation: Operation, error: &ProtocolError) -> ToolText {
    let label = operation.label();
    let text = match error {
        ProtocolError::Transport { message, .. } => format!(
            "{label} failed: could not reach Blender ({message}). \
             Is the MCP server started from the Blender sidebar?"
        ),
        ProtocolError::Timeout { timeout_ms, .. } => {
            format!("{label} failed: Blender did not respond within {timeout_ms}ms")
        }
        ProtocolError::MalformedResponse { raw, .. } => {
            format!("{label} failed: Blender sent a response that is not valid JSON:\n{raw}")
        }
        ProtocolError::NoResponse { .. } => {
            format!("{label} failed: Blender closed the connection without responding")
        }
        ProtocolError::Encode { message, .. } | ProtocolError::Validation { message, .. } => {
            format!("{label} failed: invalid request: {message}")
        }
    };
    ToolText::failure(text)
}

fn render_reply(operation: Operation, value: &Value) -> ToolText {
    if let Some(error) = remote_error(value) {
        let mut text = format!("{} failed: {error}", operation.label());
        if let Some(message) = string_field(value, MESSAGE_KEY) {
            text.push_str(&format!("\n{message}"));
        }
        if let Some(traceback) = string_field(value, TRACEBACK_KEY) {
            text.push_str(&format!("\nTraceback:\n{traceback}"));
        }
        return ToolText::failure(text);
    }

    match operation {
        Operation::SendCode if string_field(value, STATUS_KEY) == Some(STATUS_EXECUTED) => {
            let mut text = String::from("Code executed successfully");
            match string_field(value, RESULT_KEY) {
                Some(output) if !output.trim().is_empty() => {
                    text.push_str(&format!("\nOutput:\n{output}"))
                }
                _ => {}
            }
            if let Some(warnings) = string_field(value, WARNINGS_KEY) {
                text.push_str(&format!("\nWarnings:\n{warnings}"));
            }
            ToolText::success(text)
        }
        Operation::DownloadAsset | Operation::ImportAsset => {
            let mut text = string_field(value, MESSAGE_KEY)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} completed", operation.label()));
            if let Some(details) = value.get(DETAILS_KEY) {
                text.push_str(&format!("\nDetails:\n{}", pretty(details)));
            }
            ToolText::success(text)
        }
        Operation::FetchScene => ToolText::success(format!("Scene information:\n{}", pretty(value))),
        Operation::SendCode => ToolText::success(format!("Blender replied:\n{}", pretty(value))),
    }
}

/// `status == "error"`, or a bare `error` string with no status (scene errors look like that).
fn remote_error(value: &Value) -> Option<&str> {
    match string_field(value, STATUS_KEY) {
        Some(STATUS_ERROR) => Some(string_field(value, ERROR_KEY).unwrap_or("unknown error")),
        Some(_) => None,
        None => string_field(value, ERROR_KEY),
    }
}

fn string_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
