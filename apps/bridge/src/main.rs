use blender_bridge::cli::Cli;
use blender_bridge::commands::{resolve_config, run};
use blender_bridge::error::BridgeError;
use blender_bridge::logger::{DEFAULT_LOG_LEVEL, initialize};
use blender_bridge::tools::ToolText;

use bridge_core::config::default_log_dir;

use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, error};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        DEFAULT_LOG_LEVEL
    };
    if let Err(e) = initialize(default_log_dir().as_deref(), level) {
        eprintln!("{e}");
    }

    match execute(&cli).await {
        Ok(tool_text) => {
            print_tool_text(&tool_text, cli.json);
            if tool_text.is_error {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(2)
        }
    }
}

async fn execute(cli: &Cli) -> Result<ToolText, BridgeError> {
    let config = resolve_config(cli)?;
    run(&cli.command, &config).await
}

fn print_tool_text(tool_text: &ToolText, as_json: bool) {
    if as_json {
        match serde_json::to_string(tool_text) {
            Ok(json) => println!("{json}"),
            Err(_) => println!("{}", tool_text.text),
        }
    } else {
        println!("{}", tool_text.text);
    }
}
