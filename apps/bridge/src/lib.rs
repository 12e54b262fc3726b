//! Command-line front end for the Blender bridge.
//!
//! Each subcommand is one tool call: it runs a single exchange (or catalog
//! lookup) and prints the rendered [`tools::ToolText`].

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod tools;
