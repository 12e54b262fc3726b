use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

#[derive(Debug, Parser)]
#[command(
    name = "blender-bridge",
    version,
    about = "Talk to a running Blender instance over its JSON socket",
    long_about = None,
    after_help = r#"EXAMPLES
  $ blender-bridge scene
  $ blender-bridge send-code 'import bpy; print(len(bpy.data.objects))'
  $ blender-bridge send-code --file build_scene.py
  $ blender-bridge assets hdris --categories outdoor
  $ blender-bridge import kloofendal_48d_partly_cloudy --type hdris --resolution 2k

NOTES
  - The Blender add-on must be listening (default: localhost:8765)
  - Connection settings also come from config.json, .env and BLENDER_BRIDGE_* variables"#,
    arg_required_else_help = true
)]
pub struct Cli {
    #[arg(long, global = true, help = "Blender listener host")]
    pub host: Option<String>,

    #[arg(long, global = true, help = "Blender listener port")]
    pub port: Option<u16>,

    #[arg(
        long,
        global = true,
        help = "Give up on an exchange after this many milliseconds"
    )]
    pub timeout_ms: Option<u64>,

    #[arg(
        long,
        global = true,
        help = "Directory holding config.json (default: platform config dir)",
        value_hint = ValueHint::DirPath
    )]
    pub config_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Log at debug level")]
    pub verbose: bool,

    #[arg(
        long,
        global = true,
        help = "Print the tool result as JSON ({\"text\", \"is_error\"})"
    )]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Execute Python code inside Blender")]
    SendCode {
        #[arg(help = "Python source, or '-' to read stdin", conflicts_with = "file")]
        code: Option<String>,

        #[arg(
            long,
            short = 'f',
            help = "Read the Python source from a file",
            value_hint = ValueHint::FilePath
        )]
        file: Option<PathBuf>,
    },

    #[command(about = "Print the current scene and its objects")]
    Scene,

    #[command(about = "Ask Blender to download and append a .blend file")]
    DownloadAsset {
        #[arg(value_name = "NAME")]
        asset_name: String,

        #[arg(value_name = "BLEND_URL")]
        blend_url: String,
    },

    #[command(about = "List Poly Haven asset types")]
    AssetTypes,

    #[command(about = "List Poly Haven categories for an asset type")]
    Categories {
        #[arg(value_name = "TYPE")]
        asset_type: String,
    },

    #[command(about = "List Poly Haven assets of a type")]
    Assets {
        #[arg(value_name = "TYPE")]
        asset_type: String,

        #[arg(long, help = "Comma-separated category filter")]
        categories: Option<String>,
    },

    #[command(about = "Resolve a Poly Haven asset and have Blender import it")]
    Import {
        #[arg(value_name = "ID")]
        asset_id: String,

        #[arg(long = "type", value_name = "TYPE", help = "hdris, models or textures")]
        asset_type: String,

        #[arg(long, help = "Resolution key, e.g. 1k, 2k, 4k")]
        resolution: Option<String>,

        #[arg(long, help = "File format, e.g. hdr, exr, jpg")]
        format: Option<String>,
    },
}
