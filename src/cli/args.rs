//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// pagewright: on-demand page build-and-render engine
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: pagewright.toml)
    #[arg(short = 'C', long, default_value = "pagewright.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short = 'V', long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start the development server with live reload
    #[command(visible_alias = "s")]
    Serve {
        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Rebuild pages when their sources change
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,

        /// Reload browsers after a rebuild
        #[arg(short, long = "live-reload", action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        live_reload: Option<bool>,
    },

    /// Prebuild every page under `build.pages`
    #[command(visible_alias = "b")]
    Build,

    /// Render one page to stdout
    #[command(visible_alias = "r")]
    Render {
        /// Route of the page (e.g., /blog/post)
        route: String,

        /// Render locals as a JSON object
        #[arg(long)]
        locals: Option<String>,

        /// Print only the rendered html, without document shell or scripts
        #[arg(long)]
        email: bool,
    },
}
