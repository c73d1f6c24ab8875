//! CLI argument parsing using clap.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Content synchronization engine
#[derive(Parser)]
#[command(
    name = "contentsync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Content synchronization engine",
    long_about = "Keeps the content index, GraphQL schema, and generated client code \
                  consistent with your configuration and content files.",
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom settings.toml file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up the .contentsync directory with a starter configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Run the dev session: reconcile, then watch for changes
    #[command(visible_alias = "server:start")]
    Dev {
        /// Port the local content API listens on [default: 4001]
        #[arg(short, long)]
        port: Option<u16>,

        /// Sub-command to run for the lifetime of the session
        #[arg(short = 'c', long)]
        command: Option<String>,

        /// Project root (defaults to the directory holding .contentsync)
        #[arg(long)]
        root_path: Option<PathBuf>,

        /// Reconcile once and serve without watching for file changes
        #[arg(long)]
        no_watch: bool,

        /// Skip client/type generation entirely
        #[arg(long)]
        no_sdk: bool,
    },

    /// Run one full reconcile and exit
    Generate {
        /// Project root (defaults to the directory holding .contentsync)
        #[arg(long)]
        root_path: Option<PathBuf>,

        /// Skip client/type generation entirely
        #[arg(long)]
        no_sdk: bool,
    },

    /// Show current configuration
    Config,
}
