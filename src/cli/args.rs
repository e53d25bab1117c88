//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::descriptor::ComponentKind;
use crate::marker::StateSource;
use crate::registry::AutoPolicy;

/// Interactive root discovery and boot orchestration for server-rendered pages
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: rootboot.toml)
    #[arg(short = 'C', long, default_value = "rootboot.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Print debug output from every module
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override `[boot] base_uri`
    #[arg(long, global = true)]
    pub base_uri: Option<String>,

    /// Override `[boot] location`
    #[arg(long, global = true)]
    pub location: Option<String>,

    /// Make the dry-run transport report a lost connection
    #[arg(long, global = true)]
    pub disconnected: bool,

    /// Override `[boot.auto] policy`
    #[arg(long, global = true, value_enum)]
    pub auto_policy: Option<AutoPolicy>,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the interactive roots marked in a page
    #[command(visible_alias = "d")]
    Discover {
        /// HTML file to scan
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Only report roots of this kind
        #[arg(short, long, value_enum)]
        kind: Option<ComponentKind>,

        /// Only examine the scan root's direct children
        #[arg(long)]
        direct: bool,

        /// Element tag to scan from (default: the whole document)
        #[arg(short, long)]
        root: Option<String>,
    },

    /// Print the persisted component state of a page
    #[command(visible_alias = "s")]
    State {
        /// HTML file to scan
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,

        /// Which state comment to read
        #[arg(long, value_enum, default_value = "shared")]
        source: StateSource,
    },

    /// Start a circuit for the server roots of a page
    #[command(visible_alias = "h")]
    Handshake {
        /// HTML file to scan
        #[arg(value_hint = clap::ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Boot a page, then replay streaming updates and auto-mode requests
    #[command(visible_alias = "b")]
    Boot {
        #[command(flatten)]
        args: BootArgs,
    },
}

/// Boot command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BootArgs {
    /// Initial page
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub file: PathBuf,

    /// Streamed markup replacing the page body, applied in order
    #[arg(short, long = "update", value_name = "FILE")]
    pub updates: Vec<PathBuf>,

    /// Number of auto-mode component requests to issue after boot
    #[arg(short, long, default_value_t = 0)]
    pub auto: usize,

    /// Reconnect the circuit after all updates
    #[arg(long)]
    pub reconnect: bool,
}
