//! rootboot - interactive root discovery and boot orchestration for
//! server-rendered pages.

#![allow(dead_code)]

mod boot;
mod circuit;
mod cli;
mod config;
mod descriptor;
mod dom;
mod logger;
mod marker;
mod registry;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::BootConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = BootConfig::load(&cli)?;
    if !config.config_path.as_os_str().is_empty() {
        crate::debug!("config"; "loaded {}", config.config_path.display());
    }

    match &cli.command {
        Commands::Discover {
            file,
            kind,
            direct,
            root,
        } => cli::discover::run_discover(file, *kind, *direct, root.as_deref()),
        Commands::State { file, source } => cli::state::run_state(file, *source),
        Commands::Handshake { file } => block_on(cli::handshake::run_handshake(file, &config)),
        Commands::Boot { args } => block_on(cli::boot::run_boot(args, &config)),
    }
}

/// Drive an async command on a single-threaded runtime.
fn block_on<F: std::future::Future<Output = Result<()>>>(future: F) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(future)
}
