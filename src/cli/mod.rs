//! Command-line interface module.

mod args;
pub mod boot;
pub mod common;
pub mod discover;
pub mod handshake;
pub mod state;

pub use args::{BootArgs, Cli, Commands};
