//! Configuration management for `rootboot.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── boot       # [boot], [boot.webassembly], [boot.auto]
//! │   ├── log        # [log]
//! │   └── transport  # [transport]
//! ├── error          # ConfigError
//! ├── util           # Config file search, location resolution
//! └── mod.rs         # BootConfig (this file)
//! ```
//!
//! A missing config file is not an error: every section has defaults, and
//! command-line flags override whatever the file says.

pub mod section;
mod error;
mod util;

pub use error::ConfigError;
pub use section::{
    AutoSectionConfig, BootSectionConfig, LogConfig, TransportConfig, WebAssemblySectionConfig,
};

use util::{find_config_file, resolve_location};

use crate::boot::{BootOptions, LoadOptions};
use crate::circuit::Location;
use crate::cli::Cli;
use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing rootboot.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootConfig {
    /// Path of the loaded config file, empty when none was found
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub boot: BootSectionConfig,

    #[serde(default)]
    pub transport: TransportConfig,

    #[serde(default)]
    pub log: LogConfig,
}

impl BootConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file, then applies CLI
    /// overrides and validates the result.
    pub fn load(cli: &Cli) -> Result<Self> {
        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)
                    .with_context(|| format!("Failed to load {}", path.display()))?;
                config.config_path = path;
                config
            }
            None => Self::default(),
        };

        config.apply_cli(cli);
        config.validate()?;
        crate::logger::set_verbose(config.log.verbose);
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply global CLI overrides.
    fn apply_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.boot.base_uri, cli.base_uri.as_ref());
        Self::update_option(&mut self.boot.location, cli.location.as_ref());
        Self::update_option(&mut self.boot.auto.policy, cli.auto_policy.as_ref());
        if cli.disconnected {
            self.transport.connected = false;
        }
        if cli.verbose {
            self.log.verbose = true;
        }
    }

    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    pub fn validate(&self) -> Result<(), ConfigError> {
        if resolve_location(&self.boot.base_uri, "").is_none() {
            return Err(ConfigError::Validation(format!(
                "[boot] base_uri must be an absolute URL, found '{}'",
                self.boot.base_uri
            )));
        }
        if resolve_location(&self.boot.base_uri, &self.boot.location).is_none() {
            return Err(ConfigError::Validation(format!(
                "[boot] location '{}' cannot be resolved against '{}'",
                self.boot.location, self.boot.base_uri
            )));
        }
        if self.boot.webassembly.resource_base.is_empty() {
            return Err(ConfigError::Validation(
                "[boot.webassembly] resource_base must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Orchestrator options derived from `[boot]`.
    pub fn boot_options(&self) -> BootOptions {
        let href = resolve_location(&self.boot.base_uri, &self.boot.location)
            .unwrap_or_else(|| self.boot.location.clone());
        BootOptions {
            location: Location {
                base_uri: self.boot.base_uri.clone(),
                href,
            },
            load: LoadOptions {
                environment: self.boot.webassembly.environment.clone(),
                resource_base: self.boot.webassembly.resource_base.clone(),
            },
        }
    }
}

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> BootConfig {
    let (parsed, ignored) = BootConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

// ============================================================================
// tests
// ============================================================================
