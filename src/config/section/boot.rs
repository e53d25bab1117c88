//! `[boot]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [boot]
//! base_uri = "https://localhost/"   # Document base URI sent with the handshake
//! location = "https://localhost/"   # Page location (relative to base_uri allowed)
//!
//! [boot.webassembly]
//! environment = "Production"
//! resource_base = "_framework/"
//!
//! [boot.auto]
//! policy = "readiness"              # server | webassembly | readiness
//! ```

use serde::{Deserialize, Serialize};

use crate::registry::AutoPolicy;

/// Page and runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootSectionConfig {
    /// Absolute base URI of the page.
    pub base_uri: String,

    /// Page location, resolved against `base_uri`.
    pub location: String,

    pub webassembly: WebAssemblySectionConfig,

    pub auto: AutoSectionConfig,
}

impl Default for BootSectionConfig {
    fn default() -> Self {
        Self {
            base_uri: "https://localhost/".to_string(),
            location: "https://localhost/".to_string(),
            webassembly: WebAssemblySectionConfig::default(),
            auto: AutoSectionConfig::default(),
        }
    }
}

/// Webassembly payload loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebAssemblySectionConfig {
    /// Hosting environment name passed to the runtime.
    pub environment: String,

    /// Where runtime resources are fetched from.
    pub resource_base: String,
}

impl Default for WebAssemblySectionConfig {
    fn default() -> Self {
        Self {
            environment: "Production".to_string(),
            resource_base: "_framework/".to_string(),
        }
    }
}

/// Auto render mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSectionConfig {
    pub policy: AutoPolicy,
}
