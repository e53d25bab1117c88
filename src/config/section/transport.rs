//! `[transport]` section configuration.
//!
//! ```toml
//! [transport]
//! connected = true    # Connection state reported by the dry-run transport
//! ```

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub connected: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self { connected: true }
    }
}
