//! Configuration section definitions.
//!
//! Each module corresponds to a section in `rootboot.toml`:
//!
//! | Module      | TOML Section    | Purpose                                 |
//! |-------------|-----------------|-----------------------------------------|
//! | `boot`      | `[boot]`        | Page location, webassembly, auto policy |
//! | `transport` | `[transport]`   | Dry-run transport connection state      |
//! | `log`       | `[log]`         | Verbose output                          |

mod boot;
mod log;
mod transport;

pub use boot::{AutoSectionConfig, BootSectionConfig, WebAssemblySectionConfig};
pub use log::LogConfig;
pub use transport::TransportConfig;
