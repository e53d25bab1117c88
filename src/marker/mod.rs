//! Marker Scanner
//!
//! Discovers interactive roots embedded as comment markers in server-rendered
//! markup, and consumes the persisted-state comment.
//!
//! # Modules
//!
//! - `comment` - Marker prefix matching and payload parsing
//! - `decode` - base64 payload blobs
//! - `error` - `ScanError`
//! - `scan` - Cursor-driven discovery of component markers
//! - `state` - Persisted-state discovery

mod comment;
mod decode;
mod error;
mod scan;
mod state;

pub use comment::{ComponentComment, MarkerPayload, OpenMarker, marker_payload};
pub use error::ScanError;
pub use scan::{discover_all, discover_components};
pub use state::{StateSource, discover_persisted_state};
