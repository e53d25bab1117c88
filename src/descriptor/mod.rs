//! Component descriptors.
//!
//! A descriptor is what the scanner produces for one interactive root: its
//! identity, its DOM anchor and the payload the runtime needs to activate it.
//!
//! # Modules
//!
//! - `ids` - Creation-order id allocation for webassembly descriptors
//! - `merge` - In-place merge of a re-rendered descriptor
//! - `record` - Minimal wire records handed to runtimes

mod ids;
mod merge;
mod record;

pub use ids::DescriptorIds;
pub use merge::MergeError;
pub use record::{WireRecord, records_to_json};

use serde::{Deserialize, Serialize};

use crate::dom::NodeId;

// =============================================================================
// Kinds and identities
// =============================================================================

/// Which runtime a marker targets (the marker's `type` field).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Server,
    #[value(name = "webassembly")]
    WebAssembly,
}

impl ComponentKind {
    pub const ALL: [Self; 2] = [Self::Server, Self::WebAssembly];

    /// The marker `type` string.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::WebAssembly => "webassembly",
        }
    }

    pub fn from_marker_type(s: &str) -> Option<Self> {
        match s {
            "server" => Some(Self::Server),
            "webassembly" => Some(Self::WebAssembly),
            _ => None,
        }
    }
}

impl std::fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registry identity of a descriptor.
///
/// Also the ordering key: server roots sort by sequence, webassembly roots by
/// creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RootId {
    Server(i64),
    WebAssembly(u64),
}

impl RootId {
    pub const fn kind(self) -> ComponentKind {
        match self {
            Self::Server(_) => ComponentKind::Server,
            Self::WebAssembly(_) => ComponentKind::WebAssembly,
        }
    }
}

impl std::fmt::Display for RootId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Server(sequence) => write!(f, "server:{sequence}"),
            Self::WebAssembly(id) => write!(f, "webassembly:{id}"),
        }
    }
}

// =============================================================================
// Descriptors
// =============================================================================

/// A root rendered by a server-driven session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerComponentDescriptor {
    pub(crate) start: NodeId,
    pub(crate) end: Option<NodeId>,
    pub(crate) sequence: i64,
    pub(crate) descriptor: String,
}

impl ServerComponentDescriptor {
    pub fn new(start: NodeId, end: Option<NodeId>, sequence: i64, descriptor: String) -> Self {
        Self {
            start,
            end,
            sequence,
            descriptor,
        }
    }

    pub const fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Opaque, server-protected component descriptor.
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }
}

/// A root executed locally by the webassembly runtime.
///
/// `end` is never assigned by the scanner; see DESIGN.md.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAssemblyComponentDescriptor {
    pub(crate) id: u64,
    pub(crate) start: NodeId,
    pub(crate) end: Option<NodeId>,
    pub(crate) assembly: String,
    pub(crate) type_name: String,
    pub(crate) parameter_definitions: Option<String>,
    pub(crate) parameter_values: Option<String>,
}

impl WebAssemblyComponentDescriptor {
    pub fn new(id: u64, start: NodeId, assembly: String, type_name: String) -> Self {
        Self {
            id,
            start,
            end: None,
            assembly,
            type_name,
            parameter_definitions: None,
            parameter_values: None,
        }
    }

    pub fn with_parameters(mut self, definitions: Option<String>, values: Option<String>) -> Self {
        self.parameter_definitions = definitions;
        self.parameter_values = values;
        self
    }

    pub const fn id(&self) -> u64 {
        self.id
    }

    pub fn assembly(&self) -> &str {
        &self.assembly
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Decoded parameter definitions (JSON text).
    pub fn parameter_definitions(&self) -> Option<&str> {
        self.parameter_definitions.as_deref()
    }

    /// Decoded parameter values (JSON text).
    pub fn parameter_values(&self) -> Option<&str> {
        self.parameter_values.as_deref()
    }
}

/// A discovered interactive root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComponentDescriptor {
    Server(ServerComponentDescriptor),
    WebAssembly(WebAssemblyComponentDescriptor),
}

impl ComponentDescriptor {
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::Server(_) => ComponentKind::Server,
            Self::WebAssembly(_) => ComponentKind::WebAssembly,
        }
    }

    pub const fn id(&self) -> RootId {
        match self {
            Self::Server(d) => RootId::Server(d.sequence),
            Self::WebAssembly(d) => RootId::WebAssembly(d.id),
        }
    }

    /// The permanent DOM anchor.
    pub const fn start(&self) -> NodeId {
        match self {
            Self::Server(d) => d.start,
            Self::WebAssembly(d) => d.start,
        }
    }

    /// Closing marker of a prerendered block.
    pub const fn end(&self) -> Option<NodeId> {
        match self {
            Self::Server(d) => d.end,
            Self::WebAssembly(d) => d.end,
        }
    }

    pub const fn as_server(&self) -> Option<&ServerComponentDescriptor> {
        match self {
            Self::Server(d) => Some(d),
            Self::WebAssembly(_) => None,
        }
    }

    pub const fn as_webassembly(&self) -> Option<&WebAssemblyComponentDescriptor> {
        match self {
            Self::WebAssembly(d) => Some(d),
            Self::Server(_) => None,
        }
    }
}

impl From<ServerComponentDescriptor> for ComponentDescriptor {
    fn from(d: ServerComponentDescriptor) -> Self {
        Self::Server(d)
    }
}

impl From<WebAssemblyComponentDescriptor> for ComponentDescriptor {
    fn from(d: WebAssemblyComponentDescriptor) -> Self {
        Self::WebAssembly(d)
    }
}
