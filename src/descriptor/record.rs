//! Minimal wire records.
//!
//! The shape runtimes receive for each root: no DOM anchors, no prerender ids.

use serde::{Deserialize, Serialize};

use super::ComponentDescriptor;

/// Wire form of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WireRecord {
    Server {
        sequence: i64,
        descriptor: String,
    },
    #[serde(rename_all = "camelCase")]
    WebAssembly {
        type_name: String,
        assembly: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        parameter_definitions: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        parameter_values: Option<String>,
    },
}

impl ComponentDescriptor {
    /// Reduce to the minimal wire record.
    pub fn to_record(&self) -> WireRecord {
        match self {
            Self::Server(d) => WireRecord::Server {
                sequence: d.sequence,
                descriptor: d.descriptor.clone(),
            },
            Self::WebAssembly(d) => WireRecord::WebAssembly {
                type_name: d.type_name.clone(),
                assembly: d.assembly.clone(),
                parameter_definitions: d.parameter_definitions.clone(),
                parameter_values: d.parameter_values.clone(),
            },
        }
    }
}

/// Serialize records as a JSON array.
pub fn records_to_json(records: &[WireRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string(records)
}
