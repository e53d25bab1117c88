//! Marker comment payloads.
//!
//! ```text
//! <!--Blazor:{"type":"server","sequence":0,"descriptor":"...","prerenderId":"p1"}-->
//!   ...prerendered markup...
//! <!--Blazor:{"prerenderId":"p1"}-->
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::decode::decode_text;
use super::error::ScanError;
use crate::descriptor::{
    ComponentDescriptor, ComponentKind, DescriptorIds, ServerComponentDescriptor,
    WebAssemblyComponentDescriptor,
};
use crate::dom::NodeId;

/// Marker prefix: `Blazor:` then anything up to the JSON object.
static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*Blazor:[^{]*(?P<payload>.*)$").unwrap());

/// JSON text of a marker comment, if `text` is one.
pub fn marker_payload(text: &str) -> Option<&str> {
    MARKER
        .captures(text)
        .and_then(|caps| caps.name("payload"))
        .map(|m| m.as_str())
        .filter(|payload| !payload.is_empty())
}

// =============================================================================
// Payload classification
// =============================================================================

/// What a marker comment declares.
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerPayload {
    /// Start of a component (`type` present).
    Open(OpenMarker),
    /// Close of a prerendered block: exactly `{"prerenderId": "..."}`.
    End { prerender_id: String },
}

/// Parsed open marker, before pairing and validation.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenMarker {
    pub kind: ComponentKind,
    pub prerender_id: Option<String>,
    fields: Map<String, Value>,
}

impl MarkerPayload {
    /// Parse the JSON text of a marker. `comment` is the full comment body
    /// (for error messages).
    pub fn parse(comment: &str, json: &str) -> Result<Self, ScanError> {
        let value: Value =
            serde_json::from_str(json).map_err(|e| ScanError::parse(comment, e.to_string()))?;
        let Value::Object(fields) = value else {
            return Err(ScanError::parse(comment, "payload is not a JSON object"));
        };

        if let Some(prerender_id) = end_marker_id(&fields) {
            return Ok(Self::End { prerender_id });
        }

        let kind = match fields.get("type") {
            Some(Value::String(ty)) => ComponentKind::from_marker_type(ty)
                .ok_or_else(|| ScanError::parse(comment, format!("invalid component type '{ty}'")))?,
            Some(other) => {
                return Err(ScanError::parse(
                    comment,
                    format!("invalid component type '{other}'"),
                ));
            }
            None => return Err(ScanError::parse(comment, "missing component type")),
        };

        let prerender_id = match fields.get("prerenderId") {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) if id.is_empty() => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(other) => {
                return Err(ScanError::parse(
                    comment,
                    format!("prerenderId must be a string, found {other}"),
                ));
            }
        };

        Ok(Self::Open(OpenMarker {
            kind,
            prerender_id,
            fields,
        }))
    }

    /// Whether this is the end marker for `prerender_id`.
    pub fn closes(&self, prerender_id: &str) -> bool {
        matches!(self, Self::End { prerender_id: id } if id == prerender_id)
    }
}

fn end_marker_id(fields: &Map<String, Value>) -> Option<String> {
    if fields.len() != 1 {
        return None;
    }
    match fields.get("prerenderId") {
        Some(Value::String(id)) => Some(id.clone()),
        _ => None,
    }
}

// =============================================================================
// ComponentComment
// =============================================================================

/// A paired marker: open payload plus its DOM boundary.
///
/// Transient: built by the scanner and immediately turned into a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentComment {
    pub marker: OpenMarker,
    pub start: NodeId,
    pub end: Option<NodeId>,
}

impl ComponentComment {
    pub const fn kind(&self) -> ComponentKind {
        self.marker.kind
    }

    /// Validate type-specific fields and build the descriptor.
    pub fn into_descriptor(
        self,
        ids: &mut DescriptorIds,
    ) -> Result<ComponentDescriptor, ScanError> {
        let fields = &self.marker.fields;
        match self.marker.kind {
            ComponentKind::Server => {
                let kind = "server";
                let descriptor = required_string(fields, "descriptor", kind)?;
                let sequence = match fields.get("sequence") {
                    Some(value) => value.as_i64().ok_or_else(|| {
                        ScanError::validation(kind, format!("sequence must be an integer, found {value}"))
                    })?,
                    None => return Err(ScanError::validation(kind, "sequence must be defined")),
                };
                Ok(ServerComponentDescriptor::new(self.start, self.end, sequence, descriptor).into())
            }
            ComponentKind::WebAssembly => {
                let kind = "webassembly";
                let assembly = required_string(fields, "assembly", kind)?;
                let type_name = required_string(fields, "typeName", kind)?;
                let definitions = optional_encoded(fields, "parameterDefinitions", kind)?;
                let values = optional_encoded(fields, "parameterValues", kind)?;

                // The paired end marker only bounds the skipped prerendered
                // content; webassembly descriptors do not keep it.
                let id = ids.assign(self.start);
                Ok(
                    WebAssemblyComponentDescriptor::new(id, self.start, assembly, type_name)
                        .with_parameters(definitions, values)
                        .into(),
                )
            }
        }
    }
}

fn required_string(
    fields: &Map<String, Value>,
    name: &str,
    kind: &'static str,
) -> Result<String, ScanError> {
    match fields.get(name) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        _ => Err(ScanError::validation(
            kind,
            format!("{name} must be a non-empty string"),
        )),
    }
}

fn optional_encoded(
    fields: &Map<String, Value>,
    name: &str,
    kind: &'static str,
) -> Result<Option<String>, ScanError> {
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => decode_text(s)
            .map(Some)
            .map_err(|reason| ScanError::validation(kind, format!("{name}: {reason}"))),
        Some(other) => Err(ScanError::validation(
            kind,
            format!("{name} must be a string, found {other}"),
        )),
    }
}
