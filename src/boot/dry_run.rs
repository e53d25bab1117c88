//! Offline collaborators used by the CLI.
//!
//! The dry-run transport answers handshakes locally: the circuit id is the
//! blake3 hash of the handshake arguments, so the same page always yields the
//! same id.

use std::cell::Cell;

use serde_json::Value;

use super::{LoadError, LoadOptions, Loader, Renderer};
use crate::circuit::{CONNECT_CIRCUIT, ConnectionState, START_CIRCUIT, Transport, TransportError};
use crate::descriptor::{ComponentKind, RootId, WireRecord, records_to_json};

pub struct DryRunTransport {
    connected: bool,
}

impl DryRunTransport {
    pub fn new(connected: bool) -> Self {
        Self { connected }
    }
}

impl Transport for DryRunTransport {
    fn state(&self) -> ConnectionState {
        if self.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Other
        }
    }

    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        crate::debug!("transport"; "{} ({} args)", method, args.len());
        match method {
            START_CIRCUIT => {
                let payload = Value::Array(args).to_string();
                let hash = blake3::hash(payload.as_bytes());
                Ok(Value::from(hex::encode(&hash.as_bytes()[..16])))
            }
            CONNECT_CIRCUIT => Ok(Value::Bool(true)),
            other => Err(TransportError::Remote {
                method: other.to_string(),
                message: "not supported by the dry-run transport".to_string(),
            }),
        }
    }
}

#[derive(Default)]
pub struct DryRunLoader {
    ready: Cell<bool>,
}

impl DryRunLoader {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Loader for DryRunLoader {
    async fn load(&self, options: &LoadOptions) -> Result<(), LoadError> {
        crate::log!(
            "webassembly";
            "loading runtime from {} ({})",
            options.resource_base,
            options.environment
        );
        self.ready.set(true);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }
}

/// Renderer that logs what it would attach.
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn attach(&self, kind: ComponentKind, records: &[WireRecord]) {
        match records_to_json(records) {
            Ok(json) => crate::log!("render"; "attach {}: {}", kind, json),
            Err(e) => crate::log!("error"; "attach {}: {}", kind, e),
        }
    }

    fn activate(&self, id: RootId) {
        crate::log!("render"; "activate {}", id);
    }
}
