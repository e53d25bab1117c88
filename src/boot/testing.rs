//! Scripted collaborators for tests.

use std::cell::{Cell, RefCell};

use serde_json::Value;

use super::{LoadError, LoadOptions, Loader, Renderer};
use crate::circuit::{CONNECT_CIRCUIT, ConnectionState, START_CIRCUIT, Transport, TransportError};
use crate::descriptor::{ComponentKind, RootId, WireRecord};

/// Transport answering handshakes from a script, recording every call.
pub struct ScriptedTransport {
    connected: bool,
    start_response: Result<Value, TransportError>,
    connect_response: Result<Value, TransportError>,
    calls: RefCell<Vec<(String, Vec<Value>)>>,
}

impl ScriptedTransport {
    pub fn new(start_response: Value) -> Self {
        Self {
            connected: true,
            start_response: Ok(start_response),
            connect_response: Ok(Value::Bool(true)),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let error = TransportError::Remote {
            method: START_CIRCUIT.to_string(),
            message: "hub error".to_string(),
        };
        Self {
            start_response: Err(error.clone()),
            connect_response: Err(error),
            ..Self::new(Value::Null)
        }
    }

    pub fn disconnected(mut self) -> Self {
        self.connected = false;
        self
    }

    pub fn with_connect_response(mut self, response: Value) -> Self {
        self.connect_response = Ok(response);
        self
    }

    pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|(m, _)| m == method).count()
    }
}

impl Transport for ScriptedTransport {
    fn state(&self) -> ConnectionState {
        if self.connected {
            ConnectionState::Connected
        } else {
            ConnectionState::Other
        }
    }

    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError> {
        self.calls.borrow_mut().push((method.to_string(), args));
        tokio::task::yield_now().await;
        match method {
            START_CIRCUIT => self.start_response.clone(),
            CONNECT_CIRCUIT => self.connect_response.clone(),
            other => Err(TransportError::Remote {
                method: other.to_string(),
                message: "unknown method".to_string(),
            }),
        }
    }
}

/// Loader counting load attempts.
#[derive(Default)]
pub struct CountingLoader {
    loads: Cell<usize>,
    ready: Cell<bool>,
    fail: bool,
}

impl CountingLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.get()
    }
}

impl Loader for CountingLoader {
    async fn load(&self, options: &LoadOptions) -> Result<(), LoadError> {
        self.loads.set(self.loads.get() + 1);
        // Give interleaved triggers a chance to run
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        if self.fail {
            return Err(LoadError::Fetch {
                resource: options.resource_base.clone(),
                reason: "404".to_string(),
            });
        }
        self.ready.set(true);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.get()
    }
}

/// Renderer recording attach and activate calls.
#[derive(Default)]
pub struct RecordingRenderer {
    pub attached: RefCell<Vec<(ComponentKind, Vec<WireRecord>)>>,
    pub activated: RefCell<Vec<RootId>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn activated(&self) -> Vec<RootId> {
        self.activated.borrow().clone()
    }
}

impl Renderer for RecordingRenderer {
    fn attach(&self, kind: ComponentKind, records: &[WireRecord]) {
        self.attached.borrow_mut().push((kind, records.to_vec()));
    }

    fn activate(&self, id: RootId) {
        self.activated.borrow_mut().push(id);
    }
}
