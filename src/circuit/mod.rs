//! Circuit Descriptor
//!
//! One server-driven rendering session. The session id is assigned exactly
//! once (`Uninitialized -> Initialized`); an initialized circuit can be
//! re-attached with [`CircuitDescriptor::reconnect`] any number of times
//! without changing state.
//!
//! The component list sent with the handshake comes either from an explicit
//! list or from the root registry at handshake time.

mod transport;

pub use transport::{CONNECT_CIRCUIT, ConnectionState, START_CIRCUIT, Transport, TransportError};

use std::cell::{OnceCell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use crate::descriptor::{
    ComponentDescriptor, ComponentKind, ServerComponentDescriptor, records_to_json,
};
use crate::dom::NodeId;
use crate::registry::RootRegistry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    #[error("circuit is already initialized as '{existing}', cannot initialize as '{incoming}'")]
    Conflict { existing: String, incoming: String },

    #[error("circuit is not initialized")]
    NotInitialized,

    #[error("no server component with sequence {0} in the circuit")]
    UnknownComponent(i64),

    #[error("cannot serialize component records: {0}")]
    Records(String),
}

/// Where the handshake component list comes from.
#[derive(Debug)]
pub enum ComponentSource {
    /// Fixed list given at construction.
    Explicit(Vec<ServerComponentDescriptor>),
    /// Server entries of the registry, snapshotted at handshake time.
    Managed(Rc<RefCell<RootRegistry>>),
}

/// Page address sent with the handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub base_uri: String,
    pub href: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            base_uri: "https://localhost/".to_string(),
            href: "https://localhost/".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct CircuitDescriptor {
    circuit_id: OnceCell<String>,
    source: ComponentSource,
    application_state: RefCell<String>,
    /// Server descriptors sent with the last handshake.
    components: RefCell<Vec<ServerComponentDescriptor>>,
}

impl CircuitDescriptor {
    pub fn with_components(
        components: Vec<ServerComponentDescriptor>,
        application_state: impl Into<String>,
    ) -> Self {
        Self::from_source(ComponentSource::Explicit(components), application_state.into())
    }

    pub fn managed(
        registry: Rc<RefCell<RootRegistry>>,
        application_state: impl Into<String>,
    ) -> Self {
        Self::from_source(ComponentSource::Managed(registry), application_state.into())
    }

    fn from_source(source: ComponentSource, application_state: String) -> Self {
        Self {
            circuit_id: OnceCell::new(),
            source,
            application_state: RefCell::new(application_state),
            components: RefCell::new(Vec::new()),
        }
    }

    pub fn circuit_id(&self) -> Option<&str> {
        self.circuit_id.get().map(String::as_str)
    }

    pub fn is_initialized(&self) -> bool {
        self.circuit_id.get().is_some()
    }

    pub fn source(&self) -> &ComponentSource {
        &self.source
    }

    pub fn application_state(&self) -> String {
        self.application_state.borrow().clone()
    }

    /// Replace the state blob sent with the next handshake.
    pub fn set_application_state(&self, state: impl Into<String>) {
        *self.application_state.borrow_mut() = state.into();
    }

    // =========================================================================
    // State machine
    // =========================================================================

    /// Assign the session id. Fails if one is already set.
    pub fn initialize(&self, circuit_id: impl Into<String>) -> Result<(), CircuitError> {
        self.circuit_id
            .set(circuit_id.into())
            .map_err(|incoming| CircuitError::Conflict {
                existing: self.circuit_id.get().cloned().unwrap_or_default(),
                incoming,
            })
    }

    /// Handshake: ask the server for a session id.
    ///
    /// Returns `Ok(false)` when the transport is not connected or the server
    /// does not hand back an id. Only an id conflict is an error.
    pub async fn start_circuit<T: Transport>(
        &self,
        transport: &T,
        location: &Location,
    ) -> Result<bool, CircuitError> {
        if !transport.is_connected() {
            crate::log!("circuit"; "cannot start circuit: transport not connected");
            return Ok(false);
        }

        let components = self.collect_components();
        let records: Vec<_> = components
            .iter()
            .map(|d| ComponentDescriptor::Server(d.clone()).to_record())
            .collect();
        let records_json =
            records_to_json(&records).map_err(|e| CircuitError::Records(e.to_string()))?;
        let args = vec![
            Value::from(location.base_uri.as_str()),
            Value::from(location.href.as_str()),
            Value::from(records_json),
            Value::from(self.application_state()),
        ];
        *self.components.borrow_mut() = components;

        crate::debug!("circuit"; "starting with {} component(s)", records.len());
        let circuit_id = match transport.invoke(START_CIRCUIT, args).await {
            Ok(Value::String(id)) if !id.is_empty() => id,
            Ok(other) => {
                crate::log!("circuit"; "start rejected: no circuit id (got {})", other);
                return Ok(false);
            }
            Err(e) => {
                crate::log!("circuit"; "start failed: {}", e);
                return Ok(false);
            }
        };

        self.initialize(circuit_id)?;
        crate::debug!("circuit"; "initialized {}", self.circuit_id().unwrap_or_default());
        Ok(true)
    }

    /// Re-attach an initialized circuit to a (new) connection.
    ///
    /// Never changes state. Transport failures degrade to `Ok(false)`.
    pub async fn reconnect<T: Transport>(&self, transport: &T) -> Result<bool, CircuitError> {
        let circuit_id = self
            .circuit_id
            .get()
            .cloned()
            .ok_or(CircuitError::NotInitialized)?;

        if !transport.is_connected() {
            crate::log!("circuit"; "cannot reconnect {}: transport not connected", circuit_id);
            return Ok(false);
        }

        match transport
            .invoke(CONNECT_CIRCUIT, vec![Value::from(circuit_id.as_str())])
            .await
        {
            Ok(Value::Bool(accepted)) => {
                crate::debug!("circuit"; "reconnect {}: {}", circuit_id, accepted);
                Ok(accepted)
            }
            Ok(other) => {
                crate::log!("circuit"; "reconnect {}: unexpected result {}", circuit_id, other);
                Ok(false)
            }
            Err(e) => {
                crate::log!("circuit"; "reconnect {} failed: {}", circuit_id, e);
                Ok(false)
            }
        }
    }

    /// Start anchor of the handshake component with this sequence.
    pub fn resolve_element(&self, sequence: i64) -> Result<NodeId, CircuitError> {
        self.components
            .borrow()
            .iter()
            .find(|d| d.sequence() == sequence)
            .map(|d| d.start)
            .ok_or(CircuitError::UnknownComponent(sequence))
    }

    fn collect_components(&self) -> Vec<ServerComponentDescriptor> {
        let mut components = match &self.source {
            ComponentSource::Explicit(list) => list.clone(),
            ComponentSource::Managed(registry) => registry
                .borrow()
                .snapshot(ComponentKind::Server)
                .into_iter()
                .filter_map(|d| d.as_server().cloned())
                .collect(),
        };
        components.sort_by_key(ServerComponentDescriptor::sequence);
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boot::testing::ScriptedTransport;
    use crate::dom::Dom;

    fn location() -> Location {
        Location {
            base_uri: "https://localhost/".to_string(),
            href: "https://localhost/counter".to_string(),
        }
    }

    fn components(dom: &mut Dom) -> Vec<ServerComponentDescriptor> {
        let body = dom.append_element(dom.document(), "body");
        let a = dom.append_comment(body, "a");
        let b = dom.append_comment(body, "b");
        vec![
            ServerComponentDescriptor::new(b, None, 1, "B".to_string()),
            ServerComponentDescriptor::new(a, None, 0, "A".to_string()),
        ]
    }

    #[test]
    fn test_initialize_once() {
        let circuit = CircuitDescriptor::with_components(Vec::new(), "");
        assert!(!circuit.is_initialized());
        circuit.initialize("c1").unwrap();
        assert_eq!(circuit.circuit_id(), Some("c1"));

        let err = circuit.initialize("c2").unwrap_err();
        assert_eq!(
            err,
            CircuitError::Conflict {
                existing: "c1".to_string(),
                incoming: "c2".to_string()
            }
        );
        assert_eq!(circuit.circuit_id(), Some("c1"));
    }

    #[tokio::test]
    async fn test_start_circuit_sends_handshake() {
        let mut dom = Dom::new();
        let circuit = CircuitDescriptor::with_components(components(&mut dom), "c3RhdGU=");
        let transport = ScriptedTransport::new(Value::from("circuit-1"));

        assert!(circuit.start_circuit(&transport, &location()).await.unwrap());
        assert_eq!(circuit.circuit_id(), Some("circuit-1"));

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        let (method, args) = &calls[0];
        assert_eq!(method, START_CIRCUIT);
        assert_eq!(args[0], "https://localhost/");
        assert_eq!(args[1], "https://localhost/counter");
        assert_eq!(
            args[2],
            r#"[{"type":"server","sequence":0,"descriptor":"A"},{"type":"server","sequence":1,"descriptor":"B"}]"#
        );
        assert_eq!(args[3], "c3RhdGU=");
    }

    #[tokio::test]
    async fn test_start_circuit_disconnected() {
        let circuit = CircuitDescriptor::with_components(Vec::new(), "");
        let transport = ScriptedTransport::new(Value::from("circuit-1")).disconnected();

        assert!(!circuit.start_circuit(&transport, &location()).await.unwrap());
        assert!(!circuit.is_initialized());
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_start_circuit_without_id() {
        for response in [Value::Null, Value::from(""), Value::from(42)] {
            let circuit = CircuitDescriptor::with_components(Vec::new(), "");
            let transport = ScriptedTransport::new(response);
            assert!(!circuit.start_circuit(&transport, &location()).await.unwrap());
            assert!(!circuit.is_initialized());
        }

        let circuit = CircuitDescriptor::with_components(Vec::new(), "");
        let transport = ScriptedTransport::failing();
        assert!(!circuit.start_circuit(&transport, &location()).await.unwrap());
    }

    #[tokio::test]
    async fn test_start_circuit_twice_conflicts() {
        let circuit = CircuitDescriptor::with_components(Vec::new(), "");
        let transport = ScriptedTransport::new(Value::from("circuit-1"));

        assert!(circuit.start_circuit(&transport, &location()).await.unwrap());
        let err = circuit.start_circuit(&transport, &location()).await.unwrap_err();
        assert!(matches!(err, CircuitError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_managed_snapshot_at_handshake() {
        let mut dom = Dom::new();
        let list = components(&mut dom);
        let registry = Rc::new(RefCell::new(RootRegistry::default()));
        let circuit = CircuitDescriptor::managed(registry.clone(), "");

        // Registered after construction, before the handshake
        for d in list {
            registry.borrow_mut().register(d.into()).unwrap();
        }
        let transport = ScriptedTransport::new(Value::from("circuit-1"));
        assert!(circuit.start_circuit(&transport, &location()).await.unwrap());

        let calls = transport.calls();
        let json = calls[0].1[2].as_str().unwrap().to_string();
        assert!(json.contains(r#""sequence":0"#) && json.contains(r#""sequence":1"#));
        assert!(circuit.resolve_element(1).is_ok());
        assert_eq!(
            circuit.resolve_element(9).unwrap_err(),
            CircuitError::UnknownComponent(9)
        );
    }

    #[tokio::test]
    async fn test_reconnect() {
        let circuit = CircuitDescriptor::with_components(Vec::new(), "");
        let transport = ScriptedTransport::new(Value::from("circuit-1"));

        assert_eq!(
            circuit.reconnect(&transport).await.unwrap_err(),
            CircuitError::NotInitialized
        );

        circuit.initialize("circuit-1").unwrap();
        assert!(circuit.reconnect(&transport).await.unwrap());
        assert!(circuit.reconnect(&transport).await.unwrap());
        assert_eq!(circuit.circuit_id(), Some("circuit-1"));

        let (method, args) = &transport.calls()[0];
        assert_eq!(method, CONNECT_CIRCUIT);
        assert_eq!(args[0], "circuit-1");

        let refused = ScriptedTransport::new(Value::Null).with_connect_response(Value::Bool(false));
        assert!(!circuit.reconnect(&refused).await.unwrap());

        let offline = ScriptedTransport::new(Value::Null).disconnected();
        assert!(!circuit.reconnect(&offline).await.unwrap());
    }
}
