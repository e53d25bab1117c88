//! Session transport contract.

use serde_json::Value;
use thiserror::Error;

pub const START_CIRCUIT: &str = "StartCircuit";
pub const CONNECT_CIRCUIT: &str = "ConnectCircuit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connected,
    /// Connecting, reconnecting or closed.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("transport is not connected")]
    Disconnected,

    #[error("remote call {method} failed: {message}")]
    Remote { method: String, message: String },
}

/// The persistent connection a circuit runs over.
#[allow(async_fn_in_trait)]
pub trait Transport {
    fn state(&self) -> ConnectionState;

    /// Invoke a remote hub method with positional arguments.
    async fn invoke(&self, method: &str, args: Vec<Value>) -> Result<Value, TransportError>;

    fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }
}
