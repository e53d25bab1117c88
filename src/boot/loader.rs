//! Webassembly payload loading and rendering collaborator contracts.

use thiserror::Error;

use crate::descriptor::{ComponentKind, RootId, WireRecord};

/// Options for loading the webassembly payload (`[boot.webassembly]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    pub environment: String,
    pub resource_base: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            environment: "Production".to_string(),
            resource_base: "_framework/".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("failed to fetch '{resource}': {reason}")]
    Fetch { resource: String, reason: String },

    #[error("webassembly runtime failed to start: {0}")]
    Runtime(String),
}

/// Loads the local-execution payload.
#[allow(async_fn_in_trait)]
pub trait Loader {
    async fn load(&self, options: &LoadOptions) -> Result<(), LoadError>;

    /// Whether a load has completed successfully.
    fn is_ready(&self) -> bool;
}

/// Rendering layer that turns registered roots into live components.
pub trait Renderer {
    /// Hand over the ordered wire records of a runtime.
    fn attach(&self, kind: ComponentKind, records: &[WireRecord]);

    fn activate(&self, id: RootId);
}
