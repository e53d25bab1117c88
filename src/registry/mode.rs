//! Render mode decision.
//!
//! Explicitly typed roots always go to their own runtime. `Auto` roots share
//! one decision for the registry's whole lifetime: the resolver runs on the
//! first auto request and its answer is cached, even if the other runtime
//! becomes available first later on.

use serde::{Deserialize, Serialize};

use crate::descriptor::ComponentKind;

/// Requested activation mode for an interactive root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderMode {
    Server,
    WebAssembly,
    /// Deferred choice, resolved once on first need.
    Auto,
}

impl From<ComponentKind> for RenderMode {
    fn from(kind: ComponentKind) -> Self {
        match kind {
            ComponentKind::Server => Self::Server,
            ComponentKind::WebAssembly => Self::WebAssembly,
        }
    }
}

/// Runtime state visible to the auto resolver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AutoHints {
    /// The webassembly payload has finished loading.
    pub webassembly_ready: bool,
    /// A server session handshake has completed.
    pub server_started: bool,
}

/// Callback deciding where `Auto` roots run.
pub type AutoResolver = Box<dyn FnOnce(&AutoHints) -> ComponentKind>;

/// Built-in auto policies (`[boot.auto] policy`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AutoPolicy {
    /// Always the server runtime.
    Server,
    /// Always the webassembly runtime.
    #[serde(rename = "webassembly")]
    #[value(name = "webassembly")]
    WebAssembly,
    /// Webassembly if its payload is already loaded, server otherwise.
    #[default]
    Readiness,
}

impl AutoPolicy {
    pub fn into_resolver(self) -> AutoResolver {
        match self {
            Self::Server => Box::new(|_: &AutoHints| ComponentKind::Server),
            Self::WebAssembly => Box::new(|_: &AutoHints| ComponentKind::WebAssembly),
            Self::Readiness => Box::new(|hints: &AutoHints| {
                if hints.webassembly_ready {
                    ComponentKind::WebAssembly
                } else {
                    ComponentKind::Server
                }
            }),
        }
    }
}

/// The one-shot auto decision.
pub(super) struct AutoDecision {
    resolver: Option<AutoResolver>,
    decided: Option<ComponentKind>,
}

impl AutoDecision {
    pub(super) fn new(resolver: AutoResolver) -> Self {
        Self {
            resolver: Some(resolver),
            decided: None,
        }
    }

    /// Replace the resolver. Ignored once the decision has been made.
    pub(super) fn replace(&mut self, resolver: AutoResolver) -> bool {
        if self.decided.is_some() {
            return false;
        }
        self.resolver = Some(resolver);
        true
    }

    pub(super) fn decided(&self) -> Option<ComponentKind> {
        self.decided
    }

    pub(super) fn resolve(&mut self, hints: &AutoHints) -> ComponentKind {
        if let Some(kind) = self.decided {
            return kind;
        }
        let resolver = self
            .resolver
            .take()
            .unwrap_or_else(|| AutoPolicy::default().into_resolver());
        let kind = resolver(hints);
        self.decided = Some(kind);
        crate::debug!("mode"; "auto resolved to {}", kind);
        kind
    }
}

impl std::fmt::Debug for AutoDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoDecision")
            .field("pending_resolver", &self.resolver.is_some())
            .field("decided", &self.decided)
            .finish()
    }
}
