//! Boot Orchestrator
//!
//! Single decision point for starting the two runtimes. A [`BootContext`] is
//! built once by the entry point and driven by page events:
//!
//! ```text
//! boot(dom) ──► persisted state ──► InitialScan
//!                                       │
//! StreamingUpdate / EnhancedNavigation ─┤
//!                                       ▼
//!                           registry.reconcile(dom)
//!                                       │
//!                  ┌────────────────────┴───────────────────┐
//!                  ▼                                        ▼
//!        server guard (handshake)              webassembly guard (load)
//!                  │                                        │
//!                  └──────► renderer.attach / activate ◄────┘
//! ```
//!
//! Each runtime starts at most once. Triggers that arrive while a start is in
//! flight await it and observe the same outcome, including a failure.
//!
//! A rejected server handshake is not an event failure: server roots stay
//! pending, the server phase reads `failed`, and webassembly roots keep
//! booting. Only an explicit `request_mode` for the server reports it.
//!
//! # Modules
//!
//! - `guard` - `StartGuard`, the at-most-once start cell
//! - `loader` - `Loader` and `Renderer` contracts
//! - `dry_run` - Offline collaborators for the CLI

mod dry_run;
mod guard;
mod loader;

#[cfg(test)]
pub mod testing;

pub use dry_run::{DryRunLoader, DryRunTransport, LogRenderer};
pub use guard::{StartGuard, StartPhase};
pub use loader::{LoadError, LoadOptions, Loader, Renderer};

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde::Serialize;
use thiserror::Error;

use crate::circuit::{CircuitDescriptor, CircuitError, Location, Transport};
use crate::descriptor::ComponentKind;
use crate::dom::{Dom, NodeId};
use crate::marker::{ScanError, StateSource, discover_persisted_state};
use crate::registry::{AutoHints, ReconcileReport, RegistryError, RenderMode, RootRegistry};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Circuit(#[from] CircuitError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("server circuit was not started")]
    HandshakeRejected,
}

/// Page events that may reveal new interactive roots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootEvent {
    InitialScan,
    /// Streamed markup was patched into the document.
    StreamingUpdate,
    /// An enhanced (in-place) navigation replaced page content.
    EnhancedNavigation,
}

impl std::fmt::Display for BootEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::InitialScan => "initial scan",
            Self::StreamingUpdate => "streaming update",
            Self::EnhancedNavigation => "enhanced navigation",
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BootOptions {
    pub location: Location,
    pub load: LoadOptions,
}

/// Snapshot of the orchestrator state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BootStatus {
    pub server: String,
    pub webassembly: String,
    pub circuit_id: Option<String>,
    pub auto: Option<ComponentKind>,
    pub roots: usize,
    pub pending: usize,
}

pub struct BootContext<T, L, R> {
    registry: Rc<RefCell<RootRegistry>>,
    circuit: CircuitDescriptor,
    transport: T,
    loader: L,
    renderer: R,
    options: BootOptions,
    server: StartGuard<BootError>,
    webassembly: StartGuard<BootError>,
    insertions_paused: Cell<bool>,
}

impl<T: Transport, L: Loader, R: Renderer> BootContext<T, L, R> {
    pub fn new(registry: RootRegistry, transport: T, loader: L, renderer: R, options: BootOptions) -> Self {
        let registry = Rc::new(RefCell::new(registry));
        let circuit = CircuitDescriptor::managed(registry.clone(), "");
        Self {
            registry,
            circuit,
            transport,
            loader,
            renderer,
            options,
            server: StartGuard::new(),
            webassembly: StartGuard::new(),
            insertions_paused: Cell::new(false),
        }
    }

    pub fn registry(&self) -> &Rc<RefCell<RootRegistry>> {
        &self.registry
    }

    pub fn circuit(&self) -> &CircuitDescriptor {
        &self.circuit
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Initial boot: consume persisted state, then run the initial scan.
    pub async fn boot(&self, dom: &mut Dom, root: NodeId) -> Result<ReconcileReport, BootError> {
        let state = match discover_persisted_state(dom, root, StateSource::Shared)? {
            Some(state) => Some(state),
            None => discover_persisted_state(dom, root, StateSource::Server)?,
        };
        if let Some(state) = state {
            crate::debug!("boot"; "application state from {}", state.source.prefix());
            self.circuit.set_application_state(state.encoded);
        }

        self.on_event(BootEvent::InitialScan, dom, root).await
    }

    /// Reconcile the registry with `root` and start whatever it now needs.
    pub async fn on_event(
        &self,
        event: BootEvent,
        dom: &Dom,
        root: NodeId,
    ) -> Result<ReconcileReport, BootError> {
        let allow_insertions = !self.insertions_paused.get();
        let report = self
            .registry
            .borrow_mut()
            .reconcile(dom, root, allow_insertions)?;
        crate::debug!(
            "boot";
            "{}: {} inserted, {} merged, {} pruned",
            event,
            report.inserted.len(),
            report.merged.len(),
            report.pruned.len()
        );

        let (server, webassembly) = tokio::join!(
            self.activate_kind(ComponentKind::Server),
            self.activate_kind(ComponentKind::WebAssembly)
        );
        server?;
        webassembly?;
        Ok(report)
    }

    /// Ask for the runtime serving `mode`, starting it if needed.
    pub async fn request_mode(&self, mode: RenderMode) -> Result<ComponentKind, BootError> {
        let hints = self.hints();
        let kind = self.registry.borrow_mut().decide_mode(mode, &hints);
        self.ensure_started(kind).await?;
        self.activate_pending(kind);
        Ok(kind)
    }

    /// Pause (or resume) insertions while an enhanced navigation is pending.
    pub fn set_insertions_paused(&self, paused: bool) {
        self.insertions_paused.set(paused);
    }

    pub async fn reconnect(&self) -> Result<bool, BootError> {
        Ok(self.circuit.reconnect(&self.transport).await?)
    }

    pub fn status(&self) -> BootStatus {
        let registry = self.registry.borrow();
        let pending: usize = ComponentKind::ALL
            .iter()
            .map(|kind| registry.pending_activation(*kind).len())
            .sum();
        BootStatus {
            server: self.server.phase().to_string(),
            webassembly: self.webassembly.phase().to_string(),
            circuit_id: self.circuit.circuit_id().map(str::to_string),
            auto: registry.auto_decision(),
            roots: registry.len(),
            pending,
        }
    }

    pub fn phase(&self, kind: ComponentKind) -> StartPhase {
        match kind {
            ComponentKind::Server => self.server.phase(),
            ComponentKind::WebAssembly => self.webassembly.phase(),
        }
    }

    // =========================================================================
    // Runtime starts
    // =========================================================================

    /// Start `kind` unless it was already requested.
    pub async fn ensure_started(&self, kind: ComponentKind) -> Result<(), BootError> {
        match kind {
            ComponentKind::Server => self.server.ensure(move || self.start_server()).await,
            ComponentKind::WebAssembly => {
                self.webassembly
                    .ensure(move || self.load_webassembly())
                    .await
            }
        }
    }

    async fn start_server(&self) -> Result<(), BootError> {
        crate::debug!("boot"; "starting server circuit");
        if self
            .circuit
            .start_circuit(&self.transport, &self.options.location)
            .await?
        {
            Ok(())
        } else {
            crate::log!("boot"; "server circuit was not started");
            Err(BootError::HandshakeRejected)
        }
    }

    async fn load_webassembly(&self) -> Result<(), BootError> {
        crate::debug!("boot"; "loading webassembly runtime");
        self.loader.load(&self.options.load).await.map_err(|e| {
            crate::log!("boot"; "webassembly load failed: {}", e);
            BootError::from(e)
        })
    }

    async fn activate_kind(&self, kind: ComponentKind) -> Result<(), BootError> {
        if self.registry.borrow().pending_activation(kind).is_empty() {
            return Ok(());
        }
        match self.ensure_started(kind).await {
            Ok(()) => {
                self.activate_pending(kind);
                Ok(())
            }
            Err(BootError::HandshakeRejected) => {
                crate::debug!(
                    "boot";
                    "no server circuit, {} root(s) left pending",
                    self.registry.borrow().pending_activation(kind).len()
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Hand not-yet-activated roots of a started runtime to the renderer.
    fn activate_pending(&self, kind: ComponentKind) {
        let (records, activated) = {
            let mut registry = self.registry.borrow_mut();
            let mut activated = registry.pending_activation(kind);
            activated.retain(|id| registry.mark_activated(*id));
            (registry.records(kind), activated)
        };
        if activated.is_empty() {
            return;
        }

        self.renderer.attach(kind, &records);
        for id in activated {
            self.renderer.activate(id);
        }
    }

    fn hints(&self) -> AutoHints {
        AutoHints {
            webassembly_ready: self.loader.is_ready(),
            server_started: self.server.is_started(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::testing::{CountingLoader, RecordingRenderer, ScriptedTransport};
    use super::*;
    use crate::circuit::START_CIRCUIT;
    use crate::descriptor::RootId;
    use crate::registry::AutoPolicy;

    type TestContext = BootContext<ScriptedTransport, CountingLoader, RecordingRenderer>;

    fn context(transport: ScriptedTransport, loader: CountingLoader) -> TestContext {
        BootContext::new(
            RootRegistry::default(),
            transport,
            loader,
            RecordingRenderer::new(),
            BootOptions::default(),
        )
    }

    fn page(markers: &[&str]) -> (Dom, NodeId) {
        let mut dom = Dom::new();
        let document = dom.document();
        let body = dom.append_element(document, "body");
        for marker in markers {
            let div = dom.append_element(body, "div");
            dom.append_comment(div, *marker);
        }
        (dom, document)
    }

    const SERVER_0: &str = r#"Blazor:{"type":"server","sequence":0,"descriptor":"A"}"#;
    const SERVER_1: &str = r#"Blazor:{"type":"server","sequence":1,"descriptor":"B"}"#;
    const COUNTER: &str = r#"Blazor:{"type":"webassembly","assembly":"App","typeName":"Counter"}"#;
    const CLOCK: &str = r#"Blazor:{"type":"webassembly","assembly":"App","typeName":"Clock"}"#;

    fn activated_of(ctx: &TestContext, kind: ComponentKind) -> Vec<RootId> {
        ctx.renderer()
            .activated()
            .into_iter()
            .filter(|id| id.kind() == kind)
            .collect()
    }

    #[tokio::test]
    async fn test_boot_starts_both_runtimes() {
        let (mut dom, document) = page(&[SERVER_1, COUNTER, SERVER_0]);
        let ctx = context(ScriptedTransport::new(Value::from("c1")), CountingLoader::new());

        let report = ctx.boot(&mut dom, document).await.unwrap();
        assert_eq!(report.inserted.len(), 3);

        assert_eq!(ctx.transport().count(START_CIRCUIT), 1);
        assert_eq!(ctx.loader().loads(), 1);
        assert_eq!(
            activated_of(&ctx, ComponentKind::Server),
            vec![RootId::Server(0), RootId::Server(1)]
        );
        assert_eq!(
            activated_of(&ctx, ComponentKind::WebAssembly),
            vec![RootId::WebAssembly(0)]
        );

        let status = ctx.status();
        assert_eq!(status.circuit_id.as_deref(), Some("c1"));
        assert_eq!(status.server, "started");
        assert_eq!(status.webassembly, "started");
        assert_eq!(status.roots, 3);
        assert_eq!(status.pending, 0);
    }

    #[tokio::test]
    async fn test_boot_without_roots_starts_nothing() {
        let (mut dom, document) = page(&[]);
        let ctx = context(ScriptedTransport::new(Value::from("c1")), CountingLoader::new());

        ctx.boot(&mut dom, document).await.unwrap();
        assert!(ctx.transport().calls().is_empty());
        assert_eq!(ctx.loader().loads(), 0);
        assert_eq!(ctx.phase(ComponentKind::Server), StartPhase::NotRequested);
    }

    #[tokio::test]
    async fn test_boot_sends_persisted_state() {
        let (mut dom, document) = page(&[SERVER_0]);
        let body = dom.children(document)[0];
        let state = dom.append_comment(body, "Blazor-Component-State:eyJjb3VudCI6NH0=");
        let ctx = context(ScriptedTransport::new(Value::from("c1")), CountingLoader::new());

        ctx.boot(&mut dom, document).await.unwrap();

        assert!(!dom.contains(document, state));
        let calls = ctx.transport().calls();
        assert_eq!(calls[0].1[3], "eyJjb3VudCI6NH0=");
    }

    #[tokio::test]
    async fn test_many_webassembly_triggers_load_once() {
        let (mut dom, document) = page(&[COUNTER, CLOCK]);
        let ctx = context(ScriptedTransport::new(Value::from("c1")), CountingLoader::new());

        let (boot, a, b, c) = tokio::join!(
            ctx.boot(&mut dom, document),
            ctx.request_mode(RenderMode::WebAssembly),
            ctx.request_mode(RenderMode::WebAssembly),
            ctx.ensure_started(ComponentKind::WebAssembly)
        );
        boot.unwrap();
        assert_eq!(a.unwrap(), ComponentKind::WebAssembly);
        assert_eq!(b.unwrap(), ComponentKind::WebAssembly);
        c.unwrap();

        assert_eq!(ctx.loader().loads(), 1);
        assert_eq!(
            activated_of(&ctx, ComponentKind::WebAssembly),
            vec![RootId::WebAssembly(0), RootId::WebAssembly(1)]
        );
    }

    #[tokio::test]
    async fn test_streaming_update_does_not_restart() {
        let (mut dom, document) = page(&[SERVER_0]);
        let ctx = context(ScriptedTransport::new(Value::from("c1")), CountingLoader::new());
        ctx.boot(&mut dom, document).await.unwrap();

        // Re-rendered payload for the existing root, plus one new root
        let body = dom.children(document)[0];
        let first = dom.children(dom.children(body)[0])[0];
        dom.set_comment_text(first, r#"Blazor:{"type":"server","sequence":0,"descriptor":"A2"}"#);
        let div = dom.append_element(body, "div");
        dom.append_comment(div, SERVER_1);

        let report = ctx
            .on_event(BootEvent::StreamingUpdate, &dom, document)
            .await
            .unwrap();
        assert_eq!(report.merged, vec![RootId::Server(0)]);
        assert_eq!(report.inserted, vec![RootId::Server(1)]);

        assert_eq!(ctx.transport().count(START_CIRCUIT), 1);
        assert_eq!(
            ctx.renderer().activated(),
            vec![RootId::Server(0), RootId::Server(1)]
        );

        let registry = ctx.registry().borrow();
        let entry = registry.get(RootId::Server(0)).unwrap();
        assert_eq!(entry.descriptor.as_server().unwrap().descriptor(), "A2");
    }

    #[tokio::test]
    async fn test_interleaved_update_during_start() {
        let (mut dom, document) = page(&[COUNTER]);
        let ctx = context(ScriptedTransport::new(Value::from("c1")), CountingLoader::new());
        let mut update = dom.clone();
        let body = update.children(document)[0];
        let div = update.append_element(body, "div");
        update.append_comment(div, CLOCK);

        let (first, second) = tokio::join!(
            ctx.boot(&mut dom, document),
            ctx.on_event(BootEvent::StreamingUpdate, &update, document)
        );
        first.unwrap();
        second.unwrap();

        assert_eq!(ctx.loader().loads(), 1);
        let mut activated = activated_of(&ctx, ComponentKind::WebAssembly);
        activated.sort();
        assert_eq!(activated, vec![RootId::WebAssembly(0), RootId::WebAssembly(1)]);
    }

    #[tokio::test]
    async fn test_failed_start_is_not_retried() {
        let (mut dom, document) = page(&[COUNTER]);
        let ctx = context(ScriptedTransport::new(Value::from("c1")), CountingLoader::failing());

        let err = ctx.boot(&mut dom, document).await.unwrap_err();
        assert!(matches!(err, BootError::Load(LoadError::Fetch { .. })));

        let again = ctx.on_event(BootEvent::StreamingUpdate, &dom, document).await;
        assert_eq!(again.unwrap_err(), err);
        assert_eq!(ctx.loader().loads(), 1);
        assert_eq!(ctx.phase(ComponentKind::WebAssembly), StartPhase::Failed);
        assert!(ctx.renderer().activated().is_empty());
    }

    #[tokio::test]
    async fn test_disconnected_transport_rejects_server_start() {
        let (mut dom, document) = page(&[SERVER_0]);
        let ctx = context(
            ScriptedTransport::new(Value::from("c1")).disconnected(),
            CountingLoader::new(),
        );

        ctx.boot(&mut dom, document).await.unwrap();
        assert!(ctx.circuit().circuit_id().is_none());
        assert_eq!(ctx.phase(ComponentKind::Server), StartPhase::Failed);
        assert!(ctx.renderer().activated().is_empty());
        assert_eq!(ctx.status().pending, 1);

        // An explicit request still sees the rejection, without a second handshake
        assert_eq!(
            ctx.request_mode(RenderMode::Server).await.unwrap_err(),
            BootError::HandshakeRejected
        );
        assert!(ctx.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_webassembly_update_after_rejected_handshake() {
        let (mut dom, document) = page(&[SERVER_0]);
        let ctx = context(
            ScriptedTransport::new(Value::from("c1")).disconnected(),
            CountingLoader::new(),
        );
        ctx.boot(&mut dom, document).await.unwrap();

        let body = dom.children(document)[0];
        let div = dom.append_element(body, "div");
        dom.append_comment(div, COUNTER);

        let report = ctx
            .on_event(BootEvent::StreamingUpdate, &dom, document)
            .await
            .unwrap();
        assert_eq!(report.inserted, vec![RootId::WebAssembly(0)]);
        assert_eq!(ctx.loader().loads(), 1);
        assert_eq!(ctx.renderer().activated(), vec![RootId::WebAssembly(0)]);

        let status = ctx.status();
        assert_eq!(status.server, "failed");
        assert_eq!(status.webassembly, "started");
        assert_eq!(status.pending, 1);
    }

    #[tokio::test]
    async fn test_auto_resolver_runs_once() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let registry = RootRegistry::with_resolver(Box::new(move |hints: &AutoHints| {
            counter.set(counter.get() + 1);
            assert!(!hints.webassembly_ready);
            ComponentKind::Server
        }));
        let ctx = BootContext::new(
            registry,
            ScriptedTransport::new(Value::from("c1")),
            CountingLoader::new(),
            RecordingRenderer::new(),
            BootOptions::default(),
        );

        let (a, b, c) = tokio::join!(
            ctx.request_mode(RenderMode::Auto),
            ctx.request_mode(RenderMode::Auto),
            ctx.request_mode(RenderMode::Auto)
        );
        assert_eq!(a.unwrap(), ComponentKind::Server);
        assert_eq!(b.unwrap(), ComponentKind::Server);
        assert_eq!(c.unwrap(), ComponentKind::Server);

        // Webassembly becomes ready later; auto stays on the server
        ctx.request_mode(RenderMode::WebAssembly).await.unwrap();
        assert_eq!(ctx.request_mode(RenderMode::Auto).await.unwrap(), ComponentKind::Server);

        assert_eq!(calls.get(), 1);
        assert_eq!(ctx.transport().count(START_CIRCUIT), 1);
        assert_eq!(ctx.status().auto, Some(ComponentKind::Server));
    }

    #[tokio::test]
    async fn test_readiness_policy_follows_loaded_runtime() {
        let ctx = BootContext::new(
            RootRegistry::new(AutoPolicy::Readiness),
            ScriptedTransport::new(Value::from("c1")),
            CountingLoader::new(),
            RecordingRenderer::new(),
            BootOptions::default(),
        );

        ctx.ensure_started(ComponentKind::WebAssembly).await.unwrap();
        assert_eq!(
            ctx.request_mode(RenderMode::Auto).await.unwrap(),
            ComponentKind::WebAssembly
        );
        assert!(ctx.transport().calls().is_empty());
    }

    #[tokio::test]
    async fn test_paused_insertions_only_merge() {
        let (mut dom, document) = page(&[SERVER_0]);
        let ctx = context(ScriptedTransport::new(Value::from("c1")), CountingLoader::new());
        ctx.boot(&mut dom, document).await.unwrap();

        let body = dom.children(document)[0];
        let div = dom.append_element(body, "div");
        dom.append_comment(div, COUNTER);

        ctx.set_insertions_paused(true);
        let report = ctx
            .on_event(BootEvent::EnhancedNavigation, &dom, document)
            .await
            .unwrap();
        assert_eq!(report.skipped, vec![RootId::WebAssembly(0)]);
        assert_eq!(ctx.loader().loads(), 0);

        ctx.set_insertions_paused(false);
        ctx.on_event(BootEvent::EnhancedNavigation, &dom, document)
            .await
            .unwrap();
        assert_eq!(ctx.loader().loads(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_through_context() {
        let (mut dom, document) = page(&[SERVER_0]);
        let ctx = context(ScriptedTransport::new(Value::from("c1")), CountingLoader::new());

        assert_eq!(
            ctx.reconnect().await.unwrap_err(),
            BootError::Circuit(CircuitError::NotInitialized)
        );
        ctx.boot(&mut dom, document).await.unwrap();
        assert!(ctx.reconnect().await.unwrap());
        assert_eq!(ctx.status().circuit_id.as_deref(), Some("c1"));
    }
}
