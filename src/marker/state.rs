//! Persisted component state.
//!
//! The server serializes application state into one comment:
//!
//! ```text
//! <!--Blazor-Component-State:eyJjb3VudCI6NH0=-->
//! ```
//!
//! Discovery consumes it: the first match (depth-first) is removed from the
//! DOM so a later pass cannot apply it twice.

use std::sync::LazyLock;

use regex::Regex;

use super::decode::decode_text;
use super::error::ScanError;
use crate::dom::{Dom, NodeId};

static STATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*(?P<prefix>Blazor(?:-Server|-WebAssembly)?-Component-State):(?P<state>[a-zA-Z0-9+/=]+)$")
        .unwrap()
});

/// Which persisted-state comment to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StateSource {
    /// `Blazor-Component-State`
    #[default]
    Shared,
    /// `Blazor-Server-Component-State`
    Server,
    /// `Blazor-WebAssembly-Component-State`
    #[value(name = "webassembly")]
    WebAssembly,
}

impl StateSource {
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Shared => "Blazor-Component-State",
            Self::Server => "Blazor-Server-Component-State",
            Self::WebAssembly => "Blazor-WebAssembly-Component-State",
        }
    }
}

/// A consumed persisted-state comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedState {
    pub source: StateSource,
    /// Payload as found in the markup (base64).
    pub encoded: String,
    /// Payload decoded to text.
    pub decoded: String,
}

/// Find, remove and decode the first `source` state comment under `root`.
///
/// Returns `Ok(None)` after visiting every descendant without a match.
pub fn discover_persisted_state(
    dom: &mut Dom,
    root: NodeId,
    source: StateSource,
) -> Result<Option<PersistedState>, ScanError> {
    let Some((node, encoded)) = find_state_comment(dom, root, source) else {
        return Ok(None);
    };

    let decoded = decode_text(&encoded)
        .map_err(|reason| ScanError::validation("persisted state", reason))?;
    dom.remove(node);
    crate::debug!("state"; "consumed {} ({} bytes)", source.prefix(), decoded.len());

    Ok(Some(PersistedState {
        source,
        encoded,
        decoded,
    }))
}

/// Pre-order walk for the first matching comment.
fn find_state_comment(dom: &Dom, root: NodeId, source: StateSource) -> Option<(NodeId, String)> {
    let mut stack: Vec<NodeId> = dom.children(root).iter().rev().copied().collect();

    while let Some(node) = stack.pop() {
        if let Some(text) = dom.comment_text(node)
            && let Some(caps) = STATE.captures(text)
            && &caps["prefix"] == source.prefix()
        {
            return Some((node, caps["state"].to_string()));
        }
        stack.extend(dom.children(node).iter().rev().copied());
    }
    None
}
