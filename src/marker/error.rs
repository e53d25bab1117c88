//! Scanner error types.
//!
//! Every variant is fatal for the scan pass: a malformed marker means the
//! server markup is corrupt, and partial discovery would mis-identify roots.

use thiserror::Error;

// ============================================================================
// ScanError
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanError {
    /// Payload is not a JSON object, or its `type` is missing/unknown.
    #[error("malformed component comment '{comment}': {reason}")]
    Parse { comment: String, reason: String },

    /// A `prerenderId` start marker without a matching end marker.
    #[error("could not find an end component comment for prerender id '{prerender_id}'")]
    Unterminated { prerender_id: String },

    /// A required type-specific field is missing or invalid.
    #[error("invalid {kind} component comment: {reason}")]
    Validation { kind: &'static str, reason: String },

    /// A marker directly under the document node.
    #[error(
        "root components cannot be marked as interactive: the <html> element must be rendered statically"
    )]
    Structural { comment: String },
}

impl ScanError {
    pub(crate) fn parse(comment: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            comment: comment.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn validation(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            kind,
            reason: reason.into(),
        }
    }
}
