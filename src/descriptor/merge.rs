//! Merging a re-rendered descriptor into the one already registered.
//!
//! The start anchor is the descriptor's permanent identity in the DOM and is
//! never replaced. Everything anchored to it (end marker, ordering key,
//! payload) follows the incoming descriptor.

use thiserror::Error;

use super::{ComponentDescriptor, ComponentKind};

/// An identity collision with an incompatible payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("cannot merge a {incoming} descriptor into a {existing} descriptor")]
    Kind {
        existing: ComponentKind,
        incoming: ComponentKind,
    },

    #[error("cannot merge webassembly component '{incoming}' into '{existing}'")]
    Component { existing: String, incoming: String },
}

impl ComponentDescriptor {
    /// Merge `incoming` into `self` in place.
    ///
    /// Fails without touching `self` when the kinds differ, or when two
    /// webassembly descriptors name different assemblies or types.
    pub fn merge(&mut self, incoming: ComponentDescriptor) -> Result<(), MergeError> {
        match (self, incoming) {
            (Self::Server(existing), Self::Server(incoming)) => {
                existing.end = incoming.end;
                existing.sequence = incoming.sequence;
                existing.descriptor = incoming.descriptor;
                Ok(())
            }
            (Self::WebAssembly(existing), Self::WebAssembly(incoming)) => {
                if existing.assembly != incoming.assembly || existing.type_name != incoming.type_name
                {
                    return Err(MergeError::Component {
                        existing: qualified_name(&existing.assembly, &existing.type_name),
                        incoming: qualified_name(&incoming.assembly, &incoming.type_name),
                    });
                }
                existing.end = incoming.end;
                existing.id = incoming.id;
                existing.parameter_definitions = incoming.parameter_definitions;
                existing.parameter_values = incoming.parameter_values;
                Ok(())
            }
            (existing, incoming) => Err(MergeError::Kind {
                existing: existing.kind(),
                incoming: incoming.kind(),
            }),
        }
    }
}

fn qualified_name(assembly: &str, type_name: &str) -> String {
    format!("{type_name}, {assembly}")
}
