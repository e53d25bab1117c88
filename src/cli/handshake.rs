//! `handshake` command: start a circuit for an explicit component list.

use std::path::Path;

use anyhow::{Result, bail};

use super::common::read_page;
use crate::boot::DryRunTransport;
use crate::circuit::CircuitDescriptor;
use crate::config::BootConfig;
use crate::descriptor::{ComponentKind, DescriptorIds};
use crate::log;
use crate::marker::{StateSource, discover_components, discover_persisted_state};

pub async fn run_handshake(file: &Path, config: &BootConfig) -> Result<()> {
    let mut dom = read_page(file)?;
    let document = dom.document();

    let state = discover_persisted_state(&mut dom, document, StateSource::Shared)?
        .map(|state| state.encoded)
        .unwrap_or_default();
    let mut ids = DescriptorIds::new();
    let components: Vec<_> =
        discover_components(&dom, document, ComponentKind::Server, false, &mut ids)?
            .into_iter()
            .filter_map(|d| d.as_server().cloned())
            .collect();
    log!("handshake"; "{} server root(s)", components.len());

    let circuit = CircuitDescriptor::with_components(components, state);
    let transport = DryRunTransport::new(config.transport.connected);
    let options = config.boot_options();

    if !circuit.start_circuit(&transport, &options.location).await? {
        bail!("circuit was not started");
    }
    if let Some(id) = circuit.circuit_id() {
        println!("{id}");
    }
    Ok(())
}
