//! `boot` command: run the orchestrator over a page and its updates.

use anyhow::{Context, Result};

use super::BootArgs;
use super::common::{content_root, print_json, read_page};
use crate::boot::{BootContext, BootError, BootEvent, DryRunLoader, DryRunTransport, LogRenderer};
use crate::circuit::CircuitError;
use crate::config::BootConfig;
use crate::log;
use crate::registry::{RenderMode, RootRegistry};

pub async fn run_boot(args: &BootArgs, config: &BootConfig) -> Result<()> {
    let mut dom = read_page(&args.file)?;
    let document = dom.document();

    let ctx = BootContext::new(
        RootRegistry::new(config.boot.auto.policy),
        DryRunTransport::new(config.transport.connected),
        DryRunLoader::new(),
        LogRenderer,
        config.boot_options(),
    );

    let report = ctx
        .boot(&mut dom, document)
        .await
        .with_context(|| format!("Failed to boot {}", args.file.display()))?;
    log!("boot"; "{} root(s) registered", report.inserted.len());

    for update in &args.updates {
        let fragment = read_page(update)?;
        let target = content_root(&dom);
        dom.clear_children(target);
        dom.import_children(target, &fragment, content_root(&fragment));

        let report = ctx
            .on_event(BootEvent::StreamingUpdate, &dom, document)
            .await
            .with_context(|| format!("Failed to apply {}", update.display()))?;
        log!(
            "boot";
            "{}: {} inserted, {} merged, {} pruned",
            update.display(),
            report.inserted.len(),
            report.merged.len(),
            report.pruned.len()
        );
    }

    for _ in 0..args.auto {
        match ctx.request_mode(RenderMode::Auto).await {
            Ok(kind) => crate::debug!("boot"; "auto request served by {}", kind),
            Err(BootError::HandshakeRejected) => {
                log!("warning"; "auto request needs the server circuit, which is not started");
            }
            Err(e) => return Err(e.into()),
        }
    }

    if args.reconnect {
        match ctx.reconnect().await {
            Ok(accepted) => {
                log!("boot"; "reconnect {}", if accepted { "accepted" } else { "refused" });
            }
            Err(BootError::Circuit(CircuitError::NotInitialized)) => {
                log!("warning"; "reconnect skipped: no circuit to reconnect");
            }
            Err(e) => return Err(e.into()),
        }
    }

    print_json(&ctx.status())
}
