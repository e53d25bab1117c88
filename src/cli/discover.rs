//! `discover` command: print the marked roots of a page.

use std::path::Path;

use anyhow::Result;

use super::common::{print_json, read_page, scan_root};
use crate::descriptor::{ComponentDescriptor, ComponentKind, DescriptorIds, WireRecord};
use crate::log;
use crate::marker::{discover_all, discover_components};

pub fn run_discover(
    file: &Path,
    kind: Option<ComponentKind>,
    direct: bool,
    root: Option<&str>,
) -> Result<()> {
    let dom = read_page(file)?;
    let root = scan_root(&dom, root)?;
    let mut ids = DescriptorIds::new();

    let found = match kind {
        Some(kind) => discover_components(&dom, root, kind, direct, &mut ids)?,
        None => discover_all(&dom, root, direct, &mut ids)?,
    };
    log!("discover"; "{} root(s) in {}", found.len(), file.display());

    let records: Vec<WireRecord> = found.iter().map(ComponentDescriptor::to_record).collect();
    print_json(&records)
}
