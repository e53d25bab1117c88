//! Common utilities shared across CLI commands.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;

use crate::dom::{Dom, NodeId};

/// Read and parse an HTML file.
pub fn read_page(path: &Path) -> Result<Dom> {
    let html =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Dom::parse(&html).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the scan root: the first `tag` element, or the document.
pub fn scan_root(dom: &Dom, tag: Option<&str>) -> Result<NodeId> {
    match tag {
        Some(tag) => dom
            .find_element(tag)
            .ok_or_else(|| anyhow!("no <{tag}> element in the page")),
        None => Ok(dom.document()),
    }
}

/// Where streamed content goes: the page body, or the document without one.
pub fn content_root(dom: &Dom) -> NodeId {
    dom.find_element("body").unwrap_or_else(|| dom.document())
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
