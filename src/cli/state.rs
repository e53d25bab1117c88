//! `state` command: print the persisted component state of a page.

use std::path::Path;

use anyhow::Result;

use super::common::read_page;
use crate::log;
use crate::marker::{StateSource, discover_persisted_state};

pub fn run_state(file: &Path, source: StateSource) -> Result<()> {
    let mut dom = read_page(file)?;
    let document = dom.document();

    match discover_persisted_state(&mut dom, document, source)? {
        Some(state) => println!("{}", state.decoded),
        None => log!("state"; "no {} comment in {}", source.prefix(), file.display()),
    }
    Ok(())
}
