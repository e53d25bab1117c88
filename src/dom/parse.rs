//! Markup parsing with `tl`.
//!
//! `tl` gives a read-only view of the input; we copy it into the arena so the
//! boot core can mutate it (persisted-state removal, streamed fragments).

use thiserror::Error;

use super::{Dom, NodeId, NodeKind};

/// Markup could not be parsed.
#[derive(Debug, Error)]
pub enum DomParseError {
    #[error("markup parse error: {0}")]
    Markup(String),
}

pub(super) fn parse_html(html: &str) -> Result<Dom, DomParseError> {
    let vdom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| DomParseError::Markup(format!("{e:?}")))?;

    let parser = vdom.parser();
    let mut dom = Dom::new();
    let document = dom.document();
    for handle in vdom.children() {
        copy_node(&mut dom, document, *handle, parser);
    }
    Ok(dom)
}

/// Copy one `tl` node (and its subtree) under `parent`.
fn copy_node(dom: &mut Dom, parent: NodeId, handle: tl::NodeHandle, parser: &tl::Parser) {
    let Some(node) = handle.get(parser) else {
        return;
    };

    match node {
        tl::Node::Tag(tag) => {
            let mut attrs = Vec::new();
            for (key, value) in tag.attributes().iter() {
                let key: &str = key.as_ref();
                attrs.push((key.to_string(), value.map(|v| v.to_string()).unwrap_or_default()));
            }
            let id = dom.append(
                parent,
                NodeKind::Element {
                    tag: tag.name().as_utf8_str().to_lowercase(),
                    attrs,
                },
            );
            for child in tag.children().top().iter() {
                copy_node(dom, id, *child, parser);
            }
        }
        tl::Node::Raw(bytes) => {
            let text = bytes.as_utf8_str();
            // Inter-element whitespace carries nothing the scanner needs
            if !text.trim().is_empty() {
                dom.append_text(parent, text.into_owned());
            }
        }
        tl::Node::Comment(bytes) => {
            let raw = bytes.as_utf8_str();
            dom.append_comment(parent, comment_body(&raw));
        }
    }
}

/// Strip comment delimiters if the parser kept them.
fn comment_body(raw: &str) -> String {
    let body = raw.strip_prefix("<!--").unwrap_or(raw);
    let body = body.strip_suffix("-->").unwrap_or(body);
    body.to_string()
}
