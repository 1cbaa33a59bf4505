//! Shared helpers for the integration tests.

#![allow(dead_code)]

use prosemd_core::{Format, MarkdownFormat, Node, Schema};
use std::path::PathBuf;

/// Markdown bound to the full schema.
pub fn markdown() -> MarkdownFormat {
    MarkdownFormat::for_schema(&Schema::markdown()).expect("full schema builds a format")
}

pub fn parse(md: &str) -> Node {
    markdown().parse(md).expect("markdown parsing never fails")
}

pub fn serialize(doc: &Node) -> String {
    markdown().serialize(doc).expect("document should be valid")
}

/// The top-level blocks of a document.
pub fn blocks(doc: Node) -> Vec<Node> {
    match doc {
        Node::Doc { content } => content,
        other => panic!("expected a doc, got {other:?}"),
    }
}

pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("markdown")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to read {path:?}: {e}"))
}
