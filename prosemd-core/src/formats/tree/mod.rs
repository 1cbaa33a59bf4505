//! Tree outline of a document, for inspection
//!
//! One node per line, nested two spaces per level. Attributes follow the
//! node name as `key=value`, marks follow text in brackets.
//!
//! ```text
//! doc
//!   heading level=2
//!     text "Title"
//!   paragraph
//!     text "see "
//!     text "docs" [link href="https://x.com", em]
//! ```

use crate::error::FormatError;
use crate::format::Format;
use crate::model::{Mark, Node};

pub struct TreeFormat;

impl Format for TreeFormat {
    fn name(&self) -> &str {
        "tree"
    }

    fn description(&self) -> &str {
        "Indented outline of the document tree"
    }

    fn file_extensions(&self) -> &[&str] {
        &["tree"]
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn serialize(&self, doc: &Node) -> Result<String, FormatError> {
        let mut lines = Vec::new();
        let mut stack = vec![(doc, 0)];
        while let Some((node, depth)) = stack.pop() {
            lines.push(outline(node, depth));
            stack.extend(node.content().iter().rev().map(|child| (child, depth + 1)));
        }
        Ok(lines.join("\n"))
    }
}

fn outline(node: &Node, depth: usize) -> String {
    let mut line = "  ".repeat(depth);
    line.push_str(node.kind().name());
    match node {
        Node::Heading { attrs, .. } => line.push_str(&format!(" level={}", attrs.level)),
        Node::CodeBlock { attrs, .. } => {
            if let Some(language) = &attrs.language {
                line.push_str(&format!(" language={language:?}"));
            }
        }
        Node::OrderedList { attrs, .. } => {
            line.push_str(&format!(" order={} tight={}", attrs.order, attrs.tight))
        }
        Node::BulletList { attrs, .. } => line.push_str(&format!(" tight={}", attrs.tight)),
        Node::Text { text, .. } => line.push_str(&format!(" {text:?}")),
        Node::Image { attrs, .. } => {
            line.push_str(&format!(" src={:?}", attrs.src));
            if let Some(alt) = &attrs.alt {
                line.push_str(&format!(" alt={alt:?}"));
            }
            if let Some(title) = &attrs.title {
                line.push_str(&format!(" title={title:?}"));
            }
        }
        Node::Emoji { attrs, .. } => line.push_str(&format!(" {}", attrs.short_name)),
        _ => {}
    }
    if !node.marks().is_empty() {
        let marks: Vec<String> = node.marks().iter().map(describe_mark).collect();
        line.push_str(&format!(" [{}]", marks.join(", ")));
    }
    line
}

fn describe_mark(mark: &Mark) -> String {
    match mark {
        Mark::Link { attrs } => match &attrs.title {
            Some(title) => format!("link href={:?} title={title:?}", attrs.href),
            None => format!("link href={:?}", attrs.href),
        },
        other => other.kind().name().to_string(),
    }
}
