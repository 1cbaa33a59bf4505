//! The closed set of node and mark kinds a schema can select from.

use crate::error::SchemaViolation;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Every node type the document model knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Doc,
    Paragraph,
    Blockquote,
    HorizontalRule,
    Heading,
    CodeBlock,
    OrderedList,
    BulletList,
    ListItem,
    Text,
    Image,
    HardBreak,
    Emoji,
}

impl NodeKind {
    pub const ALL: [NodeKind; 13] = [
        NodeKind::Doc,
        NodeKind::Paragraph,
        NodeKind::Blockquote,
        NodeKind::HorizontalRule,
        NodeKind::Heading,
        NodeKind::CodeBlock,
        NodeKind::OrderedList,
        NodeKind::BulletList,
        NodeKind::ListItem,
        NodeKind::Text,
        NodeKind::Image,
        NodeKind::HardBreak,
        NodeKind::Emoji,
    ];

    /// The type name used in JSON documents and configuration files.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Doc => "doc",
            NodeKind::Paragraph => "paragraph",
            NodeKind::Blockquote => "blockquote",
            NodeKind::HorizontalRule => "horizontal_rule",
            NodeKind::Heading => "heading",
            NodeKind::CodeBlock => "code_block",
            NodeKind::OrderedList => "ordered_list",
            NodeKind::BulletList => "bullet_list",
            NodeKind::ListItem => "list_item",
            NodeKind::Text => "text",
            NodeKind::Image => "image",
            NodeKind::HardBreak => "hard_break",
            NodeKind::Emoji => "emoji",
        }
    }

    /// Members of the `block` group.
    pub fn is_block(self) -> bool {
        matches!(
            self,
            NodeKind::Paragraph
                | NodeKind::Blockquote
                | NodeKind::HorizontalRule
                | NodeKind::Heading
                | NodeKind::CodeBlock
                | NodeKind::OrderedList
                | NodeKind::BulletList
        )
    }

    /// Members of the `inline` group.
    pub fn is_inline(self) -> bool {
        matches!(
            self,
            NodeKind::Text | NodeKind::Image | NodeKind::HardBreak | NodeKind::Emoji
        )
    }

    pub fn is_list(self) -> bool {
        matches!(self, NodeKind::OrderedList | NodeKind::BulletList)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NodeKind {
    type Err = SchemaViolation;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        NodeKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| SchemaViolation::UnknownNodeType(name.to_string()))
    }
}

/// Every mark type the document model knows about.
///
/// The declaration order is the mark rank: mark sets are kept sorted by it,
/// so `Link` always wraps the others and `Code` sits innermost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkKind {
    Link,
    Em,
    Strong,
    Strike,
    Code,
}

impl MarkKind {
    pub const ALL: [MarkKind; 5] = [
        MarkKind::Link,
        MarkKind::Em,
        MarkKind::Strong,
        MarkKind::Strike,
        MarkKind::Code,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MarkKind::Link => "link",
            MarkKind::Em => "em",
            MarkKind::Strong => "strong",
            MarkKind::Strike => "strike",
            MarkKind::Code => "code",
        }
    }
}

impl fmt::Display for MarkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MarkKind {
    type Err = SchemaViolation;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        MarkKind::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .ok_or_else(|| SchemaViolation::UnknownMarkType(name.to_string()))
    }
}
