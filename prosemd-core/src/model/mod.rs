//! The document tree.
//!
//! A document is a tree of [`Node`]s rooted at [`Node::Doc`]. Inline
//! annotations are not nodes: they are [`Mark`]s attached to the inline
//! leaves (text, images, emoji) they cover. Mark sets are kept sorted by
//! [`MarkKind`] rank and hold at most one mark per kind.
//!
//! The serde representation is the ProseMirror JSON shape:
//!
//! ```text
//! {"type": "heading", "attrs": {"level": 2}, "content": [{"type": "text", "text": "Hi"}]}
//! ```

pub mod attrs;

pub use attrs::{
    BulletListAttrs, CodeBlockAttrs, EmojiAttrs, HeadingAttrs, ImageAttrs, LinkAttrs,
    OrderedListAttrs,
};

use crate::schema::{MarkKind, NodeKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Doc {
        #[serde(default)]
        content: Vec<Node>,
    },
    Paragraph {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    Blockquote {
        #[serde(default)]
        content: Vec<Node>,
    },
    HorizontalRule,
    Heading {
        #[serde(default)]
        attrs: HeadingAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    CodeBlock {
        #[serde(default)]
        attrs: CodeBlockAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<Node>,
    },
    OrderedList {
        #[serde(default)]
        attrs: OrderedListAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    BulletList {
        #[serde(default)]
        attrs: BulletListAttrs,
        #[serde(default)]
        content: Vec<Node>,
    },
    ListItem {
        #[serde(default)]
        content: Vec<Node>,
    },
    Text {
        text: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
    Image {
        attrs: ImageAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
    HardBreak,
    Emoji {
        attrs: EmojiAttrs,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
}

impl Node {
    pub fn doc(content: Vec<Node>) -> Self {
        Node::Doc { content }
    }

    pub fn paragraph(content: Vec<Node>) -> Self {
        Node::Paragraph { content }
    }

    pub fn blockquote(content: Vec<Node>) -> Self {
        Node::Blockquote { content }
    }

    pub fn heading(level: u8, content: Vec<Node>) -> Self {
        Node::Heading {
            attrs: HeadingAttrs { level },
            content,
        }
    }

    /// A code block holding `text`; empty text yields an empty block.
    pub fn code_block(language: Option<&str>, text: &str) -> Self {
        let content = if text.is_empty() {
            Vec::new()
        } else {
            vec![Node::text(text)]
        };
        Node::CodeBlock {
            attrs: CodeBlockAttrs {
                language: language.map(str::to_string),
            },
            content,
        }
    }

    pub fn bullet_list(tight: bool, items: Vec<Node>) -> Self {
        Node::BulletList {
            attrs: BulletListAttrs { tight },
            content: items,
        }
    }

    pub fn ordered_list(order: u32, tight: bool, items: Vec<Node>) -> Self {
        Node::OrderedList {
            attrs: OrderedListAttrs { order, tight },
            content: items,
        }
    }

    pub fn list_item(content: Vec<Node>) -> Self {
        Node::ListItem { content }
    }

    pub fn horizontal_rule() -> Self {
        Node::HorizontalRule
    }

    pub fn hard_break() -> Self {
        Node::HardBreak
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    /// Text carrying `marks`, normalized into a sorted mark set.
    pub fn marked_text(text: impl Into<String>, marks: Vec<Mark>) -> Self {
        Node::Text {
            text: text.into(),
            marks: normalize_marks(marks),
        }
    }

    pub fn image(src: &str, alt: Option<&str>, title: Option<&str>) -> Self {
        Node::Image {
            attrs: ImageAttrs {
                src: src.to_string(),
                alt: alt.map(str::to_string),
                title: title.map(str::to_string),
            },
            marks: Vec::new(),
        }
    }

    pub fn emoji(short_name: &str, text: &str) -> Self {
        Node::Emoji {
            attrs: EmojiAttrs {
                short_name: short_name.to_string(),
                text: text.to_string(),
            },
            marks: Vec::new(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Doc { .. } => NodeKind::Doc,
            Node::Paragraph { .. } => NodeKind::Paragraph,
            Node::Blockquote { .. } => NodeKind::Blockquote,
            Node::HorizontalRule => NodeKind::HorizontalRule,
            Node::Heading { .. } => NodeKind::Heading,
            Node::CodeBlock { .. } => NodeKind::CodeBlock,
            Node::OrderedList { .. } => NodeKind::OrderedList,
            Node::BulletList { .. } => NodeKind::BulletList,
            Node::ListItem { .. } => NodeKind::ListItem,
            Node::Text { .. } => NodeKind::Text,
            Node::Image { .. } => NodeKind::Image,
            Node::HardBreak => NodeKind::HardBreak,
            Node::Emoji { .. } => NodeKind::Emoji,
        }
    }

    /// Child nodes; empty for leaves.
    pub fn content(&self) -> &[Node] {
        match self {
            Node::Doc { content }
            | Node::Paragraph { content }
            | Node::Blockquote { content }
            | Node::Heading { content, .. }
            | Node::CodeBlock { content, .. }
            | Node::OrderedList { content, .. }
            | Node::BulletList { content, .. }
            | Node::ListItem { content } => content,
            Node::HorizontalRule
            | Node::Text { .. }
            | Node::Image { .. }
            | Node::HardBreak
            | Node::Emoji { .. } => &[],
        }
    }

    /// Marks on an inline leaf; empty for every other node.
    pub fn marks(&self) -> &[Mark] {
        match self {
            Node::Text { marks, .. } | Node::Image { marks, .. } | Node::Emoji { marks, .. } => {
                marks
            }
            _ => &[],
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { text, .. } => out.push_str(text),
            Node::Emoji { attrs, .. } => out.push_str(&attrs.text),
            Node::HardBreak => out.push('\n'),
            _ => {
                for child in self.content() {
                    child.collect_text(out);
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mark {
    Link { attrs: LinkAttrs },
    Em,
    Strong,
    Strike,
    Code,
}

impl Mark {
    pub fn link(href: &str, title: Option<&str>) -> Self {
        Mark::Link {
            attrs: LinkAttrs {
                href: href.to_string(),
                title: title.map(str::to_string),
            },
        }
    }

    pub fn kind(&self) -> MarkKind {
        match self {
            Mark::Link { .. } => MarkKind::Link,
            Mark::Em => MarkKind::Em,
            Mark::Strong => MarkKind::Strong,
            Mark::Strike => MarkKind::Strike,
            Mark::Code => MarkKind::Code,
        }
    }

    /// Adds this mark to a sorted set, replacing any mark of the same kind.
    pub fn add_to_set(self, set: &[Mark]) -> Vec<Mark> {
        let mut out: Vec<Mark> = set
            .iter()
            .filter(|mark| mark.kind() != self.kind())
            .cloned()
            .collect();
        let at = out
            .iter()
            .position(|mark| mark.kind() > self.kind())
            .unwrap_or(out.len());
        out.insert(at, self);
        out
    }
}

/// Sorts marks by rank; later marks replace earlier ones of the same kind.
pub fn normalize_marks(marks: Vec<Mark>) -> Vec<Mark> {
    marks
        .into_iter()
        .fold(Vec::new(), |set, mark| mark.add_to_set(&set))
}
