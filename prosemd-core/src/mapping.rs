//! Token → schema mapping table
//!
//! A declarative list of [`MappingEntry`]s saying which token kind produces
//! which node or mark, and how its attributes are read off the token. The
//! table is filtered against a [`Schema`] once, at construction; entries whose
//! target the schema lacks are dropped, and the tokens they would have
//! handled fall through to the parser's recovery policies.

use crate::model::{
    BulletListAttrs, CodeBlockAttrs, EmojiAttrs, HeadingAttrs, ImageAttrs, LinkAttrs, Mark,
    OrderedListAttrs,
};
use crate::schema::{MarkKind, NodeKind, Schema};
use crate::tokenizer::{Feature, FeatureSet, Token, TokenKind};

/// What a token turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// A node with content, opened and closed by a token pair (or built
    /// whole from a self-closing token carrying its text, like a fence)
    Block(NodeKind),
    /// A leaf node
    Node(NodeKind),
    /// A mark applied to the inline content between open and close
    Mark(MarkKind),
}

impl Target {
    fn supported_by(self, schema: &Schema) -> bool {
        match self {
            Target::Block(kind) | Target::Node(kind) => schema.has_node(kind),
            Target::Mark(kind) => schema.has_mark(kind),
        }
    }
}

/// Typed attributes extracted from a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attrs {
    None,
    Heading(HeadingAttrs),
    CodeBlock(CodeBlockAttrs),
    OrderedList(OrderedListAttrs),
    BulletList(BulletListAttrs),
    Image(ImageAttrs),
    Emoji(EmojiAttrs),
    Link(LinkAttrs),
}

pub type AttrExtractor = fn(&Token) -> Attrs;

#[derive(Debug, Clone, Copy)]
pub struct MappingEntry {
    pub source: TokenKind,
    pub target: Target,
    pub attrs: AttrExtractor,
}

const fn entry(source: TokenKind, target: Target, attrs: AttrExtractor) -> MappingEntry {
    MappingEntry {
        source,
        target,
        attrs,
    }
}

/// The default Markdown ↔ schema correspondence.
pub const DEFAULT_MAPPING: &[MappingEntry] = &[
    entry(TokenKind::Blockquote, Target::Block(NodeKind::Blockquote), no_attrs),
    entry(TokenKind::Paragraph, Target::Block(NodeKind::Paragraph), no_attrs),
    entry(TokenKind::Heading, Target::Block(NodeKind::Heading), heading_attrs),
    entry(TokenKind::Hr, Target::Node(NodeKind::HorizontalRule), no_attrs),
    entry(TokenKind::CodeBlock, Target::Block(NodeKind::CodeBlock), indented_code_attrs),
    entry(TokenKind::Fence, Target::Block(NodeKind::CodeBlock), fence_attrs),
    entry(TokenKind::BulletList, Target::Block(NodeKind::BulletList), bullet_list_attrs),
    entry(TokenKind::OrderedList, Target::Block(NodeKind::OrderedList), ordered_list_attrs),
    entry(TokenKind::ListItem, Target::Block(NodeKind::ListItem), no_attrs),
    entry(TokenKind::Softbreak, Target::Node(NodeKind::HardBreak), no_attrs),
    entry(TokenKind::Hardbreak, Target::Node(NodeKind::HardBreak), no_attrs),
    entry(TokenKind::Image, Target::Node(NodeKind::Image), image_attrs),
    entry(TokenKind::Emoji, Target::Node(NodeKind::Emoji), emoji_attrs),
    entry(TokenKind::Em, Target::Mark(MarkKind::Em), no_attrs),
    entry(TokenKind::Strong, Target::Mark(MarkKind::Strong), no_attrs),
    entry(TokenKind::Link, Target::Mark(MarkKind::Link), link_attrs),
    entry(TokenKind::CodeInline, Target::Mark(MarkKind::Code), no_attrs),
    entry(TokenKind::Strike, Target::Mark(MarkKind::Strike), no_attrs),
];

/// A mapping table bound to one schema.
#[derive(Debug, Clone)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    /// The default mapping, filtered to the kinds `schema` supports.
    pub fn for_schema(schema: &Schema) -> Self {
        MappingTable::filtered(DEFAULT_MAPPING, schema)
    }

    /// Keeps the entries of `entries` whose target exists in `schema`.
    pub fn filtered(entries: &[MappingEntry], schema: &Schema) -> Self {
        let (kept, dropped): (Vec<MappingEntry>, Vec<MappingEntry>) = entries
            .iter()
            .copied()
            .partition(|entry| entry.target.supported_by(schema));
        for entry in &dropped {
            tracing::debug!(token = %entry.source, target = ?entry.target, "mapping entry dropped");
        }
        MappingTable { entries: kept }
    }

    pub fn get(&self, kind: TokenKind) -> Option<&MappingEntry> {
        self.entries.iter().find(|entry| entry.source == kind)
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tokenizer features needed to produce the tokens this table maps.
    pub fn required_features(&self) -> FeatureSet {
        let mut features = FeatureSet::core();
        for entry in &self.entries {
            features.extend(features_for(entry.source).iter().copied());
        }
        features
    }
}

fn features_for(kind: TokenKind) -> &'static [Feature] {
    match kind {
        TokenKind::Heading => &[Feature::Heading, Feature::Lheading],
        TokenKind::Blockquote => &[Feature::Blockquote],
        TokenKind::BulletList | TokenKind::OrderedList | TokenKind::ListItem => &[Feature::List],
        TokenKind::CodeBlock => &[Feature::Code],
        TokenKind::Fence => &[Feature::Fence],
        TokenKind::Hr => &[Feature::Hr],
        TokenKind::Table | TokenKind::TableRow | TokenKind::TableCell => &[Feature::Table],
        TokenKind::Softbreak | TokenKind::Hardbreak => &[Feature::Newline],
        TokenKind::Em => &[Feature::Emphasis],
        TokenKind::Strong => &[Feature::Strong],
        TokenKind::Strike => &[Feature::Strikethrough],
        TokenKind::CodeInline => &[Feature::Backticks],
        TokenKind::Link => &[Feature::Link, Feature::Autolink],
        TokenKind::Image => &[Feature::Image],
        TokenKind::Emoji => &[Feature::Emoji],
        TokenKind::Paragraph | TokenKind::Text => &[],
    }
}

fn no_attrs(_: &Token) -> Attrs {
    Attrs::None
}

fn heading_attrs(token: &Token) -> Attrs {
    let level = token
        .tag
        .strip_prefix('h')
        .and_then(|digits| digits.parse::<u8>().ok())
        .unwrap_or(1);
    Attrs::Heading(HeadingAttrs { level })
}

fn indented_code_attrs(_: &Token) -> Attrs {
    Attrs::CodeBlock(CodeBlockAttrs { language: None })
}

fn fence_attrs(token: &Token) -> Attrs {
    let info = token.info.trim();
    let language = (!info.is_empty()).then(|| info.to_string());
    Attrs::CodeBlock(CodeBlockAttrs { language })
}

fn tight(token: &Token) -> bool {
    token.attr_get("tight") == Some("true")
}

fn bullet_list_attrs(token: &Token) -> Attrs {
    Attrs::BulletList(BulletListAttrs {
        tight: tight(token),
    })
}

fn ordered_list_attrs(token: &Token) -> Attrs {
    let order = token
        .attr_get("order")
        .and_then(|order| order.parse::<u32>().ok())
        .unwrap_or(1);
    Attrs::OrderedList(OrderedListAttrs {
        order,
        tight: tight(token),
    })
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

fn image_attrs(token: &Token) -> Attrs {
    Attrs::Image(ImageAttrs {
        src: token.attr_get("src").unwrap_or_default().to_string(),
        alt: non_empty(Some(token.content.as_str())),
        title: non_empty(token.attr_get("title")),
    })
}

fn emoji_attrs(token: &Token) -> Attrs {
    Attrs::Emoji(EmojiAttrs {
        short_name: format!(":{}:", token.markup),
        text: token.content.clone(),
    })
}

fn link_attrs(token: &Token) -> Attrs {
    Attrs::Link(LinkAttrs {
        href: token.attr_get("href").unwrap_or_default().to_string(),
        title: non_empty(token.attr_get("title")),
    })
}

impl Attrs {
    /// The mark a `Target::Mark` entry produces from these attributes.
    pub fn into_mark(self, kind: MarkKind) -> Mark {
        match (kind, self) {
            (MarkKind::Link, Attrs::Link(attrs)) => Mark::Link { attrs },
            (MarkKind::Link, _) => Mark::Link {
                attrs: LinkAttrs::default(),
            },
            (MarkKind::Em, _) => Mark::Em,
            (MarkKind::Strong, _) => Mark::Strong,
            (MarkKind::Strike, _) => Mark::Strike,
            (MarkKind::Code, _) => Mark::Code,
        }
    }
}
