//! Flat token stream produced by the tokenizer.

use serde::Serialize;
use std::fmt;

/// Lexical kinds, named after the markdown-it token types they correspond to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum TokenKind {
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "heading")]
    Heading,
    #[serde(rename = "blockquote")]
    Blockquote,
    #[serde(rename = "bullet_list")]
    BulletList,
    #[serde(rename = "ordered_list")]
    OrderedList,
    #[serde(rename = "list_item")]
    ListItem,
    #[serde(rename = "code_block")]
    CodeBlock,
    #[serde(rename = "fence")]
    Fence,
    #[serde(rename = "hr")]
    Hr,
    #[serde(rename = "table")]
    Table,
    #[serde(rename = "tr")]
    TableRow,
    #[serde(rename = "td")]
    TableCell,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "softbreak")]
    Softbreak,
    #[serde(rename = "hardbreak")]
    Hardbreak,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "strong")]
    Strong,
    #[serde(rename = "s")]
    Strike,
    #[serde(rename = "code_inline")]
    CodeInline,
    #[serde(rename = "link")]
    Link,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "emoji")]
    Emoji,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Paragraph => "paragraph",
            TokenKind::Heading => "heading",
            TokenKind::Blockquote => "blockquote",
            TokenKind::BulletList => "bullet_list",
            TokenKind::OrderedList => "ordered_list",
            TokenKind::ListItem => "list_item",
            TokenKind::CodeBlock => "code_block",
            TokenKind::Fence => "fence",
            TokenKind::Hr => "hr",
            TokenKind::Table => "table",
            TokenKind::TableRow => "tr",
            TokenKind::TableCell => "td",
            TokenKind::Text => "text",
            TokenKind::Softbreak => "softbreak",
            TokenKind::Hardbreak => "hardbreak",
            TokenKind::Em => "em",
            TokenKind::Strong => "strong",
            TokenKind::Strike => "s",
            TokenKind::CodeInline => "code_inline",
            TokenKind::Link => "link",
            TokenKind::Image => "image",
            TokenKind::Emoji => "emoji",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Nesting {
    Open,
    Close,
    SelfClosing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub nesting: Nesting,
    /// HTML-ish tag, e.g. `h3`, `p`, `ol`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tag: String,
    /// Source delimiters, e.g. `###`, `**`, a fence
    #[serde(skip_serializing_if = "String::is_empty")]
    pub markup: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub content: String,
    /// Fence info string
    #[serde(skip_serializing_if = "String::is_empty")]
    pub info: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attrs: Vec<(String, String)>,
}

impl Token {
    fn new(kind: TokenKind, nesting: Nesting, tag: &str) -> Self {
        Token {
            kind,
            nesting,
            tag: tag.to_string(),
            markup: String::new(),
            content: String::new(),
            info: String::new(),
            attrs: Vec::new(),
        }
    }

    pub fn open(kind: TokenKind, tag: &str) -> Self {
        Token::new(kind, Nesting::Open, tag)
    }

    pub fn close(kind: TokenKind, tag: &str) -> Self {
        Token::new(kind, Nesting::Close, tag)
    }

    pub fn leaf(kind: TokenKind, tag: &str) -> Self {
        Token::new(kind, Nesting::SelfClosing, tag)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Token::leaf(TokenKind::Text, "").with_content(content)
    }

    pub fn with_markup(mut self, markup: impl Into<String>) -> Self {
        self.markup = markup.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = info.into();
        self
    }

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.attrs.push((name.to_string(), value.into()));
        self
    }

    pub fn attr_get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_open(&self) -> bool {
        self.nesting == Nesting::Open
    }

    pub fn is_close(&self) -> bool {
        self.nesting == Nesting::Close
    }
}
