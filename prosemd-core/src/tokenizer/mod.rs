//! Markdown tokenizer
//!
//! Lexes raw Markdown into a flat, ordered stream of [`Token`]s: containers
//! become an open/close pair, leaves a single self-closing token. The stream
//! is what the parser folds into a document tree.
//!
//! Lexing is delegated to comrak. Its AST is flattened into tokens by an
//! iterative depth-first traversal, and the [`FeatureSet`] chosen at
//! construction decides which syntax is recognized. Syntax whose feature is
//! disabled is re-emitted as the literal text it was written with, sliced
//! from the source where comrak reports its position (block quotes and
//! lists are unwrapped instead, so only their content remains). Disabling a
//! feature never loses content.
//!
//! Block quotes and lists nested deeper than [`MAX_NESTING`] are unwrapped
//! as well, which bounds the depth of every tree built from the stream.
//!
//! Raw HTML is never passed through: HTML blocks and inline HTML become
//! plain text.

mod features;
mod token;

pub use features::{Feature, FeatureSet};
pub use token::{Nesting, Token, TokenKind};

use crate::error::FormatError;
use comrak::arena_tree::NodeEdge;
use comrak::nodes::{AstNode, LineColumn, ListDelimType, ListType, NodeValue, Sourcepos};
use comrak::{parse_document, Arena, ComrakOptions};

/// Container levels (block quotes, lists and list items) kept in the stream.
pub const MAX_NESTING: usize = 32;

/// Source spelling of an empty paragraph.
pub(crate) const EMPTY_PARAGRAPH: &str = "&nbsp;";

/// Immutable tokenizer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenizer {
    features: FeatureSet,
}

impl Tokenizer {
    /// Creates a tokenizer recognizing exactly `features`.
    ///
    /// Entity decoding and backslash escapes are always performed by comrak,
    /// so a feature set without them cannot be honored.
    pub fn new(features: FeatureSet) -> Result<Self, FormatError> {
        for always_on in [Feature::Entity, Feature::Escape] {
            if !features.contains(always_on) {
                return Err(FormatError::NotSupported(format!(
                    "the '{always_on}' feature cannot be disabled: comrak always decodes \
                     entities and backslash escapes"
                )));
            }
        }
        tracing::debug!(features = %features, "tokenizer configured");
        Ok(Tokenizer { features })
    }

    /// A tokenizer recognizing every feature.
    pub fn full() -> Self {
        Tokenizer {
            features: FeatureSet::all(),
        }
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn tokenize(&self, source: &str) -> Vec<Token> {
        let arena = Arena::new();
        let options = comrak_options(&self.features);
        let root = parse_document(&arena, source, &options);

        let mut flattener = Flattener::new(&self.features, Source::new(source));
        for edge in root.traverse() {
            match edge {
                NodeEdge::Start(node) => flattener.enter(node),
                NodeEdge::End(_) => flattener.leave(),
            }
        }
        flattener.tokens
    }
}

fn comrak_options(features: &FeatureSet) -> ComrakOptions<'static> {
    let mut options = ComrakOptions::default();
    options.extension.table = features.contains(Feature::Table);
    options.extension.strikethrough = features.contains(Feature::Strikethrough);
    options.extension.autolink = features.contains(Feature::Autolink);
    options.extension.shortcodes = features.contains(Feature::Emoji);
    // Inline positions spanning several lines are only corrected with this on.
    options.render.sourcepos = true;
    options
}

/// The source text, addressed by comrak's 1-based line and byte columns.
struct Source<'s> {
    lines: Vec<&'s str>,
}

impl<'s> Source<'s> {
    fn new(text: &'s str) -> Self {
        Source {
            lines: text
                .split('\n')
                .map(|line| line.strip_suffix('\r').unwrap_or(line))
                .collect(),
        }
    }

    fn line(&self, line: usize) -> Option<&'s str> {
        self.lines.get(line.checked_sub(1)?).copied()
    }

    /// From `start` to `end` inclusive, both on one line.
    fn span(&self, start: LineColumn, end: LineColumn) -> Option<&'s str> {
        if start.line != end.line {
            return None;
        }
        self.line(start.line)?
            .get(start.column.checked_sub(1)?..end.column)
    }

    /// The rest of the line from `at` on.
    fn from_column(&self, at: LineColumn) -> Option<&'s str> {
        self.line(at.line)?.get(at.column.checked_sub(1)?..)
    }

    /// The rest of the line after `at`.
    fn after(&self, at: LineColumn) -> Option<&'s str> {
        self.line(at.line)?.get(at.column..)
    }

    fn char_at(&self, at: LineColumn) -> Option<char> {
        self.from_column(at)?.chars().next()
    }

    /// Opening and closing delimiter runs of an emphasis-like span.
    fn delimiters(&self, pos: Sourcepos, width: usize) -> Option<(&'s str, &'s str)> {
        let open = self.from_column(pos.start)?.get(..width)?;
        let close = self
            .line(pos.end.line)?
            .get(pos.end.column.checked_sub(width)?..pos.end.column)?;
        let delimiter = open.chars().next()?;
        let valid = matches!(delimiter, '*' | '_' | '~')
            && open.chars().chain(close.chars()).all(|c| c == delimiter);
        valid.then_some((open, close))
    }
}

/// Tokens and text emitted when a node is left.
#[derive(Default)]
struct Exit {
    pieces: Vec<Piece>,
    /// The node counted towards the nesting depth.
    nested: bool,
    /// The node pushed an entry on the list stack.
    list: bool,
}

impl Exit {
    fn closing(token: Token) -> Self {
        Exit::with(vec![Piece::Token(token)])
    }

    fn with(pieces: Vec<Piece>) -> Self {
        Exit {
            pieces,
            ..Exit::default()
        }
    }

    fn nested(mut self) -> Self {
        self.nested = true;
        self
    }
}

enum Piece {
    Token(Token),
    Text(String),
}

struct Flattener<'f, 's> {
    features: &'f FeatureSet,
    source: Source<'s>,
    tokens: Vec<Token>,
    exits: Vec<Exit>,
    depth: usize,
    /// Whether each enclosing list was emitted or unwrapped.
    lists: Vec<bool>,
    /// Levels of a subtree already consumed by its root.
    skipping: usize,
}

impl<'f, 's> Flattener<'f, 's> {
    fn new(features: &'f FeatureSet, source: Source<'s>) -> Self {
        Flattener {
            features,
            source,
            tokens: Vec::new(),
            exits: Vec::new(),
            depth: 0,
            lists: Vec::new(),
            skipping: 0,
        }
    }

    fn on(&self, feature: Feature) -> bool {
        self.features.contains(feature)
    }

    fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Appends text, extending the previous text token when there is one.
    fn text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(last) = self.tokens.last_mut() {
            if last.kind == TokenKind::Text {
                last.content.push_str(text);
                return;
            }
        }
        self.push(Token::text(text));
    }

    fn emit(&mut self, piece: Piece) {
        match piece {
            Piece::Token(token) => self.push(token),
            Piece::Text(text) => self.text(&text),
        }
    }

    fn line_break(&self, kind: TokenKind, markup: &str) -> Piece {
        if self.on(Feature::Newline) {
            Piece::Token(Token::leaf(kind, "br").with_markup(markup))
        } else {
            Piece::Text("\n".to_string())
        }
    }

    /// A paragraph holding `lines` verbatim, one line break between each.
    fn literal_paragraph(&mut self, lines: &[&str]) {
        if lines.is_empty() {
            return;
        }
        self.push(Token::open(TokenKind::Paragraph, "p"));
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                let piece = self.line_break(TokenKind::Softbreak, "");
                self.emit(piece);
            }
            self.text(line);
        }
        self.push(Token::close(TokenKind::Paragraph, "p"));
    }

    fn enter<'a>(&mut self, node: &'a AstNode<'a>) {
        if self.skipping > 0 {
            self.skipping += 1;
            return;
        }
        let data = node.data.borrow();
        let exit = if data.value.block() {
            self.block(node, &data.value, data.sourcepos)
        } else {
            self.inline(node, &data.value, data.sourcepos)
        };
        self.exits.push(exit);
    }

    fn leave(&mut self) {
        if self.skipping > 1 {
            self.skipping -= 1;
            return;
        }
        self.skipping = 0;
        let Some(exit) = self.exits.pop() else {
            return;
        };
        if exit.nested {
            self.depth -= 1;
        }
        if exit.list {
            self.lists.pop();
        }
        for piece in exit.pieces {
            self.emit(piece);
        }
    }

    fn block<'a>(&mut self, node: &'a AstNode<'a>, value: &NodeValue, pos: Sourcepos) -> Exit {
        match value {
            NodeValue::Paragraph => {
                self.push(Token::open(TokenKind::Paragraph, "p"));
                if self.is_empty_placeholder(node, pos) {
                    self.skipping = 1;
                }
                Exit::closing(Token::close(TokenKind::Paragraph, "p"))
            }
            NodeValue::Heading(heading) => {
                let tag = format!("h{}", heading.level);
                let feature = if heading.setext {
                    Feature::Lheading
                } else {
                    Feature::Heading
                };
                if self.on(feature) {
                    let markup = if !heading.setext {
                        "#".repeat(heading.level as usize)
                    } else if heading.level == 1 {
                        "=".to_string()
                    } else {
                        "-".to_string()
                    };
                    self.push(Token::open(TokenKind::Heading, &tag).with_markup(markup.as_str()));
                    Exit::closing(Token::close(TokenKind::Heading, &tag).with_markup(markup))
                } else if heading.setext {
                    let underline = self.setext_underline(pos, heading.level);
                    self.push(Token::open(TokenKind::Paragraph, "p"));
                    Exit::with(vec![
                        self.line_break(TokenKind::Softbreak, ""),
                        Piece::Text(underline),
                        Piece::Token(Token::close(TokenKind::Paragraph, "p")),
                    ])
                } else {
                    let (prefix, suffix) = self.atx_markers(node, pos, heading.level);
                    self.push(Token::open(TokenKind::Paragraph, "p"));
                    self.text(&prefix);
                    Exit::with(vec![
                        Piece::Text(suffix),
                        Piece::Token(Token::close(TokenKind::Paragraph, "p")),
                    ])
                }
            }
            NodeValue::BlockQuote => {
                if !self.on(Feature::Blockquote) || self.depth >= MAX_NESTING {
                    return Exit::default();
                }
                self.depth += 1;
                self.push(Token::open(TokenKind::Blockquote, "blockquote").with_markup(">"));
                Exit::closing(Token::close(TokenKind::Blockquote, "blockquote")).nested()
            }
            NodeValue::List(list) => {
                let emitted = self.on(Feature::List) && self.depth + 2 <= MAX_NESTING;
                self.lists.push(emitted);
                if !emitted {
                    if self.on(Feature::List) {
                        tracing::trace!(depth = self.depth, "list nested too deep, unwrapped");
                    }
                    return Exit {
                        list: true,
                        ..Exit::default()
                    };
                }
                self.depth += 1;
                let tight = list.tight.to_string();
                let exit = match list.list_type {
                    ListType::Bullet => {
                        let markup = (list.bullet_char as char).to_string();
                        self.push(
                            Token::open(TokenKind::BulletList, "ul")
                                .with_markup(markup)
                                .with_attr("tight", tight),
                        );
                        Exit::closing(Token::close(TokenKind::BulletList, "ul"))
                    }
                    ListType::Ordered => {
                        let markup = match list.delimiter {
                            ListDelimType::Period => ".",
                            ListDelimType::Paren => ")",
                        };
                        self.push(
                            Token::open(TokenKind::OrderedList, "ol")
                                .with_markup(markup)
                                .with_attr("order", list.start.to_string())
                                .with_attr("tight", tight),
                        );
                        Exit::closing(Token::close(TokenKind::OrderedList, "ol"))
                    }
                };
                Exit {
                    list: true,
                    ..exit.nested()
                }
            }
            NodeValue::Item(_) => {
                if self.lists.last() != Some(&true) {
                    return Exit::default();
                }
                self.depth += 1;
                self.push(Token::open(TokenKind::ListItem, "li"));
                Exit::closing(Token::close(TokenKind::ListItem, "li")).nested()
            }
            NodeValue::CodeBlock(code) => {
                let literal = code.literal.strip_suffix('\n').unwrap_or(&code.literal);
                if code.fenced {
                    let fence = (code.fence_char as char)
                        .to_string()
                        .repeat(code.fence_length);
                    if self.on(Feature::Fence) {
                        self.push(
                            Token::leaf(TokenKind::Fence, "code")
                                .with_markup(fence)
                                .with_info(code.info.as_str())
                                .with_content(code.literal.as_str()),
                        );
                    } else {
                        let content: Vec<&str> = if code.literal.is_empty() {
                            Vec::new()
                        } else {
                            literal.split('\n').collect()
                        };
                        let open = self
                            .source
                            .from_column(pos.start)
                            .map(str::trim_end)
                            .filter(|line| line.starts_with(fence.as_str()))
                            .map_or_else(|| format!("{fence}{}", code.info), str::to_string);
                        let close = self.fence_closer(pos, &fence, content.len());
                        let mut lines = vec![open.as_str()];
                        lines.extend(content);
                        lines.extend(close.as_deref());
                        self.literal_paragraph(&lines);
                    }
                } else if self.on(Feature::Code) {
                    self.push(
                        Token::leaf(TokenKind::CodeBlock, "code").with_content(code.literal.as_str()),
                    );
                } else {
                    let lines: Vec<&str> = literal.split('\n').collect();
                    self.literal_paragraph(&lines);
                }
                Exit::default()
            }
            NodeValue::ThematicBreak => {
                let rule = self.rule_text(pos);
                if self.on(Feature::Hr) {
                    self.push(Token::leaf(TokenKind::Hr, "hr").with_markup(rule));
                } else {
                    self.literal_paragraph(&[rule]);
                }
                Exit::default()
            }
            NodeValue::HtmlBlock(html) => {
                let literal = html.literal.trim_end_matches('\n');
                if !literal.is_empty() {
                    let lines: Vec<&str> = literal.split('\n').collect();
                    self.literal_paragraph(&lines);
                }
                Exit::default()
            }
            NodeValue::Table(_) => {
                self.push(Token::open(TokenKind::Table, "table"));
                Exit::closing(Token::close(TokenKind::Table, "table"))
            }
            NodeValue::TableRow(_) => {
                self.push(Token::open(TokenKind::TableRow, "tr"));
                Exit::closing(Token::close(TokenKind::TableRow, "tr"))
            }
            NodeValue::TableCell => {
                let header = node
                    .parent()
                    .is_some_and(|row| matches!(row.data.borrow().value, NodeValue::TableRow(true)));
                let tag = if header { "th" } else { "td" };
                self.push(Token::open(TokenKind::TableCell, tag));
                Exit::closing(Token::close(TokenKind::TableCell, tag))
            }
            _ => Exit::default(),
        }
    }

    fn inline<'a>(&mut self, node: &'a AstNode<'a>, value: &NodeValue, pos: Sourcepos) -> Exit {
        match value {
            NodeValue::Text(text) => self.text(text),
            NodeValue::SoftBreak => {
                let piece = self.line_break(TokenKind::Softbreak, "");
                self.emit(piece);
            }
            NodeValue::LineBreak => {
                let piece = self.line_break(TokenKind::Hardbreak, "\\");
                self.emit(piece);
            }
            NodeValue::Code(code) => {
                let ticks = "`".repeat(code.num_backticks.max(1));
                if self.on(Feature::Backticks) {
                    self.push(
                        Token::leaf(TokenKind::CodeInline, "code")
                            .with_markup(ticks)
                            .with_content(code.literal.as_str()),
                    );
                } else {
                    let literal = self
                        .source
                        .span(pos.start, pos.end)
                        .filter(|span| span.len() >= 2 && span.starts_with('`') && span.ends_with('`'))
                        .map_or_else(|| format!("{ticks}{}{ticks}", code.literal), str::to_string);
                    self.text(&literal);
                }
            }
            NodeValue::Emph => return self.span(pos, Feature::Emphasis, TokenKind::Em, "em", "_"),
            NodeValue::Strong => {
                return self.span(pos, Feature::Strong, TokenKind::Strong, "strong", "**")
            }
            NodeValue::Strikethrough => {
                let markup = match self.source.from_column(pos.start) {
                    Some(rest) if !rest.starts_with("~~") => "~",
                    _ => "~~",
                };
                return self.span(pos, Feature::Strikethrough, TokenKind::Strike, "s", markup);
            }
            NodeValue::Link(link) => {
                let autolink = is_autolink_shaped(node, &link.url, &link.title);
                let enabled = self.on(Feature::Link) || (autolink && self.on(Feature::Autolink));
                if enabled {
                    let mut open = Token::open(TokenKind::Link, "a").with_attr("href", link.url.as_str());
                    if !link.title.is_empty() {
                        open = open.with_attr("title", link.title.as_str());
                    }
                    if autolink {
                        open = open.with_markup("autolink");
                    }
                    self.push(open);
                    return Exit::closing(Token::close(TokenKind::Link, "a"));
                }
                if self.source.char_at(pos.start) == Some('<') {
                    self.text("<");
                    return Exit::with(vec![Piece::Text(">".to_string())]);
                }
                let suffix = self
                    .link_suffix(node, pos)
                    .unwrap_or_else(|| format!("]({})", destination(&link.url, &link.title)));
                self.text("[");
                return Exit::with(vec![Piece::Text(suffix)]);
            }
            NodeValue::Image(image) => {
                // Alt text is flattened here, so the description is not walked.
                self.skipping = 1;
                if self.on(Feature::Image) {
                    let mut token = Token::leaf(TokenKind::Image, "img")
                        .with_attr("src", image.url.as_str())
                        .with_content(alt_text(node));
                    if !image.title.is_empty() {
                        token = token.with_attr("title", image.title.as_str());
                    }
                    self.push(token);
                } else {
                    let literal = self
                        .source
                        .span(pos.start, pos.end)
                        .filter(|span| span.starts_with("![") && span.ends_with([')', ']']))
                        .map_or_else(
                            || {
                                format!(
                                    "![{}]({})",
                                    alt_text(node),
                                    destination(&image.url, &image.title)
                                )
                            },
                            str::to_string,
                        );
                    self.text(&literal);
                }
            }
            NodeValue::ShortCode(shortcode) => {
                self.push(
                    Token::leaf(TokenKind::Emoji, "")
                        .with_markup(shortcode.code.as_str())
                        .with_content(shortcode.emoji.as_str()),
                );
            }
            NodeValue::HtmlInline(html) => self.text(html),
            _ => {}
        }
        Exit::default()
    }

    fn span(
        &mut self,
        pos: Sourcepos,
        feature: Feature,
        kind: TokenKind,
        tag: &str,
        markup: &str,
    ) -> Exit {
        let (open, close) = self
            .source
            .delimiters(pos, markup.len())
            .unwrap_or((markup, markup));
        let (open, close) = (open.to_string(), close.to_string());
        if self.on(feature) {
            self.push(Token::open(kind, tag).with_markup(open));
            Exit::closing(Token::close(kind, tag).with_markup(close))
        } else {
            self.text(&open);
            Exit::with(vec![Piece::Text(close)])
        }
    }

    /// A paragraph that is `&nbsp;` alone, as written for an empty paragraph.
    fn is_empty_placeholder<'a>(&self, node: &'a AstNode<'a>, pos: Sourcepos) -> bool {
        let Some(child) = node.first_child() else {
            return false;
        };
        if child.next_sibling().is_some() || pos.start.line != pos.end.line {
            return false;
        }
        let nbsp = matches!(&child.data.borrow().value, NodeValue::Text(text) if text == "\u{a0}");
        nbsp && self.source.from_column(pos.start).map(str::trim) == Some(EMPTY_PARAGRAPH)
    }

    /// Opening and closing `#` runs of a heading, as written.
    fn atx_markers<'a>(&self, node: &'a AstNode<'a>, pos: Sourcepos, level: u8) -> (String, String) {
        let hashes = "#".repeat(level as usize);
        let is_marker = |text: &&str| !text.is_empty() && text.chars().all(|c| c == '#');
        let (Some(first), Some(last)) = (node.first_child(), node.last_child()) else {
            let marker = self
                .source
                .from_column(pos.start)
                .map(str::trim_end)
                .filter(|text| is_marker(text))
                .unwrap_or(hashes.as_str());
            return (marker.to_string(), String::new());
        };
        let content_start = first.data.borrow().sourcepos.start;
        let content_end = last.data.borrow().sourcepos.end;

        let prefix = self
            .source
            .line(pos.start.line)
            .filter(|_| content_start.line == pos.start.line)
            .and_then(|line| line.get(pos.start.column.checked_sub(1)?..content_start.column.checked_sub(1)?))
            .filter(|prefix| is_marker(&prefix.trim_end()))
            .map_or_else(|| format!("{hashes} "), str::to_string);
        let suffix = self
            .source
            .after(content_end)
            .map(str::trim_end)
            .filter(|suffix| suffix.chars().all(|c| c == '#' || c.is_whitespace()))
            .unwrap_or_default();
        (prefix, suffix.to_string())
    }

    fn setext_underline(&self, pos: Sourcepos, level: u8) -> String {
        let underline = if level == 1 { '=' } else { '-' };
        self.source
            .from_column(LineColumn {
                line: pos.end.line,
                column: pos.start.column,
            })
            .map(str::trim)
            .filter(|line| !line.is_empty() && line.chars().all(|c| c == underline))
            .map_or_else(|| underline.to_string().repeat(3), str::to_string)
    }

    /// The closing fence line, or `None` when the block ran to the end of
    /// its container unclosed.
    fn fence_closer(&self, pos: Sourcepos, fence: &str, content_lines: usize) -> Option<String> {
        let line = pos.start.line + content_lines + 1;
        if line > pos.end.line {
            return None;
        }
        let fence_char = fence.chars().next()?;
        let written = self
            .source
            .from_column(LineColumn {
                line,
                column: pos.start.column,
            })
            .map(str::trim)
            .filter(|close| close.len() >= fence.len() && close.chars().all(|c| c == fence_char));
        Some(written.unwrap_or(fence).to_string())
    }

    fn rule_text(&self, pos: Sourcepos) -> &'s str {
        self.source
            .from_column(pos.start)
            .map(str::trim_end)
            .filter(|rule| !rule.is_empty() && rule.chars().all(|c| matches!(c, '*' | '-' | '_' | ' ' | '\t')))
            .unwrap_or("---")
    }

    /// `](destination)` or `][label]` of a link, as written.
    fn link_suffix<'a>(&self, node: &'a AstNode<'a>, pos: Sourcepos) -> Option<String> {
        let from = match node.last_child() {
            Some(last) => last.data.borrow().sourcepos.end,
            None => pos.start,
        };
        if from.line != pos.end.line {
            return None;
        }
        let suffix = self.source.line(from.line)?.get(from.column..pos.end.column)?;
        (suffix.starts_with(']') && suffix.ends_with([')', ']'])).then(|| suffix.to_string())
    }
}

/// A link whose only content is its own URL, as written by `<url>` or a bare URL.
fn is_autolink_shaped<'a>(node: &'a AstNode<'a>, url: &str, title: &str) -> bool {
    if !title.is_empty() {
        return false;
    }
    let mut children = node.children();
    match (children.next(), children.next()) {
        (Some(child), None) => match &child.data.borrow().value {
            NodeValue::Text(text) => text == url || format!("mailto:{text}") == url,
            _ => false,
        },
        _ => false,
    }
}

fn destination(url: &str, title: &str) -> String {
    if title.is_empty() {
        url.to_string()
    } else {
        format!("{url} \"{title}\"")
    }
}

/// Plain text of an image description.
fn alt_text<'a>(node: &'a AstNode<'a>) -> String {
    let mut alt = String::new();
    for descendant in node.descendants().skip(1) {
        match &descendant.data.borrow().value {
            NodeValue::Text(text) => alt.push_str(text),
            NodeValue::Code(code) => alt.push_str(&code.literal),
            NodeValue::SoftBreak | NodeValue::LineBreak => alt.push(' '),
            NodeValue::ShortCode(shortcode) => alt.push_str(&shortcode.emoji),
            _ => {}
        }
    }
    alt
}
