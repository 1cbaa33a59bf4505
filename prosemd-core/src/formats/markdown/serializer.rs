//! Markdown serialization (document tree → Markdown)
//!
//! Blocks are rendered to strings bottom-up and containers prefix their
//! children's lines (`> ` for quotes, the list marker and its indentation for
//! list items). Inline content is written by [`InlineWriter`], which tracks
//! the marks currently open and only emits delimiters where the set of marks
//! changes between adjacent leaves.
//!
//! Output carries no trailing newline.
//!
//! Some trees have no Markdown spelling of their own and are written in a
//! form that reads back as an equivalent tree:
//!
//! - A list's `tight` flag follows its content. A tight list whose items need
//!   a blank line between their blocks is written loose, and a loose list
//!   with a single item holding at most one block is written tight.
//! - An empty paragraph is written `&nbsp;`, which reads back as an empty
//!   paragraph. A document holding nothing but one empty paragraph is
//!   written as the empty string.
//! - A line break inside text is written `&#10;`.
//! - Where an emphasis delimiter would not open or close next to punctuation,
//!   the adjacent character outside the span is written as a numeric
//!   character reference.

use super::escape::{self, Escaper};
use super::options::{HardBreakStyle, SerializerOptions};
use crate::error::SchemaViolation;
use crate::model::{Mark, Node};
use crate::schema::{MarkKind, NodeKind, Schema};
use crate::tokenizer::EMPTY_PARAGRAPH;

#[derive(Debug, Clone)]
pub struct MarkdownSerializer {
    schema: Schema,
    options: SerializerOptions,
}

impl MarkdownSerializer {
    pub fn new(schema: &Schema) -> Self {
        Self::with_options(schema, SerializerOptions::default())
    }

    pub fn with_options(schema: &Schema, options: SerializerOptions) -> Self {
        tracing::debug!(?options, "markdown serializer configured");
        MarkdownSerializer {
            schema: schema.clone(),
            options,
        }
    }

    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    /// Serializes `doc`, which must be valid under this serializer's schema.
    pub fn serialize(&self, doc: &Node) -> Result<String, SchemaViolation> {
        self.schema.check(doc)?;
        if let [Node::Paragraph { content }] = doc.content() {
            if content.is_empty() {
                return Ok(String::new());
            }
        }
        Ok(self.blocks(doc.content(), false))
    }

    fn blocks(&self, nodes: &[Node], tight: bool) -> String {
        let mut out = String::new();
        let mut run = 0usize;
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                let prev = &nodes[i - 1];
                out.push_str(separator(prev, node, tight));
                // Adjacent lists of one kind only stay apart with a different marker.
                run = if node.kind().is_list() && prev.kind() == node.kind() {
                    run + 1
                } else {
                    0
                };
            }
            out.push_str(&self.block(node, run % 2 == 1));
        }
        out
    }

    fn block(&self, node: &Node, alternate: bool) -> String {
        match node {
            Node::Paragraph { content } => {
                let text = self.inline(content, InlineContext::Paragraph);
                if text.trim().is_empty() {
                    EMPTY_PARAGRAPH.to_string()
                } else {
                    text
                }
            }
            Node::Heading { attrs, content } => self.heading(attrs.level, content),
            Node::Blockquote { content } => {
                prefix_lines(&self.blocks(content, false), "> ", ">")
            }
            Node::HorizontalRule => "---".to_string(),
            Node::CodeBlock { attrs, content } => {
                let text: String = content.iter().map(Node::text_content).collect();
                code_fence(attrs.language.as_deref(), &text)
            }
            Node::BulletList { attrs, content } => {
                let bullet = if alternate {
                    self.options.alternate_bullet()
                } else {
                    self.options.bullet_marker
                };
                let markers = content.iter().map(|_| format!("{bullet} ")).collect();
                self.list(content, markers, effective_tight(attrs.tight, content))
            }
            Node::OrderedList { attrs, content } => {
                let delimiter = if alternate { ')' } else { '.' };
                let last = attrs.order as u64 + content.len().saturating_sub(1) as u64;
                let width = last.to_string().len();
                let markers = (0..content.len())
                    .map(|i| {
                        let number = attrs.order as u64 + i as u64;
                        format!("{number:>width$}{delimiter} ")
                    })
                    .collect();
                self.list(content, markers, effective_tight(attrs.tight, content))
            }
            // Not reachable in a checked document; render the content.
            Node::Doc { content } | Node::ListItem { content } => self.blocks(content, false),
            inline => self.inline(std::slice::from_ref(inline), InlineContext::Paragraph),
        }
    }

    fn heading(&self, level: u8, content: &[Node]) -> String {
        let breaks = content.iter().any(|node| matches!(node, Node::HardBreak));
        if breaks && level <= 2 {
            let underline = if level == 1 { "===" } else { "---" };
            let text = self.inline(content, InlineContext::SetextHeading);
            return format!("{text}\n{underline}");
        }
        let hashes = "#".repeat(level as usize);
        let text = self.inline(content, InlineContext::AtxHeading);
        if text.is_empty() {
            hashes
        } else {
            format!("{hashes} {text}")
        }
    }

    fn list(&self, items: &[Node], markers: Vec<String>, tight: bool) -> String {
        let indent = markers.first().map_or(2, |marker| marker.len());
        let pad = " ".repeat(indent);
        let rendered: Vec<String> = items
            .iter()
            .zip(markers)
            .map(|(item, marker)| {
                let body = self.blocks(item.content(), tight);
                let mut out = String::new();
                for (i, line) in body.split('\n').enumerate() {
                    if i == 0 {
                        if line.is_empty() {
                            out.push_str(marker.trim_end());
                        } else {
                            out.push_str(&marker);
                            out.push_str(line);
                        }
                    } else {
                        out.push('\n');
                        if !line.is_empty() {
                            out.push_str(&pad);
                            out.push_str(line);
                        }
                    }
                }
                out
            })
            .collect();
        rendered.join(if tight { "\n" } else { "\n\n" })
    }

    fn inline(&self, nodes: &[Node], context: InlineContext) -> String {
        let escaper = Escaper {
            in_heading: context != InlineContext::Paragraph,
            shortcodes: self.schema.has_node(NodeKind::Emoji),
        };
        let mut writer = InlineWriter {
            options: &self.options,
            escaper,
            context,
            out: String::new(),
            active: Vec::new(),
            trailing: String::new(),
            pending_reference: false,
        };
        writer.write(nodes);
        writer.out
    }
}

/// Whether a list reads back tight once written.
///
/// Items are joined by blank lines in a loose list and blocks inside an item
/// are too, so a loose list without two items or two blocks in one item has
/// no blank line to show for it.
fn effective_tight(tight: bool, items: &[Node]) -> bool {
    if tight {
        !items.iter().any(|item| {
            item.content()
                .windows(2)
                .any(|pair| separator(&pair[0], &pair[1], true) == "\n\n")
        })
    } else {
        items.len() < 2 && items.iter().all(|item| item.content().len() < 2)
    }
}

/// Text between two sibling blocks.
///
/// Tight list items put their blocks on consecutive lines, except where a
/// line would otherwise continue or reinterpret the block before it.
fn separator(prev: &Node, next: &Node, tight: bool) -> &'static str {
    if !tight {
        return "\n\n";
    }
    let after_paragraph = matches!(prev, Node::Paragraph { .. });
    let blank = match next {
        Node::Paragraph { .. } => !matches!(
            prev,
            Node::Heading { .. } | Node::CodeBlock { .. } | Node::HorizontalRule
        ),
        Node::HorizontalRule => after_paragraph,
        Node::Heading { .. } => after_paragraph && is_setext(next),
        Node::OrderedList { attrs, .. } => after_paragraph && attrs.order != 1,
        _ => false,
    };
    if blank {
        "\n\n"
    } else {
        "\n"
    }
}

fn is_setext(heading: &Node) -> bool {
    match heading {
        Node::Heading { attrs, content } => {
            attrs.level <= 2 && content.iter().any(|node| matches!(node, Node::HardBreak))
        }
        _ => false,
    }
}

fn prefix_lines(text: &str, prefix: &str, blank: &str) -> String {
    text.split('\n')
        .map(|line| {
            if line.is_empty() {
                blank.to_string()
            } else {
                format!("{prefix}{line}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A fenced code block whose fence cannot occur inside `text`.
fn code_fence(language: Option<&str>, text: &str) -> String {
    let language = language.unwrap_or("");
    let ch = if language.contains('`') { '~' } else { '`' };
    let fence = ch.to_string().repeat(3.max(escape::longest_run(text, ch) + 1));
    if text.is_empty() {
        format!("{fence}{language}\n{fence}")
    } else {
        format!("{fence}{language}\n{text}\n{fence}")
    }
}

/// A code span whose backtick fence cannot occur inside `text`.
fn code_span(text: &str) -> String {
    let fence = "`".repeat(escape::longest_run(text, '`') + 1);
    let all_spaces = text.chars().all(|c| c == ' ');
    let pad = text.starts_with('`')
        || text.ends_with('`')
        || (!all_spaces && text.starts_with(' ') && text.ends_with(' '));
    if pad {
        format!("{fence} {text} {fence}")
    } else {
        format!("{fence}{text}{fence}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineContext {
    Paragraph,
    /// A single-line `#` heading: breaks become spaces.
    AtxHeading,
    SetextHeading,
}

struct OpenMark {
    mark: Mark,
    close: String,
    /// Content is written verbatim (autolinks).
    raw: bool,
}

struct InlineWriter<'a> {
    options: &'a SerializerOptions,
    escaper: Escaper,
    context: InlineContext,
    out: String,
    active: Vec<OpenMark>,
    /// Whitespace moved out of marks that close after it.
    trailing: String,
    /// A delimiter just closed after punctuation; a word character written
    /// next would keep it from closing.
    pending_reference: bool,
}

impl InlineWriter<'_> {
    fn write(&mut self, nodes: &[Node]) {
        for (i, node) in nodes.iter().enumerate() {
            let next_marks = nodes.get(i + 1).map_or(&[][..], Node::marks);
            match node {
                Node::HardBreak => {
                    // A break closing the block cannot be written.
                    if nodes[i + 1..].iter().all(is_blank) {
                        continue;
                    }
                    // Marks stay open across the break only if they continue after it.
                    let keep = self
                        .active
                        .iter()
                        .take_while(|open| next_marks.contains(&open.mark))
                        .count();
                    self.close_to(keep);
                    self.flush_trailing();
                    self.hard_break();
                }
                Node::Text { text, marks } => self.text(text, marks, next_marks, nodes, i),
                Node::Image { attrs, marks } => {
                    self.sync_marks(marks, nodes, i, Some('!'));
                    self.flush_trailing();
                    let mut image = String::from("![");
                    self.escaper
                        .escape_into(attrs.alt.as_deref().unwrap_or(""), &mut image);
                    image.push_str("](");
                    image.push_str(&escape::link_destination(&attrs.src));
                    if let Some(title) = &attrs.title {
                        image.push(' ');
                        image.push_str(&escape::link_title(title));
                    }
                    image.push(')');
                    self.push_raw(&image);
                }
                Node::Emoji { attrs, marks } => {
                    self.sync_marks(marks, nodes, i, attrs.short_name.chars().next());
                    self.flush_trailing();
                    self.push_raw(&attrs.short_name);
                }
                _ => {}
            }
        }
        self.close_to(0);
        self.flush_trailing();
    }

    fn text(&mut self, text: &str, marks: &[Mark], next_marks: &[Mark], nodes: &[Node], i: usize) {
        let code = marks.iter().any(|mark| mark.kind() == MarkKind::Code);

        // Whitespace-only text cannot open or close delimiters; it stays
        // inside marks that continue on both sides.
        if !code && text.trim().is_empty() {
            let keep = self
                .active
                .iter()
                .take_while(|open| marks.contains(&open.mark) && next_marks.contains(&open.mark))
                .count();
            self.close_to(keep);
            self.flush_trailing();
            self.escaped(text);
            return;
        }

        let (lead, body, trail) = if code || marks.is_empty() {
            ("", text, "")
        } else {
            split_whitespace(text)
        };

        self.close_unless_in(marks);
        self.flush_trailing();
        self.escaped(lead);
        let first = if code { Some('`') } else { body.chars().next() };
        self.open_missing(marks, nodes, i, first);

        if code {
            self.push_raw(&code_span(body));
        } else if self.active.last().is_some_and(|open| open.raw) {
            self.push_raw(body);
        } else {
            self.escaped(body);
        }

        let closes_after = marks.iter().any(|mark| !next_marks.contains(mark));
        if closes_after {
            self.escaper.escape_into(trail, &mut self.trailing);
        } else {
            self.escaped(trail);
        }
    }

    /// Writes escaped text, spelling its first character as a reference when
    /// a delimiter closed right before it.
    fn escaped(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let mut rest = text;
        if std::mem::take(&mut self.pending_reference) {
            if let Some(first) = text.chars().next().filter(|&c| is_word_char(c)) {
                push_reference(&mut self.out, first);
                rest = &text[first.len_utf8()..];
            }
        }
        self.escaper.escape_into(rest, &mut self.out);
    }

    /// Writes markup verbatim.
    fn push_raw(&mut self, markup: &str) {
        if !markup.is_empty() {
            self.pending_reference = false;
        }
        self.out.push_str(markup);
    }

    fn hard_break(&mut self) {
        match self.context {
            InlineContext::AtxHeading => self.push_raw(" "),
            _ => match self.options.hard_break {
                HardBreakStyle::Backslash => self.push_raw("\\\n"),
                HardBreakStyle::Spaces => self.push_raw("  \n"),
            },
        }
    }

    fn sync_marks(&mut self, marks: &[Mark], nodes: &[Node], i: usize, first: Option<char>) {
        self.close_unless_in(marks);
        self.open_missing(marks, nodes, i, first);
    }

    /// Closes open marks from the first one `marks` does not hold.
    fn close_unless_in(&mut self, marks: &[Mark]) {
        let keep = self
            .active
            .iter()
            .take_while(|open| marks.contains(&open.mark))
            .count();
        self.close_to(keep);
    }

    fn close_to(&mut self, depth: usize) {
        while self.active.len() > depth {
            let Some(open) = self.active.pop() else {
                break;
            };
            let after_punctuation = self.out.chars().last().is_some_and(is_punctuation);
            self.push_raw(&open.close);
            if is_delimiter_run(&open.mark) && after_punctuation {
                self.pending_reference = true;
            }
        }
    }

    fn flush_trailing(&mut self) {
        let trailing = std::mem::take(&mut self.trailing);
        self.push_raw(&trailing);
    }

    /// Opens the marks in `marks` not already open. `first` is the first
    /// character the current leaf writes.
    fn open_missing(&mut self, marks: &[Mark], nodes: &[Node], i: usize, first: Option<char>) {
        let missing: Vec<&Mark> = marks
            .iter()
            .filter(|mark| !self.active.iter().any(|open| &open.mark == *mark))
            .collect();
        for (n, mark) in missing.iter().enumerate() {
            // Another delimiter or the leaf's markup follows this one.
            let before_punctuation = n + 1 < missing.len() || first.is_some_and(is_punctuation);
            let open = self.open_mark(mark, nodes, i, before_punctuation);
            self.active.push(open);
        }
    }

    fn open_mark(
        &mut self,
        mark: &Mark,
        nodes: &[Node],
        i: usize,
        before_punctuation: bool,
    ) -> OpenMark {
        if is_delimiter_run(mark) && before_punctuation {
            // A delimiter between a word character and punctuation does not
            // open; the word character is spelled as a reference instead.
            if let Some(last) = self.out.chars().last().filter(|&c| is_word_char(c)) {
                self.out.pop();
                push_reference(&mut self.out, last);
            }
        }
        let (open, close, raw) = match mark {
            Mark::Em | Mark::Strong => {
                let preferred = match mark {
                    Mark::Em => self.options.emphasis_marker,
                    _ => self.options.strong_marker,
                };
                // `_` cannot open or close inside a word.
                let intraword = self.out.chars().last().is_some_and(char::is_alphanumeric)
                    || char_after_run(nodes, i, mark).is_some_and(char::is_alphanumeric);
                let ch = if intraword {
                    '*'
                } else if self.out.ends_with(preferred) {
                    // Keeps a delimiter that just closed from merging with this one.
                    if preferred == '*' {
                        '_'
                    } else {
                        '*'
                    }
                } else {
                    preferred
                };
                let count = if *mark == Mark::Em { 1 } else { 2 };
                let delimiter = ch.to_string().repeat(count);
                (delimiter.clone(), delimiter, false)
            }
            Mark::Strike => ("~~".to_string(), "~~".to_string(), false),
            Mark::Code => (String::new(), String::new(), false),
            Mark::Link { attrs } => {
                if is_autolink(nodes, i, mark) {
                    ("<".to_string(), ">".to_string(), true)
                } else {
                    let mut close = String::from("](");
                    close.push_str(&escape::link_destination(&attrs.href));
                    if let Some(title) = &attrs.title {
                        close.push(' ');
                        close.push_str(&escape::link_title(title));
                    }
                    close.push(')');
                    ("[".to_string(), close, false)
                }
            }
        };
        self.push_raw(&open);
        OpenMark {
            mark: mark.clone(),
            close,
            raw,
        }
    }
}

/// Marks written as `*`, `_` or `~` runs, which only open and close when
/// flanking.
fn is_delimiter_run(mark: &Mark) -> bool {
    matches!(mark, Mark::Em | Mark::Strong | Mark::Strike)
}

fn is_punctuation(c: char) -> bool {
    !c.is_alphanumeric() && !c.is_whitespace()
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric()
}

fn push_reference(out: &mut String, c: char) {
    out.push_str(&format!("&#{};", u32::from(c)));
}

fn is_blank(node: &Node) -> bool {
    match node {
        Node::HardBreak => true,
        Node::Text { text, .. } => text.trim().is_empty(),
        _ => false,
    }
}

/// `text` split into leading whitespace, body and trailing whitespace.
fn split_whitespace(text: &str) -> (&str, &str, &str) {
    let start = text.len() - text.trim_start().len();
    let end = text.trim_end().len();
    (&text[..start], &text[start..end], &text[end..])
}

/// The first character after the run of nodes carrying `mark` from `i`.
fn char_after_run(nodes: &[Node], i: usize, mark: &Mark) -> Option<char> {
    let next = nodes[i..].iter().find(|node| !node.marks().contains(mark))?;
    match next {
        Node::Text { text, .. } => text.chars().next(),
        _ => None,
    }
}

/// A link written `<href>`: a single unstyled text leaf spelling out its
/// own untitled destination.
fn is_autolink(nodes: &[Node], i: usize, mark: &Mark) -> bool {
    let Mark::Link { attrs } = mark else {
        return false;
    };
    let Node::Text { text, marks } = &nodes[i] else {
        return false;
    };
    let alone = nodes
        .get(i + 1)
        .map_or(true, |next| !next.marks().contains(mark));
    let spelled_out = attrs.href == *text || attrs.href.strip_prefix("mailto:") == Some(text);
    alone
        && marks.len() == 1
        && attrs.title.is_none()
        && spelled_out
        && escape::is_autolink_target(text)
}
