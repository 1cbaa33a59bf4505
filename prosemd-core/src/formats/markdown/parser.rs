//! Markdown parsing (Markdown → document tree)
//!
//! Pipeline: Markdown string → tokens ([`Tokenizer`]) → mapped events
//! ([`MappingTable`]) → tree ([`TreeBuilder`]).
//!
//! Parsing never fails. Input the schema cannot represent is kept as text
//! wherever possible; see the recovery rules in
//! [`crate::common::flat_to_nested`].

use crate::common::flat_to_nested::{build_node, TreeBuilder};
use crate::error::FormatError;
use crate::mapping::{MappingTable, Target};
use crate::model::Node;
use crate::schema::Schema;
use crate::tokenizer::{Feature, Nesting, Token, TokenKind, Tokenizer};

/// Parses Markdown into trees valid under one schema.
#[derive(Debug, Clone)]
pub struct MarkdownParser {
    schema: Schema,
    mapping: MappingTable,
    tokenizer: Tokenizer,
}

impl MarkdownParser {
    /// A parser whose tokenizer recognizes exactly what `schema` can hold.
    pub fn new(schema: &Schema) -> Result<Self, FormatError> {
        Self::with_extra_features(schema, std::iter::empty())
    }

    /// Like [`MarkdownParser::new`], additionally recognizing `extra`.
    ///
    /// Extra syntax has no node to map to and is flattened into its
    /// surroundings, e.g. `Feature::Table` turns each table cell into a
    /// paragraph instead of leaving the pipes as text.
    pub fn with_extra_features(
        schema: &Schema,
        extra: impl IntoIterator<Item = Feature>,
    ) -> Result<Self, FormatError> {
        let mapping = MappingTable::for_schema(schema);
        let mut features = mapping.required_features();
        features.extend(extra);
        let tokenizer = Tokenizer::new(features)?;
        Ok(Self::with_tokenizer(schema, tokenizer))
    }

    /// A parser using a caller-configured tokenizer.
    pub fn with_tokenizer(schema: &Schema, tokenizer: Tokenizer) -> Self {
        let mapping = MappingTable::for_schema(schema);
        tracing::debug!(
            entries = mapping.len(),
            features = %tokenizer.features(),
            "markdown parser ready"
        );
        MarkdownParser {
            schema: schema.clone(),
            mapping,
            tokenizer,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn tokenize(&self, source: &str) -> Vec<Token> {
        self.tokenizer.tokenize(source)
    }

    pub fn parse(&self, source: &str) -> Node {
        let tokens = self.tokenizer.tokenize(source);
        let mut builder = TreeBuilder::new(&self.schema);
        for token in &tokens {
            self.fold(&mut builder, token);
        }
        builder.finish()
    }

    fn fold(&self, builder: &mut TreeBuilder<'_>, token: &Token) {
        if token.kind == TokenKind::Text {
            builder.text(&token.content);
            return;
        }

        let Some(entry) = self.mapping.get(token.kind) else {
            self.fold_unmapped(builder, token);
            return;
        };
        let attrs = (entry.attrs)(token);

        match (entry.target, token.nesting) {
            (Target::Mark(kind), Nesting::Open) => builder.push_mark(attrs.into_mark(kind)),
            (Target::Mark(kind), Nesting::Close) => builder.pop_mark(kind),
            (Target::Mark(kind), Nesting::SelfClosing) => {
                builder.text_with_mark(&token.content, attrs.into_mark(kind))
            }
            (Target::Block(kind) | Target::Node(kind), Nesting::Open) => {
                builder.open(kind, attrs, token.kind)
            }
            (Target::Block(_) | Target::Node(_), Nesting::Close) => builder.close(token.kind),
            (Target::Block(kind), Nesting::SelfClosing) => {
                let text = code_text(&token.content);
                let content = if text.is_empty() {
                    Vec::new()
                } else {
                    vec![Node::text(text)]
                };
                if !builder.block_leaf(build_node(kind, attrs, content)) {
                    builder.text(text);
                }
            }
            (Target::Node(kind), Nesting::SelfClosing) => {
                let node = build_node(kind, attrs, Vec::new());
                if kind.is_inline() {
                    builder.inline(node);
                } else {
                    builder.block_leaf(node);
                }
            }
        }
    }

    /// Tokens the schema has no node or mark for.
    fn fold_unmapped(&self, builder: &mut TreeBuilder<'_>, token: &Token) {
        match token.nesting {
            Nesting::Open if is_block_token(token.kind) => builder.open_transparent(token.kind),
            Nesting::Close if is_block_token(token.kind) => builder.close(token.kind),
            // Inline containers (em, link, ...) simply let their content through.
            Nesting::Open | Nesting::Close => {}
            Nesting::SelfClosing => match token.kind {
                TokenKind::Fence | TokenKind::CodeBlock => {
                    builder.open_transparent(token.kind);
                    builder.text(code_text(&token.content));
                    builder.close(token.kind);
                }
                TokenKind::Softbreak | TokenKind::Hardbreak => builder.text("\n"),
                TokenKind::Hr => {}
                _ => builder.text(&token.content),
            },
        }
    }
}

/// Code block text without the newline that terminates its last line.
fn code_text(content: &str) -> &str {
    content.strip_suffix('\n').unwrap_or(content)
}

fn is_block_token(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Paragraph
            | TokenKind::Heading
            | TokenKind::Blockquote
            | TokenKind::BulletList
            | TokenKind::OrderedList
            | TokenKind::ListItem
            | TokenKind::CodeBlock
            | TokenKind::Fence
            | TokenKind::Hr
            | TokenKind::Table
            | TokenKind::TableRow
            | TokenKind::TableCell
    )
}
