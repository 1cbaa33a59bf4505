//! Markdown format implementation
//!
//! Bidirectional conversion between CommonMark Markdown and document trees
//! constrained by a [`Schema`].
//!
//! # Element Mapping Table
//!
//! | Node / mark      | Markdown                 | Import notes                        | Export notes                      |
//! |------------------|--------------------------|-------------------------------------|-----------------------------------|
//! | paragraph        | paragraph                | direct                              | direct                            |
//! | heading          | `#`..`######`, setext    | level from the markup               | ATX; setext when it holds breaks  |
//! | blockquote       | `>`                      | direct                              | `> ` on every line                |
//! | code_block       | fenced or indented code  | language from the info string       | fence longer than any inner run   |
//! | horizontal_rule  | `---`, `***`, `___`      | direct                              | `---`                             |
//! | bullet_list      | `*`, `-`, `+`            | tightness kept                      | configured bullet                 |
//! | ordered_list     | `1.`, `1)`               | start number kept                   | numbers right-aligned             |
//! | hard_break       | `\` or two spaces, soft  | soft breaks become hard breaks      | configured style                  |
//! | image            | `![alt](src "title")`    | alt is the flattened description    | direct                            |
//! | emoji            | `:name:`                 | shortcodes only                     | the shortcode                     |
//! | em / strong      | `_x_` / `**x**`          | both delimiter styles               | configured delimiters             |
//! | strike           | `~~x~~`                  | direct                              | direct                            |
//! | code             | `` `x` ``                | direct                              | adaptive backtick fence           |
//! | link             | `[x](href "title")`, `<url>`, bare URLs | direct             | `<url>` when the text is the url  |
//!
//! # Lossy Conversions
//!
//! - Soft line breaks are read as hard breaks.
//! - Tables, raw HTML and syntax for kinds missing from the schema are
//!   flattened into paragraphs and text.
//! - A hard break at the very end of a paragraph cannot be written.
//! - Text that spells out a bare URL becomes a link when read back.

mod escape;
pub mod options;
pub mod parser;
pub mod serializer;

pub use options::{HardBreakStyle, SerializerOptions};
pub use parser::MarkdownParser;
pub use serializer::MarkdownSerializer;

use crate::error::FormatError;
use crate::format::Format;
use crate::model::Node;
use crate::schema::Schema;
use crate::tokenizer::Feature;

/// Format implementation for Markdown
pub struct MarkdownFormat {
    parser: MarkdownParser,
    serializer: MarkdownSerializer,
}

impl MarkdownFormat {
    pub fn new(parser: MarkdownParser, serializer: MarkdownSerializer) -> Self {
        MarkdownFormat { parser, serializer }
    }

    /// Markdown bound to `schema` with default serializer options.
    pub fn for_schema(schema: &Schema) -> Result<Self, FormatError> {
        Self::configured(schema, SerializerOptions::default(), std::iter::empty())
    }

    pub fn configured(
        schema: &Schema,
        options: SerializerOptions,
        extra_features: impl IntoIterator<Item = Feature>,
    ) -> Result<Self, FormatError> {
        Ok(MarkdownFormat {
            parser: MarkdownParser::with_extra_features(schema, extra_features)?,
            serializer: MarkdownSerializer::with_options(schema, options),
        })
    }

    pub fn parser(&self) -> &MarkdownParser {
        &self.parser
    }

    pub fn serializer(&self) -> &MarkdownSerializer {
        &self.serializer
    }
}

impl Format for MarkdownFormat {
    fn name(&self) -> &str {
        "markdown"
    }

    fn description(&self) -> &str {
        "CommonMark Markdown format"
    }

    fn file_extensions(&self) -> &[&str] {
        &["md", "markdown"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Node, FormatError> {
        Ok(self.parser.parse(source))
    }

    fn serialize(&self, doc: &Node) -> Result<String, FormatError> {
        Ok(self.serializer.serialize(doc)?)
    }
}
