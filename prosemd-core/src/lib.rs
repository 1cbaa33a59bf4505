//! Markdown ↔ document tree conversion, constrained by a schema
//!
//!     This crate converts between Markdown text and the tree documents a rich-text editing
//!     engine works on (ProseMirror-shaped: block nodes, inline leaves, marks). Every
//!     conversion is bound to a Schema, the closed set of node and mark kinds one editor
//!     instance allows. A parser never produces a kind its schema lacks and a serializer never
//!     accepts one.
//!
//!     This is a pure lib: no printing, no env vars, no files. The shell lives in prosemd-cli.
//!
//! Pipeline
//!
//!     Markdown → tokens → tree:
//!
//!     - tokenizer: comrak parses the Markdown, and its AST is flattened into a token stream
//!       (open / close / self-closing). Which syntax is recognized is a construction-time
//!       FeatureSet, derived from the schema.
//!     - mapping: a static table from token kind to node / mark target plus an attribute
//!       extractor, filtered once per schema.
//!     - common/flat_to_nested: a stack machine folds the token stream into a tree, recovering
//!       from anything the schema cannot hold (see its module docs).
//!
//!     Tree → Markdown is a direct recursive walk (formats/markdown/serializer.rs).
//!
//!     The file structure :
//!     .
//!     ├── error.rs                # SchemaViolation, FormatError
//!     ├── schema                  # Schema registry and content rules
//!     ├── model                   # Node, Mark and their attributes
//!     ├── tokenizer               # Tokens and feature flags
//!     ├── mapping.rs              # Token → node/mark table
//!     ├── common
//!     │   └── flat_to_nested.rs   # Tree building
//!     ├── format.rs               # Format trait definition
//!     ├── registry.rs             # FormatRegistry for discovery and selection
//!     └── formats
//!         ├── markdown            # parser.rs, serializer.rs
//!         ├── json                # ProseMirror JSON
//!         └── tree                # Inspection outline
//!
//! Testing
//!     tests
//!     └── markdown
//!         ├── <testname>.rs
//!         └── fixtures
//!
//!     Rust does not discover tests in subdirectories by default, so they are
//!     included from tests/lib.rs.
//!
//! Round-trips
//!
//!     For every tree T valid under a schema, parse(serialize(T)) == T, and serialization is
//!     idempotent. Markdown that a schema cannot represent is not an error: it is kept as text
//!     or flattened into the surrounding blocks.

pub mod common;
pub mod error;
pub mod format;
pub mod formats;
pub mod mapping;
pub mod model;
pub mod registry;
pub mod schema;
pub mod tokenizer;

pub use error::{FormatError, SchemaViolation};
pub use format::Format;
pub use formats::{
    JsonFormat, MarkdownFormat, MarkdownParser, MarkdownSerializer, SerializerOptions, TreeFormat,
};
pub use model::{Mark, Node};
pub use registry::FormatRegistry;
pub use schema::{MarkKind, NodeKind, Schema, SchemaBuilder};
pub use tokenizer::{Feature, FeatureSet, Tokenizer};
