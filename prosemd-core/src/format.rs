//! Format trait definition
//!
//! Every text representation of a document tree (Markdown, ProseMirror JSON,
//! the inspection outline) implements [`Format`]. A format may support
//! parsing, serialization or both; the unsupported direction reports
//! [`FormatError::NotSupported`].

use crate::error::FormatError;
use crate::model::Node;

/// Trait for document formats
///
/// # Examples
///
/// ```ignore
/// struct Upper;
///
/// impl Format for Upper {
///     fn name(&self) -> &str {
///         "upper"
///     }
///
///     fn supports_serialization(&self) -> bool {
///         true
///     }
///
///     fn serialize(&self, doc: &Node) -> Result<String, FormatError> {
///         Ok(doc.text_content().to_uppercase())
///     }
/// }
/// ```
pub trait Format: Send + Sync {
    /// The name of this format (e.g., "markdown", "json")
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// File extensions without the leading dot, used to detect the format
    /// of a file by name.
    fn file_extensions(&self) -> &[&str] {
        &[]
    }

    fn supports_parsing(&self) -> bool {
        false
    }

    fn supports_serialization(&self) -> bool {
        false
    }

    /// Parse source text into a document tree
    fn parse(&self, _source: &str) -> Result<Node, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support parsing",
            self.name()
        )))
    }

    /// Serialize a document tree into source text
    fn serialize(&self, _doc: &Node) -> Result<String, FormatError> {
        Err(FormatError::NotSupported(format!(
            "Format '{}' does not support serialization",
            self.name()
        )))
    }
}
