//! Format registry for format discovery and selection
//!
//! Formats are registered under their name and can be looked up by name or
//! detected from a file name's extension.

use crate::error::FormatError;
use crate::format::Format;
use crate::formats::{JsonFormat, MarkdownFormat, SerializerOptions, TreeFormat};
use crate::model::Node;
use crate::schema::Schema;
use crate::tokenizer::Feature;
use std::collections::HashMap;

/// Registry of document formats
///
/// # Examples
///
/// ```ignore
/// let registry = FormatRegistry::default();
/// let doc = registry.parse("# Title", "markdown")?;
/// let json = registry.serialize(&doc, "json")?;
/// ```
pub struct FormatRegistry {
    formats: HashMap<String, Box<dyn Format>>,
}

impl FormatRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        FormatRegistry {
            formats: HashMap::new(),
        }
    }

    /// Register a format, replacing any format of the same name
    pub fn register<F: Format + 'static>(&mut self, format: F) {
        self.formats
            .insert(format.name().to_string(), Box::new(format));
    }

    pub fn get(&self, name: &str) -> Result<&dyn Format, FormatError> {
        self.formats
            .get(name)
            .map(|f| f.as_ref())
            .ok_or_else(|| FormatError::FormatNotFound(name.to_string()))
    }

    pub fn has(&self, name: &str) -> bool {
        self.formats.contains_key(name)
    }

    /// List all available format names (sorted)
    pub fn list_formats(&self) -> Vec<String> {
        let mut names: Vec<_> = self.formats.keys().cloned().collect();
        names.sort();
        names
    }

    /// Detect format from filename based on file extension
    pub fn detect_format_from_filename(&self, filename: &str) -> Option<String> {
        let extension = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())?;

        self.formats
            .values()
            .find(|format| format.file_extensions().contains(&extension))
            .map(|format| format.name().to_string())
    }

    /// Parse source text using the specified format
    pub fn parse(&self, source: &str, format: &str) -> Result<Node, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_parsing() {
            return Err(FormatError::NotSupported(format!(
                "Format '{format}' does not support parsing"
            )));
        }
        fmt.parse(source)
    }

    /// Serialize a document using the specified format
    pub fn serialize(&self, doc: &Node, format: &str) -> Result<String, FormatError> {
        let fmt = self.get(format)?;
        if !fmt.supports_serialization() {
            return Err(FormatError::NotSupported(format!(
                "Format '{format}' does not support serialization"
            )));
        }
        fmt.serialize(doc)
    }

    /// The built-in formats, bound to `schema`.
    pub fn with_schema(
        schema: &Schema,
        options: SerializerOptions,
        extra_features: impl IntoIterator<Item = Feature>,
    ) -> Result<Self, FormatError> {
        let mut registry = Self::new();
        registry.register(MarkdownFormat::configured(schema, options, extra_features)?);
        registry.register(JsonFormat::new(schema));
        registry.register(TreeFormat);
        Ok(registry)
    }

    /// Create a registry with the built-in formats and the full Markdown schema
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        let schema = Schema::markdown();
        match MarkdownFormat::for_schema(&schema) {
            Ok(markdown) => registry.register(markdown),
            Err(err) => tracing::error!(%err, "markdown format unavailable"),
        }
        registry.register(JsonFormat::new(&schema));
        registry.register(TreeFormat);
        registry
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
