//! ProseMirror JSON format
//!
//! The JSON shape an editing engine exchanges documents in:
//! `{"type": "doc", "content": [...]}` with `attrs`, `marks` and `text`
//! fields as ProseMirror writes them. Parsed documents are checked against
//! the schema, so a tree read here can always be serialized to Markdown.

use crate::error::FormatError;
use crate::format::Format;
use crate::model::Node;
use crate::schema::Schema;

pub struct JsonFormat {
    schema: Schema,
}

impl JsonFormat {
    pub fn new(schema: &Schema) -> Self {
        JsonFormat {
            schema: schema.clone(),
        }
    }
}

impl Default for JsonFormat {
    fn default() -> Self {
        Self::new(&Schema::markdown())
    }
}

impl Format for JsonFormat {
    fn name(&self) -> &str {
        "json"
    }

    fn description(&self) -> &str {
        "ProseMirror JSON document"
    }

    fn file_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn supports_parsing(&self) -> bool {
        true
    }

    fn supports_serialization(&self) -> bool {
        true
    }

    fn parse(&self, source: &str) -> Result<Node, FormatError> {
        let doc: Node =
            serde_json::from_str(source).map_err(|e| FormatError::ParseError(e.to_string()))?;
        self.schema.check(&doc)?;
        Ok(doc)
    }

    fn serialize(&self, doc: &Node) -> Result<String, FormatError> {
        self.schema.check(doc)?;
        serde_json::to_string_pretty(doc).map_err(|e| FormatError::SerializationError(e.to_string()))
    }
}
