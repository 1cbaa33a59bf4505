//! Error types for schema and format operations

use thiserror::Error;

/// A node, mark or attribute that the active schema does not allow.
///
/// Raised at construction time (building a schema, looking up a type by
/// name) and when a document tree handed to a serializer does not conform to
/// the schema it is being serialized with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaViolation {
    /// The name does not denote any node type known to the schema
    #[error("unknown node type '{0}'")]
    UnknownNodeType(String),
    /// The name does not denote any mark type known to the schema
    #[error("unknown mark type '{0}'")]
    UnknownMarkType(String),
    /// The name denotes neither a node type nor a mark type
    #[error("unknown node or mark type '{0}'")]
    UnknownType(String),
    /// The type exists but has no attribute with this name
    #[error("type '{type_name}' has no attribute '{attr}'")]
    UnknownAttribute { type_name: String, attr: String },
    /// A child is not permitted by its parent's content model
    #[error("'{child}' is not allowed inside '{parent}'")]
    InvalidContent { parent: String, child: String },
    /// A node holds no content although its content model requires some
    #[error("'{0}' requires at least one child")]
    EmptyContent(String),
    /// A mark is placed where the schema does not allow marks of this kind
    #[error("mark '{mark}' is not allowed inside '{parent}'")]
    InvalidMark { parent: String, mark: String },
    /// A mark set holds two marks of a kind that exclude each other
    #[error("mark '{0}' appears more than once in a mark set")]
    DuplicateMark(String),
    /// An attribute value is outside the range the schema accepts
    #[error("invalid value for attribute '{attr}' of '{type_name}': {reason}")]
    InvalidAttribute {
        type_name: String,
        attr: String,
        reason: String,
    },
    /// A type every schema must contain is missing
    #[error("schema is missing required type '{0}'")]
    MissingRequired(String),
    /// The document nests more levels than a tree may hold
    #[error("document nests deeper than {0} levels")]
    TooDeep(usize),
}

/// Errors that can occur during format operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormatError {
    /// Format not found in registry
    #[error("Format '{0}' not found")]
    FormatNotFound(String),
    /// Structured input (JSON) could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),
    /// Serialized output could not be produced
    #[error("Serialization error: {0}")]
    SerializationError(String),
    /// The document or a lookup violates the schema
    #[error("Schema violation: {0}")]
    Schema(#[from] SchemaViolation),
    /// Operation is not supported by this format or configuration
    #[error("Operation not supported: {0}")]
    NotSupported(String),
}
