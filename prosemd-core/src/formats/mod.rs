//! Format implementations
//!
//! Each format converts between document trees and one text
//! representation.

pub mod json;
pub mod markdown;
pub mod tree;

pub use json::JsonFormat;
pub use markdown::{
    HardBreakStyle, MarkdownFormat, MarkdownParser, MarkdownSerializer, SerializerOptions,
};
pub use tree::TreeFormat;
