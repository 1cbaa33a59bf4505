//! CLI-specific transforms
//!
//! Each transform is a stage + format combination (e.g. "token-json",
//! "tree-viz") exposing one step of the Markdown import pipeline:
//!
//! 1. **Tokenization** - Markdown text → flat token stream
//!    - `token-json`: every token with its fields
//!    - `token-simple`: one token per line, indented by nesting depth
//!
//! 2. **Parsing** - Tokens → schema-valid document tree
//!    - `tree-json`: ProseMirror JSON
//!    - `tree-viz`: indented outline
//!
//! The tokenizer and parser used are the ones bound to the configured
//! schema, so disabled syntax shows up as the literal text it becomes.

use prosemd_core::tokenizer::{Nesting, Token};
use prosemd_core::{Format, MarkdownParser, TreeFormat};

/// All available CLI transforms (stage + format combinations)
pub const AVAILABLE_TRANSFORMS: &[&str] = &["token-json", "token-simple", "tree-json", "tree-viz"];

pub const DEFAULT_TRANSFORM: &str = "tree-viz";

/// Execute a named transform on Markdown source
///
/// # Examples
///
/// ```ignore
/// let parser = MarkdownParser::new(&Schema::markdown())?;
/// let output = execute_transform("# Title", "tree-viz", &parser)?;
/// ```
pub fn execute_transform(
    source: &str,
    transform_name: &str,
    parser: &MarkdownParser,
) -> Result<String, String> {
    match transform_name {
        "token-json" => {
            let tokens = parser.tokenize(source);
            serde_json::to_string_pretty(&tokens)
                .map_err(|e| format!("JSON serialization failed: {e}"))
        }
        "token-simple" => Ok(tokens_to_simple(&parser.tokenize(source))),
        "tree-json" => serde_json::to_string_pretty(&parser.parse(source))
            .map_err(|e| format!("JSON serialization failed: {e}")),
        "tree-viz" => TreeFormat
            .serialize(&parser.parse(source))
            .map_err(|e| format!("Transform failed: {e}")),
        _ => Err(format!("Unknown transform: {transform_name}")),
    }
}

/// One token per line in markdown-it style (`heading_open h2 ##`).
fn tokens_to_simple(tokens: &[Token]) -> String {
    let mut depth = 0usize;
    let mut lines = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.is_close() {
            depth = depth.saturating_sub(1);
        }

        let mut line = "  ".repeat(depth);
        line.push_str(token.kind.name());
        match token.nesting {
            Nesting::Open => line.push_str("_open"),
            Nesting::Close => line.push_str("_close"),
            Nesting::SelfClosing => {}
        }
        if !token.tag.is_empty() && !token.is_close() {
            line.push(' ');
            line.push_str(&token.tag);
        }
        if !token.markup.is_empty() && !token.is_close() {
            line.push(' ');
            line.push_str(&token.markup);
        }
        if !token.info.is_empty() {
            line.push_str(&format!(" info={:?}", token.info));
        }
        for (name, value) in &token.attrs {
            line.push_str(&format!(" {name}={value:?}"));
        }
        if !token.content.is_empty() {
            line.push_str(&format!(" {:?}", token.content));
        }
        lines.push(line);

        if token.is_open() {
            depth += 1;
        }
    }
    lines.join("\n")
}
