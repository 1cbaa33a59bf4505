use serde::{Deserialize, Serialize};

/// How a hard line break is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HardBreakStyle {
    /// A backslash before the newline
    Backslash,
    /// Two trailing spaces before the newline
    Spaces,
}

/// Configuration for the Markdown serializer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializerOptions {
    /// Marker for bullet list items: `*`, `-` or `+`
    pub bullet_marker: char,

    /// Delimiter for emphasis: `_` or `*`
    pub emphasis_marker: char,

    /// Delimiter character for strong emphasis, doubled: `*` or `_`
    pub strong_marker: char,

    pub hard_break: HardBreakStyle,
}

impl SerializerOptions {
    /// The bullet used for a list directly following another bullet list.
    pub(crate) fn alternate_bullet(&self) -> char {
        if self.bullet_marker == '-' {
            '*'
        } else {
            '-'
        }
    }
}

impl Default for SerializerOptions {
    fn default() -> Self {
        Self {
            bullet_marker: '*',
            emphasis_marker: '_',
            strong_marker: '*',
            hard_break: HardBreakStyle::Backslash,
        }
    }
}
