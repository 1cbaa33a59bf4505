//! Attribute records carried by individual node and mark variants.
//!
//! Defaults mirror the attribute specs registered in the schema, so a JSON
//! document may omit any attribute that has a default. Attributes the schema
//! requires (`src`, `short_name`, `text`, `href`) must be present.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadingAttrs {
    pub level: u8,
}

impl Default for HeadingAttrs {
    fn default() -> Self {
        HeadingAttrs { level: 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodeBlockAttrs {
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderedListAttrs {
    pub order: u32,
    pub tight: bool,
}

impl Default for OrderedListAttrs {
    fn default() -> Self {
        OrderedListAttrs {
            order: 1,
            tight: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BulletListAttrs {
    pub tight: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageAttrs {
    pub src: String,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmojiAttrs {
    /// The shortcode including its colons, e.g. `:rabbit:`
    pub short_name: String,
    /// The emoji the shortcode resolved to
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinkAttrs {
    pub href: String,
    #[serde(default)]
    pub title: Option<String>,
}
