//! Individually togglable Markdown syntax features.

use crate::error::FormatError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// ATX headings (`## Title`)
    Heading,
    /// Setext headings (underlined with `===` or `---`)
    Lheading,
    Blockquote,
    List,
    /// Indented code blocks
    Code,
    Fence,
    Hr,
    #[serde(rename = "tables")]
    Table,
    Emphasis,
    Strong,
    Strikethrough,
    /// Code spans
    Backticks,
    /// Inline, reference and angle-bracket links
    Link,
    /// Bare URLs turned into links
    Autolink,
    Image,
    /// Soft and hard line breaks
    Newline,
    #[serde(rename = "entities")]
    Entity,
    #[serde(rename = "escapes")]
    Escape,
    /// `:shortcode:` emoji
    Emoji,
}

impl Feature {
    pub const ALL: [Feature; 19] = [
        Feature::Heading,
        Feature::Lheading,
        Feature::Blockquote,
        Feature::List,
        Feature::Code,
        Feature::Fence,
        Feature::Hr,
        Feature::Table,
        Feature::Emphasis,
        Feature::Strong,
        Feature::Strikethrough,
        Feature::Backticks,
        Feature::Link,
        Feature::Autolink,
        Feature::Image,
        Feature::Newline,
        Feature::Entity,
        Feature::Escape,
        Feature::Emoji,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::Heading => "heading",
            Feature::Lheading => "lheading",
            Feature::Blockquote => "blockquote",
            Feature::List => "list",
            Feature::Code => "code",
            Feature::Fence => "fence",
            Feature::Hr => "hr",
            Feature::Table => "tables",
            Feature::Emphasis => "emphasis",
            Feature::Strong => "strong",
            Feature::Strikethrough => "strikethrough",
            Feature::Backticks => "backticks",
            Feature::Link => "link",
            Feature::Autolink => "autolink",
            Feature::Image => "image",
            Feature::Newline => "newline",
            Feature::Entity => "entities",
            Feature::Escape => "escapes",
            Feature::Emoji => "emoji",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = FormatError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == name)
            .ok_or_else(|| FormatError::NotSupported(format!("unknown tokenizer feature '{name}'")))
    }
}

/// The features a tokenizer recognizes; everything else stays literal text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    /// Paragraphs and text with entity decoding and backslash escapes.
    pub fn core() -> Self {
        FeatureSet([Feature::Entity, Feature::Escape].into_iter().collect())
    }

    pub fn all() -> Self {
        FeatureSet(Feature::ALL.into_iter().collect())
    }

    pub fn empty() -> Self {
        FeatureSet(BTreeSet::new())
    }

    pub fn with(mut self, feature: Feature) -> Self {
        self.0.insert(feature);
        self
    }

    pub fn without(mut self, feature: Feature) -> Self {
        self.0.remove(&feature);
        self
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        FeatureSet::core()
    }
}

impl Extend<Feature> for FeatureSet {
    fn extend<I: IntoIterator<Item = Feature>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
        FeatureSet(iter.into_iter().collect())
    }
}

impl fmt::Display for FeatureSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.iter().map(Feature::name).collect();
        f.write_str(&names.join(","))
    }
}
