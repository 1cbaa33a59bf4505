//! Shared configuration loader for the prosemd toolchain.
//!
//! `defaults/prosemd.default.toml` is embedded into every binary so that docs
//! and runtime behavior stay in sync. Applications layer user-specific files
//! on top of those defaults via [`Loader`] before deserializing into
//! [`ProsemdConfig`], which then yields the schema, serializer options and
//! format registry the rest of the toolchain works with.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use prosemd_core::formats::HardBreakStyle;
use prosemd_core::{FormatError, FormatRegistry, Schema, SchemaViolation, SerializerOptions};
use prosemd_core::tokenizer::Feature;
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

const DEFAULT_TOML: &str = include_str!("../defaults/prosemd.default.toml");

/// A configuration that deserialized but holds values prosemd cannot use.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),
    #[error("invalid schema configuration: {0}")]
    Schema(#[from] SchemaViolation),
    #[error("invalid value {value:?} for '{key}', expected one of {expected}")]
    InvalidValue {
        key: &'static str,
        value: char,
        expected: &'static str,
    },
    #[error(transparent)]
    Format(#[from] FormatError),
}

/// Top-level configuration consumed by prosemd applications.
#[derive(Debug, Clone, Deserialize)]
pub struct ProsemdConfig {
    pub schema: SchemaConfig,
    pub tokenizer: TokenizerConfig,
    pub serializer: SerializerConfig,
}

/// Names of the node and mark kinds the editor schema allows.
#[derive(Debug, Clone, Deserialize)]
pub struct SchemaConfig {
    pub nodes: Vec<String>,
    pub marks: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenizerConfig {
    pub extra_features: Vec<Feature>,
}

/// Mirrors the knobs exposed by the Markdown serializer.
#[derive(Debug, Clone, Deserialize)]
pub struct SerializerConfig {
    pub bullet_marker: char,
    pub emphasis_marker: char,
    pub strong_marker: char,
    pub hard_break: HardBreakStyle,
}

impl TryFrom<&SerializerConfig> for SerializerOptions {
    type Error = Error;

    fn try_from(config: &SerializerConfig) -> Result<Self, Error> {
        Ok(SerializerOptions {
            bullet_marker: one_of("serializer.bullet_marker", config.bullet_marker, "*-+")?,
            emphasis_marker: one_of("serializer.emphasis_marker", config.emphasis_marker, "_*")?,
            strong_marker: one_of("serializer.strong_marker", config.strong_marker, "*_")?,
            hard_break: config.hard_break,
        })
    }
}

fn one_of(key: &'static str, value: char, allowed: &'static str) -> Result<char, Error> {
    if allowed.contains(value) {
        Ok(value)
    } else {
        Err(Error::InvalidValue {
            key,
            value,
            expected: allowed,
        })
    }
}

impl ProsemdConfig {
    pub fn schema(&self) -> Result<Schema, Error> {
        Ok(Schema::from_names(&self.schema.nodes, &self.schema.marks)?)
    }

    pub fn serializer_options(&self) -> Result<SerializerOptions, Error> {
        SerializerOptions::try_from(&self.serializer)
    }

    /// The built-in formats bound to the configured schema and options.
    pub fn registry(&self) -> Result<FormatRegistry, Error> {
        let registry = FormatRegistry::with_schema(
            &self.schema()?,
            self.serializer_options()?,
            self.tokenizer.extra_features.iter().copied(),
        )?;
        Ok(registry)
    }
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (useful for CLI settings).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<ProsemdConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<ProsemdConfig, ConfigError> {
    Loader::new().build()
}
