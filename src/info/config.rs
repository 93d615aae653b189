//! Engine configuration.
//!
//! `defaults/vplan-info.default.toml` is embedded into the crate so that the documented
//! defaults and runtime behavior stay in sync. Callers layer their own files on top via
//! [`Loader`] before deserializing into [`EngineConfig`].

use crate::info::fuzzy::Salutation;
use crate::info::segmenter::{BracketPair, BracketPairs};
use crate::info::tagger::LexiconTagger;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../../defaults/vplan-info.default.toml");

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub segmenter: SegmenterConfig,
    pub linker: LinkerConfig,
    pub render: RenderConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SegmenterConfig {
    pub brackets: Vec<BracketPair>,
}

impl SegmenterConfig {
    pub fn bracket_pairs(&self) -> BracketPairs {
        BracketPairs::new(self.brackets.iter().copied())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LinkerConfig {
    pub salutations: Vec<Salutation>,
    pub common_nouns: Vec<String>,
    pub room_terminators: String,
}

impl LinkerConfig {
    /// The built-in German tagger extended by the configured common nouns.
    pub fn tagger(&self) -> LexiconTagger {
        LexiconTagger::german().with_words(self.common_nouns.iter().cloned())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    pub period_labels: PeriodLabelStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PeriodLabelStyle {
    /// "St.3-4"
    Plan,
    /// "Stunden 3,4" / "Block 2"
    Blocks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub filter: String,
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

    /// Layer an optional configuration file, ignored if absent.
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override (used for CLI flags).
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

pub fn load_defaults() -> Result<EngineConfig, ConfigError> {
    Loader::new().build()
}
