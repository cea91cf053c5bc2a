//! Pipeline configuration.
//!
//! Loaded from a TOML file (`--config`, else `OCSHEET_CONFIG`); every field
//! has a default so an absent file means reference behavior: abort on the
//! first malformed row, collapse sub-enhancements, keep first status and
//! coverage, no post-processing.

use crate::catalog::MergePolicy;
use crate::control::SubEnhancementPolicy;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "OCSHEET_CONFIG";

/// What the pipeline does with a row whose control does not parse.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    #[default]
    Abort,
    /// Record the row in the report and continue.
    Skip,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestConfig {
    pub on_malformed: MalformedPolicy,
    pub sub_enhancement: SubEnhancementPolicy,
    pub drop_leading_placeholder: bool,
    pub merge: MergePolicy,
    pub source: SourceConfig,
    pub output: OutputConfig,
}

/// Where the family and control cells live in an exported sheet.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Zero-based column index of the family label.
    pub family_column: usize,
    /// Zero-based column index of the control identifier.
    pub control_column: usize,
    /// Leading rows to skip (headers).
    pub header_rows: usize,
    pub delimiter: char,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            family_column: 0,
            control_column: 1,
            header_rows: 1,
            delimiter: ',',
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// One `catalog.json` holding every family.
    #[default]
    Single,
    /// One `<family>.json` document per family.
    PerFamily,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub layout: OutputLayout,
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            layout: OutputLayout::Single,
            pretty: true,
        }
    }
}

impl IngestConfig {
    pub fn from_toml(input: &str) -> Result<Self> {
        let config: IngestConfig = toml::from_str(input).context("parsing config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&data).with_context(|| format!("loading config {}", path.display()))
    }

    /// Load from an explicit path, else from `OCSHEET_CONFIG`, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match config_path_from_env() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let source = &self.source;
        if source.family_column == source.control_column {
            bail!(
                "source.family_column and source.control_column must differ (both {})",
                source.family_column
            );
        }
        if !source.delimiter.is_ascii() {
            bail!(
                "source.delimiter must be a single ASCII character, got {:?}",
                source.delimiter
            );
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    env::var_os(CONFIG_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}
