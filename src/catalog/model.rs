//! Serializable representation of one control's documentation state.
//!
//! Field names follow the OpenControl `satisfies` entry so the emitted JSON
//! can be dropped into a component document unchanged.

use crate::catalog::identity::{ControlKey, Family};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Placeholder text for a control or sub-control without an enhancement.
pub const TEXT_ONLY: &str = "Text only";
/// Placeholder text for a lettered/numbered enhancement.
pub const TEXT_FOR_ENHANCEMENT: &str = "Text for enhancement";
/// Placeholder text for an enhancement whose key includes a sub-enhancement.
pub const TEXT_FOR_ENHANCEMENT_PLUS: &str = "Text for enhancement plus";

/// Full catalog: family partition, then control key, then the entry.
pub type CatalogMap = BTreeMap<Family, BTreeMap<ControlKey, ControlEntry>>;

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
/// Accumulated documentation for a single control or sub-control.
pub struct ControlEntry {
    pub control_key: ControlKey,
    #[serde(default)]
    pub covered_by: Vec<String>,
    #[serde(default)]
    pub implementation_status: String,
    #[serde(default)]
    pub narrative: Vec<NarrativeEntry>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
/// One narrative fragment, optionally keyed by an enhancement path (`a`, `a.1`).
pub struct NarrativeEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    pub text: String,
}

impl ControlEntry {
    /// Entry with one narrative fragment and empty status/coverage.
    pub fn with_narrative(control_key: ControlKey, fragment: NarrativeEntry) -> Self {
        Self {
            control_key,
            covered_by: Vec::new(),
            implementation_status: String::new(),
            narrative: vec![fragment],
        }
    }
}

impl NarrativeEntry {
    pub fn text_only() -> Self {
        Self {
            key: None,
            text: TEXT_ONLY.to_string(),
        }
    }

    pub fn for_enhancement(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            text: TEXT_FOR_ENHANCEMENT.to_string(),
        }
    }

    pub fn for_enhancement_plus(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            text: TEXT_FOR_ENHANCEMENT_PLUS.to_string(),
        }
    }
}

/// Read a previously emitted single-file catalog back from disk.
pub fn load_catalog_from_path(path: &Path) -> Result<CatalogMap> {
    let data = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let catalog: CatalogMap =
        serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?;
    Ok(catalog)
}
