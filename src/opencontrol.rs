//! OpenControl-style output for a finished catalog.
//!
//! The catalog is written either as one nested `catalog.json` or as one
//! `satisfies` document per family. Per-family documents can be checked
//! against the bundled JSON Schema before anything downstream consumes them.

use crate::catalog::{ControlCatalog, ControlEntry, ControlKey, Family};
use crate::config::{OutputConfig, OutputLayout};
use anyhow::{Context, Result, anyhow, bail};
use jsonschema::JSONSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

pub const CATALOG_FILE_NAME: &str = "catalog.json";
pub const UNMAPPED_FILE_STEM: &str = "unmapped";

const FAMILY_DOCUMENT_SCHEMA: &str = include_str!("../schema/family_document.schema.json");

/// Controls of one family in OpenControl `satisfies` form, ordered by key.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FamilyDocument {
    pub family: Family,
    pub satisfies: Vec<ControlEntry>,
}

pub fn family_document(
    family: &Family,
    controls: &BTreeMap<ControlKey, ControlEntry>,
) -> FamilyDocument {
    FamilyDocument {
        family: family.clone(),
        satisfies: controls.values().cloned().collect(),
    }
}

/// The whole catalog as `{family: {control_key: entry}}`.
pub fn catalog_document(catalog: &ControlCatalog) -> Result<Value> {
    serde_json::to_value(catalog.data()).context("serializing catalog")
}

/// File name used for a family's document; the unmapped partition gets a fixed stem.
pub fn family_file_name(family: &Family) -> String {
    if family.is_unmapped() {
        format!("{UNMAPPED_FILE_STEM}.json")
    } else {
        format!("{}.json", family.as_str())
    }
}

/// Write the catalog under `out_dir` using the configured layout.
///
/// Each file is written to a temporary sibling first and renamed into place,
/// so a failed run never leaves a half-written document behind. Returns the
/// paths written, in family order.
pub fn write_catalog(
    catalog: &ControlCatalog,
    out_dir: &Path,
    output: &OutputConfig,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output dir {}", out_dir.display()))?;

    let mut written = Vec::new();
    match output.layout {
        OutputLayout::Single => {
            let path = out_dir.join(CATALOG_FILE_NAME);
            write_json_atomic(&path, &catalog_document(catalog)?, output.pretty)?;
            written.push(path);
        }
        OutputLayout::PerFamily => {
            for (family, controls) in catalog.data() {
                let path = out_dir.join(family_file_name(family));
                let value = serde_json::to_value(family_document(family, controls))
                    .with_context(|| format!("serializing family '{family}'"))?;
                write_json_atomic(&path, &value, output.pretty)?;
                written.push(path);
            }
        }
    }
    info!(files = written.len(), dir = %out_dir.display(), "wrote catalog");
    Ok(written)
}

/// Serialize the catalog to a string in the requested style.
pub fn render_catalog(catalog: &ControlCatalog, pretty: bool) -> Result<String> {
    let value = catalog_document(catalog)?;
    render_json(&value, pretty)
}

fn render_json(value: &Value, pretty: bool) -> Result<String> {
    let rendered = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    rendered.context("rendering JSON")
}

fn write_json_atomic(path: &Path, value: &Value, pretty: bool) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", path.display()))?;
    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {}", dir.display()))?;
    let mut rendered = render_json(value, pretty)?;
    rendered.push('\n');
    tmp.write_all(rendered.as_bytes())
        .with_context(|| format!("writing {}", path.display()))?;
    tmp.persist(path)
        .with_context(|| format!("persisting {}", path.display()))?;
    Ok(())
}

/// Compiled validator for per-family documents.
pub struct DocumentValidator {
    compiled: JSONSchema,
}

impl DocumentValidator {
    pub fn new() -> Result<Self> {
        let schema: Value = serde_json::from_str(FAMILY_DOCUMENT_SCHEMA)
            .context("parsing bundled family document schema")?;
        let compiled = JSONSchema::compile(&schema)
            .map_err(|err| anyhow!("compiling family document schema: {err}"))?;
        Ok(Self { compiled })
    }

    /// All schema violations for `document`; empty when valid.
    pub fn validate(&self, document: &Value) -> Vec<String> {
        match self.compiled.validate(document) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|err| format!("{}: {}", err.instance_path, err))
                .collect(),
        }
    }
}

/// Validate a single family document against the bundled schema.
pub fn validate_family_document(document: &Value) -> Result<Vec<String>> {
    Ok(DocumentValidator::new()?.validate(document))
}

/// Validate every JSON document under `dir`.
///
/// Per-family files are checked directly; a `catalog.json` is split into
/// per-family documents first. Problems are collected rather than returned on
/// the first failure so one run reports everything.
pub fn validate_output_dir(dir: &Path) -> Result<Vec<String>> {
    let validator = DocumentValidator::new()?;
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("reading {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json"))
        .collect();
    files.sort();

    let mut errors = Vec::new();
    for path in files {
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) => {
                errors.push(format!("{}: unable to read: {err}", path.display()));
                continue;
            }
        };
        let value: Value = match serde_json::from_str(&data) {
            Ok(value) => value,
            Err(err) => {
                errors.push(format!("{}: invalid JSON: {err}", path.display()));
                continue;
            }
        };

        let is_catalog = path.file_name().and_then(|n| n.to_str()) == Some(CATALOG_FILE_NAME);
        let documents = if is_catalog {
            match split_catalog(value) {
                Ok((documents, problems)) => {
                    for problem in problems {
                        errors.push(format!("{}: {problem}", path.display()));
                    }
                    documents
                }
                Err(err) => {
                    errors.push(format!("{}: {err:#}", path.display()));
                    continue;
                }
            }
        } else {
            vec![value]
        };

        for document in documents {
            for problem in validator.validate(&document) {
                errors.push(format!("{}: {problem}", path.display()));
            }
        }
    }
    Ok(errors)
}

/// Split a raw `catalog.json` value into per-family documents.
///
/// Entries are carried over untouched so the schema sees exactly what is on
/// disk. A control whose map key differs from its `control_key` is reported
/// as a problem.
fn split_catalog(value: Value) -> Result<(Vec<Value>, Vec<String>)> {
    let Value::Object(families) = value else {
        bail!("catalog must be an object keyed by family");
    };

    let mut documents = Vec::with_capacity(families.len());
    let mut problems = Vec::new();
    for (family, controls) in families {
        let Value::Object(controls) = controls else {
            problems.push(format!("/{family}: expected an object keyed by control"));
            continue;
        };
        let mut satisfies = Vec::with_capacity(controls.len());
        for (key, entry) in controls {
            match entry.get("control_key").and_then(Value::as_str) {
                Some(control_key) if control_key != key => problems.push(format!(
                    "/{family}/{key}: control_key '{control_key}' does not match its catalog key"
                )),
                _ => {}
            }
            satisfies.push(entry);
        }
        documents.push(json!({ "family": family, "satisfies": satisfies }));
    }
    Ok((documents, problems))
}
