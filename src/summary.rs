//! Per-family accounting for a finished catalog.
//!
//! Used by the CLI to report what a run produced, both as JSON and as the
//! `> family` / `- control` listing compliance analysts read on the terminal.

use crate::catalog::{ControlCatalog, Family};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

/// How many controls a family holds and how many narrative fragments they carry.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct FamilySummary {
    pub controls: usize,
    pub narrative_fragments: usize,
    pub control_keys: Vec<String>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
pub struct CatalogSummary {
    pub families: BTreeMap<Family, FamilySummary>,
    pub total_controls: usize,
    pub total_fragments: usize,
}

pub fn summarize(catalog: &ControlCatalog) -> CatalogSummary {
    let mut summary = CatalogSummary::default();
    for (family, controls) in catalog.data() {
        let entry = summary.families.entry(family.clone()).or_default();
        for (key, control) in controls {
            entry.controls += 1;
            entry.narrative_fragments += control.narrative.len();
            entry.control_keys.push(key.0.clone());
        }
        summary.total_controls += entry.controls;
        summary.total_fragments += entry.narrative_fragments;
    }
    summary
}

/// Human listing: one `> family` header per family, one `- control` line per entry.
pub fn render_listing(catalog: &ControlCatalog) -> String {
    let mut out = String::new();
    for (family, controls) in catalog.data() {
        let label = if family.is_unmapped() {
            "(unmapped)"
        } else {
            family.as_str()
        };
        let _ = writeln!(out, "> {label}");
        for control in controls.values() {
            let keys: Vec<&str> = control
                .narrative
                .iter()
                .map(|n| n.key.as_deref().unwrap_or("-"))
                .collect();
            let _ = writeln!(out, "- {} [{}]", control.control_key, keys.join(", "));
        }
    }
    out
}
