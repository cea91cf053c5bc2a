//! Accumulates parsed control entries per family.
//!
//! One writer feeds entries in row order; a single reader takes the finished
//! map at the end. Repeated `(family, control_key)` pairs are merged, never
//! overwritten, so narrative order always follows insertion order.

use crate::catalog::identity::{ControlKey, Family};
use crate::catalog::model::{CatalogMap, ControlEntry};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// How `implementation_status` is combined when a control is seen again.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusMerge {
    /// The first sighting's status is retained.
    #[default]
    KeepFirst,
    /// A non-empty incoming status replaces the stored one.
    LastNonEmpty,
}

/// How `covered_by` is combined when a control is seen again.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoveredByMerge {
    #[default]
    KeepFirst,
    /// Append components not already present, in first-seen order.
    Union,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePolicy {
    pub implementation_status: StatusMerge,
    pub covered_by: CoveredByMerge,
}

/// Result of a single insert.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InsertOutcome {
    Inserted,
    Merged,
}

/// The `Family -> ControlKey -> ControlEntry` accumulator.
#[derive(Clone, Debug, Default)]
pub struct ControlCatalog {
    policy: MergePolicy,
    families: CatalogMap,
}

impl ControlCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: MergePolicy) -> Self {
        Self {
            policy,
            families: BTreeMap::new(),
        }
    }

    /// Insert an entry, merging into an existing one with the same key.
    ///
    /// The stored `control_key` never changes. Narrative fragments are
    /// appended in call order; status and coverage follow the merge policy.
    pub fn insert(&mut self, family: Family, entry: ControlEntry) -> InsertOutcome {
        let policy = self.policy;
        let controls = self.families.entry(family.clone()).or_default();
        match controls.get_mut(&entry.control_key) {
            None => {
                debug!(family = %family, control = %entry.control_key, "inserted control");
                controls.insert(entry.control_key.clone(), entry);
                InsertOutcome::Inserted
            }
            Some(existing) => {
                debug!(
                    family = %family,
                    control = %entry.control_key,
                    fragments = entry.narrative.len(),
                    "merged control"
                );
                merge_into(existing, entry, policy);
                InsertOutcome::Merged
            }
        }
    }

    /// Controls for one family, if that family has been seen.
    pub fn family(&self, family: &Family) -> Option<&BTreeMap<ControlKey, ControlEntry>> {
        self.families.get(family)
    }

    pub fn get(&self, family: &Family, key: &ControlKey) -> Option<&ControlEntry> {
        self.families.get(family)?.get(key)
    }

    /// Iterates families in stable order.
    pub fn families(&self) -> impl Iterator<Item = &Family> {
        self.families.keys()
    }

    /// The full catalog for downstream serialization.
    pub fn data(&self) -> &CatalogMap {
        &self.families
    }

    pub(crate) fn entries_mut(&mut self) -> impl Iterator<Item = &mut ControlEntry> {
        self.families.values_mut().flat_map(|controls| controls.values_mut())
    }

    pub fn len(&self) -> usize {
        self.families.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_inner(self) -> CatalogMap {
        self.families
    }
}

fn merge_into(existing: &mut ControlEntry, incoming: ControlEntry, policy: MergePolicy) {
    match policy.implementation_status {
        StatusMerge::KeepFirst => {}
        StatusMerge::LastNonEmpty => {
            if !incoming.implementation_status.is_empty() {
                existing.implementation_status = incoming.implementation_status;
            }
        }
    }

    match policy.covered_by {
        CoveredByMerge::KeepFirst => {}
        CoveredByMerge::Union => {
            for component in incoming.covered_by {
                if !existing.covered_by.contains(&component) {
                    existing.covered_by.push(component);
                }
            }
        }
    }

    existing.narrative.extend(incoming.narrative);
}
