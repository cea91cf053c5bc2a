//! Control catalog model and accumulator.
//!
//! `identity` holds the grouping keys (family, control key, the fixed family
//! table), `model` the serializable entries, and `repository` the
//! accumulator that merges repeated rows for the same control.

pub mod identity;
pub mod model;
pub mod repository;

pub use identity::{ControlKey, Family, FamilyCode};
pub use model::{
    CatalogMap, ControlEntry, NarrativeEntry, TEXT_FOR_ENHANCEMENT, TEXT_FOR_ENHANCEMENT_PLUS,
    TEXT_ONLY,
};
pub use repository::{ControlCatalog, CoveredByMerge, InsertOutcome, MergePolicy, StatusMerge};

pub use model::load_catalog_from_path;
