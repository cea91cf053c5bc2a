//! Spreadsheet-to-OpenControl conversion for NIST 800-53 control identifiers.
//!
//! Analysts type control identifiers into a sheet (`AC-2a.`, `AC-3 (3)(b)(1)`)
//! next to a free-text family label. This crate normalizes the family,
//! classifies each identifier into a canonical control key plus a narrative
//! fragment, and merges fragments per control in row order. The resulting
//! `family -> control key -> entry` catalog is written as OpenControl-style
//! JSON.
//!
//! Rows flow through [`Ingestor`]: it owns a [`ControlCatalog`] for the
//! length of one run and hands it back from `finish`. Nothing here is global.

pub mod catalog;
pub mod config;
pub mod control;
pub mod error;
pub mod family;
pub mod ingest;
pub mod opencontrol;
pub mod postprocess;
pub mod source;
pub mod summary;

pub use catalog::{
    CatalogMap, ControlCatalog, ControlEntry, ControlKey, CoveredByMerge, Family, FamilyCode,
    InsertOutcome, MergePolicy, NarrativeEntry, StatusMerge, load_catalog_from_path,
};
pub use config::{IngestConfig, MalformedPolicy, OutputConfig, OutputLayout, SourceConfig};
pub use control::{ControlParser, ControlShape, SubEnhancementPolicy, classify, parse_control};
pub use error::{ControlError, IngestError};
pub use family::normalize_family;
pub use ingest::{IngestReport, Ingestor, SkippedRow, build_catalog};
pub use opencontrol::{
    FamilyDocument, render_catalog, validate_family_document, validate_output_dir, write_catalog,
};
pub use postprocess::drop_leading_placeholder;
pub use source::{SheetRow, parse_row_stream, read_csv_rows};
pub use summary::{CatalogSummary, summarize};
