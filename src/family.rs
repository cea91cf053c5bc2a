//! Family label normalization.
//!
//! Spreadsheet family labels arrive with irregular spacing. Whitespace runs
//! become a single underscore and the resulting token is looked up in the
//! fixed NIST family table.

use crate::catalog::{Family, FamilyCode};
use regex::Regex;
use std::sync::LazyLock;

// Unicode `\s`: no-break and other Unicode spaces match too.
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern compiles"));

/// Collapse every whitespace run to `_` (`"ACCESS   CONTROL"` -> `ACCESS_CONTROL`).
pub fn family_token(raw: &str) -> String {
    WHITESPACE.replace_all(raw, "_").into_owned()
}

/// Map a raw family label to its recognized family, if any.
pub fn lookup_family(raw: &str) -> Option<FamilyCode> {
    FamilyCode::from_token(&family_token(raw))
}

/// Map a raw family label to its canonical code.
///
/// Unknown labels yield the empty `Family`, which callers treat as its own
/// partition rather than an error.
pub fn normalize_family(raw: &str) -> Family {
    lookup_family(raw).map(Family::from).unwrap_or_else(Family::unmapped)
}
