//! Readers for the `(family, control)` rows handed to the pipeline.
//!
//! Rows come from whatever exported the spreadsheet: a CSV download, or a
//! JSON dump of the sheet values. Row order is preserved exactly since it
//! determines narrative order.

use crate::config::SourceConfig;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use tracing::debug;

/// One spreadsheet row as the pipeline sees it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    pub family: String,
    pub control: String,
}

impl SheetRow {
    pub fn new(family: impl Into<String>, control: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            control: control.into(),
        }
    }

    fn is_blank(&self) -> bool {
        self.family.trim().is_empty() && self.control.trim().is_empty()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRow {
    Object { family: String, control: String },
    Pair((String, String)),
}

impl From<RawRow> for SheetRow {
    fn from(raw: RawRow) -> Self {
        match raw {
            RawRow::Object { family, control } | RawRow::Pair((family, control)) => {
                SheetRow { family, control }
            }
        }
    }
}

/// Read rows from a CSV export of the sheet.
///
/// Skips `header_rows`, then picks the configured columns. A short row
/// treats the missing cell as empty; rows where both cells are blank (the
/// trailing empty rows sheets tend to export) are dropped.
pub fn read_csv_rows<R: Read>(reader: R, source: &SourceConfig) -> Result<Vec<SheetRow>> {
    let delimiter = u8::try_from(source.delimiter)
        .with_context(|| format!("delimiter {:?} is not a single byte", source.delimiter))?;
    let mut csv = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (idx, record) in csv.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV line {}", idx + 1))?;
        if idx < source.header_rows {
            continue;
        }
        let cell = |col: usize| record.get(col).unwrap_or_default().to_string();
        let row = SheetRow {
            family: cell(source.family_column),
            control: cell(source.control_column),
        };
        if row.is_blank() {
            debug!(line = idx + 1, "skipping blank row");
            continue;
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Parse rows from JSON, accepting an array, a single row, or NDJSON.
///
/// Each row is either `{"family": .., "control": ..}` or a two-element
/// `[family, control]` array. Empty input is an error.
pub fn parse_row_stream(input: &str) -> Result<Vec<SheetRow>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        bail!("No input provided");
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return match value {
            Value::Array(items) if items.iter().all(Value::is_string) => {
                serde_json::from_value::<RawRow>(Value::Array(items))
                    .map(|row| vec![row.into()])
                    .context("Unable to parse row")
            }
            Value::Array(items) => items
                .into_iter()
                .map(|item| serde_json::from_value::<RawRow>(item).map(SheetRow::from))
                .collect::<Result<Vec<_>, _>>()
                .context("Unable to parse JSON array of rows"),
            Value::Object(_) => serde_json::from_value::<RawRow>(value)
                .map(|row| vec![row.into()])
                .context("Unable to parse row"),
            _ => bail!("Unsupported JSON input; expected object or array"),
        };
    }

    let mut rows = Vec::new();
    for (idx, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row: RawRow = serde_json::from_str(line)
            .with_context(|| format!("Unable to parse row from line {}", idx + 1))?;
        rows.push(row.into());
    }

    if rows.is_empty() {
        bail!("No rows found in input stream");
    }

    Ok(rows)
}
