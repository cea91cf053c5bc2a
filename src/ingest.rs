//! Row pipeline: normalize the family, parse the control, merge into the catalog.
//!
//! Rows are processed strictly in the order supplied. A row whose control
//! fails to parse leaves the catalog untouched; the configured policy decides
//! whether that aborts the run or is recorded and skipped.

use crate::catalog::{ControlCatalog, InsertOutcome};
use crate::config::{IngestConfig, MalformedPolicy};
use crate::control::ControlParser;
use crate::error::{ControlError, IngestError};
use crate::family::normalize_family;
use crate::postprocess::drop_leading_placeholder;
use crate::source::SheetRow;
use serde::Serialize;
use tracing::{info, warn};

/// A row that was skipped under [`MalformedPolicy::Skip`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SkippedRow {
    /// 1-based position among the rows fed to the pipeline.
    pub row: usize,
    pub family: String,
    pub control: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct IngestReport {
    pub rows: usize,
    pub inserted: usize,
    pub merged: usize,
    pub unmapped_family_rows: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Owns the catalog while rows are fed in; `finish` hands it back.
#[derive(Debug)]
pub struct Ingestor {
    parser: ControlParser,
    on_malformed: MalformedPolicy,
    drop_leading_placeholder: bool,
    catalog: ControlCatalog,
    report: IngestReport,
}

impl Default for Ingestor {
    fn default() -> Self {
        Self::new(&IngestConfig::default())
    }
}

impl Ingestor {
    pub fn new(config: &IngestConfig) -> Self {
        Self {
            parser: ControlParser::new(config.sub_enhancement),
            on_malformed: config.on_malformed,
            drop_leading_placeholder: config.drop_leading_placeholder,
            catalog: ControlCatalog::with_policy(config.merge),
            report: IngestReport::default(),
        }
    }

    /// Process one `(family, control)` pair.
    ///
    /// Always reports a parse failure to the caller, regardless of policy;
    /// the policy only applies in [`Ingestor::ingest`].
    pub fn ingest_row(
        &mut self,
        family: &str,
        control: &str,
    ) -> Result<InsertOutcome, ControlError> {
        self.report.rows += 1;
        let entry = self.parser.parse(control)?;
        let normalized = normalize_family(family);
        if normalized.is_unmapped() {
            warn!(family, control, "family label not recognized; using unmapped partition");
            self.report.unmapped_family_rows += 1;
        }
        let outcome = self.catalog.insert(normalized, entry);
        match outcome {
            InsertOutcome::Inserted => self.report.inserted += 1,
            InsertOutcome::Merged => self.report.merged += 1,
        }
        Ok(outcome)
    }

    /// Feed a sequence of rows, applying the malformed-row policy.
    pub fn ingest<'a, I>(&mut self, rows: I) -> Result<&IngestReport, IngestError>
    where
        I: IntoIterator<Item = &'a SheetRow>,
    {
        for row in rows {
            if let Err(err) = self.ingest_row(&row.family, &row.control) {
                let position = self.report.rows;
                match self.on_malformed {
                    MalformedPolicy::Abort => {
                        return Err(IngestError::Row {
                            row: position,
                            family: row.family.clone(),
                            source: err,
                        });
                    }
                    MalformedPolicy::Skip => {
                        warn!(row = position, control = %row.control, "skipping malformed control");
                        self.report.skipped.push(SkippedRow {
                            row: position,
                            family: row.family.clone(),
                            control: row.control.clone(),
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
        Ok(&self.report)
    }

    pub fn catalog(&self) -> &ControlCatalog {
        &self.catalog
    }

    /// Run configured post-processing and return the catalog and report.
    pub fn finish(mut self) -> (ControlCatalog, IngestReport) {
        if self.drop_leading_placeholder {
            let removed = drop_leading_placeholder(&mut self.catalog);
            info!(removed, "dropped leading narrative placeholders");
        }
        info!(
            rows = self.report.rows,
            controls = self.catalog.len(),
            skipped = self.report.skipped.len(),
            "ingest finished"
        );
        (self.catalog, self.report)
    }
}

/// Build a catalog from rows in one call.
pub fn build_catalog(
    rows: &[SheetRow],
    config: &IngestConfig,
) -> Result<(ControlCatalog, IngestReport), IngestError> {
    let mut ingestor = Ingestor::new(config);
    ingestor.ingest(rows)?;
    Ok(ingestor.finish())
}
