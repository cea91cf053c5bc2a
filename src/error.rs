use thiserror::Error;

/// Failure to classify a raw control identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ControlError {
    /// The identifier matched none of the recognized control shapes.
    #[error("malformed control identifier '{raw}'")]
    Malformed { raw: String },
}

impl ControlError {
    /// The identifier exactly as it was supplied.
    pub fn raw(&self) -> &str {
        match self {
            ControlError::Malformed { raw } => raw,
        }
    }
}

/// Pipeline failure under the abort-on-malformed policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    #[error("row {row} (family '{family}')")]
    Row {
        /// 1-based position among the data rows fed to the pipeline.
        row: usize,
        family: String,
        #[source]
        source: ControlError,
    },
}
