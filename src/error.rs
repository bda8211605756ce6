// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

/// Every failure the report pipeline can produce.
///
/// The variants map onto how far a failure reaches: configuration errors stop the run,
/// `MissingColumn` and `Format` stop the current input file, and the remaining kinds are
/// scoped to the group whose document was being written or delivered.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid configuration: {0}")]
    ConfigValidation(String),

    #[error("Grouping column '{column}' was not found in '{}'", file.display())]
    MissingColumn { column: String, file: PathBuf },

    #[error("Cannot decode '{}' at line {line}: {message}", file.display())]
    Format {
        file: PathBuf,
        line: u64,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF generation error: {0}")]
    Pdf(String),

    #[error("Mail delivery failed: {0}")]
    Delivery(String),
}

impl From<lopdf::Error> for ReportError {
    fn from(err: lopdf::Error) -> Self {
        ReportError::Pdf(err.to_string())
    }
}

impl ReportError {
    /// Whether the error invalidates the whole input file rather than a single group.
    pub fn aborts_file(&self) -> bool {
        matches!(
            self,
            ReportError::ConfigValidation(_)
                | ReportError::MissingColumn { .. }
                | ReportError::Format { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
