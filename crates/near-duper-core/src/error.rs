use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Batch cancelled")]
    Cancelled,

    #[error("Similar group kept by {keep} has not been reviewed; bulk deletion refused")]
    UnreviewedGroup { keep: PathBuf },

    #[error("'{0}' is not marked for deletion in this decision")]
    NotInDeleteSet(PathBuf),

    #[error("{0}")]
    Other(String),
}

/// Why a single document could not be turned into a representation.
///
/// These never abort a batch; the load cache stores them in place of the
/// representation and the scorer reads them as a 0.0 score.
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Document part '{0}' is missing")]
    MissingPart(String),

    #[error("Unsupported document format: {0}")]
    Unsupported(String),

    #[error("Extraction skipped, batch cancelled")]
    Cancelled,
}
