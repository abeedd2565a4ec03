mod ooxml;
mod workbook;

use crate::error::ExtractionError;
use crate::model::{DocumentKind, FileRepresentation};
use std::path::Path;

pub use workbook::CSV_SHEET_NAME;

/// Turns a file into its comparison-ready representation.
///
/// Implementations must be pure per path: the load cache calls `extract`
/// concurrently from its worker pool and at most once per unique path.
pub trait Extractor: Send + Sync {
    fn extract(&self, kind: DocumentKind, path: &Path) -> Result<FileRepresentation, ExtractionError>;
}

/// Reads Office Open XML documents, workbooks and CSV files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct DocumentExtractor;

impl Extractor for DocumentExtractor {
    fn extract(&self, kind: DocumentKind, path: &Path) -> Result<FileRepresentation, ExtractionError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match (kind, ext.as_str()) {
            (DocumentKind::Word, "docx" | "docm") => ooxml::word_text(path).map(FileRepresentation::Text),
            (DocumentKind::PowerPoint, "pptx" | "pptm") => {
                ooxml::presentation_text(path).map(FileRepresentation::Text)
            }
            (DocumentKind::Excel, "csv") => workbook::csv_table(path).map(FileRepresentation::Table),
            (DocumentKind::Excel, "xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => {
                workbook::workbook_table(path).map(FileRepresentation::Table)
            }
            (kind, ext) => Err(ExtractionError::Unsupported(format!(
                "{} document with extension '{}'",
                kind, ext
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_binary_formats_are_unsupported() {
        let err = DocumentExtractor
            .extract(DocumentKind::Word, Path::new("/nowhere/old.doc"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported(_)));
    }

    #[test]
    fn test_kind_and_extension_must_agree() {
        let err = DocumentExtractor
            .extract(DocumentKind::PowerPoint, Path::new("/nowhere/report.docx"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Unsupported(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = DocumentExtractor
            .extract(DocumentKind::Word, Path::new("/nowhere/missing.docx"))
            .unwrap_err();
        assert!(matches!(err, ExtractionError::Io(_)));
    }
}
