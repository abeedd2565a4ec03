use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Similarity threshold for text-bearing documents (word processing, presentations).
pub const TEXT_THRESHOLD: f64 = 0.6;

/// Similarity threshold for spreadsheets. Stricter than text: a false
/// positive on structured data costs more than a missed near-duplicate.
pub const TABLE_THRESHOLD: f64 = 0.7;

/// Document family a comparison was requested under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Word,
    Excel,
    PowerPoint,
}

impl DocumentKind {
    pub fn representation(self) -> RepresentationKind {
        match self {
            DocumentKind::Word | DocumentKind::PowerPoint => RepresentationKind::Text,
            DocumentKind::Excel => RepresentationKind::Table,
        }
    }

    /// Guess the document kind from a file extension, as the upstream scanner does.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "docx" | "doc" => Some(DocumentKind::Word),
            "xlsx" | "xlsm" | "xls" | "ods" | "csv" => Some(DocumentKind::Excel),
            "pptx" | "ppt" => Some(DocumentKind::PowerPoint),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::Word => "word",
            DocumentKind::Excel => "excel",
            DocumentKind::PowerPoint => "powerpoint",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "word" => Ok(DocumentKind::Word),
            "excel" => Ok(DocumentKind::Excel),
            "powerpoint" => Ok(DocumentKind::PowerPoint),
            other => Err(format!("unknown document kind '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepresentationKind {
    Text,
    Table,
}

impl RepresentationKind {
    pub fn threshold(self) -> f64 {
        match self {
            RepresentationKind::Text => TEXT_THRESHOLD,
            RepresentationKind::Table => TABLE_THRESHOLD,
        }
    }
}

/// A spreadsheet cell in the type the workbook stored it as.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Int(i64),
    Float(f64),
    Text(String),
    Bool(bool),
    /// Spreadsheet date serial number.
    DateTime(f64),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Text(s) if s.trim().is_empty())
    }

    /// String form used for cell equality. `Int(1)`, `Float(1.0)` and
    /// `Text("1")` all canonicalize to `"1"`.
    pub fn canonical(&self) -> String {
        match self {
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) | CellValue::DateTime(f) => canonical_float(*f),
            CellValue::Text(s) => s.clone(),
            CellValue::Bool(b) => b.to_string(),
        }
    }
}

fn canonical_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

pub type Row = Vec<Option<CellValue>>;

/// Sheet name → retained rows, in document order within each sheet.
pub type Table = BTreeMap<String, Vec<Row>>;

/// The comparison-ready form of one file.
#[derive(Debug, Clone, PartialEq)]
pub enum FileRepresentation {
    Text(String),
    Table(Table),
}

impl FileRepresentation {
    pub fn kind(&self) -> RepresentationKind {
        match self {
            FileRepresentation::Text(_) => RepresentationKind::Text,
            FileRepresentation::Table(_) => RepresentationKind::Table,
        }
    }
}

/// One pairwise comparison in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    pub kind: DocumentKind,
    pub file1: PathBuf,
    pub file2: PathBuf,
}

impl ComparisonRequest {
    pub fn new(kind: DocumentKind, file1: impl Into<PathBuf>, file2: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            file1: file1.into(),
            file2: file2.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityResult {
    pub score: f64,
    pub is_similar: bool,
}

impl SimilarityResult {
    pub fn from_score(kind: RepresentationKind, score: f64) -> Self {
        let score = score.clamp(0.0, 1.0);
        Self {
            score,
            is_similar: score > kind.threshold(),
        }
    }

    pub fn not_similar() -> Self {
        Self {
            score: 0.0,
            is_similar: false,
        }
    }
}
