// Document adapters: supporting documents and trial balance uploads
// arrive as xlsx, xls, or delimited text and are flattened into the
// engine's cell grid model before tag scanning.

pub mod csv;
pub mod xlsx;

use std::fmt;
use std::path::Path;

use closetrack_engine::Grid;

/// Upload formats accepted for tag extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Xlsx,
    Xls,
    Delimited,
}

impl DocumentFormat {
    /// Determine the format from the uploaded filename's extension
    /// (case-insensitive). Anything else is rejected up front rather
    /// than sniffed, so a mislabelled binary fails with a clear error.
    pub fn from_filename(filename: &str) -> Result<Self, GridError> {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match ext.as_str() {
            "xlsx" => Ok(DocumentFormat::Xlsx),
            "xls" => Ok(DocumentFormat::Xls),
            "csv" | "tsv" | "txt" => Ok(DocumentFormat::Delimited),
            _ => Err(GridError::UnsupportedFormat(filename.to_string())),
        }
    }
}

/// Errors raised while turning an uploaded document into a grid.
#[derive(Debug)]
pub enum GridError {
    /// Filename extension is not one of the accepted document formats.
    UnsupportedFormat(String),
    /// The file matched a known format but could not be parsed.
    Parse(String),
}

impl fmt::Display for GridError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridError::UnsupportedFormat(name) => {
                write!(f, "unsupported document format: {name} (expected .xlsx, .xls, .csv, .tsv or .txt)")
            }
            GridError::Parse(msg) => write!(f, "failed to parse document: {msg}"),
        }
    }
}

impl std::error::Error for GridError {}

/// Load an uploaded document into a [`Grid`].
///
/// The grid preserves the document's coordinates: cell (row, col) in the
/// grid is the same cell a person sees in their spreadsheet, so scan
/// diagnostics point at real locations.
pub fn load_document(bytes: &[u8], filename: &str) -> Result<Grid, GridError> {
    match DocumentFormat::from_filename(filename)? {
        DocumentFormat::Xlsx => Ok(Grid::new(xlsx::import_xlsx(bytes)?)),
        DocumentFormat::Xls => Ok(Grid::new(xlsx::import_xls(bytes)?)),
        DocumentFormat::Delimited => {
            let stem = Path::new(filename)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("Sheet1");
            Ok(Grid::new(vec![csv::import(bytes, stem)?]))
        }
    }
}
