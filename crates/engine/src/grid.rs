use serde::Serialize;

/// Zero-based cell address within a loaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CellRef {
    pub sheet: usize,
    pub row: usize,
    pub col: usize,
}

impl std::fmt::Display for CellRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sheet {} row {} col {}", self.sheet, self.row, self.col)
    }
}

/// One sheet as a 2-D array of raw cell strings.
///
/// Blank cells are empty strings. Rows may be ragged (delimited-text inputs
/// don't pad); [`SheetGrid::cell`] returns `None` past a row's end, which is
/// distinct from an explicitly blank cell.
#[derive(Debug, Clone)]
pub struct SheetGrid {
    pub name: String,
    rows: Vec<Vec<String>>,
}

impl SheetGrid {
    pub fn new(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self { name: name.into(), rows }
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows.get(row).and_then(|r| r.get(col)).map(String::as_str)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(Vec::as_slice)
    }
}

/// Uniform addressable model for every supported document form.
///
/// Spreadsheets keep their sheet order; delimited text becomes a single
/// implicit sheet. No numeric interpretation happens here — cells are raw
/// strings exactly as the adapter rendered them.
#[derive(Debug, Clone, Default)]
pub struct Grid {
    pub sheets: Vec<SheetGrid>,
}

impl Grid {
    pub fn new(sheets: Vec<SheetGrid>) -> Self {
        Self { sheets }
    }

    /// Wrap one sheet of rows, e.g. parsed delimited text.
    pub fn single_sheet(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self { sheets: vec![SheetGrid::new(name, rows)] }
    }

    pub fn cell(&self, at: CellRef) -> Option<&str> {
        self.sheets.get(at.sheet).and_then(|s| s.cell(at.row, at.col))
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }
}
