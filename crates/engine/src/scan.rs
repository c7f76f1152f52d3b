//! Grid walker: locates tag occurrences and reads the adjacent value.
//!
//! Scan order is sheet ascending, row ascending, column ascending. The
//! candidate value is always the cell immediately to the left of the tag in
//! the same row. Failures come back as data in the report, never as control
//! transfers — one bad tag must not take out the rest of a bulk run.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::{ExtractError, ValueFailure};
use crate::grid::{CellRef, Grid};
use crate::normalize::normalize;
use crate::tag::ReconTag;

/// A tag occurrence with a successfully normalized adjacent value.
#[derive(Debug, Clone, Serialize)]
pub struct TagHit {
    pub tag: ReconTag,
    pub value: Decimal,
    /// The adjacent cell's raw text, kept for diagnostics.
    pub raw: String,
    pub location: CellRef,
}

/// A tag occurrence whose adjacent value could not be extracted.
#[derive(Debug, Clone, Serialize)]
pub struct ScanFailure {
    pub tag: ReconTag,
    pub failure: ValueFailure,
    pub location: CellRef,
}

/// Non-fatal warning: the same tag appeared again after its authoritative
/// first occurrence. First occurrence wins; extras are reported, not dropped.
#[derive(Debug, Clone, Serialize)]
pub struct DuplicateHit {
    pub tag: ReconTag,
    pub first: CellRef,
    pub duplicate: CellRef,
}

/// Everything one full-grid scan produced, one entry per distinct tag plus a
/// warning per extra occurrence.
#[derive(Debug, Default, Serialize)]
pub struct ScanReport {
    pub hits: Vec<TagHit>,
    pub failures: Vec<ScanFailure>,
    pub duplicates: Vec<DuplicateHit>,
}

impl ScanReport {
    /// Distinct tags encountered, hit or failed.
    pub fn tags_seen(&self) -> Vec<&ReconTag> {
        self.hits
            .iter()
            .map(|h| &h.tag)
            .chain(self.failures.iter().map(|f| &f.tag))
            .collect()
    }
}

/// Read the cell to the left of a tag occurrence and normalize it.
fn adjacent_value(grid: &Grid, at: CellRef) -> Result<(Decimal, String), ValueFailure> {
    if at.col == 0 {
        return Err(ValueFailure::NoAdjacentValue);
    }
    let left = CellRef { sheet: at.sheet, row: at.row, col: at.col - 1 };
    // A ragged short row has no cell there; treat like a blank one.
    let raw = grid.cell(left).unwrap_or("");
    let value = normalize(raw)?;
    Ok((value, raw.to_string()))
}

/// Discover every tag for `period_id` in the grid and extract its value.
///
/// Tags for other periods are ignored. The first occurrence of each tag is
/// authoritative — even when its extraction failed — and every later
/// occurrence is reported as a duplicate warning.
pub fn scan_all(grid: &Grid, period_id: u32) -> ScanReport {
    let mut report = ScanReport::default();
    let mut seen: HashMap<ReconTag, CellRef> = HashMap::new();

    for (sheet_idx, sheet) in grid.sheets.iter().enumerate() {
        for (row_idx, row) in sheet.rows().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let Some(tag) = ReconTag::find_in(cell.trim()) else {
                    continue;
                };
                if tag.period_id() != period_id {
                    continue;
                }
                let at = CellRef { sheet: sheet_idx, row: row_idx, col: col_idx };

                if let Some(&first) = seen.get(&tag) {
                    report.duplicates.push(DuplicateHit { tag, first, duplicate: at });
                    continue;
                }
                seen.insert(tag.clone(), at);

                match adjacent_value(grid, at) {
                    Ok((value, raw)) => report.hits.push(TagHit { tag, value, raw, location: at }),
                    Err(failure) => report.failures.push(ScanFailure { tag, failure, location: at }),
                }
            }
        }
    }

    report
}

/// Search for one specific tag, stopping at its first occurrence.
pub fn scan_one(grid: &Grid, target: &ReconTag) -> Result<TagHit, ExtractError> {
    for (sheet_idx, sheet) in grid.sheets.iter().enumerate() {
        for (row_idx, row) in sheet.rows().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let found = ReconTag::find_in(cell.trim());
                if found.as_ref() != Some(target) {
                    continue;
                }
                let at = CellRef { sheet: sheet_idx, row: row_idx, col: col_idx };
                return match adjacent_value(grid, at) {
                    Ok((value, raw)) => {
                        Ok(TagHit { tag: target.clone(), value, raw, location: at })
                    }
                    Err(failure) => Err(ExtractError::ValueExtraction {
                        tag: target.to_string(),
                        failure,
                        location: Some(at),
                    }),
                };
            }
        }
    }
    Err(ExtractError::TagNotFound(target.to_string()))
}
