// Excel import (xlsx, xls)
//
// One-way conversion: every sheet becomes a dense grid of display
// strings. Values are rendered the way a user would read them so the
// tag scanner and value normalizer see spreadsheet text, not typed
// cells.

use std::io::Cursor;

use calamine::{Data, Reader, Xls, Xlsx};
use closetrack_engine::SheetGrid;

use crate::GridError;

pub fn import_xlsx(bytes: &[u8]) -> Result<Vec<SheetGrid>, GridError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))
        .map_err(|e| GridError::Parse(format!("cannot open xlsx workbook: {e}")))?;
    import_sheets(&mut workbook)
}

pub fn import_xls(bytes: &[u8]) -> Result<Vec<SheetGrid>, GridError> {
    let mut workbook: Xls<_> = Xls::new(Cursor::new(bytes))
        .map_err(|e| GridError::Parse(format!("cannot open xls workbook: {e}")))?;
    import_sheets(&mut workbook)
}

fn import_sheets<RS, R>(workbook: &mut R) -> Result<Vec<SheetGrid>, GridError>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: std::fmt::Display,
{
    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();

    if sheet_names.is_empty() {
        return Err(GridError::Parse("workbook contains no sheets".to_string()));
    }

    let mut sheets = Vec::with_capacity(sheet_names.len());

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| GridError::Parse(format!("failed to read sheet '{sheet_name}': {e}")))?;

        let (height, width) = range.get_size();

        // Empty sheets still appear in the grid so sheet counts match
        // what the user sees in their workbook.
        if height == 0 || width == 0 {
            sheets.push(SheetGrid::new(sheet_name, Vec::new()));
            continue;
        }

        // Range start offset (data may not begin at A1). Pad with blank
        // cells so grid coordinates match spreadsheet coordinates.
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let start_row = start_row as usize;
        let start_col = start_col as usize;

        let mut rows = vec![vec![String::new(); start_col + width]; start_row + height];

        for (row_idx, row) in range.rows().enumerate() {
            for (col_idx, cell) in row.iter().enumerate() {
                let text = render_cell(cell);
                if !text.is_empty() {
                    rows[start_row + row_idx][start_col + col_idx] = text;
                }
            }
        }

        sheets.push(SheetGrid::new(sheet_name, rows));
    }

    Ok(sheets)
}

/// Render a typed cell to the display text a user would see.
fn render_cell(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(n) => {
            // Format nicely: integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{n}")
            }
        }
        Data::Int(n) => format!("{n}"),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{e:?}"),
        // Raw serial number; extraction values are plain numerics, so
        // date cells only matter if someone tags next to one by mistake.
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_render_as_integers_when_whole() {
        assert_eq!(render_cell(&Data::Float(5000.0)), "5000");
        assert_eq!(render_cell(&Data::Float(5000.25)), "5000.25");
        assert_eq!(render_cell(&Data::Float(-120.0)), "-120");
    }

    #[test]
    fn bools_and_empty_render_as_text() {
        assert_eq!(render_cell(&Data::Bool(true)), "TRUE");
        assert_eq!(render_cell(&Data::Bool(false)), "FALSE");
        assert_eq!(render_cell(&Data::Empty), "");
    }

    #[test]
    fn strings_pass_through_untouched() {
        assert_eq!(render_cell(&Data::String("TB-1-1000".to_string())), "TB-1-1000");
        assert_eq!(render_cell(&Data::String("$5,000.00".to_string())), "$5,000.00");
    }
}
