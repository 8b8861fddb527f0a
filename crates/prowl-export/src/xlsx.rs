//! Excel workbook export and import.

use crate::atomic::write_atomically;
use crate::error::{ExportError, Result};
use crate::layout::{Cell, HeaderMap, Layout};
use calamine::{open_workbook, Data, Reader, Xlsx};
use prowl_core::Record;
use rust_xlsxwriter::{Format, Workbook};
use std::io::Write;
use std::path::Path;

const SHEET_NAME: &str = "Products";

/// Widest column, in characters.
const MAX_COLUMN_WIDTH: usize = 50;

/// Write records as a single-sheet workbook with a bold header row.
#[allow(clippy::cast_precision_loss)]
pub fn write(path: &Path, records: &[Record], layout: &Layout) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let bold = Format::new().set_bold();
    let mut widths: Vec<usize> = layout.headers().iter().map(|h| h.chars().count()).collect();

    for (col, header) in layout.headers().into_iter().enumerate() {
        worksheet.write_string_with_format(0, column_number(col), header, &bold)?;
    }

    for (index, record) in records.iter().enumerate() {
        let row =
            u32::try_from(index + 1).map_err(|_| ExportError::TooManyRows(records.len()))?;

        for (col, cell) in layout.cells(record).into_iter().enumerate() {
            widths[col] = widths[col].max(cell.as_text().chars().count());
            let col = column_number(col);
            match cell {
                Cell::Text(text) if text.is_empty() => {}
                Cell::Text(text) => {
                    worksheet.write_string(row, col, text)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(row, col, n as f64)?;
                }
            }
        }
    }

    for (col, width) in widths.into_iter().enumerate() {
        let width = (width + 2).min(MAX_COLUMN_WIDTH);
        worksheet.set_column_width(column_number(col), width as f64)?;
    }

    let buffer = workbook.save_to_buffer()?;
    write_atomically(path, |writer| {
        writer.write_all(&buffer)?;
        Ok(())
    })
}

/// Layouts have at most nine columns.
#[allow(clippy::cast_possible_truncation)]
fn column_number(index: usize) -> u16 {
    index as u16
}

/// Read records from the first sheet of a workbook.
pub fn read(path: &Path) -> Result<(Vec<Record>, bool)> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ExportError::EmptyWorkbook)??;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Err(ExportError::EmptyWorkbook);
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| cell_text(cell).unwrap_or_default())
        .collect();
    let map = HeaderMap::parse(&headers)?;

    let mut records = Vec::new();
    for (index, row) in rows.enumerate() {
        if row.iter().all(|cell| cell_text(cell).is_none()) {
            continue;
        }
        let record = map.record(index + 2, |col| row.get(col).and_then(cell_text))?;
        records.push(record);
    }

    Ok((records, map.has_enrichment()))
}

/// Text of one cell, `None` when empty.
#[allow(clippy::cast_possible_truncation)]
fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty => return None,
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        other => other.to_string(),
    };
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
