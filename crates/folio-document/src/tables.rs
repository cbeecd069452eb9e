// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Table detection in extracted page text, and CSV / XLSX output.
//
// Detection is textual: a line whose cells are separated by tabs or by runs
// of two or more spaces is a table row, and two or more consecutive rows form
// a table.

use std::io::Write;

use folio_core::error::{FolioError, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use tracing::debug;

/// Excel's limit on worksheet name length.
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// A rectangular grid of cells found on one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Build a table, padding short rows and dropping columns that are empty
    /// in every row.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        let keep: Vec<bool> = (0..width)
            .map(|col| rows.iter().any(|row| row.get(col).is_some_and(|cell| !cell.is_empty())))
            .collect();

        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row.into_iter()
                    .zip(&keep)
                    .filter_map(|(cell, keep)| keep.then_some(cell))
                    .collect::<Vec<_>>()
            })
            .filter(|row| row.iter().any(|cell| !cell.is_empty()))
            .collect();
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }
}

/// Find the tables in one page of extracted text.
pub fn detect_tables(page_text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<String>> = Vec::new();

    for line in page_text.lines() {
        let cells = split_cells(line);
        let filled = cells.iter().filter(|cell| !cell.is_empty()).count();
        if filled >= 2 {
            current.push(cells);
            continue;
        }
        flush(&mut current, &mut tables);
    }
    flush(&mut current, &mut tables);

    debug!(tables = tables.len(), "Tables detected");
    tables
}

fn flush(current: &mut Vec<Vec<String>>, tables: &mut Vec<Table>) {
    if current.len() >= 2 {
        let table = Table::new(std::mem::take(current));
        if table.row_count() >= 2 && table.column_count() >= 2 {
            tables.push(table);
        }
    }
    current.clear();
}

/// Split a line on tabs and on runs of two or more spaces.
fn split_cells(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    for segment in line.split('\t') {
        let mut current = String::new();
        let mut spaces = 0usize;
        for ch in segment.trim().chars() {
            if ch == ' ' {
                spaces += 1;
                continue;
            }
            if spaces >= 2 {
                cells.push(std::mem::take(&mut current));
            } else if spaces == 1 {
                current.push(' ');
            }
            spaces = 0;
            current.push(ch);
        }
        cells.push(current);
    }
    cells
}

/// Worksheet name for table `table` (1-based) on page `page`.
pub fn sheet_name(page: u32, table: usize) -> String {
    let mut name = format!("Page_{}_Table_{}", page, table);
    name.truncate(MAX_SHEET_NAME_LEN);
    name
}

/// Writes detected tables as CSV and XLSX.
pub struct TableWriter;

impl TableWriter {
    /// Write `table` as CSV into `writer`.
    pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        for row in table.rows() {
            csv_writer
                .write_record(row)
                .map_err(|err| FolioError::Conversion(format!("CSV write failed: {}", err)))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Encode `table` as a one-sheet workbook.
    pub fn xlsx_bytes(table: &Table, name: &str) -> Result<Vec<u8>> {
        Self::workbook_bytes(&[(name.to_string(), table)])
    }

    /// Encode several tables as one workbook, one sheet each.
    pub fn workbook_bytes(sheets: &[(String, &Table)]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        for (name, table) in sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name).map_err(xlsx_error)?;
            fill_sheet(worksheet, table)?;
        }
        workbook.save_to_buffer().map_err(xlsx_error)
    }
}

fn fill_sheet(worksheet: &mut Worksheet, table: &Table) -> Result<()> {
    for (row_index, row) in table.rows().iter().enumerate() {
        let row_number = u32::try_from(row_index)
            .map_err(|_| FolioError::Conversion("table has too many rows".into()))?;
        for (col_index, cell) in row.iter().enumerate() {
            let col_number = u16::try_from(col_index)
                .map_err(|_| FolioError::Conversion("table has too many columns".into()))?;
            match cell.parse::<f64>() {
                Ok(number) if number.is_finite() => {
                    worksheet.write_number(row_number, col_number, number).map_err(xlsx_error)?;
                }
                _ => {
                    worksheet.write_string(row_number, col_number, cell).map_err(xlsx_error)?;
                }
            }
        }
    }
    Ok(())
}

fn xlsx_error(err: rust_xlsxwriter::XlsxError) -> FolioError {
    FolioError::Conversion(format!("XLSX write failed: {}", err))
}
