// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// extract-tables: detect tables page by page, then write one CSV and one
// XLSX per table (plus a combined workbook when there are several).

use std::io::{BufWriter, Write};

use folio_core::error::{FolioError, Result};
use folio_core::types::{OperationReport, ReportDetail};
use folio_document::tables::sheet_name;
use folio_document::{PdfReader, Table, TableWriter, detect_tables};
use tracing::info;

use super::{OperationContext, UnitStrategy, open_pdf, page_text_or_empty};
use crate::paths;

struct FoundTable {
    page: u32,
    number: usize,
    table: Table,
}

#[derive(Default)]
pub(crate) struct ExtractTables {
    reader: Option<PdfReader>,
    found: Vec<FoundTable>,
}

impl UnitStrategy for ExtractTables {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        let reader = open_pdf(ctx.input()?)?;
        let pages = reader.page_count();
        self.reader = Some(reader);
        Ok(pages)
    }

    fn process(&mut self, index: usize, _ctx: &OperationContext<'_>) -> Result<String> {
        let reader = self
            .reader
            .as_ref()
            .ok_or_else(|| FolioError::Conversion("operation used before begin".into()))?;
        let page = index as u32 + 1;
        let text = page_text_or_empty(reader, page);
        for (table_index, table) in detect_tables(&text).into_iter().enumerate() {
            self.found.push(FoundTable {
                page,
                number: table_index + 1,
                table,
            });
        }
        Ok(format!("Processed page {}/{}", page, reader.page_count()))
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self { found, .. } = *self;

        // No folder unless there is something to put in it.
        if found.is_empty() {
            info!("No tables found");
            return Ok(OperationReport {
                kind: ctx.request.kind,
                outputs: Vec::new(),
                detail: ReportDetail::NoTablesFound,
                summary: "No tables found in the PDF".into(),
            });
        }

        let folder = paths::create_folder_exclusive(&ctx.stem_base("_tables"))?;
        for entry in &found {
            let base = folder.join(format!("table_p{}_t{}", entry.page, entry.number));

            let (_, csv_file) = paths::create_file_exclusive(&base, ".csv")?;
            TableWriter::write_csv(&entry.table, BufWriter::new(csv_file))?;

            let xlsx = TableWriter::xlsx_bytes(&entry.table, &sheet_name(entry.page, entry.number))?;
            let (_, mut xlsx_file) = paths::create_file_exclusive(&base, ".xlsx")?;
            xlsx_file.write_all(&xlsx)?;
        }

        if found.len() > 1 {
            let sheets: Vec<(String, &Table)> = found
                .iter()
                .map(|entry| (sheet_name(entry.page, entry.number), &entry.table))
                .collect();
            let combined = TableWriter::workbook_bytes(&sheets)?;
            let (_, mut file) =
                paths::create_file_exclusive(&folder.join("all_tables_combined"), ".xlsx")?;
            file.write_all(&combined)?;
        }

        info!(tables = found.len(), folder = %folder.display(), "Tables written");
        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!("Extracted {} tables to {}", found.len(), folder.display()),
            outputs: vec![folder],
            detail: ReportDetail::Tables { count: found.len() },
        })
    }
}

#[cfg(test)]
mod tests {
    use folio_core::types::{OperationKind, OperationParams};

    use super::*;
    use crate::operations::test_support::{run, write_pdf};

    #[test]
    fn no_tables_means_no_folder() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "prose.pdf", &["Just a sentence.\nAnother one."]);
        let report = run(OperationKind::ExtractTables, vec![input], OperationParams::default())
            .expect("extract");
        assert_eq!(report.detail, ReportDetail::NoTablesFound);
        assert!(report.is_informational());
        assert!(report.outputs.is_empty());
        assert!(!dir.path().join("prose_tables").exists());
    }

    #[test]
    fn single_table_has_no_combined_workbook() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "prices.pdf", &["Prices\nTea  2.50\nCake  3.00"]);
        let report = run(OperationKind::ExtractTables, vec![input], OperationParams::default())
            .expect("extract");

        let folder = dir.path().join("prices_tables");
        assert_eq!(report.outputs, vec![folder.clone()]);
        assert_eq!(report.detail, ReportDetail::Tables { count: 1 });
        let csv = std::fs::read_to_string(folder.join("table_p1_t1.csv")).expect("csv");
        assert_eq!(csv, "Tea,2.50\nCake,3.00\n");
        assert!(folder.join("table_p1_t1.xlsx").is_file());
        assert!(!folder.join("all_tables_combined.xlsx").exists());
    }

    #[test]
    fn several_tables_get_a_combined_workbook() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(
            dir.path(),
            "report.pdf",
            &["a  b\nc  d", "intro\ne  f\ng  h\nmiddle\ni  j\nk  l"],
        );
        let report = run(OperationKind::ExtractTables, vec![input], OperationParams::default())
            .expect("extract");

        let folder = dir.path().join("report_tables");
        assert_eq!(report.detail, ReportDetail::Tables { count: 3 });
        for name in ["table_p1_t1", "table_p2_t1", "table_p2_t2"] {
            assert!(folder.join(format!("{name}.csv")).is_file(), "{name}.csv");
            assert!(folder.join(format!("{name}.xlsx")).is_file(), "{name}.xlsx");
        }
        assert!(folder.join("all_tables_combined.xlsx").is_file());
    }
}
