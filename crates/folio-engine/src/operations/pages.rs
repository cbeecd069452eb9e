// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-level PDF operations: merge, split, extract-pages, rotate.

use std::io::Write;
use std::path::{Path, PathBuf};

use folio_core::error::{FolioError, Result};
use folio_core::types::{OperationReport, PageSet, ReportDetail};
use folio_document::{PdfAssembler, PdfReader};
use tracing::debug;

use super::{OperationContext, UnitStrategy, open_pdf};
use crate::{page_range, paths};

fn not_begun() -> FolioError {
    FolioError::PdfError("operation used before begin".into())
}

/// Write `bytes` to the first free `<base>.pdf`.
fn write_pdf(base: &Path, bytes: &[u8]) -> Result<PathBuf> {
    let (path, mut file) = paths::create_file_exclusive(base, ".pdf")?;
    file.write_all(bytes)?;
    Ok(path)
}

// -- merge --------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct Merge {
    assembler: PdfAssembler,
}

impl UnitStrategy for Merge {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        Ok(ctx.request.inputs.len())
    }

    fn process(&mut self, index: usize, ctx: &OperationContext<'_>) -> Result<String> {
        let inputs = &ctx.request.inputs;
        let reader = open_pdf(&inputs[index])?;
        self.assembler.append_document(&reader)?;
        Ok(format!("Merged {}/{} files", index + 1, inputs.len()))
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self { mut assembler } = *self;
        let path = write_pdf(&ctx.named_base("merged_document"), &assembler.to_bytes()?)?;
        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!("PDFs merged into: {}", path.display()),
            outputs: vec![path],
            detail: ReportDetail::Pages {
                count: assembler.page_count(),
            },
        })
    }
}

// -- split --------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct Split {
    reader: Option<PdfReader>,
    folder: Option<PathBuf>,
}

impl UnitStrategy for Split {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        let reader = open_pdf(ctx.input()?)?;
        let pages = reader.page_count();
        self.reader = Some(reader);
        self.folder = Some(paths::create_folder_exclusive(&ctx.stem_base("_split_pages"))?);
        Ok(pages)
    }

    fn process(&mut self, index: usize, _ctx: &OperationContext<'_>) -> Result<String> {
        let (Some(reader), Some(folder)) = (&self.reader, &self.folder) else {
            return Err(not_begun());
        };
        let page = index as u32 + 1;
        let mut assembler = PdfAssembler::new();
        assembler.append_page(reader, page)?;
        write_pdf(&folder.join(format!("page_{page}")), &assembler.to_bytes()?)?;
        Ok(format!("Split page {}/{}", page, reader.page_count()))
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self { reader, folder } = *self;
        let (Some(reader), Some(folder)) = (reader, folder) else {
            return Err(not_begun());
        };
        let pages = reader.page_count();
        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!("PDF split into {} pages in {}", pages, folder.display()),
            outputs: vec![folder],
            detail: ReportDetail::Pages { count: pages },
        })
    }
}

// -- extract-pages ------------------------------------------------------------

#[derive(Default)]
pub(crate) struct ExtractPages {
    reader: Option<PdfReader>,
    requested: PageSet,
    assembler: PdfAssembler,
}

impl UnitStrategy for ExtractPages {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        let text = ctx.request.params.page_range.as_deref().unwrap_or_default();
        // Strict: a typo fails the task instead of silently extracting less.
        self.requested = page_range::parse_strict(text)?;
        self.reader = Some(open_pdf(ctx.input()?)?);
        debug!(requested = %self.requested, "Pages requested");
        Ok(self.requested.len())
    }

    fn process(&mut self, index: usize, _ctx: &OperationContext<'_>) -> Result<String> {
        let reader = self.reader.as_ref().ok_or_else(not_begun)?;
        let page = self.requested.as_slice()[index];
        if page >= 1 && page <= reader.page_count() as i64 {
            self.assembler.append_page(reader, page as u32)?;
        } else {
            debug!(page, pages = reader.page_count(), "Requested page not in document");
        }
        Ok(format!("Extracted page {}/{}", index + 1, self.requested.len()))
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self { mut assembler, .. } = *self;
        let path = write_pdf(&ctx.stem_base("_extracted_pages"), &assembler.to_bytes()?)?;
        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!("Pages extracted to: {}", path.display()),
            outputs: vec![path],
            detail: ReportDetail::Pages {
                count: assembler.page_count(),
            },
        })
    }
}

// -- rotate -------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct Rotate {
    reader: Option<PdfReader>,
    rotated: usize,
}

impl UnitStrategy for Rotate {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        let reader = open_pdf(ctx.input()?)?;
        let pages = reader.page_count();
        self.reader = Some(reader);
        Ok(pages)
    }

    fn process(&mut self, index: usize, ctx: &OperationContext<'_>) -> Result<String> {
        let reader = self.reader.as_mut().ok_or_else(not_begun)?;
        let params = &ctx.request.params;
        let page = index as u32 + 1;
        if params.pages.includes(page) {
            reader.rotate_page(page, params.rotation)?;
            self.rotated += 1;
        }
        Ok(format!("Processed page {}/{}", page, reader.page_count()))
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self { reader, rotated } = *self;
        let mut reader = reader.ok_or_else(not_begun)?;
        let path = write_pdf(&ctx.stem_base("_rotated"), &reader.to_bytes()?)?;
        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!("Rotated {} pages by {} degrees: {}", rotated, ctx.request.params.rotation, path.display()),
            outputs: vec![path],
            detail: ReportDetail::Rotated { pages: rotated },
        })
    }
}
