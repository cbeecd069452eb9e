// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// compress: re-encode images and compact the object table.

use std::io::Write;

use folio_core::error::{FolioError, Result};
use folio_core::types::{OperationReport, ReportDetail};
use folio_document::PdfReader;
use tracing::info;

use super::{OperationContext, UnitStrategy, file_size, open_pdf};
use crate::paths;

#[derive(Default)]
pub(crate) struct Compress {
    reader: Option<PdfReader>,
    original_bytes: u64,
}

impl UnitStrategy for Compress {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        let input = ctx.input()?;
        self.original_bytes = file_size(input)?;
        self.reader = Some(open_pdf(input)?);
        Ok(1)
    }

    fn process(&mut self, _index: usize, ctx: &OperationContext<'_>) -> Result<String> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| FolioError::PdfError("operation used before begin".into()))?;
        let images = reader.compress(ctx.request.params.quality)?;
        Ok(format!("Compressed document ({images} images re-encoded)"))
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self {
            reader,
            original_bytes,
        } = *self;
        let mut reader =
            reader.ok_or_else(|| FolioError::PdfError("operation used before begin".into()))?;
        let bytes = reader.to_bytes()?;
        let (path, mut file) = paths::create_file_exclusive(&ctx.stem_base("_compressed"), ".pdf")?;
        file.write_all(&bytes)?;

        let new_bytes = bytes.len() as u64;
        let reduction_percent = reduction_percent(original_bytes, new_bytes);
        info!(original_bytes, new_bytes, reduction_percent, "Compression finished");

        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!(
                "Compressed {} -> {} bytes ({:.1}% smaller): {}",
                original_bytes,
                new_bytes,
                reduction_percent,
                path.display()
            ),
            outputs: vec![path],
            detail: ReportDetail::Compression {
                original_bytes,
                new_bytes,
                reduction_percent,
            },
        })
    }
}

/// Percentage saved; negative when the output grew.
fn reduction_percent(original: u64, new: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (1.0 - new as f64 / original as f64) * 100.0
}
