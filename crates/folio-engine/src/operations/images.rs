// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// images-to-pdf: one page per input image, in input order.

use std::io::Write;

use folio_core::error::{FolioError, Result};
use folio_core::types::{OperationReport, ReportDetail};
use folio_document::{ImageProcessor, PdfWriter};

use super::{OperationContext, UnitStrategy};
use crate::paths;

const OUTPUT_NAME: &str = "images_combined";

#[derive(Default)]
pub(crate) struct ImagesToPdf {
    writer: Option<PdfWriter>,
}

impl UnitStrategy for ImagesToPdf {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        self.writer = Some(PdfWriter::new(ctx.request.params.paper_size, "Images"));
        Ok(ctx.request.inputs.len())
    }

    fn process(&mut self, index: usize, ctx: &OperationContext<'_>) -> Result<String> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| FolioError::Conversion("operation used before begin".into()))?;
        let inputs = &ctx.request.inputs;
        let image = ImageProcessor::open(&inputs[index])?.flatten_onto_white();
        writer.push_image(image.as_dynamic())?;
        Ok(format!("Processed image {}/{}", index + 1, inputs.len()))
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self { writer } = *self;
        let writer = writer.ok_or_else(|| FolioError::Conversion("operation used before begin".into()))?;
        let pages = writer.page_count();
        let bytes = writer.finish();

        let (path, mut file) = paths::create_file_exclusive(&ctx.named_base(OUTPUT_NAME), ".pdf")?;
        file.write_all(&bytes)?;

        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!("PDF created: {}", path.display()),
            outputs: vec![path],
            detail: ReportDetail::Images { count: pages },
        })
    }
}
