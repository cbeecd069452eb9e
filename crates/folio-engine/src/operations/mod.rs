// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Operation adapters.
//
// Each operation is a `UnitStrategy`: it opens its inputs and counts units of
// work in `begin`, handles one unit per `process` call, and writes or
// summarises its outputs in `finish`. The shared `execute` driver loops over
// the units and emits a progress checkpoint after each one.

mod compress;
mod convert;
mod images;
mod pages;
mod security;
mod tables;

use std::path::{Path, PathBuf};

use folio_core::config::EngineConfig;
use folio_core::error::Result;
use folio_core::types::{OperationKind, OperationReport, OperationRequest};
use folio_document::{PageRasterizer, PdfReader};
use tracing::{info, instrument, warn};

use crate::progress::ProgressReporter;

/// Everything an adapter may read while it runs.
pub struct OperationContext<'a> {
    pub request: &'a OperationRequest,
    pub config: &'a EngineConfig,
    pub rasterizer: &'a dyn PageRasterizer,
    /// Directory outputs are allocated in.
    pub output_dir: PathBuf,
}

impl<'a> OperationContext<'a> {
    pub fn new(
        request: &'a OperationRequest,
        config: &'a EngineConfig,
        rasterizer: &'a dyn PageRasterizer,
    ) -> Self {
        let output_dir = request
            .output_dir
            .clone()
            .or_else(|| config.output_dir.clone())
            .unwrap_or_else(|| request.resolved_output_dir());
        Self {
            request,
            config,
            rasterizer,
            output_dir,
        }
    }

    /// The single input of a one-document operation.
    pub fn input(&self) -> Result<&Path> {
        self.request.primary_input()
    }

    /// `<output_dir>/<input stem><suffix>`, the base that output names are
    /// allocated from.
    pub fn stem_base(&self, suffix: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}{}", self.request.input_stem(), suffix))
    }

    /// `<output_dir>/<name>`, for outputs named independently of the inputs.
    pub fn named_base(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

/// One operation, split into units of work.
pub trait UnitStrategy {
    /// Open inputs and allocate outputs; return the number of units.
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize>;

    /// Perform unit `index` (0-based); return the progress message.
    fn process(&mut self, index: usize, ctx: &OperationContext<'_>) -> Result<String>;

    /// Write final outputs and describe the result.
    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport>;
}

/// The adapter for `kind`.
pub fn strategy_for(kind: OperationKind) -> Box<dyn UnitStrategy> {
    match kind {
        OperationKind::ConvertToImages => Box::new(convert::ToImages::default()),
        OperationKind::ConvertToWord => Box::new(convert::ToWord::default()),
        OperationKind::ExtractTables => Box::new(tables::ExtractTables::default()),
        OperationKind::ConvertToText => Box::new(convert::ToText::default()),
        OperationKind::ImagesToPdf => Box::new(images::ImagesToPdf::default()),
        OperationKind::Merge => Box::new(pages::Merge::default()),
        OperationKind::Split => Box::new(pages::Split::default()),
        OperationKind::ExtractPages => Box::new(pages::ExtractPages::default()),
        OperationKind::Protect => Box::new(security::Protect::default()),
        OperationKind::Unlock => Box::new(security::Unlock::default()),
        OperationKind::Compress => Box::new(compress::Compress::default()),
        OperationKind::Rotate => Box::new(pages::Rotate::default()),
    }
}

/// Run the operation described by `ctx.request`, reporting a checkpoint after
/// every unit. The terminal event is left to the caller.
#[instrument(skip_all, fields(kind = %ctx.request.kind, inputs = ctx.request.inputs.len()))]
pub fn execute(ctx: &OperationContext<'_>, progress: &mut ProgressReporter) -> Result<OperationReport> {
    let kind = ctx.request.kind;
    progress.running(format!("{}...", kind.label()));
    info!(output_dir = %ctx.output_dir.display(), "Operation started");

    let mut strategy = strategy_for(kind);
    let total = strategy.begin(ctx)?;
    for index in 0..total {
        let message = strategy.process(index, ctx)?;
        progress.step(index + 1, total, message);
    }
    let report = strategy.finish(ctx)?;

    info!(outputs = report.outputs.len(), summary = %report.summary, "Operation finished");
    Ok(report)
}

// -- Helpers shared by the adapters -------------------------------------------

/// Open an input PDF whose pages the operation needs to read. Inputs still
/// behind a password are refused.
pub(crate) fn open_pdf(path: &Path) -> Result<PdfReader> {
    let reader = PdfReader::open(path)?;
    reader.ensure_readable()?;
    Ok(reader)
}

/// Text of a page, or empty when the page has none that can be extracted
/// (scans, unusual font encodings).
pub(crate) fn page_text_or_empty(reader: &PdfReader, page_number: u32) -> String {
    match reader.page_text(page_number) {
        Ok(text) => text,
        Err(err) => {
            warn!(page_number, %err, "No extractable text on page");
            String::new()
        }
    }
}

/// Size of a file in bytes.
pub(crate) fn file_size(path: &Path) -> Result<u64> {
    Ok(std::fs::metadata(path)?.len())
}

/// Common test setup: a temp dir with a synthesised PDF and a runner context.
#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use folio_core::config::EngineConfig;
    use folio_core::types::{OperationKind, OperationParams, OperationReport, OperationRequest};
    use folio_core::error::Result;
    use folio_core::types::TaskId;
    use folio_document::pdf::fixtures::text_pdf;
    use folio_document::{PdfReader, UnavailableRasterizer};

    use super::{OperationContext, execute};
    use crate::progress;

    pub fn write_pdf(dir: &std::path::Path, name: &str, pages: &[&str]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text_pdf(pages)).expect("write fixture");
        path
    }

    /// Like [`write_pdf`], but encrypted with `password`.
    pub fn write_protected_pdf(dir: &std::path::Path, name: &str, pages: &[&str], password: &str) -> PathBuf {
        let mut reader = PdfReader::from_bytes(&text_pdf(pages)).expect("load fixture");
        reader.encrypt(password).expect("encrypt fixture");
        let path = dir.join(name);
        std::fs::write(&path, reader.to_bytes().expect("serialise fixture")).expect("write fixture");
        path
    }

    pub fn run(kind: OperationKind, inputs: Vec<PathBuf>, params: OperationParams) -> Result<OperationReport> {
        let request = OperationRequest::new(kind, inputs).with_params(params);
        let config = EngineConfig::default();
        let rasterizer = UnavailableRasterizer::new("tests");
        let ctx = OperationContext::new(&request, &config, &rasterizer);
        let (mut reporter, _receiver) = progress::channel(TaskId::new());
        execute(&ctx, &mut reporter)
    }
}
