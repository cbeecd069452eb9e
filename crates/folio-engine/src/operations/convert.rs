// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF to images, Word, and plain text. One unit per page.

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::Utc;
use folio_core::error::{FolioError, Result};
use folio_core::types::{OperationReport, ReportDetail};
use folio_document::{ImageProcessor, PdfReader, WordWriter};
use tracing::debug;

use super::{OperationContext, UnitStrategy, open_pdf, page_text_or_empty};
use crate::paths;

fn not_begun() -> FolioError {
    FolioError::Conversion("operation used before begin".into())
}

// -- convert-to-images --------------------------------------------------------

#[derive(Default)]
pub(crate) struct ToImages {
    folder: Option<PathBuf>,
    page_count: usize,
    written: usize,
}

impl UnitStrategy for ToImages {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        let reader = open_pdf(ctx.input()?)?;
        self.page_count = reader.page_count();
        self.folder = Some(paths::create_folder_exclusive(&ctx.stem_base("_images"))?);
        debug!(rasterizer = ctx.rasterizer.name(), pages = self.page_count, "Rendering pages");
        Ok(self.page_count)
    }

    fn process(&mut self, index: usize, ctx: &OperationContext<'_>) -> Result<String> {
        let folder = self.folder.as_ref().ok_or_else(not_begun)?;
        let params = &ctx.request.params;
        let page_index = u32::try_from(index)
            .map_err(|_| FolioError::PdfError(format!("page index {index} out of range")))?;

        let image = ctx.rasterizer.render_page(ctx.input()?, page_index, params.dpi)?;
        let base = folder.join(format!("page_{}", index + 1));
        let path = paths::allocate_file(&base, params.image_format.extension());
        ImageProcessor::from_dynamic(image).save_as(&path, params.image_format, params.quality)?;
        self.written += 1;

        Ok(format!("Processed page {}/{}", index + 1, self.page_count))
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self { folder, written, .. } = *self;
        let folder = folder.ok_or_else(not_begun)?;
        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!("PDF converted to {} images in {}", written, folder.display()),
            outputs: vec![folder],
            detail: ReportDetail::Images { count: written },
        })
    }
}

// -- convert-to-word ----------------------------------------------------------

#[derive(Default)]
pub(crate) struct ToWord {
    reader: Option<PdfReader>,
    writer: WordWriter,
}

impl UnitStrategy for ToWord {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        let reader = open_pdf(ctx.input()?)?;
        let pages = reader.page_count();
        self.reader = Some(reader);
        Ok(pages)
    }

    fn process(&mut self, index: usize, _ctx: &OperationContext<'_>) -> Result<String> {
        let reader = self.reader.as_ref().ok_or_else(not_begun)?;
        let text = page_text_or_empty(reader, index as u32 + 1);
        self.writer.add_page_text(&text);
        Ok(format!("Processed page {}/{}", index + 1, reader.page_count()))
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self { reader, writer } = *self;
        let pages = reader.ok_or_else(not_begun)?.page_count();
        let paragraphs = writer.paragraph_count();
        let (path, file) = paths::create_file_exclusive(&ctx.stem_base("_converted"), ".docx")?;
        writer.write(file)?;
        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!(
                "PDF converted to Word ({} pages, {} paragraphs): {}",
                pages,
                paragraphs,
                path.display()
            ),
            outputs: vec![path],
            detail: ReportDetail::Pages { count: pages },
        })
    }
}

// -- convert-to-text ----------------------------------------------------------

#[derive(Default)]
pub(crate) struct ToText {
    reader: Option<PdfReader>,
    body: String,
    pages_with_text: usize,
}

impl UnitStrategy for ToText {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        let reader = open_pdf(ctx.input()?)?;
        let pages = reader.page_count();
        self.reader = Some(reader);
        Ok(pages)
    }

    fn process(&mut self, index: usize, _ctx: &OperationContext<'_>) -> Result<String> {
        let reader = self.reader.as_ref().ok_or_else(not_begun)?;
        let page_number = index + 1;
        let text = page_text_or_empty(reader, page_number as u32);
        let text = text.trim_end();
        if !text.is_empty() {
            self.body.push_str(&format!("--- Page {page_number} ---\n{text}\n\n"));
            self.pages_with_text += 1;
        }
        Ok(format!("Processed page {}/{}", page_number, reader.page_count()))
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let reader = self.reader.as_ref().ok_or_else(not_begun)?;
        let (path, file) = paths::create_file_exclusive(&ctx.stem_base("_extracted"), ".txt")?;
        let mut out = BufWriter::new(file);

        if ctx.request.params.include_metadata {
            let source = ctx
                .input()?
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            writeln!(out, "Source: {source}")?;
            writeln!(out, "Pages: {}", reader.page_count())?;
            writeln!(out, "Extracted: {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))?;
            writeln!(out)?;
        }
        out.write_all(self.body.as_bytes())?;
        out.flush()?;

        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!("Text extracted to: {}", path.display()),
            outputs: vec![path],
            detail: ReportDetail::Pages {
                count: self.pages_with_text,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use folio_core::config::EngineConfig;
    use folio_core::types::{ImageFormat, OperationKind, OperationParams, OperationRequest, TaskId};
    use folio_document::PageRasterizer;
    use image::{DynamicImage, Rgb, RgbImage};

    use super::*;
    use crate::operations::execute;
    use crate::operations::test_support::{run, write_pdf, write_protected_pdf};
    use crate::progress;

    /// Renders a flat grey page and counts calls.
    #[derive(Default)]
    struct FakeRasterizer {
        calls: AtomicUsize,
    }

    impl PageRasterizer for FakeRasterizer {
        fn render_page(&self, _path: &Path, _page_index: u32, dpi: u32) -> Result<DynamicImage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let side = dpi / 10;
            Ok(DynamicImage::ImageRgb8(RgbImage::from_pixel(side, side, Rgb([128, 128, 128]))))
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    #[test]
    fn images_one_file_per_page() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "deck.pdf", &["one", "two", "three"]);
        let request = OperationRequest::new(OperationKind::ConvertToImages, vec![input]).with_params(
            OperationParams {
                image_format: ImageFormat::Jpeg,
                dpi: 100,
                ..OperationParams::default()
            },
        );
        let config = EngineConfig::default();
        let rasterizer = FakeRasterizer::default();
        let ctx = OperationContext::new(&request, &config, &rasterizer);
        let (mut reporter, receiver) = progress::channel(TaskId::new());

        let report = execute(&ctx, &mut reporter).expect("convert");
        let folder = dir.path().join("deck_images");
        assert_eq!(report.outputs, vec![folder.clone()]);
        assert_eq!(report.detail, ReportDetail::Images { count: 3 });
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 3);
        for n in 1..=3 {
            assert!(folder.join(format!("page_{n}.jpg")).is_file());
        }
        assert_eq!(receiver.borrow().percent, 100.0);
    }

    #[test]
    fn images_folder_is_not_reused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "deck.pdf", &["one"]);
        std::fs::create_dir(dir.path().join("deck_images")).expect("mkdir");
        let request = OperationRequest::new(OperationKind::ConvertToImages, vec![input]);
        let config = EngineConfig::default();
        let rasterizer = FakeRasterizer::default();
        let ctx = OperationContext::new(&request, &config, &rasterizer);
        let (mut reporter, _receiver) = progress::channel(TaskId::new());

        let report = execute(&ctx, &mut reporter).expect("convert");
        assert_eq!(report.outputs, vec![dir.path().join("deck_images_1")]);
        assert!(dir.path().join("deck_images_1").join("page_1.png").is_file());
    }

    #[test]
    fn images_without_rasterizer_fail() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "deck.pdf", &["one"]);
        let err = run(OperationKind::ConvertToImages, vec![input], OperationParams::default())
            .err()
            .expect("no rasterizer");
        assert!(matches!(err, FolioError::RasterizerUnavailable(_)));
    }

    #[test]
    fn text_has_page_headers() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "notes.pdf", &["alpha", "", "gamma"]);
        let report = run(OperationKind::ConvertToText, vec![input], OperationParams::default())
            .expect("to text");

        let path = dir.path().join("notes_extracted.txt");
        assert_eq!(report.outputs, vec![path.clone()]);
        assert_eq!(report.detail, ReportDetail::Pages { count: 2 });
        let text = std::fs::read_to_string(path).expect("read");
        assert!(text.starts_with("--- Page 1 ---\nalpha"));
        assert!(text.contains("--- Page 3 ---\ngamma"));
        assert!(!text.contains("--- Page 2 ---"));
    }

    #[test]
    fn text_metadata_header_is_optional() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "notes.pdf", &["alpha"]);
        let params = OperationParams {
            include_metadata: true,
            ..OperationParams::default()
        };
        run(OperationKind::ConvertToText, vec![input], params).expect("to text");
        let text = std::fs::read_to_string(dir.path().join("notes_extracted.txt")).expect("read");
        assert!(text.starts_with("Source: notes.pdf\nPages: 1\nExtracted: "));
    }

    #[test]
    fn text_output_never_overwrites() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "notes.pdf", &["alpha"]);
        std::fs::write(dir.path().join("notes_extracted.txt"), "keep me").expect("write");
        let report = run(OperationKind::ConvertToText, vec![input], OperationParams::default())
            .expect("to text");
        assert_eq!(report.outputs, vec![dir.path().join("notes_extracted_1.txt")]);
        let kept = std::fs::read_to_string(dir.path().join("notes_extracted.txt")).expect("read");
        assert_eq!(kept, "keep me");
    }

    #[test]
    fn text_refuses_a_locked_input() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_protected_pdf(dir.path(), "sealed.pdf", &["hidden"], "pw");
        let err = run(OperationKind::ConvertToText, vec![input], OperationParams::default())
            .err()
            .expect("locked input");
        assert!(matches!(err, FolioError::Authentication(_)));
        assert!(!dir.path().join("sealed_extracted.txt").exists());
    }

    #[test]
    fn word_reports_pages_processed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "letter.pdf", &["Dear reader", "", "Regards"]);
        let report = run(OperationKind::ConvertToWord, vec![input], OperationParams::default())
            .expect("to word");
        let path = dir.path().join("letter_converted.docx");
        assert_eq!(report.outputs, vec![path.clone()]);
        // The blank page is processed but contributes no paragraph.
        assert_eq!(report.detail, ReportDetail::Pages { count: 3 });
        assert!(report.summary.contains("2 paragraphs"));
        assert!(std::fs::read(path).expect("read").starts_with(b"PK"));
    }
}
