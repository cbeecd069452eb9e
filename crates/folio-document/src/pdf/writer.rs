// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF writer — build a new PDF from raster images using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: images are registered as XObjects on
// the `PdfDocument`, pages are `PdfPage` structs holding `Vec<Op>` operation
// lists, and the whole document is serialised via `PdfDocument::save()`.

use folio_core::PaperSize;
use folio_core::error::Result;
use image::DynamicImage;
use printpdf::{
    Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Pt, RawImage, RawImageData,
    RawImageFormat, XObjectTransform,
};
use tracing::{debug, instrument};

/// Pixels map one-to-one onto points before scaling.
const PLACEMENT_DPI: f32 = 72.0;

/// Builds a PDF one image page at a time.
///
/// Every page has the configured paper size; each image is scaled to fit the
/// page (up or down) with its aspect ratio preserved, and centred.
pub struct PdfWriter {
    paper_size: PaperSize,
    document: PdfDocument,
    pages: Vec<PdfPage>,
}

impl PdfWriter {
    /// Start an empty document.
    pub fn new(paper_size: PaperSize, title: &str) -> Self {
        Self {
            paper_size,
            document: PdfDocument::new(title),
            pages: Vec::new(),
        }
    }

    /// Pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Append `image` as a new page. Alpha must already be flattened; any
    /// remaining alpha channel is discarded.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn push_image(&mut self, image: &DynamicImage) -> Result<()> {
        let (page_w, page_h) = self.page_dimensions();
        let img_width = image.width() as usize;
        let img_height = image.height() as usize;

        let rgb = image.to_rgb8();
        let raw = RawImage {
            pixels: RawImageData::U8(rgb.into_raw()),
            width: img_width,
            height: img_height,
            data_format: RawImageFormat::RGB8,
            tag: Vec::new(),
        };
        let xobject_id = self.document.add_image(&raw);

        let (scale, x_offset, y_offset) = fit_to_page(
            img_width as f32,
            img_height as f32,
            page_w.into_pt().0,
            page_h.into_pt().0,
        );

        let ops = vec![Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(PLACEMENT_DPI),
                rotate: None,
            },
        }];
        self.pages.push(PdfPage::new(page_w, page_h, ops));

        debug!(scale, page = self.pages.len(), "Image placed on page");
        Ok(())
    }

    /// Serialise the document.
    pub fn finish(mut self) -> Vec<u8> {
        let pages = std::mem::take(&mut self.pages);
        let page_count = pages.len();
        self.document.with_pages(pages);

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.document.save(&PdfSaveOptions::default(), &mut warnings);
        debug!(page_count, warnings = warnings.len(), bytes = output.len(), "PDF serialised");
        output
    }
}

/// Scale and offset (in points) that fit a `width` x `height` point box into
/// the page, centred, preserving aspect ratio.
fn fit_to_page(width: f32, height: f32, page_w: f32, page_h: f32) -> (f32, f32, f32) {
    if width <= 0.0 || height <= 0.0 {
        return (1.0, 0.0, 0.0);
    }
    let scale = (page_w / width).min(page_h / height);
    let x_offset = (page_w - width * scale) / 2.0;
    let y_offset = (page_h - height * scale) / 2.0;
    (scale, x_offset, y_offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::reader::PdfReader;
    use image::{Rgb, RgbImage};

    #[test]
    fn wide_image_fits_width() {
        let (scale, x, y) = fit_to_page(1000.0, 100.0, 500.0, 800.0);
        assert!((scale - 0.5).abs() < f32::EPSILON);
        assert!(x.abs() < f32::EPSILON);
        assert!((y - 375.0).abs() < 0.01);
    }

    #[test]
    fn small_image_is_scaled_up() {
        let (scale, _, _) = fit_to_page(10.0, 10.0, 100.0, 200.0);
        assert!((scale - 10.0).abs() < f32::EPSILON);
    }

    #[test]
    fn one_page_per_image() {
        let mut writer = PdfWriter::new(PaperSize::A4, "test");
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(20, 10, Rgb([200, 10, 10])));
        writer.push_image(&image).expect("push");
        writer.push_image(&image).expect("push");
        assert_eq!(writer.page_count(), 2);

        let bytes = writer.finish();
        assert!(bytes.starts_with(b"%PDF"));
        assert_eq!(PdfReader::from_bytes(&bytes).expect("reload").page_count(), 2);
    }
}
