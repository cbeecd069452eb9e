// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page rasterization — turn PDF pages into bitmaps.
//
// Rendering needs a real PDF engine. The PDFium backend is compiled only with
// the `pdfium` feature and needs libpdfium at runtime; without it, the
// unavailable backend reports a clear error instead.

use std::path::Path;
use std::sync::Arc;

use folio_core::error::{FolioError, Result};
use image::DynamicImage;
use tracing::info;

/// Renders single pages of a PDF file to images.
pub trait PageRasterizer: Send + Sync {
    /// Render page `page_index` (0-based) of the PDF at `path` at `dpi`.
    fn render_page(&self, path: &Path, page_index: u32, dpi: u32) -> Result<DynamicImage>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Backend used when no PDF engine is available.
#[derive(Debug, Clone, Default)]
pub struct UnavailableRasterizer {
    reason: String,
}

impl UnavailableRasterizer {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl PageRasterizer for UnavailableRasterizer {
    fn render_page(&self, _path: &Path, _page_index: u32, _dpi: u32) -> Result<DynamicImage> {
        Err(FolioError::RasterizerUnavailable(self.reason.clone()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}

/// Pick the best rasterizer this build and machine support.
pub fn default_rasterizer() -> Arc<dyn PageRasterizer> {
    #[cfg(feature = "pdfium")]
    {
        match pdfium_backend::PdfiumRasterizer::new() {
            Ok(rasterizer) => {
                info!("Using PDFium rasterizer");
                Arc::new(rasterizer)
            }
            Err(err) => {
                tracing::warn!(%err, "PDFium library not found, page rendering disabled");
                Arc::new(UnavailableRasterizer::new(err.to_string()))
            }
        }
    }

    #[cfg(not(feature = "pdfium"))]
    {
        info!("Built without the pdfium feature, page rendering disabled");
        Arc::new(UnavailableRasterizer::new("built without the `pdfium` feature"))
    }
}

#[cfg(feature = "pdfium")]
pub use pdfium_backend::PdfiumRasterizer;

#[cfg(feature = "pdfium")]
mod pdfium_backend {
    use super::*;
    use pdfium_render::prelude::*;
    use tracing::debug;

    /// PDFium-backed rasterizer.
    ///
    /// `Pdfium` handles are not shared between threads; each render binds the
    /// already-loaded library again, which is cheap next to the render itself.
    #[derive(Debug, Default)]
    pub struct PdfiumRasterizer;

    impl PdfiumRasterizer {
        /// Fails when libpdfium cannot be located.
        pub fn new() -> Result<Self> {
            bind()?;
            Ok(Self)
        }
    }

    fn bind() -> Result<Pdfium> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|err| {
                FolioError::RasterizerUnavailable(format!("failed to load PDFium: {:?}", err))
            })?;
        Ok(Pdfium::new(bindings))
    }

    impl PageRasterizer for PdfiumRasterizer {
        fn render_page(&self, path: &Path, page_index: u32, dpi: u32) -> Result<DynamicImage> {
            let pdfium = bind()?;
            let document = pdfium.load_pdf_from_file(path, None).map_err(|err| {
                FolioError::PdfError(format!("PDFium cannot open {}: {:?}", path.display(), err))
            })?;
            let index = u16::try_from(page_index).map_err(|_| {
                FolioError::PdfError(format!("page index {} too large for PDFium", page_index))
            })?;
            let page = document.pages().get(index).map_err(|err| {
                FolioError::PdfError(format!("PDFium cannot load page {}: {:?}", page_index + 1, err))
            })?;

            let config = PdfRenderConfig::new().scale_page_by_factor(dpi as f32 / 72.0);
            let bitmap = page.render_with_config(&config).map_err(|err| {
                FolioError::PdfError(format!("PDFium render of page {} failed: {:?}", page_index + 1, err))
            })?;
            let image = bitmap.as_image();
            debug!(page_index, dpi, width = image.width(), height = image.height(), "Page rendered");
            Ok(image)
        }

        fn name(&self) -> &'static str {
            "pdfium"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_backend_reports_reason() {
        let rasterizer = UnavailableRasterizer::new("no engine");
        let err = rasterizer
            .render_page(Path::new("x.pdf"), 0, 150)
            .err()
            .expect("error");
        match err {
            FolioError::RasterizerUnavailable(reason) => assert_eq!(reason, "no engine"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
