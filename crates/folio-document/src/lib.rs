// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-document — Adapters over the document libraries used by Folio.
//
// PDF reading, page assembly and encryption (lopdf), PDF creation from images
// (printpdf), image decoding and encoding (image), page rasterization
// (pdfium-render, optional), Word output (docx-rs), and table output
// (csv, rust_xlsxwriter).

pub mod image;
pub mod office;
pub mod pdf;
pub mod render;
pub mod tables;

// Re-export the primary structs so callers can use `folio_document::PdfReader` etc.
pub use image::processor::ImageProcessor;
pub use office::WordWriter;
pub use pdf::assembler::PdfAssembler;
pub use pdf::reader::{PdfReader, UnlockOutcome};
pub use pdf::writer::PdfWriter;
pub use render::{PageRasterizer, UnavailableRasterizer, default_rasterizer};
pub use tables::{Table, TableWriter, detect_tables};

#[cfg(feature = "pdfium")]
pub use render::PdfiumRasterizer;
