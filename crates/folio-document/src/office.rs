// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Word document output via `docx-rs`.

use std::io::{Seek, Write};

use docx_rs::{BreakType, Docx, Paragraph, Run};
use folio_core::error::{FolioError, Result};
use tracing::debug;

/// Collects page text and packs it as a .docx file.
///
/// Each non-empty page becomes one paragraph; the lines of a page are kept
/// as line breaks inside it, and pages are separated by page breaks.
#[derive(Default)]
pub struct WordWriter {
    paragraphs: Vec<Paragraph>,
}

impl WordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paragraphs added so far.
    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Add the text of one page. Returns `false` (and adds nothing) when the
    /// text is blank.
    pub fn add_page_text(&mut self, text: &str) -> bool {
        let lines: Vec<&str> = text.trim().lines().map(str::trim_end).collect();
        if lines.iter().all(|line| line.trim().is_empty()) {
            return false;
        }

        let mut run = Run::new();
        if !self.paragraphs.is_empty() {
            run = run.add_break(BreakType::Page);
        }
        for (index, line) in lines.iter().enumerate() {
            if index > 0 {
                run = run.add_break(BreakType::TextWrapping);
            }
            run = run.add_text(*line);
        }
        self.paragraphs.push(Paragraph::new().add_run(run));
        true
    }

    /// Pack the document into `writer`.
    pub fn write<W: Write + Seek>(self, writer: W) -> Result<()> {
        let count = self.paragraphs.len();
        let docx = self
            .paragraphs
            .into_iter()
            .fold(Docx::new(), |docx, paragraph| docx.add_paragraph(paragraph));
        docx.build()
            .pack(writer)
            .map_err(|err| FolioError::Conversion(format!("failed to write .docx: {}", err)))?;
        debug!(paragraphs = count, "Word document packed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn blank_pages_are_skipped() {
        let mut writer = WordWriter::new();
        assert!(!writer.add_page_text("   \n\n"));
        assert!(writer.add_page_text("Heading\nbody line"));
        assert_eq!(writer.paragraph_count(), 1);
    }

    #[test]
    fn packs_a_zip_container() {
        let mut writer = WordWriter::new();
        writer.add_page_text("first");
        writer.add_page_text("second");
        let mut buffer = Cursor::new(Vec::new());
        writer.write(&mut buffer).expect("pack");
        let bytes = buffer.into_inner();
        assert!(bytes.starts_with(b"PK"));

        let reread = docx_rs::read_docx(&bytes).expect("readable docx");
        assert!(!reread.document.children.is_empty());
    }
}
