// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module — reading, page assembly, encryption, and creation from images.

pub mod assembler;
pub mod reader;
pub mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod fixtures;

pub use assembler::PdfAssembler;
pub use reader::{PdfReader, UnlockOutcome};
pub use writer::PdfWriter;
