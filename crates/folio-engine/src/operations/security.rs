// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// protect / unlock: password encryption of a whole document.

use std::io::Write;

use folio_core::error::{FolioError, Result};
use folio_core::types::{OperationReport, ReportDetail};
use folio_document::{PdfAssembler, PdfReader, UnlockOutcome};
use tracing::info;

use super::{OperationContext, UnitStrategy};
use crate::paths;

fn password<'a>(ctx: &'a OperationContext<'_>) -> Result<&'a str> {
    ctx.request
        .params
        .password
        .as_deref()
        .filter(|password| !password.is_empty())
        .ok_or_else(|| FolioError::Validation("a password is required".into()))
}

fn not_begun() -> FolioError {
    FolioError::PdfError("operation used before begin".into())
}

// -- protect ------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct Protect {
    reader: Option<PdfReader>,
}

impl UnitStrategy for Protect {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        password(ctx)?;
        self.reader = Some(PdfReader::open(ctx.input()?)?);
        Ok(1)
    }

    fn process(&mut self, _index: usize, ctx: &OperationContext<'_>) -> Result<String> {
        let reader = self.reader.as_mut().ok_or_else(not_begun)?;
        reader.encrypt(password(ctx)?)?;
        Ok("Encrypted document".into())
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self { reader } = *self;
        let mut reader = reader.ok_or_else(not_begun)?;
        let bytes = reader.to_bytes()?;
        let (path, mut file) = paths::create_file_exclusive(&ctx.stem_base("_protected"), ".pdf")?;
        file.write_all(&bytes)?;

        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!("PDF protected: {}", path.display()),
            outputs: vec![path],
            detail: ReportDetail::Protected,
        })
    }
}

// -- unlock -------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct Unlock {
    reader: Option<PdfReader>,
    outcome: Option<UnlockOutcome>,
}

impl UnitStrategy for Unlock {
    fn begin(&mut self, ctx: &OperationContext<'_>) -> Result<usize> {
        password(ctx)?;
        self.reader = Some(PdfReader::open(ctx.input()?)?);
        Ok(1)
    }

    fn process(&mut self, _index: usize, ctx: &OperationContext<'_>) -> Result<String> {
        let reader = self.reader.as_mut().ok_or_else(not_begun)?;
        let outcome = reader.unlock(password(ctx)?)?;
        self.outcome = Some(outcome);
        Ok(match outcome {
            UnlockOutcome::Decrypted => "Password accepted".into(),
            UnlockOutcome::NotEncrypted => "Document is not password-protected".into(),
        })
    }

    fn finish(self: Box<Self>, ctx: &OperationContext<'_>) -> Result<OperationReport> {
        let Self { reader, outcome } = *self;
        let reader = reader.ok_or_else(not_begun)?;

        if outcome != Some(UnlockOutcome::Decrypted) {
            info!("Nothing to unlock");
            return Ok(OperationReport {
                kind: ctx.request.kind,
                outputs: Vec::new(),
                detail: ReportDetail::NotEncrypted,
                summary: "This PDF is not password-protected".into(),
            });
        }

        // Copy the decrypted pages into a document with no /Encrypt entry.
        let mut assembler = PdfAssembler::new();
        assembler.append_document(&reader)?;
        let bytes = assembler.to_bytes()?;
        let (path, mut file) = paths::create_file_exclusive(&ctx.stem_base("_unlocked"), ".pdf")?;
        file.write_all(&bytes)?;

        Ok(OperationReport {
            kind: ctx.request.kind,
            summary: format!("PDF unlocked: {}", path.display()),
            outputs: vec![path],
            detail: ReportDetail::Unlocked,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use folio_core::types::{OperationKind, OperationParams};

    use super::*;
    use crate::operations::test_support::{run, write_pdf};

    fn with_password(password: &str) -> OperationParams {
        OperationParams {
            password: Some(password.to_string()),
            ..OperationParams::default()
        }
    }

    fn protected_fixture(dir: &Path) -> PathBuf {
        let input = write_pdf(dir, "bank.pdf", &["account 42", "balance"]);
        let report = run(OperationKind::Protect, vec![input], with_password("s3cret")).expect("protect");
        assert_eq!(report.detail, ReportDetail::Protected);
        report.outputs[0].clone()
    }

    #[test]
    fn protect_writes_an_encrypted_copy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let protected = protected_fixture(dir.path());
        assert_eq!(protected, dir.path().join("bank_protected.pdf"));
        assert!(PdfReader::open(&protected).expect("open").is_encrypted());
    }

    #[test]
    fn unlock_with_the_right_password() {
        let dir = tempfile::tempdir().expect("tempdir");
        let protected = protected_fixture(dir.path());
        let report = run(OperationKind::Unlock, vec![protected], with_password("s3cret")).expect("unlock");

        let output = dir.path().join("bank_protected_unlocked.pdf");
        assert_eq!(report.outputs, vec![output.clone()]);
        let reader = PdfReader::open(&output).expect("open");
        assert!(!reader.is_encrypted());
        assert_eq!(reader.page_count(), 2);
        assert!(reader.page_text(1).expect("text").contains("account 42"));
        assert!(reader.page_text(2).expect("text").contains("balance"));
    }

    #[test]
    fn wrong_password_leaves_no_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let protected = protected_fixture(dir.path());
        let err = run(OperationKind::Unlock, vec![protected], with_password("guess"))
            .err()
            .expect("rejected");
        assert!(matches!(err, FolioError::Authentication(_)));
        assert!(!dir.path().join("bank_protected_unlocked.pdf").exists());
    }

    #[test]
    fn unlocking_a_plain_pdf_is_informational() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "plain.pdf", &["hello"]);
        let report = run(OperationKind::Unlock, vec![input], with_password("any")).expect("unlock");
        assert_eq!(report.detail, ReportDetail::NotEncrypted);
        assert!(report.is_informational());
        assert!(!dir.path().join("plain_unlocked.pdf").exists());
    }

    #[test]
    fn missing_password_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = write_pdf(dir.path(), "plain.pdf", &["hello"]);
        let err = run(OperationKind::Protect, vec![input], OperationParams::default())
            .err()
            .expect("rejected");
        assert!(matches!(err, FolioError::Validation(_)));
    }
}
