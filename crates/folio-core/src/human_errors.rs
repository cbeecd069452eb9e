// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// Severity drives how a front end presents the failure.

use std::fmt;

use crate::error::FolioError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Disk full or file locked; trying again later may work.
    Transient,
    /// User must do something (pick another file, fix the page list, retype a password).
    ActionRequired,
    /// The input cannot be processed as asked.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

impl fmt::Display for HumanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `FolioError` into a `HumanError`.
pub fn humanize_error(err: &FolioError) -> HumanError {
    match err {
        FolioError::Validation(detail) => HumanError {
            message: "Some of the details need fixing.".into(),
            suggestion: format!("Check your choices and try again ({detail})."),
            severity: Severity::ActionRequired,
        },

        FolioError::PageRange { token } => HumanError {
            message: "The page list couldn't be read.".into(),
            suggestion: format!(
                "Use numbers and ranges separated by commas, like 1,3,5-8. '{token}' isn't valid."
            ),
            severity: Severity::ActionRequired,
        },

        // -- Document errors --
        FolioError::PdfError(_) => HumanError {
            message: "There's a problem with this PDF file.".into(),
            suggestion: "The file may be damaged. Try opening it in a PDF viewer first to check it works, or try a different file.".into(),
            severity: Severity::Permanent,
        },

        FolioError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::Permanent,
        },

        FolioError::Conversion(_) => HumanError {
            message: "The converted file couldn't be written.".into(),
            suggestion: "Check there is enough free space in the output folder and try again.".into(),
            severity: Severity::Transient,
        },

        FolioError::RasterizerUnavailable(_) => HumanError {
            message: "Turning pages into pictures isn't available.".into(),
            suggestion: "No page renderer could be loaded. Install the PDFium library (libpdfium) next to Folio or system-wide.".into(),
            severity: Severity::Permanent,
        },

        // -- Security errors --
        FolioError::Encryption(_) => HumanError {
            message: "The PDF couldn't be password-protected.".into(),
            suggestion: "The file may already be protected, or use features the encryptor doesn't handle. Try unlocking it first.".into(),
            severity: Severity::Permanent,
        },

        FolioError::Authentication(_) => HumanError {
            message: "That password isn't right, or the PDF is still locked.".into(),
            suggestion: "Check for typing mistakes and Caps Lock. A protected PDF has to be unlocked before other operations can read it.".into(),
            severity: Severity::ActionRequired,
        },

        // -- Filesystem --
        FolioError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "The file couldn't be found.".into(),
                suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Folio doesn't have permission to use that file or folder.".into(),
                suggestion: "Check the permissions, or choose a different output folder.".into(),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "There was a problem reading or writing a file.".into(),
                suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                severity: Severity::Transient,
            },
        },

        FolioError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Fix or delete the settings file to go back to the defaults.".into(),
            severity: Severity::ActionRequired,
        },

        FolioError::TaskPanicked(_) => HumanError {
            message: "The operation stopped unexpectedly.".into(),
            suggestion: "Try again with a different file. If this keeps happening, please report it.".into(),
            severity: Severity::Permanent,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_password_is_action_required() {
        let human = humanize_error(&FolioError::Authentication("locked.pdf".into()));
        assert_eq!(human.severity, Severity::ActionRequired);
    }

    #[test]
    fn page_range_names_the_token() {
        let human = humanize_error(&FolioError::PageRange { token: "5-".into() });
        assert!(human.suggestion.contains("'5-'"));
    }

    #[test]
    fn missing_file_is_action_required() {
        let err = FolioError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert_eq!(humanize_error(&err).severity, Severity::ActionRequired);
    }

    #[test]
    fn disk_errors_are_transient() {
        let err = FolioError::Io(std::io::Error::other("no space left on device"));
        assert_eq!(humanize_error(&err).severity, Severity::Transient);
    }

    #[test]
    fn damaged_pdf_is_permanent() {
        let human = humanize_error(&FolioError::PdfError("bad xref".into()));
        assert_eq!(human.severity, Severity::Permanent);
        assert!(human.to_string().starts_with("There's a problem"));
    }
}
