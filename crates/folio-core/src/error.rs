// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Folio.

use thiserror::Error;

/// Top-level error type for all Folio operations.
#[derive(Debug, Error)]
pub enum FolioError {
    // -- Caller-side validation --
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("malformed page range token '{token}'")]
    PageRange { token: String },

    // -- Document errors --
    #[error("PDF operation failed: {0}")]
    PdfError(String),

    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("page rasterizer unavailable: {0}")]
    RasterizerUnavailable(String),

    // -- Security errors --
    #[error("encryption failed: {0}")]
    Encryption(String),

    #[error("authentication failed: {0}")]
    Authentication(String),

    // -- Filesystem / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Task execution --
    #[error("operation panicked: {0}")]
    TaskPanicked(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, FolioError>;
