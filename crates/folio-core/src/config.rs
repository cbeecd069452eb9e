// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Engine configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::types::{ImageFormat, OperationParams, PaperSize};

/// File name of the persisted configuration inside the config directory.
pub const CONFIG_FILE: &str = "config.json";

/// Persistent engine settings. Every field has a default, so a partial file
/// is accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rasterisation resolution for PDF-to-images.
    pub default_dpi: u32,
    /// Raster output format for PDF-to-images.
    pub default_image_format: ImageFormat,
    /// Compression / JPEG quality (1-100).
    pub default_quality: u8,
    /// Paper size for pages generated from images.
    pub paper_size: PaperSize,
    /// Where outputs go when a request names no directory.
    pub output_dir: Option<PathBuf>,
    /// Prepend a metadata header to extracted text.
    pub include_text_metadata: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_dpi: 150,
            default_image_format: ImageFormat::Png,
            default_quality: 60,
            paper_size: PaperSize::A4,
            output_dir: None,
            include_text_metadata: false,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file. A missing file yields the defaults; a file that
    /// exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Persist as pretty-printed JSON, creating the parent directory.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Operation parameters seeded from the configured defaults.
    pub fn default_params(&self) -> OperationParams {
        OperationParams {
            dpi: self.default_dpi,
            image_format: self.default_image_format,
            quality: self.default_quality,
            include_metadata: self.include_text_metadata,
            paper_size: self.paper_size,
            ..OperationParams::default()
        }
    }
}
