// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Folio document toolkit.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{FolioError, Result};

/// Unique identifier for a submitted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex digits, used in thread names and log lines.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The twelve supported document transforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    ConvertToImages,
    ConvertToWord,
    ExtractTables,
    ConvertToText,
    ImagesToPdf,
    Merge,
    Split,
    ExtractPages,
    Protect,
    Unlock,
    Compress,
    Rotate,
}

impl OperationKind {
    pub const ALL: [OperationKind; 12] = [
        Self::ConvertToImages,
        Self::ConvertToWord,
        Self::ExtractTables,
        Self::ConvertToText,
        Self::ImagesToPdf,
        Self::Merge,
        Self::Split,
        Self::ExtractPages,
        Self::Protect,
        Self::Unlock,
        Self::Compress,
        Self::Rotate,
    ];

    /// Short human label, used in progress messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConvertToImages => "Converting PDF to images",
            Self::ConvertToWord => "Converting PDF to Word",
            Self::ExtractTables => "Extracting tables",
            Self::ConvertToText => "Extracting text",
            Self::ImagesToPdf => "Converting images to PDF",
            Self::Merge => "Merging PDFs",
            Self::Split => "Splitting PDF",
            Self::ExtractPages => "Extracting pages",
            Self::Protect => "Protecting PDF",
            Self::Unlock => "Unlocking PDF",
            Self::Compress => "Compressing PDF",
            Self::Rotate => "Rotating pages",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConvertToImages => "convert-to-images",
            Self::ConvertToWord => "convert-to-word",
            Self::ExtractTables => "extract-tables",
            Self::ConvertToText => "convert-to-text",
            Self::ImagesToPdf => "images-to-pdf",
            Self::Merge => "merge",
            Self::Split => "split",
            Self::ExtractPages => "extract-pages",
            Self::Protect => "protect",
            Self::Unlock => "unlock",
            Self::Compress => "compress",
            Self::Rotate => "rotate",
        };
        f.write_str(name)
    }
}

/// Lifecycle states of a submitted operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    /// Accepted by the runner, worker not yet started.
    Pending,
    /// Worker is executing the operation.
    Running,
    /// Finished; outputs are on disk.
    Succeeded,
    /// Finished with an error; the final progress message says why.
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// Supported input document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentType {
    Pdf,
    Jpeg,
    Png,
    Tiff,
    Bmp,
    Gif,
    Webp,
}

impl DocumentType {
    /// Infer document type from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "tif" | "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Infer document type from a path's extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn is_image(&self) -> bool {
        !matches!(self, Self::Pdf)
    }
}

/// Raster output format for PDF-to-images conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => ".png",
            Self::Jpeg => ".jpg",
        }
    }
}

/// Standard paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }
}

/// Normalised page numbers: deduplicated and ascending.
///
/// Members are the numbers as the user wrote them (1-based). Zero and
/// negative values are kept; adapters drop whatever falls outside the real
/// document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSet(Vec<i64>);

impl PageSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, page: i64) -> bool {
        self.0.binary_search(&page).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[i64] {
        &self.0
    }
}

impl FromIterator<i64> for PageSet {
    fn from_iter<I: IntoIterator<Item = i64>>(iter: I) -> Self {
        let mut pages: Vec<i64> = iter.into_iter().collect();
        pages.sort_unstable();
        pages.dedup();
        Self(pages)
    }
}

/// Comma-joined form with consecutive runs collapsed, e.g. `1,3,5-8`.
impl fmt::Display for PageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        let mut index = 0;
        while index < self.0.len() {
            let start = self.0[index];
            let mut end = start;
            while index + 1 < self.0.len() && self.0[index + 1] == end + 1 {
                index += 1;
                end = self.0[index];
            }
            if !first {
                f.write_str(",")?;
            }
            first = false;
            // Runs over non-positive numbers are written one by one: "-1-0"
            // would not read back as a range.
            if start == end {
                write!(f, "{start}")?;
            } else if start >= 0 {
                write!(f, "{start}-{end}")?;
            } else {
                let items: Vec<String> = (start..=end).map(|page| page.to_string()).collect();
                f.write_str(&items.join(","))?;
            }
            index += 1;
        }
        Ok(())
    }
}

/// Which pages a rotation applies to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageSelection {
    #[default]
    All,
    Pages(PageSet),
}

impl PageSelection {
    pub fn includes(&self, page: u32) -> bool {
        match self {
            Self::All => true,
            // An empty explicit list means "apply to all".
            Self::Pages(set) => set.is_empty() || set.contains(page as i64),
        }
    }
}

/// Operation-specific parameters. Fields an operation does not use are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationParams {
    /// Page-range text such as `1,3,5-8` (extract-pages).
    pub page_range: Option<String>,
    /// Password (protect, unlock).
    pub password: Option<String>,
    /// Rasterisation resolution (convert-to-images).
    pub dpi: u32,
    /// Raster output format (convert-to-images).
    pub image_format: ImageFormat,
    /// Size/quality trade-off, 1-100 (compress, JPEG output).
    pub quality: u8,
    /// Signed rotation in degrees, multiple of 90 (rotate).
    pub rotation: i32,
    /// Target pages (rotate).
    pub pages: PageSelection,
    /// Prepend a metadata header (convert-to-text).
    pub include_metadata: bool,
    /// Paper size for generated pages (images-to-pdf).
    pub paper_size: PaperSize,
}

impl Default for OperationParams {
    fn default() -> Self {
        Self {
            page_range: None,
            password: None,
            dpi: 150,
            image_format: ImageFormat::Png,
            quality: 60,
            rotation: 90,
            pages: PageSelection::All,
            include_metadata: false,
            paper_size: PaperSize::A4,
        }
    }
}

/// A fully specified operation, immutable once handed to the runner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    pub kind: OperationKind,
    /// Ordered, non-empty.
    pub inputs: Vec<PathBuf>,
    /// Where outputs land. Defaults to the first input's directory.
    pub output_dir: Option<PathBuf>,
    pub params: OperationParams,
    pub created_at: DateTime<Utc>,
}

impl OperationRequest {
    pub fn new(kind: OperationKind, inputs: Vec<PathBuf>) -> Self {
        Self {
            kind,
            inputs,
            output_dir: None,
            params: OperationParams::default(),
            created_at: Utc::now(),
        }
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn with_params(mut self, params: OperationParams) -> Self {
        self.params = params;
        self
    }

    /// The single input of a one-document operation (the first input).
    pub fn primary_input(&self) -> Result<&Path> {
        self.inputs
            .first()
            .map(PathBuf::as_path)
            .ok_or_else(|| FolioError::Validation("no input file given".into()))
    }

    /// File stem of the primary input, used to derive output names.
    pub fn input_stem(&self) -> String {
        self.inputs
            .first()
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    }

    /// Resolved output directory: explicit, else the first input's parent,
    /// else the current directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        if let Some(dir) = &self.output_dir {
            return dir.clone();
        }
        self.inputs
            .first()
            .and_then(|path| path.parent())
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Caller-side validation, run before submission.
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            return Err(FolioError::Validation("no input file given".into()));
        }
        for input in &self.inputs {
            if !input.is_file() {
                return Err(FolioError::Validation(format!(
                    "{} is not a readable file",
                    input.display()
                )));
            }
        }
        if let Some(dir) = &self.output_dir
            && !dir.is_dir()
        {
            return Err(FolioError::Validation(format!(
                "output directory {} does not exist",
                dir.display()
            )));
        }

        match self.kind {
            OperationKind::ImagesToPdf => {
                for input in &self.inputs {
                    let is_image = DocumentType::from_path(input).is_some_and(|t| t.is_image());
                    if !is_image {
                        return Err(FolioError::Validation(format!(
                            "{} is not a supported image",
                            input.display()
                        )));
                    }
                }
            }
            OperationKind::Merge => {
                if self.inputs.len() < 2 {
                    return Err(FolioError::Validation(
                        "select at least 2 PDF files to merge".into(),
                    ));
                }
                self.require_pdf_inputs()?;
            }
            _ => {
                if self.inputs.len() != 1 {
                    return Err(FolioError::Validation(format!(
                        "{} takes exactly one PDF file",
                        self.kind
                    )));
                }
                self.require_pdf_inputs()?;
            }
        }

        let params = &self.params;
        match self.kind {
            OperationKind::ConvertToImages => {
                if !(36..=1200).contains(&params.dpi) {
                    return Err(FolioError::Validation(format!(
                        "DPI must be between 36 and 1200, got {}",
                        params.dpi
                    )));
                }
                check_quality(params.quality)?;
            }
            OperationKind::Compress => check_quality(params.quality)?,
            OperationKind::Rotate => {
                if params.rotation % 90 != 0 {
                    return Err(FolioError::Validation(format!(
                        "rotation must be a multiple of 90, got {}",
                        params.rotation
                    )));
                }
            }
            OperationKind::ExtractPages => {
                let blank = params
                    .page_range
                    .as_deref()
                    .is_none_or(|text| text.trim().is_empty());
                if blank {
                    return Err(FolioError::Validation("enter the pages to extract".into()));
                }
            }
            OperationKind::Protect | OperationKind::Unlock => {
                if params.password.as_deref().is_none_or(str::is_empty) {
                    return Err(FolioError::Validation("a password is required".into()));
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Protect asks for the password twice; both entries must match.
    pub fn confirm_password(password: &str, confirmation: &str) -> Result<()> {
        if password != confirmation {
            return Err(FolioError::Validation("passwords do not match".into()));
        }
        Ok(())
    }

    fn require_pdf_inputs(&self) -> Result<()> {
        for input in &self.inputs {
            if DocumentType::from_path(input) != Some(DocumentType::Pdf) {
                return Err(FolioError::Validation(format!(
                    "{} is not a PDF file",
                    input.display()
                )));
            }
        }
        Ok(())
    }
}

fn check_quality(quality: u8) -> Result<()> {
    if !(1..=100).contains(&quality) {
        return Err(FolioError::Validation(format!(
            "quality must be between 1 and 100, got {quality}"
        )));
    }
    Ok(())
}

/// One progress update from a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub task_id: TaskId,
    /// 0-100, never decreasing within one task.
    pub percent: f32,
    pub message: String,
    pub state: TaskState,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    /// The event a task starts with before its worker runs.
    pub fn pending(task_id: TaskId) -> Self {
        Self {
            task_id,
            percent: 0.0,
            message: "Queued".into(),
            state: TaskState::Pending,
            timestamp: Utc::now(),
        }
    }
}

/// Operation-specific figures attached to a successful report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ReportDetail {
    /// Pages written (split, extract, merge, word/text conversion).
    Pages { count: usize },
    /// Images written or consumed.
    Images { count: usize },
    Tables { count: usize },
    /// Informational: extraction ran but found nothing.
    NoTablesFound,
    Compression {
        original_bytes: u64,
        new_bytes: u64,
        reduction_percent: f64,
    },
    Rotated { pages: usize },
    Protected,
    Unlocked,
    /// Informational: unlock was asked for on an unencrypted document.
    NotEncrypted,
}

/// Terminal success payload of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationReport {
    pub kind: OperationKind,
    pub outputs: Vec<PathBuf>,
    pub detail: ReportDetail,
    pub summary: String,
}

impl OperationReport {
    /// Informational results produce no output and are not errors.
    pub fn is_informational(&self) -> bool {
        matches!(
            self.detail,
            ReportDetail::NoTablesFound | ReportDetail::NotEncrypted
        )
    }
}
