// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line surface: one subcommand per operation.
//
// The CLI is the engine's caller. It seeds parameters from the config file,
// validates the request before submission, then follows the task's progress
// channel until the terminal event.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use folio_core::config::EngineConfig;
use folio_core::error::FolioError;
use folio_core::human_errors::{Severity, humanize_error};
use folio_core::types::{
    ImageFormat, OperationKind, OperationReport, OperationRequest, PageSelection, PaperSize,
    ProgressEvent,
};
use folio_document::default_rasterizer;
use folio_engine::{TaskFailure, TaskRunner, page_range};
use tracing::{debug, info};

use crate::config_dir;

#[derive(Parser, Debug)]
#[command(name = "folio", version)]
#[command(about = "Convert, merge, split, protect and compress PDF documents")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the JSON config file. Defaults to $XDG_CONFIG_HOME/folio/config.json.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for outputs. Defaults to the configured directory, then the
    /// first input's directory.
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render every page to an image file.
    ToImages {
        input: PathBuf,
        #[arg(long)]
        dpi: Option<u32>,
        #[arg(long, value_enum)]
        format: Option<FormatArg>,
        /// JPEG quality, 1-100.
        #[arg(long)]
        quality: Option<u8>,
    },
    /// Convert the text of a PDF to a Word document.
    ToWord { input: PathBuf },
    /// Detect tables and write them as CSV and XLSX.
    Tables { input: PathBuf },
    /// Extract plain text, page by page.
    ToText {
        input: PathBuf,
        /// Prepend source name, page count and extraction time.
        #[arg(long)]
        metadata: bool,
    },
    /// Combine images into one PDF, one image per page.
    ImagesToPdf {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, value_enum)]
        paper: Option<PaperArg>,
    },
    /// Merge PDFs in the order given.
    Merge {
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
    },
    /// Split a PDF into single-page files.
    Split { input: PathBuf },
    /// Copy selected pages, e.g. `--pages 1,3,5-8`, into a new PDF.
    Extract {
        input: PathBuf,
        #[arg(long)]
        pages: String,
    },
    /// Encrypt a PDF with a password.
    Protect {
        input: PathBuf,
        #[arg(long)]
        password: String,
        /// The password again.
        #[arg(long)]
        confirm: String,
    },
    /// Remove the password from a PDF.
    Unlock {
        input: PathBuf,
        #[arg(long)]
        password: String,
    },
    /// Shrink a PDF by re-encoding its images.
    Compress {
        input: PathBuf,
        /// Lower means smaller files, 1-100.
        #[arg(long)]
        quality: Option<u8>,
    },
    /// Rotate pages by a multiple of 90 degrees.
    Rotate {
        input: PathBuf,
        /// Clockwise degrees; negative turns counter-clockwise.
        #[arg(long, default_value_t = 90, allow_negative_numbers = true)]
        angle: i32,
        /// Pages to rotate, e.g. `1,3-4`. All pages when omitted.
        #[arg(long)]
        pages: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Png,
    Jpeg,
}

impl From<FormatArg> for ImageFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Png => ImageFormat::Png,
            FormatArg::Jpeg => ImageFormat::Jpeg,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PaperArg {
    A3,
    A4,
    A5,
    Letter,
    Legal,
    Tabloid,
}

impl From<PaperArg> for PaperSize {
    fn from(paper: PaperArg) -> Self {
        match paper {
            PaperArg::A3 => PaperSize::A3,
            PaperArg::A4 => PaperSize::A4,
            PaperArg::A5 => PaperSize::A5,
            PaperArg::Letter => PaperSize::Letter,
            PaperArg::Legal => PaperSize::Legal,
            PaperArg::Tabloid => PaperSize::Tabloid,
        }
    }
}

/// Turn a parsed subcommand into a request, with parameters the command
/// line leaves out taken from `config`.
pub fn build_request(command: &Command, config: &EngineConfig) -> folio_core::error::Result<OperationRequest> {
    let mut params = config.default_params();
    let (kind, inputs) = match command {
        Command::ToImages {
            input,
            dpi,
            format,
            quality,
        } => {
            params.dpi = dpi.unwrap_or(params.dpi);
            params.image_format = format.map(ImageFormat::from).unwrap_or(params.image_format);
            params.quality = quality.unwrap_or(params.quality);
            (OperationKind::ConvertToImages, vec![input.clone()])
        }
        Command::ToWord { input } => (OperationKind::ConvertToWord, vec![input.clone()]),
        Command::Tables { input } => (OperationKind::ExtractTables, vec![input.clone()]),
        Command::ToText { input, metadata } => {
            params.include_metadata |= *metadata;
            (OperationKind::ConvertToText, vec![input.clone()])
        }
        Command::ImagesToPdf { inputs, paper } => {
            params.paper_size = paper.map(PaperSize::from).unwrap_or(params.paper_size);
            (OperationKind::ImagesToPdf, inputs.clone())
        }
        Command::Merge { inputs } => (OperationKind::Merge, inputs.clone()),
        Command::Split { input } => (OperationKind::Split, vec![input.clone()]),
        Command::Extract { input, pages } => {
            params.page_range = Some(pages.clone());
            (OperationKind::ExtractPages, vec![input.clone()])
        }
        Command::Protect {
            input,
            password,
            confirm,
        } => {
            OperationRequest::confirm_password(password, confirm)?;
            params.password = Some(password.clone());
            (OperationKind::Protect, vec![input.clone()])
        }
        Command::Unlock { input, password } => {
            params.password = Some(password.clone());
            (OperationKind::Unlock, vec![input.clone()])
        }
        Command::Compress { input, quality } => {
            params.quality = quality.unwrap_or(params.quality);
            (OperationKind::Compress, vec![input.clone()])
        }
        Command::Rotate {
            input,
            angle,
            pages,
        } => {
            params.rotation = *angle;
            params.pages = match pages.as_deref() {
                None => PageSelection::All,
                Some(text) => {
                    let set = page_range::parse_strict(text)?;
                    if set.is_empty() {
                        return Err(FolioError::Validation(format!(
                            "--pages '{text}' selects no pages"
                        )));
                    }
                    PageSelection::Pages(set)
                }
            };
            (OperationKind::Rotate, vec![input.clone()])
        }
    };
    Ok(OperationRequest::new(kind, inputs).with_params(params))
}

/// Run one command to completion and report whether the task succeeded.
/// Problems found before submission are returned as errors.
pub async fn dispatch(args: Args) -> Result<bool> {
    let config_path = config_dir::config_path(args.config.as_deref());
    let config = EngineConfig::load(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;

    let mut request = build_request(&args.command, &config).map_err(explain)?;
    if let Some(dir) = args.output_dir {
        request = request.with_output_dir(dir);
    }
    request.validate().map_err(explain)?;

    let rasterizer = default_rasterizer();
    debug!(backend = rasterizer.name(), "Rasterizer selected");
    let runner = TaskRunner::with_rasterizer(config, rasterizer);

    let handle = runner.submit(request);
    info!(task = %handle.id(), "Task started");
    let mut progress = handle.progress();
    while progress.changed().await.is_ok() {
        let event = progress.borrow_and_update().clone();
        print_event(&event);
        if event.state.is_terminal() {
            break;
        }
    }

    match handle.outcome().await {
        Ok(report) => {
            print_report(&report);
            Ok(true)
        }
        Err(failure) => {
            print_failure(&failure);
            Ok(false)
        }
    }
}

/// Attach the plain-English explanation to a caller-side error.
fn explain(err: FolioError) -> anyhow::Error {
    let human = humanize_error(&err);
    anyhow::Error::new(err).context(format!("{} {}", human.message, human.suggestion))
}

fn print_event(event: &ProgressEvent) {
    println!("[{:>5.1}%] {}", event.percent, event.message);
}

fn print_report(report: &OperationReport) {
    if report.is_informational() {
        println!("Note: {}", report.summary);
        return;
    }
    println!("{}", report.summary);
    for output in &report.outputs {
        println!("  {}", output.display());
    }
}

fn print_failure(failure: &TaskFailure) {
    for line in failure_lines(failure) {
        eprintln!("{line}");
    }
}

fn failure_lines(failure: &TaskFailure) -> Vec<String> {
    let mut lines = vec![failure.message.clone(), failure.suggestion.clone()];
    match failure.severity {
        Severity::Transient => lines.push("This may work if you run the command again.".into()),
        Severity::ActionRequired | Severity::Permanent => {}
    }
    lines.push(format!("Cause: {}", failure.cause));
    lines
}
