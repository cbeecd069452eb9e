// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// folio-engine — Runs document operations as progress-reporting background
// tasks that never overwrite existing files.

pub mod operations;
pub mod page_range;
pub mod paths;
pub mod progress;
pub mod runner;

pub use progress::ProgressReporter;
pub use runner::{TaskFailure, TaskHandle, TaskRunner};
