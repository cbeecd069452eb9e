// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Output path allocation.
//
// Outputs never replace existing files: when `name.ext` is taken the
// allocator moves on to `name_1.ext`, `name_2.ext`, and so on.

use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use folio_core::error::Result;
use tracing::debug;

/// First free path of the form `base<ext>`, `base_1<ext>`, `base_2<ext>`, ...
///
/// A trailing `extension` already present on `base` is stripped first, so
/// `report.docx` with `.docx` starts at `report.docx`, not `report.docx.docx`.
/// Nothing is created; two calls without an intervening write return the same
/// path.
pub fn allocate_file(base: &Path, extension: &str) -> PathBuf {
    let stem = strip_extension(base, extension);
    first_free(&stem, extension)
}

/// First free folder path of the form `base`, `base_1`, `base_2`, ...
pub fn allocate_folder(base: &Path) -> PathBuf {
    first_free(base.as_os_str(), "")
}

/// Allocate and create a folder, retrying when another writer claims the
/// allocated name first.
pub fn create_folder_exclusive(base: &Path) -> Result<PathBuf> {
    loop {
        let candidate = allocate_folder(base);
        match fs::create_dir(&candidate) {
            Ok(()) => {
                debug!(path = %candidate.display(), "Output folder created");
                return Ok(candidate);
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

/// Allocate and create a file (opened for writing), retrying when another
/// writer claims the allocated name first.
pub fn create_file_exclusive(base: &Path, extension: &str) -> Result<(PathBuf, File)> {
    loop {
        let candidate = allocate_file(base, extension);
        match OpenOptions::new().write(true).create_new(true).open(&candidate) {
            Ok(file) => {
                debug!(path = %candidate.display(), "Output file created");
                return Ok((candidate, file));
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => continue,
            Err(err) => return Err(err.into()),
        }
    }
}

fn first_free(stem: &OsStr, extension: &str) -> PathBuf {
    let mut counter: u64 = 0;
    loop {
        let candidate = numbered(stem, counter, extension);
        // Dangling symlinks count as taken.
        if fs::symlink_metadata(&candidate).is_err() {
            return candidate;
        }
        counter += 1;
    }
}

fn numbered(stem: &OsStr, counter: u64, extension: &str) -> PathBuf {
    let mut name = stem.to_os_string();
    if counter > 0 {
        name.push(format!("_{counter}"));
    }
    name.push(extension);
    PathBuf::from(name)
}

fn strip_extension(base: &Path, extension: &str) -> OsString {
    match base.to_str() {
        Some(text) if !extension.is_empty() && text.len() > extension.len() && text.ends_with(extension) => {
            OsString::from(&text[..text.len() - extension.len()])
        }
        _ => base.as_os_str().to_os_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_name_is_used_as_is() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = allocate_file(&dir.path().join("report"), ".pdf");
        assert_eq!(path, dir.path().join("report.pdf"));
    }

    #[test]
    fn matching_extension_is_not_doubled() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = allocate_file(&dir.path().join("report.docx"), ".docx");
        assert_eq!(path, dir.path().join("report.docx"));
    }

    #[test]
    fn other_dots_in_the_stem_survive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = allocate_file(&dir.path().join("scan.2024"), ".pdf");
        assert_eq!(path, dir.path().join("scan.2024.pdf"));
    }

    #[test]
    fn taken_names_get_the_next_counter() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("merged.pdf"), b"").expect("write");
        fs::write(dir.path().join("merged_1.pdf"), b"").expect("write");
        fs::create_dir(dir.path().join("merged_2.pdf")).expect("mkdir");

        let base = dir.path().join("merged");
        let first = allocate_file(&base, ".pdf");
        assert_eq!(first, dir.path().join("merged_3.pdf"));
        // Pure: asking again without writing gives the same answer.
        assert_eq!(allocate_file(&base, ".pdf"), first);
    }

    #[test]
    fn folders_count_up_too() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("doc_images");
        assert_eq!(allocate_folder(&base), base);
        fs::create_dir(&base).expect("mkdir");
        fs::write(dir.path().join("doc_images_1"), b"").expect("write");
        assert_eq!(allocate_folder(&base), dir.path().join("doc_images_2"));
    }

    #[test]
    fn exclusive_creation_never_reuses_a_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("out");
        let (first, _) = create_file_exclusive(&base, ".txt").expect("create");
        let (second, _) = create_file_exclusive(&base, ".txt").expect("create");
        assert_ne!(first, second);
        assert_eq!(second, dir.path().join("out_1.txt"));

        let folder_a = create_folder_exclusive(&base).expect("mkdir");
        let folder_b = create_folder_exclusive(&base).expect("mkdir");
        assert_eq!(folder_a, base);
        assert_eq!(folder_b, dir.path().join("out_1"));
        assert!(folder_b.is_dir());
    }

    #[test]
    fn missing_parent_is_an_error_not_a_loop() {
        let dir = tempfile::tempdir().expect("tempdir");
        let base = dir.path().join("no_such_dir").join("out");
        assert!(create_folder_exclusive(&base).is_err());
        assert!(create_file_exclusive(&base, ".txt").is_err());
    }
}
