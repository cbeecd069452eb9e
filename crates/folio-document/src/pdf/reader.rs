// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — open, inspect, decrypt, encrypt, rotate, and compress existing
// PDF documents using the `lopdf` crate.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use lopdf::{Document, EncryptionState, EncryptionVersion, Object, ObjectId, Permissions};
use folio_core::error::{FolioError, Result};
use tracing::{debug, info, instrument, warn};

use crate::image::processor::ImageProcessor;

/// Keys a page may inherit from its ancestors in the page tree.
pub(crate) const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

static NEXT_READER_ID: AtomicU64 = AtomicU64::new(1);

/// Reads and manipulates existing PDF files.
///
/// Wraps `lopdf::Document`. Page numbers are 1-indexed throughout.
pub struct PdfReader {
    /// The underlying lopdf document.
    document: Document,
    /// Source path, if opened from a file (useful for diagnostics).
    source_path: Option<String>,
    /// Distinguishes readers when pages from several sources are assembled.
    uid: u64,
    /// Whether the document is password-protected.
    encrypted: bool,
    /// Original bytes of an encrypted file; unlocking reloads from these.
    encrypted_source: Option<Vec<u8>>,
    /// Set while the page tree is still behind a password.
    locked: bool,
}

/// Outcome of an unlock attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    /// The document was encrypted and is now decrypted in memory.
    Decrypted,
    /// The document carried no encryption dictionary.
    NotEncrypted,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Open a PDF from the filesystem.
    ///
    /// Encrypted files open too. Their pages stay locked until
    /// [`unlock`](Self::unlock) succeeds, unless the user password is empty.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        info!("Opening PDF: {}", path_ref.display());

        let data = std::fs::read(path_ref)?;
        let mut reader = Self::load(data, path_ref.display().to_string())?;
        reader.source_path = Some(path_ref.display().to_string());
        Ok(reader)
    }

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::load(data.to_vec(), "<memory>".to_string())
    }

    /// Wrap an already-built lopdf document. An encrypted one stays locked
    /// until [`unlock`](Self::unlock).
    pub fn from_document(document: Document) -> Self {
        let encrypted = document.is_encrypted();
        let mut reader = Self::wrap(document, None);
        reader.encrypted = encrypted;
        reader.locked = encrypted;
        reader
    }

    fn load(data: Vec<u8>, name: String) -> Result<Self> {
        let document = Document::load_mem(&data)
            .map_err(|err| FolioError::PdfError(format!("failed to open {}: {}", name, err)))?;

        // lopdf decrypts on load when the user password is empty; otherwise
        // the /Encrypt entry stays and the page tree is unreadable.
        if document.is_encrypted() {
            debug!("Encrypted PDF is locked");
            let mut reader = Self::wrap(document, Some(data));
            reader.locked = true;
            return Ok(reader);
        }

        let encrypted = document.was_encrypted();
        debug!(pages = document.get_pages().len(), encrypted, "PDF loaded");
        let mut reader = Self::wrap(document, None);
        reader.encrypted = encrypted;
        Ok(reader)
    }

    fn wrap(document: Document, encrypted_source: Option<Vec<u8>>) -> Self {
        Self {
            document,
            source_path: None,
            uid: NEXT_READER_ID.fetch_add(1, Ordering::Relaxed),
            encrypted: encrypted_source.is_some(),
            encrypted_source,
            locked: false,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Return the source path if the reader was created via [`PdfReader::open`].
    pub fn source_path(&self) -> Option<&str> {
        self.source_path.as_deref()
    }

    /// Name used in error messages.
    pub fn display_name(&self) -> &str {
        self.source_path.as_deref().unwrap_or("<memory>")
    }

    /// Whether the document is password-protected.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// Whether the pages are still behind a password.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Fail unless the page tree can be read.
    pub fn ensure_readable(&self) -> Result<()> {
        if self.is_locked() {
            return Err(FolioError::Authentication(format!(
                "{} is password-protected; unlock it first",
                self.display_name()
            )));
        }
        Ok(())
    }

    /// Rotation of a page in degrees (0, 90, 180, 270), including inherited values.
    pub fn page_rotation(&self, page_number: u32) -> Result<i64> {
        let page_id = self.page_id(page_number)?;
        Ok(inherited_attribute(&self.document, page_id, b"Rotate")
            .and_then(|value| value.as_i64().ok())
            .unwrap_or(0))
    }

    pub(crate) fn document(&self) -> &Document {
        &self.document
    }

    pub(crate) fn uid(&self) -> u64 {
        self.uid
    }

    /// Object id of a 1-indexed page.
    pub(crate) fn page_id(&self, page_number: u32) -> Result<ObjectId> {
        self.ensure_readable()?;
        let pages = self.document.get_pages();
        pages.get(&page_number).copied().ok_or_else(|| {
            FolioError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                page_number,
                pages.len()
            ))
        })
    }

    // -- Extraction -----------------------------------------------------------

    /// Extract the text of a single page (1-indexed).
    ///
    /// Each text block of the content stream ends with a newline.
    #[instrument(skip(self), fields(page_number))]
    pub fn page_text(&self, page_number: u32) -> Result<String> {
        self.page_id(page_number)?;
        let text = self.document.extract_text(&[page_number]).map_err(|err| {
            FolioError::PdfError(format!(
                "failed to extract text from page {} of {}: {}",
                page_number,
                self.display_name(),
                err
            ))
        })?;
        debug!(page_number, chars = text.len(), "Page text extracted");
        Ok(text)
    }

    // -- Security -------------------------------------------------------------

    /// Decrypt the document in memory with `password`.
    ///
    /// A wrong password yields [`FolioError::Authentication`]; an unencrypted
    /// document is left alone and reported as [`UnlockOutcome::NotEncrypted`].
    #[instrument(skip_all, fields(source = self.display_name()))]
    pub fn unlock(&mut self, password: &str) -> Result<UnlockOutcome> {
        if !self.encrypted {
            info!("Document is not encrypted");
            return Ok(UnlockOutcome::NotEncrypted);
        }

        // Opened with an empty user password: already decrypted in memory.
        if !self.locked && !self.document.is_encrypted() {
            self.encrypted = false;
            info!("Document decrypted");
            return Ok(UnlockOutcome::Decrypted);
        }

        // Encrypted in memory by `encrypt`: serialise to get the locked form.
        let source = match self.encrypted_source.take() {
            Some(source) => source,
            None => self.to_bytes()?,
        };
        let decrypted = Document::load_mem_with_password(&source, password)
            .inspect_err(|err| warn!(%err, "Password rejected"))
            .ok()
            .filter(|document| !document.is_encrypted());
        match decrypted {
            Some(document) => {
                self.document = document;
                self.encrypted = false;
                self.locked = false;
                info!(pages = self.page_count(), "Document decrypted");
                Ok(UnlockOutcome::Decrypted)
            }
            None => {
                self.encrypted_source = Some(source);
                Err(FolioError::Authentication(format!(
                    "incorrect password for {}",
                    self.display_name()
                )))
            }
        }
    }

    /// Encrypt the document in memory, using `password` as both user and
    /// owner password (RC4, 128-bit key).
    #[instrument(skip_all, fields(source = self.display_name()))]
    pub fn encrypt(&mut self, password: &str) -> Result<()> {
        if self.encrypted {
            return Err(FolioError::Encryption(format!(
                "{} is already password-protected",
                self.display_name()
            )));
        }

        // Key derivation reads the first /ID entry of the trailer.
        if self.document.trailer.get(b"ID").is_err() {
            let id = uuid::Uuid::new_v4().as_bytes().to_vec();
            self.document.trailer.set(
                "ID",
                Object::Array(vec![
                    Object::String(id.clone(), lopdf::StringFormat::Hexadecimal),
                    Object::String(id, lopdf::StringFormat::Hexadecimal),
                ]),
            );
        }

        let version = EncryptionVersion::V2 {
            document: &self.document,
            owner_password: password,
            user_password: password,
            key_length: 128,
            permissions: Permissions::all(),
        };
        let state = EncryptionState::try_from(version)
            .map_err(|err| FolioError::Encryption(format!("key setup failed: {}", err)))?;

        self.document
            .encrypt(&state)
            .map_err(|err| FolioError::Encryption(format!("encryption failed: {}", err)))?;

        self.encrypted = true;
        self.locked = true;
        info!("Document encrypted");
        Ok(())
    }

    // -- Modification ---------------------------------------------------------

    /// Rotate one page (1-indexed) by `degrees`, which must be a multiple of 90.
    ///
    /// The angle is added to the page's current rotation (inherited values
    /// included) and normalised into 0..360.
    #[instrument(skip(self), fields(page_number, degrees))]
    pub fn rotate_page(&mut self, page_number: u32, degrees: i32) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(FolioError::PdfError(format!(
                "rotation must be a multiple of 90, got {}",
                degrees
            )));
        }

        let page_id = self.page_id(page_number)?;
        let existing_rotation = inherited_attribute(&self.document, page_id, b"Rotate")
            .and_then(|value| value.as_i64().ok())
            .unwrap_or(0);
        let new_rotation = (existing_rotation + degrees as i64).rem_euclid(360);

        match self.document.get_object_mut(page_id) {
            Ok(Object::Dictionary(dict)) => dict.set("Rotate", Object::Integer(new_rotation)),
            _ => {
                return Err(FolioError::PdfError(format!(
                    "page {} is not a dictionary",
                    page_number
                )));
            }
        }

        debug!(page_number, existing_rotation, new_rotation, "Page rotated");
        Ok(())
    }

    /// Shrink the document: re-encode embedded JPEG images at `quality`
    /// (1-100) where that makes them smaller, flate-compress uncompressed
    /// streams, and drop unreferenced objects.
    ///
    /// Returns the number of images that were re-encoded.
    #[instrument(skip(self), fields(quality))]
    pub fn compress(&mut self, quality: u8) -> Result<usize> {
        let mut reencoded = 0;

        if quality < 100 {
            for (id, object) in self.document.objects.iter_mut() {
                let Object::Stream(stream) = object else {
                    continue;
                };
                let Some(grayscale) = jpeg_image_colour(&stream.dict) else {
                    continue;
                };

                let processor = match ImageProcessor::from_jpeg_bytes(&stream.content) {
                    Ok(processor) => processor,
                    Err(err) => {
                        warn!(?id, %err, "Skipping undecodable image");
                        continue;
                    }
                };
                let encoded = if grayscale {
                    processor.to_gray_jpeg_bytes(quality)?
                } else {
                    processor.to_jpeg_bytes(quality)?
                };

                if encoded.len() < stream.content.len() {
                    debug!(?id, from = stream.content.len(), to = encoded.len(), "Image re-encoded");
                    stream.set_content(encoded);
                    reencoded += 1;
                }
            }
        }

        self.document.compress();
        self.document.delete_zero_length_streams();
        let pruned = self.document.prune_objects();
        self.document.renumber_objects();

        info!(reencoded, pruned = pruned.len(), "Document compressed");
        Ok(reencoded)
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document to bytes.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            FolioError::PdfError(format!("failed to serialise PDF: {}", err))
        })?;
        Ok(output)
    }
}

/// Look a key up on a page, walking the /Parent chain for inheritable keys.
pub(crate) fn inherited_attribute<'a>(
    document: &'a Document,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut current = page_id;
    // The page tree is shallow in practice; the bound guards against cycles.
    for _ in 0..64 {
        let dict = document.get_dictionary(current).ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// For a DCT-encoded image XObject in DeviceRGB or DeviceGray, return whether
/// it is grayscale. Anything else (CMYK, indexed, chained filters) is left alone.
fn jpeg_image_colour(dict: &lopdf::Dictionary) -> Option<bool> {
    let is_image = dict
        .get(b"Subtype")
        .and_then(Object::as_name)
        .is_ok_and(|name| name == b"Image");
    if !is_image {
        return None;
    }

    let is_dct = match dict.get(b"Filter").ok()? {
        Object::Name(name) => name == b"DCTDecode",
        Object::Array(filters) => {
            filters.len() == 1 && filters[0].as_name().is_ok_and(|name| name == b"DCTDecode")
        }
        _ => false,
    };
    if !is_dct {
        return None;
    }

    match dict.get(b"ColorSpace").and_then(Object::as_name) {
        Ok(b"DeviceRGB") => Some(false),
        Ok(b"DeviceGray") => Some(true),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{jpeg_pdf, text_pdf};

    #[test]
    fn page_count_and_text() {
        let bytes = text_pdf(&["first page", "second page"]);
        let reader = PdfReader::from_bytes(&bytes).expect("load");
        assert_eq!(reader.page_count(), 2);
        assert!(reader.page_text(2).expect("text").contains("second page"));
        assert!(reader.page_text(3).is_err());
    }

    #[test]
    fn rotate_accumulates_and_normalises() {
        let bytes = text_pdf(&["a", "b"]);
        let mut reader = PdfReader::from_bytes(&bytes).expect("load");
        reader.rotate_page(1, 90).expect("rotate");
        reader.rotate_page(1, 180).expect("rotate");
        assert_eq!(reader.page_rotation(1).expect("rotation"), 270);
        reader.rotate_page(2, -90).expect("rotate");
        assert_eq!(reader.page_rotation(2).expect("rotation"), 270);
        assert!(reader.rotate_page(1, 45).is_err());
    }

    #[test]
    fn unlock_plain_document_is_noop() {
        let bytes = text_pdf(&["plain"]);
        let mut reader = PdfReader::from_bytes(&bytes).expect("load");
        assert_eq!(reader.unlock("anything").expect("unlock"), UnlockOutcome::NotEncrypted);
    }

    #[test]
    fn encrypted_document_needs_the_password() {
        let mut reader = PdfReader::from_bytes(&text_pdf(&["secret text"])).expect("load");
        reader.encrypt("hunter2").expect("encrypt");
        let locked = reader.to_bytes().expect("bytes");

        let mut wrong = PdfReader::from_bytes(&locked).expect("reload");
        assert!(wrong.is_encrypted());
        let err = wrong.unlock("nope").err().expect("wrong password rejected");
        assert!(matches!(err, FolioError::Authentication(_)));

        let mut right = PdfReader::from_bytes(&locked).expect("reload");
        assert_eq!(right.unlock("hunter2").expect("unlock"), UnlockOutcome::Decrypted);
        assert!(right.page_text(1).expect("text").contains("secret text"));
    }

    #[test]
    fn page_tree_survives_protect_and_unlock() {
        let mut reader = PdfReader::from_bytes(&text_pdf(&["front", "back"])).expect("load");
        reader.encrypt("hunter2").expect("encrypt");
        let locked = reader.to_bytes().expect("bytes");

        let mut reopened = PdfReader::from_bytes(&locked).expect("reload");
        assert!(reopened.is_locked());
        assert!(matches!(reopened.page_text(1), Err(FolioError::Authentication(_))));

        reopened.unlock("hunter2").expect("unlock");
        assert!(!reopened.is_locked());
        assert!(!reopened.is_encrypted());
        assert_eq!(reopened.page_count(), 2);
        assert!(reopened.page_text(2).expect("text").contains("back"));

        let plain = reopened.to_bytes().expect("bytes");
        let copy = PdfReader::from_bytes(&plain).expect("reload plain");
        assert!(!copy.is_encrypted());
        assert_eq!(copy.page_count(), 2);
    }

    #[test]
    fn wrong_password_keeps_the_document_locked() {
        let mut reader = PdfReader::from_bytes(&text_pdf(&["x"])).expect("load");
        reader.encrypt("right").expect("encrypt");
        let locked = reader.to_bytes().expect("bytes");

        let mut reopened = PdfReader::from_bytes(&locked).expect("reload");
        assert!(reopened.unlock("wrong").is_err());
        assert!(reopened.ensure_readable().is_err());
        assert_eq!(reopened.unlock("right").expect("unlock"), UnlockOutcome::Decrypted);
        assert_eq!(reopened.page_count(), 1);
    }

    #[test]
    fn encrypting_twice_is_refused() {
        let mut reader = PdfReader::from_bytes(&text_pdf(&["x"])).expect("load");
        reader.encrypt("pw").expect("encrypt");
        assert!(matches!(reader.encrypt("pw"), Err(FolioError::Encryption(_))));
    }

    #[test]
    fn compress_reencodes_large_jpeg() {
        let bytes = jpeg_pdf(64, 64);
        let mut reader = PdfReader::from_bytes(&bytes).expect("load");
        assert_eq!(reader.compress(20).expect("compress"), 1);
        let out = reader.to_bytes().expect("bytes");
        assert!(out.len() < bytes.len());
    }

    #[test]
    fn compress_keeps_pages() {
        let bytes = text_pdf(&["one", "two"]);
        let mut reader = PdfReader::from_bytes(&bytes).expect("load");
        reader.compress(50).expect("compress");
        let out = reader.to_bytes().expect("bytes");
        assert_eq!(PdfReader::from_bytes(&out).expect("reload").page_count(), 2);
    }
}
