// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF assembler — build a new document out of pages copied from one or more
// source documents (merge, split, extract, unlock).

use std::collections::HashMap;

use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use folio_core::error::{FolioError, Result};
use tracing::{debug, info, instrument, warn};

use super::reader::{INHERITABLE_KEYS, PdfReader, inherited_attribute};

/// Accumulates copied pages into a fresh document.
///
/// Objects shared between pages of the same source (fonts, images) are copied
/// once. References to pages that are not themselves being copied (link
/// destinations, annotation back-pointers) become `null`.
pub struct PdfAssembler {
    document: Document,
    /// Id of the target's /Pages node.
    pages_id: ObjectId,
    /// (source reader uid, source object id) -> target object id.
    copied: HashMap<(u64, ObjectId), ObjectId>,
    page_count: usize,
}

impl PdfAssembler {
    /// Start an empty document with a catalog and an empty page tree.
    pub fn new() -> Self {
        let mut document = Document::with_version("1.5");
        let pages_id = document.new_object_id();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Object::Array(Vec::new()),
                "Count" => 0,
            }),
        );
        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        Self {
            document,
            pages_id,
            copied: HashMap::new(),
            page_count: 0,
        }
    }

    /// Pages appended so far.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Append one page (1-indexed) of `source` as the last page.
    #[instrument(skip_all, fields(page_number))]
    pub fn append_page(&mut self, source: &PdfReader, page_number: u32) -> Result<()> {
        let page_id = source.page_id(page_number)?;
        self.copy_page(source, page_id)?;
        debug!(page_number, total = self.page_count, "Page appended");
        Ok(())
    }

    /// Append every page of `source`, in order. Returns the number appended.
    #[instrument(skip_all, fields(source = source.display_name()))]
    pub fn append_document(&mut self, source: &PdfReader) -> Result<usize> {
        source.ensure_readable()?;
        let pages = source.document().get_pages();
        for page_id in pages.values() {
            self.copy_page(source, *page_id)?;
        }
        info!(appended = pages.len(), total = self.page_count, "Document appended");
        Ok(pages.len())
    }

    /// Serialise the assembled document.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            FolioError::PdfError(format!("failed to serialise assembled PDF: {}", err))
        })?;
        Ok(output)
    }

    // -- Helpers --------------------------------------------------------------

    fn copy_page(&mut self, source: &PdfReader, page_id: ObjectId) -> Result<()> {
        let source_doc = source.document();
        let mut page = source_doc
            .get_dictionary(page_id)
            .map_err(|err| {
                FolioError::PdfError(format!("cannot read page object {:?}: {}", page_id, err))
            })?
            .clone();

        // The copy loses its ancestors, so pull inherited attributes down.
        for key in INHERITABLE_KEYS {
            if !page.has(key)
                && let Some(value) = inherited_attribute(source_doc, page_id, key)
            {
                page.set(key.to_vec(), value.clone());
            }
        }
        page.remove(b"Parent");

        let new_id = self.document.new_object_id();
        self.copied.insert((source.uid(), page_id), new_id);

        let mut copied = self.copy_dictionary(source, &page)?;
        copied.set("Parent", self.pages_id);
        self.document.objects.insert(new_id, Object::Dictionary(copied));

        let pages = self
            .document
            .get_object_mut(self.pages_id)
            .and_then(Object::as_dict_mut)
            .map_err(|err| FolioError::PdfError(format!("no /Pages node: {}", err)))?;
        if let Ok(Object::Array(kids)) = pages.get_mut(b"Kids") {
            kids.push(Object::Reference(new_id));
        }
        self.page_count += 1;
        pages.set("Count", self.page_count as i64);

        Ok(())
    }

    fn copy_dictionary(&mut self, source: &PdfReader, dict: &Dictionary) -> Result<Dictionary> {
        let mut new_dict = Dictionary::new();
        for (key, value) in dict.iter() {
            // /Parent links are rebuilt by the caller, never followed.
            if key == b"Parent" {
                continue;
            }
            new_dict.set(key.clone(), self.copy_object(source, value)?);
        }
        Ok(new_dict)
    }

    fn copy_object(&mut self, source: &PdfReader, object: &Object) -> Result<Object> {
        match object {
            Object::Dictionary(dict) => Ok(Object::Dictionary(self.copy_dictionary(source, dict)?)),
            Object::Array(items) => {
                let mut new_items = Vec::with_capacity(items.len());
                for item in items {
                    new_items.push(self.copy_object(source, item)?);
                }
                Ok(Object::Array(new_items))
            }
            Object::Stream(stream) => {
                let dict = self.copy_dictionary(source, &stream.dict)?;
                let mut copy = Stream::new(dict, stream.content.clone());
                copy.allows_compression = stream.allows_compression;
                Ok(Object::Stream(copy))
            }
            Object::Reference(ref_id) => self.copy_reference(source, *ref_id),
            other => Ok(other.clone()),
        }
    }

    fn copy_reference(&mut self, source: &PdfReader, ref_id: ObjectId) -> Result<Object> {
        if let Some(new_id) = self.copied.get(&(source.uid(), ref_id)) {
            return Ok(Object::Reference(*new_id));
        }

        let referenced = match source.document().get_object(ref_id) {
            Ok(object) => object,
            Err(err) => {
                warn!(?ref_id, %err, "Cannot resolve reference, using Null");
                return Ok(Object::Null);
            }
        };

        // A page reached through a link or annotation is not part of the copy.
        let is_page = referenced
            .as_dict()
            .and_then(|dict| dict.get(b"Type"))
            .and_then(Object::as_name)
            .is_ok_and(|name| name == b"Page");
        if is_page {
            return Ok(Object::Null);
        }

        // Register before recursing so cycles resolve to the new id.
        let new_id = self.document.new_object_id();
        self.copied.insert((source.uid(), ref_id), new_id);
        let copy = self.copy_object(source, referenced)?;
        self.document.objects.insert(new_id, copy);
        Ok(Object::Reference(new_id))
    }
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}
