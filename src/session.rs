//! Caller-owned editing sessions with undo and reset.

use crate::error::EditResult;
use crate::pdf::document::{load_bytes, to_bytes};
use lopdf::Document;
use std::sync::Arc;

/// An immutable snapshot of a document's serialized bytes
#[derive(Debug, Clone)]
pub struct DocumentVersion {
    bytes: Arc<[u8]>,
    page_count: u32,
}

impl DocumentVersion {
    /// Parse `bytes` once to make sure they hold a readable PDF.
    pub fn from_bytes(bytes: Vec<u8>) -> EditResult<Self> {
        let page_count = load_bytes(&bytes)?.get_pages().len() as u32;
        Ok(DocumentVersion {
            bytes: bytes.into(),
            page_count,
        })
    }

    pub fn from_document(doc: &mut Document) -> EditResult<Self> {
        let page_count = doc.get_pages().len() as u32;
        Ok(DocumentVersion {
            bytes: to_bytes(doc)?.into(),
            page_count,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn document(&self) -> EditResult<Document> {
        load_bytes(&self.bytes)
    }

    /// Load a fresh copy, let `edit` change it and serialize the result.
    pub fn transform<F>(&self, edit: F) -> EditResult<DocumentVersion>
    where
        F: FnOnce(&mut Document) -> EditResult<()>,
    {
        let mut doc = self.document()?;
        edit(&mut doc)?;
        DocumentVersion::from_document(&mut doc)
    }
}

#[derive(Debug, Clone)]
pub struct Revision {
    pub label: String,
    pub version: DocumentVersion,
}

/// The original upload plus every revision applied since.
#[derive(Debug, Clone)]
pub struct EditSession {
    name: String,
    original: DocumentVersion,
    revisions: Vec<Revision>,
}

impl EditSession {
    pub fn open(name: impl Into<String>, bytes: Vec<u8>) -> EditResult<Self> {
        Ok(EditSession {
            name: name.into(),
            original: DocumentVersion::from_bytes(bytes)?,
            revisions: Vec::new(),
        })
    }

    /// File name the session was opened from
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn original(&self) -> &DocumentVersion {
        &self.original
    }

    pub fn current(&self) -> &DocumentVersion {
        self.revisions
            .last()
            .map(|revision| &revision.version)
            .unwrap_or(&self.original)
    }

    pub fn is_modified(&self) -> bool {
        !self.revisions.is_empty()
    }

    /// Run `transform` on the current version and record the result.
    /// A failing transform leaves the session unchanged.
    pub fn apply<F>(&mut self, label: impl Into<String>, transform: F) -> EditResult<&DocumentVersion>
    where
        F: FnOnce(&DocumentVersion) -> EditResult<DocumentVersion>,
    {
        let version = transform(self.current())?;
        Ok(self.commit(label, version))
    }

    /// Record an already computed version as the next revision.
    pub fn commit(&mut self, label: impl Into<String>, version: DocumentVersion) -> &DocumentVersion {
        let label = label.into();
        tracing::debug!(label = %label, pages = version.page_count(), "new revision");
        self.revisions.push(Revision { label, version });
        self.current()
    }

    /// Drop the latest revision, returning it.
    pub fn undo(&mut self) -> Option<Revision> {
        self.revisions.pop()
    }

    /// Discard every revision and return to the original document.
    pub fn reset(&mut self) {
        tracing::debug!(discarded = self.revisions.len(), "reset to original");
        self.revisions.clear();
    }

    pub fn history(&self) -> impl Iterator<Item = &str> {
        self.revisions.iter().map(|revision| revision.label.as_str())
    }
}
