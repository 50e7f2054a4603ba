//! # Document Books
//!
//! The committed documents of one variant plus its sequence counter.
//!
//! Sequence numbers start at 1, grow by one per created document and are
//! never handed out twice, even after the newest document is deleted. The
//! counter is persisted next to the documents and reconciled on load against
//! the highest stored number.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Document, DocumentKind};

/// Next sequence number per variant, as persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sequences {
    pub next_sale: u64,
    pub next_purchase: u64,
}

impl Default for Sequences {
    fn default() -> Self {
        Sequences {
            next_sale: 1,
            next_purchase: 1,
        }
    }
}

impl Sequences {
    pub fn next_for(&self, kind: DocumentKind) -> u64 {
        match kind {
            DocumentKind::Sale => self.next_sale,
            DocumentKind::Purchase => self.next_purchase,
        }
    }
}

/// Ordered documents of a single [`DocumentKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBook {
    kind: DocumentKind,
    next_sequence: u64,
    documents: Vec<Document>,
}

impl DocumentBook {
    pub fn new(kind: DocumentKind) -> Self {
        DocumentBook {
            kind,
            next_sequence: 1,
            documents: Vec::new(),
        }
    }

    /// Rebuilds a book from stored documents and the stored counter.
    ///
    /// The counter becomes `max(stored_next, highest number + 1)`, so a lost
    /// or stale counter can never cause a reuse.
    pub fn restore(kind: DocumentKind, documents: Vec<Document>, stored_next: u64) -> CoreResult<Self> {
        if let Some(foreign) = documents.iter().find(|d| d.kind != kind) {
            return Err(CoreError::malformed(
                kind.to_string(),
                format!("document {} is a {}", foreign.id, foreign.kind),
            ));
        }

        let highest = documents.iter().map(|d| d.sequence_number).max().unwrap_or(0);
        Ok(DocumentBook {
            kind,
            next_sequence: stored_next.max(highest + 1).max(1),
            documents,
        })
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Number the next created document will get.
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.id == id)
    }

    /// Looks a document up, failing with `DocumentNotFound`.
    pub fn require(&self, id: &str) -> CoreResult<&Document> {
        self.get(id).ok_or_else(|| CoreError::DocumentNotFound {
            kind: self.kind,
            id: id.to_string(),
        })
    }

    /// Appends a new document, stamping it with the next sequence number.
    pub fn push_new(&mut self, mut document: Document) -> &Document {
        document.kind = self.kind;
        document.sequence_number = self.next_sequence;
        self.next_sequence += 1;
        self.documents.push(document);
        &self.documents[self.documents.len() - 1]
    }

    /// Replaces the content of an existing document. Id, kind, sequence
    /// number and creation time of the stored document are kept.
    pub fn replace(&mut self, mut document: Document) -> CoreResult<&Document> {
        let kind = self.kind;
        let stored = self
            .documents
            .iter_mut()
            .find(|d| d.id == document.id)
            .ok_or_else(|| CoreError::DocumentNotFound {
                kind,
                id: document.id.clone(),
            })?;

        document.kind = stored.kind;
        document.sequence_number = stored.sequence_number;
        document.created_at = stored.created_at;
        *stored = document;
        Ok(&*stored)
    }

    pub fn remove(&mut self, id: &str) -> CoreResult<Document> {
        let index = self
            .documents
            .iter()
            .position(|d| d.id == id)
            .ok_or_else(|| CoreError::DocumentNotFound {
                kind: self.kind,
                id: id.to_string(),
            })?;
        Ok(self.documents.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Document> {
        self.documents.iter_mut()
    }

    pub fn as_slice(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
