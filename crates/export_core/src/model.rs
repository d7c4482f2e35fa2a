use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::naming::INDEX_FILENAME;

pub type DocumentId = String;

/// A document as listed by the store. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    pub id: DocumentId,
    pub name: String,
    /// Carried for completeness; the created date is derived from `name`.
    pub created_time: Option<DateTime<Utc>>,
    pub modified_time: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedDocument {
    pub document: DocumentRef,
    pub html: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDocument {
    pub title: String,
    /// Markdown rendering of everything after the title element.
    pub body: String,
}

/// Terminal artifact of a document pipeline: a directory and the text of its index file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRecord {
    pub path: PathBuf,
    pub content: String,
}

impl OutputRecord {
    pub fn new(path: PathBuf, content: String) -> Self {
        Self { path, content }
    }

    pub fn dir(&self) -> &Path {
        &self.path
    }

    pub fn file_path(&self) -> PathBuf {
        self.path.join(INDEX_FILENAME)
    }
}
