//! Open documents and the registry that orders them into tabs.
//!
//! `DocumentId` is a newtype over a time-ordered UUID (v7): a timestamp plus
//! a counter, so ids are never reused while the registry lives.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

/// Unique identifier for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentId(Uuid);

impl DocumentId {
    /// Creates a new unique document ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a tab holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// The start page. Has no editor and no backing storage.
    Welcome,
    /// Editable text, saved or not.
    File,
}

/// Language mode used when no extension matches.
pub const PLAIN_TEXT: &str = "plaintext";

/// Maps a file name to the editor's language mode.
pub fn language_for_name(name: &str) -> &'static str {
    let ext = match name.rsplit_once('.') {
        Some((_, ext)) => ext.to_lowercase(),
        None => return PLAIN_TEXT,
    };

    match ext.as_str() {
        "js" => "javascript",
        "ts" => "typescript",
        "html" => "html",
        "css" => "css",
        "json" => "json",
        "py" => "python",
        "java" => "java",
        "cpp" => "cpp",
        "c" => "c",
        "cs" => "csharp",
        "php" => "php",
        "rb" => "ruby",
        "go" => "go",
        "rs" => "rust",
        "sql" => "sql",
        "xml" => "xml",
        "yaml" | "yml" => "yaml",
        "md" => "markdown",
        _ => PLAIN_TEXT,
    }
}

/// One open tab.
///
/// While a document is bound to the editor, the editor holds the live text
/// and `content` is the last value synced back from it.
#[derive(Debug, Clone)]
pub struct Document {
    id: DocumentId,
    kind: DocumentKind,
    display_name: String,
    content: String,
    /// Content as last opened or saved
    saved_snapshot: String,
    language: String,
    modified: bool,
    source_path: Option<PathBuf>,
    /// Key of the file-tree sample this was opened from
    sample: Option<String>,
}

impl Document {
    fn new(
        kind: DocumentKind,
        display_name: String,
        content: String,
        language: String,
        source_path: Option<PathBuf>,
    ) -> Self {
        Self {
            id: DocumentId::new(),
            kind,
            display_name,
            saved_snapshot: content.clone(),
            content,
            language,
            modified: false,
            source_path,
            sample: None,
        }
    }

    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn is_welcome(&self) -> bool {
        self.kind == DocumentKind::Welcome
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn sample(&self) -> Option<&str> {
        self.sample.as_deref()
    }

    /// Tags the document as opened from a file-tree sample.
    pub fn set_sample(&mut self, key: impl Into<String>) {
        self.sample = Some(key.into());
    }
}

/// Owns the open documents, their tab order and the active one.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    /// All open documents
    documents: HashMap<DocumentId, Document>,

    /// Display order of tabs
    order: Vec<DocumentId>,

    /// Currently active document
    active: Option<DocumentId>,
}

impl DocumentRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document at the end of the tab order and activates it.
    ///
    /// Only one Welcome document may exist; asking for another returns the
    /// existing one. Display names are not deduplicated.
    pub fn create_document(
        &mut self,
        kind: DocumentKind,
        display_name: impl Into<String>,
        content: impl Into<String>,
        language: impl Into<String>,
        source_path: Option<PathBuf>,
    ) -> DocumentId {
        if kind == DocumentKind::Welcome {
            if let Some(id) = self.welcome_id() {
                self.active = Some(id);
                return id;
            }
        }

        let doc = Document::new(
            kind,
            display_name.into(),
            content.into(),
            language.into(),
            source_path,
        );
        let id = doc.id();
        tracing::debug!("Created {:?} document {} ({})", kind, id, doc.display_name);

        self.documents.insert(id, doc);
        self.order.push(id);
        self.active = Some(id);
        id
    }

    /// Activates a document. Returns true if the active document changed.
    pub fn activate(&mut self, id: DocumentId) -> bool {
        if !self.documents.contains_key(&id) || self.active == Some(id) {
            return false;
        }
        self.active = Some(id);
        true
    }

    /// Removes a document.
    ///
    /// When the active tab closes, the first remaining tab in display order
    /// becomes active, or nothing when no tabs remain.
    pub fn close(&mut self, id: DocumentId) -> CoreResult<Document> {
        let doc = self
            .documents
            .remove(&id)
            .ok_or(CoreError::DocumentNotFound(id))?;
        self.order.retain(|&i| i != id);

        if self.active == Some(id) {
            self.active = self.order.first().copied();
        }

        Ok(doc)
    }

    /// Stores new content. Returns true if the modified flag flipped.
    ///
    /// Content that differs from the saved snapshot marks the document
    /// modified; the flag stays set until the next save.
    pub fn update_content(&mut self, id: DocumentId, content: &str) -> CoreResult<bool> {
        let doc = self.get_mut(id).ok_or(CoreError::DocumentNotFound(id))?;
        if doc.is_welcome() || doc.content == content {
            return Ok(false);
        }

        doc.content = content.to_string();
        let was_modified = doc.modified;
        if doc.content != doc.saved_snapshot {
            doc.modified = true;
        }
        Ok(doc.modified != was_modified)
    }

    /// Clears the modified flag after a successful save.
    pub fn mark_saved(
        &mut self,
        id: DocumentId,
        new_path: Option<PathBuf>,
        new_display_name: Option<String>,
    ) -> CoreResult<()> {
        let content = self
            .get(id)
            .ok_or(CoreError::DocumentNotFound(id))?
            .content
            .clone();
        self.mark_saved_with(id, &content, new_path, new_display_name)
    }

    /// Records that `saved` was written to storage.
    ///
    /// The document stays modified if it was edited after the save request
    /// captured `saved`.
    pub fn mark_saved_with(
        &mut self,
        id: DocumentId,
        saved: &str,
        new_path: Option<PathBuf>,
        new_display_name: Option<String>,
    ) -> CoreResult<()> {
        let doc = self.get_mut(id).ok_or(CoreError::DocumentNotFound(id))?;
        doc.modified = doc.content != saved;
        doc.saved_snapshot = saved.to_string();

        if let Some(path) = new_path {
            doc.source_path = Some(path);
        }
        if let Some(name) = new_display_name {
            doc.language = language_for_name(&name).to_string();
            doc.display_name = name;
        }
        Ok(())
    }

    /// Finds an open document by its backing file.
    pub fn find_by_path(&self, path: &Path) -> Option<DocumentId> {
        self.iter()
            .find(|doc| doc.source_path() == Some(path))
            .map(Document::id)
    }

    /// Finds an open document by the sample it was opened from.
    pub fn find_sample(&self, key: &str) -> Option<DocumentId> {
        self.iter()
            .find(|doc| doc.sample() == Some(key))
            .map(Document::id)
    }

    /// Returns the Welcome document, if open.
    pub fn welcome_id(&self) -> Option<DocumentId> {
        self.iter().find(|doc| doc.is_welcome()).map(Document::id)
    }

    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(&id)
    }

    pub fn get_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(&id)
    }

    pub fn contains(&self, id: DocumentId) -> bool {
        self.documents.contains_key(&id)
    }

    /// Returns the active document.
    pub fn active(&self) -> Option<&Document> {
        self.active.and_then(|id| self.documents.get(&id))
    }

    pub fn active_id(&self) -> Option<DocumentId> {
        self.active
    }

    /// Returns documents in tab order.
    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.order.iter().filter_map(|id| self.documents.get(id))
    }

    /// Returns the tab order.
    pub fn order(&self) -> &[DocumentId] {
        &self.order
    }

    /// Returns true if any document has unsaved changes.
    pub fn has_unsaved_changes(&self) -> bool {
        self.documents.values().any(Document::is_modified)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
