//! Tab strip: the registry's display order rendered as clickable tabs.

use crate::config::TabsConfig;
use crate::document::{Document, DocumentId, DocumentRegistry};

/// One rendered tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub id: DocumentId,
    pub label: String,
    pub active: bool,
    pub closable: bool,
}

/// Where a tab was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabClick {
    Body(DocumentId),
    /// The close button. Never reaches the tab body.
    Close(DocumentId),
}

/// What a click asks the shell to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabAction {
    Activate(DocumentId),
    Close(DocumentId),
}

/// Renders tabs and turns clicks into actions.
#[derive(Debug, Clone)]
pub struct TabStrip {
    tabs: Vec<TabView>,
    welcome_closable: bool,
    modified_marker: String,
}

impl TabStrip {
    pub fn new(config: &TabsConfig) -> Self {
        Self {
            tabs: Vec::new(),
            welcome_closable: config.welcome_closable,
            modified_marker: config.modified_marker.clone(),
        }
    }

    /// Label for a document, e.g. `● notes.md` when modified.
    pub fn label_for(&self, doc: &Document) -> String {
        if doc.is_modified() {
            format!("{} {}", self.modified_marker, doc.display_name())
        } else {
            doc.display_name().to_string()
        }
    }

    fn view(&self, doc: &Document, active: Option<DocumentId>) -> TabView {
        TabView {
            id: doc.id(),
            label: self.label_for(doc),
            active: active == Some(doc.id()),
            closable: !doc.is_welcome() || self.welcome_closable,
        }
    }

    /// Rebuilds every tab from the registry.
    pub fn render(&mut self, registry: &DocumentRegistry) {
        let active = registry.active_id();
        self.tabs = registry.iter().map(|doc| self.view(doc, active)).collect();
    }

    /// Re-renders a single tab's label after a rename or modified toggle.
    pub fn refresh_title(&mut self, registry: &DocumentRegistry, id: DocumentId) {
        let Some(doc) = registry.get(id) else {
            return;
        };
        let label = self.label_for(doc);
        if let Some(tab) = self.tabs.iter_mut().find(|t| t.id == id) {
            tab.label = label;
        }
    }

    /// Maps a click to an action.
    pub fn click(&self, click: TabClick) -> Option<TabAction> {
        match click {
            TabClick::Body(id) => self
                .tab(id)
                .map(|_| TabAction::Activate(id)),
            TabClick::Close(id) => self
                .tab(id)
                .filter(|t| t.closable)
                .map(|_| TabAction::Close(id)),
        }
    }

    pub fn tab(&self, id: DocumentId) -> Option<&TabView> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn tabs(&self) -> &[TabView] {
        &self.tabs
    }

    pub fn labels(&self) -> Vec<&str> {
        self.tabs.iter().map(|t| t.label.as_str()).collect()
    }
}
