//! Binding between the document registry and the single editor component.
//!
//! One editor instance serves every tab. Switching tabs swaps the editor's
//! value; it never recreates the editor, so undo history does not survive a
//! switch.
//!
//! The component loads asynchronously and arrives over a one-shot channel.
//! A bind that comes first waits for it, up to the configured timeout.

use std::time::Duration;
use tokio::sync::oneshot;
use vslite_buffer::Position;

use crate::component::{ComponentEvent, EditorComponent};
use crate::document::{DocumentId, DocumentRegistry};
use crate::{CoreError, CoreResult};

/// Sends the editor component once it has loaded.
pub type EditorSender = oneshot::Sender<Box<dyn EditorComponent>>;

enum EditorSlot {
    Loading(oneshot::Receiver<Box<dyn EditorComponent>>),
    Ready(Box<dyn EditorComponent>),
    /// The loader went away without sending
    Failed,
}

/// What occupies the main area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Surface {
    #[default]
    Welcome,
    Editor,
}

/// Status bar texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBar {
    pub file_info: String,
    pub language_mode: String,
    pub cursor: String,
}

impl StatusBar {
    fn show(&mut self, name: &str, language: &str) {
        self.file_info = name.to_string();
        self.language_mode = if language.is_empty() {
            "Plain Text".to_string()
        } else {
            language.to_string()
        };
    }

    fn set_cursor(&mut self, position: Position) {
        self.cursor = format!("Ln {}, Col {}", position.line + 1, position.column + 1);
    }
}

impl Default for StatusBar {
    fn default() -> Self {
        Self {
            file_info: String::new(),
            language_mode: "Plain Text".to_string(),
            cursor: "Ln 1, Col 1".to_string(),
        }
    }
}

/// Changes pulled out of the editor by `pump`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pumped {
    /// Document whose content was updated from the editor
    pub changed: Option<DocumentId>,
    /// Set if that update flipped the modified flag
    pub modified_toggled: bool,
    /// Last caret position reported
    pub cursor: Option<Position>,
}

/// Keeps the editor showing the active document.
pub struct EditorBinding {
    slot: EditorSlot,
    bound: Option<DocumentId>,
    /// Last document given to the editor, kept while Welcome is shown
    last_bound: Option<DocumentId>,
    ready_timeout: Duration,
    surface: Surface,
    status: StatusBar,
}

impl EditorBinding {
    /// Creates a binding whose editor arrives later over the returned sender.
    pub fn loading(ready_timeout: Duration) -> (EditorSender, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self::with_slot(EditorSlot::Loading(rx), ready_timeout))
    }

    /// Creates a binding around an editor that is already loaded.
    pub fn ready_with(editor: Box<dyn EditorComponent>, ready_timeout: Duration) -> Self {
        Self::with_slot(EditorSlot::Ready(editor), ready_timeout)
    }

    fn with_slot(slot: EditorSlot, ready_timeout: Duration) -> Self {
        Self {
            slot,
            bound: None,
            last_bound: None,
            ready_timeout,
            surface: Surface::Welcome,
            status: StatusBar::default(),
        }
    }

    /// Waits for the editor component.
    ///
    /// On timeout the slot keeps waiting, so a later call can still succeed.
    pub async fn ready(&mut self) -> CoreResult<&mut dyn EditorComponent> {
        if let EditorSlot::Loading(rx) = &mut self.slot {
            let loaded = tokio::time::timeout(self.ready_timeout, rx).await;
            match loaded {
                Ok(Ok(editor)) => {
                    tracing::info!("Editor component loaded");
                    self.slot = EditorSlot::Ready(editor);
                }
                Ok(Err(_)) => {
                    tracing::error!("Editor component loader dropped");
                    self.slot = EditorSlot::Failed;
                }
                Err(_) => {
                    tracing::warn!("Editor not ready after {:?}", self.ready_timeout);
                    return Err(CoreError::EditorNotReady(self.ready_timeout));
                }
            }
        }

        match &mut self.slot {
            EditorSlot::Ready(editor) => Ok(editor.as_mut()),
            _ => Err(CoreError::EditorNotReady(self.ready_timeout)),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.slot, EditorSlot::Ready(_))
    }

    /// Returns the editor if it has loaded.
    pub fn editor(&self) -> Option<&dyn EditorComponent> {
        match &self.slot {
            EditorSlot::Ready(editor) => Some(editor.as_ref()),
            _ => None,
        }
    }

    pub fn editor_mut(&mut self) -> Option<&mut dyn EditorComponent> {
        match &mut self.slot {
            EditorSlot::Ready(editor) => Some(editor.as_mut()),
            _ => None,
        }
    }

    /// Document currently shown in the editor.
    pub fn bound(&self) -> Option<DocumentId> {
        self.bound
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    pub fn status(&self) -> &StatusBar {
        &self.status
    }

    /// Makes the main area show the active document.
    ///
    /// Pending edits are first written back to the document they belong to.
    /// Rebinding the already-bound document leaves the editor's content,
    /// caret and undo history alone.
    pub async fn bind_active(&mut self, registry: &mut DocumentRegistry) -> CoreResult<Pumped> {
        let pumped = self.pump(registry);

        let Some(doc) = registry.active().filter(|doc| !doc.is_welcome()) else {
            self.show_welcome(registry);
            return Ok(pumped);
        };
        let id = doc.id();

        if self.bound == Some(id) {
            return Ok(pumped);
        }

        let reset = self.last_bound.is_some_and(|prev| !registry.contains(prev));
        let editor = self.ready().await?;
        if reset {
            editor.reset_model(doc.content());
        } else {
            editor.set_value(doc.content());
        }
        editor.set_language(doc.language());
        editor.set_visible(true);
        editor.layout();
        let position = editor.position();

        tracing::debug!("Bound {} ({})", id, doc.display_name());
        self.bound = Some(id);
        self.last_bound = Some(id);
        self.surface = Surface::Editor;
        self.status.show(doc.display_name(), doc.language());
        self.status.set_cursor(position);
        Ok(pumped)
    }

    fn show_welcome(&mut self, registry: &DocumentRegistry) {
        if let Some(editor) = self.editor_mut() {
            editor.set_visible(false);
        }
        self.bound = None;
        self.surface = Surface::Welcome;
        if let Some(welcome) = registry.active() {
            self.status.show(welcome.display_name(), welcome.language());
        }
    }

    /// Drains editor events into the bound document and the status bar.
    ///
    /// Value changes made by a bind are ignored.
    pub fn pump(&mut self, registry: &mut DocumentRegistry) -> Pumped {
        let mut pumped = Pumped::default();
        let EditorSlot::Ready(editor) = &mut self.slot else {
            return pumped;
        };

        let mut dirty = false;
        for event in editor.take_events() {
            match event {
                ComponentEvent::ContentChanged { flush: false } => dirty = true,
                ComponentEvent::ContentChanged { flush: true } => {}
                ComponentEvent::CursorMoved(position) => pumped.cursor = Some(position),
            }
        }

        if let Some(position) = pumped.cursor {
            self.status.set_cursor(position);
        }

        if let (true, Some(id)) = (dirty, self.bound) {
            match registry.update_content(id, &editor.value()) {
                Ok(toggled) => {
                    pumped.changed = Some(id);
                    pumped.modified_toggled = toggled;
                }
                Err(e) => tracing::warn!("Dropping editor change: {}", e),
            }
        }

        pumped
    }

    /// Refreshes the status bar after the bound document was renamed.
    pub fn refresh_status(&mut self, registry: &DocumentRegistry) {
        if let Some(doc) = self.bound.and_then(|id| registry.get(id)) {
            self.status.show(doc.display_name(), doc.language());
        }
    }
}
