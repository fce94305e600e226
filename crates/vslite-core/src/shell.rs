//! The shell controller.
//!
//! `Shell` owns all application state: documents, tabs, the editor binding,
//! line export, keymap, config and sidebar. Front ends call its methods and
//! subscribe to `ShellEvent`s; nothing lives in globals.
//!
//! Every mutation that can change the active document ends in `sync`, which
//! writes pending editor edits back, rebinds the editor and re-renders tabs.

use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

use crate::binding::{EditorBinding, Pumped, StatusBar};
use crate::command::Command;
use crate::config::Config;
use crate::document::{
    language_for_name, Document, DocumentId, DocumentKind, DocumentRegistry, PLAIN_TEXT,
};
use crate::event::{EventBus, ShellEvent};
use crate::export::{ExportConfig, ExportSettings, LineExport};
use crate::gateway::{
    Failure, OpenFileRequest, SaveFileRequest, SaveFileResponse, StorageGateway, WindowCommand,
};
use crate::keymap::{KeyPress, Keymap};
use crate::sidebar::{self, Sidebar, SidebarPanel};
use crate::tabs::{TabAction, TabClick, TabStrip};
use crate::{CoreError, CoreResult};

/// A save in flight, tied to the document it was requested for.
#[derive(Debug, Clone)]
pub struct SaveTicket {
    id: DocumentId,
    request: SaveFileRequest,
}

impl SaveTicket {
    pub fn id(&self) -> DocumentId {
        self.id
    }

    pub fn request(&self) -> &SaveFileRequest {
        &self.request
    }
}

/// How a save ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved(PathBuf),
    Cancelled,
}

/// Application state and the operations on it.
pub struct Shell<G: StorageGateway> {
    registry: DocumentRegistry,
    tabs: TabStrip,
    binding: EditorBinding,
    export: LineExport,
    keymap: Keymap,
    config: Config,
    events: EventBus,
    sidebar: Sidebar,
    gateway: G,
    /// Number of the last `Untitled-N` document
    untitled: usize,
    should_quit: bool,
}

impl<G: StorageGateway> Shell<G> {
    pub fn new(config: Config, binding: EditorBinding, gateway: G) -> Self {
        Self {
            registry: DocumentRegistry::new(),
            tabs: TabStrip::new(&config.tabs),
            binding,
            export: LineExport::new(ExportConfig::from_section(&config.export)),
            keymap: Keymap::from_config(&config),
            config,
            events: EventBus::new(),
            sidebar: Sidebar::new(),
            gateway,
            untitled: 0,
            should_quit: false,
        }
    }

    /// Opens the Welcome tab.
    pub async fn start(&mut self) -> DocumentId {
        let id = self
            .registry
            .create_document(DocumentKind::Welcome, "Welcome", "", "", None);
        self.emit(ShellEvent::DocumentOpened(id));
        self.emit(ShellEvent::DocumentFocused(id));
        self.sync().await;
        id
    }

    // ==================== Documents ====================

    /// Creates an empty `Untitled-N` document.
    pub async fn new_file(&mut self) -> DocumentId {
        self.untitled += 1;
        let name = format!("Untitled-{}", self.untitled);
        let id = self
            .registry
            .create_document(DocumentKind::File, name, "", PLAIN_TEXT, None);
        self.opened(id).await;
        id
    }

    /// Asks the gateway for a file and opens it.
    ///
    /// Returns `Ok(None)` if the user cancelled.
    pub async fn open_file(&mut self) -> CoreResult<Option<DocumentId>> {
        let response = self
            .gateway
            .open_file_dialog(OpenFileRequest::default())
            .await;

        if !response.ok {
            let failure = Failure::from_error(response.error);
            if let Failure::Io(e) = &failure {
                tracing::error!("Error opening file: {}", e);
            }
            return failure.into_result();
        }

        let path = response
            .path
            .ok_or_else(|| CoreError::Gateway("open returned no path".into()))?;
        let name = match response.name {
            Some(name) => name,
            None => display_name(&path),
        };
        let content = response.content.unwrap_or_default();
        Ok(Some(self.open_file_data(path, name, content).await))
    }

    /// Opens file data delivered from outside, e.g. by the native menu.
    ///
    /// A path that is already open just activates its tab.
    pub async fn open_file_data(
        &mut self,
        path: PathBuf,
        name: String,
        content: String,
    ) -> DocumentId {
        if let Some(id) = self.registry.find_by_path(&path) {
            self.focus(id).await;
            return id;
        }

        let language = language_for_name(&name);
        let id = self.registry.create_document(
            DocumentKind::File,
            name,
            content,
            language,
            Some(path),
        );
        self.opened(id).await;
        id
    }

    /// Opens a bundled sample from the explorer tree.
    pub async fn open_sample(&mut self, key: &str) -> CoreResult<DocumentId> {
        if let Some(id) = self.registry.find_sample(key) {
            self.focus(id).await;
            return Ok(id);
        }

        let sample = sidebar::sample(key).ok_or_else(|| CoreError::SampleNotFound(key.into()))?;
        let id = self.registry.create_document(
            DocumentKind::File,
            sample.name,
            sample.content,
            sample.language,
            None,
        );
        if let Some(doc) = self.registry.get_mut(id) {
            doc.set_sample(key);
        }
        self.opened(id).await;
        Ok(id)
    }

    /// Makes a tab active.
    pub async fn switch_to(&mut self, id: DocumentId) -> CoreResult<()> {
        if !self.registry.contains(id) {
            return Err(CoreError::DocumentNotFound(id));
        }
        self.focus(id).await;
        Ok(())
    }

    /// Closes a tab. Unsaved changes are discarded.
    pub async fn close_tab(&mut self, id: DocumentId) -> CoreResult<()> {
        let pumped = self.binding.pump(&mut self.registry);
        self.apply_pumped(pumped);

        let before = self.registry.active_id();
        let doc = self.registry.close(id)?;
        tracing::info!("Closed {}", doc.display_name());
        self.emit(ShellEvent::DocumentClosed(id));

        if let Some(active) = self.registry.active_id().filter(|&a| Some(a) != before) {
            self.emit(ShellEvent::DocumentFocused(active));
        }
        self.sync().await;
        Ok(())
    }

    /// Closes the active tab.
    pub async fn close_active(&mut self) -> CoreResult<()> {
        let id = self
            .registry
            .active_id()
            .ok_or(CoreError::NoActiveDocument)?;
        self.close_tab(id).await
    }

    /// Handles a click on the tab strip.
    pub async fn click_tab(&mut self, click: TabClick) -> CoreResult<()> {
        match self.tabs.click(click) {
            Some(TabAction::Activate(id)) => self.switch_to(id).await,
            Some(TabAction::Close(id)) => self.close_tab(id).await,
            None => Ok(()),
        }
    }

    async fn opened(&mut self, id: DocumentId) {
        self.emit(ShellEvent::DocumentOpened(id));
        self.emit(ShellEvent::DocumentFocused(id));
        self.sync().await;
    }

    async fn focus(&mut self, id: DocumentId) {
        if self.registry.activate(id) {
            self.emit(ShellEvent::DocumentFocused(id));
        }
        self.sync().await;
    }

    // ==================== Saving ====================

    /// Saves the active document through the gateway.
    pub async fn save_current(&mut self) -> CoreResult<SaveOutcome> {
        let ticket = self.begin_save()?;
        let response = self.gateway.save_file(ticket.request.clone()).await;
        self.finish_save(ticket, response)
    }

    /// Captures the active document and its content for saving.
    pub fn begin_save(&mut self) -> CoreResult<SaveTicket> {
        let pumped = self.binding.pump(&mut self.registry);
        self.apply_pumped(pumped);

        let doc = self
            .registry
            .active()
            .filter(|doc| !doc.is_welcome())
            .ok_or(CoreError::NoActiveDocument)?;

        Ok(SaveTicket {
            id: doc.id(),
            request: SaveFileRequest {
                path: doc.source_path().map(Path::to_path_buf),
                name: doc.display_name().to_string(),
                content: doc.content().to_string(),
            },
        })
    }

    /// Applies a save result to the document the ticket was issued for,
    /// whichever tab is active now.
    pub fn finish_save(
        &mut self,
        ticket: SaveTicket,
        response: SaveFileResponse,
    ) -> CoreResult<SaveOutcome> {
        if !response.ok {
            let failure = Failure::from_error(response.error);
            if let Failure::Io(e) = &failure {
                tracing::error!("Failed to save {}: {}", ticket.request.name, e);
            }
            return failure
                .into_result::<()>()
                .map(|_| SaveOutcome::Cancelled);
        }

        let path = response
            .path
            .or(ticket.request.path)
            .ok_or_else(|| CoreError::Gateway("save returned no path".into()))?;

        let id = ticket.id;
        self.registry.mark_saved_with(
            id,
            &ticket.request.content,
            Some(path.clone()),
            response.name,
        )?;
        tracing::info!("File saved successfully: {}", path.display());

        self.tabs.refresh_title(&self.registry, id);
        self.binding.refresh_status(&self.registry);
        self.emit(ShellEvent::DocumentSaved(id));
        Ok(SaveOutcome::Saved(path))
    }

    // ==================== Input ====================

    /// Routes a key press: accelerators first, then the editor (where line
    /// export listeners run before default handling).
    pub async fn handle_key(&mut self, key: KeyPress) -> CoreResult<()> {
        if let Some(command) = self.keymap.lookup(&key).cloned() {
            tracing::debug!("{} -> {}", key, command.display_name());
            return self.execute(command).await;
        }

        if self.binding.bound().is_none() {
            return Ok(());
        }
        if let Some(editor) = self.binding.editor_mut() {
            editor.key_down(&key);
        }
        self.after_edit().await;
        Ok(())
    }

    /// Types text into the bound document.
    pub async fn type_text(&mut self, text: &str) {
        if self.binding.bound().is_none() {
            return;
        }
        if let Some(editor) = self.binding.editor_mut() {
            editor.type_text(text);
        }
        self.after_edit().await;
    }

    async fn edit_history(&mut self, redo: bool) {
        if self.binding.bound().is_none() {
            return;
        }
        if let Some(editor) = self.binding.editor_mut() {
            if redo {
                editor.redo();
            } else {
                editor.undo();
            }
        }
        self.after_edit().await;
    }

    async fn after_edit(&mut self) {
        let pumped = self.binding.pump(&mut self.registry);
        self.apply_pumped(pumped);
        self.flush_exports().await;
    }

    // ==================== Line export ====================

    /// Writes captured lines. Returns the files written to.
    pub async fn flush_exports(&mut self) -> Vec<PathBuf> {
        let mut written = Vec::new();
        for result in self.export.flush(&mut self.gateway).await {
            match result {
                Ok(path) => {
                    self.emit(ShellEvent::LineExported(path.clone()));
                    written.push(path);
                }
                Err(e) => tracing::warn!("Line export failed: {}", e),
            }
        }

        let target = self.export.config().target_file().map(Path::to_path_buf);
        if target != self.config.export.target_file {
            self.config.export.target_file = target;
        }
        written
    }

    /// Settings form seeded with the current export settings.
    pub fn export_settings(&self) -> ExportSettings {
        ExportSettings::from_config(self.export.config())
    }

    /// Lets the user pick a markdown file for the settings form.
    ///
    /// Returns `Ok(false)` if the dialog was cancelled.
    pub async fn pick_export_file(&mut self, settings: &mut ExportSettings) -> CoreResult<bool> {
        let pick = self.gateway.pick_markdown_file().await;
        settings.apply_file_pick(pick)
    }

    /// Lets the user pick a folder for the settings form.
    pub async fn pick_export_folder(&mut self, settings: &mut ExportSettings) -> CoreResult<bool> {
        let pick = self.gateway.pick_folder().await;
        settings.apply_folder_pick(pick)
    }

    /// Saves the settings form and re-arms line export.
    pub fn apply_export_settings(&mut self, settings: &ExportSettings) {
        let config = settings.to_config();
        config.store(&mut self.config.export);

        let was_armed = self.export.is_armed();
        let armed = self.export.configure(config, self.binding.editor_mut());
        match (was_armed, armed) {
            (_, true) => self.emit(ShellEvent::ExportArmed),
            (true, false) => self.emit(ShellEvent::ExportDisarmed),
            (false, false) => {}
        }
    }

    /// Writes the current settings to a config file. Export settings include
    /// the target file adopted from the first export.
    pub fn save_config_to(&self, path: impl AsRef<Path>) -> CoreResult<()> {
        self.config.save_to(path)?;
        Ok(())
    }

    // ==================== Commands ====================

    /// Carries out a menu or keyboard command.
    pub async fn execute(&mut self, command: Command) -> CoreResult<()> {
        match command {
            Command::NewFile => {
                self.new_file().await;
            }
            Command::OpenFile => {
                self.open_file().await?;
            }
            Command::Save => {
                self.save_current().await?;
            }
            Command::CloseTab => self.close_active().await?,
            Command::Quit => self.quit(),
            Command::Undo => self.edit_history(false).await,
            Command::Redo => self.edit_history(true).await,
            Command::OpenSample { key } => {
                self.open_sample(&key).await?;
            }
            Command::SelectPanel(panel) => self.select_panel(panel),
            Command::Window(command) => self.window(command).await,
        }
        Ok(())
    }

    /// Forwards a window chrome button.
    pub async fn window(&mut self, command: WindowCommand) {
        self.gateway.window(command).await;
        if command == WindowCommand::Close {
            self.quit();
        }
    }

    pub fn select_panel(&mut self, panel: SidebarPanel) {
        if self.sidebar.select(panel) {
            self.emit(ShellEvent::PanelChanged(panel));
        }
    }

    /// Signals that the shell should quit.
    pub fn quit(&mut self) {
        if self.registry.has_unsaved_changes() {
            tracing::warn!("Quitting with unsaved changes");
        }
        self.should_quit = true;
        self.emit(ShellEvent::Quit);
    }

    // ==================== Binding ====================

    async fn sync(&mut self) {
        let was_welcome = self.binding.bound().is_none();
        match self.binding.bind_active(&mut self.registry).await {
            Ok(pumped) => self.apply_pumped(pumped),
            Err(e) => tracing::warn!("Editor not bound: {}", e),
        }

        if let Some(editor) = self.binding.editor_mut() {
            if self.export.ensure_attached(editor) {
                self.emit(ShellEvent::ExportArmed);
            }
        }

        if self.binding.bound().is_none() && !was_welcome {
            self.emit(ShellEvent::WelcomeShown);
        }
        self.tabs.render(&self.registry);
    }

    fn apply_pumped(&mut self, pumped: Pumped) {
        if let Some(id) = pumped.changed.filter(|_| pumped.modified_toggled) {
            self.tabs.refresh_title(&self.registry, id);
            self.emit(ShellEvent::DocumentChanged(id));
        }
        if let (Some(_), Some(id)) = (pumped.cursor, self.binding.bound()) {
            self.emit(ShellEvent::CursorMoved(id));
        }
    }

    // ==================== Accessors ====================

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn active_document(&self) -> Option<&Document> {
        self.registry.active()
    }

    pub fn tabs(&self) -> &TabStrip {
        &self.tabs
    }

    pub fn binding(&self) -> &EditorBinding {
        &self.binding
    }

    pub fn status(&self) -> &StatusBar {
        self.binding.status()
    }

    pub fn export(&self) -> &LineExport {
        &self.export
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sidebar(&self) -> &Sidebar {
        &self.sidebar
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn gateway_mut(&mut self) -> &mut G {
        &mut self.gateway
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Subscribes to shell events.
    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ShellEvent) {
        self.events.emit(event);
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
