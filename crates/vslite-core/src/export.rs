//! Line export: pressing Enter on a chosen line moves that line's text into
//! a markdown file.
//!
//! While armed, a key listener on the editor watches for Enter on the
//! trigger line. A non-blank line is captured, cleared, and the caret stays
//! at the start of it. Captured lines go through a queue and are appended in
//! order by `flush`, so the first write can fix the target file before the
//! second one is sent.
//!
//! Plain Enter appends the text directly after the previous export;
//! Ctrl+Enter writes it as its own paragraph.

use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use vslite_buffer::Position;

use crate::component::{EditorComponent, KeyDisposition, KeyListener, LineEditor, ListenerId};
use crate::config::ExportSection;
use crate::gateway::{AppendLineRequest, Failure, PickResponse, StorageGateway};
use crate::keymap::{Key, KeyPress};
use crate::{CoreError, CoreResult};

/// Where and when lines are exported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportConfig {
    trigger_line: usize,
    save_path: Option<PathBuf>,
    target_file: Option<PathBuf>,
}

impl ExportConfig {
    /// `trigger_line` is 1-based; 0 disables the feature.
    pub fn new(
        trigger_line: usize,
        save_path: Option<PathBuf>,
        target_file: Option<PathBuf>,
    ) -> Self {
        Self {
            trigger_line,
            save_path: save_path.filter(|p| !p.as_os_str().is_empty()),
            target_file: target_file.filter(|p| !p.as_os_str().is_empty()),
        }
    }

    pub fn from_section(section: &ExportSection) -> Self {
        Self::new(
            section.trigger_line,
            section.save_path.clone(),
            section.target_file.clone(),
        )
    }

    /// Writes these settings back into a config section.
    pub fn store(&self, section: &mut ExportSection) {
        section.trigger_line = self.trigger_line;
        section.save_path = self.save_path.clone();
        section.target_file = self.target_file.clone();
    }

    /// True when a trigger line and a destination are both set.
    pub fn enabled(&self) -> bool {
        self.trigger_line > 0 && (self.save_path.is_some() || self.target_file.is_some())
    }

    pub fn trigger_line(&self) -> usize {
        self.trigger_line
    }

    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }

    pub fn target_file(&self) -> Option<&Path> {
        self.target_file.as_deref()
    }
}

/// A line taken out of the editor, waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    pub content: String,
    pub add_newline: bool,
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    listener: ListenerId,
    generation: u64,
}

/// The line export feature.
pub struct LineExport {
    config: ExportConfig,
    armed: Option<Armed>,
    tx: mpsc::UnboundedSender<CapturedLine>,
    rx: mpsc::UnboundedReceiver<CapturedLine>,
}

impl LineExport {
    pub fn new(config: ExportConfig) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            config,
            armed: None,
            tx,
            rx,
        }
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// True while a key listener is registered on the current model.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Replaces the settings, re-registering the listener as needed.
    ///
    /// Returns whether the feature is armed afterwards.
    pub fn configure(
        &mut self,
        config: ExportConfig,
        editor: Option<&mut dyn EditorComponent>,
    ) -> bool {
        tracing::info!(
            "Line export: trigger line {}, save path {:?}, target file {:?}",
            config.trigger_line,
            config.save_path,
            config.target_file
        );
        self.config = config;

        match editor {
            Some(editor) => {
                self.detach(editor);
                if self.config.enabled() {
                    self.attach(editor);
                }
            }
            None => self.armed = None,
        }
        self.is_armed()
    }

    /// Arms the listener if the editor's model was replaced since the last
    /// attach. Returns true if a listener was registered.
    pub fn ensure_attached(&mut self, editor: &mut dyn EditorComponent) -> bool {
        if !self.config.enabled() {
            return false;
        }
        match self.armed {
            Some(armed) if armed.generation == editor.model_generation() => false,
            _ => {
                self.attach(editor);
                true
            }
        }
    }

    /// Removes the listener from the editor.
    pub fn detach(&mut self, editor: &mut dyn EditorComponent) {
        if let Some(armed) = self.armed.take() {
            // A listener from an older model went away with that model
            if armed.generation == editor.model_generation() {
                editor.remove_key_listener(armed.listener);
            }
        }
    }

    fn attach(&mut self, editor: &mut dyn EditorComponent) {
        self.detach(editor);
        let listener = editor.on_key_down(self.listener());
        self.armed = Some(Armed {
            listener,
            generation: editor.model_generation(),
        });
        tracing::debug!("Line export armed on line {}", self.config.trigger_line);
    }

    fn listener(&self) -> KeyListener {
        let trigger_line = self.config.trigger_line;
        let tx = self.tx.clone();

        Box::new(move |key: &KeyPress, editor: &mut dyn LineEditor| {
            if key.key != Key::Enter {
                return KeyDisposition::PassThrough;
            }
            let cursor = editor.cursor();
            if cursor.line_number() != trigger_line {
                return KeyDisposition::PassThrough;
            }
            let Some(content) = editor.line_text(cursor.line) else {
                return KeyDisposition::PassThrough;
            };
            if content.trim().is_empty() {
                return KeyDisposition::PassThrough;
            }

            let captured = CapturedLine {
                content,
                add_newline: key.modifiers.ctrl,
            };
            if tx.send(captured).is_err() {
                tracing::warn!("Line export queue closed");
            }

            editor.clear_line(cursor.line);
            editor.set_cursor(Position::new(cursor.line, 0));
            KeyDisposition::Handled
        })
    }

    /// Writes queued lines in capture order.
    ///
    /// The destination is read when each line is sent. The first file written
    /// to a folder becomes the target file for every later line.
    pub async fn flush<G: StorageGateway>(&mut self, gateway: &mut G) -> Vec<CoreResult<PathBuf>> {
        let mut results = Vec::new();

        while let Ok(line) = self.rx.try_recv() {
            let request = AppendLineRequest {
                content: line.content,
                save_path: self.config.save_path.clone(),
                target_file: self.config.target_file.clone(),
                add_newline: line.add_newline,
            };
            let response = gateway.append_line_content(request).await;

            let result = match (response.ok, response.file_path) {
                (true, Some(path)) => {
                    tracing::info!("Line content saved to {}", path.display());
                    if self.config.target_file.is_none() {
                        tracing::debug!("Target file is now {}", path.display());
                        self.config.target_file = Some(path.clone());
                    }
                    Ok(path)
                }
                (true, None) => Err(CoreError::Gateway("append returned no file path".into())),
                (false, _) => {
                    let error = match Failure::from_error(response.error) {
                        Failure::Io(e) => e,
                        Failure::Cancelled => "append failed".into(),
                    };
                    tracing::error!("Failed to save line content: {}", error);
                    Err(CoreError::Gateway(error))
                }
            };
            results.push(result);
        }

        results
    }
}

/// Edits export settings before they are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSettings {
    trigger_line: usize,
    save_path: Option<PathBuf>,
    target_file: Option<PathBuf>,
}

impl ExportSettings {
    /// Starts from the settings currently in effect.
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            trigger_line: config.trigger_line,
            save_path: config.save_path.clone(),
            target_file: config.target_file.clone(),
        }
    }

    pub fn set_trigger_line(&mut self, line: usize) {
        self.trigger_line = line;
    }

    /// Sets a save folder typed in by hand.
    pub fn set_save_path(&mut self, path: Option<PathBuf>) {
        self.save_path = path.filter(|p| !p.as_os_str().is_empty());
    }

    /// Uses a picked markdown file as the target.
    ///
    /// Returns `Ok(false)` if the dialog was cancelled.
    pub fn apply_file_pick(&mut self, pick: PickResponse) -> CoreResult<bool> {
        let is_file = pick.is_file;
        let Some(path) = picked(pick)? else {
            return Ok(false);
        };
        let is_markdown = path.extension().is_some_and(|ext| ext == "md");
        if !is_file || !is_markdown {
            return Err(CoreError::InvalidSelection(format!(
                "{} is not a .md file",
                path.display()
            )));
        }

        self.save_path = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf);
        self.target_file = Some(path);
        Ok(true)
    }

    /// Uses a picked folder; a new file is generated there on first export.
    pub fn apply_folder_pick(&mut self, pick: PickResponse) -> CoreResult<bool> {
        let is_directory = pick.is_directory;
        let Some(path) = picked(pick)? else {
            return Ok(false);
        };
        if !is_directory {
            return Err(CoreError::InvalidSelection(format!(
                "{} is not a folder",
                path.display()
            )));
        }

        self.target_file = None;
        self.save_path = Some(path);
        Ok(true)
    }

    /// One-line summary of what saving these settings would do.
    pub fn status_text(&self) -> String {
        let line = self.trigger_line;
        if line == 0 {
            return "Disabled (trigger line is 0)".to_string();
        }
        match (&self.target_file, &self.save_path) {
            (Some(target), _) => format!(
                "Enabled: line {} saves to file {}",
                line,
                target.display()
            ),
            (None, Some(folder)) => format!(
                "Enabled: line {} saves to folder {} (a new .md file is generated)",
                line,
                folder.display()
            ),
            (None, None) => format!(
                "Trigger line set to {}, but no save location chosen",
                line
            ),
        }
    }

    pub fn to_config(&self) -> ExportConfig {
        ExportConfig::new(
            self.trigger_line,
            self.save_path.clone(),
            self.target_file.clone(),
        )
    }
}

/// The accepted path of a pick, `None` if cancelled.
fn picked(pick: PickResponse) -> CoreResult<Option<PathBuf>> {
    if !pick.ok {
        return Failure::from_error(pick.error).into_result();
    }
    let path = pick
        .path
        .ok_or_else(|| CoreError::InvalidSelection("nothing selected".into()))?;
    if !pick.is_file && !pick.is_directory {
        return Err(CoreError::InvalidSelection(format!(
            "{} is neither a file nor a folder",
            path.display()
        )));
    }
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::BufferEditor;
    use crate::fs_gateway::{FsGateway, QueuedDialogs};
    use crate::keymap::Modifiers;
    use tempfile::tempdir;

    fn enter(editor: &mut BufferEditor, ctrl: bool) {
        let modifiers = if ctrl { Modifiers::CTRL } else { Modifiers::NONE };
        editor.key_down(&KeyPress::new(Key::Enter, modifiers));
    }

    /// Editor with the caret at the end of `line` (0-based).
    fn editor_at(text: &str, line: usize) -> BufferEditor {
        let mut editor = BufferEditor::new();
        editor.set_value(text);
        let len = editor.line_content(line).unwrap().chars().count();
        editor.set_position(Position::new(line, len));
        editor
    }

    fn folder_config(trigger: usize, dir: &Path) -> ExportConfig {
        ExportConfig::new(trigger, Some(dir.to_path_buf()), None)
    }

    #[test]
    fn test_enabled_rule() {
        assert!(!ExportConfig::default().enabled());
        assert!(!ExportConfig::new(3, None, None).enabled());
        assert!(!ExportConfig::new(0, Some("/tmp".into()), None).enabled());
        assert!(ExportConfig::new(3, Some("/tmp".into()), None).enabled());
        assert!(ExportConfig::new(3, None, Some("/tmp/a.md".into())).enabled());
        assert!(!ExportConfig::new(3, Some("".into()), None).enabled());
    }

    #[test]
    fn test_capture_clears_line() {
        let mut editor = editor_at("a\nb\nc\nd\nhello", 4);
        let mut export = LineExport::new(ExportConfig::new(5, Some("/tmp".into()), None));
        assert!(export.ensure_attached(&mut editor));

        enter(&mut editor, false);

        assert_eq!(editor.value(), "a\nb\nc\nd\n");
        assert_eq!(editor.position(), Position::new(4, 0));
        assert_eq!(
            export.rx.try_recv().unwrap(),
            CapturedLine {
                content: "hello".into(),
                add_newline: false
            }
        );
    }

    #[test]
    fn test_other_lines_keep_default_enter() {
        let mut editor = editor_at("one\ntwo", 0);
        let mut export = LineExport::new(ExportConfig::new(2, Some("/tmp".into()), None));
        export.ensure_attached(&mut editor);

        enter(&mut editor, false);
        assert_eq!(editor.value(), "one\n\ntwo");
        assert!(export.rx.try_recv().is_err());
    }

    #[test]
    fn test_blank_trigger_line_keeps_default_enter() {
        let mut editor = editor_at("one\n   ", 1);
        let mut export = LineExport::new(ExportConfig::new(2, Some("/tmp".into()), None));
        export.ensure_attached(&mut editor);

        enter(&mut editor, true);
        assert_eq!(editor.value(), "one\n   \n");
        assert!(export.rx.try_recv().is_err());
    }

    #[test]
    fn test_raw_text_is_captured_untrimmed() {
        let mut editor = editor_at("  indented  ", 0);
        let mut export = LineExport::new(ExportConfig::new(1, Some("/tmp".into()), None));
        export.ensure_attached(&mut editor);

        enter(&mut editor, true);
        let line = export.rx.try_recv().unwrap();
        assert_eq!(line.content, "  indented  ");
        assert!(line.add_newline);
    }

    #[test]
    fn test_configure_never_duplicates_listener() {
        let mut editor = BufferEditor::new();
        let mut export = LineExport::new(ExportConfig::default());
        let config = ExportConfig::new(1, Some("/tmp".into()), None);

        assert!(export.configure(config.clone(), Some(&mut editor)));
        assert!(export.configure(config.clone(), Some(&mut editor)));
        assert!(!export.ensure_attached(&mut editor));
        assert_eq!(editor.listener_count(), 1);

        assert!(!export.configure(ExportConfig::default(), Some(&mut editor)));
        assert_eq!(editor.listener_count(), 0);
    }

    #[test]
    fn test_rearms_after_model_reset() {
        let mut editor = BufferEditor::new();
        let mut export = LineExport::new(ExportConfig::default());
        export.configure(ExportConfig::new(1, Some("/tmp".into()), None), Some(&mut editor));

        editor.reset_model("fresh");
        assert_eq!(editor.listener_count(), 0);
        assert!(export.ensure_attached(&mut editor));
        assert_eq!(editor.listener_count(), 1);
    }

    #[tokio::test]
    async fn test_flush_fixes_target_after_first_write() {
        let dir = tempdir().unwrap();
        let mut gateway = FsGateway::new(QueuedDialogs::new());
        let mut editor = editor_at("first", 0);
        let mut export = LineExport::new(folder_config(1, dir.path()));
        export.ensure_attached(&mut editor);

        enter(&mut editor, false);
        editor.type_text("second");
        enter(&mut editor, true);

        let results = export.flush(&mut gateway).await;
        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        let second = results[1].as_ref().unwrap();
        assert_eq!(first, second);
        assert_eq!(export.config().target_file(), Some(first.as_path()));

        let text = std::fs::read_to_string(first).unwrap();
        assert!(text.ends_with("\n\nfirst\nsecond\n\n"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[tokio::test]
    async fn test_flush_reports_failures() {
        let mut gateway = FsGateway::new(QueuedDialogs::new());
        let mut editor = editor_at("x", 0);
        let mut export = LineExport::new(ExportConfig::new(1, Some("/tmp".into()), None));
        export.ensure_attached(&mut editor);
        enter(&mut editor, false);

        // Settings changed to no destination before the queue was flushed
        export.configure(ExportConfig::new(1, None, None), Some(&mut editor));
        let results = export.flush(&mut gateway).await;
        assert!(matches!(results[0], Err(CoreError::Gateway(_))));
    }

    #[test]
    fn test_settings_file_pick() {
        let mut settings = ExportSettings::default();
        settings.set_trigger_line(5);

        let pick = PickResponse {
            ok: true,
            path: Some("/notes/log.md".into()),
            is_file: true,
            is_directory: false,
            error: None,
        };
        assert!(settings.apply_file_pick(pick).unwrap());

        let config = settings.to_config();
        assert_eq!(config.target_file(), Some(Path::new("/notes/log.md")));
        assert_eq!(config.save_path(), Some(Path::new("/notes")));
        assert!(config.enabled());
        assert_eq!(
            settings.status_text(),
            "Enabled: line 5 saves to file /notes/log.md"
        );
    }

    #[test]
    fn test_settings_rejects_invalid_picks() {
        let mut settings = ExportSettings::default();

        let not_md = PickResponse {
            ok: true,
            path: Some("/notes/log.txt".into()),
            is_file: true,
            ..PickResponse::default()
        };
        assert!(matches!(
            settings.apply_file_pick(not_md),
            Err(CoreError::InvalidSelection(_))
        ));

        let not_dir = PickResponse {
            ok: true,
            path: Some("/notes/log.md".into()),
            is_file: true,
            ..PickResponse::default()
        };
        assert!(matches!(
            settings.apply_folder_pick(not_dir),
            Err(CoreError::InvalidSelection(_))
        ));

        // Cancel is not an error and changes nothing
        assert!(!settings.apply_folder_pick(PickResponse::default()).unwrap());
        assert_eq!(settings, ExportSettings::default());
    }

    #[test]
    fn test_settings_folder_pick_clears_target() {
        let config = ExportConfig::new(2, Some("/a".into()), Some("/a/x.md".into()));
        let mut settings = ExportSettings::from_config(&config);
        let pick = PickResponse {
            ok: true,
            path: Some("/b".into()),
            is_directory: true,
            ..PickResponse::default()
        };
        assert!(settings.apply_folder_pick(pick).unwrap());

        let config = settings.to_config();
        assert_eq!(config.target_file(), None);
        assert_eq!(config.save_path(), Some(Path::new("/b")));
        assert_eq!(
            settings.status_text(),
            "Enabled: line 2 saves to folder /b (a new .md file is generated)"
        );
    }

    #[test]
    fn test_status_text_without_destination() {
        let mut settings = ExportSettings::default();
        assert_eq!(settings.status_text(), "Disabled (trigger line is 0)");
        settings.set_trigger_line(4);
        assert_eq!(
            settings.status_text(),
            "Trigger line set to 4, but no save location chosen"
        );
        assert!(!settings.to_config().enabled());
    }
}
