//! The embedded editing component.
//!
//! The shell treats the editor as a black box behind `EditorComponent`.
//! `BufferEditor` is the in-process implementation over `vslite_buffer`.
//!
//! ## Key listeners
//!
//! Listeners registered with `on_key_down` run before the component's own
//! handling, in registration order. A listener returning
//! `KeyDisposition::Handled` suppresses the default action. Listeners belong
//! to the current model: `reset_model` drops them.

use vslite_buffer::{Cursor, History, Position, TextBuffer};

use crate::document::PLAIN_TEXT;
use crate::keymap::{Key, KeyPress};

/// Identifies a registered key listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// What a key listener did with a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// Let the editor handle the key
    PassThrough,
    /// Suppress the editor's default behavior
    Handled,
}

/// Notifications drained by the binding manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentEvent {
    /// Content changed. `flush` is set for programmatic value changes.
    ContentChanged { flush: bool },
    /// The caret moved.
    CursorMoved(Position),
}

/// The slice of the editor a key listener may touch.
pub trait LineEditor {
    fn cursor(&self) -> Position;
    fn line_text(&self, line: usize) -> Option<String>;
    /// Empties a line, keeping its line break.
    fn clear_line(&mut self, line: usize) -> bool;
    fn set_cursor(&mut self, position: Position);
}

/// Callback run on key down, before default handling.
pub type KeyListener = Box<dyn FnMut(&KeyPress, &mut dyn LineEditor) -> KeyDisposition + Send>;

/// A text editor the shell can bind documents to.
pub trait EditorComponent: Send {
    /// Returns the full text.
    fn value(&self) -> String;

    /// Replaces the full text. Clears undo and emits a flush change.
    fn set_value(&mut self, text: &str);

    /// Discards the current model and starts a new one holding `text`.
    ///
    /// Key listeners are bound to the model and are dropped with it.
    fn reset_model(&mut self, text: &str);

    /// Increments every time the model is recreated.
    fn model_generation(&self) -> u64;

    fn set_language(&mut self, language: &str);
    fn language(&self) -> &str;

    /// Recomputes layout after becoming visible.
    fn layout(&mut self);

    /// Layout passes run so far.
    fn layout_count(&self) -> usize;
    fn set_visible(&mut self, visible: bool);
    fn is_visible(&self) -> bool;

    fn position(&self) -> Position;
    fn set_position(&mut self, position: Position);
    fn line_content(&self, line: usize) -> Option<String>;
    fn clear_line(&mut self, line: usize) -> bool;

    /// Delivers a key press: listeners first, then default handling.
    fn key_down(&mut self, key: &KeyPress);

    /// Inserts text at the caret as if typed.
    fn type_text(&mut self, text: &str);

    fn undo(&mut self) -> bool;
    fn redo(&mut self) -> bool;
    fn can_undo(&self) -> bool;

    fn on_key_down(&mut self, listener: KeyListener) -> ListenerId;

    /// Removes a listener. Returns false if it was not registered.
    fn remove_key_listener(&mut self, id: ListenerId) -> bool;

    fn listener_count(&self) -> usize;

    /// Drains pending notifications.
    fn take_events(&mut self) -> Vec<ComponentEvent>;
}

/// Text and caret of one model.
struct Model {
    buffer: TextBuffer,
    cursor: Cursor,
    events: Vec<ComponentEvent>,
}

impl Model {
    fn new(text: &str, undo_limit: usize) -> Self {
        let mut buffer = TextBuffer::with_history(History::new(undo_limit));
        buffer.set_text(text);
        Self {
            buffer,
            cursor: Cursor::default(),
            events: Vec::new(),
        }
    }

    fn move_cursor(&mut self, position: Position) {
        let position = self.buffer.clamp(position);
        if position != self.cursor.position {
            self.cursor.move_to(position);
            self.events.push(ComponentEvent::CursorMoved(position));
        }
    }

    fn note_cursor(&mut self, before: Position) {
        if self.cursor.position != before {
            self.events
                .push(ComponentEvent::CursorMoved(self.cursor.position));
        }
    }

    fn changed(&mut self) {
        self.events
            .push(ComponentEvent::ContentChanged { flush: false });
    }

    fn line_len(&self, line: usize) -> usize {
        self.buffer.line_len(line).unwrap_or(0)
    }

    fn insert(&mut self, text: &str) {
        let Ok(idx) = self.buffer.position_to_char_idx(self.cursor.position) else {
            return;
        };
        if self.buffer.insert(idx, text).is_err() {
            return;
        }
        let end = idx + text.chars().count();
        if let Ok(pos) = self.buffer.char_idx_to_position(end) {
            self.move_cursor(pos);
        }
        self.changed();
    }

    fn backspace(&mut self) {
        let Ok(idx) = self.buffer.position_to_char_idx(self.cursor.position) else {
            return;
        };
        if idx == 0 {
            return;
        }
        // A CRLF pair is removed as one line break
        let start = match self.buffer.slice(idx.saturating_sub(2)..idx) {
            Ok(s) if s == "\r\n" => idx - 2,
            _ => idx - 1,
        };
        if self.buffer.delete(start..idx).is_ok() {
            if let Ok(pos) = self.buffer.char_idx_to_position(start) {
                self.move_cursor(pos);
            }
            self.changed();
        }
    }

    fn delete_forward(&mut self) {
        let Ok(idx) = self.buffer.position_to_char_idx(self.cursor.position) else {
            return;
        };
        if idx >= self.buffer.len_chars() {
            return;
        }
        let end = match self.buffer.slice(idx..(idx + 2).min(self.buffer.len_chars())) {
            Ok(s) if s == "\r\n" => idx + 2,
            _ => idx + 1,
        };
        if self.buffer.delete(idx..end).is_ok() {
            self.changed();
        }
    }

    fn restore_cursor(&mut self) {
        let clamped = self.buffer.clamp(self.cursor.position);
        self.move_cursor(clamped);
    }
}

/// Rope-backed editor component.
pub struct BufferEditor {
    model: Model,
    generation: u64,
    language: String,
    visible: bool,
    listeners: Vec<(ListenerId, KeyListener)>,
    next_listener: u64,
    undo_limit: usize,
    layout_count: usize,
}

impl BufferEditor {
    pub fn new() -> Self {
        Self::with_undo_limit(1000)
    }

    pub fn with_undo_limit(undo_limit: usize) -> Self {
        Self {
            model: Model::new("", undo_limit),
            generation: 0,
            language: PLAIN_TEXT.to_string(),
            visible: false,
            listeners: Vec::new(),
            next_listener: 0,
            undo_limit,
            layout_count: 0,
        }
    }

    fn default_key(&mut self, key: &KeyPress) {
        if key.modifiers.ctrl && !key.modifiers.alt {
            match key.key {
                Key::Char('z') => {
                    self.undo();
                }
                Key::Char('y') => {
                    self.redo();
                }
                // Ctrl+Enter still breaks the line
                Key::Enter => self.model.insert("\n"),
                _ => {}
            }
            return;
        }

        let model = &mut self.model;
        let before = model.cursor.position;
        match key.key {
            Key::Enter => model.insert("\n"),
            Key::Tab => model.insert("    "),
            Key::Space => model.insert(" "),
            Key::Char(c) if !key.modifiers.is_command() => {
                let c = if key.modifiers.shift {
                    c.to_uppercase().next().unwrap_or(c)
                } else {
                    c
                };
                model.insert(c.encode_utf8(&mut [0; 4]));
            }
            Key::Backspace => model.backspace(),
            Key::Delete => model.delete_forward(),
            Key::Left => {
                let line = model.cursor.position.line;
                let prev = line.checked_sub(1).map(|l| model.line_len(l));
                model.cursor.move_left(prev);
                model.note_cursor(before);
            }
            Key::Right => {
                let line = model.cursor.position.line;
                let last = line + 1 >= model.buffer.len_lines();
                let len = model.line_len(line);
                model.cursor.move_right(len, last);
                model.note_cursor(before);
            }
            Key::Up => {
                let buffer = &model.buffer;
                model
                    .cursor
                    .move_up(|l| buffer.line_len(l).unwrap_or(0));
                model.note_cursor(before);
            }
            Key::Down => {
                let buffer = &model.buffer;
                let last = buffer.len_lines().saturating_sub(1);
                model
                    .cursor
                    .move_down(last, |l| buffer.line_len(l).unwrap_or(0));
                model.note_cursor(before);
            }
            Key::Home => model.move_cursor(Position::new(before.line, 0)),
            Key::End => {
                let len = model.line_len(before.line);
                model.move_cursor(Position::new(before.line, len));
            }
            Key::Escape | Key::Char(_) => {}
        }
    }
}

impl Default for BufferEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineEditor for Model {
    fn cursor(&self) -> Position {
        self.cursor.position
    }

    fn line_text(&self, line: usize) -> Option<String> {
        self.buffer.line_text(line).ok()
    }

    fn clear_line(&mut self, line: usize) -> bool {
        match self.buffer.replace_line_text(line, "") {
            Ok(removed) if removed.is_empty() => true,
            Ok(_) => {
                self.changed();
                self.restore_cursor();
                true
            }
            Err(_) => false,
        }
    }

    fn set_cursor(&mut self, position: Position) {
        self.move_cursor(position);
    }
}

impl EditorComponent for BufferEditor {
    fn value(&self) -> String {
        self.model.buffer.text().into_owned()
    }

    fn set_value(&mut self, text: &str) {
        self.model.buffer.set_text(text);
        self.model.cursor = Cursor::default();
        self.model
            .events
            .push(ComponentEvent::ContentChanged { flush: true });
    }

    fn reset_model(&mut self, text: &str) {
        self.model = Model::new(text, self.undo_limit);
        self.model
            .events
            .push(ComponentEvent::ContentChanged { flush: true });
        self.generation += 1;
        if !self.listeners.is_empty() {
            tracing::debug!(
                "Model {} dropped {} key listener(s)",
                self.generation,
                self.listeners.len()
            );
        }
        self.listeners.clear();
    }

    fn model_generation(&self) -> u64 {
        self.generation
    }

    fn set_language(&mut self, language: &str) {
        self.language = language.to_string();
    }

    fn language(&self) -> &str {
        &self.language
    }

    fn layout(&mut self) {
        self.layout_count += 1;
    }

    fn layout_count(&self) -> usize {
        self.layout_count
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn position(&self) -> Position {
        self.model.cursor.position
    }

    fn set_position(&mut self, position: Position) {
        self.model.move_cursor(position);
    }

    fn line_content(&self, line: usize) -> Option<String> {
        self.model.line_text(line)
    }

    fn clear_line(&mut self, line: usize) -> bool {
        LineEditor::clear_line(&mut self.model, line)
    }

    fn key_down(&mut self, key: &KeyPress) {
        let mut listeners = std::mem::take(&mut self.listeners);
        let mut handled = false;
        for (_, listener) in listeners.iter_mut() {
            if listener(key, &mut self.model) == KeyDisposition::Handled {
                handled = true;
                break;
            }
        }
        // Keep any listener registered meanwhile, after the existing ones
        listeners.append(&mut self.listeners);
        self.listeners = listeners;

        if !handled {
            self.default_key(key);
        }
    }

    fn type_text(&mut self, text: &str) {
        self.model.insert(text);
    }

    fn undo(&mut self) -> bool {
        if self.model.buffer.undo().is_err() {
            return false;
        }
        self.model.changed();
        self.model.restore_cursor();
        true
    }

    fn redo(&mut self) -> bool {
        if self.model.buffer.redo().is_err() {
            return false;
        }
        self.model.changed();
        self.model.restore_cursor();
        true
    }

    fn can_undo(&self) -> bool {
        self.model.buffer.can_undo()
    }

    fn on_key_down(&mut self, listener: KeyListener) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, listener));
        id
    }

    fn remove_key_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn take_events(&mut self) -> Vec<ComponentEvent> {
        std::mem::take(&mut self.model.events)
    }
}
