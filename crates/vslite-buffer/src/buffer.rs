//! Rope-backed text buffer.
//!
//! ## Why Rope?
//!
//! The editor component keeps whole files in memory and edits them one
//! keystroke at a time. Ropes give O(log n) insertion and deletion and cheap
//! line indexing, which is what cursor tracking and line export need.

use ropey::Rope;
use std::borrow::Cow;
use std::ops::Range;

use crate::history::{Edit, EditKind, History};
use crate::{BufferError, BufferResult, Position};

/// Default number of undo groups kept per buffer.
const DEFAULT_HISTORY: usize = 1000;

/// A text buffer backed by a rope, with undo history.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    /// The rope holding our text content
    rope: Rope,

    /// Edit history for undo/redo
    history: History,
}

impl TextBuffer {
    /// Creates a new empty buffer.
    ///
    /// # Example
    /// ```
    /// use vslite_buffer::TextBuffer;
    ///
    /// let buffer = TextBuffer::new();
    /// assert!(buffer.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            rope: Rope::new(),
            history: History::new(DEFAULT_HISTORY),
        }
    }

    /// Creates an empty buffer with a custom undo limit.
    pub fn with_history(history: History) -> Self {
        Self {
            rope: Rope::new(),
            history,
        }
    }

    /// Replaces the whole text. Undo history is cleared.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.history.clear();
    }

    // ==================== Text Access ====================

    /// Returns the entire text content.
    #[inline]
    pub fn text(&self) -> Cow<'_, str> {
        self.rope.slice(..).into()
    }

    /// Returns a specific line (0-indexed), including its line break.
    pub fn line(&self, line_idx: usize) -> BufferResult<Cow<'_, str>> {
        self.check_line(line_idx)?;
        Ok(self.rope.line(line_idx).into())
    }

    /// Returns a specific line without its trailing line break.
    pub fn line_text(&self, line_idx: usize) -> BufferResult<String> {
        let line = self.line(line_idx)?;
        Ok(line.trim_end_matches(&['\n', '\r'][..]).to_string())
    }

    /// Returns a slice of text by character range.
    pub fn slice(&self, range: Range<usize>) -> BufferResult<Cow<'_, str>> {
        if range.end > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(range.end));
        }
        Ok(self.rope.slice(range).into())
    }

    // ==================== Measurements ====================

    /// Returns true if the buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rope.len_chars() == 0
    }

    /// Returns the number of characters in the buffer.
    #[inline]
    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    /// Returns the number of lines in the buffer.
    ///
    /// An empty buffer has 1 line. A buffer ending with `\n` counts
    /// the empty line after it.
    #[inline]
    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    /// Returns the length of a line in characters, excluding the line break.
    pub fn line_len(&self, line_idx: usize) -> BufferResult<usize> {
        Ok(self.line_text(line_idx)?.chars().count())
    }

    fn check_line(&self, line_idx: usize) -> BufferResult<()> {
        if line_idx >= self.len_lines() {
            return Err(BufferError::PositionOutOfBounds {
                line: line_idx,
                column: 0,
            });
        }
        Ok(())
    }

    // ==================== Mutations ====================

    /// Inserts text at a character index.
    pub fn insert(&mut self, char_idx: usize, text: &str) -> BufferResult<()> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }
        if text.is_empty() {
            return Ok(());
        }

        self.history.push(Edit::insert(char_idx, text));
        self.rope.insert(char_idx, text);
        Ok(())
    }

    /// Inserts text at a line:column position.
    pub fn insert_at(&mut self, pos: Position, text: &str) -> BufferResult<()> {
        let char_idx = self.position_to_char_idx(pos)?;
        self.insert(char_idx, text)
    }

    /// Deletes text in a character range, returning what was removed.
    pub fn delete(&mut self, range: Range<usize>) -> BufferResult<String> {
        if range.end > self.len_chars() || range.start > range.end {
            return Err(BufferError::InvalidCharIndex(range.end));
        }

        let deleted: String = self.rope.slice(range.clone()).into();
        if deleted.is_empty() {
            return Ok(deleted);
        }

        self.history.push(Edit::delete(range.start, deleted.clone()));
        self.rope.remove(range);
        Ok(deleted)
    }

    /// Replaces the text of one line, keeping its line break.
    ///
    /// Recorded as a single undo step.
    pub fn replace_line_text(&mut self, line_idx: usize, text: &str) -> BufferResult<String> {
        let old_len = self.line_len(line_idx)?;
        let start = self.rope.line_to_char(line_idx);

        self.history.begin_group();
        let removed = self.delete(start..start + old_len);
        let inserted = removed.and_then(|removed| {
            self.insert(start, text)?;
            Ok(removed)
        });
        self.history.end_group();
        inserted
    }

    // ==================== Undo/Redo ====================

    /// Undoes the last edit group.
    pub fn undo(&mut self) -> BufferResult<()> {
        let edits = self.history.undo().ok_or(BufferError::NothingToUndo)?;

        // Inverse operations are applied without recording to history
        for edit in edits {
            self.apply(&edit.inverse());
        }
        Ok(())
    }

    /// Redoes the last undone edit group.
    pub fn redo(&mut self) -> BufferResult<()> {
        let edits = self.history.redo().ok_or(BufferError::NothingToRedo)?;
        for edit in edits {
            self.apply(&edit);
        }
        Ok(())
    }

    fn apply(&mut self, edit: &Edit) {
        match edit.kind {
            EditKind::Insert => self.rope.insert(edit.position, &edit.content),
            EditKind::Delete => {
                let end = edit.position + edit.content.chars().count();
                self.rope.remove(edit.position..end);
            }
        }
    }

    /// Returns true if there are edits to undo.
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    /// Returns true if there are edits to redo.
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ==================== Position Conversion ====================

    /// Converts a Position (line, column) to a character index.
    pub fn position_to_char_idx(&self, pos: Position) -> BufferResult<usize> {
        if pos.line >= self.len_lines() {
            return Err(BufferError::PositionOutOfBounds {
                line: pos.line,
                column: pos.column,
            });
        }

        let line_start = self.rope.line_to_char(pos.line);
        let line_len = self.line_len(pos.line)?;

        // Column may sit just past the last character (insertion point)
        if pos.column > line_len {
            return Err(BufferError::PositionOutOfBounds {
                line: pos.line,
                column: pos.column,
            });
        }

        Ok(line_start + pos.column)
    }

    /// Converts a character index to a Position (line, column).
    pub fn char_idx_to_position(&self, char_idx: usize) -> BufferResult<Position> {
        if char_idx > self.len_chars() {
            return Err(BufferError::InvalidCharIndex(char_idx));
        }

        let line = self.rope.char_to_line(char_idx);
        let column = char_idx - self.rope.line_to_char(line);
        Ok(Position { line, column })
    }

    /// Clamps a position into the buffer's bounds.
    pub fn clamp(&self, pos: Position) -> Position {
        let line = pos.line.min(self.len_lines().saturating_sub(1));
        let column = pos.column.min(self.line_len(line).unwrap_or(0));
        Position { line, column }
    }
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for TextBuffer {
    fn from(s: &str) -> Self {
        Self {
            rope: Rope::from_str(s),
            history: History::new(DEFAULT_HISTORY),
        }
    }
}

impl From<String> for TextBuffer {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}


#[cfg(test)]
mod props {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Insert(usize, String),
        Delete(usize, usize),
        ClearLine(usize),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (any::<usize>(), "[a-z\n]{1,6}").prop_map(|(at, s)| Op::Insert(at, s)),
            (any::<usize>(), 0usize..5).prop_map(|(at, n)| Op::Delete(at, n)),
            any::<usize>().prop_map(Op::ClearLine),
        ]
    }

    proptest! {
        #[test]
        fn undo_all_restores_text(start in "[a-z\n]{0,20}", ops in prop::collection::vec(op(), 0..30)) {
            let mut buffer = TextBuffer::with_history(History::new(1000).without_coalescing());
            buffer.set_text(&start);

            for op in ops {
                let len = buffer.len_chars();
                match op {
                    Op::Insert(at, s) => buffer.insert(at % (len + 1), &s).unwrap(),
                    Op::Delete(at, n) => {
                        let from = at % (len + 1);
                        buffer.delete(from..(from + n).min(len)).unwrap();
                    }
                    Op::ClearLine(line) => {
                        buffer.replace_line_text(line % buffer.len_lines(), "").unwrap();
                    }
                }
            }

            while buffer.undo().is_ok() {}
            prop_assert_eq!(buffer.text(), start.as_str());
        }
    }
}
