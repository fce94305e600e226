//! Cursor and position types.
//!
//! `Position` is a struct rather than `(usize, usize)` so line and column
//! can't be swapped by accident.

use serde::{Deserialize, Serialize};

/// A position in the text buffer (line and column).
///
/// Both line and column are 0-indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed, in characters not bytes)
    pub column: usize,
}

impl Position {
    /// Position at the start of the document.
    pub const ZERO: Position = Position { line: 0, column: 0 };

    /// Creates a new position.
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    /// Returns the 1-indexed line number shown to users.
    pub fn line_number(&self) -> usize {
        self.line + 1
    }

    /// Returns true if this position is before another.
    pub fn is_before(&self, other: &Position) -> bool {
        self < other
    }
}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.column.cmp(&other.column))
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 1-indexed for user-facing output
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

/// The editor's caret.
///
/// Movement helpers take the lengths they need from the caller, so the
/// cursor never holds a reference to the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Cursor {
    /// Current cursor position
    pub position: Position,

    /// Column to aim for when moving vertically through short lines
    pub preferred_column: Option<usize>,
}

impl Cursor {
    /// Creates a new cursor at a position.
    pub fn new(position: Position) -> Self {
        Self {
            position,
            preferred_column: None,
        }
    }

    /// Moves the cursor to a new position.
    pub fn move_to(&mut self, position: Position) {
        self.position = position;
        self.preferred_column = None;
    }

    /// Moves one line up, clamping to `line_len` of the target line.
    pub fn move_up(&mut self, line_len: impl Fn(usize) -> usize) {
        if self.position.line == 0 {
            return;
        }
        self.move_vertically(self.position.line - 1, line_len);
    }

    /// Moves one line down, staying on `last_line` at most.
    pub fn move_down(&mut self, last_line: usize, line_len: impl Fn(usize) -> usize) {
        if self.position.line >= last_line {
            return;
        }
        self.move_vertically(self.position.line + 1, line_len);
    }

    fn move_vertically(&mut self, line: usize, line_len: impl Fn(usize) -> usize) {
        let wanted = *self.preferred_column.get_or_insert(self.position.column);
        self.position = Position::new(line, wanted.min(line_len(line)));
    }

    /// Moves one character left, wrapping to the end of the previous line.
    pub fn move_left(&mut self, prev_line_len: Option<usize>) {
        if self.position.column > 0 {
            self.position.column -= 1;
        } else if let Some(len) = prev_line_len {
            self.position = Position::new(self.position.line - 1, len);
        }
        self.preferred_column = None;
    }

    /// Moves one character right, wrapping to the start of the next line.
    pub fn move_right(&mut self, line_len: usize, is_last_line: bool) {
        if self.position.column < line_len {
            self.position.column += 1;
        } else if !is_last_line {
            self.position = Position::new(self.position.line + 1, 0);
        }
        self.preferred_column = None;
    }
}
