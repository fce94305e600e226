//! # VSLite Buffer
//!
//! Text storage backing the embedded editor component.
//!
//! The shell reuses one editor instance for every tab, so the buffer is
//! loaded and replaced wholesale on each tab switch (`set_text`). Replacing
//! the text drops the undo history; per-tab undo is not preserved.
//!
//! ## Coordinates
//! - `Position` is 0-indexed (line, column in chars)
//! - `Display` for `Position` is 1-indexed, matching the status bar

mod buffer;
mod cursor;
mod history;

pub use buffer::TextBuffer;
pub use cursor::{Cursor, Position};
pub use history::{Edit, EditKind, History};

/// Result type for buffer operations
pub type BufferResult<T> = Result<T, BufferError>;

/// Errors that can occur during buffer operations
#[derive(Debug, thiserror::Error)]
pub enum BufferError {
    #[error("Position {line}:{column} is out of bounds")]
    PositionOutOfBounds { line: usize, column: usize },

    #[error("Invalid character index: {0}")]
    InvalidCharIndex(usize),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_creation() {
        let buffer = TextBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len_lines(), 1);
    }

    #[test]
    fn test_set_text_drops_history() {
        let mut buffer = TextBuffer::from("first tab");
        buffer.insert(0, "edited ").unwrap();
        assert!(buffer.can_undo());

        buffer.set_text("second tab");
        assert_eq!(buffer.text(), "second tab");
        assert!(!buffer.can_undo());
        assert!(matches!(buffer.undo(), Err(BufferError::NothingToUndo)));
    }

    #[test]
    fn test_line_operations() {
        let buffer = TextBuffer::from("Line 1\nLine 2\r\nLine 3");
        assert_eq!(buffer.len_lines(), 3);
        assert_eq!(buffer.line(0).unwrap(), "Line 1\n");
        assert_eq!(buffer.line_text(1).unwrap(), "Line 2");
        assert_eq!(buffer.line_text(2).unwrap(), "Line 3");
        assert!(buffer.line_text(3).is_err());
    }
}
