//! Undo/redo history.
//!
//! Edits are grouped: a group is one undo step. Rapid adjacent keystrokes
//! coalesce into the previous edit, and compound operations (such as
//! replacing a line) are bracketed with `begin_group`/`end_group`.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// The type of edit operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditKind {
    /// Text was inserted
    Insert,
    /// Text was deleted
    Delete,
}

/// A single edit operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edit {
    /// What kind of edit this is
    pub kind: EditKind,
    /// Character position where the edit occurred
    pub position: usize,
    /// The text that was inserted or deleted
    pub content: String,
}

impl Edit {
    /// Creates an insert edit.
    pub fn insert(position: usize, content: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Insert,
            position,
            content: content.into(),
        }
    }

    /// Creates a delete edit.
    pub fn delete(position: usize, content: impl Into<String>) -> Self {
        Self {
            kind: EditKind::Delete,
            position,
            content: content.into(),
        }
    }

    /// Returns the inverse of this edit.
    pub fn inverse(&self) -> Self {
        Self {
            kind: match self.kind {
                EditKind::Insert => EditKind::Delete,
                EditKind::Delete => EditKind::Insert,
            },
            position: self.position,
            content: self.content.clone(),
        }
    }

    /// Returns true if `next` continues this edit without a gap.
    ///
    /// Edits containing a line break never coalesce.
    pub fn can_coalesce(&self, next: &Edit) -> bool {
        if self.kind != next.kind || self.content.contains('\n') || next.content.contains('\n') {
            return false;
        }

        match self.kind {
            EditKind::Insert => self.position + self.content.chars().count() == next.position,
            // Backspace run or forward-delete run
            EditKind::Delete => {
                next.position + next.content.chars().count() == self.position
                    || self.position == next.position
            }
        }
    }

    /// Merges `next` into this edit.
    pub fn coalesce(&mut self, next: Edit) {
        match self.kind {
            EditKind::Insert => self.content.push_str(&next.content),
            EditKind::Delete if next.position < self.position => {
                self.content = next.content + &self.content;
                self.position = next.position;
            }
            EditKind::Delete => self.content.push_str(&next.content),
        }
    }
}

#[derive(Debug, Clone)]
struct EditGroup {
    edits: Vec<Edit>,
    last_touched: Instant,
    /// Redone and compound groups never absorb later keystrokes
    sealed: bool,
}

impl EditGroup {
    fn new(edit: Edit) -> Self {
        Self {
            edits: vec![edit],
            last_touched: Instant::now(),
            sealed: false,
        }
    }
}

/// Bounded undo/redo stacks of edit groups.
#[derive(Debug, Clone)]
pub struct History {
    undo_stack: VecDeque<EditGroup>,
    redo_stack: Vec<EditGroup>,
    max_size: usize,
    coalesce_threshold: Duration,
    /// Set while a compound operation is open
    group: GroupState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupState {
    Closed,
    /// Opened, first edit not pushed yet
    Opening,
    Open,
}

impl History {
    /// Creates a new history with the given capacity.
    pub fn new(max_size: usize) -> Self {
        Self {
            undo_stack: VecDeque::with_capacity(max_size.min(64)),
            redo_stack: Vec::new(),
            max_size,
            coalesce_threshold: Duration::from_millis(300),
            group: GroupState::Closed,
        }
    }

    /// Disables keystroke coalescing; every push is its own undo step.
    pub fn without_coalescing(mut self) -> Self {
        self.coalesce_threshold = Duration::ZERO;
        self
    }

    /// Pushes an edit. Clears the redo stack.
    pub fn push(&mut self, edit: Edit) {
        self.redo_stack.clear();

        match self.group {
            GroupState::Opening => {
                self.group = GroupState::Open;
                self.push_group(EditGroup::new(edit));
                return;
            }
            GroupState::Open => {
                if let Some(group) = self.undo_stack.back_mut() {
                    group.edits.push(edit);
                    group.last_touched = Instant::now();
                    return;
                }
            }
            GroupState::Closed => {}
        }

        if let Some(group) = self.undo_stack.back_mut() {
            let recent =
                !group.sealed && group.last_touched.elapsed() < self.coalesce_threshold;
            if let Some(last) = group.edits.last_mut() {
                if recent && last.can_coalesce(&edit) {
                    last.coalesce(edit);
                    group.last_touched = Instant::now();
                    return;
                }
            }
        }

        self.push_group(EditGroup::new(edit));
    }

    fn push_group(&mut self, group: EditGroup) {
        self.undo_stack.push_back(group);
        while self.undo_stack.len() > self.max_size {
            self.undo_stack.pop_front();
        }
    }

    /// Starts a compound edit; everything until `end_group` is one undo step.
    pub fn begin_group(&mut self) {
        self.group = GroupState::Opening;
    }

    /// Ends the current compound edit.
    pub fn end_group(&mut self) {
        if self.group == GroupState::Open {
            if let Some(group) = self.undo_stack.back_mut() {
                group.sealed = true;
            }
        }
        self.group = GroupState::Closed;
    }

    /// Pops the last group. Edits come back newest first, ready to invert.
    pub fn undo(&mut self) -> Option<Vec<Edit>> {
        let group = self.undo_stack.pop_back()?;
        let edits = group.edits.iter().rev().cloned().collect();
        self.redo_stack.push(group);
        Some(edits)
    }

    /// Pops the last undone group. Edits come back in original order.
    pub fn redo(&mut self) -> Option<Vec<Edit>> {
        let mut group = self.redo_stack.pop()?;
        let edits = group.edits.clone();
        group.sealed = true;
        self.undo_stack.push_back(group);
        Some(edits)
    }

    /// Returns true if there are edits to undo.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns true if there are edits to redo.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Clears all history.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.group = GroupState::Closed;
    }

    /// Returns the number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }
}
