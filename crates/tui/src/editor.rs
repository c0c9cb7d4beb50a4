use academy_core::grid::CellPosition;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::grids::GridId;

const MAX_INPUT_LEN: usize = 200;

/// Single-line text buffer with a caret counted in characters.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    input: String,
    cursor: usize,
}

impl TextInput {
    /// Start from `initial` with the caret at the end.
    pub fn new(initial: &str) -> Self {
        Self {
            input: initial.to_string(),
            cursor: initial.chars().count(),
        }
    }

    pub fn text(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn len(&self) -> usize {
        self.input.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map(|(index, _)| index)
            .unwrap_or(self.input.len())
    }

    pub fn at_start(&self) -> bool {
        self.cursor == 0
    }

    pub fn at_end(&self) -> bool {
        self.cursor >= self.len()
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let next = (self.cursor as isize + delta).clamp(0, self.len() as isize);
        self.cursor = next as usize;
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    pub fn insert(&mut self, ch: char) {
        if self.len() >= MAX_INPUT_LEN || ch.is_control() {
            return;
        }
        let at = self.byte_index(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_index(self.cursor);
        self.input.remove(at);
    }

    pub fn delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    /// Apply a caret or editing key. Returns false for keys that are not
    /// text editing.
    pub fn apply_key(&mut self, key: &KeyEvent) -> bool {
        match key.code {
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => self.insert(ch),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::Home => self.move_home(),
            KeyCode::End => self.move_end(),
            _ => return false,
        }
        true
    }

    /// Text before the caret, for placing the terminal cursor.
    pub fn before_cursor(&self) -> &str {
        &self.input[..self.byte_index(self.cursor)]
    }
}

/// In-place editor for the cell a navigator put into edit mode.
#[derive(Debug, Clone)]
pub struct CellEditor {
    pub grid: GridId,
    pub position: CellPosition,
    pub input: TextInput,
    original: String,
}

impl CellEditor {
    pub fn new(grid: GridId, position: CellPosition, current: &str) -> Self {
        Self {
            grid,
            position,
            input: TextInput::new(current),
            original: current.to_string(),
        }
    }

    pub fn is_changed(&self) -> bool {
        self.input.text() != self.original
    }
}
