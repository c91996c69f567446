//! Minimal line-based text editor backing the text preview.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorCommand {
    None,
    Save,
    Close,
}

#[derive(Debug, Clone)]
pub struct TextEditor {
    pub path: String,
    pub name: String,
    lines: Vec<String>,
    row: usize,
    /// Cursor column in chars, not bytes.
    col: usize,
    pub scroll: usize,
    pub dirty: bool,
    pub saving: bool,
    /// Set by a close request on unsaved edits; a second close discards them.
    pub confirm_discard: bool,
    crlf: bool,
}

impl TextEditor {
    pub fn new(path: String, name: String, content: &str) -> Self {
        let mut lines: Vec<String> = content.split('\n').map(|l| l.trim_end_matches('\r').to_string()).collect();
        if lines.is_empty() {
            lines.push(String::new());
        }
        Self {
            path,
            name,
            lines,
            row: 0,
            col: 0,
            scroll: 0,
            dirty: false,
            saving: false,
            confirm_discard: false,
            crlf: content.contains("\r\n"),
        }
    }

    pub fn content(&self) -> String {
        self.lines.join(if self.crlf { "\r\n" } else { "\n" })
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines[row].chars().count()
    }

    fn byte_index(&self, row: usize, col: usize) -> usize {
        self.lines[row]
            .char_indices()
            .nth(col)
            .map_or(self.lines[row].len(), |(idx, _)| idx)
    }

    pub fn insert_char(&mut self, c: char) {
        let idx = self.byte_index(self.row, self.col);
        self.lines[self.row].insert(idx, c);
        self.col += 1;
        self.dirty = true;
    }

    pub fn insert_newline(&mut self) {
        let idx = self.byte_index(self.row, self.col);
        let rest = self.lines[self.row].split_off(idx);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
        self.dirty = true;
    }

    pub fn backspace(&mut self) {
        if self.col > 0 {
            let idx = self.byte_index(self.row, self.col - 1);
            self.lines[self.row].remove(idx);
            self.col -= 1;
            self.dirty = true;
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&line);
            self.dirty = true;
        }
    }

    pub fn delete(&mut self) {
        if self.col < self.line_len(self.row) {
            let idx = self.byte_index(self.row, self.col);
            self.lines[self.row].remove(idx);
            self.dirty = true;
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
            self.dirty = true;
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self, by: usize) {
        self.row = self.row.saturating_sub(by);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn move_down(&mut self, by: usize) {
        self.row = (self.row + by).min(self.lines.len() - 1);
        self.col = self.col.min(self.line_len(self.row));
    }

    /// Keep the cursor row inside a viewport of `height` lines.
    pub fn scroll_to_cursor(&mut self, height: usize) {
        if height == 0 {
            return;
        }
        if self.row < self.scroll {
            self.scroll = self.row;
        } else if self.row >= self.scroll + height {
            self.scroll = self.row + 1 - height;
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> EditorCommand {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let close = key.code == KeyCode::Esc || (ctrl && key.code == KeyCode::Char('q'));
        if close {
            if !self.dirty || self.confirm_discard {
                return EditorCommand::Close;
            }
            self.confirm_discard = true;
            return EditorCommand::None;
        }
        self.confirm_discard = false;
        match key.code {
            KeyCode::Char('s') if ctrl => return EditorCommand::Save,
            KeyCode::Char(c) if !ctrl => self.insert_char(c),
            KeyCode::Tab => {
                for _ in 0..4 {
                    self.insert_char(' ');
                }
            }
            KeyCode::Enter => self.insert_newline(),
            KeyCode::Backspace => self.backspace(),
            KeyCode::Delete => self.delete(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Up => self.move_up(1),
            KeyCode::Down => self.move_down(1),
            KeyCode::PageUp => self.move_up(20),
            KeyCode::PageDown => self.move_down(20),
            KeyCode::Home => self.col = 0,
            KeyCode::End => self.col = self.line_len(self.row),
            _ => {}
        }
        EditorCommand::None
    }
}
