//! UTF-8 safe text input state with cursor management.
//!
//! Backs both the single-line path inputs and the multi-line key text area.
//! Line-aware helpers (`cursor_line_col`, `move_up`, `move_down`) treat `\n`
//! as the only line separator.

use unicode_width::UnicodeWidthStr;

#[derive(Clone, Debug, Default)]
pub struct TextInputState {
    /// The underlying text buffer
    input: String,
    /// Cursor byte index into `input` (always on a UTF-8 boundary)
    cursor: usize,
}

impl TextInputState {
    pub fn new() -> Self {
        Self::default()
    }

    // ----- Getters -----
    pub fn input(&self) -> &str {
        &self.input
    }
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    // ----- Setters -----
    /// Replaces the buffer and moves the cursor to the end.
    pub fn set_input<S: Into<String>>(&mut self, s: S) {
        self.input = s.into();
        self.cursor = self.input.len();
    }

    pub fn set_cursor(&mut self, cursor: usize) {
        let mut cursor = cursor.min(self.input.len());
        while !self.input.is_char_boundary(cursor) {
            cursor -= 1;
        }
        self.cursor = cursor;
    }

    pub fn clear(&mut self) {
        self.input.clear();
        self.cursor = 0;
    }

    // ----- Editing primitives (UTF-8 safe) -----

    /// Move cursor one Unicode scalar to the left.
    pub fn move_left(&mut self) {
        if let Some(prev) = self.input[..self.cursor].chars().last() {
            self.cursor -= prev.len_utf8();
        }
    }

    /// Move cursor one Unicode scalar to the right.
    pub fn move_right(&mut self) {
        if let Some(next) = self.input[self.cursor..].chars().next() {
            self.cursor += next.len_utf8();
        }
    }

    /// Move to the start of the current line.
    pub fn move_home(&mut self) {
        self.cursor = self.line_start(self.cursor);
    }

    /// Move to the end of the current line.
    pub fn move_end(&mut self) {
        self.cursor = self.line_end(self.cursor);
    }

    /// Move to the previous line, keeping the display column where possible.
    pub fn move_up(&mut self) {
        let start = self.line_start(self.cursor);
        if start == 0 {
            return;
        }
        let column = self.input[start..self.cursor].width();
        let prev_start = self.line_start(start - 1);
        self.cursor = self.index_for_column_in_line(prev_start, column);
    }

    /// Move to the next line, keeping the display column where possible.
    pub fn move_down(&mut self) {
        let end = self.line_end(self.cursor);
        if end >= self.input.len() {
            return;
        }
        let column = self.input[self.line_start(self.cursor)..self.cursor].width();
        self.cursor = self.index_for_column_in_line(end + 1, column);
    }

    /// Insert a char at the cursor.
    pub fn insert_char(&mut self, c: char) {
        self.input.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Insert a string at the cursor (used for pasted text).
    pub fn insert_str(&mut self, text: &str) {
        self.input.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    /// Backspace the char immediately before the cursor.
    pub fn backspace(&mut self) {
        let Some(prev) = self.input[..self.cursor].chars().last() else {
            return;
        };
        let start = self.cursor - prev.len_utf8();
        self.input.drain(start..self.cursor);
        self.cursor = start;
    }

    /// Delete the char under the cursor.
    pub fn delete(&mut self) {
        if let Some(next) = self.input[self.cursor..].chars().next() {
            self.input.drain(self.cursor..self.cursor + next.len_utf8());
        }
    }

    // ----- Layout helpers -----

    /// Display width of the text before the cursor on a single-line input.
    pub fn cursor_columns(&self) -> usize {
        self.input[..self.cursor].width()
    }

    /// Zero-based `(line, display column)` of the cursor.
    pub fn cursor_line_col(&self) -> (usize, usize) {
        let before = &self.input[..self.cursor];
        let line = before.matches('\n').count();
        let column = before.rsplit('\n').next().unwrap_or_default().width();
        (line, column)
    }

    /// Maps a display column of a single-line input back to a byte index.
    pub fn cursor_index_for_column(&self, column: u16) -> usize {
        self.index_for_column_in_line(0, column as usize)
    }

    fn line_start(&self, index: usize) -> usize {
        self.input[..index].rfind('\n').map_or(0, |pos| pos + 1)
    }

    fn line_end(&self, index: usize) -> usize {
        self.input[index..].find('\n').map_or(self.input.len(), |pos| index + pos)
    }

    fn index_for_column_in_line(&self, line_start: usize, column: usize) -> usize {
        let line_end = self.line_end(line_start);
        let mut width = 0;
        for (offset, ch) in self.input[line_start..line_end].char_indices() {
            let ch_width = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
            if width + ch_width > column {
                return line_start + offset;
            }
            width += ch_width;
        }
        line_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_move_insert_backspace() {
        let mut st = TextInputState::new();
        st.set_input("h🙂llo");
        st.set_cursor(1);
        st.insert_char('e');
        assert_eq!(st.input(), "he🙂llo");
        st.move_right();
        st.backspace();
        assert_eq!(st.input(), "hello");
        st.move_left();
        st.backspace();
        assert_eq!(st.input(), "ello");
    }

    #[test]
    fn delete_removes_char_under_cursor() {
        let mut st = TextInputState::new();
        st.set_input("ab🙂c");
        st.set_cursor(2);
        st.delete();
        assert_eq!(st.input(), "abc");
        st.move_end();
        st.delete();
        assert_eq!(st.input(), "abc");
    }

    #[test]
    fn set_cursor_snaps_to_char_boundary() {
        let mut st = TextInputState::new();
        st.set_input("🙂x");
        st.set_cursor(2);
        assert_eq!(st.cursor(), 0);
    }

    #[test]
    fn insert_str_advances_cursor() {
        let mut st = TextInputState::new();
        st.set_input("ssh-ed25519 ");
        st.insert_str("AAAA\nnext");
        assert_eq!(st.input(), "ssh-ed25519 AAAA\nnext");
        assert_eq!(st.cursor_line_col(), (1, 4));
    }

    #[test]
    fn vertical_movement_keeps_column() {
        let mut st = TextInputState::new();
        st.set_input("-----BEGIN\nab\nlonger line");
        st.move_up();
        assert_eq!(st.cursor_line_col(), (1, 2));
        st.move_up();
        assert_eq!(st.cursor_line_col(), (0, 2));
        st.move_down();
        st.move_down();
        assert_eq!(st.cursor_line_col(), (2, 2));
        st.move_down();
        assert_eq!(st.cursor_line_col(), (2, 2));
    }

    #[test]
    fn home_and_end_stay_on_current_line() {
        let mut st = TextInputState::new();
        st.set_input("first\nsecond");
        st.move_home();
        assert_eq!(st.cursor_line_col(), (1, 0));
        st.move_left();
        st.move_home();
        assert_eq!(st.cursor(), 0);
        st.move_end();
        assert_eq!(st.cursor(), 5);
    }

    #[test]
    fn column_mapping_accounts_for_wide_chars() {
        let mut st = TextInputState::new();
        st.set_input("a🙂b");
        assert_eq!(st.cursor_columns(), 4);
        assert_eq!(st.cursor_index_for_column(1), 1);
        assert_eq!(st.cursor_index_for_column(3), 5);
        assert_eq!(st.cursor_index_for_column(40), st.input().len());
    }
}
