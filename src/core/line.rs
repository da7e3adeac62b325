//! Editable line buffer
//!
//! A sequence of characters plus a cursor index. The cursor sits between
//! characters: `0` is before the first one, `len()` is after the last.
//! Every operation leaves `0 <= cursor <= len()`.

/// The text being edited and the logical cursor position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineBuffer {
    chars: Vec<char>,
    cursor: usize,
}

impl LineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer holding `text`, cursor at the end
    pub fn from_text(text: &str) -> Self {
        let chars: Vec<char> = text.chars().collect();
        let cursor = chars.len();
        Self { chars, cursor }
    }

    /// Insert `c` at the cursor and advance past it.
    ///
    /// Control characters are rejected; returns whether the buffer changed.
    pub fn insert(&mut self, c: char) -> bool {
        if c.is_control() {
            return false;
        }
        self.chars.insert(self.cursor, c);
        self.cursor += 1;
        true
    }

    /// Remove the character immediately left of the cursor.
    ///
    /// No-op at the start of the line; returns whether the buffer changed.
    pub fn delete_before_cursor(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        self.chars.remove(self.cursor);
        true
    }

    /// Move the cursor one character left, clamped at 0
    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Move the cursor one character right, clamped at the end
    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.chars.len() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Remove all text
    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    /// The characters in the buffer
    pub fn chars(&self) -> &[char] {
        &self.chars
    }

    /// The buffer contents as a string
    pub fn text(&self) -> String {
        self.chars.iter().collect()
    }

    /// Cursor position in characters
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Number of characters
    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Characters between the cursor and the end of the line
    pub fn tail_len(&self) -> usize {
        self.chars.len() - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_appends_and_advances() {
        let mut buf = LineBuffer::new();
        assert!(buf.insert('a'));
        assert!(buf.insert('b'));
        assert_eq!(buf.text(), "ab");
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn test_insert_mid_line() {
        let mut buf = LineBuffer::from_text("ac");
        buf.move_left();
        buf.insert('b');
        assert_eq!(buf.text(), "abc");
        assert_eq!(buf.cursor(), 2);
    }

    #[test]
    fn test_insert_rejects_controls() {
        let mut buf = LineBuffer::from_text("x");
        assert!(!buf.insert('\t'));
        assert!(!buf.insert('\u{7f}'));
        assert_eq!(buf.text(), "x");
        assert_eq!(buf.cursor(), 1);
    }

    #[test]
    fn test_delete_targets_cell_left_of_cursor() {
        let mut buf = LineBuffer::from_text("abc");
        buf.move_left();
        assert_eq!(buf.cursor(), 2);

        assert!(buf.delete_before_cursor());
        assert_eq!(buf.text(), "ac");
        assert_eq!(buf.cursor(), 1);
    }

    #[test]
    fn test_delete_at_start_is_noop() {
        let mut buf = LineBuffer::from_text("ab");
        buf.move_left();
        buf.move_left();
        assert!(!buf.delete_before_cursor());
        assert_eq!(buf.text(), "ab");
        assert_eq!(buf.cursor(), 0);
    }

    #[test]
    fn test_delete_on_empty() {
        let mut buf = LineBuffer::new();
        assert!(!buf.delete_before_cursor());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_move_left_clamps() {
        let mut buf = LineBuffer::from_text("ab");
        assert!(buf.move_left());
        assert!(buf.move_left());
        assert!(!buf.move_left());
        assert_eq!(buf.cursor(), 0);
        assert_eq!(buf.text(), "ab");
    }

    #[test]
    fn test_move_right_clamps() {
        let mut buf = LineBuffer::from_text("ab");
        assert!(!buf.move_right());
        assert_eq!(buf.cursor(), 2);
        buf.move_left();
        assert!(buf.move_right());
        assert!(!buf.move_right());
    }

    #[test]
    fn test_tail_len() {
        let mut buf = LineBuffer::from_text("hello");
        assert_eq!(buf.tail_len(), 0);
        buf.move_left();
        buf.move_left();
        assert_eq!(buf.tail_len(), 2);
    }

    #[test]
    fn test_clear() {
        let mut buf = LineBuffer::from_text("hello");
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.cursor(), 0);
    }
}
