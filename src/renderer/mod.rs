//! In-place line renderer
//!
//! Redraws "prompt + content" on the current terminal row without moving
//! to a new line:
//!
//! 1. `CR`, then spaces over everything drawn last time, then `CR`
//! 2. prompt and content
//! 3. `CSI n D` to walk the terminal cursor back to the logical cursor
//!    when it is not at the end of the line
//!
//! Output goes to any [`Write`], so tests can capture it in a `Vec<u8>`.

use std::io::{self, Write};

use unicode_width::UnicodeWidthStr;

/// What to show after the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Content<'a> {
    /// The real text
    Plain(&'a [char]),
    /// `len` copies of `mask`; the real text never reaches the renderer
    Masked { mask: char, len: usize },
}

impl Content<'_> {
    /// Number of cells the content occupies
    pub fn len(&self) -> usize {
        match self {
            Content::Plain(chars) => chars.len(),
            Content::Masked { len, .. } => *len,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut buf = [0u8; 4];
        match *self {
            Content::Plain(chars) => {
                for c in chars {
                    out.write_all(c.encode_utf8(&mut buf).as_bytes())?;
                }
            }
            Content::Masked { mask, len } => {
                let mask = mask.encode_utf8(&mut buf);
                for _ in 0..len {
                    out.write_all(mask.as_bytes())?;
                }
            }
        }
        Ok(())
    }
}

/// Redraws one editable line on a character terminal
#[derive(Debug)]
pub struct Renderer<W: Write> {
    out: W,
    /// Columns covered by the previous draw on the current row
    drawn: usize,
}

impl<W: Write> Renderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, drawn: 0 }
    }

    /// Redraw the line with the terminal cursor at `cursor` characters into
    /// the content.
    pub fn draw(&mut self, prompt: &str, content: Content<'_>, cursor: usize) -> io::Result<()> {
        self.clear_line()?;

        self.out.write_all(prompt.as_bytes())?;
        content.write_to(&mut self.out)?;

        let back = content.len().saturating_sub(cursor);
        if back > 0 {
            write!(self.out, "\x1b[{}D", back)?;
        }

        self.drawn = prompt.width() + content.len();
        self.out.flush()
    }

    /// Blank the previously drawn extent and return to column 0
    pub fn clear_line(&mut self) -> io::Result<()> {
        self.out.write_all(b"\r")?;
        if self.drawn > 0 {
            self.out.write_all(" ".repeat(self.drawn).as_bytes())?;
            self.out.write_all(b"\r")?;
        }
        Ok(())
    }

    /// Print a message on its own line and start a fresh row below it
    pub fn message(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "\r\n{}\r\n", text)?;
        self.drawn = 0;
        self.out.flush()
    }

    /// End the edited line
    pub fn finish(&mut self) -> io::Result<()> {
        self.out.write_all(b"\r\n")?;
        self.drawn = 0;
        self.out.flush()
    }

    /// Columns covered by the last draw
    pub fn drawn_width(&self) -> usize {
        self.drawn
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    fn output(renderer: &Renderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.get_ref().clone()).unwrap()
    }

    #[test]
    fn test_first_draw() {
        let mut r = Renderer::new(Vec::new());
        let text = chars("12");
        r.draw("> ", Content::Plain(&text), 2).unwrap();
        assert_eq!(output(&r), "\r> 12");
        assert_eq!(r.drawn_width(), 4);
    }

    #[test]
    fn test_redraw_clears_previous_extent() {
        let mut r = Renderer::new(Vec::new());
        let text = chars("abc");
        r.draw("> ", Content::Plain(&text), 3).unwrap();
        let shorter = chars("ab");
        r.draw("> ", Content::Plain(&shorter), 2).unwrap();
        assert_eq!(output(&r), "\r> abc\r     \r> ab");
    }

    #[test]
    fn test_cursor_repositioned_left() {
        let mut r = Renderer::new(Vec::new());
        let text = chars("hello");
        r.draw("", Content::Plain(&text), 2).unwrap();
        assert!(output(&r).ends_with("hello\x1b[3D"));
    }

    #[test]
    fn test_no_reposition_at_end() {
        let mut r = Renderer::new(Vec::new());
        let text = chars("hi");
        r.draw("", Content::Plain(&text), 2).unwrap();
        assert!(!output(&r).contains('\x1b'));
    }

    #[test]
    fn test_masked_content() {
        let mut r = Renderer::new(Vec::new());
        r.draw("Password: ", Content::Masked { mask: '*', len: 3 }, 1)
            .unwrap();
        assert_eq!(output(&r), "\rPassword: ***\x1b[2D");
    }

    #[test]
    fn test_message_resets_extent() {
        let mut r = Renderer::new(Vec::new());
        let text = chars("x");
        r.draw("> ", Content::Plain(&text), 1).unwrap();
        r.message("Invalid input, try again.").unwrap();
        assert_eq!(r.drawn_width(), 0);

        r.draw("> ", Content::Plain(&text), 1).unwrap();
        assert_eq!(output(&r), "\r> x\r\nInvalid input, try again.\r\n\r> x");
    }

    #[test]
    fn test_finish_ends_line() {
        let mut r = Renderer::new(Vec::new());
        r.finish().unwrap();
        assert_eq!(r.into_inner(), b"\r\n");
    }

    #[test]
    fn test_wide_prompt_extent() {
        let mut r = Renderer::new(Vec::new());
        r.draw("日付: ", Content::Plain(&[]), 0).unwrap();
        assert_eq!(r.drawn_width(), 6);
    }

    #[test]
    fn test_content_len() {
        assert_eq!(Content::Masked { mask: '#', len: 4 }.len(), 4);
        assert!(Content::Plain(&[]).is_empty());
    }
}
