//! Keystroke Decoding Module
//!
//! Classifies raw bytes read from a terminal in raw mode into logical key
//! events for the line editor.
//!
//! # Single bytes
//!
//! | Byte | Event |
//! |------|-------|
//! | `0x0D` (CR) | [`KeyEvent::Enter`] |
//! | `0x03` (Ctrl+C), `0x04` (Ctrl+D) | [`KeyEvent::Cancel`] |
//! | `0x08` (BS), `0x7F` (DEL) | [`KeyEvent::Backspace`] |
//! | `0x1B` (ESC) with nothing after it in the same read | [`KeyEvent::Cancel`] |
//! | other C0 controls | [`KeyEvent::Ignored`] |
//!
//! # Escape sequences
//!
//! Cursor keys arrive as `ESC [ <final>` (normal cursor mode) or
//! `ESC O <final>` (application cursor mode), where the final byte is
//! `A` up, `B` down, `C` right, `D` left. The terminal writes each sequence
//! in one burst, so it normally shows up inside a single read. When a read
//! ends partway through a key anyway, [`incomplete_suffix`] reports the cut
//! and [`continues_sequence`] tells the caller whether the next read
//! finishes it.

/// End of text (Ctrl+C)
const ETX: u8 = 0x03;
/// End of transmission (Ctrl+D)
const EOT: u8 = 0x04;
/// Backspace (Ctrl+H)
const BS: u8 = 0x08;
/// Carriage return (Enter in raw mode)
const CR: u8 = 0x0D;
/// Escape
const ESC: u8 = 0x1B;
/// Delete (what most terminals send for the Backspace key)
const DEL: u8 = 0x7F;

/// A logical key event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEvent {
    /// A character to insert
    Printable(char),
    /// Accept the line
    Enter,
    /// Delete the character before the cursor
    Backspace,
    /// Abort the edit (Ctrl+C, Ctrl+D, lone Escape)
    Cancel,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// An escape sequence we do not handle
    ArrowUnknown,
    /// A control byte with no editing meaning
    Ignored,
}

impl KeyEvent {
    /// Whether this event ends the edit session
    pub fn is_cancel(self) -> bool {
        self == KeyEvent::Cancel
    }

    /// Whether this is one of the cursor keys (including unknown sequences)
    pub fn is_arrow(self) -> bool {
        matches!(
            self,
            KeyEvent::ArrowUp
                | KeyEvent::ArrowDown
                | KeyEvent::ArrowLeft
                | KeyEvent::ArrowRight
                | KeyEvent::ArrowUnknown
        )
    }
}

/// Stateless decoder from raw reads to key events
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyDecoder;

impl KeyDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode one read into the key events it contains.
    ///
    /// A read usually holds a single key, but fast typing and pastes can
    /// deliver several at once; they are returned in order.
    pub fn decode(&self, data: &[u8]) -> Vec<KeyEvent> {
        let mut events = Vec::with_capacity(data.len());
        let mut rest = data;

        while !rest.is_empty() {
            let (event, used) = decode_one(rest);
            events.push(event);
            rest = &rest[used..];
        }

        events
    }

    /// Decode a read that is expected to be a single key.
    ///
    /// Returns the first event and ignores the rest.
    pub fn decode_single(&self, data: &[u8]) -> Option<KeyEvent> {
        if data.is_empty() {
            None
        } else {
            Some(decode_one(data).0)
        }
    }
}

/// Decode the key at the start of `data`, returning it and its byte length
fn decode_one(data: &[u8]) -> (KeyEvent, usize) {
    match data[0] {
        CR => (KeyEvent::Enter, 1),
        ETX | EOT => (KeyEvent::Cancel, 1),
        BS | DEL => (KeyEvent::Backspace, 1),
        ESC => decode_escape(data),
        0x00..=0x1F => (KeyEvent::Ignored, 1),
        0x20..=0x7E => (KeyEvent::Printable(data[0] as char), 1),
        _ => decode_utf8(data),
    }
}

/// Decode an escape sequence starting at `data[0] == ESC`
fn decode_escape(data: &[u8]) -> (KeyEvent, usize) {
    match data.get(1) {
        // Nothing follows in this read: Escape pressed on its own
        None => (KeyEvent::Cancel, 1),
        Some(b'[') | Some(b'O') => decode_cursor_sequence(data),
        // Alt+key and other two-byte escapes
        Some(_) => (KeyEvent::ArrowUnknown, 2),
    }
}

/// Decode `ESC [ params final` / `ESC O final`
fn decode_cursor_sequence(data: &[u8]) -> (KeyEvent, usize) {
    let mut i = 2;
    let mut has_params = false;

    // Parameter and intermediate bytes (e.g. the "1;5" in ESC [ 1 ; 5 C)
    while let Some(&b) = data.get(i) {
        if (0x20..=0x3F).contains(&b) {
            has_params = true;
            i += 1;
        } else {
            break;
        }
    }

    match data.get(i) {
        Some(&final_byte) if (0x40..=0x7E).contains(&final_byte) => {
            let event = if has_params {
                KeyEvent::ArrowUnknown
            } else {
                match final_byte {
                    b'A' => KeyEvent::ArrowUp,
                    b'B' => KeyEvent::ArrowDown,
                    b'C' => KeyEvent::ArrowRight,
                    b'D' => KeyEvent::ArrowLeft,
                    _ => KeyEvent::ArrowUnknown,
                }
            };
            (event, i + 1)
        }
        // Truncated or malformed: swallow what we saw
        _ => (KeyEvent::ArrowUnknown, i),
    }
}

/// Decode a UTF-8 encoded character
fn decode_utf8(data: &[u8]) -> (KeyEvent, usize) {
    let len = match data[0] {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return (KeyEvent::Ignored, 1),
    };

    let Some(bytes) = data.get(..len) else {
        // Truncated: swallow the lead byte and the continuation bytes after it
        let used = 1 + data[1..].iter().take_while(|&&b| is_continuation(b)).count();
        return (KeyEvent::Ignored, used);
    };

    match std::str::from_utf8(bytes).ok().and_then(|s| s.chars().next()) {
        Some(c) if !c.is_control() => (KeyEvent::Printable(c), len),
        Some(_) => (KeyEvent::Ignored, len),
        None => (KeyEvent::Ignored, 1),
    }
}

fn is_continuation(b: u8) -> bool {
    (0x80..=0xBF).contains(&b)
}

/// Whether `key` (the bytes of one decoded key) stops short of a full key
fn is_truncated(key: &[u8]) -> bool {
    match key {
        [ESC] => true,
        [ESC, b'[' | b'O', params @ ..] => params.iter().all(|b| (0x20..=0x3F).contains(b)),
        [lead @ 0xC2..=0xF4, rest @ ..] => {
            let len = match *lead {
                0xC2..=0xDF => 2,
                0xE0..=0xEF => 3,
                _ => 4,
            };
            rest.len() + 1 < len && rest.iter().all(|&b| is_continuation(b))
        }
        _ => false,
    }
}

/// Length of the key cut off at the end of `data`, or 0 when the read ends
/// on a key boundary.
///
/// A cut-off key is a lone ESC, an `ESC [` or `ESC O` sequence without its
/// final byte, or a UTF-8 character missing continuation bytes.
pub fn incomplete_suffix(data: &[u8]) -> usize {
    let mut start = 0;
    while start < data.len() {
        let (_, used) = decode_one(&data[start..]);
        if start + used == data.len() {
            let last = &data[start..];
            return if is_truncated(last) { last.len() } else { 0 };
        }
        start += used;
    }
    0
}

/// Whether `next` carries on the cut-off key `tail` returned by
/// [`incomplete_suffix`]
pub fn continues_sequence(tail: &[u8], next: &[u8]) -> bool {
    let Some(&first) = next.first() else {
        return false;
    };
    match tail {
        [ESC] => first == b'[' || first == b'O',
        [ESC, ..] => (0x20..=0x7E).contains(&first),
        _ => is_continuation(first),
    }
}
