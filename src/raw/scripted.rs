//! Scripted channel
//!
//! Replays a fixed sequence of reads without touching any terminal. Used to
//! drive edit sessions headlessly (tests, automation).

use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use super::{RawChannel, SetupError};

/// End-of-transmission, reported once the script runs dry
const EOT: u8 = 0x04;

/// In-memory keystroke channel
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    reads: VecDeque<Vec<u8>>,
    raw: bool,
    enters: usize,
    exits: usize,
    refuse_enter: bool,
}

impl ScriptedChannel {
    /// Create an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a script from a list of reads
    pub fn from_reads<I, B>(reads: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Vec<u8>>,
    {
        Self {
            reads: reads.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Append one read unit (e.g. a whole escape sequence)
    pub fn read(mut self, bytes: impl Into<Vec<u8>>) -> Self {
        self.reads.push_back(bytes.into());
        self
    }

    /// Append every char of `text` as its own read, as if typed
    pub fn typed(mut self, text: &str) -> Self {
        for c in text.chars() {
            let mut buf = [0u8; 4];
            self.reads.push_back(c.encode_utf8(&mut buf).as_bytes().to_vec());
        }
        self
    }

    /// Make [`RawChannel::enter`] fail as if there were no terminal
    pub fn refusing_enter(mut self) -> Self {
        self.refuse_enter = true;
        self
    }

    /// Whether raw mode is currently "active"
    pub fn is_raw(&self) -> bool {
        self.raw
    }

    /// Number of successful raw mode entries
    pub fn enter_count(&self) -> usize {
        self.enters
    }

    /// Number of times raw mode was actually restored
    pub fn exit_count(&self) -> usize {
        self.exits
    }

    /// Reads not yet consumed
    pub fn remaining(&self) -> usize {
        self.reads.len()
    }
}

impl RawChannel for ScriptedChannel {
    fn enter(&mut self) -> Result<(), SetupError> {
        if self.refuse_enter {
            return Err(SetupError::NotATerminal(io::Error::new(
                io::ErrorKind::NotFound,
                "scripted channel has no terminal",
            )));
        }
        if !self.raw {
            self.raw = true;
            self.enters += 1;
        }
        Ok(())
    }

    /// Yields the next scripted read; once exhausted, reports end of input
    /// (EOT) on every call, the way a hung-up terminal does.
    fn poll(&mut self) -> io::Result<Option<Vec<u8>>> {
        Ok(Some(self.reads.pop_front().unwrap_or_else(|| vec![EOT])))
    }

    fn wait(&mut self, _timeout: Duration) -> io::Result<bool> {
        Ok(true)
    }

    fn exit(&mut self) {
        if self.raw {
            self.raw = false;
            self.exits += 1;
        }
    }
}
