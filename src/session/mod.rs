//! Edit Session Module
//!
//! Drives one prompt from first draw to a typed value or a cancellation.
//!
//! ```text
//! Idle --start--> Editing --Enter--> Validating --accepted--> Converting --ok--> Done
//!                   ^  |                 |                        |
//!                   |  |                 +------rejected----------+--error--+
//!                   |  +--Cancel--> Cancelled                               |
//!                   +-------------- failure message, redraw ----------------+
//! ```
//!
//! [`EditSession`] holds the state machine and can be fed keys directly.
//! [`EditSession::run`] adds the input loop on top of a [`RawChannel`].

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crate::app::EditorConfig;
use crate::core::LineBuffer;
use crate::error::{Error, Result};
use crate::grammar::{Grammar, ValidationOutcome};
use crate::input::{continues_sequence, incomplete_suffix, KeyDecoder, KeyEvent};
use crate::raw::{open_channel, RawChannel};
use crate::renderer::{Content, Renderer};

/// Where a session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Created, nothing drawn yet
    Idle,
    /// Accepting keys
    Editing,
    /// Checking the line against the grammar
    Validating,
    /// Turning accepted text into a value
    Converting,
    /// A value was produced
    Done,
    /// The user cancelled
    Cancelled,
}

impl SessionState {
    /// Whether the session has produced its outcome
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Done | SessionState::Cancelled)
    }
}

/// Result of an edit: a value, or the marker for a cancelled edit
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Value(T),
    Cancelled,
}

impl<T> Outcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Outcome::Cancelled)
    }

    /// The value, or `None` if the edit was cancelled
    pub fn value(self) -> Option<T> {
        match self {
            Outcome::Value(v) => Some(v),
            Outcome::Cancelled => None,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Outcome<U> {
        match self {
            Outcome::Value(v) => Outcome::Value(f(v)),
            Outcome::Cancelled => Outcome::Cancelled,
        }
    }
}

/// Restores the channel when dropped, whichever way `run` is left
struct ChannelGuard<'a, C: RawChannel + ?Sized> {
    channel: &'a mut C,
}

impl<C: RawChannel + ?Sized> Drop for ChannelGuard<'_, C> {
    fn drop(&mut self) {
        self.channel.exit();
    }
}

/// One interactive edit of one line
pub struct EditSession<G: Grammar, W: Write> {
    prompt: String,
    grammar: G,
    mask: Option<char>,
    buffer: LineBuffer,
    renderer: Renderer<W>,
    decoder: KeyDecoder,
    state: SessionState,
    failure_message: String,
    escape_timeout: Duration,
    idle_wait: Duration,
    failures: usize,
}

impl<G: Grammar, W: Write> EditSession<G, W> {
    /// Create a session.
    ///
    /// The echo mask is `mask` if given, else the grammar's mask, else the
    /// configured default.
    pub fn new(
        prompt: impl Into<String>,
        grammar: G,
        mask: Option<char>,
        renderer: Renderer<W>,
        config: &EditorConfig,
    ) -> Self {
        let mask = mask.or_else(|| grammar.mask()).or(config.mask);
        Self {
            prompt: prompt.into(),
            grammar,
            mask,
            buffer: LineBuffer::new(),
            renderer,
            decoder: KeyDecoder::new(),
            state: SessionState::Idle,
            failure_message: config.failure_message.clone(),
            escape_timeout: Duration::from_millis(config.escape_timeout_ms),
            idle_wait: Duration::from_millis(config.idle_wait_ms),
            failures: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The text typed so far
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    pub fn cursor(&self) -> usize {
        self.buffer.cursor()
    }

    /// The mask in effect for this session
    pub fn mask(&self) -> Option<char> {
        self.mask
    }

    /// Number of rejected or unconvertible submissions
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn renderer(&self) -> &Renderer<W> {
        &self.renderer
    }

    pub fn into_renderer(self) -> Renderer<W> {
        self.renderer
    }

    /// Draw the prompt and start accepting keys
    pub fn start(&mut self) -> io::Result<()> {
        if self.state != SessionState::Idle {
            return Ok(());
        }
        tracing::debug!(masked = self.mask.is_some(), "edit session started");
        self.state = SessionState::Editing;
        self.redraw()
    }

    /// Apply one key.
    ///
    /// Returns the outcome once the session ends; keys arriving after that
    /// are ignored.
    pub fn handle_key(&mut self, key: KeyEvent) -> io::Result<Option<Outcome<G::Output>>> {
        match self.state {
            SessionState::Idle => self.start()?,
            SessionState::Editing => {}
            _ => return Ok(None),
        }

        if self.mask.is_some() {
            tracing::trace!(len = self.buffer.len(), "key");
        } else {
            tracing::trace!(?key, "key");
        }

        match key {
            KeyEvent::Printable(c) => {
                self.buffer.insert(c);
                self.redraw()?;
            }
            KeyEvent::Backspace => {
                self.buffer.delete_before_cursor();
                self.redraw()?;
            }
            KeyEvent::ArrowLeft => {
                if self.buffer.move_left() {
                    self.redraw()?;
                }
            }
            KeyEvent::ArrowRight => {
                if self.buffer.move_right() {
                    self.redraw()?;
                }
            }
            KeyEvent::ArrowUp | KeyEvent::ArrowDown | KeyEvent::ArrowUnknown => {}
            KeyEvent::Ignored => self.redraw()?,
            KeyEvent::Cancel => {
                tracing::debug!(failures = self.failures, "edit cancelled");
                self.state = SessionState::Cancelled;
                self.renderer.finish()?;
                return Ok(Some(Outcome::Cancelled));
            }
            KeyEvent::Enter => return self.submit(),
        }

        Ok(None)
    }

    fn submit(&mut self) -> io::Result<Option<Outcome<G::Output>>> {
        self.state = SessionState::Validating;
        let text = self.buffer.text();

        let captures = match self.grammar.accept(&text) {
            ValidationOutcome::Accepted(captures) => captures,
            ValidationOutcome::Rejected => {
                tracing::debug!(len = self.buffer.len(), "input rejected");
                return self.fail();
            }
        };

        self.state = SessionState::Converting;
        match self.grammar.convert(&captures) {
            Ok(value) => {
                tracing::debug!(failures = self.failures, "input accepted");
                self.state = SessionState::Done;
                self.renderer.finish()?;
                Ok(Some(Outcome::Value(value)))
            }
            Err(e) => {
                if self.mask.is_some() {
                    tracing::debug!(len = self.buffer.len(), "conversion failed");
                } else {
                    tracing::debug!(error = %e, "conversion failed");
                }
                self.fail()
            }
        }
    }

    /// Report a failed submission and return to editing the same text
    fn fail(&mut self) -> io::Result<Option<Outcome<G::Output>>> {
        self.failures += 1;
        self.renderer.message(&self.failure_message)?;
        self.state = SessionState::Editing;
        self.redraw()?;
        Ok(None)
    }

    fn redraw(&mut self) -> io::Result<()> {
        let content = match self.mask {
            Some(mask) => Content::Masked {
                mask,
                len: self.buffer.len(),
            },
            None => Content::Plain(self.buffer.chars()),
        };
        self.renderer
            .draw(&self.prompt, content, self.buffer.cursor())
    }

    /// Run the session to completion on `channel`.
    ///
    /// Raw mode is entered before anything is drawn, so a setup failure
    /// leaves the output untouched. The channel is restored on every way out
    /// of this function.
    pub fn run<C: RawChannel + ?Sized>(&mut self, channel: &mut C) -> Result<Outcome<G::Output>> {
        if self.state.is_terminal() {
            return Err(Error::Finished);
        }

        channel.enter()?;
        let mut guard = ChannelGuard { channel };
        self.start()?;

        let mut carry: Option<Vec<u8>> = None;
        loop {
            let read = match carry.take() {
                Some(read) => read,
                None => match guard.channel.poll()? {
                    Some(read) => read,
                    None => {
                        guard.channel.wait(self.idle_wait)?;
                        continue;
                    }
                },
            };

            let read = if incomplete_suffix(&read) > 0 {
                self.complete_key(&mut *guard.channel, read, &mut carry)?
            } else {
                read
            };

            for key in self.decoder.decode(&read) {
                if let Some(outcome) = self.handle_key(key)? {
                    return Ok(outcome);
                }
            }
        }
    }

    /// A read that ends partway through a key (a lone ESC, a cursor
    /// sequence without its final byte, half a UTF-8 character) may be
    /// finished by the next read. Wait briefly for it; a read that does not
    /// continue the key is kept for the next iteration.
    fn complete_key<C: RawChannel + ?Sized>(
        &self,
        channel: &mut C,
        mut read: Vec<u8>,
        carry: &mut Option<Vec<u8>>,
    ) -> io::Result<Vec<u8>> {
        let deadline = Instant::now() + self.escape_timeout;
        loop {
            let cut = incomplete_suffix(&read);
            if cut == 0 {
                return Ok(read);
            }

            if let Some(next) = channel.poll()? {
                if continues_sequence(&read[read.len() - cut..], &next) {
                    read.extend_from_slice(&next);
                    continue;
                }
                *carry = Some(next);
                return Ok(read);
            }

            let now = Instant::now();
            if now >= deadline {
                return Ok(read);
            }
            channel.wait(deadline - now)?;
        }
    }
}

/// Prompts for typed values on one output stream
#[derive(Debug)]
pub struct LineEditor<W: Write> {
    config: EditorConfig,
    out: W,
}

impl LineEditor<io::Stdout> {
    /// Editor writing to standard output
    pub fn stdout(config: EditorConfig) -> Self {
        Self::new(config, io::stdout())
    }
}

impl<W: Write> LineEditor<W> {
    pub fn new(config: EditorConfig, out: W) -> Self {
        Self { config, out }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Prompt on the terminal until the line converts or the user cancels.
    ///
    /// `mask` overrides the echo mask for this call only.
    pub fn edit_line<G: Grammar>(
        &mut self,
        prompt: &str,
        grammar: &G,
        mask: Option<char>,
    ) -> Result<Outcome<G::Output>> {
        let mut channel = open_channel(&self.config)?;
        self.edit_line_with(&mut channel, prompt, grammar, mask)
    }

    /// Like [`edit_line`](Self::edit_line), reading keys from `channel`
    pub fn edit_line_with<C, G>(
        &mut self,
        channel: &mut C,
        prompt: &str,
        grammar: &G,
        mask: Option<char>,
    ) -> Result<Outcome<G::Output>>
    where
        C: RawChannel + ?Sized,
        G: Grammar,
    {
        let renderer = Renderer::new(&mut self.out);
        let mut session = EditSession::new(prompt, grammar, mask, renderer, &self.config);
        session.run(channel)
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
