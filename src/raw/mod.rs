//! Raw keystroke channels
//!
//! This module puts the controlling terminal into raw mode and hands out
//! keystrokes one read at a time without blocking the caller.
//!
//! Two backends are provided:
//!
//! - [`PollChannel`] (unix): `poll(2)` readiness check followed by a
//!   non-blocking `read(2)` on the tty.
//! - [`ThreadedChannel`]: a background thread performs blocking reads and
//!   pushes each read into a bounded queue that the caller drains.
//!
//! [`ScriptedChannel`] replays a fixed list of reads for headless use.

mod mode;
mod scripted;
mod threaded;
#[cfg(unix)]
mod unix;

use std::io;
use std::time::Duration;

pub use mode::{PassthroughMode, RawModeLock, TerminalMode};
#[cfg(unix)]
pub use mode::TermiosMode;
#[cfg(not(unix))]
pub use mode::ConsoleMode;
pub use scripted::ScriptedChannel;
pub use threaded::{InputSource, ThreadedChannel, DEFAULT_QUEUE_CAPACITY};
#[cfg(unix)]
pub use unix::PollChannel;

use crate::app::{Backend, EditorConfig};

/// Error raised when the terminal cannot be put into raw mode.
///
/// Always surfaced before any prompt is drawn.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("No controlling terminal: {0}")]
    NotATerminal(#[source] io::Error),

    #[cfg(unix)]
    #[error("Failed to change terminal attributes: {0}")]
    Termios(#[source] nix::Error),

    #[cfg(unix)]
    #[error("Failed to set non-blocking mode: {0}")]
    NonBlocking(#[source] nix::Error),

    #[cfg(not(unix))]
    #[error("Failed to change console mode: {0}")]
    Console(#[source] io::Error),

    #[error("Raw mode is already held by another edit session")]
    Busy,

    #[error("Failed to start input reader thread: {0}")]
    Thread(#[source] io::Error),
}

/// A source of raw keystrokes.
///
/// Each successful [`poll`](RawChannel::poll) yields exactly one OS-level
/// read, so escape sequences that the terminal writes in one burst arrive
/// as one unit.
pub trait RawChannel {
    /// Enter raw mode. Fails if the terminal cannot be configured.
    fn enter(&mut self) -> Result<(), SetupError>;

    /// Return the next read if one is ready. Never blocks.
    fn poll(&mut self) -> io::Result<Option<Vec<u8>>>;

    /// Park until input is likely ready or `timeout` elapses.
    ///
    /// Returns `true` when a subsequent [`poll`](RawChannel::poll) should
    /// produce data.
    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        std::thread::sleep(timeout);
        Ok(false)
    }

    /// Restore the terminal mode saved by [`enter`](RawChannel::enter).
    ///
    /// Safe to call more than once; only the first call after `enter` has
    /// any effect.
    fn exit(&mut self);
}

impl<C: RawChannel + ?Sized> RawChannel for Box<C> {
    fn enter(&mut self) -> Result<(), SetupError> {
        (**self).enter()
    }

    fn poll(&mut self) -> io::Result<Option<Vec<u8>>> {
        (**self).poll()
    }

    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        (**self).wait(timeout)
    }

    fn exit(&mut self) {
        (**self).exit()
    }
}

/// Open the keystroke channel selected by `config`.
///
/// [`Backend::Auto`] uses [`PollChannel`] when the tty supports readiness
/// polling and falls back to [`ThreadedChannel`] otherwise. On platforms
/// without termios the threaded backend is the only option.
pub fn open_channel(config: &EditorConfig) -> Result<Box<dyn RawChannel>, SetupError> {
    #[cfg(unix)]
    {
        let tty = unix::open_tty()?;
        let use_poll = match config.backend {
            Backend::Poll => true,
            Backend::Threaded => false,
            Backend::Auto => unix::supports_poll(&tty),
        };

        if use_poll {
            tracing::debug!("using poll backend");
            return Ok(Box::new(PollChannel::new(tty)?));
        }

        tracing::debug!(capacity = config.queue_capacity, "using threaded backend");
        let mode = TermiosMode::new(tty.try_clone().map_err(SetupError::NotATerminal)?);
        Ok(Box::new(ThreadedChannel::new(
            tty,
            mode,
            config.queue_capacity,
        )))
    }

    #[cfg(not(unix))]
    {
        if matches!(config.backend, Backend::Poll) {
            tracing::warn!("poll backend unavailable on this platform, using threaded backend");
        }
        tracing::debug!(capacity = config.queue_capacity, "using threaded backend");
        Ok(Box::new(ThreadedChannel::new(
            io::stdin(),
            ConsoleMode::new(),
            config.queue_capacity,
        )))
    }
}
