//! Terminal mode switching
//!
//! Raw mode is a process-wide resource: only one holder may have the
//! terminal configured at a time. [`RawModeLock`] enforces that, and each
//! [`TerminalMode`] takes the lock for as long as raw mode is active.

use std::sync::atomic::{AtomicBool, Ordering};

use super::SetupError;

/// Set while some mode implementation has the terminal in raw mode
static RAW_MODE_HELD: AtomicBool = AtomicBool::new(false);

/// Exclusive claim on the terminal's raw mode.
///
/// Released when dropped.
#[derive(Debug)]
pub struct RawModeLock {
    _private: (),
}

impl RawModeLock {
    /// Claim raw mode, failing with [`SetupError::Busy`] if already held
    pub fn acquire() -> Result<Self, SetupError> {
        RAW_MODE_HELD
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self { _private: () })
            .map_err(|_| SetupError::Busy)
    }

    /// Whether any lock is currently outstanding
    pub fn is_held() -> bool {
        RAW_MODE_HELD.load(Ordering::Acquire)
    }
}

impl Drop for RawModeLock {
    fn drop(&mut self) {
        RAW_MODE_HELD.store(false, Ordering::Release);
    }
}

/// A way of switching the input device in and out of raw mode
pub trait TerminalMode: Send {
    /// Switch to raw mode. Calling it while already raw is a no-op.
    fn enable(&mut self) -> Result<(), SetupError>;

    /// Put back whatever mode was active before [`enable`](TerminalMode::enable).
    /// No-op when not enabled.
    fn restore(&mut self);

    /// Whether raw mode is currently active
    fn is_enabled(&self) -> bool;
}

/// Mode that changes nothing, for sources that are not terminals (pipes,
/// test readers).
#[derive(Debug, Default)]
pub struct PassthroughMode {
    enabled: bool,
}

impl PassthroughMode {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TerminalMode for PassthroughMode {
    fn enable(&mut self) -> Result<(), SetupError> {
        self.enabled = true;
        Ok(())
    }

    fn restore(&mut self) {
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

#[cfg(unix)]
pub use termios_mode::TermiosMode;

#[cfg(unix)]
mod termios_mode {
    use std::fs::File;

    use nix::sys::termios::{self, SetArg, Termios};

    use super::{RawModeLock, SetupError, TerminalMode};

    /// termios-based raw mode on a tty file descriptor.
    ///
    /// Applies `cfmakeraw`: no canonical line buffering, no echo, no
    /// signal generation (Ctrl+C arrives as byte 3), no CR/NL translation.
    #[derive(Debug)]
    pub struct TermiosMode {
        tty: File,
        saved: Option<Termios>,
        lock: Option<RawModeLock>,
    }

    impl TermiosMode {
        pub fn new(tty: File) -> Self {
            Self {
                tty,
                saved: None,
                lock: None,
            }
        }
    }

    impl TerminalMode for TermiosMode {
        fn enable(&mut self) -> Result<(), SetupError> {
            if self.saved.is_some() {
                return Ok(());
            }

            let lock = RawModeLock::acquire()?;
            let original = termios::tcgetattr(&self.tty).map_err(SetupError::Termios)?;

            let mut raw = original.clone();
            termios::cfmakeraw(&mut raw);
            termios::tcsetattr(&self.tty, SetArg::TCSADRAIN, &raw)
                .map_err(SetupError::Termios)?;

            self.saved = Some(original);
            self.lock = Some(lock);
            Ok(())
        }

        fn restore(&mut self) {
            if let Some(original) = self.saved.take() {
                if let Err(e) = termios::tcsetattr(&self.tty, SetArg::TCSADRAIN, &original) {
                    tracing::warn!("Failed to restore terminal attributes: {}", e);
                }
                self.lock = None;
            }
        }

        fn is_enabled(&self) -> bool {
            self.saved.is_some()
        }
    }

    impl Drop for TermiosMode {
        fn drop(&mut self) {
            self.restore();
        }
    }
}

#[cfg(not(unix))]
pub use console_mode::ConsoleMode;

#[cfg(not(unix))]
mod console_mode {
    use super::{RawModeLock, SetupError, TerminalMode};

    /// Console raw mode via crossterm (`SetConsoleMode` on Windows)
    #[derive(Debug, Default)]
    pub struct ConsoleMode {
        lock: Option<RawModeLock>,
    }

    impl ConsoleMode {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl TerminalMode for ConsoleMode {
        fn enable(&mut self) -> Result<(), SetupError> {
            if self.lock.is_some() {
                return Ok(());
            }
            let lock = RawModeLock::acquire()?;
            crossterm::terminal::enable_raw_mode().map_err(SetupError::Console)?;
            self.lock = Some(lock);
            Ok(())
        }

        fn restore(&mut self) {
            if self.lock.take().is_some() {
                if let Err(e) = crossterm::terminal::disable_raw_mode() {
                    tracing::warn!("Failed to restore console mode: {}", e);
                }
            }
        }

        fn is_enabled(&self) -> bool {
            self.lock.is_some()
        }
    }

    impl Drop for ConsoleMode {
        fn drop(&mut self) {
            self.restore();
        }
    }
}
