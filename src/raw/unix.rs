//! Unix poll backend
//!
//! Reads the controlling terminal directly: `poll(2)` tells us whether a
//! keystroke is waiting, and a non-blocking `read(2)` collects whatever the
//! terminal delivered in one burst.

use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use std::time::Duration;

use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};

use super::{InputSource, RawChannel, SetupError, TerminalMode, TermiosMode};

/// Bytes taken per read. An arrow key is 3 bytes; larger bursts are pastes.
const READ_CHUNK: usize = 64;

/// Open the controlling terminal for reading and writing.
///
/// `/dev/tty` is used rather than stdin so that redirected input does not
/// prevent interactive editing.
pub(super) fn open_tty() -> Result<File, SetupError> {
    File::options()
        .read(true)
        .write(true)
        .open("/dev/tty")
        .map_err(SetupError::NotATerminal)
}

/// Whether readiness polling works on this descriptor
pub(super) fn supports_poll(tty: &File) -> bool {
    let mut fds = [PollFd::new(tty.as_fd(), PollFlags::POLLIN)];
    match poll(&mut fds, PollTimeout::ZERO) {
        Ok(_) => !fds[0]
            .revents()
            .is_some_and(|r| r.contains(PollFlags::POLLNVAL)),
        Err(e) => {
            tracing::debug!("poll check failed: {}", e);
            false
        }
    }
}

/// Poll `fd` for readable input, waiting at most `timeout`. A hangup counts
/// as readable so that the next read reports it.
fn wait_fd(fd: BorrowedFd<'_>, timeout: Duration) -> io::Result<bool> {
    let timeout_ms: u16 = timeout.as_millis().try_into().unwrap_or(u16::MAX);
    let mut fds = [PollFd::new(fd, PollFlags::POLLIN)];
    match poll(&mut fds, PollTimeout::from(timeout_ms)) {
        Ok(n) => Ok(n > 0
            && fds[0]
                .revents()
                .is_some_and(|r| r.intersects(PollFlags::POLLIN | PollFlags::POLLHUP))),
        Err(nix::errno::Errno::EINTR) => Ok(false),
        Err(e) => Err(io::Error::other(e)),
    }
}

impl InputSource for File {
    fn supports_wait(&self) -> bool {
        true
    }

    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        wait_fd(self.as_fd(), timeout)
    }
}

impl InputSource for io::Stdin {
    fn supports_wait(&self) -> bool {
        true
    }

    fn wait_readable(&self, timeout: Duration) -> io::Result<bool> {
        wait_fd(self.as_fd(), timeout)
    }
}

/// Raw keystroke channel backed by `poll(2)` and non-blocking reads
#[derive(Debug)]
pub struct PollChannel {
    tty: File,
    mode: TermiosMode,
    /// Descriptor flags before we added `O_NONBLOCK`
    saved_flags: Option<OFlag>,
}

impl PollChannel {
    /// Wrap an open terminal device.
    ///
    /// Nothing is changed until [`RawChannel::enter`] is called.
    pub fn new(tty: File) -> Result<Self, SetupError> {
        let mode = TermiosMode::new(tty.try_clone().map_err(SetupError::NotATerminal)?);
        Ok(Self {
            tty,
            mode,
            saved_flags: None,
        })
    }

    /// Open the controlling terminal and wrap it
    pub fn open() -> Result<Self, SetupError> {
        open_tty().and_then(Self::new)
    }

    fn set_nonblocking(&mut self) -> Result<(), SetupError> {
        let fd = self.tty.as_raw_fd();
        let flags = fcntl(fd, FcntlArg::F_GETFL).map_err(SetupError::NonBlocking)?;
        let flags = OFlag::from_bits_truncate(flags);
        fcntl(fd, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))
            .map_err(SetupError::NonBlocking)?;
        self.saved_flags = Some(flags);
        Ok(())
    }

    fn restore_flags(&mut self) {
        if let Some(flags) = self.saved_flags.take() {
            if let Err(e) = fcntl(self.tty.as_raw_fd(), FcntlArg::F_SETFL(flags)) {
                tracing::warn!("Failed to restore descriptor flags: {}", e);
            }
        }
    }

    fn poll_readable(&self, timeout: Duration) -> io::Result<bool> {
        wait_fd(self.tty.as_fd(), timeout)
    }
}

impl RawChannel for PollChannel {
    fn enter(&mut self) -> Result<(), SetupError> {
        self.mode.enable()?;
        if let Err(e) = self.set_nonblocking() {
            self.mode.restore();
            return Err(e);
        }
        Ok(())
    }

    fn poll(&mut self) -> io::Result<Option<Vec<u8>>> {
        if !self.poll_readable(Duration::ZERO)? {
            return Ok(None);
        }

        let mut buf = [0u8; READ_CHUNK];
        match self.tty.read(&mut buf) {
            // Hangup: report it as end-of-transmission so the session cancels
            Ok(0) => Ok(Some(vec![0x04])),
            Ok(n) => Ok(Some(buf[..n].to_vec())),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => Ok(None),
            // Linux reports a closed pty master as EIO rather than EOF
            Err(e) if e.raw_os_error() == Some(nix::errno::Errno::EIO as i32) => {
                Ok(Some(vec![0x04]))
            }
            Err(e) => Err(e),
        }
    }

    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        self.poll_readable(timeout)
    }

    fn exit(&mut self) {
        self.restore_flags();
        self.mode.restore();
    }
}

impl Drop for PollChannel {
    fn drop(&mut self) {
        self.exit();
    }
}
