//! Producer-thread backend
//!
//! For input sources that only support blocking reads. A single background
//! thread reads from the source and pushes every read into a bounded queue;
//! [`RawChannel::poll`] is a non-blocking dequeue.
//!
//! Backpressure: when the queue is full the producer blocks in `send`
//! until the consumer drains it. Keystrokes are never dropped.
//!
//! The producer only reads while the channel is entered. Sources that can
//! wait for readiness are polled in short slices so the thread notices
//! `exit` without sitting in a read, and is joined before `exit` returns.
//! A source that cannot wait keeps its producer across `exit`, and the next
//! `enter` on the same channel picks up whatever it read in between.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::{RawChannel, SetupError, TerminalMode};

/// Default queue capacity in reads
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

const READ_CHUNK: usize = 64;

/// How long the producer waits for input before checking the stop flag
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(20);

/// End-of-transmission, delivered when the source hits EOF or fails
const EOT: u8 = 0x04;

/// A blocking input source for [`ThreadedChannel`]
pub trait InputSource: Read + Send + 'static {
    /// Whether [`wait_readable`](InputSource::wait_readable) really waits.
    ///
    /// When it does, a read is only issued once input is ready, so the
    /// producer never holds a read open across `exit`.
    fn supports_wait(&self) -> bool {
        false
    }

    /// Wait at most `timeout` for input. Hangups count as readable so the
    /// following read can report them.
    fn wait_readable(&self, _timeout: Duration) -> io::Result<bool> {
        Ok(true)
    }
}

/// In-memory input never blocks
impl<T: AsRef<[u8]> + Send + 'static> InputSource for io::Cursor<T> {
    fn supports_wait(&self) -> bool {
        true
    }
}

#[cfg(not(unix))]
impl InputSource for io::Stdin {}

/// The running reader thread and its end of the queue
struct Producer<R> {
    handle: JoinHandle<R>,
    rx: Receiver<Vec<u8>>,
    stop: Arc<AtomicBool>,
    waits: bool,
}

impl<R> Producer<R> {
    /// Whether `shutdown` can return without waiting on a blocked read
    fn can_join(&self) -> bool {
        self.waits || self.handle.is_finished()
    }

    /// Stop the thread and take the source back. Reads it queued before
    /// stopping are appended to `pending`.
    fn shutdown(self, pending: &mut VecDeque<Vec<u8>>) -> Option<R> {
        self.stop.store(true, Ordering::Release);

        // Drains until the producer returns and drops its sender
        while let Ok(chunk) = self.rx.recv() {
            pending.push_back(chunk);
        }

        match self.handle.join() {
            Ok(reader) => Some(reader),
            Err(_) => {
                tracing::warn!("input reader thread panicked");
                None
            }
        }
    }
}

/// Raw keystroke channel fed by a background reader thread
pub struct ThreadedChannel<R, M> {
    /// The source, while no producer thread owns it
    reader: Option<R>,
    mode: M,
    capacity: usize,
    producer: Option<Producer<R>>,
    /// Reads taken off the queue but not yet handed out
    pending: VecDeque<Vec<u8>>,
}

impl<R, M> ThreadedChannel<R, M>
where
    R: InputSource,
    M: TerminalMode,
{
    /// Create a channel over `reader`. The producer thread starts on the
    /// first [`RawChannel::enter`].
    pub fn new(reader: R, mode: M, capacity: usize) -> Self {
        Self {
            reader: Some(reader),
            mode,
            capacity: capacity.max(1),
            producer: None,
            pending: VecDeque::new(),
        }
    }

    /// Queue capacity in reads
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a reader thread is currently attached
    pub fn is_reading(&self) -> bool {
        self.producer.is_some()
    }

    fn spawn_producer(&mut self) -> Result<(), SetupError> {
        let Some(reader) = self.reader.take() else {
            return Err(SetupError::Thread(io::Error::other(
                "input reader was lost when its thread panicked",
            )));
        };

        let waits = reader.supports_wait();
        let (tx, rx) = mpsc::sync_channel(self.capacity);
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);

        let handle = thread::Builder::new()
            .name("typed-prompt-reader".into())
            .spawn(move || produce(reader, tx, thread_stop))
            .map_err(SetupError::Thread)?;

        self.producer = Some(Producer {
            handle,
            rx,
            stop,
            waits,
        });
        Ok(())
    }
}

/// Producer loop: reads pushed into the queue in arrival order. Hands the
/// source back when it stops.
fn produce<R: InputSource>(mut reader: R, tx: SyncSender<Vec<u8>>, stop: Arc<AtomicBool>) -> R {
    let waits = reader.supports_wait();
    let mut buf = [0u8; READ_CHUNK];

    while !stop.load(Ordering::Acquire) {
        if waits {
            match reader.wait_readable(STOP_CHECK_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    tracing::debug!("input reader failed to wait: {}", e);
                    let _ = tx.send(vec![EOT]);
                    break;
                }
            }
        }

        let chunk = match reader.read(&mut buf) {
            Ok(0) => {
                tracing::debug!("input reader reached end of input");
                let _ = tx.send(vec![EOT]);
                break;
            }
            Ok(n) => buf[..n].to_vec(),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock
                ) =>
            {
                continue
            }
            Err(e) => {
                tracing::debug!("input reader failed: {}", e);
                let _ = tx.send(vec![EOT]);
                break;
            }
        };

        // Blocks while the queue is full; fails once the consumer is gone.
        if tx.send(chunk).is_err() {
            break;
        }
    }

    tracing::trace!("input reader thread exiting");
    reader
}

impl<R, M> RawChannel for ThreadedChannel<R, M>
where
    R: InputSource,
    M: TerminalMode,
{
    fn enter(&mut self) -> Result<(), SetupError> {
        self.mode.enable()?;
        if self.producer.is_none() {
            if let Err(e) = self.spawn_producer() {
                self.mode.restore();
                return Err(e);
            }
        }
        Ok(())
    }

    fn poll(&mut self) -> io::Result<Option<Vec<u8>>> {
        if let Some(chunk) = self.pending.pop_front() {
            return Ok(Some(chunk));
        }
        let Some(producer) = &self.producer else {
            return Ok(None);
        };
        match producer.rx.try_recv() {
            Ok(chunk) => Ok(Some(chunk)),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => Ok(None),
        }
    }

    fn wait(&mut self, timeout: Duration) -> io::Result<bool> {
        if !self.pending.is_empty() {
            return Ok(true);
        }
        let Some(producer) = &self.producer else {
            thread::sleep(timeout);
            return Ok(false);
        };
        match producer.rx.recv_timeout(timeout) {
            Ok(chunk) => {
                self.pending.push_back(chunk);
                Ok(true)
            }
            Err(RecvTimeoutError::Timeout) => Ok(false),
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                Ok(false)
            }
        }
    }

    fn exit(&mut self) {
        if let Some(producer) = self.producer.take() {
            if producer.can_join() {
                self.reader = producer.shutdown(&mut self.pending);
            } else {
                // Parked in a blocking read; keep it for the next enter
                self.producer = Some(producer);
            }
        }
        self.mode.restore();
    }
}

impl<R, M> Drop for ThreadedChannel<R, M> {
    fn drop(&mut self) {
        if let Some(producer) = self.producer.take() {
            if producer.can_join() {
                producer.shutdown(&mut self.pending);
            } else {
                producer.stop.store(true, Ordering::Release);
            }
        }
    }
}

impl<R, M: std::fmt::Debug> std::fmt::Debug for ThreadedChannel<R, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedChannel")
            .field("mode", &self.mode)
            .field("capacity", &self.capacity)
            .field("reading", &self.producer.is_some())
            .field("pending", &self.pending.len())
            .finish()
    }
}
