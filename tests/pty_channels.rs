//! Keystroke channels against a real pseudo-terminal
//!
//! Raw mode is process-wide, so these tests take a shared lock.

#![cfg(unix)]

use std::fs::File;
use std::io::Write;
use std::sync::{Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use nix::pty::{openpty, OpenptyResult};
use nix::sys::termios::{tcgetattr, LocalFlags};
use typed_prompt::grammar::builtin;
use typed_prompt::raw::{PollChannel, RawChannel, RawModeLock, TermiosMode, ThreadedChannel};
use typed_prompt::{EditorConfig, Error, LineEditor, Outcome, SetupError};

static TTY: Mutex<()> = Mutex::new(());

fn serial() -> MutexGuard<'static, ()> {
    TTY.lock().unwrap_or_else(|e| e.into_inner())
}

/// (master, slave)
fn pty() -> (File, File) {
    let OpenptyResult { master, slave } = openpty(None, None).unwrap();
    (File::from(master), File::from(slave))
}

fn is_canonical(tty: &File) -> bool {
    tcgetattr(tty).unwrap().local_flags.contains(LocalFlags::ICANON)
}

/// Write `bytes` to the master side after a short delay, once the channel
/// has had time to enter raw mode
fn type_later(mut master: File, bytes: &'static [u8]) -> thread::JoinHandle<File> {
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        master.write_all(bytes).unwrap();
        master
    })
}

/// Write each key on its own, `gap` apart
fn type_keys(mut master: File, keys: &[&'static [u8]], gap: Duration) -> thread::JoinHandle<File> {
    let keys = keys.to_vec();
    thread::spawn(move || {
        for key in keys {
            thread::sleep(gap);
            master.write_all(key).unwrap();
        }
        master
    })
}

#[test]
fn test_poll_channel_raw_mode_round_trip() {
    let _serial = serial();
    let (_master, slave) = pty();
    let view = slave.try_clone().unwrap();
    assert!(is_canonical(&view));

    let mut channel = PollChannel::new(slave).unwrap();
    channel.enter().unwrap();
    assert!(!is_canonical(&view));
    assert!(RawModeLock::is_held());

    channel.exit();
    assert!(is_canonical(&view));
    assert!(!RawModeLock::is_held());

    // Second exit is a no-op
    channel.exit();
    assert!(is_canonical(&view));
}

#[test]
fn test_poll_channel_reads_bursts() {
    let _serial = serial();
    let (mut master, slave) = pty();

    let mut channel = PollChannel::new(slave).unwrap();
    channel.enter().unwrap();
    assert_eq!(channel.poll().unwrap(), None);

    master.write_all(b"\x1b[D").unwrap();
    assert!(channel.wait(Duration::from_secs(2)).unwrap());
    assert_eq!(channel.poll().unwrap(), Some(b"\x1b[D".to_vec()));
    assert_eq!(channel.poll().unwrap(), None);

    // Ctrl+C arrives as a byte, not a signal
    master.write_all(&[0x03]).unwrap();
    assert!(channel.wait(Duration::from_secs(2)).unwrap());
    assert_eq!(channel.poll().unwrap(), Some(vec![0x03]));

    channel.exit();
}

#[test]
fn test_poll_channel_wait_times_out() {
    let _serial = serial();
    let (_master, slave) = pty();

    let mut channel = PollChannel::new(slave).unwrap();
    channel.enter().unwrap();
    assert!(!channel.wait(Duration::from_millis(20)).unwrap());
    channel.exit();
}

#[test]
fn test_second_channel_is_busy() {
    let _serial = serial();
    let (_m1, s1) = pty();
    let (_m2, s2) = pty();

    let mut first = PollChannel::new(s1).unwrap();
    let mut second = PollChannel::new(s2).unwrap();

    first.enter().unwrap();
    assert!(matches!(second.enter(), Err(SetupError::Busy)));
    first.exit();

    second.enter().unwrap();
    second.exit();
}

#[test]
fn test_session_over_poll_channel() {
    let _serial = serial();
    let (master, slave) = pty();
    let view = slave.try_clone().unwrap();

    let mut channel = PollChannel::new(slave).unwrap();
    let typist = type_later(master, b"4,096\r");

    let mut editor = LineEditor::new(EditorConfig::default(), Vec::new());
    let outcome = editor
        .edit_line_with(&mut channel, "Size: ", &builtin::integer(), None)
        .unwrap();

    assert_eq!(outcome, Outcome::Value(4096));
    assert!(is_canonical(&view));
    drop(typist.join().unwrap());
}

#[test]
fn test_session_over_threaded_channel() {
    let _serial = serial();
    let (master, slave) = pty();
    let view = slave.try_clone().unwrap();
    let mode = TermiosMode::new(slave.try_clone().unwrap());

    let mut channel = ThreadedChannel::new(slave, mode, 16);
    let typist = type_later(master, b"abc\x03");

    let mut editor = LineEditor::new(EditorConfig::default(), Vec::new());
    let outcome = editor
        .edit_line_with(&mut channel, "> ", &builtin::text(), None)
        .unwrap();

    assert_eq!(outcome, Outcome::Cancelled);
    assert!(is_canonical(&view));
    assert!(!RawModeLock::is_held());
    assert!(!channel.is_reading());
    drop(typist.join().unwrap());
}

#[test]
fn test_threaded_sessions_back_to_back_keep_every_key() {
    let _serial = serial();
    let (master, slave) = pty();
    let mut editor = LineEditor::new(EditorConfig::default(), Vec::new());

    let mode = TermiosMode::new(slave.try_clone().unwrap());
    let mut first = ThreadedChannel::new(slave.try_clone().unwrap(), mode, 16);
    let typist = type_later(master, b"1\r");
    let outcome = editor
        .edit_line_with(&mut first, "a: ", &builtin::integer(), None)
        .unwrap();
    assert_eq!(outcome, Outcome::Value(1));
    let master = typist.join().unwrap();

    // The first channel is still alive but must not read for the second
    let mode = TermiosMode::new(slave.try_clone().unwrap());
    let mut second = ThreadedChannel::new(slave, mode, 16);
    let typist = type_keys(master, &[b"4", b"2", b"\r"], Duration::from_millis(100));
    let outcome = editor
        .edit_line_with(&mut second, "b: ", &builtin::integer(), None)
        .unwrap();
    assert_eq!(outcome, Outcome::Value(42));

    drop(first);
    drop(typist.join().unwrap());
}

#[test]
fn test_threaded_channel_reused_across_sessions() {
    let _serial = serial();
    let (master, slave) = pty();
    let mode = TermiosMode::new(slave.try_clone().unwrap());
    let mut channel = ThreadedChannel::new(slave, mode, 16);
    let mut editor = LineEditor::new(EditorConfig::default(), Vec::new());

    let typist = type_keys(master, &[b"7", b"\r", b"8", b"\r"], Duration::from_millis(100));
    let first = editor
        .edit_line_with(&mut channel, "> ", &builtin::integer(), None)
        .unwrap();
    let second = editor
        .edit_line_with(&mut channel, "> ", &builtin::integer(), None)
        .unwrap();

    assert_eq!(first, Outcome::Value(7));
    assert_eq!(second, Outcome::Value(8));
    drop(typist.join().unwrap());
}

#[test]
fn test_setup_failure_on_non_tty() {
    let _serial = serial();
    let file = tempfile::tempfile().unwrap();

    let mut channel = PollChannel::new(file).unwrap();
    let mut editor = LineEditor::new(EditorConfig::default(), Vec::new());
    let result = editor.edit_line_with(&mut channel, "> ", &builtin::text(), None);

    assert!(matches!(result, Err(Error::Setup(SetupError::Termios(_)))));
    assert!(editor.into_inner().is_empty());
    assert!(!RawModeLock::is_held());
}
