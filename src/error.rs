//! Error types

use std::io;

pub use crate::raw::SetupError;

/// Errors returned by an edit call
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The terminal could not be put into raw mode; nothing was drawn
    #[error("Terminal setup failed: {0}")]
    Setup(#[from] SetupError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// `run` was called on a session that already produced an outcome
    #[error("Edit session has already finished")]
    Finished,
}

/// Result type for edit calls
pub type Result<T> = std::result::Result<T, Error>;
