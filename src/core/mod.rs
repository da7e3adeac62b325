//! Line Editing Core
//!
//! Platform-independent editing state. Given the same sequence of
//! operations the buffer always ends in the same state, so everything here
//! is testable without a terminal.

mod line;

pub use line::LineBuffer;
