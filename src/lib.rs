//! Typed Prompt Library
//!
//! Interactive, validated line editing on a raw terminal. A prompt keeps
//! asking until the typed line matches a grammar and converts to a value,
//! or the user cancels with Ctrl+C, Ctrl+D or Escape.
//!
//! - `raw`: raw-mode keystroke channels (poll and reader-thread backends)
//! - `input`: keystroke decoding
//! - `core`: the editable line buffer
//! - `renderer`: in-place redraw with optional masking
//! - `grammar`: validation and conversion, plus built-in grammars
//! - `session`: the edit state machine and retry loop
//!
//! ```no_run
//! use typed_prompt::{edit_line, grammar::builtin, Outcome};
//!
//! match edit_line("Enter count: ", &builtin::integer(), None)? {
//!     Outcome::Value(n) => println!("got {}", n),
//!     Outcome::Cancelled => println!("cancelled"),
//! }
//! # Ok::<(), typed_prompt::Error>(())
//! ```

pub mod app;
pub mod core;
pub mod error;
pub mod grammar;
pub mod input;
pub mod raw;
pub mod renderer;
pub mod session;

pub use app::{Backend, EditorConfig};
pub use error::{Error, Result, SetupError};
pub use grammar::Grammar;
pub use session::{EditSession, LineEditor, Outcome, SessionState};

/// Prompt on the controlling terminal with the default configuration,
/// echoing to standard output.
///
/// `mask` overrides the grammar's echo mask for this call.
pub fn edit_line<G: Grammar>(
    prompt: &str,
    grammar: &G,
    mask: Option<char>,
) -> Result<Outcome<G::Output>> {
    LineEditor::stdout(EditorConfig::default()).edit_line(prompt, grammar, mask)
}
