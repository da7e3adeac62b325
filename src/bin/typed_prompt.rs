//! Typed Prompt
//!
//! Asks for one value on the terminal and prints it on stdout.
//! The prompt itself is drawn on stderr so the output can be captured:
//!
//! ```text
//! count=$(typed-prompt --kind int --prompt "How many? ")
//! ```
//!
//! Exit status is 0 with a value, 130 when the user cancels and 1 when the
//! terminal cannot be used.

use std::fmt::Display;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use typed_prompt::app::{init_logging, Backend, EditorConfig};
use typed_prompt::grammar::{builtin, Grammar};
use typed_prompt::{Error, LineEditor, Outcome};

/// Exit status for a cancelled prompt (128 + SIGINT)
const EXIT_CANCELLED: u8 = 130;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Kind {
    Int,
    Float,
    Decimal,
    Money,
    DecimalMoney,
    Hex,
    Binary,
    Date,
    Text,
    Password,
}

#[derive(Debug, Parser)]
#[command(name = "typed-prompt", version, about = "Prompt for a validated, typed value")]
struct CliArgs {
    /// Kind of value to ask for
    #[arg(short, long, value_enum, default_value_t = Kind::Text)]
    kind: Kind,

    /// Prompt text
    #[arg(short, long, value_name = "TEXT")]
    prompt: Option<String>,

    /// Echo this character instead of the typed text
    #[arg(short, long, value_name = "CHAR")]
    mask: Option<char>,

    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Keystroke backend (auto, poll, threaded)
    #[arg(short, long, value_name = "BACKEND")]
    backend: Option<Backend>,
}

fn default_prompt(kind: Kind) -> &'static str {
    match kind {
        Kind::Int => "Enter an integer: ",
        Kind::Float => "Enter a number: ",
        Kind::Decimal => "Enter a decimal: ",
        Kind::Money | Kind::DecimalMoney => "Enter an amount: ",
        Kind::Hex => "Enter a hex value: ",
        Kind::Binary => "Enter a binary value: ",
        Kind::Date => "Enter a date: ",
        Kind::Text => "> ",
        Kind::Password => "Password: ",
    }
}

fn load_config(args: &CliArgs) -> Result<EditorConfig, typed_prompt::app::ConfigError> {
    let mut config = match &args.config {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::load_or_default(),
    };
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    config.validate()?;
    Ok(config)
}

fn ask<G>(
    editor: &mut LineEditor<io::Stderr>,
    prompt: &str,
    grammar: &G,
    mask: Option<char>,
) -> Result<Outcome<String>, Error>
where
    G: Grammar,
    G::Output: Display,
{
    Ok(editor.edit_line(prompt, grammar, mask)?.map(|v| v.to_string()))
}

fn run(args: &CliArgs, config: EditorConfig) -> Result<Outcome<String>, Error> {
    let mut editor = LineEditor::new(config, io::stderr());
    let prompt = args.prompt.as_deref().unwrap_or(default_prompt(args.kind));
    let mask = args.mask;

    match args.kind {
        Kind::Int => ask(&mut editor, prompt, &builtin::integer(), mask),
        Kind::Float => ask(&mut editor, prompt, &builtin::float(), mask),
        Kind::Decimal => ask(&mut editor, prompt, &builtin::decimal(), mask),
        Kind::Money => ask(&mut editor, prompt, &builtin::money(), mask),
        Kind::DecimalMoney => ask(&mut editor, prompt, &builtin::decimal_money(), mask),
        Kind::Hex => ask(&mut editor, prompt, &builtin::hex(), mask),
        Kind::Binary => ask(&mut editor, prompt, &builtin::binary(), mask),
        Kind::Date => ask(&mut editor, prompt, &builtin::date(), mask),
        Kind::Text => ask(&mut editor, prompt, &builtin::text(), mask),
        Kind::Password => ask(&mut editor, prompt, &builtin::password(), mask),
    }
}

fn main() -> ExitCode {
    init_logging("warn");

    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Configuration error: {}", e);
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(&args, config) {
        Ok(Outcome::Value(value)) => {
            println!("{}", value);
            ExitCode::SUCCESS
        }
        Ok(Outcome::Cancelled) => ExitCode::from(EXIT_CANCELLED),
        Err(e) => {
            tracing::debug!("edit failed: {:?}", e);
            eprintln!("typed-prompt: {}", e);
            ExitCode::FAILURE
        }
    }
}
