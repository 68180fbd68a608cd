//! CLI argument parsing for fjord.

use clap::{Parser, ValueEnum};

/// fjord - an embeddable scripting language
#[derive(Parser, Debug)]
#[command(name = "fjord")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Script file to run; omit it (and -c / --stdin) to start the REPL
    #[arg(value_name = "SCRIPT")]
    pub script: Option<String>,

    /// Evaluate CODE instead of reading a file
    #[arg(short = 'c', long = "code", value_name = "CODE", conflicts_with = "script")]
    pub code: Option<String>,

    /// Read the program from standard input
    #[arg(long, conflicts_with_all = ["script", "code"])]
    pub stdin: bool,

    /// How to render the result of a one-shot run
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Report parse, compile, and run wall times on stderr
    #[arg(long)]
    pub timing: bool,

    /// Start with an empty builtin table
    #[arg(long)]
    pub no_default_builtins: bool,
}

/// Result rendering for one-shot runs.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// `inspect()` form, the same rendering the REPL uses
    Text,
    /// JSON via the value's generic structural form
    Json,
}
