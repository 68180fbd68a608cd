//! fjord CLI
//!
//! Entry point for the fjord scripting language. Parses CLI arguments
//! and delegates to the Runtime for execution.

use std::io::Read;

use clap::Parser as ClapParser;
use fjord_cli::{Cli, CliError, Runtime};
use object_system::{FriendlyError, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; RUST_LOG selects targets such as fjord::vm.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut runtime = Runtime::new(!cli.no_default_builtins)
        .with_output(cli.output)
        .with_timing(cli.timing);

    // Execute based on CLI arguments
    if let Some(file) = cli.script {
        match runtime.execute_file(&file) {
            Ok(result) => print_result(&runtime, &result),
            Err(CliError::Io(e)) => {
                eprintln!("fjord: cannot read '{}': {}", file, e);
                std::process::exit(1);
            }
            Err(err) => fail(err),
        }
    } else if let Some(code) = cli.code {
        match runtime.execute_string(&code) {
            Ok(result) => print_result(&runtime, &result),
            Err(err) => fail(err),
        }
    } else if cli.stdin {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        match runtime.execute_string(&source) {
            Ok(result) => print_result(&runtime, &result),
            Err(err) => fail(err),
        }
    } else {
        runtime.repl()?;
    }

    Ok(())
}

/// Print a run result, skipping nil so statements stay silent.
fn print_result(runtime: &Runtime, result: &Value) {
    if !result.is_nil() {
        println!("{}", runtime.render(result));
    }
}

fn fail(err: CliError) -> ! {
    match err {
        CliError::Parse(e) => eprintln!("{}", e.friendly_message()),
        CliError::Compile(e) => eprintln!("{}", e.friendly_message()),
        other => eprintln!("{}", other),
    }
    std::process::exit(1);
}
