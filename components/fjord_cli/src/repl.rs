//! REPL (Read-Eval-Print Loop) implementation

use std::path::PathBuf;

use object_system::FriendlyError;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::error::{CliError, CliResult};
use crate::runtime::Runtime;

/// Run the interactive REPL
///
/// Each submitted form is appended to the runtime's compiler session, so
/// later lines see everything earlier lines defined.
///
/// # Returns
/// `Ok(())` when the REPL exits normally
pub fn run_repl(runtime: &mut Runtime) -> CliResult<()> {
    let mut editor = DefaultEditor::new()
        .map_err(|e| CliError::Repl(format!("failed to initialize the line editor: {e}")))?;

    let history = history_path();
    if let Some(path) = &history {
        let _ = editor.load_history(path);
    }

    println!("fjord {}", env!("CARGO_PKG_VERSION"));
    println!("Type fjord code, '.help' for commands, 'exit' to quit.");
    println!();

    let mut line_buffer = String::new();
    let mut in_multiline = false;

    loop {
        let prompt = if in_multiline { "... " } else { ">> " };

        match editor.readline(prompt) {
            Ok(line) => {
                let trimmed = line.trim();

                // Check for exit commands
                if !in_multiline && (trimmed == "exit" || trimmed == ".exit" || trimmed == "quit") {
                    println!("Goodbye!");
                    break;
                }

                // Handle special REPL commands
                if !in_multiline && trimmed.starts_with('.') {
                    handle_repl_command(trimmed, runtime);
                    continue;
                }

                // Accumulate input
                if in_multiline {
                    line_buffer.push('\n');
                }
                line_buffer.push_str(&line);

                // Check if input is complete (simple heuristic)
                if is_input_complete(&line_buffer) {
                    in_multiline = false;

                    // Add to history
                    let _ = editor.add_history_entry(&line_buffer);

                    // Execute and print result
                    match runtime.execute_string(&line_buffer) {
                        Ok(value) => {
                            if !value.is_nil() {
                                println!("{}", value.inspect());
                            }
                        }
                        Err(CliError::Parse(e)) => {
                            // The parser ran out of tokens: treat the form
                            // as still open and keep reading.
                            if e.message().ends_with("end of input") {
                                in_multiline = true;
                                continue;
                            }
                            print_error(&e.friendly_message());
                        }
                        Err(CliError::Compile(e)) => {
                            print_error(&e.friendly_message());
                        }
                        Err(e) => {
                            print_error(&e.to_string());
                        }
                    }

                    line_buffer.clear();
                } else {
                    in_multiline = true;
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl-C
                if in_multiline {
                    println!("^C");
                    line_buffer.clear();
                    in_multiline = false;
                } else {
                    println!("Press Ctrl-D or type 'exit' to quit");
                }
            }
            Err(ReadlineError::Eof) => {
                // Ctrl-D
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                if let Some(path) = &history {
                    let _ = editor.save_history(path);
                }
                return Err(CliError::Repl(format!("readline error: {err}")));
            }
        }
    }

    if let Some(path) = &history {
        let _ = editor.save_history(path);
    }

    Ok(())
}

fn history_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".fjord_history"))
}

/// Handle special REPL commands
fn handle_repl_command(command: &str, runtime: &Runtime) {
    match command {
        ".help" => {
            println!("REPL commands:");
            println!("  .help     - Show this help message");
            println!("  .clear    - Clear the screen");
            println!("  .globals  - List global bindings");
            println!("  .exit     - Exit the REPL");
            println!("  exit      - Exit the REPL");
            println!("  quit      - Exit the REPL");
        }
        ".clear" => {
            print!("\x1B[2J\x1B[1;1H");
        }
        ".globals" => {
            let bindings = runtime.global_bindings();
            if bindings.is_empty() {
                println!("(no globals yet)");
            }
            for (name, value) in bindings {
                println!("{} = {}", name, value.inspect());
            }
        }
        _ => {
            println!("Unknown command: {command}");
            println!("Type .help for available commands");
        }
    }
}

fn print_error(message: &str) {
    eprintln!("\x1b[31m{message}\x1b[0m");
}

/// Check if the input appears to be complete
///
/// A simple heuristic: balanced braces/brackets/parens outside strings
/// and comments. The parser has the final say; an end-of-input parse
/// error also reopens the form.
fn is_input_complete(input: &str) -> bool {
    let mut brace_count = 0;
    let mut bracket_count = 0;
    let mut paren_count = 0;
    let mut in_string = false;
    let mut in_comment = false;
    let mut string_char = ' ';
    let mut escape_next = false;

    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if in_comment {
            if c == '\n' {
                in_comment = false;
            }
            continue;
        }

        if escape_next {
            escape_next = false;
            continue;
        }

        if c == '\\' && in_string {
            escape_next = true;
            continue;
        }

        if !in_string {
            match c {
                '"' | '\'' => {
                    in_string = true;
                    string_char = c;
                }
                '#' => in_comment = true,
                '/' if chars.peek() == Some(&'/') => in_comment = true,
                '{' => brace_count += 1,
                '}' => brace_count -= 1,
                '[' => bracket_count += 1,
                ']' => bracket_count -= 1,
                '(' => paren_count += 1,
                ')' => paren_count -= 1,
                _ => {}
            }
        } else if c == string_char {
            in_string = false;
        }
    }

    brace_count == 0 && bracket_count == 0 && paren_count == 0 && !in_string
}
