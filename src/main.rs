mod environment;
mod error;
mod expr;
mod interpreter;
mod native_functions;
mod parser;
mod resolver;
mod scanner;
mod stmt;
mod token;
mod value;

use crate::error::ErrorReporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use anyhow::Context;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;

const EX_USAGE: u8 = 64;
const EX_SOFTWARE: u8 = 70;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    match args.len() {
        1 => run_prompt(),
        2 => run_file(&args[1]),
        _ => {
            eprintln!("Usage: rlox [script]");
            ExitCode::from(64)
        }
    }
}

fn run_file(path: &str) -> ExitCode {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("{err:#}");
            return ExitCode::from(EX_SOFTWARE);
        }
    };

    let mut reporter = ErrorReporter::new();
    let mut interpreter = Interpreter::new();
    run(&source, &mut interpreter, &mut reporter);

    if reporter.had_error() {
        ExitCode::from(EX_USAGE)
    } else if reporter.had_runtime_error() {
        ExitCode::from(EX_SOFTWARE)
    } else {
        ExitCode::SUCCESS
    }
}

/// A REPL that keeps one global environment and one resolution map alive
/// across lines, so a variable declared on one line is visible on the
/// next (spec.md §4.5) — each line is still scanned, parsed, and resolved
/// independently, with fresh per-line errors never poisoning later lines.
fn run_prompt() -> ExitCode {
    let stdin = io::stdin();
    let mut interpreter = Interpreter::new();

    loop {
        print!("> ");
        if io::stdout().flush().is_err() {
            return ExitCode::SUCCESS;
        }

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => return ExitCode::SUCCESS, // EOF
            Ok(_) => {
                let mut reporter = ErrorReporter::new();
                run(&line, &mut interpreter, &mut reporter);
            }
            Err(err) => {
                eprintln!("Failed to read line: {err}");
                return ExitCode::from(EX_SOFTWARE);
            }
        }
    }
}

/// The only host-level (not Lox-level) failure the driver can hit: the
/// script path doesn't exist or isn't readable. `anyhow` is for exactly
/// this seam — process/IO failures outside the Lox error taxonomy
/// (spec.md §7), kept separate from the `thiserror`-typed `Error` enum.
fn read_source(path: &str) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read '{path}'"))
}

fn run(source: &str, interpreter: &mut Interpreter, reporter: &mut ErrorReporter) {
    let tokens = Scanner::new(source, reporter).scan_tokens();
    if reporter.had_error() {
        return;
    }

    let statements = match Parser::new(tokens).parse() {
        Ok(statements) => statements,
        Err(errors) => {
            for err in &errors {
                reporter.report_parse_or_resolve(err);
            }
            return;
        }
    };

    let locals = match Resolver::new().resolve(&statements) {
        Ok(locals) => locals,
        Err(errors) => {
            for err in &errors {
                reporter.report_parse_or_resolve(err);
            }
            return;
        }
    };
    interpreter.load_resolution(locals);

    interpreter.interpret(&statements, reporter);
}
