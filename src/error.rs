use crate::token::{Token, TokenKind};
use crate::value::object::Value;
use thiserror::Error;

/// The full error taxonomy the core can raise. Scan/Parse/Resolve errors
/// abort the pipeline stage that raised them; Runtime errors unwind
/// evaluation. `Return` is not a user-visible error at all — it is the
/// non-local exit `return` statements use to unwind out of a function
/// body (spec.md §4.3/§9: "a dedicated result variant threaded through
/// evaluation" is one of the three sanctioned ways to implement it).
#[derive(Debug, Error)]
pub enum Error {
    #[error("[line {line}] Error: {message}")]
    Scan { line: usize, message: String },

    #[error("[line {line}] Error{at}: {message}", line = .token.line, at = where_clause(.token))]
    Parse { token: Token, message: String },

    #[error("[line {line}] Error{at}: {message}", line = .token.line, at = where_clause(.token))]
    Resolve { token: Token, message: String },

    #[error("{message}\n[line {}]", .token.line)]
    Runtime { token: Token, message: String },

    #[error("return is not an error")]
    Return(Value),
}

fn where_clause(token: &Token) -> String {
    if token.kind == TokenKind::Eof {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl Error {
    pub fn runtime(token: Token, message: impl Into<String>) -> Self {
        Error::Runtime {
            token,
            message: message.into(),
        }
    }

    pub fn resolve(token: Token, message: impl Into<String>) -> Self {
        Error::Resolve {
            token,
            message: message.into(),
        }
    }

    pub fn parse(token: Token, message: impl Into<String>) -> Self {
        Error::Parse {
            token,
            message: message.into(),
        }
    }
}

/// Owned replacement for the teacher's `static mut HAD_ERROR`. Scanner and
/// parser report through this rather than aborting on the first problem,
/// so a single run can surface more than one scan/parse error (spec.md §7).
#[derive(Debug, Default)]
pub struct ErrorReporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_at_line(&mut self, line: usize, message: impl AsRef<str>) {
        eprintln!("[line {line}] Error: {}", message.as_ref());
        self.had_error = true;
    }

    pub fn error_at_token(&mut self, token: &Token, message: impl AsRef<str>) {
        eprintln!(
            "[line {}] Error{}: {}",
            token.line,
            where_clause(token),
            message.as_ref()
        );
        self.had_error = true;
    }

    pub fn report_parse_or_resolve(&mut self, err: &Error) {
        match err {
            Error::Parse { token, message } | Error::Resolve { token, message } => {
                self.error_at_token(token, message);
            }
            other => eprintln!("{other}"),
        }
    }

    pub fn runtime_error(&mut self, err: &Error) {
        eprintln!("{err}");
        self.had_runtime_error = true;
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }
}
