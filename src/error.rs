//! Centralised error hierarchy and reporting contract for the interpreter.
//!
//! Every stage converts its failures into a [`LoxError`] and hands it to a
//! [`Reporter`].  Reporters are passed in explicitly (`&mut dyn Reporter`)
//! rather than living in global state, so two interpreters running side by
//! side never share error flags.
//!
//! The module **does not** decide exit codes; it only keeps the two sticky
//! flags (`had_syntax_error`, `had_runtime_error`) the driver inspects.

use std::io::{self, Write};

use log::{debug, info};
use thiserror::Error;

use crate::token::{Token, TokenType};

/// Renders the location part of a diagnostic for `token`.
fn location(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Runtime fault raised while evaluating: carries the token whose line is
/// reported.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("[line {}] Error{}: {}", .token.line, location(.token), .message)]
pub struct RuntimeError {
    /// Token at the fault site (operator, name, paren...).
    pub token: Token,

    /// Human‑readable description.
    pub message: String,
}

impl RuntimeError {
    pub fn new<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        debug!(
            "Creating Runtime error: line={}, msg={}",
            token.line, message
        );

        RuntimeError {
            token: token.clone(),
            message,
        }
    }
}

/// Canonical diagnostic type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        location: String,
    },

    /// Static‑analysis failure (invalid `return`, `this`, self‑reference...).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, msg={}",
            token.line, message
        );

        LoxError::Resolve {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Lex, parse and resolve errors all stop execution before the
    /// interpreter runs.
    pub fn is_syntax(&self) -> bool {
        matches!(
            self,
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. }
        )
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, LoxError::Runtime(_))
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// The error-reporting contract shared by every pipeline stage.
pub trait Reporter {
    /// Record one diagnostic and update the sticky flags.
    fn report(&mut self, error: LoxError);

    /// Clear both sticky flags (the REPL does this between lines).
    fn reset(&mut self);

    fn had_syntax_error(&self) -> bool;

    fn had_runtime_error(&self) -> bool;

    fn lex_error(&mut self, line: usize, message: &str) {
        self.report(LoxError::lex(line, message));
    }

    fn parse_error(&mut self, token: &Token, message: &str) {
        self.report(LoxError::parse(token, message));
    }

    fn resolve_error(&mut self, token: &Token, message: &str) {
        self.report(LoxError::resolve(token, message));
    }

    fn runtime_error(&mut self, error: &RuntimeError) {
        self.report(LoxError::Runtime(error.clone()));
    }
}

/// Sticky flags shared by the stock reporters.
#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    syntax: bool,
    runtime: bool,
}

impl Flags {
    fn record(&mut self, error: &LoxError) {
        if error.is_syntax() {
            self.syntax = true;
        } else if error.is_runtime() {
            self.runtime = true;
        }
    }
}

/// Writes every diagnostic to stderr as soon as it is reported.
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    flags: Flags,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Reporter for ConsoleReporter {
    fn report(&mut self, error: LoxError) {
        self.flags.record(&error);

        // stderr being closed is not worth aborting the run for
        let _ = writeln!(io::stderr().lock(), "{}", error);
    }

    fn reset(&mut self) {
        self.flags = Flags::default();
    }

    fn had_syntax_error(&self) -> bool {
        self.flags.syntax
    }

    fn had_runtime_error(&self) -> bool {
        self.flags.runtime
    }
}

/// Keeps rendered diagnostics in memory, in report order.
#[derive(Debug, Default)]
pub struct BufferedReporter {
    flags: Flags,
    messages: Vec<String>,
}

impl BufferedReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered diagnostics reported so far.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Drains the rendered diagnostics, leaving the flags untouched.
    pub fn take_messages(&mut self) -> Vec<String> {
        std::mem::take(&mut self.messages)
    }
}

impl Reporter for BufferedReporter {
    fn report(&mut self, error: LoxError) {
        self.flags.record(&error);
        self.messages.push(error.to_string());
    }

    fn reset(&mut self) {
        self.flags = Flags::default();
    }

    fn had_syntax_error(&self) -> bool {
        self.flags.syntax
    }

    fn had_runtime_error(&self) -> bool {
        self.flags.runtime
    }
}
