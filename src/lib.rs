//! A tree‑walking interpreter for Lox.
//!
//! Source text flows through four stages:
//! [`Scanner`](scanner::Scanner) → [`Parser`](parser::Parser) →
//! [`Resolver`](resolver::Resolver) → [`Interpreter`](interpreter::Interpreter).
//! Each stage reports problems through a caller‑supplied
//! [`Reporter`](error::Reporter).

pub mod ast;
pub mod callable;
pub mod class;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod token;
pub mod value;

use log::info;

use crate::error::Reporter;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Runs one chunk of source (a whole file or one REPL line) against
/// `interpreter`.  Execution is skipped if scanning, parsing or resolution
/// reported an error; check `reporter` afterwards to tell the cases apart.
pub fn run(source: &str, interpreter: &mut Interpreter, reporter: &mut dyn Reporter) {
    let tokens = Scanner::new(source).scan_tokens(reporter);
    let statements = Parser::new(tokens, reporter).parse();

    if reporter.had_syntax_error() {
        info!("Syntax errors found, skipping execution");
        return;
    }

    Resolver::new(interpreter, reporter).resolve(&statements);

    if reporter.had_syntax_error() {
        info!("Resolution errors found, skipping execution");
        return;
    }

    interpreter.interpret(&statements, reporter);
}
