//! Helpers shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::{BufferedReporter, Reporter};
use rox::interpreter::Interpreter;

/// In‑memory `print` sink that stays readable after the interpreter takes
/// ownership of its clone.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Everything a test may want to look at after running a program.
pub struct Outcome {
    pub output: Vec<String>,
    pub errors: Vec<String>,
    pub had_syntax_error: bool,
    pub had_runtime_error: bool,
}

/// Runs `source` through the whole pipeline with a fresh interpreter.
pub fn run(source: &str) -> Outcome {
    let out = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(Box::new(out.clone()));
    let mut reporter = BufferedReporter::new();

    rox::run(source, &mut interpreter, &mut reporter);

    Outcome {
        output: out.lines(),
        errors: reporter.messages().to_vec(),
        had_syntax_error: reporter.had_syntax_error(),
        had_runtime_error: reporter.had_runtime_error(),
    }
}
