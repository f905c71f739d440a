//! The callable capability and its two function flavours: natives from a
//! read‑only table and user‑defined functions/methods.  Classes are callable
//! too; see [`crate::class`].

use std::fmt;
use std::rc::Rc;

use chrono::Utc;
use log::debug;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};
use crate::error::RuntimeError;
use crate::interpreter::{Flow, Interpreter};
use crate::value::Value;

/// Anything that can appear in callee position.
///
/// The interpreter checks the argument count against [`arity`](Self::arity)
/// before invoking [`call`](Self::call), so implementations may index
/// `arguments` freely.
pub trait Callable {
    fn arity(&self) -> usize;

    fn name(&self) -> &str;

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Native functions
// ─────────────────────────────────────────────────────────────────────────────

/// A host function exposed to scripts.
pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: fn(&[Value]) -> Value,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

impl Callable for NativeFunction {
    fn arity(&self) -> usize {
        self.arity
    }

    fn name(&self) -> &str {
        self.name
    }

    fn call(
        &self,
        _interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling native function '{}'", self.name);

        Ok((self.func)(&arguments))
    }
}

/// Seconds since the Unix epoch, with a fractional part.
fn clock(_arguments: &[Value]) -> Value {
    Value::Number(Utc::now().timestamp_micros() as f64 / 1_000_000.0)
}

/// Natives registered in every fresh global environment.  The table is
/// immutable, so interpreters may share it.
pub static NATIVES: &[NativeFunction] = &[NativeFunction {
    name: "clock",
    arity: 0,
    func: clock,
}];

// ─────────────────────────────────────────────────────────────────────────────
// User functions
// ─────────────────────────────────────────────────────────────────────────────

/// A function or method value: its declaration plus the environment it
/// closes over.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: EnvRef,
    is_initializer: bool,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: EnvRef, is_initializer: bool) -> Self {
        Self {
            declaration,
            closure,
            is_initializer,
        }
    }

    /// Returns a copy whose closure has `this` bound to `instance`.
    pub fn bind(&self, instance: Value) -> LoxFunction {
        let environment: EnvRef = Environment::child_of(&self.closure);
        environment.borrow_mut().define("this", instance);

        LoxFunction::new(
            Rc::clone(&self.declaration),
            environment,
            self.is_initializer,
        )
    }

    /// The bound receiver of an initializer.
    fn this(&self) -> Value {
        Environment::get_at(&self.closure, 0, "this").unwrap_or(Value::Nil)
    }
}

impl fmt::Debug for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

impl Callable for LoxFunction {
    fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, RuntimeError> {
        debug!("Calling user-defined function '{}'", self.name());

        let environment: EnvRef = Environment::child_of(&self.closure);

        {
            let mut scope = environment.borrow_mut();
            for (param, argument) in self.declaration.params.iter().zip(arguments) {
                scope.define(&param.lexeme, argument);
            }
        }

        let flow: Flow = interpreter.execute_block(&self.declaration.body, environment)?;

        if self.is_initializer {
            return Ok(self.this());
        }

        match flow {
            Flow::Return(value) => Ok(value),
            Flow::Normal | Flow::Break | Flow::Continue => Ok(Value::Nil),
        }
    }
}
