//! Tree‑walking evaluator.
//!
//! Statements run against a chain of [`Environment`]s.  Variable references
//! the resolver recorded in `locals` are fetched at a fixed distance; every
//! other reference goes straight to the globals.
//!
//! Non‑local exits (`return`, `break`, `continue`) travel as [`Flow`] values
//! on the success channel, so `Err` always means a genuine [`RuntimeError`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::callable::{LoxFunction, NATIVES};
use crate::class::{LoxClass, LoxInstance};
use crate::environment::{EnvRef, Environment};
use crate::error::{Reporter, RuntimeError};
use crate::token::{Token, TokenType};
use crate::value::Value;

/// Host stack reserved per nested Lox call.  Covers the evaluator frames
/// between two calls in an unoptimised build, with headroom for nested
/// expressions.
pub const STACK_BYTES_PER_CALL: usize = 64 * 1024;

/// Host stack the default call depth is sized for.
pub const DEFAULT_STACK_SIZE: usize = 256 * 1024 * 1024;

/// Call depth at which a `Stack overflow.` runtime error is raised, for a
/// thread with [`DEFAULT_STACK_SIZE`] bytes of stack.
pub const DEFAULT_MAX_CALL_DEPTH: usize = max_call_depth_for_stack(DEFAULT_STACK_SIZE);

/// Deepest call nesting that fits in `stack_size` bytes of host stack.
pub const fn max_call_depth_for_stack(stack_size: usize) -> usize {
    let depth = stack_size / STACK_BYTES_PER_CALL;

    if depth == 0 {
        1
    } else {
        depth
    }
}

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

/// Convenient alias for interpreter results.
pub type IResult<T> = Result<T, RuntimeError>;

pub struct Interpreter {
    globals: EnvRef,
    environment: EnvRef,
    locals: HashMap<ExprId, usize>,
    out: Box<dyn Write>,
    call_depth: usize,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter printing to stdout, with natives such as
    /// `clock` defined.
    ///
    /// The call-depth limit assumes the caller runs on a thread with at least
    /// [`DEFAULT_STACK_SIZE`] bytes of stack.  On a smaller stack, lower it
    /// with [`set_max_call_depth`](Self::set_max_call_depth) and
    /// [`max_call_depth_for_stack`], or deep recursion aborts the process.
    pub fn new() -> Self {
        Self::with_output(Box::new(io::stdout()))
    }

    /// Creates an interpreter whose `print` output goes to `out`.  The same
    /// stack requirement as [`new`](Self::new) applies.
    pub fn with_output(out: Box<dyn Write>) -> Self {
        info!("Initializing Interpreter");

        let globals: EnvRef = Rc::new(RefCell::new(Environment::new()));

        for native in NATIVES.iter() {
            debug!("Defining native function '{}'", native.name);

            globals.borrow_mut().define(native.name, Value::Native(native));
        }

        Self {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            out,
            call_depth: 0,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Overrides the call depth limit.
    pub fn set_max_call_depth(&mut self, depth: usize) {
        self.max_call_depth = depth;
    }

    /// Records that the variable node `id` resolves `depth` scopes up.
    ///
    /// Entries are never removed: a closure created by an earlier run keeps
    /// its body's node ids, so the table grows with every REPL line.
    pub fn note_local(&mut self, id: ExprId, depth: usize) {
        self.locals.insert(id, depth);
    }

    /// Executes a program.  The first runtime error is reported and stops
    /// this statement list; the globals survive for the next call.
    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut dyn Reporter) {
        debug!("Interpreting {} statements", statements.len());

        for stmt in statements {
            if let Err(e) = self.execute(stmt) {
                debug!("Runtime error: {}", e);

                self.flush();
                reporter.runtime_error(&e);
                return;
            }
        }

        self.flush();

        info!("Interpretation completed successfully");
    }

    fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            warn!("Failed to flush output: {}", e);
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statements
    // ─────────────────────────────────────────────────────────────────────

    /// Executes a single statement.
    pub fn execute(&mut self, stmt: &Stmt) -> IResult<Flow> {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;

                if let Err(e) = writeln!(self.out, "{}", value) {
                    warn!("Failed to write print output: {}", e);
                }

                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                debug!("Defining variable '{}' = {}", name.lexeme, value);

                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                let environment = Environment::child_of(&self.environment);
                self.execute_block(statements, environment)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.execute(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    self.execute(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                while self.evaluate(condition)?.is_truthy() {
                    match self.execute(body)? {
                        Flow::Break => break,
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Normal | Flow::Continue => {}
                    }

                    if let Some(incr) = increment {
                        self.evaluate(incr)?;
                    }
                }

                Ok(Flow::Normal)
            }

            Stmt::Function(decl) => {
                debug!("Defining function '{}'", decl.name.lexeme);

                // Closes over the *current* scope, not the globals.
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&self.environment), false);

                self.environment
                    .borrow_mut()
                    .define(&decl.name.lexeme, Value::Function(Rc::new(function)));
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };

                Ok(Flow::Return(value))
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.execute_class(name, superclass.as_ref(), methods),

            Stmt::Break(_) => Ok(Flow::Break),

            Stmt::Continue(_) => Ok(Flow::Continue),
        }
    }

    /// Runs `statements` in `environment`, restoring the previous
    /// environment on every exit path.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: EnvRef) -> IResult<Flow> {
        let previous: EnvRef = mem::replace(&mut self.environment, environment);

        let result = self.execute_all(statements);

        self.environment = previous;
        result
    }

    fn execute_all(&mut self, statements: &[Stmt]) -> IResult<Flow> {
        for stmt in statements {
            match self.execute(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }

        Ok(Flow::Normal)
    }

    fn execute_class(
        &mut self,
        name: &Token,
        superclass: Option<&Expr>,
        methods: &[Rc<FunctionDecl>],
    ) -> IResult<Flow> {
        debug!("Defining class '{}'", name.lexeme);

        let superclass: Option<Rc<LoxClass>> = match superclass {
            Some(expr) => match self.evaluate(expr)? {
                Value::Class(class) => Some(class),
                _ => {
                    let token = match expr {
                        Expr::Variable { name: super_name, .. } => super_name,
                        _ => name,
                    };

                    return Err(RuntimeError::new(token, "Superclass must be a class."));
                }
            },
            None => None,
        };

        self.environment.borrow_mut().define(&name.lexeme, Value::Nil);

        // Methods of a subclass see `super` one scope above `this`.
        let method_env: EnvRef = match &superclass {
            Some(class) => {
                let env = Environment::child_of(&self.environment);
                env.borrow_mut().define("super", Value::Class(Rc::clone(class)));
                env
            }
            None => Rc::clone(&self.environment),
        };

        let methods: HashMap<String, LoxFunction> = methods
            .iter()
            .map(|decl| {
                let is_init = decl.name.lexeme == "init";
                let function = LoxFunction::new(Rc::clone(decl), Rc::clone(&method_env), is_init);
                (decl.name.lexeme.clone(), function)
            })
            .collect();

        let class = LoxClass::new(name.lexeme.clone(), superclass, methods);

        self.environment
            .borrow_mut()
            .define(&name.lexeme, Value::Class(Rc::new(class)));

        Ok(Flow::Normal)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Expressions
    // ─────────────────────────────────────────────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> IResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::Str(s) => Value::String(s.clone()),
                LiteralValue::True => Value::Bool(true),
                LiteralValue::False => Value::Bool(false),
                LiteralValue::Nil => Value::Nil,
            }),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right),

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right),

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left_val = self.evaluate(left)?;

                let short_circuit = if operator.token_type == TokenType::OR {
                    left_val.is_truthy()
                } else {
                    !left_val.is_truthy()
                };

                if short_circuit {
                    Ok(left_val)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;

                match self.locals.get(id) {
                    Some(&distance) => {
                        if !Environment::assign_at(&self.environment, distance, &name.lexeme, value.clone()) {
                            return Err(RuntimeError::new(
                                name,
                                format!("Undefined variable '{}'.", name.lexeme),
                            ));
                        }
                    }
                    None => self.globals.borrow_mut().assign(name, value.clone())?,
                }

                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee_val = self.evaluate(callee)?;

                let mut arg_values = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    arg_values.push(self.evaluate(arg)?);
                }

                self.call_value(&callee_val, paren, arg_values)
            }

            Expr::Get { object, name } => match self.evaluate(object)? {
                Value::Instance(instance) => LoxInstance::get(&instance, name),
                _ => Err(RuntimeError::new(name, "Only instances have properties.")),
            },

            Expr::Set {
                object,
                name,
                value,
            } => {
                let Value::Instance(instance) = self.evaluate(object)? else {
                    return Err(RuntimeError::new(name, "Only instances have fields."));
                };

                let value = self.evaluate(value)?;
                instance.borrow_mut().set(name, value.clone());

                Ok(value)
            }

            Expr::This { id, keyword } => self.look_up_variable(*id, keyword),

            Expr::Super {
                id,
                keyword,
                method,
            } => self.evaluate_super(*id, keyword, method),
        }
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> IResult<Value> {
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right_val {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(RuntimeError::new(operator, "Operand must be a number.")),
            },

            TokenType::BANG => Ok(Value::Bool(!right_val.is_truthy())),

            _ => Err(RuntimeError::new(operator, "Invalid unary operator.")),
        }
    }

    fn evaluate_binary(&mut self, left: &Expr, operator: &Token, right: &Expr) -> IResult<Value> {
        let left_val = self.evaluate(left)?;
        let right_val = self.evaluate(right)?;

        match operator.token_type {
            TokenType::EQUAL_EQUAL => return Ok(Value::Bool(left_val == right_val)),
            TokenType::BANG_EQUAL => return Ok(Value::Bool(left_val != right_val)),

            TokenType::PLUS => {
                return match (left_val, right_val) {
                    (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
                    (Value::String(a), Value::String(b)) => Ok(Value::String(a + &b)),
                    _ => Err(RuntimeError::new(
                        operator,
                        "Operands must be two numbers or two strings.",
                    )),
                };
            }

            _ => {}
        }

        let (Value::Number(a), Value::Number(b)) = (&left_val, &right_val) else {
            return Err(RuntimeError::new(operator, "Operands must be numbers."));
        };
        let (a, b) = (*a, *b);

        match operator.token_type {
            TokenType::MINUS => Ok(Value::Number(a - b)),
            TokenType::STAR => Ok(Value::Number(a * b)),
            TokenType::SLASH => Ok(Value::Number(a / b)),
            TokenType::GREATER => Ok(Value::Bool(a > b)),
            TokenType::GREATER_EQUAL => Ok(Value::Bool(a >= b)),
            TokenType::LESS => Ok(Value::Bool(a < b)),
            TokenType::LESS_EQUAL => Ok(Value::Bool(a <= b)),
            _ => Err(RuntimeError::new(operator, "Invalid binary operator.")),
        }
    }

    fn evaluate_super(&mut self, id: ExprId, keyword: &Token, method: &Token) -> IResult<Value> {
        let distance: usize = *self
            .locals
            .get(&id)
            .ok_or_else(|| RuntimeError::new(keyword, "Can't use 'super' outside of a class."))?;

        let Some(Value::Class(superclass)) = Environment::get_at(&self.environment, distance, "super")
        else {
            return Err(RuntimeError::new(keyword, "Superclass must be a class."));
        };

        // `this` is always bound exactly one scope nearer than `super`.
        let object: Value = distance
            .checked_sub(1)
            .and_then(|d| Environment::get_at(&self.environment, d, "this"))
            .ok_or_else(|| RuntimeError::new(keyword, "Can't use 'super' outside of a method."))?;

        match superclass.find_method(&method.lexeme) {
            Some(function) => Ok(Value::Function(Rc::new(function.bind(object)))),

            None => Err(RuntimeError::new(
                method,
                format!("Undefined property '{}'.", method.lexeme),
            )),
        }
    }

    fn look_up_variable(&self, id: ExprId, name: &Token) -> IResult<Value> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, &name.lexeme)
                .ok_or_else(|| {
                    RuntimeError::new(name, format!("Undefined variable '{}'.", name.lexeme))
                }),

            None => self.globals.borrow().get(name),
        }
    }

    /// Checks the callable capability and arity, then delegates.
    fn call_value(&mut self, callee: &Value, paren: &Token, arguments: Vec<Value>) -> IResult<Value> {
        let Some(callable) = callee.as_callable() else {
            return Err(RuntimeError::new(
                paren,
                "Can only call functions and classes.",
            ));
        };

        if arguments.len() != callable.arity() {
            return Err(RuntimeError::new(
                paren,
                format!(
                    "Expected {} arguments but got {}.",
                    callable.arity(),
                    arguments.len()
                ),
            ));
        }

        if self.call_depth >= self.max_call_depth {
            return Err(RuntimeError::new(paren, "Stack overflow."));
        }

        debug!("Calling '{}' with {} arguments", callable.name(), arguments.len());

        self.call_depth += 1;
        let result = callable.call(self, arguments);
        self.call_depth -= 1;

        result
    }
}
