//! Static resolver pass.
//!
//! This resolver does three things in one AST walk:
//! 1. Build lexical scopes (stack of `HashMap<&str,bool>` tracking declared/defined).
//! 2. Report static errors (redeclaration, reading a local in its own
//!    initializer, misplaced `return`/`this`/`super`/`break`/`continue`).
//! 3. Tell the interpreter, for *each* local variable occurrence, how many
//!    scopes away its declaration lives.  Anything not found is a global and
//!    gets no entry.
//!
//! Errors go to the [`Reporter`]; the walk always finishes so a single pass
//! reports every independent fault.

use crate::ast::{Expr, ExprId, FunctionDecl, Stmt};
use crate::error::Reporter;
use crate::interpreter::Interpreter;
use crate::token::Token;
use log::{debug, info};
use std::collections::HashMap;
use std::rc::Rc;

/// What kind of function body are we in?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
    Initializer,
}

/// Used to validate `this` and `super`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ClassType {
    None,
    Class,
    Subclass,
}

/// Resolver: tracks scopes, enforces static rules, and *records* binding
/// distances by calling back into the interpreter.
pub struct Resolver<'a, 'i, 'r> {
    interpreter: &'i mut Interpreter,
    reporter: &'r mut dyn Reporter,
    scopes: Vec<HashMap<&'a str, bool>>, // false=declared, true=defined
    current_function: FunctionType,
    current_class: ClassType,
    loop_depth: usize,
}

impl<'a, 'i, 'r> Resolver<'a, 'i, 'r> {
    /// Create a new resolver bound to the given interpreter.
    pub fn new(interpreter: &'i mut Interpreter, reporter: &'r mut dyn Reporter) -> Self {
        info!("Resolver instantiated");

        Resolver {
            interpreter,
            reporter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_class: ClassType::None,
            loop_depth: 0,
        }
    }

    /// Walk all top‑level statements.
    pub fn resolve(&mut self, statements: &'a [Stmt]) {
        info!(
            "Beginning resolve pass over {} statement(s)",
            statements.len()
        );

        for stmt in statements {
            self.resolve_stmt(stmt);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::Var { name, initializer } => {
                // declare → resolve initializer → define
                self.declare(name);
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name);
            }

            Stmt::Function(decl) => {
                // the name is visible inside its own body, for recursion
                self.declare(&decl.name);
                self.define(&decl.name);
                self.resolve_function(decl, FunctionType::Function);
            }

            Stmt::Class {
                name,
                superclass,
                methods,
            } => self.resolve_class(name, superclass.as_ref(), methods),

            Stmt::Expression(expr) | Stmt::Print(expr) => {
                self.resolve_expr(expr);
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While {
                condition,
                body,
                increment,
            } => {
                self.resolve_expr(condition);

                self.loop_depth += 1;
                self.resolve_stmt(body);
                self.loop_depth -= 1;

                if let Some(inc) = increment {
                    self.resolve_expr(inc);
                }
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.error(keyword, "Can't return from top-level code.");
                }

                if let Some(expr) = value {
                    if self.current_function == FunctionType::Initializer {
                        self.error(keyword, "Can't return a value from an initializer.");
                    }

                    self.resolve_expr(expr);
                }
            }

            Stmt::Break(keyword) => {
                if self.loop_depth == 0 {
                    self.error(keyword, "Can't use 'break' outside of a loop.");
                }
            }

            Stmt::Continue(keyword) => {
                if self.loop_depth == 0 {
                    self.error(keyword, "Can't use 'continue' outside of a loop.");
                }
            }
        }
    }

    fn resolve_class(
        &mut self,
        name: &'a Token,
        superclass: Option<&'a Expr>,
        methods: &'a [Rc<FunctionDecl>],
    ) {
        debug!("Resolving class '{}'", name.lexeme);

        let enclosing_class = self.current_class;
        self.current_class = ClassType::Class;

        self.declare(name);
        self.define(name);

        if let Some(superclass) = superclass {
            if let Expr::Variable { name: super_name, .. } = superclass {
                if super_name.lexeme == name.lexeme {
                    self.error(super_name, "A class can't inherit from itself.");
                }
            }

            self.current_class = ClassType::Subclass;
            self.resolve_expr(superclass);

            self.begin_scope();
            self.bind_implicit("super");
        }

        self.begin_scope();
        self.bind_implicit("this");

        for method in methods {
            let kind = if method.name.lexeme == "init" {
                FunctionType::Initializer
            } else {
                FunctionType::Method
            };

            self.resolve_function(method, kind);
        }

        self.end_scope();

        if superclass.is_some() {
            self.end_scope();
        }

        self.current_class = enclosing_class;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Literal(_) => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable { id, name } => {
                // Only consult the innermost scope when one is open.
                if let Some(scope) = self.scopes.last() {
                    if scope.get(name.lexeme.as_str()) == Some(&false) {
                        self.error(name, "Can't read local variable in its own initializer.");
                    }
                }

                self.resolve_local(*id, name);
            }

            Expr::Assign { id, name, value } => {
                // First resolve RHS, then bind LHS
                self.resolve_expr(value);
                self.resolve_local(*id, name);
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(value);
                self.resolve_expr(object);
            }

            Expr::This { id, keyword } => {
                if self.current_class == ClassType::None {
                    self.error(keyword, "Can't use 'this' outside of a class.");
                    return;
                }

                self.resolve_local(*id, keyword);
            }

            Expr::Super { id, keyword, .. } => {
                match self.current_class {
                    ClassType::None => {
                        self.error(keyword, "Can't use 'super' outside of a class.");
                    }
                    ClassType::Class => {
                        self.error(keyword, "Can't use 'super' in a class with no superclass.");
                    }
                    ClassType::Subclass => {}
                }

                self.resolve_local(*id, keyword);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Function helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Enter a fresh scope for a function’s parameters + body.  Loops do
    /// not extend across the function boundary.
    fn resolve_function(&mut self, decl: &'a FunctionDecl, kind: FunctionType) {
        let enclosing_function = self.current_function;
        let enclosing_loops = self.loop_depth;
        self.current_function = kind;
        self.loop_depth = 0;

        self.begin_scope();
        for param in &decl.params {
            self.declare(param);
            self.define(param);
        }
        for stmt in &decl.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing_function;
        self.loop_depth = enclosing_loops;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &'a Token) {
        let Some(scope) = self.scopes.last_mut() else {
            return; // globals may be redeclared
        };

        if scope.contains_key(name.lexeme.as_str()) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }

        scope.insert(&name.lexeme, false);
    }

    fn define(&mut self, name: &'a Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(&name.lexeme, true);
        }
    }

    /// Binds `this` / `super` in the innermost scope.
    fn bind_implicit(&mut self, name: &'static str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name, true);
        }
    }

    fn error(&mut self, token: &Token, message: &str) {
        debug!("Resolve error at line {}: {}", token.line, message);

        self.reporter.resolve_error(token, message);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Binding‑distance helper
    // ─────────────────────────────────────────────────────────────────────────

    /// Record this occurrence as a local at depth `d`, or leave it
    /// unrecorded (global) if no scope declares it.
    fn resolve_local(&mut self, id: ExprId, name: &Token) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(name.lexeme.as_str()) {
                debug!("Resolved '{}' at depth {}", name.lexeme, depth);
                self.interpreter.note_local(id, depth);
                return;
            }
        }

        debug!("Resolved '{}' as global", name.lexeme);
    }
}
