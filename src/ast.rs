//! Abstract syntax tree shared by the parser, resolver and interpreter.
//!
//! Nodes are immutable once built.  The resolver's scope depths are kept in a
//! side table keyed by [`ExprId`], which every node that names a variable
//! (`Variable`, `Assign`, `This`, `Super`) carries.

use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::token::Token;

/// Identity of a variable‑referencing expression node.
///
/// Ids are drawn from one process‑wide counter so nodes parsed from different
/// REPL lines never collide in an interpreter's resolution table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        static NEXT: AtomicUsize = AtomicUsize::new(0);

        ExprId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A **literal constant** that appears directly in the source code.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    /// Integral lexemes such as `"3"` are still stored as `3.0`.
    Number(f64),

    /// String literal without surrounding quotes.
    Str(String),

    True,

    False,

    Nil,
}

/// Every kind of *expression* in Lox.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(LiteralValue),

    /// Parenthesised sub‑expression: `"(" expression ")"`.
    Grouping(Box<Expr>),

    /// Prefix operator, `!isReady` or `-42`.
    Unary {
        operator: Token,
        right: Box<Expr>,
    },

    /// Infix arithmetic, comparison or equality operator.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short‑circuiting `and` / `or`.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    Variable {
        id: ExprId,
        name: Token,
    },

    /// `identifier "=" expression`
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    Call {
        callee: Box<Expr>,
        /// The closing `)`, kept for error locations.
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// object.property
    Get {
        object: Box<Expr>,
        name: Token,
    },

    /// object.property = value
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    This {
        id: ExprId,
        keyword: Token,
    },

    /// `super.method`
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}

impl Expr {
    /// Build a variable reference with a fresh identity.
    pub fn variable(name: Token) -> Self {
        Expr::Variable {
            id: ExprId::fresh(),
            name,
        }
    }
}

/// A function or method declaration.  Shared (`Rc`) between the statement
/// tree and every runtime function value created from it.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    pub name: Token,

    /// Parameter name tokens (arity ≤ 255).
    pub params: Vec<Token>,

    pub body: Vec<Stmt>,
}

/// Executable constructs.  A program is a sequence of these nodes returned
/// by [`Parser::parse`](crate::parser::Parser::parse).
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Stand‑alone expression terminated by a semicolon.
    Expression(Expr),

    Print(Expr),

    /// `"var" IDENT ("=" initializer)? ";"`
    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    /// `while` loop.  `for` loops desugar into this node; their increment
    /// clause is kept apart from the body so `continue` still runs it.
    While {
        condition: Expr,
        body: Box<Stmt>,
        increment: Option<Expr>,
    },

    Function(Rc<FunctionDecl>),

    Return {
        /// The `return` keyword token (for error locations).
        keyword: Token,

        /// Absent ⇒ `nil` is returned.
        value: Option<Expr>,
    },

    Class {
        name: Token,

        /// Always an `Expr::Variable` when present.
        superclass: Option<Expr>,

        methods: Vec<Rc<FunctionDecl>>,
    },

    Break(Token),

    Continue(Token),
}
