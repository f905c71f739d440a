/*!
Recursive‑descent parser producing the statement list the resolver and
interpreter walk.

Time is Θ(n) in the number of tokens: every production consumes tokens
through `advance()` and error recovery (`synchronize()`) only skips forward.

### Logging Policy

| Location                     | Level  | Purpose                                   |
|------------------------------|--------|-------------------------------------------|
| `Parser::new`, `parse`       | `info` | Lifecycle milestones.                     |
| `declaration`, `statement`   | `debug`| High‑level descent into grammar branches. |
| Error paths (`error`)        | `debug`| Context before reporting.                 |

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT ( "<" IDENT )? "{" function* "}" ;
funDecl        → "fun" function ;
function       → IDENT "(" parameters? ")" block ;
varDecl        → "var" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | forStmt | ifStmt | printStmt | returnStmt
               | whileStmt | breakStmt | continueStmt | block ;
forStmt        → "for" "(" ( varDecl | exprStmt | ";" )
                 expression? ";" expression? ")" statement ;
breakStmt      → "break" ";" ;
continueStmt   → "continue" ";" ;
block          → "{" declaration* "}" ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | logic_or ;
logic_or       → logic_and ( "or" logic_and )* ;
logic_and      → equality  ( "and" equality )* ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | IDENT | "(" expression ")" | "super" "." IDENT ;
```

`for` has no node of its own: it is desugared into a `While` wrapped in a
block holding the initializer.
*/

use std::rc::Rc;

use crate::ast::{Expr, ExprId, FunctionDecl, LiteralValue, Stmt};
use crate::error::Reporter;
use crate::token::{Literal, Token, TokenType};

use log::{debug, info};

/// Maximum number of parameters or call arguments.
pub const MAX_ARGS: usize = 255;

/// Marker for "an error was already reported, unwind to `declaration`".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ParseError;

type ParseResult<T> = std::result::Result<T, ParseError>;

/// Top‑level parser over a scanned token list.
pub struct Parser<'r> {
    tokens: Vec<Token>,
    current: usize,
    reporter: &'r mut dyn Reporter,
}

impl<'r> Parser<'r> {
    /// Construct a new parser.  `tokens` must end with an `EOF` token, as
    /// the scanner guarantees.
    pub fn new(mut tokens: Vec<Token>, reporter: &'r mut dyn Reporter) -> Self {
        info!("Parser created with {} tokens", tokens.len());

        if tokens.last().map(|t| t.token_type) != Some(TokenType::EOF) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::new(TokenType::EOF, "", None, line));
        }

        Self {
            tokens,
            current: 0,
            reporter,
        }
    }

    // ───────────────────────── public API ─────────────────────────

    /// Parse an entire program.  Declarations that failed to parse were
    /// reported and are left out of the result.
    pub fn parse(mut self) -> Vec<Stmt> {
        info!("Beginning parse phase");

        let mut statements: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        info!("Parsed {} statements", statements.len());

        statements
    }

    // ──────────────────────── declaration rules ───────────────────

    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration at line {}", self.peek().line);

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenType::FUN) {
            self.function("function").map(|decl| Stmt::Function(Rc::new(decl)))
        } else if self.matches(TokenType::VAR) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),

            Err(ParseError) => {
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> ParseResult<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;

        let superclass: Option<Expr> = if self.matches(TokenType::LESS) {
            let super_name = self.consume(TokenType::IDENTIFIER, "Expect superclass name.")?;
            Some(Expr::variable(super_name))
        } else {
            None
        };

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<Rc<FunctionDecl>> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            methods.push(Rc::new(self.function("method")?));
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class {
            name,
            superclass,
            methods,
        })
    }

    /// `kind` is "function" or "method"; it only shapes error messages.
    fn function(&mut self, kind: &str) -> ParseResult<FunctionDecl> {
        let name: Token = self.consume(TokenType::IDENTIFIER, &format!("Expect {} name.", kind))?;

        self.consume(
            TokenType::LEFT_PAREN,
            &format!("Expect '(' after {} name.", kind),
        )?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARGS {
                    // Reported, but the declaration itself is still usable.
                    let token = self.peek().clone();
                    self.error(&token, "Can't have more than 255 parameters.");
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;

        self.consume(
            TokenType::LEFT_BRACE,
            &format!("Expect '{{' before {} body.", kind),
        )?;
        let body: Vec<Stmt> = self.block()?;

        Ok(FunctionDecl { name, params, body })
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    // ───────────────────────── statement rules ────────────────────

    fn statement(&mut self) -> ParseResult<Stmt> {
        debug!("Entering statement at line {}", self.peek().line);

        if self.matches(TokenType::FOR) {
            self.for_statement()
        } else if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::BREAK) {
            let keyword = self.previous().clone();
            self.consume(TokenType::SEMICOLON, "Expect ';' after 'break'.")?;
            Ok(Stmt::Break(keyword))
        } else if self.matches(TokenType::CONTINUE) {
            let keyword = self.previous().clone();
            self.consume(TokenType::SEMICOLON, "Expect ';' after 'continue'.")?;
            Ok(Stmt::Continue(keyword))
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    /// Parses `for (init; cond; incr) body` and desugars it to
    /// `{ init; while (cond) body incr }`.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        let keyword_line = self.previous().line;

        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'for'.")?;

        let initializer: Option<Stmt> = if self.matches(TokenType::SEMICOLON) {
            None
        } else if self.matches(TokenType::VAR) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::SEMICOLON, "Expect ';' after loop condition.")?;

        let increment: Option<Expr> = if !self.check(TokenType::RIGHT_PAREN) {
            Some(self.expression()?)
        } else {
            None
        };
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after for clauses.")?;

        let body: Stmt = self.statement()?;

        debug!("Desugaring for loop at line {}", keyword_line);

        let mut desugared = Stmt::While {
            condition: condition.unwrap_or(Expr::Literal(LiteralValue::True)),
            body: Box::new(body),
            increment,
        };

        if let Some(init) = initializer {
            desugared = Stmt::Block(vec![init, desugared]);
        }

        Ok(desugared)
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword: Token = self.previous().clone();
        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While {
            condition,
            body,
            increment: None,
        })
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    // ─────────────────────── expression rules ─────────────────────

    fn expression(&mut self) -> ParseResult<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr: Expr = self.logical_or()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Token = self.previous().clone();
            let value: Expr = self.assignment()?;

            return match expr {
                Expr::Variable { name, .. } => Ok(Expr::Assign {
                    id: ExprId::fresh(),
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                // Reported without unwinding: the parser is not confused.
                other => {
                    self.error(&equals, "Invalid assignment target.");
                    Ok(other)
                }
            };
        }

        Ok(expr)
    }

    fn logical_or(&mut self) -> ParseResult<Expr> {
        let mut expr: Expr = self.logical_and()?;

        while self.matches(TokenType::OR) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.logical_and()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn logical_and(&mut self) -> ParseResult<Expr> {
        let mut expr: Expr = self.equality()?;

        while self.matches(TokenType::AND) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.equality()?;

            expr = Expr::Logical {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    /// Shared loop for the left‑associative binary levels.
    fn binary(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> ParseResult<Expr>,
    ) -> ParseResult<Expr> {
        let mut expr: Expr = operand(self)?;

        while operators.iter().any(|&tt| self.matches(tt)) {
            let operator: Token = self.previous().clone();
            let right: Expr = operand(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        self.binary(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        self.binary(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        self.binary(&[TokenType::SLASH, TokenType::STAR], Self::unary)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous().clone();
            let right: Expr = self.unary()?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    let token = self.peek().clone();
                    self.error(&token, "Can't have more than 255 arguments.");
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.matches(TokenType::FALSE) {
            return Ok(Expr::Literal(LiteralValue::False));
        }
        if self.matches(TokenType::TRUE) {
            return Ok(Expr::Literal(LiteralValue::True));
        }
        if self.matches(TokenType::NIL) {
            return Ok(Expr::Literal(LiteralValue::Nil));
        }

        if self.matches(TokenType::NUMBER) || self.matches(TokenType::STRING) {
            let literal = match &self.previous().literal {
                Some(Literal::Number(n)) => LiteralValue::Number(*n),
                Some(Literal::Str(s)) => LiteralValue::Str(s.clone()),
                None => LiteralValue::Nil,
            };

            return Ok(Expr::Literal(literal));
        }

        if self.matches(TokenType::SUPER) {
            let keyword: Token = self.previous().clone();
            self.consume(TokenType::DOT, "Expect '.' after 'super'.")?;
            let method: Token =
                self.consume(TokenType::IDENTIFIER, "Expect superclass method name.")?;

            return Ok(Expr::Super {
                id: ExprId::fresh(),
                keyword,
                method,
            });
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This {
                id: ExprId::fresh(),
                keyword: self.previous().clone(),
            });
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::variable(self.previous().clone()));
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        let token = self.peek().clone();
        Err(self.error(&token, "Expect expression."))
    }

    // ────────────────────── utility helpers ───────────────────────

    fn error(&mut self, token: &Token, message: &str) -> ParseError {
        debug!("Parse error at line {}: {}", token.line, message);

        self.reporter.parse_error(token, message);

        ParseError
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> ParseResult<Token> {
        if self.check(ttype) {
            return Ok(self.advance().clone());
        }

        let token = self.peek().clone();
        Err(self.error(&token, message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.peek().token_type == ttype
    }

    #[inline(always)]
    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }

        self.previous()
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.peek().token_type == TokenType::EOF
    }

    #[inline(always)]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline(always)]
    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    /// Discards tokens until it thinks it is at a statement boundary.
    fn synchronize(&mut self) {
        self.advance(); // skip the token that caused the error

        while !self.is_at_end() {
            if self.previous().token_type == TokenType::SEMICOLON {
                return;
            }

            match self.peek().token_type {
                TokenType::CLASS
                | TokenType::FUN
                | TokenType::VAR
                | TokenType::FOR
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN
                | TokenType::BREAK
                | TokenType::CONTINUE => return,
                _ => {}
            }

            self.advance();
        }
    }
}
