//! Streaming lexer for Lox source text.
//!
//! [`Scanner`] is an iterator of `Result<Token, LoxError>`: a lexical fault
//! comes out as an `Err` item and scanning resumes on the next character.
//! The stream always finishes with a single `EOF` token, after which the
//! iterator stays exhausted.
//!
//! Parsing code normally wants the collected form, [`Scanner::scan_tokens`],
//! which forwards every fault to a [`Reporter`]:
//!
//! ```rust
//! use rox::error::BufferedReporter;
//! use rox::scanner::Scanner;
//!
//! let mut reporter = BufferedReporter::new();
//! let tokens = Scanner::new("print 123; // example").scan_tokens(&mut reporter);
//! assert_eq!(tokens.len(), 4);
//! ```
//!
//! Numbers are always `f64`; a trailing `.` without digits is a separate
//! `DOT`.  Strings may span lines and carry no escapes.

use std::iter::FusedIterator;

use log::{debug, info};
use memchr::memchr;
use phf::phf_map;

use crate::error::{LoxError, Reporter, Result};
use crate::token::{Literal, Token, TokenType};

/// Reserved words, looked up once an identifier lexeme is complete.
static KEYWORDS: phf::Map<&'static str, TokenType> = phf_map! {
    "and"      => TokenType::AND,
    "break"    => TokenType::BREAK,
    "class"    => TokenType::CLASS,
    "continue" => TokenType::CONTINUE,
    "else"     => TokenType::ELSE,
    "false"    => TokenType::FALSE,
    "fun"      => TokenType::FUN,
    "for"      => TokenType::FOR,
    "if"       => TokenType::IF,
    "nil"      => TokenType::NIL,
    "or"       => TokenType::OR,
    "print"    => TokenType::PRINT,
    "return"   => TokenType::RETURN,
    "super"    => TokenType::SUPER,
    "this"     => TokenType::THIS,
    "true"     => TokenType::TRUE,
    "var"      => TokenType::VAR,
    "while"    => TokenType::WHILE,
};

/// What one call to [`Scanner::lex_one`] found.
enum Lexeme {
    Token(TokenType, Option<Literal>),

    /// Whitespace, newline or comment.
    Skip,
}

/// Lexer over a borrowed source string.  `start..pos` is the lexeme being
/// built; both are byte offsets on char boundaries.
pub struct Scanner<'a> {
    src: &'a str,
    start: usize,
    pos: usize,
    line: usize,
    done: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        info!("Scanner created over {} bytes", src.len());

        Self {
            src,
            start: 0,
            pos: 0,
            line: 1,
            done: false,
        }
    }

    /// Scan the whole input, reporting every lexical error and returning the
    /// tokens that were recognised.  The result always ends with `EOF`.
    pub fn scan_tokens(self, reporter: &mut dyn Reporter) -> Vec<Token> {
        let mut tokens: Vec<Token> = Vec::new();

        for result in self {
            match result {
                Ok(token) => tokens.push(token),

                Err(e) => {
                    debug!("Lex error: {}", e);

                    reporter.report(e);
                }
            }
        }

        info!("Scanned {} tokens", tokens.len());

        tokens
    }

    fn rest(&self) -> &'a [u8] {
        &self.src.as_bytes()[self.pos..]
    }

    /// Byte `ahead` positions past the cursor, `0` beyond the input.
    #[inline(always)]
    fn byte_at(&self, ahead: usize) -> u8 {
        self.rest().get(ahead).copied().unwrap_or(0)
    }

    #[inline(always)]
    fn bump(&mut self) -> u8 {
        let b = self.byte_at(0);
        self.pos += 1;
        b
    }

    /// Consumes the next byte only when it equals `expected`.
    #[inline(always)]
    fn bump_if(&mut self, expected: u8) -> bool {
        let hit = self.pos < self.src.len() && self.byte_at(0) == expected;
        if hit {
            self.pos += 1;
        }
        hit
    }

    /// `double` if the next byte is `=`, else `single`.
    fn with_equals(&mut self, double: TokenType, single: TokenType) -> Lexeme {
        let tt = if self.bump_if(b'=') { double } else { single };
        Lexeme::Token(tt, None)
    }

    fn lex_one(&mut self) -> Result<Lexeme> {
        let simple = |tt: TokenType| -> Result<Lexeme> { Ok(Lexeme::Token(tt, None)) };

        match self.bump() {
            b'(' => simple(TokenType::LEFT_PAREN),
            b')' => simple(TokenType::RIGHT_PAREN),
            b'{' => simple(TokenType::LEFT_BRACE),
            b'}' => simple(TokenType::RIGHT_BRACE),
            b',' => simple(TokenType::COMMA),
            b'.' => simple(TokenType::DOT),
            b'-' => simple(TokenType::MINUS),
            b'+' => simple(TokenType::PLUS),
            b';' => simple(TokenType::SEMICOLON),
            b'*' => simple(TokenType::STAR),

            b'!' => Ok(self.with_equals(TokenType::BANG_EQUAL, TokenType::BANG)),
            b'=' => Ok(self.with_equals(TokenType::EQUAL_EQUAL, TokenType::EQUAL)),
            b'<' => Ok(self.with_equals(TokenType::LESS_EQUAL, TokenType::LESS)),
            b'>' => Ok(self.with_equals(TokenType::GREATER_EQUAL, TokenType::GREATER)),

            b'/' => {
                if !self.bump_if(b'/') {
                    return simple(TokenType::SLASH);
                }

                // The newline stays unread so the line count is bumped below.
                self.pos += memchr(b'\n', self.rest()).unwrap_or(self.rest().len());
                Ok(Lexeme::Skip)
            }

            b' ' | b'\r' | b'\t' => Ok(Lexeme::Skip),

            b'\n' => {
                self.line += 1;
                Ok(Lexeme::Skip)
            }

            b'"' => self.string(),

            b'0'..=b'9' => Ok(self.number()),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => Ok(self.identifier()),

            _ => {
                let c: char = self.src[self.start..].chars().next().unwrap_or('\u{FFFD}');
                self.pos = self.start + c.len_utf8();

                Err(LoxError::lex(
                    self.line,
                    format!("Unexpected character: '{}'.", c),
                ))
            }
        }
    }

    /// Opening quote already consumed.
    fn string(&mut self) -> Result<Lexeme> {
        let Some(len) = memchr(b'"', self.rest()) else {
            self.line += self.rest().iter().filter(|&&b| b == b'\n').count();
            self.pos = self.src.len();

            return Err(LoxError::lex(self.line, "Unterminated string."));
        };

        let body: &str = &self.src[self.pos..self.pos + len];
        self.line += body.bytes().filter(|&b| b == b'\n').count();
        self.pos += len + 1;

        Ok(Lexeme::Token(
            TokenType::STRING,
            Some(Literal::Str(body.to_owned())),
        ))
    }

    fn skip_digits(&mut self) {
        while self.byte_at(0).is_ascii_digit() {
            self.pos += 1;
        }
    }

    fn number(&mut self) -> Lexeme {
        self.skip_digits();

        if self.byte_at(0) == b'.' && self.byte_at(1).is_ascii_digit() {
            self.pos += 1;
            self.skip_digits();
        }

        // digits with at most one inner '.', always a valid f64
        let value: f64 = self.src[self.start..self.pos].parse().unwrap_or(0.0);

        Lexeme::Token(TokenType::NUMBER, Some(Literal::Number(value)))
    }

    fn identifier(&mut self) -> Lexeme {
        while matches!(self.byte_at(0), b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_') {
            self.pos += 1;
        }

        let text: &str = &self.src[self.start..self.pos];
        let tt = KEYWORDS.get(text).copied().unwrap_or(TokenType::IDENTIFIER);

        Lexeme::Token(tt, None)
    }
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while self.pos < self.src.len() {
            self.start = self.pos;

            match self.lex_one() {
                Ok(Lexeme::Skip) => {}

                Ok(Lexeme::Token(tt, literal)) => {
                    debug!("Scanned token ({:?}) on line {}", tt, self.line);

                    let lexeme: &str = &self.src[self.start..self.pos];
                    return Some(Ok(Token::new(tt, lexeme, literal, self.line)));
                }

                Err(e) => return Some(Err(e)),
            }
        }

        self.done = true;
        Some(Ok(Token::new(TokenType::EOF, "", None, self.line)))
    }
}

impl<'a> FusedIterator for Scanner<'a> {}
