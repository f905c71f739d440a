use log::trace;
use std::fmt;

/// The different kinds of tokens recognized by the Lox scanner.
///
/// Literal payloads live on [`Token::literal`], so the kind itself is a plain
/// tag that can be copied, compared and hashed freely.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenType {
    /// '('
    LEFT_PAREN,

    /// ')'
    RIGHT_PAREN,

    /// '{'
    LEFT_BRACE,

    /// '}'
    RIGHT_BRACE,

    /// ','
    COMMA,

    /// '.'
    DOT,

    /// '-'
    MINUS,

    /// '+'
    PLUS,

    /// ';'
    SEMICOLON,

    /// '/'
    SLASH,

    /// '*'
    STAR,

    /// '!'
    BANG,

    /// '!='
    BANG_EQUAL,

    /// '='
    EQUAL,

    /// '=='
    EQUAL_EQUAL,

    /// '>'
    GREATER,

    /// '>='
    GREATER_EQUAL,

    /// '<'
    LESS,

    /// '<='
    LESS_EQUAL,

    /// A user‑defined identifier
    IDENTIFIER,

    /// A string literal
    STRING,

    /// A numeric literal
    NUMBER,

    AND,
    BREAK,
    CLASS,
    CONTINUE,
    ELSE,
    FALSE,
    FUN,
    FOR,
    IF,
    NIL,
    OR,
    PRINT,
    RETURN,
    SUPER,
    THIS,
    TRUE,
    VAR,
    WHILE,

    /// End‑of‑file marker
    EOF,
}

impl TokenType {
    /// Upper-case name used by the `tokenize` listing.
    pub fn name(self) -> &'static str {
        match self {
            TokenType::LEFT_PAREN => "LEFT_PAREN",
            TokenType::RIGHT_PAREN => "RIGHT_PAREN",
            TokenType::LEFT_BRACE => "LEFT_BRACE",
            TokenType::RIGHT_BRACE => "RIGHT_BRACE",
            TokenType::COMMA => "COMMA",
            TokenType::DOT => "DOT",
            TokenType::MINUS => "MINUS",
            TokenType::PLUS => "PLUS",
            TokenType::SEMICOLON => "SEMICOLON",
            TokenType::SLASH => "SLASH",
            TokenType::STAR => "STAR",
            TokenType::BANG => "BANG",
            TokenType::BANG_EQUAL => "BANG_EQUAL",
            TokenType::EQUAL => "EQUAL",
            TokenType::EQUAL_EQUAL => "EQUAL_EQUAL",
            TokenType::GREATER => "GREATER",
            TokenType::GREATER_EQUAL => "GREATER_EQUAL",
            TokenType::LESS => "LESS",
            TokenType::LESS_EQUAL => "LESS_EQUAL",
            TokenType::IDENTIFIER => "IDENTIFIER",
            TokenType::STRING => "STRING",
            TokenType::NUMBER => "NUMBER",
            TokenType::AND => "AND",
            TokenType::BREAK => "BREAK",
            TokenType::CLASS => "CLASS",
            TokenType::CONTINUE => "CONTINUE",
            TokenType::ELSE => "ELSE",
            TokenType::FALSE => "FALSE",
            TokenType::FUN => "FUN",
            TokenType::FOR => "FOR",
            TokenType::IF => "IF",
            TokenType::NIL => "NIL",
            TokenType::OR => "OR",
            TokenType::PRINT => "PRINT",
            TokenType::RETURN => "RETURN",
            TokenType::SUPER => "SUPER",
            TokenType::THIS => "THIS",
            TokenType::TRUE => "TRUE",
            TokenType::VAR => "VAR",
            TokenType::WHILE => "WHILE",
            TokenType::EOF => "EOF",
        }
    }
}

/// Literal value carried by `NUMBER` and `STRING` tokens.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    /// Every numeric literal is a double, even `3`.
    Number(f64),

    /// String contents without the surrounding quotes.
    Str(String),
}

/// A scanned token, including its type, the original lexeme, its literal
/// value (if any) and the line number where it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The category of this token.
    pub token_type: TokenType,

    /// The exact substring from the source that produced this token.
    pub lexeme: String,

    /// Parsed literal for numbers and strings.
    pub literal: Option<Literal>,

    /// 1‑based line number in the source.
    pub line: usize,
}

impl Token {
    /// Create a new Token with the given type, lexeme, literal and line.
    pub fn new(
        token_type: TokenType,
        lexeme: impl Into<String>,
        literal: Option<Literal>,
        line: usize,
    ) -> Self {
        let lexeme: String = lexeme.into();

        trace!(
            "Creating new token: type={:?}, lexeme={}, line={}",
            token_type,
            lexeme,
            line
        );

        Self {
            token_type,
            lexeme,
            literal,
            line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ", self.token_type.name(), self.lexeme)?;

        match &self.literal {
            Some(Literal::Str(s)) => write!(f, "{}", s),

            // 3 → "3.0", 3.14 → "3.14"
            Some(Literal::Number(n)) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => {
                let mut buf: itoa::Buffer = itoa::Buffer::new();
                write!(f, "{}.0", buf.format(*n as i64))
            }

            Some(Literal::Number(n)) => write!(f, "{}", n),

            None => write!(f, "null"),
        }
    }
}
