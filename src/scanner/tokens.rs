use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Default, Eq, PartialEq, Copy, Clone)]
pub struct TokenPosition {
    pub row: usize,
    pub column: usize,
}

impl TokenPosition {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for TokenPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.row, self.column)
    }
}

#[derive(Serialize, Deserialize, Debug, Eq, PartialEq, Hash, Copy, Clone)]
pub enum TokenKind {
    // keywords
    Let,
    Unit,
    Return,
    If,
    Else,
    While,
    StringType,
    BoolType,
    VoidType,
    True,
    False,

    // literals
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    Comment,

    // operators
    Plus,
    Minus,
    Arrow,
    Star,
    Slash,
    Caret,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,
    Assign,
    Equal,
    Not,
    NotEqual,
    Or,
    And,

    // brackets and punctuation
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBrace,
    RightBrace,
    Comma,
    Colon,

    Etx,
    Invalid,
    Unknown,
}

impl TokenKind {
    pub fn keyword(word: &str) -> Option<TokenKind> {
        match word {
            "let" => Some(TokenKind::Let),
            "unit" => Some(TokenKind::Unit),
            "return" => Some(TokenKind::Return),
            "if" => Some(TokenKind::If),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "string" => Some(TokenKind::StringType),
            "bool" => Some(TokenKind::BoolType),
            "void" => Some(TokenKind::VoidType),
            "true" => Some(TokenKind::True),
            "false" => Some(TokenKind::False),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub enum TokenValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenValue::Str(s) => write!(f, "\"{}\"", s),
            TokenValue::Int(i) => write!(f, "{}", i),
            TokenValue::Float(n) => write!(f, "{}", n),
            TokenValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub position: TokenPosition,
    pub value: Option<TokenValue>,
}

impl Token {
    pub fn new(kind: TokenKind, position: TokenPosition) -> Self {
        Self {
            kind,
            position,
            value: None,
        }
    }

    pub fn with_value(kind: TokenKind, position: TokenPosition, value: TokenValue) -> Self {
        Self {
            kind,
            position,
            value: Some(value),
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.value {
            Some(TokenValue::Str(s)) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{:?}({}) at {}", self.kind, value, self.position),
            None => write!(f, "{:?} at {}", self.kind, self.position),
        }
    }
}
