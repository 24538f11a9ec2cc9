use std::fmt;
use std::iter::Peekable;
use std::str::{Chars, FromStr};

use serde::{Deserialize, Serialize};

use crate::scanner::tokens::{Token, TokenKind, TokenPosition, TokenValue};
use crate::scanner::TokenSource;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct LexerConfig {
    pub max_comment_length: usize,
    pub max_identifier_length: usize,
    pub max_text_length: usize,
    pub max_decimal_places: u32,
    pub max_exponent: i32,
    pub max_integer: i64,
}

impl Default for LexerConfig {
    fn default() -> LexerConfig {
        LexerConfig {
            max_comment_length: 1000,
            max_identifier_length: 128,
            max_text_length: 4096,
            max_decimal_places: 17,
            max_exponent: 308,
            max_integer: i64::MAX,
        }
    }
}

fn env_override<T: FromStr>(name: &str) -> Option<T> {
    std::env::var(name)
        .ok()
        .and_then(|env_str| env_str.parse::<T>().ok())
}

impl LexerConfig {
    /// Defaults, overridden by any `UNITLANG_MAX_*` variables that parse.
    pub fn from_env() -> LexerConfig {
        let defaults = LexerConfig::default();
        LexerConfig {
            max_comment_length: env_override("UNITLANG_MAX_COMMENT_LENGTH")
                .unwrap_or(defaults.max_comment_length),
            max_identifier_length: env_override("UNITLANG_MAX_IDENTIFIER_LENGTH")
                .unwrap_or(defaults.max_identifier_length),
            max_text_length: env_override("UNITLANG_MAX_TEXT_LENGTH")
                .unwrap_or(defaults.max_text_length),
            max_decimal_places: env_override("UNITLANG_MAX_DECIMAL_PLACES")
                .unwrap_or(defaults.max_decimal_places),
            max_exponent: env_override("UNITLANG_MAX_EXPONENT").unwrap_or(defaults.max_exponent),
            max_integer: env_override("UNITLANG_MAX_INTEGER").unwrap_or(defaults.max_integer),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    CommentExceededLength {
        limit: usize,
        position: TokenPosition,
    },
    IdentifierExceededLength {
        limit: usize,
        position: TokenPosition,
    },
    TextExceededLength {
        limit: usize,
        position: TokenPosition,
    },
    TextEndingQuoteNotFound {
        position: TokenPosition,
    },
    UnknownEscapeChar {
        found: char,
        position: TokenPosition,
    },
    NumberExceededSize {
        limit: i64,
        position: TokenPosition,
    },
    DecimalPlacesExceededAmount {
        limit: u32,
        position: TokenPosition,
    },
    ExponentPartExceededSize {
        limit: i32,
        position: TokenPosition,
    },
}

impl Error {
    pub fn position(&self) -> TokenPosition {
        match self {
            Error::CommentExceededLength { position, .. }
            | Error::IdentifierExceededLength { position, .. }
            | Error::TextExceededLength { position, .. }
            | Error::TextEndingQuoteNotFound { position }
            | Error::UnknownEscapeChar { position, .. }
            | Error::NumberExceededSize { position, .. }
            | Error::DecimalPlacesExceededAmount { position, .. }
            | Error::ExponentPartExceededSize { position, .. } => *position,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::CommentExceededLength { limit, .. } => {
                write!(f, "comment exceeds the maximum length of {} characters", limit)
            }
            Error::IdentifierExceededLength { limit, .. } => write!(
                f,
                "identifier exceeds the maximum length of {} characters",
                limit
            ),
            Error::TextExceededLength { limit, .. } => {
                write!(f, "text exceeds the maximum length of {} characters", limit)
            }
            Error::TextEndingQuoteNotFound { .. } => {
                write!(f, "text is missing its closing quote")
            }
            Error::UnknownEscapeChar { found, .. } => {
                write!(f, "unknown escape sequence '\\{}'", found.escape_default())
            }
            Error::NumberExceededSize { limit, .. } => {
                write!(f, "number exceeds the maximum value of {}", limit)
            }
            Error::DecimalPlacesExceededAmount { limit, .. } => {
                write!(f, "number has more than {} decimal places", limit)
            }
            Error::ExponentPartExceededSize { limit, .. } => {
                write!(f, "exponent exceeds the maximum value of {}", limit)
            }
        }
    }
}

impl std::error::Error for Error {}

fn is_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// Hand-written scanning state machine over a character stream.
///
/// `current` is the unconsumed character under the cursor and `position` is
/// where it sits in the source. A `\r\n` or `\n\r` pair counts as a single
/// line break.
pub struct Scanner<'a> {
    chars: Peekable<Chars<'a>>,
    current: Option<char>,
    position: TokenPosition,
    break_open: bool,
    config: LexerConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str, config: LexerConfig) -> Self {
        let mut chars = source.chars().peekable();
        let current = chars.next();
        Self {
            chars,
            current,
            position: TokenPosition::new(1, 1),
            break_open: false,
            config,
        }
    }

    pub fn next_token(&mut self) -> Result<Token, Error> {
        self.skip_whitespace();
        let start = self.position;

        let c = match self.current {
            Some(c) => c,
            None => return Ok(Token::new(TokenKind::Etx, start)),
        };

        if c == '/' {
            return self.slash_or_comment(start);
        }
        if c.is_alphabetic() {
            return self.identifier_or_keyword(start);
        }
        if c == '"' {
            return self.text(start);
        }
        if c.is_ascii_digit() {
            return self.number(start);
        }

        Ok(self.operator(c, start))
    }

    fn advance(&mut self) {
        let left = self.current;
        self.current = self.chars.next();

        match left {
            Some(c) if is_line_break(c) => {
                if self.break_open {
                    self.break_open = false;
                    self.new_line();
                } else if matches!(self.current, Some(n) if is_line_break(n) && n != c) {
                    self.break_open = true;
                    self.position.column += 1;
                } else {
                    self.new_line();
                }
            }
            Some(_) => self.position.column += 1,
            None => {}
        }
    }

    fn new_line(&mut self) {
        self.position.row += 1;
        self.position.column = 1;
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while let Some(' ' | '\t' | '\r' | '\n') = self.current {
            self.advance();
        }
    }

    fn slash_or_comment(&mut self, start: TokenPosition) -> Result<Token, Error> {
        self.advance();
        if self.current != Some('/') {
            return Ok(Token::new(TokenKind::Slash, start));
        }
        self.advance();

        let mut comment = String::new();
        while let Some(c) = self.current {
            if is_line_break(c) {
                break;
            }
            if comment.chars().count() >= self.config.max_comment_length {
                return Err(Error::CommentExceededLength {
                    limit: self.config.max_comment_length,
                    position: self.position,
                });
            }
            comment.push(c);
            self.advance();
        }

        Ok(Token::with_value(
            TokenKind::Comment,
            start,
            TokenValue::Str(comment),
        ))
    }

    fn identifier_or_keyword(&mut self, start: TokenPosition) -> Result<Token, Error> {
        let mut name = String::new();
        let mut length = 0;

        while let Some(c) = self.current {
            if !(c.is_alphanumeric() || c == '_') {
                break;
            }
            if length >= self.config.max_identifier_length {
                return Err(Error::IdentifierExceededLength {
                    limit: self.config.max_identifier_length,
                    position: self.position,
                });
            }
            name.push(c);
            length += 1;
            self.advance();
        }

        Ok(match TokenKind::keyword(&name) {
            Some(TokenKind::True) => {
                Token::with_value(TokenKind::True, start, TokenValue::Bool(true))
            }
            Some(TokenKind::False) => {
                Token::with_value(TokenKind::False, start, TokenValue::Bool(false))
            }
            Some(kind) => Token::new(kind, start),
            None => Token::with_value(TokenKind::Identifier, start, TokenValue::Str(name)),
        })
    }

    fn text(&mut self, start: TokenPosition) -> Result<Token, Error> {
        // opening quote
        self.advance();

        let mut text = String::new();
        let mut length = 0;
        loop {
            let c = match self.current {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.current {
                        Some('"') => '"',
                        Some('\\') => '\\',
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some(other) => {
                            return Err(Error::UnknownEscapeChar {
                                found: other,
                                position: self.position,
                            })
                        }
                        None => {
                            return Err(Error::TextEndingQuoteNotFound {
                                position: self.position,
                            })
                        }
                    }
                }
                Some(c) => c,
                None => {
                    return Err(Error::TextEndingQuoteNotFound {
                        position: self.position,
                    })
                }
            };

            if length >= self.config.max_text_length {
                return Err(Error::TextExceededLength {
                    limit: self.config.max_text_length,
                    position: self.position,
                });
            }
            text.push(c);
            length += 1;
            self.advance();
        }

        Ok(Token::with_value(
            TokenKind::StringLiteral,
            start,
            TokenValue::Str(text),
        ))
    }

    fn current_digit(&self) -> Option<i64> {
        self.current
            .and_then(|c| c.to_digit(10))
            .map(|d| d as i64)
    }

    fn number(&mut self, start: TokenPosition) -> Result<Token, Error> {
        if self.current == Some('0') && matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            // consume one character so the caller can keep scanning
            self.advance();
            return Ok(Token::with_value(
                TokenKind::Invalid,
                start,
                TokenValue::Str("0".to_string()),
            ));
        }

        let mut int_part: i64 = 0;
        while let Some(digit) = self.current_digit() {
            int_part = int_part
                .checked_mul(10)
                .and_then(|value| value.checked_add(digit))
                .filter(|value| *value <= self.config.max_integer)
                .ok_or(Error::NumberExceededSize {
                    limit: self.config.max_integer,
                    position: self.position,
                })?;
            self.advance();
        }

        let mut is_float = false;
        let mut fraction: i64 = 0;
        let mut decimal_places: u32 = 0;
        if self.current == Some('.') {
            is_float = true;
            self.advance();
            while let Some(digit) = self.current_digit() {
                let exceeded = Error::DecimalPlacesExceededAmount {
                    limit: self.config.max_decimal_places,
                    position: self.position,
                };
                if decimal_places >= self.config.max_decimal_places {
                    return Err(exceeded);
                }
                fraction = fraction
                    .checked_mul(10)
                    .and_then(|value| value.checked_add(digit))
                    .ok_or(exceeded)?;
                decimal_places += 1;
                self.advance();
            }
        }

        let mut exponent: i32 = 0;
        if self.current == Some('e') {
            is_float = true;
            self.advance();
            let negative = self.current == Some('-');
            if negative {
                self.advance();
            }
            if self.current_digit().is_none() {
                return Ok(Token::with_value(
                    TokenKind::Invalid,
                    start,
                    TokenValue::Str("e".to_string()),
                ));
            }
            while let Some(digit) = self.current_digit() {
                exponent = exponent
                    .checked_mul(10)
                    .and_then(|value| value.checked_add(digit as i32))
                    .filter(|value| *value <= self.config.max_exponent)
                    .ok_or(Error::ExponentPartExceededSize {
                        limit: self.config.max_exponent,
                        position: self.position,
                    })?;
                self.advance();
            }
            if negative {
                exponent = -exponent;
            }
        }

        if !is_float {
            return Ok(Token::with_value(
                TokenKind::IntLiteral,
                start,
                TokenValue::Int(int_part),
            ));
        }

        let value = (int_part as f64 + fraction as f64 / 10f64.powf(decimal_places as f64))
            * 10f64.powf(exponent as f64);
        Ok(Token::with_value(
            TokenKind::FloatLiteral,
            start,
            TokenValue::Float(value),
        ))
    }

    fn operator(&mut self, c: char, start: TokenPosition) -> Token {
        let single = match c {
            '+' => Some(TokenKind::Plus),
            '*' => Some(TokenKind::Star),
            '^' => Some(TokenKind::Caret),
            '(' => Some(TokenKind::LeftParen),
            ')' => Some(TokenKind::RightParen),
            '[' => Some(TokenKind::LeftBracket),
            ']' => Some(TokenKind::RightBracket),
            '{' => Some(TokenKind::LeftBrace),
            '}' => Some(TokenKind::RightBrace),
            ',' => Some(TokenKind::Comma),
            ':' => Some(TokenKind::Colon),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return Token::new(kind, start);
        }

        // operators that collide with a longer one on the next character
        let colliding = match c {
            '>' => Some((TokenKind::Greater, '=', TokenKind::GreaterEqual)),
            '<' => Some((TokenKind::Less, '=', TokenKind::LessEqual)),
            '=' => Some((TokenKind::Assign, '=', TokenKind::Equal)),
            '!' => Some((TokenKind::Not, '=', TokenKind::NotEqual)),
            '-' => Some((TokenKind::Minus, '>', TokenKind::Arrow)),
            _ => None,
        };
        if let Some((short, second, long)) = colliding {
            let kind = if self.peek() == Some(second) {
                self.advance();
                long
            } else {
                short
            };
            self.advance();
            return Token::new(kind, start);
        }

        let double = match c {
            '|' => Some(TokenKind::Or),
            '&' => Some(TokenKind::And),
            _ => None,
        };
        if let Some(kind) = double {
            if self.peek() == Some(c) {
                self.advance();
                self.advance();
                return Token::new(kind, start);
            }
        }

        self.advance();
        Token::with_value(TokenKind::Unknown, start, TokenValue::Str(c.to_string()))
    }
}

impl TokenSource for Scanner<'_> {
    fn next_token(&mut self) -> Result<Token, Error> {
        Scanner::next_token(self)
    }
}
