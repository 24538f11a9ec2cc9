//! A small language whose numbers carry physical units. Source text goes
//! through four stages: scanning, parsing, unit checking and tree-walking
//! execution.

use std::fmt;

pub mod analyzer;
pub mod builtins;
pub mod error_formatting;
pub mod expr;
pub mod input;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod scope;
pub mod units;
pub mod value;

use crate::parser::ast::Program;
use crate::scanner::{CommentFilter, LexerConfig, Scanner, TokenPosition};

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Lexical(scanner::Error),
    Parse(parser::Error),
    Semantic(analyzer::Error),
    Runtime(interpreter::InterpreterError),
}

impl Error {
    /// Where the error was detected, if the stage tracks positions.
    pub fn position(&self) -> Option<TokenPosition> {
        match self {
            Error::Lexical(err) => Some(err.position()),
            Error::Parse(err) => Some(err.position()),
            Error::Semantic(err) => Some(err.position()),
            Error::Runtime(err) => err.position(),
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Error::Lexical(_) => "lexical",
            Error::Parse(_) => "syntax",
            Error::Semantic(_) => "semantic",
            Error::Runtime(_) => "runtime",
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Lexical(err) => write!(f, "{}", err),
            Error::Parse(err) => write!(f, "{}", err),
            Error::Semantic(err) => write!(f, "{}", err),
            Error::Runtime(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {}

impl From<scanner::Error> for Error {
    fn from(err: scanner::Error) -> Self {
        Error::Lexical(err)
    }
}

impl From<parser::Error> for Error {
    fn from(err: parser::Error) -> Self {
        match err {
            parser::Error::Lexical(err) => Error::Lexical(err),
            err => Error::Parse(err),
        }
    }
}

impl From<analyzer::Error> for Error {
    fn from(err: analyzer::Error) -> Self {
        Error::Semantic(err)
    }
}

impl From<interpreter::InterpreterError> for Error {
    fn from(err: interpreter::InterpreterError) -> Self {
        Error::Runtime(err)
    }
}

/// Scans and parses `source`, dropping comments on the way.
pub fn parse_source(source: &str, config: LexerConfig) -> Result<Program, Error> {
    let tokens = CommentFilter::new(Scanner::new(source, config));
    Ok(parser::parse(tokens)?)
}

/// Parses and unit-checks `source` without running it.
pub fn check_source(source: &str, config: LexerConfig) -> Result<Program, Error> {
    let program = parse_source(source, config)?;
    analyzer::analyze(&program)?;
    Ok(program)
}

/// Runs the whole pipeline and returns everything `print` produced. With
/// `echo` set, printed values also go to stdout as they happen.
pub fn run_source(source: &str, config: LexerConfig, echo: bool) -> Result<Vec<String>, Error> {
    let program = check_source(source, config)?;
    let mut interp = interpreter::Interpreter::new(echo);
    interp.run(&program)?;
    Ok(interp.output().to_vec())
}
