pub mod comment_filter;
#[allow(clippy::module_inception)]
pub mod scanner;
pub mod tokens;

pub use comment_filter::CommentFilter;
pub use scanner::{Error, LexerConfig, Scanner};
pub use tokens::{Token, TokenKind, TokenPosition, TokenValue};

/// Anything the parser can pull tokens from, one at a time.
pub trait TokenSource {
    fn next_token(&mut self) -> Result<Token, Error>;
}

/// Scans the whole input eagerly, comments included, up to and including ETX.
pub fn scan_tokens(source: &str, config: LexerConfig) -> Result<Vec<Token>, Error> {
    let mut scanner = Scanner::new(source, config);
    let mut tokens = Vec::new();
    loop {
        let token = scanner.next_token()?;
        let done = token.kind == TokenKind::Etx;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
