use crate::scanner::tokens::{Token, TokenKind};
use crate::scanner::{Error, TokenSource};

/// Wraps another token source and drops every COMMENT token.
pub struct CommentFilter<S> {
    inner: S,
}

impl<S: TokenSource> CommentFilter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: TokenSource> TokenSource for CommentFilter<S> {
    fn next_token(&mut self) -> Result<Token, Error> {
        loop {
            let token = self.inner.next_token()?;
            if token.kind != TokenKind::Comment {
                return Ok(token);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{LexerConfig, Scanner};

    #[test]
    fn comments_never_reach_the_consumer() {
        let source = "// heading\nx // trailing\n// footer";
        let mut filter = CommentFilter::new(Scanner::new(source, LexerConfig::default()));
        let token = filter.next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Identifier);
        assert_eq!(token.position.row, 2);
        assert_eq!(filter.next_token().unwrap().kind, TokenKind::Etx);
        assert_eq!(filter.next_token().unwrap().kind, TokenKind::Etx);
    }
}
