//! Token stream wrapper for the hand-written parser.

use dwq_ast::Span;
use dwq_lexer::{Spanned, Token};

use crate::ParseError;

/// Token stream with lookahead and span tracking.
///
/// Provides methods for consuming tokens, lookahead, and span tracking
/// for the recursive descent parser.
pub struct TokenStream<'src> {
    tokens: &'src [Spanned<Token>],
    pos: usize,
}

impl<'src> TokenStream<'src> {
    pub fn new(tokens: &'src [Spanned<Token>]) -> Self {
        Self { tokens, pos: 0 }
    }

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    /// Advance to the next token and return the one just consumed.
    pub fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos).map(|t| &t.token);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Check whether the current token is of the same kind as `expected`.
    pub fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(),
                 Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Consume the current token if it matches `expected`.
    pub fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Expect a specific token kind and advance past it.
    pub fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        if self.check(&expected) {
            let span = self.current_span();
            self.advance();
            Ok(span)
        } else {
            Err(ParseError::expected_token(
                &expected,
                self.peek(),
                self.current_span(),
            ))
        }
    }

    /// Check if we've reached the end of the token stream.
    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Span of the current token, or a zero-width span at the end of the
    /// last token once the stream is exhausted.
    pub fn current_span(&self) -> Span {
        if let Some(t) = self.tokens.get(self.pos) {
            Span::new(t.span.start as u32, t.span.end as u32)
        } else if let Some(t) = self.tokens.last() {
            Span::new(t.span.end as u32, t.span.end as u32)
        } else {
            Span::new(0, 0)
        }
    }

    /// Span of the most recently consumed token.
    pub fn previous_span(&self) -> Span {
        if self.pos > 0 {
            let t = &self.tokens[self.pos - 1];
            Span::new(t.span.start as u32, t.span.end as u32)
        } else {
            Span::new(0, 0)
        }
    }
}
