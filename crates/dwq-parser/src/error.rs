//! Parse error types.

use dwq_ast::Span;
use dwq_lexer::{LexError, Token};
use thiserror::Error;

/// Error produced while turning query source into an AST.
#[derive(Debug, Clone, Error)]
pub enum ParseError {
    #[error("{0}")]
    Lex(LexError),

    #[error("expected {expected}, found {found} at {span:?}")]
    Expected {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("unexpected {found} {context} at {span:?}")]
    Unexpected {
        found: String,
        context: String,
        span: Span,
    },

    #[error("invalid integer literal `{text}` at {span:?}")]
    InvalidInteger { text: String, span: Span },

    #[error("invalid escape `\\{escape}` in string literal at {span:?}")]
    InvalidEscape { escape: char, span: Span },

    #[error("unterminated `%(` interpolation in string literal at {span:?}")]
    UnterminatedHole { span: Span },
}

impl ParseError {
    pub(crate) fn expected_token(expected: &Token, found: Option<&Token>, span: Span) -> Self {
        ParseError::Expected {
            expected: describe(Some(expected)),
            found: describe(found),
            span,
        }
    }

    pub(crate) fn unexpected(found: Option<&Token>, context: &str, span: Span) -> Self {
        ParseError::Unexpected {
            found: describe(found),
            context: context.to_string(),
            span,
        }
    }

    /// Span of the offending source region.
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex(e) => Span::new(e.span.start as u32, e.span.end as u32),
            ParseError::Expected { span, .. }
            | ParseError::Unexpected { span, .. }
            | ParseError::InvalidInteger { span, .. }
            | ParseError::InvalidEscape { span, .. }
            | ParseError::UnterminatedHole { span } => *span,
        }
    }
}

fn describe(token: Option<&Token>) -> String {
    match token {
        None => "end of input".to_string(),
        Some(Token::Word(w)) => format!("`{w}`"),
        Some(Token::AssertWord(w)) | Some(Token::AtWord(w)) => format!("`{w}`"),
        Some(Token::Integer(n)) => format!("integer `{n}`"),
        Some(Token::Str(_)) => "string literal".to_string(),
        Some(Token::Let) => "`let`".to_string(),
        Some(Token::If) => "`if`".to_string(),
        Some(Token::Then) => "`then`".to_string(),
        Some(Token::Else) => "`else`".to_string(),
        Some(Token::ParenOpen) => "`(`".to_string(),
        Some(Token::ParenClose) => "`)`".to_string(),
        Some(Token::PredOpen) => "`?(`".to_string(),
        Some(Token::NegPredOpen) => "`!(`".to_string(),
        Some(Token::BracketOpen) => "`[`".to_string(),
        Some(Token::BracketClose) => "`]`".to_string(),
        Some(Token::BraceOpen) => "`{`".to_string(),
        Some(Token::BraceClose) => "`}`".to_string(),
        Some(Token::Comma) => "`,`".to_string(),
        Some(Token::Semi) => "`;`".to_string(),
        Some(Token::Pipe) => "`|`".to_string(),
        Some(Token::PipePipe) => "`||`".to_string(),
        Some(Token::Assign) => "`:=`".to_string(),
        Some(Token::Star) => "`*`".to_string(),
        Some(Token::Plus) => "`+`".to_string(),
        Some(Token::Question) => "`?`".to_string(),
        Some(Token::EqEq) => "`==`".to_string(),
        Some(Token::BangEq) => "`!=`".to_string(),
        Some(Token::Lt) => "`<`".to_string(),
        Some(Token::Le) => "`<=`".to_string(),
        Some(Token::Gt) => "`>`".to_string(),
        Some(Token::Ge) => "`>=`".to_string(),
        Some(Token::Comment) => "comment".to_string(),
    }
}
