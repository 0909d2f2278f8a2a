//! Lexer for the dwq query language.
//!
//! Uses Logos for fast, compile-time optimized tokenization.
//!
//! The query language is concatenative: most of the surface is made of
//! words (`entry`, `child`, `dup`), assertion spellings (`?lt`, `!empty`,
//! `?TAG_subprogram`), attribute sugar (`@AT_name`), literals, and a small
//! amount of punctuation. String literals may contain `%( ... %)`
//! interpolation holes; the lexer keeps the raw body and leaves splitting
//! the holes to the parser, since a hole contains a full sub-expression
//! (including nested string literals).

use logos::{Lexer, Logos, Span};

fn scan_string(lex: &mut Lexer<Token>) -> Option<String> {
    let rest = lex.remainder();
    let mut chars = rest.char_indices();
    // Interpolation nesting depth; a nested string literal inside a hole
    // must not terminate the outer literal.
    let mut depth = 0usize;
    let mut in_inner_str = false;
    let mut prev_percent = false;

    while let Some((i, c)) = chars.next() {
        if in_inner_str {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_inner_str = false,
                _ => {}
            }
            prev_percent = false;
            continue;
        }

        match c {
            '\\' => {
                chars.next();
                prev_percent = false;
            }
            '%' => prev_percent = true,
            '(' if prev_percent => {
                depth += 1;
                prev_percent = false;
            }
            ')' if prev_percent && depth > 0 => {
                depth -= 1;
                prev_percent = false;
            }
            '"' if depth == 0 => {
                lex.bump(i + 1);
                return Some(rest[..i].to_string());
            }
            '"' => {
                in_inner_str = true;
                prev_percent = false;
            }
            _ => prev_percent = false,
        }
    }

    // Unterminated literal.
    None
}

/// Token type for the dwq query language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // === Comments ===
    #[regex(r"//[^\n]*", logos::skip)]
    #[regex(r"#[^\n]*", logos::skip)]
    Comment,

    // === Keywords ===
    #[token("let")]
    Let,
    #[token("if")]
    If,
    #[token("then")]
    Then,
    #[token("else")]
    Else,

    // === Literals ===
    /// Decimal, hex, octal or binary integer literal.
    #[regex(r"-?[0-9]+", |lex| lex.slice().to_string())]
    #[regex(r"-?0[xX][0-9a-fA-F]+", |lex| lex.slice().to_string())]
    #[regex(r"-?0[oO][0-7]+", |lex| lex.slice().to_string())]
    #[regex(r"-?0[bB][01]+", |lex| lex.slice().to_string())]
    Integer(String),

    /// String literal body, raw (escapes and `%( ... %)` holes unprocessed).
    #[token("\"", scan_string)]
    Str(String),

    // === Words ===
    /// Plain word: a builtin, a domain word, or a lexical binding name.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string(), priority = 2)]
    Word(String),

    /// Assertion spelling, e.g. `?lt`, `!empty`, `?TAG_subprogram`.
    #[regex(r"[?!][A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    AssertWord(String),

    /// Attribute sugar, e.g. `@AT_name`.
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice().to_string())]
    AtWord(String),

    // === Punctuation ===
    #[token("(")]
    ParenOpen,
    #[token(")")]
    ParenClose,
    #[token("?(")]
    PredOpen,
    #[token("!(")]
    NegPredOpen,
    #[token("[")]
    BracketOpen,
    #[token("]")]
    BracketClose,
    #[token("{")]
    BraceOpen,
    #[token("}")]
    BraceClose,
    #[token(",")]
    Comma,
    #[token(";")]
    Semi,
    #[token("|")]
    Pipe,
    #[token("||")]
    PipePipe,
    #[token(":=")]
    Assign,

    // === Postfix closures ===
    #[token("*")]
    Star,
    #[token("+")]
    Plus,
    #[token("?")]
    Question,

    // === Infix comparison sugar ===
    #[token("==")]
    EqEq,
    #[token("!=")]
    BangEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Le,
    #[token(">")]
    Gt,
    #[token(">=")]
    Ge,
}

/// A token with its source byte span.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub token: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(token: T, span: Span) -> Self {
        Self { token, span }
    }
}

/// Tokenize source code into a vector of spanned tokens.
pub fn lex(source: &str) -> Result<Vec<Spanned<Token>>, LexError> {
    let mut lexer = Token::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => {
                if !matches!(token, Token::Comment) {
                    tokens.push(Spanned::new(token, lexer.span()));
                }
            }
            Err(()) => {
                return Err(LexError {
                    span: lexer.span(),
                    slice: lexer.slice().to_string(),
                });
            }
        }
    }

    Ok(tokens)
}

/// Error during lexing.
#[derive(Debug, Clone)]
pub struct LexError {
    pub span: Span,
    pub slice: String,
}

impl std::fmt::Display for LexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.slice.starts_with('"') {
            write!(f, "unterminated string literal at {:?}", self.span)
        } else {
            write!(
                f,
                "unexpected character(s) '{}' at {:?}",
                self.slice, self.span
            )
        }
    }
}

impl std::error::Error for LexError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_words() {
        let tokens = lex("entry child parent attribute").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].token, Token::Word("entry".into()));
        assert_eq!(tokens[3].token, Token::Word("attribute".into()));
    }

    #[test]
    fn test_numbers() {
        let tokens = lex("42 -17 0x10 0o17 0b101").unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[0].token, Token::Integer("42".into()));
        assert_eq!(tokens[1].token, Token::Integer("-17".into()));
        assert_eq!(tokens[2].token, Token::Integer("0x10".into()));
        assert_eq!(tokens[3].token, Token::Integer("0o17".into()));
        assert_eq!(tokens[4].token, Token::Integer("0b101".into()));
    }

    #[test]
    fn test_assert_words() {
        let tokens = lex("?lt !empty ?TAG_subprogram !AT_name").unwrap();
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[0].token, Token::AssertWord("?lt".into()));
        assert_eq!(tokens[1].token, Token::AssertWord("!empty".into()));
        assert_eq!(tokens[2].token, Token::AssertWord("?TAG_subprogram".into()));
        assert_eq!(tokens[3].token, Token::AssertWord("!AT_name".into()));
    }

    #[test]
    fn test_at_sugar() {
        let tokens = lex("@AT_name @AT_low_pc").unwrap();
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].token, Token::AtWord("@AT_name".into()));
    }

    #[test]
    fn test_string_plain() {
        let tokens = lex(r#""hello world""#).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, Token::Str("hello world".into()));
    }

    #[test]
    fn test_string_escapes_kept_raw() {
        let tokens = lex(r#""a\"b""#).unwrap();
        assert_eq!(tokens[0].token, Token::Str(r#"a\"b"#.into()));
    }

    #[test]
    fn test_string_interpolation_hole() {
        let tokens = lex(r#""name: %( @AT_name %)""#).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, Token::Str("name: %( @AT_name %)".into()));
    }

    #[test]
    fn test_string_nested_literal_in_hole() {
        let tokens = lex(r#""x %( "y" add %) z""#).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token, Token::Str(r#"x %( "y" add %) z"#.into()));
    }

    #[test]
    fn test_unterminated_string() {
        assert!(lex(r#""oops"#).is_err());
    }

    #[test]
    fn test_punctuation() {
        let tokens = lex("( ) ?( !( [ ] { } , ; | || :=").unwrap();
        let expected = [
            Token::ParenOpen,
            Token::ParenClose,
            Token::PredOpen,
            Token::NegPredOpen,
            Token::BracketOpen,
            Token::BracketClose,
            Token::BraceOpen,
            Token::BraceClose,
            Token::Comma,
            Token::Semi,
            Token::Pipe,
            Token::PipePipe,
            Token::Assign,
        ];
        assert_eq!(tokens.len(), expected.len());
        for (t, e) in tokens.iter().zip(expected.iter()) {
            assert_eq!(&t.token, e);
        }
    }

    #[test]
    fn test_postfix_and_comparison() {
        let tokens = lex("child* child+ child? == != < <= > >=").unwrap();
        assert_eq!(tokens[0].token, Token::Word("child".into()));
        assert_eq!(tokens[1].token, Token::Star);
        assert_eq!(tokens[3].token, Token::Plus);
        assert_eq!(tokens[5].token, Token::Question);
        assert_eq!(tokens[6].token, Token::EqEq);
        assert_eq!(tokens[7].token, Token::BangEq);
        assert_eq!(tokens[8].token, Token::Lt);
        assert_eq!(tokens[9].token, Token::Le);
        assert_eq!(tokens[10].token, Token::Gt);
        assert_eq!(tokens[11].token, Token::Ge);
    }

    #[test]
    fn test_keywords() {
        let tokens = lex("let F := { dup }; if ?root then parent else child").unwrap();
        assert_eq!(tokens[0].token, Token::Let);
        assert_eq!(tokens[1].token, Token::Word("F".into()));
        assert_eq!(tokens[2].token, Token::Assign);
        assert!(tokens.iter().any(|t| t.token == Token::If));
        assert!(tokens.iter().any(|t| t.token == Token::Then));
        assert!(tokens.iter().any(|t| t.token == Token::Else));
    }

    #[test]
    fn test_comments() {
        let tokens = lex("entry // trailing\nchild # hash comment\nparent").unwrap();
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[1].token, Token::Word("child".into()));
    }

    #[test]
    fn test_pipeline() {
        let tokens = lex("entry ?TAG_subprogram child* @AT_name").unwrap();
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[3].token, Token::Star);
    }
}
