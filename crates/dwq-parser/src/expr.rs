//! Expression grammar.
//!
//! ```text
//! pipeline := or_expr
//! or_expr  := alt_expr ("||" alt_expr)*
//! alt_expr := cmp_expr ("," cmp_expr)*
//! cmp_expr := cat_expr (relop cat_expr)?
//! cat_expr := item*
//! item     := atom ("*" | "+" | "?")*
//! atom     := literal | word | "let" names ":=" pipeline ";"
//!           | "if" cmp_expr "then" cmp_expr ("else" cmp_expr)?
//!           | "(" group ")" | "?(" group ")" | "!(" group ")"
//!           | "[" group "]" | "{" group "}"
//! group    := ("|" names "|")? pipeline
//! ```
//!
//! A group with a binding header becomes a `Scoped` node: the header
//! introduces a lexical scope of its own.

use dwq_ast::{CmpRel, Expr, ExprKind, Name, Radix, Span};
use dwq_lexer::Token;

use crate::strlit;
use crate::stream::TokenStream;
use crate::ParseError;

pub fn parse_pipeline(ts: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_or(ts)
}

fn parse_or(ts: &mut TokenStream) -> Result<Expr, ParseError> {
    let first = parse_alt(ts)?;
    if !ts.check(&Token::PipePipe) {
        return Ok(first);
    }
    let mut span = first.span;
    let mut branches = vec![first];
    while ts.eat(&Token::PipePipe) {
        let branch = parse_alt(ts)?;
        span = span.merge(branch.span);
        branches.push(branch);
    }
    Ok(Expr::new(ExprKind::Or(branches), span))
}

fn parse_alt(ts: &mut TokenStream) -> Result<Expr, ParseError> {
    let first = parse_cmp(ts)?;
    if !ts.check(&Token::Comma) {
        return Ok(first);
    }
    let mut span = first.span;
    let mut branches = vec![first];
    while ts.eat(&Token::Comma) {
        let branch = parse_cmp(ts)?;
        span = span.merge(branch.span);
        branches.push(branch);
    }
    Ok(Expr::new(ExprKind::Alt(branches), span))
}

fn parse_cmp(ts: &mut TokenStream) -> Result<Expr, ParseError> {
    let lhs = parse_cat(ts)?;
    let rel = match ts.peek() {
        Some(Token::EqEq) => CmpRel::Eq,
        Some(Token::BangEq) => CmpRel::Ne,
        Some(Token::Lt) => CmpRel::Lt,
        Some(Token::Le) => CmpRel::Le,
        Some(Token::Gt) => CmpRel::Gt,
        Some(Token::Ge) => CmpRel::Ge,
        _ => return Ok(lhs),
    };
    ts.advance();
    let rhs = parse_cat(ts)?;
    let span = lhs.span.merge(rhs.span);
    Ok(Expr::new(
        ExprKind::Compare {
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            rel,
        },
        span,
    ))
}

fn parse_cat(ts: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = ts.current_span();
    let mut items = Vec::new();
    while can_start_item(ts.peek()) {
        items.push(parse_item(ts)?);
    }
    match items.len() {
        0 => Ok(Expr::empty(start)),
        1 => Ok(items.pop().unwrap()),
        _ => {
            let span = items
                .first()
                .unwrap()
                .span
                .merge(items.last().unwrap().span);
            Ok(Expr::new(ExprKind::Cat(items), span))
        }
    }
}

fn can_start_item(token: Option<&Token>) -> bool {
    matches!(
        token,
        Some(
            Token::Integer(_)
                | Token::Str(_)
                | Token::Word(_)
                | Token::AssertWord(_)
                | Token::AtWord(_)
                | Token::Let
                | Token::If
                | Token::ParenOpen
                | Token::PredOpen
                | Token::NegPredOpen
                | Token::BracketOpen
                | Token::BraceOpen
        )
    )
}

fn parse_item(ts: &mut TokenStream) -> Result<Expr, ParseError> {
    let mut expr = parse_atom(ts)?;
    loop {
        let kind = match ts.peek() {
            Some(Token::Star) => ExprKind::Star(Box::new(expr)),
            Some(Token::Plus) => ExprKind::Plus(Box::new(expr)),
            Some(Token::Question) => ExprKind::Opt(Box::new(expr)),
            _ => return Ok(expr),
        };
        ts.advance();
        let span = match &kind {
            ExprKind::Star(e) | ExprKind::Plus(e) | ExprKind::Opt(e) => {
                e.span.merge(ts.previous_span())
            }
            _ => unreachable!(),
        };
        expr = Expr::new(kind, span);
    }
}

fn parse_atom(ts: &mut TokenStream) -> Result<Expr, ParseError> {
    let span = ts.current_span();
    match ts.peek() {
        Some(Token::Integer(_)) => {
            let text = match ts.advance() {
                Some(Token::Integer(t)) => t.clone(),
                _ => unreachable!(),
            };
            let (value, radix) = parse_int(&text, span)?;
            Ok(Expr::new(ExprKind::Int { value, radix }, span))
        }
        Some(Token::Str(_)) => {
            let raw = match ts.advance() {
                Some(Token::Str(s)) => s.clone(),
                _ => unreachable!(),
            };
            // The raw body starts one byte past the opening quote.
            let parts = strlit::parse_parts(&raw, span.start + 1)?;
            Ok(Expr::new(ExprKind::Str(parts), span))
        }
        Some(Token::Word(_) | Token::AssertWord(_) | Token::AtWord(_)) => {
            let text = match ts.advance() {
                Some(Token::Word(w) | Token::AssertWord(w) | Token::AtWord(w)) => w.clone(),
                _ => unreachable!(),
            };
            Ok(Expr::new(ExprKind::Word(Name { text, span }), span))
        }
        Some(Token::Let) => parse_let(ts),
        Some(Token::If) => parse_if(ts),
        Some(Token::ParenOpen) => {
            ts.advance();
            let body = parse_group(ts)?;
            let close = ts.expect(Token::ParenClose)?;
            Ok(respan(body, span.merge(close)))
        }
        Some(Token::PredOpen) | Some(Token::NegPredOpen) => {
            let positive = matches!(ts.peek(), Some(Token::PredOpen));
            ts.advance();
            let body = parse_group(ts)?;
            let close = ts.expect(Token::ParenClose)?;
            Ok(Expr::new(
                ExprKind::AssertAny {
                    body: Box::new(body),
                    positive,
                },
                span.merge(close),
            ))
        }
        Some(Token::BracketOpen) => {
            ts.advance();
            let body = parse_group(ts)?;
            let close = ts.expect(Token::BracketClose)?;
            Ok(Expr::new(
                ExprKind::Capture(Box::new(body)),
                span.merge(close),
            ))
        }
        Some(Token::BraceOpen) => {
            ts.advance();
            let body = parse_group(ts)?;
            let close = ts.expect(Token::BraceClose)?;
            Ok(Expr::new(
                ExprKind::Closure(Box::new(body)),
                span.merge(close),
            ))
        }
        other => Err(ParseError::unexpected(
            other,
            "while parsing an expression",
            span,
        )),
    }
}

/// Body of a bracketed group, with an optional `|A B|` binding header.
fn parse_group(ts: &mut TokenStream) -> Result<Expr, ParseError> {
    if !ts.check(&Token::Pipe) {
        return parse_pipeline(ts);
    }
    let start = ts.current_span();
    ts.advance();
    let names = parse_names(ts)?;
    ts.expect(Token::Pipe)?;
    let body = parse_pipeline(ts)?;
    let span = start.merge(body.span);
    Ok(Expr::new(
        ExprKind::Scoped {
            names,
            body: Box::new(body),
        },
        span,
    ))
}

fn parse_let(ts: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = ts.current_span();
    ts.expect(Token::Let)?;
    let names = parse_names(ts)?;
    ts.expect(Token::Assign)?;
    let body = parse_pipeline(ts)?;
    let end = ts.expect(Token::Semi)?;
    Ok(Expr::new(
        ExprKind::Let {
            names,
            body: Box::new(body),
        },
        start.merge(end),
    ))
}

fn parse_if(ts: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = ts.current_span();
    ts.expect(Token::If)?;
    let cond = parse_cmp(ts)?;
    ts.expect(Token::Then)?;
    let then_branch = parse_cmp(ts)?;
    let (else_branch, end) = if ts.eat(&Token::Else) {
        let e = parse_cmp(ts)?;
        let span = e.span;
        (e, span)
    } else {
        let span = ts.previous_span();
        (Expr::empty(span), span)
    };
    Ok(Expr::new(
        ExprKind::IfElse {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        },
        start.merge(end),
    ))
}

fn parse_names(ts: &mut TokenStream) -> Result<Vec<Name>, ParseError> {
    let mut names = Vec::new();
    while ts.check(&Token::Word(String::new())) {
        let span = ts.current_span();
        let text = match ts.advance() {
            Some(Token::Word(w)) => w.clone(),
            _ => unreachable!(),
        };
        names.push(Name { text, span });
    }
    if names.is_empty() {
        return Err(ParseError::unexpected(
            ts.peek(),
            "where a binding name was expected",
            ts.current_span(),
        ));
    }
    Ok(names)
}

fn parse_int(text: &str, span: Span) -> Result<(i128, Radix), ParseError> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let (radix, digits) = if let Some(d) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (Radix::Hex, d)
    } else if let Some(d) = digits
        .strip_prefix("0o")
        .or_else(|| digits.strip_prefix("0O"))
    {
        (Radix::Oct, d)
    } else if let Some(d) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        (Radix::Bin, d)
    } else {
        (Radix::Dec, digits)
    };
    let base = match radix {
        Radix::Dec => 10,
        Radix::Hex => 16,
        Radix::Oct => 8,
        Radix::Bin => 2,
    };
    let value = i128::from_str_radix(digits, base).map_err(|_| ParseError::InvalidInteger {
        text: text.to_string(),
        span,
    })?;
    Ok((if negative { -value } else { value }, radix))
}

fn respan(mut expr: Expr, span: Span) -> Expr {
    expr.span = span;
    expr
}
