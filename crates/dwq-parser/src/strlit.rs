//! String-literal processing.
//!
//! The lexer hands over the raw body of a string literal: escapes are
//! still backslashed and `%( ... %)` interpolation holes still contain
//! query source. This module unescapes the literal fragments, extracts
//! the holes, and parses each hole as a full pipeline. Spans inside a
//! hole are shifted so they point back into the original query source.

use dwq_ast::{Expr, ExprKind, Span, StrPart};

use crate::ParseError;

/// Split a raw literal body into parts. `base` is the byte offset of the
/// body within the original query source.
pub fn parse_parts(raw: &str, base: u32) -> Result<Vec<StrPart>, ParseError> {
    let mut parts = Vec::new();
    let mut lit = String::new();
    let mut chars = raw.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, 'n')) => lit.push('\n'),
                Some((_, 't')) => lit.push('\t'),
                Some((_, 'r')) => lit.push('\r'),
                Some((_, '0')) => lit.push('\0'),
                Some((_, '\\')) => lit.push('\\'),
                Some((_, '"')) => lit.push('"'),
                Some((j, other)) => {
                    return Err(ParseError::InvalidEscape {
                        escape: other,
                        span: Span::new(base + i as u32, base + j as u32 + 1),
                    })
                }
                None => {
                    return Err(ParseError::InvalidEscape {
                        escape: '\\',
                        span: Span::new(base + i as u32, base + i as u32 + 1),
                    })
                }
            },
            '%' => match chars.peek() {
                Some((_, '%')) => {
                    chars.next();
                    lit.push('%');
                }
                Some((_, '(')) => {
                    chars.next();
                    let hole_start = i + 2;
                    let hole_end = find_hole_end(raw, hole_start).ok_or(
                        ParseError::UnterminatedHole {
                            span: Span::new(base + i as u32, base + raw.len() as u32),
                        },
                    )?;
                    if !lit.is_empty() {
                        parts.push(StrPart::Lit(std::mem::take(&mut lit)));
                    }
                    let inner = &raw[hole_start..hole_end];
                    let expr = parse_hole(inner, base + hole_start as u32)?;
                    parts.push(StrPart::Hole(expr));
                    // Skip past the hole and its closing `%)`.
                    while let Some(&(j, _)) = chars.peek() {
                        if j >= hole_end + 2 {
                            break;
                        }
                        chars.next();
                    }
                }
                _ => lit.push('%'),
            },
            _ => lit.push(c),
        }
    }

    if !lit.is_empty() || parts.is_empty() {
        parts.push(StrPart::Lit(lit));
    }
    Ok(parts)
}

/// Find the byte offset of the `%)` closing the hole that starts at
/// `start`, honouring nested holes and string literals inside the hole.
fn find_hole_end(raw: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_str = false;
    let mut prev_percent = false;
    let mut chars = raw[start..].char_indices();

    while let Some((i, c)) = chars.next() {
        if in_str {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_str = false,
                _ => {}
            }
            prev_percent = false;
            continue;
        }
        match c {
            '"' => {
                in_str = true;
                prev_percent = false;
            }
            '%' => prev_percent = true,
            '(' if prev_percent => {
                depth += 1;
                prev_percent = false;
            }
            ')' if prev_percent => {
                if depth == 0 {
                    // `i` points at `)`; the hole ends before the `%`.
                    return Some(start + i - 1);
                }
                depth -= 1;
                prev_percent = false;
            }
            _ => prev_percent = false,
        }
    }
    None
}

fn parse_hole(source: &str, abs_start: u32) -> Result<Expr, ParseError> {
    let mut expr = crate::parse_query(source).map_err(|e| offset_error(e, abs_start))?;
    offset_expr(&mut expr, abs_start);
    Ok(expr)
}

fn offset_error(err: ParseError, delta: u32) -> ParseError {
    use ParseError::*;
    let shift = |s: Span| Span::new(s.start + delta, s.end + delta);
    match err {
        Lex(mut e) => {
            e.span = e.span.start + delta as usize..e.span.end + delta as usize;
            Lex(e)
        }
        Expected {
            expected,
            found,
            span,
        } => Expected {
            expected,
            found,
            span: shift(span),
        },
        Unexpected {
            found,
            context,
            span,
        } => Unexpected {
            found,
            context,
            span: shift(span),
        },
        InvalidInteger { text, span } => InvalidInteger {
            text,
            span: shift(span),
        },
        InvalidEscape { escape, span } => InvalidEscape {
            escape,
            span: shift(span),
        },
        UnterminatedHole { span } => UnterminatedHole { span: shift(span) },
    }
}

fn offset_expr(expr: &mut Expr, delta: u32) {
    expr.span = Span::new(expr.span.start + delta, expr.span.end + delta);
    match &mut expr.kind {
        ExprKind::Cat(items) | ExprKind::Alt(items) | ExprKind::Or(items) => {
            for item in items {
                offset_expr(item, delta);
            }
        }
        ExprKind::Capture(e)
        | ExprKind::Closure(e)
        | ExprKind::Star(e)
        | ExprKind::Plus(e)
        | ExprKind::Opt(e) => offset_expr(e, delta),
        ExprKind::AssertAny { body, .. } => offset_expr(body, delta),
        ExprKind::Compare { lhs, rhs, .. } => {
            offset_expr(lhs, delta);
            offset_expr(rhs, delta);
        }
        ExprKind::IfElse {
            cond,
            then_branch,
            else_branch,
        } => {
            offset_expr(cond, delta);
            offset_expr(then_branch, delta);
            offset_expr(else_branch, delta);
        }
        ExprKind::Let { names, body } => {
            for name in names {
                name.span = Span::new(name.span.start + delta, name.span.end + delta);
            }
            offset_expr(body, delta);
        }
        ExprKind::Scoped { names, body } => {
            for name in names {
                name.span = Span::new(name.span.start + delta, name.span.end + delta);
            }
            offset_expr(body, delta);
        }
        ExprKind::Word(name) => {
            name.span = Span::new(name.span.start + delta, name.span.end + delta);
        }
        ExprKind::Str(parts) => {
            for part in parts {
                if let StrPart::Hole(e) = part {
                    offset_expr(e, delta);
                }
            }
        }
        ExprKind::Int { .. } => {}
    }
}
