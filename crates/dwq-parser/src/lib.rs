//! Hand-written recursive descent parser for the dwq query language.
//!
//! Produces [`dwq_ast`] expression trees from query source. Name
//! resolution (telling lexical bindings apart from vocabulary words,
//! assigning frame slots) happens later, at compile time in the engine;
//! the parser only builds the shape of the pipeline.

mod error;
mod expr;
mod stream;
mod strlit;

pub use error::ParseError;

use dwq_ast::Expr;
use stream::TokenStream;

/// Parse a whole query into an expression.
pub fn parse_query(source: &str) -> Result<Expr, ParseError> {
    let tokens = dwq_lexer::lex(source).map_err(ParseError::Lex)?;
    let mut ts = TokenStream::new(&tokens);
    let expr = expr::parse_pipeline(&mut ts)?;
    if !ts.at_end() {
        return Err(ParseError::unexpected(
            ts.peek(),
            "after the end of the query",
            ts.current_span(),
        ));
    }
    Ok(expr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dwq_ast::{CmpRel, ExprKind, Radix, StrPart};

    fn parse(source: &str) -> Expr {
        parse_query(source).unwrap()
    }

    #[test]
    fn parses_pipeline_of_words() {
        let e = parse("entry child parent");
        match e.kind {
            ExprKind::Cat(items) => {
                assert_eq!(items.len(), 3);
                assert!(matches!(&items[0].kind, ExprKind::Word(n) if n.text == "entry"));
            }
            other => panic!("expected Cat, got {other:?}"),
        }
    }

    #[test]
    fn parses_integer_literals() {
        let e = parse("0x10");
        assert!(matches!(
            e.kind,
            ExprKind::Int {
                value: 16,
                radix: Radix::Hex
            }
        ));
        let e = parse("-42");
        assert!(matches!(
            e.kind,
            ExprKind::Int {
                value: -42,
                radix: Radix::Dec
            }
        ));
    }

    #[test]
    fn parses_alternation() {
        let e = parse("1, 2, 3");
        match e.kind {
            ExprKind::Alt(branches) => assert_eq!(branches.len(), 3),
            other => panic!("expected Alt, got {other:?}"),
        }
    }

    #[test]
    fn parses_or_looser_than_alt() {
        let e = parse("1, 2 || 3");
        match e.kind {
            ExprKind::Or(branches) => {
                assert_eq!(branches.len(), 2);
                assert!(matches!(branches[0].kind, ExprKind::Alt(_)));
            }
            other => panic!("expected Or, got {other:?}"),
        }
    }

    #[test]
    fn parses_capture_of_alternation() {
        let e = parse("[1, 2, 3]");
        match e.kind {
            ExprKind::Capture(body) => assert!(matches!(body.kind, ExprKind::Alt(_))),
            other => panic!("expected Capture, got {other:?}"),
        }
    }

    #[test]
    fn parses_empty_capture() {
        let e = parse("[]");
        match e.kind {
            ExprKind::Capture(body) => assert!(matches!(&body.kind, ExprKind::Cat(v) if v.is_empty())),
            other => panic!("expected Capture, got {other:?}"),
        }
    }

    #[test]
    fn parses_postfix_closures() {
        let e = parse("child*");
        assert!(matches!(e.kind, ExprKind::Star(_)));
        let e = parse("child+ parent?");
        match e.kind {
            ExprKind::Cat(items) => {
                assert!(matches!(items[0].kind, ExprKind::Plus(_)));
                assert!(matches!(items[1].kind, ExprKind::Opt(_)));
            }
            other => panic!("expected Cat, got {other:?}"),
        }
    }

    #[test]
    fn parses_comparison_sugar() {
        let e = parse("@AT_name == \"main\"");
        match e.kind {
            ExprKind::Compare { rel, lhs, rhs } => {
                assert_eq!(rel, CmpRel::Eq);
                assert!(matches!(&lhs.kind, ExprKind::Word(n) if n.text == "@AT_name"));
                assert!(matches!(rhs.kind, ExprKind::Str(_)));
            }
            other => panic!("expected Compare, got {other:?}"),
        }
    }

    #[test]
    fn parses_subexpression_assertions() {
        let e = parse("?(child) !(parent)");
        match e.kind {
            ExprKind::Cat(items) => {
                assert!(
                    matches!(&items[0].kind, ExprKind::AssertAny { positive: true, .. })
                );
                assert!(
                    matches!(&items[1].kind, ExprKind::AssertAny { positive: false, .. })
                );
            }
            other => panic!("expected Cat, got {other:?}"),
        }
    }

    #[test]
    fn parses_scoped_group() {
        let e = parse("(|A B| A B)");
        match e.kind {
            ExprKind::Scoped { names, .. } => {
                assert_eq!(names.len(), 2);
                assert_eq!(names[0].text, "A");
                assert_eq!(names[1].text, "B");
            }
            other => panic!("expected Scoped, got {other:?}"),
        }
    }

    #[test]
    fn parses_closure_with_header() {
        let e = parse("{|X| X X}");
        match e.kind {
            ExprKind::Closure(body) => assert!(matches!(body.kind, ExprKind::Scoped { .. })),
            other => panic!("expected Closure, got {other:?}"),
        }
    }

    #[test]
    fn parses_let() {
        let e = parse("let F := { dup }; 3 F");
        match e.kind {
            ExprKind::Cat(items) => {
                assert!(matches!(&items[0].kind, ExprKind::Let { names, .. } if names.len() == 1));
                assert!(matches!(items[1].kind, ExprKind::Int { .. }));
            }
            other => panic!("expected Cat, got {other:?}"),
        }
    }

    #[test]
    fn parses_if_else() {
        let e = parse("if ?root then parent else child");
        match e.kind {
            ExprKind::IfElse { .. } => {}
            other => panic!("expected IfElse, got {other:?}"),
        }
    }

    #[test]
    fn if_without_else_gets_empty_branch() {
        let e = parse("if ?root then parent");
        match e.kind {
            ExprKind::IfElse { else_branch, .. } => {
                assert!(matches!(&else_branch.kind, ExprKind::Cat(v) if v.is_empty()));
            }
            other => panic!("expected IfElse, got {other:?}"),
        }
    }

    #[test]
    fn parses_interpolated_string() {
        let e = parse(r#""name: %( @AT_name %)!""#);
        match e.kind {
            ExprKind::Str(parts) => {
                assert_eq!(parts.len(), 3);
                assert!(matches!(&parts[0], StrPart::Lit(s) if s == "name: "));
                assert!(matches!(&parts[1], StrPart::Hole(_)));
                assert!(matches!(&parts[2], StrPart::Lit(s) if s == "!"));
            }
            other => panic!("expected Str, got {other:?}"),
        }
    }

    #[test]
    fn unescapes_string_fragments() {
        let e = parse(r#""a\tb %% c""#);
        match e.kind {
            ExprKind::Str(parts) => {
                assert_eq!(parts.len(), 1);
                assert!(matches!(&parts[0], StrPart::Lit(s) if s == "a\tb % c"));
            }
            other => panic!("expected Str, got {other:?}"),
        }
    }

    #[test]
    fn hole_spans_point_into_original_source() {
        let src = r#""x %( entry %)""#;
        let e = parse(src);
        match e.kind {
            ExprKind::Str(parts) => match &parts[1] {
                StrPart::Hole(inner) => {
                    let s = inner.span;
                    assert_eq!(&src[s.start as usize..s.end as usize], "entry");
                }
                other => panic!("expected Hole, got {other:?}"),
            },
            other => panic!("expected Str, got {other:?}"),
        }
    }

    #[test]
    fn rejects_trailing_garbage() {
        assert!(parse_query("entry )").is_err());
    }

    #[test]
    fn rejects_unterminated_group() {
        assert!(parse_query("(entry").is_err());
    }
}
