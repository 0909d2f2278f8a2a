//! Query execution core.
//!
//! dwq evaluates programs in a small concatenative, stack-based language
//! as a pull-driven graph of lazy operators. This crate is the engine:
//! the value universe, operand stacks and lexical frames, the operator
//! and predicate graphs, overload dispatch, the coverage primitive, the
//! string-format sub-engine, the core vocabulary, and the compile/run
//! façade.
//!
//! Domain words over debug info plug in through [`vocabulary::Vocabulary`]
//! and the [`value::DomainValue`] trait; see the `dwq-dw` crate.
//!
//! ```
//! use dwq_engine::{compile, core_voc, Stack};
//!
//! let voc = core_voc();
//! let query = compile("[1, 2, 3] elem", &voc).unwrap();
//! let results: Vec<_> = query.run(Stack::new()).collect::<Result<_, _>>().unwrap();
//! assert_eq!(results.len(), 3);
//! ```

pub mod compile;
pub mod constant;
pub mod coverage;
pub mod error;
pub mod op;
pub mod overload;
pub mod pred;
pub mod producer;
pub mod query;
pub mod stack;
pub mod stringer;
pub mod value;
pub mod vocabulary;
pub mod words;

pub use compile::CompileError;
pub use error::{Error, Result};
pub use query::{compile, Query, Results};
pub use stack::{Frame, FrameHandle, Stack};
pub use value::{DomainValue, TypeCode, Value, ValueKind};
pub use vocabulary::Vocabulary;
pub use words::core_voc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;

    fn run(source: &str) -> Vec<Stack> {
        let voc = core_voc();
        let query = compile(source, &voc).expect("query should compile");
        query
            .run(Stack::new())
            .collect::<Result<Vec<_>>>()
            .expect("query should run")
    }

    fn tops(source: &str) -> Vec<String> {
        run(source)
            .iter()
            .map(|stk| stk.top().expect("result stack should be non-empty").to_string())
            .collect()
    }

    #[test]
    fn literals_flow_through() {
        let results = run("1 2");
        assert_eq!(results.len(), 1);
        let values: Vec<String> =
            results[0].values().iter().map(|v| v.to_string()).collect();
        assert_eq!(values, vec!["1", "2"]);
    }

    #[test]
    fn comparison_assertions_filter() {
        // 1 2 ?lt holds and keeps both values; 1 2 ?gt filters out.
        let results = run("1 2 ?lt");
        assert_eq!(results.len(), 1);
        let values: Vec<String> =
            results[0].values().iter().map(|v| v.to_string()).collect();
        assert_eq!(values, vec!["1", "2"]);

        assert!(run("1 2 ?gt").is_empty());
        assert_eq!(run("1 2 !gt").len(), 1);
    }

    #[test]
    fn seq_add_concatenates() {
        assert_eq!(tops("[1, 2, 3] [4, 5, 6] add"), vec!["[1, 2, 3, 4, 5, 6]"]);
    }

    #[test]
    fn seq_elem_enumerates_with_positions() {
        let results = run("[1, 2, 3] elem");
        let tops: Vec<String> = results
            .iter()
            .map(|stk| stk.top().unwrap().to_string())
            .collect();
        assert_eq!(tops, vec!["1", "2", "3"]);
        let positions: Vec<usize> =
            results.iter().map(|stk| stk.top().unwrap().pos()).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn seq_relem_positions_number_the_output() {
        let results = run("[1, 2, 3] relem");
        let tops: Vec<String> = results
            .iter()
            .map(|stk| stk.top().unwrap().to_string())
            .collect();
        assert_eq!(tops, vec!["3", "2", "1"]);
        let positions: Vec<usize> =
            results.iter().map(|stk| stk.top().unwrap().pos()).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn aset_length_counts_addresses() {
        assert_eq!(tops("0 0x10 aset 0x100 0x110 aset add length"), vec!["32"]);
    }

    #[test]
    fn aset_contains_point() {
        assert_eq!(run("0 10 aset 9 ?contains").len(), 1);
        assert!(run("0 10 aset 10 ?contains").is_empty());
    }

    #[test]
    fn closure_applies_repeatedly() {
        let results = run("let C := { dup mul }; 3 C apply");
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].top().unwrap().to_string(), "9");

        // Same closure, driven twice.
        assert_eq!(tops("let C := { dup mul }; 3 C apply drop 4 C apply"), vec!["16"]);
    }

    #[test]
    fn capture_then_elem_is_identity_law() {
        assert_eq!(tops("[[1, 2, 3] elem] elem"), vec!["1", "2", "3"]);
    }

    #[test]
    fn alternation_contributes_every_branch() {
        assert_eq!(tops("(1, 2, 3)"), vec!["1", "2", "3"]);
    }

    #[test]
    fn or_takes_first_succeeding_branch_only() {
        // The first branch that yields wins; later branches are skipped.
        assert_eq!(tops("(1 ?(2 ?gt) || 10, 20)"), vec!["10", "20"]);
        assert_eq!(tops("(1 || 10, 20)"), vec!["1"]);
    }

    #[test]
    fn if_else_selects_one_branch() {
        assert_eq!(tops("1 if ?(dup 0 ?gt) then \"pos\" else \"neg\""), vec!["pos"]);
        assert_eq!(tops("-1 if ?(dup 0 ?gt) then \"pos\" else \"neg\""), vec!["neg"]);
    }

    #[test]
    fn opt_yields_input_and_result() {
        assert_eq!(tops("1 (2 add)?"), vec!["1", "3"]);
    }

    #[test]
    fn empty_seq_literal() {
        assert_eq!(tops("[] length"), vec!["0"]);
        assert_eq!(run("[] ?empty").len(), 1);
    }

    #[test]
    fn format_strings_interpolate_all_combinations() {
        assert_eq!(
            tops(r#"[1, 2] "got %( elem %)!""#),
            vec!["got 1!", "got 2!"]
        );
    }

    #[test]
    fn subexpression_bindings() {
        assert_eq!(tops("1 2 (|A B| B A)"), vec!["1"]);
        let results = run("1 2 (|A B| B A)");
        let values: Vec<String> =
            results[0].values().iter().map(|v| v.to_string()).collect();
        assert_eq!(values, vec!["2", "1"]);
    }

    #[test]
    fn capture_with_bindings_zips() {
        // Enumerate element pairs, keep the position-matched ones, pack
        // them back into sequences.
        assert_eq!(
            tops("[1, 2] [10, 20] (|A B| A elem B elem) ?((pos == drop pos)) [|A B| A, B]"),
            vec!["[1, 10]", "[2, 20]"]
        );
    }

    #[test]
    fn transitive_closure_star_includes_input() {
        assert_eq!(
            tops("1 (?(dup 5 ?lt) 1 add)*"),
            vec!["1", "2", "3", "4", "5"]
        );
    }

    #[test]
    fn transitive_closure_plus_excludes_input() {
        assert_eq!(tops("1 (?(dup 5 ?lt) 1 add)+"), vec!["2", "3", "4", "5"]);
    }

    #[test]
    fn transitive_closure_deduplicates_within_one_input() {
        // Both branches step to the same successor; each value shows up
        // exactly once across the enumeration.
        assert_eq!(
            tops("1 (?(dup 3 ?lt) (1 add, 1 add))*"),
            vec!["1", "2", "3"]
        );
    }

    #[test]
    fn arithmetic_words() {
        assert_eq!(tops("7 3 sub"), vec!["4"]);
        assert_eq!(tops("6 7 mul"), vec!["42"]);
        assert_eq!(tops("7 2 div"), vec!["3"]);
        assert_eq!(tops("7 2 mod"), vec!["1"]);
    }

    #[test]
    fn division_by_zero_drops_the_stack() {
        assert!(run("1 0 div").is_empty());
    }

    #[test]
    fn casts_change_rendering() {
        assert_eq!(tops("255 hex"), vec!["0xff"]);
        assert_eq!(tops("0x10 dec"), vec!["16"]);
    }

    #[test]
    fn type_and_pos_words() {
        assert_eq!(tops("[1] type"), vec!["T_SEQ"]);
        assert_eq!(tops("\"x\" type"), vec!["T_STR"]);
        assert_eq!(tops("[7, 8] elem pos"), vec!["0", "1"]);
    }

    #[test]
    fn unknown_word_is_a_compile_error() {
        let voc = core_voc();
        assert!(matches!(
            compile("entry frobnicate", &voc),
            Err(CompileError::UnknownWord { .. })
        ));
    }

    #[test]
    fn binding_without_a_value_is_fatal() {
        let voc = core_voc();
        let query = compile("(|A| A)", &voc).unwrap();
        let result: Result<Vec<_>> = query.run(Stack::new()).collect();
        assert!(matches!(result, Err(Error::Underflow { .. })));
    }

    #[test]
    fn overload_mismatch_drops_stack_but_continues() {
        // `add` on a seq and a constant matches no overload; the branch
        // stack is dropped while the other alternative survives.
        assert_eq!(tops("([1] 1 add, 5 6 add)"), vec!["11"]);
    }

    #[test]
    fn infix_comparison_on_subexpressions() {
        assert_eq!(run("[1, 2, 3] (elem == 2)").len(), 1);
        assert!(run("[1, 2, 3] (elem == 9)").is_empty());
    }

    #[test]
    fn string_words() {
        assert_eq!(tops("\"foo\" \"bar\" add"), vec!["foobar"]);
        assert_eq!(tops("\"foobar\" length"), vec!["6"]);
        assert_eq!(run("\"foobar\" \"oba\" ?find").len(), 1);
        assert_eq!(run("\"foobar\" \"foo\" ?starts").len(), 1);
        assert_eq!(run("\"foobar\" \"bar\" ?ends").len(), 1);
        assert!(run("\"foobar\" \"xyz\" ?find").is_empty());
    }

    #[test]
    fn shuffles() {
        assert_eq!(tops("1 2 swap"), vec!["1"]);
        assert_eq!(tops("1 2 over"), vec!["1"]);
        assert_eq!(tops("1 2 3 rot"), vec!["1"]);
        assert_eq!(tops("1 dup add"), vec!["2"]);
    }

    #[test]
    fn rerun_of_compiled_query_is_deterministic() {
        let voc = core_voc();
        let query = compile("[1, 2, 3] elem", &voc).unwrap();
        for _ in 0..2 {
            let results: Vec<Stack> = query
                .run(Stack::new())
                .collect::<Result<Vec<_>>>()
                .unwrap();
            assert_eq!(results.len(), 3);
        }
    }

    #[test]
    fn constants_true_false() {
        assert_eq!(tops("true"), vec!["true"]);
        assert_eq!(tops("false"), vec!["false"]);
        let results = run("true");
        assert_eq!(results[0].top().unwrap().as_cst().unwrap().value(), &1.into());
    }

    #[test]
    fn seq_find_words() {
        assert_eq!(run("[1, 2, 3] [2, 3] ?find").len(), 1);
        assert_eq!(run("[1, 2, 3] [1] ?starts").len(), 1);
        assert_eq!(run("[1, 2, 3] [3] ?ends").len(), 1);
        assert!(run("[1, 2, 3] [4] ?find").is_empty());
    }

    #[test]
    fn value_sheds_symbolic_domain() {
        assert_eq!(tops("0x2e value"), vec!["46"]);
    }

    #[test]
    fn nested_closures_capture_lexically() {
        let results = run(
            "let F := {|X| { X add }}; 10 F apply (|G| 5 G apply)",
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].top().unwrap().to_string(), "15");
    }

    #[test]
    fn merge_round_robins_branches() {
        assert_eq!(tops("([1, 2] elem, 9)"), vec!["1", "9", "2"]);
    }

    fn cst_top(stk: &Stack) -> Constant {
        stk.top().unwrap().as_cst().unwrap().clone()
    }

    #[test]
    fn duplicate_binding_rejected() {
        let voc = core_voc();
        assert!(matches!(
            compile("(|A A| A)", &voc),
            Err(CompileError::DuplicateBinding { .. })
        ));
    }

    #[test]
    fn let_binds_multiple_names() {
        let results = run("let A B := 1 2; B A sub");
        assert_eq!(cst_top(&results[0]).value(), &1.into());
    }
}
