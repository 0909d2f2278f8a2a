//! End-to-end query execution tests.
//!
//! These drive the full pipeline — lex, parse, compile against the full
//! vocabulary, run over a synthetic debug-info dump — and check the
//! result stacks.

use dwq_engine::Error;
use dwq_tests::TestHarness;

/// A translation unit with a function, its parameter, a global and a
/// base type; offsets and addresses chosen to be easy to eyeball.
const DUMP: &str = r#"{
    "units": [{
        "offset": 11,
        "version": 4,
        "root": {
            "offset": 11, "tag": "DW_TAG_compile_unit",
            "attrs": [
                {"at": "DW_AT_name", "form": "DW_FORM_string", "value": "m.c"},
                {"at": "DW_AT_language", "form": "DW_FORM_data1", "value": 2},
                {"at": "DW_AT_low_pc", "form": "DW_FORM_addr", "value": 4096},
                {"at": "DW_AT_high_pc", "form": "DW_FORM_data8", "value": 256}
            ],
            "children": [
                {
                    "offset": 20, "tag": "DW_TAG_subprogram",
                    "attrs": [
                        {"at": "DW_AT_name", "form": "DW_FORM_string", "value": "main"},
                        {"at": "DW_AT_external", "form": "DW_FORM_flag", "value": true},
                        {"at": "DW_AT_low_pc", "form": "DW_FORM_addr", "value": 4096},
                        {"at": "DW_AT_high_pc", "form": "DW_FORM_data8", "value": 128},
                        {"at": "DW_AT_type", "form": "DW_FORM_ref4", "value": 50}
                    ],
                    "children": [
                        {"offset": 30, "tag": "DW_TAG_formal_parameter",
                         "attrs": [
                            {"at": "DW_AT_name", "form": "DW_FORM_string", "value": "argc"},
                            {"at": "DW_AT_type", "form": "DW_FORM_ref4", "value": 50}]},
                        {"offset": 35, "tag": "DW_TAG_variable",
                         "attrs": [
                            {"at": "DW_AT_name", "form": "DW_FORM_string", "value": "tmp"},
                            {"at": "DW_AT_location", "form": "DW_FORM_exprloc",
                             "value": [{"low": 4096, "high": 4224,
                                        "ops": [["DW_OP_fbreg", -20]]}]}]}
                    ]
                },
                {"offset": 45, "tag": "DW_TAG_variable",
                 "attrs": [
                    {"at": "DW_AT_name", "form": "DW_FORM_string", "value": "counter"},
                    {"at": "DW_AT_type", "form": "DW_FORM_ref4", "value": 50}]},
                {"offset": 50, "tag": "DW_TAG_base_type",
                 "attrs": [
                    {"at": "DW_AT_name", "form": "DW_FORM_string", "value": "int"},
                    {"at": "DW_AT_byte_size", "form": "DW_FORM_data1", "value": 4}]}
            ]
        }
    }]
}"#;

#[test]
fn comparison_assertions() {
    let h = TestHarness::new();
    assert_eq!(h.stacks("1 2 ?lt"), vec![vec!["1", "2"]]);
    assert!(h.run("1 2 ?gt").is_empty());
}

#[test]
fn sequence_concatenation() {
    let h = TestHarness::new();
    assert_eq!(h.tops("[1, 2, 3] [4, 5, 6] add"), vec!["[1, 2, 3, 4, 5, 6]"]);
}

#[test]
fn element_positions_number_the_stream() {
    let h = TestHarness::new();
    let results = h.run("[1, 2, 3] elem");
    let top_and_pos: Vec<(String, usize)> = results
        .iter()
        .map(|stk| {
            let top = stk.top().unwrap();
            (top.to_string(), top.pos())
        })
        .collect();
    assert_eq!(
        top_and_pos,
        vec![
            ("1".to_string(), 0),
            ("2".to_string(), 1),
            ("3".to_string(), 2)
        ]
    );
}

#[test]
fn address_set_algebra() {
    let h = TestHarness::new();
    assert_eq!(h.tops("0 0x10 aset 0x100 0x110 aset add length"), vec!["32"]);
    assert_eq!(h.run("0 10 aset 9 ?contains").len(), 1);
    assert!(h.run("0 10 aset 10 ?contains").is_empty());
    assert_eq!(h.tops("0 0x20 aset 0x10 0x30 aset overlap length"), vec!["16"]);
    assert_eq!(h.tops("0 0x20 aset 0x10 0x30 aset sub length"), vec!["16"]);
}

#[test]
fn closures_apply_repeatedly_with_same_result() {
    let h = TestHarness::new();
    assert_eq!(
        h.tops("let C := { dup mul }; 3 C apply drop 3 C apply"),
        vec!["9"]
    );
}

#[test]
fn transitive_closure_enumerates_the_tree_once() {
    // Root with children at 2 and 3, grandchild at 4 under the last
    // child: the enumeration is root, 2, 3, 4 with no repeats.
    let h = TestHarness::with_dump(
        r#"{"units": [{"root": {"offset": 1, "tag": "DW_TAG_compile_unit",
            "children": [
              {"offset": 2, "tag": "DW_TAG_namespace"},
              {"offset": 3, "tag": "DW_TAG_structure_type",
               "children": [{"offset": 4, "tag": "DW_TAG_member"}]}
            ]}}]}"#,
    );
    assert_eq!(
        h.tops("entry ?root child* offset"),
        vec!["0x1", "0x2", "0x3", "0x4"]
    );
}

#[test]
fn entries_filter_by_tag_and_attributes() {
    let h = TestHarness::with_dump(DUMP);
    assert_eq!(h.tops("entry ?TAG_variable @AT_name"), vec!["tmp", "counter"]);
    assert_eq!(h.tops("entry ?AT_external @AT_name"), vec!["main"]);
    assert_eq!(
        h.tops("entry (@AT_name == \"counter\") offset"),
        vec!["0x2d"]
    );
}

#[test]
fn attribute_references_resolve_to_dies() {
    let h = TestHarness::with_dump(DUMP);
    assert_eq!(
        h.tops("entry ?TAG_formal_parameter @AT_type @AT_name"),
        vec!["int"]
    );
}

#[test]
fn capture_collects_query_results() {
    let h = TestHarness::with_dump(DUMP);
    assert_eq!(h.tops("[entry ?TAG_variable @AT_name] length"), vec!["2"]);
    assert_eq!(
        h.tops("[entry ?TAG_variable @AT_name]"),
        vec!["[tmp, counter]"]
    );
}

#[test]
fn capture_then_elem_matches_direct_enumeration() {
    let h = TestHarness::with_dump(DUMP);
    assert_eq!(h.tops("[entry @AT_name] elem"), h.tops("entry @AT_name"));
}

#[test]
fn format_strings_render_per_result() {
    let h = TestHarness::with_dump(DUMP);
    assert_eq!(
        h.tops(r#"entry ?TAG_subprogram (|E| "%( E @AT_name %) at %( E low %)")"#),
        vec!["main at 0x1000"]
    );
}

#[test]
fn address_containment_between_dies() {
    let h = TestHarness::with_dump(DUMP);
    // The subprogram's range sits inside the unit's range.
    let query = "(|D| D entry ?root address \
                 (|U| D entry ?TAG_subprogram address \
                 (|S| U S ?contains)))";
    assert_eq!(h.run(query).len(), 1);
}

#[test]
fn loclist_elements_and_operators() {
    let h = TestHarness::with_dump(DUMP);
    assert_eq!(
        h.tops("entry @AT_location elem ?OP_fbreg value"),
        vec!["-20"]
    );
    assert_eq!(h.tops("entry @AT_location low"), vec!["0x1000"]);
}

#[test]
fn alternation_merges_all_branches() {
    let h = TestHarness::with_dump(DUMP);
    assert_eq!(
        h.tops("entry (?TAG_base_type, ?TAG_formal_parameter) @AT_name"),
        vec!["argc", "int"]
    );
}

#[test]
fn or_stops_at_first_succeeding_branch() {
    let h = TestHarness::with_dump(DUMP);
    // Every entry has a name here, so the fallback never fires.
    assert_eq!(
        h.tops("entry ?TAG_subprogram (@AT_name || \"<anon>\")"),
        vec!["main"]
    );
    // No linkage names anywhere: the fallback fires per entry.
    assert_eq!(
        h.tops("entry ?TAG_subprogram (@AT_linkage_name || \"<anon>\")"),
        vec!["<anon>"]
    );
}

#[test]
fn if_else_on_entries() {
    let h = TestHarness::with_dump(DUMP);
    assert_eq!(
        h.tops("entry ?TAG_subprogram if ?AT_external then \"ext\" else \"static\""),
        vec!["ext"]
    );
}

#[test]
fn counting_via_sequences() {
    let h = TestHarness::with_dump(DUMP);
    assert_eq!(h.tops("[entry] length"), vec!["6"]);
    assert_eq!(h.tops("[unit abbrev] length"), vec!["6"]);
}

#[test]
fn abbreviation_shapes_match_dies() {
    let h = TestHarness::with_dump(DUMP);
    // Every DIE's abbreviation reports the DIE's own tag.
    assert_eq!(
        h.run("entry (|D| D abbrev label == D label)").len(),
        6
    );
}

#[test]
fn queries_rerun_identically() {
    let h = TestHarness::with_dump(DUMP);
    let first = h.tops("entry @AT_name");
    let second = h.tops("entry @AT_name");
    assert_eq!(first, second);
}

#[test]
fn seen_set_clears_per_upstream_stack() {
    // Each entry provides a fresh context: the dup/?eq match must
    // succeed once per entry, not once globally.
    let h = TestHarness::with_dump(DUMP);
    assert_eq!(h.run("entry dup child* ?eq").len(), 6);
}

#[test]
fn underflow_aborts_the_query() {
    let h = TestHarness::new();
    assert!(matches!(h.run_err("dup"), Error::Underflow { .. }));
}

#[test]
fn type_mismatch_drops_only_the_offending_stack() {
    let h = TestHarness::new();
    assert_eq!(h.tops("(1 \"x\" add, 2 3 add)"), vec!["5"]);
}

#[test]
fn string_interpolation_enumerates_combinations() {
    // The leading hole varies fastest: its stringer re-enumerates per
    // pair delivered by the rest of the chain.
    let h = TestHarness::new();
    assert_eq!(
        h.tops(r#""%( 1, 2 %)-%( "a", "b" %)""#),
        vec!["1-a", "2-a", "1-b", "2-b"]
    );
}

#[test]
fn dwopen_loads_files_from_disk() {
    let dir = std::env::temp_dir().join("dwq-it");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("open.dwj");
    std::fs::write(&path, DUMP).unwrap();

    let h = TestHarness::new();
    let query = format!("\"{}\" dwopen entry ?TAG_base_type @AT_name", path.display());
    assert_eq!(h.tops(&query), vec!["int"]);
}
