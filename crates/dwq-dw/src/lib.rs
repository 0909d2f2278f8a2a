//! Debug-info domain for the dwq query engine.
//!
//! The engine core knows nothing about DWARF; this crate supplies the
//! domain: the collaborator interface over debug-info files
//! ([`info::DebugInfo`]), the opaque value types the domain words push
//! ([`values`]), the word catalog itself ([`words`]), the DW_* constant
//! tables ([`consts`]), and a JSON-backed reference reader ([`json`])
//! that the CLI and the test suites drive.

pub mod consts;
pub mod info;
pub mod json;
pub mod values;
pub mod words;

pub use info::{AbbrevData, AttrData, AttrValue, DebugInfo, DwHandle, LocEntry, LocOp, UnitInfo};
pub use json::{load_file, load_str, LoadError};
pub use words::{dwarf_value, full_voc, register};

#[cfg(test)]
mod tests {
    use super::*;
    use dwq_engine::{compile, Stack};

    const TREE: &str = r#"{
        "units": [{
            "offset": 11,
            "version": 4,
            "root": {
                "offset": 11, "tag": "DW_TAG_compile_unit",
                "attrs": [{"at": "DW_AT_name", "form": "DW_FORM_string", "value": "a.c"}],
                "children": [
                    {
                        "offset": 20, "tag": "DW_TAG_subprogram",
                        "attrs": [
                            {"at": "DW_AT_name", "form": "DW_FORM_string", "value": "main"},
                            {"at": "DW_AT_low_pc", "form": "DW_FORM_addr", "value": 4096},
                            {"at": "DW_AT_high_pc", "form": "DW_FORM_data8", "value": 64},
                            {"at": "DW_AT_external", "form": "DW_FORM_flag", "value": true}
                        ],
                        "children": [
                            {"offset": 30, "tag": "DW_TAG_formal_parameter",
                             "attrs": [{"at": "DW_AT_name", "form": "DW_FORM_string", "value": "argc"}]}
                        ]
                    },
                    {"offset": 40, "tag": "DW_TAG_base_type",
                     "attrs": [{"at": "DW_AT_name", "form": "DW_FORM_string", "value": "int"}]}
                ]
            }
        }]
    }"#;

    fn run(source: &str) -> Vec<Stack> {
        let voc = full_voc();
        let query = compile(source, &voc).expect("query should compile");
        let file = load_str(TREE, "tree").unwrap();
        let mut initial = Stack::new();
        initial.push(dwarf_value(file));
        query
            .run(initial)
            .collect::<Result<Vec<_>, _>>()
            .expect("query should run")
    }

    fn tops(source: &str) -> Vec<String> {
        run(source)
            .iter()
            .map(|stk| stk.top().unwrap().to_string())
            .collect()
    }

    #[test]
    fn entry_enumerates_preorder() {
        assert_eq!(
            tops("entry offset"),
            vec!["0xb", "0x14", "0x1e", "0x28"]
        );
    }

    #[test]
    fn tag_assertions_filter_entries() {
        assert_eq!(tops("entry ?TAG_subprogram name"), vec!["main"]);
        assert_eq!(tops("entry !TAG_subprogram offset").len(), 3);
    }

    #[test]
    fn child_and_parent() {
        assert_eq!(tops("entry ?TAG_subprogram child name"), vec!["argc"]);
        assert_eq!(
            tops("entry ?TAG_formal_parameter parent name"),
            vec!["main"]
        );
        assert!(tops("entry ?root parent").is_empty());
    }

    #[test]
    fn at_sugar_reads_attribute_values() {
        assert_eq!(tops("entry @AT_name"), vec!["a.c", "main", "argc", "int"]);
        assert_eq!(tops("entry ?AT_low_pc @AT_name"), vec!["main"]);
    }

    #[test]
    fn attribute_words() {
        assert_eq!(
            tops("entry ?TAG_formal_parameter attribute label"),
            vec!["DW_AT_name"]
        );
        assert_eq!(
            tops("entry ?TAG_formal_parameter attribute form"),
            vec!["DW_FORM_string"]
        );
        assert_eq!(
            tops("entry ?TAG_formal_parameter attribute value"),
            vec!["argc"]
        );
    }

    #[test]
    fn address_words() {
        assert_eq!(tops("entry ?TAG_subprogram low"), vec!["0x1000"]);
        assert_eq!(tops("entry ?TAG_subprogram high"), vec!["0x1040"]);
        assert_eq!(tops("entry address length"), vec!["64"]);
    }

    #[test]
    fn units_and_roots() {
        assert_eq!(tops("unit version"), vec!["4"]);
        assert_eq!(tops("unit root offset"), vec!["0xb"]);
        assert_eq!(tops("entry ?TAG_base_type root offset"), vec!["0xb"]);
    }

    #[test]
    fn abbrev_words() {
        // Four DIEs, four distinct shapes.
        assert_eq!(tops("unit abbrev code"), vec!["1", "2", "3", "4"]);
        assert_eq!(tops("entry ?root abbrev code"), vec!["1"]);
        assert_eq!(run("unit abbrev ?TAG_subprogram ?haschildren").len(), 1);
    }

    #[test]
    fn haschildren_and_flags() {
        assert_eq!(tops("entry ?haschildren offset"), vec!["0xb", "0x14"]);
        assert_eq!(tops("entry ?TAG_subprogram @AT_external"), vec!["true"]);
    }

    #[test]
    fn transitive_closure_over_children_visits_each_node_once() {
        // Breadth-by-frontier: both children before the grandchild.
        assert_eq!(
            tops("entry ?root child* offset"),
            vec!["0xb", "0x14", "0x28", "0x1e"]
        );
    }

    #[test]
    fn label_yields_tag_constants() {
        assert_eq!(tops("entry ?root label"), vec!["DW_TAG_compile_unit"]);
        assert_eq!(run("entry (label == DW_TAG_subprogram) name").len(), 1);
    }

    #[test]
    fn raw_and_cooked_views_round_trip() {
        assert_eq!(tops("raw entry offset").len(), 4);
        assert_eq!(tops("raw cooked entry offset").len(), 4);
    }

    #[test]
    fn dwarf_value_renders_name() {
        assert_eq!(tops("name"), vec!["tree"]);
    }

    #[test]
    fn cooked_view_follows_specification_links() {
        let src = r#"{
            "units": [{
                "root": {
                    "offset": 1, "tag": "DW_TAG_compile_unit",
                    "children": [
                        {"offset": 2, "tag": "DW_TAG_subprogram",
                         "attrs": [
                            {"at": "DW_AT_declaration", "form": "DW_FORM_flag", "value": true},
                            {"at": "DW_AT_name", "form": "DW_FORM_string", "value": "f"}]},
                        {"offset": 3, "tag": "DW_TAG_subprogram",
                         "attrs": [
                            {"at": "DW_AT_specification", "form": "DW_FORM_ref4", "value": 2},
                            {"at": "DW_AT_low_pc", "form": "DW_FORM_addr", "value": 8192}]}
                    ]
                }
            }]
        }"#;
        let voc = full_voc();
        let file = load_str(src, "spec").unwrap();

        let mut initial = Stack::new();
        initial.push(dwarf_value(file.clone()));
        let query = compile("entry ?AT_low_pc name", &voc).unwrap();
        let results: Vec<Stack> = query.run(initial).collect::<Result<_, _>>().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].top().unwrap().to_string(), "f");

        // The raw view does not chase the link.
        let mut initial = Stack::new();
        initial.push(dwarf_value(file));
        let query = compile("raw entry ?AT_low_pc name", &voc).unwrap();
        let results: Vec<Stack> = query.run(initial).collect::<Result<_, _>>().unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn cooked_view_splices_imported_units() {
        let src = r#"{
            "units": [
                {"root": {"offset": 1, "tag": "DW_TAG_partial_unit",
                          "children": [{"offset": 2, "tag": "DW_TAG_base_type",
                                        "attrs": [{"at": "DW_AT_name", "form": "DW_FORM_string", "value": "shared"}]}]}},
                {"root": {"offset": 10, "tag": "DW_TAG_compile_unit",
                          "children": [{"offset": 11, "tag": "DW_TAG_imported_unit",
                                        "attrs": [{"at": "DW_AT_import", "form": "DW_FORM_ref4", "value": 1}]}]}}
            ]
        }"#;
        let voc = full_voc();
        let file = load_str(src, "imports").unwrap();

        let mut initial = Stack::new();
        initial.push(dwarf_value(file.clone()));
        let query = compile("entry @AT_name", &voc).unwrap();
        let results: Vec<Stack> = query.run(initial).collect::<Result<_, _>>().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].top().unwrap().to_string(), "shared");

        // Raw view sees the partial unit and the import stub as stored.
        let mut initial = Stack::new();
        initial.push(dwarf_value(file));
        let query = compile("raw entry offset", &voc).unwrap();
        let results: Vec<Stack> = query.run(initial).collect::<Result<_, _>>().unwrap();
        assert_eq!(results.len(), 4);
    }

    #[test]
    fn loclists_enumerate_elements_and_ops() {
        let src = r#"{
            "units": [{
                "root": {
                    "offset": 1, "tag": "DW_TAG_compile_unit",
                    "children": [
                        {"offset": 2, "tag": "DW_TAG_variable",
                         "attrs": [
                            {"at": "DW_AT_name", "form": "DW_FORM_string", "value": "x"},
                            {"at": "DW_AT_location", "form": "DW_FORM_exprloc",
                             "value": [{"low": 4096, "high": 4160,
                                        "ops": [["DW_OP_fbreg", -16], ["DW_OP_stack_value"]]}]}]}
                    ]
                }
            }]
        }"#;
        let voc = full_voc();
        let file = load_str(src, "locs").unwrap();
        let mut initial = Stack::new();
        initial.push(dwarf_value(file));
        let query =
            compile("entry @AT_location elem ?OP_fbreg value", &voc).unwrap();
        let results: Vec<Stack> = query.run(initial).collect::<Result<_, _>>().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].top().unwrap().to_string(), "-16");
    }
}
