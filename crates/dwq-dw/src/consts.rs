//! DWARF constant tables and their rendering domains.
//!
//! A representative subset of the DW_TAG_*, DW_AT_*, DW_FORM_* and
//! DW_OP_* tables, used three ways: rendering symbolic constants,
//! parsing names in the JSON dump format, and generating the `@AT_*` /
//! `?TAG_*` word families. Values outside the tables render as plain
//! hex with the family prefix.

use std::fmt;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use dwq_engine::constant::ConstantDomain;

pub const DW_TAGS: &[(&str, u64)] = &[
    ("DW_TAG_array_type", 0x01),
    ("DW_TAG_class_type", 0x02),
    ("DW_TAG_enumeration_type", 0x04),
    ("DW_TAG_formal_parameter", 0x05),
    ("DW_TAG_imported_declaration", 0x08),
    ("DW_TAG_label", 0x0a),
    ("DW_TAG_lexical_block", 0x0b),
    ("DW_TAG_member", 0x0d),
    ("DW_TAG_pointer_type", 0x0f),
    ("DW_TAG_reference_type", 0x10),
    ("DW_TAG_compile_unit", 0x11),
    ("DW_TAG_structure_type", 0x13),
    ("DW_TAG_subroutine_type", 0x15),
    ("DW_TAG_typedef", 0x16),
    ("DW_TAG_union_type", 0x17),
    ("DW_TAG_unspecified_parameters", 0x18),
    ("DW_TAG_variant", 0x19),
    ("DW_TAG_inheritance", 0x1c),
    ("DW_TAG_inlined_subroutine", 0x1d),
    ("DW_TAG_subrange_type", 0x21),
    ("DW_TAG_base_type", 0x24),
    ("DW_TAG_const_type", 0x26),
    ("DW_TAG_enumerator", 0x28),
    ("DW_TAG_subprogram", 0x2e),
    ("DW_TAG_variable", 0x34),
    ("DW_TAG_volatile_type", 0x35),
    ("DW_TAG_restrict_type", 0x37),
    ("DW_TAG_namespace", 0x39),
    ("DW_TAG_unspecified_type", 0x3b),
    ("DW_TAG_partial_unit", 0x3c),
    ("DW_TAG_imported_unit", 0x3d),
    ("DW_TAG_type_unit", 0x41),
];

pub const DW_ATS: &[(&str, u64)] = &[
    ("DW_AT_sibling", 0x01),
    ("DW_AT_location", 0x02),
    ("DW_AT_name", 0x03),
    ("DW_AT_ordering", 0x09),
    ("DW_AT_byte_size", 0x0b),
    ("DW_AT_bit_size", 0x0d),
    ("DW_AT_stmt_list", 0x10),
    ("DW_AT_import", 0x18),
    ("DW_AT_low_pc", 0x11),
    ("DW_AT_high_pc", 0x12),
    ("DW_AT_language", 0x13),
    ("DW_AT_comp_dir", 0x1b),
    ("DW_AT_const_value", 0x1c),
    ("DW_AT_inline", 0x20),
    ("DW_AT_producer", 0x25),
    ("DW_AT_prototyped", 0x27),
    ("DW_AT_abstract_origin", 0x31),
    ("DW_AT_count", 0x37),
    ("DW_AT_data_member_location", 0x38),
    ("DW_AT_decl_file", 0x3a),
    ("DW_AT_decl_line", 0x3b),
    ("DW_AT_declaration", 0x3c),
    ("DW_AT_encoding", 0x3e),
    ("DW_AT_external", 0x3f),
    ("DW_AT_frame_base", 0x40),
    ("DW_AT_specification", 0x47),
    ("DW_AT_type", 0x49),
    ("DW_AT_upper_bound", 0x2f),
    ("DW_AT_ranges", 0x55),
    ("DW_AT_linkage_name", 0x6e),
];

pub const DW_FORMS: &[(&str, u64)] = &[
    ("DW_FORM_addr", 0x01),
    ("DW_FORM_block2", 0x03),
    ("DW_FORM_block4", 0x04),
    ("DW_FORM_data2", 0x05),
    ("DW_FORM_data4", 0x06),
    ("DW_FORM_data8", 0x07),
    ("DW_FORM_string", 0x08),
    ("DW_FORM_block", 0x09),
    ("DW_FORM_block1", 0x0a),
    ("DW_FORM_data1", 0x0b),
    ("DW_FORM_flag", 0x0c),
    ("DW_FORM_sdata", 0x0d),
    ("DW_FORM_strp", 0x0e),
    ("DW_FORM_udata", 0x0f),
    ("DW_FORM_ref_addr", 0x10),
    ("DW_FORM_ref1", 0x11),
    ("DW_FORM_ref2", 0x12),
    ("DW_FORM_ref4", 0x13),
    ("DW_FORM_ref8", 0x14),
    ("DW_FORM_ref_udata", 0x15),
    ("DW_FORM_indirect", 0x16),
    ("DW_FORM_sec_offset", 0x17),
    ("DW_FORM_exprloc", 0x18),
    ("DW_FORM_flag_present", 0x19),
    ("DW_FORM_ref_sig8", 0x20),
];

pub const DW_OPS: &[(&str, u64)] = &[
    ("DW_OP_addr", 0x03),
    ("DW_OP_deref", 0x06),
    ("DW_OP_dup", 0x12),
    ("DW_OP_drop", 0x13),
    ("DW_OP_minus", 0x1c),
    ("DW_OP_plus", 0x22),
    ("DW_OP_plus_uconst", 0x23),
    ("DW_OP_regx", 0x90),
    ("DW_OP_fbreg", 0x91),
    ("DW_OP_bregx", 0x92),
    ("DW_OP_piece", 0x93),
    ("DW_OP_call_frame_cfa", 0x9c),
    ("DW_OP_stack_value", 0x9f),
];

fn lookup_name(table: &[(&'static str, u64)], code: u64) -> Option<&'static str> {
    table
        .iter()
        .find_map(|&(name, c)| (c == code).then_some(name))
}

pub fn lookup_code(table: &[(&'static str, u64)], name: &str) -> Option<u64> {
    table
        .iter()
        .find_map(|&(n, code)| (n == name).then_some(code))
}

pub fn tag_name(code: u64) -> Option<&'static str> {
    lookup_name(DW_TAGS, code)
}

pub fn at_name(code: u64) -> Option<&'static str> {
    lookup_name(DW_ATS, code)
}

pub fn form_name(code: u64) -> Option<&'static str> {
    lookup_name(DW_FORMS, code)
}

pub fn op_name(code: u64) -> Option<&'static str> {
    lookup_name(DW_OPS, code)
}

/// Symbolic domain rendering through a name table. Arithmetic on these
/// is rejected by the arithmetic words.
pub struct NamedDomain {
    dom_name: &'static str,
    prefix: &'static str,
    table: &'static [(&'static str, u64)],
}

impl ConstantDomain for NamedDomain {
    fn name(&self) -> &'static str {
        self.dom_name
    }

    fn show(&self, value: &BigInt, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match value.to_u64().and_then(|v| lookup_name(self.table, v)) {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}{:#x}", self.prefix, value),
        }
    }
}

pub static TAG_DOMAIN: &dyn ConstantDomain = &NamedDomain {
    dom_name: "tag",
    prefix: "DW_TAG_",
    table: DW_TAGS,
};

pub static AT_DOMAIN: &dyn ConstantDomain = &NamedDomain {
    dom_name: "attr",
    prefix: "DW_AT_",
    table: DW_ATS,
};

pub static FORM_DOMAIN: &dyn ConstantDomain = &NamedDomain {
    dom_name: "form",
    prefix: "DW_FORM_",
    table: DW_FORMS,
};

pub static OP_DOMAIN: &dyn ConstantDomain = &NamedDomain {
    dom_name: "op",
    prefix: "DW_OP_",
    table: DW_OPS,
};

/// Language codes for DW_AT_language values, rendered as plain decimal.
pub const DW_LANG_C89: u64 = 0x01;
pub const DW_LANG_C: u64 = 0x02;
pub const DW_LANG_C_PLUS_PLUS: u64 = 0x04;
pub const DW_LANG_RUST: u64 = 0x1c;
