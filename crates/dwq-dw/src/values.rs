//! Domain value types: the opaque payloads debug-info words push.
//!
//! All carry a shared handle to their file; comparing values from two
//! different files is meaningless and yields fail, everything else
//! orders by the value's identity within the file.

use std::any::Any;
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use dwq_engine::value::{DomainValue, TypeCode, DOMAIN_BASE};

use crate::consts;
use crate::info::{handle_id, AttrData, AttrValue, DwHandle, LocEntry, LocOp};

pub const T_DWARF: TypeCode = DOMAIN_BASE;
pub const T_CU: TypeCode = DOMAIN_BASE + 1;
pub const T_DIE: TypeCode = DOMAIN_BASE + 2;
pub const T_ATTR: TypeCode = DOMAIN_BASE + 3;
pub const T_ABBREV: TypeCode = DOMAIN_BASE + 4;
pub const T_LOCLIST_ELEM: TypeCode = DOMAIN_BASE + 5;
pub const T_LOCLIST_OP: TypeCode = DOMAIN_BASE + 6;

fn fingerprint_of(code: TypeCode, parts: &[u64]) -> u64 {
    let mut hasher = DefaultHasher::new();
    code.hash(&mut hasher);
    parts.hash(&mut hasher);
    hasher.finish()
}

fn short_tag(tag: u64) -> String {
    match consts::tag_name(tag) {
        Some(name) => name.trim_start_matches("DW_TAG_").to_string(),
        None => format!("{tag:#x}"),
    }
}

/// An open debug-info file, in its raw or cooked view.
#[derive(Clone)]
pub struct ValueDwarf {
    pub file: DwHandle,
    pub cooked: bool,
}

impl fmt::Debug for ValueDwarf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueDwarf({}, cooked={})", self.file.name(), self.cooked)
    }
}

impl DomainValue for ValueDwarf {
    fn type_code(&self) -> TypeCode {
        T_DWARF
    }

    fn type_name(&self) -> &'static str {
        "T_DWARF"
    }

    fn show(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<dwarf \"{}\">", self.file.name())
    }

    fn cmp_same(&self, other: &dyn DomainValue) -> Option<Ordering> {
        let other = other.as_any().downcast_ref::<ValueDwarf>()?;
        if handle_id(&self.file) != handle_id(&other.file) {
            return None;
        }
        Some(self.cooked.cmp(&other.cooked))
    }

    fn fingerprint(&self) -> u64 {
        fingerprint_of(T_DWARF, &[handle_id(&self.file) as u64, self.cooked as u64])
    }

    fn clone_box(&self) -> Box<dyn DomainValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A compilation unit.
#[derive(Clone)]
pub struct ValueCu {
    pub file: DwHandle,
    pub unit: usize,
    pub cooked: bool,
}

impl ValueCu {
    fn offset(&self) -> u64 {
        self.file
            .units()
            .get(self.unit)
            .map(|u| u.offset)
            .unwrap_or(0)
    }
}

impl fmt::Debug for ValueCu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueCu(unit={})", self.unit)
    }
}

impl DomainValue for ValueCu {
    fn type_code(&self) -> TypeCode {
        T_CU
    }

    fn type_name(&self) -> &'static str {
        "T_CU"
    }

    fn show(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<CU {:#x}>", self.offset())
    }

    fn cmp_same(&self, other: &dyn DomainValue) -> Option<Ordering> {
        let other = other.as_any().downcast_ref::<ValueCu>()?;
        if handle_id(&self.file) != handle_id(&other.file) {
            return None;
        }
        Some(
            self.unit
                .cmp(&other.unit)
                .then(self.cooked.cmp(&other.cooked)),
        )
    }

    fn fingerprint(&self) -> u64 {
        fingerprint_of(
            T_CU,
            &[
                handle_id(&self.file) as u64,
                self.unit as u64,
                self.cooked as u64,
            ],
        )
    }

    fn clone_box(&self) -> Box<dyn DomainValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A debug-info entry.
#[derive(Clone)]
pub struct ValueDie {
    pub file: DwHandle,
    pub offset: u64,
    pub cooked: bool,
}

impl fmt::Debug for ValueDie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueDie({:#x})", self.offset)
    }
}

impl DomainValue for ValueDie {
    fn type_code(&self) -> TypeCode {
        T_DIE
    }

    fn type_name(&self) -> &'static str {
        "T_DIE"
    }

    fn show(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.file.die_tag(self.offset) {
            Ok(tag) => write!(f, "[{:x}] {}", self.offset, short_tag(tag)),
            Err(_) => write!(f, "[{:x}] <bad offset>", self.offset),
        }
    }

    fn cmp_same(&self, other: &dyn DomainValue) -> Option<Ordering> {
        let other = other.as_any().downcast_ref::<ValueDie>()?;
        if handle_id(&self.file) != handle_id(&other.file) {
            return None;
        }
        Some(
            self.offset
                .cmp(&other.offset)
                .then(self.cooked.cmp(&other.cooked)),
        )
    }

    fn fingerprint(&self) -> u64 {
        fingerprint_of(
            T_DIE,
            &[
                handle_id(&self.file) as u64,
                self.offset,
                self.cooked as u64,
            ],
        )
    }

    fn clone_box(&self) -> Box<dyn DomainValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn show_attr_value(value: &AttrValue, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match value {
        AttrValue::Constant(v) => write!(f, "{v}"),
        AttrValue::Signed(v) => write!(f, "{v}"),
        AttrValue::String(s) => write!(f, "\"{s}\""),
        AttrValue::Flag(b) => write!(f, "{b}"),
        AttrValue::Ref(off) => write!(f, "[{off:x}]"),
        AttrValue::Address(addr) => write!(f, "{addr:#x}"),
        AttrValue::Loclist(entries) => {
            let mut sep = false;
            for entry in entries {
                if sep {
                    write!(f, ", ")?;
                }
                sep = true;
                show_loc_entry(entry, f)?;
            }
            Ok(())
        }
    }
}

fn show_loc_entry(entry: &LocEntry, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{:#x}..{:#x}:[", entry.low, entry.high)?;
    let mut sep = false;
    for op in &entry.ops {
        if sep {
            write!(f, ", ")?;
        }
        sep = true;
        show_loc_op(op, f)?;
    }
    write!(f, "]")
}

fn show_loc_op(op: &LocOp, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match consts::op_name(op.opcode) {
        Some(name) => write!(f, "{name}")?,
        None => write!(f, "DW_OP_{:#x}", op.opcode)?,
    }
    for operand in &op.operands {
        write!(f, " {operand}")?;
    }
    Ok(())
}

fn loc_entry_key(entry: &LocEntry) -> Vec<u64> {
    let mut key = vec![entry.low, entry.high];
    for op in &entry.ops {
        key.push(op.opcode);
        for operand in &op.operands {
            key.push(*operand as u64);
        }
    }
    key
}

/// A DIE attribute with its decoded value.
#[derive(Clone)]
pub struct ValueAttr {
    pub file: DwHandle,
    /// Offset of the DIE the attribute sits on.
    pub die: u64,
    pub data: AttrData,
    pub cooked: bool,
}

impl fmt::Debug for ValueAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueAttr(die={:#x}, at={:#x})", self.die, self.data.at)
    }
}

impl DomainValue for ValueAttr {
    fn type_code(&self) -> TypeCode {
        T_ATTR
    }

    fn type_name(&self) -> &'static str {
        "T_ATTR"
    }

    fn show(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match consts::at_name(self.data.at) {
            Some(name) => write!(f, "{} ", name.trim_start_matches("DW_AT_"))?,
            None => write!(f, "DW_AT_{:#x} ", self.data.at)?,
        }
        write!(f, "(")?;
        show_attr_value(&self.data.value, f)?;
        write!(f, ")")
    }

    fn cmp_same(&self, other: &dyn DomainValue) -> Option<Ordering> {
        let other = other.as_any().downcast_ref::<ValueAttr>()?;
        if handle_id(&self.file) != handle_id(&other.file) {
            return None;
        }
        Some(
            self.die
                .cmp(&other.die)
                .then(self.data.at.cmp(&other.data.at)),
        )
    }

    fn fingerprint(&self) -> u64 {
        fingerprint_of(
            T_ATTR,
            &[handle_id(&self.file) as u64, self.die, self.data.at],
        )
    }

    fn clone_box(&self) -> Box<dyn DomainValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One entry of a unit's abbreviation table.
#[derive(Clone)]
pub struct ValueAbbrev {
    pub file: DwHandle,
    pub unit: usize,
    pub code: u64,
    pub tag: u64,
    pub has_children: bool,
}

impl fmt::Debug for ValueAbbrev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueAbbrev(unit={}, code={})", self.unit, self.code)
    }
}

impl DomainValue for ValueAbbrev {
    fn type_code(&self) -> TypeCode {
        T_ABBREV
    }

    fn type_name(&self) -> &'static str {
        "T_ABBREV"
    }

    fn show(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} children:{}",
            self.code,
            short_tag(self.tag),
            if self.has_children { "yes" } else { "no" }
        )
    }

    fn cmp_same(&self, other: &dyn DomainValue) -> Option<Ordering> {
        let other = other.as_any().downcast_ref::<ValueAbbrev>()?;
        if handle_id(&self.file) != handle_id(&other.file) {
            return None;
        }
        Some(
            self.unit
                .cmp(&other.unit)
                .then(self.code.cmp(&other.code)),
        )
    }

    fn fingerprint(&self) -> u64 {
        fingerprint_of(
            T_ABBREV,
            &[handle_id(&self.file) as u64, self.unit as u64, self.code],
        )
    }

    fn clone_box(&self) -> Box<dyn DomainValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One element of a location list.
#[derive(Clone)]
pub struct ValueLocElem {
    pub file: DwHandle,
    pub entry: LocEntry,
}

impl fmt::Debug for ValueLocElem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ValueLocElem({:#x}..{:#x})",
            self.entry.low, self.entry.high
        )
    }
}

impl DomainValue for ValueLocElem {
    fn type_code(&self) -> TypeCode {
        T_LOCLIST_ELEM
    }

    fn type_name(&self) -> &'static str {
        "T_LOCLIST_ELEM"
    }

    fn show(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        show_loc_entry(&self.entry, f)
    }

    fn cmp_same(&self, other: &dyn DomainValue) -> Option<Ordering> {
        let other = other.as_any().downcast_ref::<ValueLocElem>()?;
        if handle_id(&self.file) != handle_id(&other.file) {
            return None;
        }
        Some(loc_entry_key(&self.entry).cmp(&loc_entry_key(&other.entry)))
    }

    fn fingerprint(&self) -> u64 {
        let mut parts = vec![handle_id(&self.file) as u64];
        parts.extend(loc_entry_key(&self.entry));
        fingerprint_of(T_LOCLIST_ELEM, &parts)
    }

    fn clone_box(&self) -> Box<dyn DomainValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One operator of a location expression.
#[derive(Clone)]
pub struct ValueLocOp {
    pub op: LocOp,
}

impl fmt::Debug for ValueLocOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueLocOp({:#x})", self.op.opcode)
    }
}

impl DomainValue for ValueLocOp {
    fn type_code(&self) -> TypeCode {
        T_LOCLIST_OP
    }

    fn type_name(&self) -> &'static str {
        "T_LOCLIST_OP"
    }

    fn show(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        show_loc_op(&self.op, f)
    }

    fn cmp_same(&self, other: &dyn DomainValue) -> Option<Ordering> {
        let other = other.as_any().downcast_ref::<ValueLocOp>()?;
        Some(
            self.op
                .opcode
                .cmp(&other.op.opcode)
                .then_with(|| self.op.operands.cmp(&other.op.operands)),
        )
    }

    fn fingerprint(&self) -> u64 {
        let mut parts = vec![self.op.opcode];
        parts.extend(self.op.operands.iter().map(|&v| v as u64));
        fingerprint_of(T_LOCLIST_OP, &parts)
    }

    fn clone_box(&self) -> Box<dyn DomainValue> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
