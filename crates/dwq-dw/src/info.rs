//! The debug-info collaborator interface.
//!
//! The engine core never reads debug info itself; the domain words do,
//! through this capability trait. A reader exposes compilation units,
//! DIE enumeration, children, attributes with typed values, abbreviation
//! tables, loclists, and cached parent links. DIEs and units are
//! addressed by their section offsets.
//!
//! The crate ships one implementation, the JSON-backed reader in
//! [`crate::json`]; real ELF/DWARF decoding is a separate concern and
//! plugs in through this same trait.

use std::rc::Rc;

use dwq_engine::error::{Error, Result};

/// Typed attribute payload, already decoded according to its form.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Constant(u64),
    Signed(i64),
    String(String),
    Flag(bool),
    /// DIE reference by offset.
    Ref(u64),
    Address(u64),
    /// Location list: (range, expression) pairs.
    Loclist(Vec<LocEntry>),
}

/// One element of a location list.
#[derive(Debug, Clone, PartialEq)]
pub struct LocEntry {
    pub low: u64,
    pub high: u64,
    pub ops: Vec<LocOp>,
}

/// One operator of a location expression.
#[derive(Debug, Clone, PartialEq)]
pub struct LocOp {
    pub opcode: u64,
    pub operands: Vec<i64>,
}

/// A DIE attribute: name code, form code, decoded value.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrData {
    pub at: u64,
    pub form: u64,
    pub value: AttrValue,
}

/// One entry of a unit's abbreviation table.
#[derive(Debug, Clone, PartialEq)]
pub struct AbbrevData {
    pub code: u64,
    pub tag: u64,
    pub has_children: bool,
    /// (attribute, form) pairs.
    pub attrs: Vec<(u64, u64)>,
}

/// Compilation-unit header data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitInfo {
    pub index: usize,
    pub offset: u64,
    pub version: u16,
    /// Offset of the unit's root DIE.
    pub root: u64,
}

/// Capability object over one debug-info file.
pub trait DebugInfo {
    /// Display name of the file.
    fn name(&self) -> &str;

    fn units(&self) -> Vec<UnitInfo>;

    /// All DIE offsets of the file in pre-order, units in order.
    fn all_dies(&self) -> Vec<u64>;

    /// DIE offsets of one unit in pre-order.
    fn unit_dies(&self, unit: usize) -> Vec<u64>;

    fn die_exists(&self, offset: u64) -> bool;
    fn die_tag(&self, offset: u64) -> Result<u64>;
    fn die_unit(&self, offset: u64) -> Result<usize>;
    fn die_attrs(&self, offset: u64) -> Result<Vec<AttrData>>;
    fn die_children(&self, offset: u64) -> Result<Vec<u64>>;

    /// Parent DIE offset; `None` for unit roots. Implementations
    /// precompute this at load time.
    fn die_parent(&self, offset: u64) -> Result<Option<u64>>;

    /// Abbreviation code the DIE was encoded with.
    fn die_abbrev_code(&self, offset: u64) -> Result<u64>;

    fn unit_abbrevs(&self, unit: usize) -> Vec<AbbrevData>;
}

/// Shared handle to an open debug-info file.
pub type DwHandle = Rc<dyn DebugInfo>;

/// Identity of a handle, used for comparing values across files.
pub fn handle_id(handle: &DwHandle) -> usize {
    Rc::as_ptr(handle) as *const () as usize
}

pub fn bad_offset(offset: u64) -> Error {
    Error::DebugInfo(format!("no DIE at offset {offset:#x}"))
}

pub fn bad_unit(unit: usize) -> Error {
    Error::DebugInfo(format!("no unit with index {unit}"))
}
