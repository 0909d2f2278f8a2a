//! JSON-backed reference reader.
//!
//! Consumes a dump format holding units and their DIE trees:
//!
//! ```json
//! {
//!   "units": [
//!     {
//!       "offset": 11, "version": 4,
//!       "root": {
//!         "offset": 11, "tag": "DW_TAG_compile_unit",
//!         "attrs": [
//!           {"at": "DW_AT_name", "form": "DW_FORM_string", "value": "f.c"}
//!         ],
//!         "children": [ ... ]
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! DIE offsets and the unit header fields are optional; missing offsets
//! are assigned in pre-order. Attribute values are decoded according to
//! their form: string forms take JSON strings, data forms numbers, flag
//! forms booleans, reference forms DIE offsets, `DW_FORM_exprloc` and
//! `DW_FORM_sec_offset` location lists as arrays of
//! `{"low": .., "high": .., "ops": [["DW_OP_fbreg", -16], ...]}`.
//! Abbreviation tables may be given explicitly; otherwise one is
//! synthesized per unit from the DIE shapes.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use serde::Deserialize;
use thiserror::Error;

use dwq_engine::error::Result as RunResult;

use crate::consts::{self, DW_ATS, DW_FORMS, DW_OPS, DW_TAGS};
use crate::info::{
    bad_offset, AbbrevData, AttrData, AttrValue, DebugInfo, DwHandle, LocEntry, LocOp, UnitInfo,
};

/// Errors while loading a dump.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown {family} name `{name}`")]
    UnknownName {
        family: &'static str,
        name: String,
    },

    #[error("attribute {at} has form {form} but an incompatible value")]
    BadAttrValue { at: String, form: String },

    #[error("duplicate DIE offset {0:#x}")]
    DuplicateOffset(u64),
}

#[derive(Deserialize)]
struct FileDoc {
    units: Vec<UnitDoc>,
}

#[derive(Deserialize)]
struct UnitDoc {
    offset: Option<u64>,
    version: Option<u16>,
    #[serde(default)]
    abbrevs: Vec<AbbrevDoc>,
    root: DieDoc,
}

#[derive(Deserialize)]
struct AbbrevDoc {
    code: u64,
    tag: String,
    has_children: bool,
    #[serde(default)]
    attrs: Vec<(String, String)>,
}

#[derive(Deserialize)]
struct DieDoc {
    offset: Option<u64>,
    tag: String,
    #[serde(default)]
    attrs: Vec<AttrDoc>,
    #[serde(default)]
    children: Vec<DieDoc>,
}

#[derive(Deserialize)]
struct AttrDoc {
    at: String,
    form: String,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Deserialize)]
struct LocEntryDoc {
    low: u64,
    high: u64,
    #[serde(default)]
    ops: Vec<serde_json::Value>,
}

struct Die {
    offset: u64,
    tag: u64,
    unit: usize,
    parent: Option<u64>,
    children: Vec<u64>,
    attrs: Vec<AttrData>,
    abbrev_code: u64,
}

struct Unit {
    offset: u64,
    version: u16,
    root: u64,
    dies: Vec<u64>,
    abbrevs: Vec<AbbrevData>,
}

/// The in-memory arena the JSON loader builds.
pub struct JsonDwarf {
    name: String,
    units: Vec<Unit>,
    dies: Vec<Die>,
    by_offset: HashMap<u64, usize>,
}

/// Load a dump from a file.
pub fn load_file(path: impl AsRef<Path>) -> Result<DwHandle, LoadError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_str(&text, &path.display().to_string())
}

/// Load a dump from a string; `name` is the display name.
pub fn load_str(text: &str, name: &str) -> Result<DwHandle, LoadError> {
    let doc: FileDoc = serde_json::from_str(text)?;
    let mut loader = Loader {
        dwarf: JsonDwarf {
            name: name.to_string(),
            units: Vec::new(),
            dies: Vec::new(),
            by_offset: HashMap::new(),
        },
        next_offset: 1,
    };
    for unit_doc in doc.units {
        loader.load_unit(unit_doc)?;
    }
    Ok(Rc::new(loader.dwarf))
}

struct Loader {
    dwarf: JsonDwarf,
    next_offset: u64,
}

impl Loader {
    fn load_unit(&mut self, doc: UnitDoc) -> Result<(), LoadError> {
        let unit_index = self.dwarf.units.len();
        let offset = doc.offset.unwrap_or(self.next_offset);
        let version = doc.version.unwrap_or(4);

        let root = self.load_die(doc.root, unit_index, None)?;
        let dies: Vec<u64> = self
            .dwarf
            .dies
            .iter()
            .filter(|d| d.unit == unit_index)
            .map(|d| d.offset)
            .collect();

        let abbrevs = if doc.abbrevs.is_empty() {
            self.synthesize_abbrevs(unit_index)
        } else {
            doc.abbrevs
                .into_iter()
                .map(|a| {
                    Ok(AbbrevData {
                        code: a.code,
                        tag: parse_name(DW_TAGS, "tag", &a.tag)?,
                        has_children: a.has_children,
                        attrs: a
                            .attrs
                            .iter()
                            .map(|(at, form)| {
                                Ok((
                                    parse_name(DW_ATS, "attribute", at)?,
                                    parse_name(DW_FORMS, "form", form)?,
                                ))
                            })
                            .collect::<Result<_, LoadError>>()?,
                    })
                })
                .collect::<Result<_, LoadError>>()?
        };

        self.dwarf.units.push(Unit {
            offset,
            version,
            root,
            dies,
            abbrevs,
        });
        Ok(())
    }

    fn load_die(
        &mut self,
        doc: DieDoc,
        unit: usize,
        parent: Option<u64>,
    ) -> Result<u64, LoadError> {
        let offset = match doc.offset {
            Some(off) => {
                self.next_offset = self.next_offset.max(off + 1);
                off
            }
            None => {
                let off = self.next_offset;
                self.next_offset += 1;
                off
            }
        };
        if self.dwarf.by_offset.contains_key(&offset) {
            return Err(LoadError::DuplicateOffset(offset));
        }

        let tag = parse_name(DW_TAGS, "tag", &doc.tag)?;
        let attrs = doc
            .attrs
            .into_iter()
            .map(|a| self.load_attr(a))
            .collect::<Result<Vec<_>, _>>()?;

        let index = self.dwarf.dies.len();
        self.dwarf.by_offset.insert(offset, index);
        self.dwarf.dies.push(Die {
            offset,
            tag,
            unit,
            parent,
            children: Vec::new(),
            attrs,
            abbrev_code: 0,
        });

        let mut children = Vec::with_capacity(doc.children.len());
        for child in doc.children {
            children.push(self.load_die(child, unit, Some(offset))?);
        }
        self.dwarf.dies[index].children = children;
        Ok(offset)
    }

    fn load_attr(&mut self, doc: AttrDoc) -> Result<AttrData, LoadError> {
        let at = parse_name(DW_ATS, "attribute", &doc.at)?;
        let form = parse_name(DW_FORMS, "form", &doc.form)?;
        let bad = || LoadError::BadAttrValue {
            at: doc.at.clone(),
            form: doc.form.clone(),
        };

        let value = match consts::form_name(form).unwrap_or("") {
            "DW_FORM_string" | "DW_FORM_strp" => {
                AttrValue::String(doc.value.as_str().ok_or_else(bad)?.to_string())
            }
            "DW_FORM_flag" | "DW_FORM_flag_present" => {
                AttrValue::Flag(doc.value.as_bool().unwrap_or(true))
            }
            "DW_FORM_addr" => AttrValue::Address(doc.value.as_u64().ok_or_else(bad)?),
            "DW_FORM_ref1" | "DW_FORM_ref2" | "DW_FORM_ref4" | "DW_FORM_ref8"
            | "DW_FORM_ref_udata" | "DW_FORM_ref_addr" | "DW_FORM_ref_sig8" => {
                AttrValue::Ref(doc.value.as_u64().ok_or_else(bad)?)
            }
            "DW_FORM_sdata" => AttrValue::Signed(doc.value.as_i64().ok_or_else(bad)?),
            "DW_FORM_exprloc" | "DW_FORM_sec_offset" if doc.value.is_array() => {
                let entries: Vec<LocEntryDoc> =
                    serde_json::from_value(doc.value.clone()).map_err(LoadError::Json)?;
                AttrValue::Loclist(
                    entries
                        .into_iter()
                        .map(|e| {
                            Ok(LocEntry {
                                low: e.low,
                                high: e.high,
                                ops: e
                                    .ops
                                    .into_iter()
                                    .map(|op| parse_loc_op(op, bad))
                                    .collect::<Result<_, LoadError>>()?,
                            })
                        })
                        .collect::<Result<_, LoadError>>()?,
                )
            }
            _ => AttrValue::Constant(doc.value.as_u64().ok_or_else(bad)?),
        };

        Ok(AttrData { at, form, value })
    }

    /// Assign abbreviation codes by distinct DIE shape, in pre-order of
    /// first appearance.
    fn synthesize_abbrevs(&mut self, unit: usize) -> Vec<AbbrevData> {
        let mut abbrevs: Vec<AbbrevData> = Vec::new();
        let indices: Vec<usize> = self
            .dwarf
            .dies
            .iter()
            .enumerate()
            .filter(|(_, d)| d.unit == unit)
            .map(|(i, _)| i)
            .collect();
        for index in indices {
            let die = &self.dwarf.dies[index];
            let shape = AbbrevData {
                code: 0,
                tag: die.tag,
                has_children: !die.children.is_empty(),
                attrs: die.attrs.iter().map(|a| (a.at, a.form)).collect(),
            };
            let code = match abbrevs.iter().find(|a| {
                a.tag == shape.tag
                    && a.has_children == shape.has_children
                    && a.attrs == shape.attrs
            }) {
                Some(existing) => existing.code,
                None => {
                    let code = abbrevs.len() as u64 + 1;
                    abbrevs.push(AbbrevData { code, ..shape });
                    code
                }
            };
            self.dwarf.dies[index].abbrev_code = code;
        }
        abbrevs
    }
}

fn parse_loc_op(
    value: serde_json::Value,
    bad: impl Fn() -> LoadError,
) -> Result<LocOp, LoadError> {
    let parts = value.as_array().ok_or_else(&bad)?;
    let name = parts.first().and_then(|v| v.as_str()).ok_or_else(&bad)?;
    let opcode = parse_name(DW_OPS, "loclist op", name)?;
    let operands = parts[1..]
        .iter()
        .map(|v| v.as_i64().ok_or_else(&bad))
        .collect::<Result<_, LoadError>>()?;
    Ok(LocOp { opcode, operands })
}

fn parse_name(
    table: &'static [(&'static str, u64)],
    family: &'static str,
    name: &str,
) -> Result<u64, LoadError> {
    consts::lookup_code(table, name).ok_or_else(|| LoadError::UnknownName {
        family,
        name: name.to_string(),
    })
}

impl JsonDwarf {
    fn die(&self, offset: u64) -> RunResult<&Die> {
        self.by_offset
            .get(&offset)
            .map(|&i| &self.dies[i])
            .ok_or_else(|| bad_offset(offset))
    }
}

impl DebugInfo for JsonDwarf {
    fn name(&self) -> &str {
        &self.name
    }

    fn units(&self) -> Vec<UnitInfo> {
        self.units
            .iter()
            .enumerate()
            .map(|(index, u)| UnitInfo {
                index,
                offset: u.offset,
                version: u.version,
                root: u.root,
            })
            .collect()
    }

    fn all_dies(&self) -> Vec<u64> {
        self.dies.iter().map(|d| d.offset).collect()
    }

    fn unit_dies(&self, unit: usize) -> Vec<u64> {
        self.units.get(unit).map(|u| u.dies.clone()).unwrap_or_default()
    }

    fn die_exists(&self, offset: u64) -> bool {
        self.by_offset.contains_key(&offset)
    }

    fn die_tag(&self, offset: u64) -> RunResult<u64> {
        Ok(self.die(offset)?.tag)
    }

    fn die_unit(&self, offset: u64) -> RunResult<usize> {
        Ok(self.die(offset)?.unit)
    }

    fn die_attrs(&self, offset: u64) -> RunResult<Vec<AttrData>> {
        Ok(self.die(offset)?.attrs.clone())
    }

    fn die_children(&self, offset: u64) -> RunResult<Vec<u64>> {
        Ok(self.die(offset)?.children.clone())
    }

    fn die_parent(&self, offset: u64) -> RunResult<Option<u64>> {
        Ok(self.die(offset)?.parent)
    }

    fn die_abbrev_code(&self, offset: u64) -> RunResult<u64> {
        Ok(self.die(offset)?.abbrev_code)
    }

    fn unit_abbrevs(&self, unit: usize) -> Vec<AbbrevData> {
        self.units
            .get(unit)
            .map(|u| u.abbrevs.clone())
            .unwrap_or_default()
    }
}
