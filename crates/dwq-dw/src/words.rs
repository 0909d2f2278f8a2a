//! The debug-info word catalog.
//!
//! Registers the domain words against the [`crate::info::DebugInfo`]
//! capability: file and unit traversal (`dwopen`, `unit`, `entry`,
//! `root`, `child`, `parent`), attribute access (`attribute`, `label`,
//! `form`, `value`, `name`), addresses (`low`, `high`, `address`),
//! abbreviation tables (`abbrev`, `code`), loclists (`elem`, `value` on
//! ops), the raw/cooked view switches, and the generated `@AT_*`,
//! `?AT_*`, `?TAG_*`, `?FORM_*`, `?OP_*` families plus the `DW_*`
//! constants.

use std::collections::HashSet;
use std::rc::Rc;

use dwq_engine::constant::{Constant, ADDRESS_DOMAIN, DEC_DOMAIN, HEX_DOMAIN};
use dwq_engine::coverage::Coverage;
use dwq_engine::error::{Error, Result};
use dwq_engine::overload::OverloadExec;
use dwq_engine::pred::PredResult;
use dwq_engine::producer::VecProducer;
use dwq_engine::value::{Value, T_STR};
use dwq_engine::Vocabulary;

use crate::consts::{
    AT_DOMAIN, DW_ATS, DW_FORMS, DW_OPS, DW_TAGS, FORM_DOMAIN, OP_DOMAIN, TAG_DOMAIN,
};
use crate::info::{bad_unit, AttrData, AttrValue, DwHandle};
use crate::json;
use crate::values::{
    ValueAbbrev, ValueAttr, ValueCu, ValueDie, ValueDwarf, ValueLocElem, ValueLocOp, T_ABBREV,
    T_ATTR, T_CU, T_DIE, T_DWARF, T_LOCLIST_ELEM, T_LOCLIST_OP,
};

const TAG_PARTIAL_UNIT: u64 = 0x3c;
const TAG_IMPORTED_UNIT: u64 = 0x3d;
const AT_NAME: u64 = 0x03;
const AT_IMPORT: u64 = 0x18;
const AT_LOW_PC: u64 = 0x11;
const AT_HIGH_PC: u64 = 0x12;
const AT_SPECIFICATION: u64 = 0x47;
const AT_ABSTRACT_ORIGIN: u64 = 0x31;

/// Wrap a file handle into its initial value, the cooked view.
pub fn dwarf_value(file: DwHandle) -> Value {
    Value::domain(Box::new(ValueDwarf { file, cooked: true }))
}

fn die_value(file: &DwHandle, offset: u64, cooked: bool) -> Value {
    Value::domain(Box::new(ValueDie {
        file: file.clone(),
        offset,
        cooked,
    }))
}

/// Children in the requested view. The cooked view splices imported
/// units: an imported_unit child stands for the children of the partial
/// unit it references.
fn children_of(file: &DwHandle, offset: u64, cooked: bool) -> Result<Vec<u64>> {
    let kids = file.die_children(offset)?;
    if !cooked {
        return Ok(kids);
    }
    let mut out = Vec::with_capacity(kids.len());
    for kid in kids {
        if file.die_tag(kid)? == TAG_IMPORTED_UNIT {
            let import = file
                .die_attrs(kid)?
                .into_iter()
                .find(|a| a.at == AT_IMPORT);
            if let Some(AttrData {
                value: AttrValue::Ref(target),
                ..
            }) = import
            {
                out.extend(file.die_children(target)?);
                continue;
            }
        }
        out.push(kid);
    }
    Ok(out)
}

/// Attributes in the requested view. The cooked view follows
/// DW_AT_specification and DW_AT_abstract_origin links, merging in
/// attributes not shadowed closer to the DIE.
fn attrs_of(file: &DwHandle, offset: u64, cooked: bool) -> Result<Vec<AttrData>> {
    let mut attrs = file.die_attrs(offset)?;
    if !cooked {
        return Ok(attrs);
    }
    let mut visited = HashSet::from([offset]);
    let mut cursor = offset;
    loop {
        let link = file
            .die_attrs(cursor)?
            .into_iter()
            .find_map(|a| match (a.at, &a.value) {
                (AT_SPECIFICATION | AT_ABSTRACT_ORIGIN, AttrValue::Ref(target)) => Some(*target),
                _ => None,
            });
        let Some(target) = link else {
            return Ok(attrs);
        };
        if !visited.insert(target) {
            return Ok(attrs);
        }
        for inherited in file.die_attrs(target)? {
            let is_link = inherited.at == AT_SPECIFICATION || inherited.at == AT_ABSTRACT_ORIGIN;
            if !is_link && !attrs.iter().any(|a| a.at == inherited.at) {
                attrs.push(inherited);
            }
        }
        cursor = target;
    }
}

fn attr_lookup(file: &DwHandle, offset: u64, at: u64, cooked: bool) -> Result<Option<AttrData>> {
    Ok(attrs_of(file, offset, cooked)?
        .into_iter()
        .find(|a| a.at == at))
}

/// Pre-order walk of one unit in the requested view.
fn walk(file: &DwHandle, root: u64, cooked: bool, out: &mut Vec<u64>) -> Result<()> {
    let mut visited = HashSet::new();
    let mut pending = vec![root];
    while let Some(offset) = pending.pop() {
        if !visited.insert(offset) {
            continue;
        }
        out.push(offset);
        let kids = children_of(file, offset, cooked)?;
        for kid in kids.into_iter().rev() {
            pending.push(kid);
        }
    }
    Ok(())
}

/// All DIEs of the file in the requested view. The cooked view walks
/// the logical trees and leaves partial units to their importers.
fn entries_of_file(file: &DwHandle, cooked: bool) -> Result<Vec<u64>> {
    if !cooked {
        return Ok(file.all_dies());
    }
    let mut out = Vec::new();
    for unit in file.units() {
        if file.die_tag(unit.root)? == TAG_PARTIAL_UNIT {
            continue;
        }
        walk(file, unit.root, cooked, &mut out)?;
    }
    Ok(out)
}

/// Decode an attribute into the values it contributes.
fn attr_values(file: &DwHandle, attr: &AttrData, cooked: bool) -> Vec<Value> {
    match &attr.value {
        AttrValue::Constant(v) => vec![Value::cst(Constant::new(*v, DEC_DOMAIN))],
        AttrValue::Signed(v) => vec![Value::cst(Constant::new(*v, DEC_DOMAIN))],
        AttrValue::String(s) => vec![Value::str(s.clone())],
        AttrValue::Flag(b) => vec![Value::cst(Constant::bool(*b))],
        AttrValue::Ref(target) => vec![die_value(file, *target, cooked)],
        AttrValue::Address(a) => vec![Value::cst(Constant::new(*a, ADDRESS_DOMAIN))],
        AttrValue::Loclist(entries) => entries
            .iter()
            .map(|entry| {
                Value::domain(Box::new(ValueLocElem {
                    file: file.clone(),
                    entry: entry.clone(),
                }))
            })
            .collect(),
    }
}

/// The DIE's code address range, if it has one.
fn die_addresses(file: &DwHandle, offset: u64, cooked: bool) -> Result<Coverage> {
    let Some(low) = attr_lookup(file, offset, AT_LOW_PC, cooked)? else {
        return Ok(Coverage::new());
    };
    let AttrValue::Address(low) = low.value else {
        return Ok(Coverage::new());
    };
    let Some(high) = attr_lookup(file, offset, AT_HIGH_PC, cooked)? else {
        return Ok(Coverage::new());
    };
    // An address form holds the end directly, constant forms the
    // offset from low_pc.
    let high = match high.value {
        AttrValue::Address(end) => end,
        AttrValue::Constant(len) => low + len,
        AttrValue::Signed(len) => low.saturating_add_signed(len),
        _ => return Ok(Coverage::new()),
    };
    if high <= low {
        return Ok(Coverage::new());
    }
    Ok(Coverage::range(low, high - low))
}

fn yield_values(values: Vec<Value>) -> Result<Box<dyn dwq_engine::producer::ValueProducer>> {
    Ok(Box::new(VecProducer::new(values)))
}

fn register_traversal(voc: &mut Vocabulary) {
    // Open a debug-info dump; the cooked view is the default.
    voc.add_op_overload(
        "dwopen",
        vec![T_STR],
        OverloadExec::Once(Rc::new(|args| {
            let path = args[0].as_str().unwrap();
            let file =
                json::load_file(path).map_err(|e| Error::DebugInfo(e.to_string()))?;
            Ok(Some(dwarf_value(file)))
        })),
    );

    voc.add_op_overload(
        "unit",
        vec![T_DWARF],
        OverloadExec::Yielding(Rc::new(|args| {
            let dw = args[0].as_domain::<ValueDwarf>().unwrap();
            let values = dw
                .file
                .units()
                .iter()
                .map(|u| {
                    Value::domain(Box::new(ValueCu {
                        file: dw.file.clone(),
                        unit: u.index,
                        cooked: dw.cooked,
                    }))
                })
                .collect();
            yield_values(values)
        })),
    );

    // The unit a DIE belongs to.
    voc.add_op_overload(
        "unit",
        vec![T_DIE],
        OverloadExec::Yielding(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let unit = die.file.die_unit(die.offset)?;
            yield_values(vec![Value::domain(Box::new(ValueCu {
                file: die.file.clone(),
                unit,
                cooked: die.cooked,
            }))])
        })),
    );

    voc.add_op_overload(
        "entry",
        vec![T_DWARF],
        OverloadExec::Yielding(Rc::new(|args| {
            let dw = args[0].as_domain::<ValueDwarf>().unwrap();
            let values = entries_of_file(&dw.file, dw.cooked)?
                .into_iter()
                .map(|off| die_value(&dw.file, off, dw.cooked))
                .collect();
            yield_values(values)
        })),
    );

    voc.add_op_overload(
        "entry",
        vec![T_CU],
        OverloadExec::Yielding(Rc::new(|args| {
            let cu = args[0].as_domain::<ValueCu>().unwrap();
            let info = cu
                .file
                .units()
                .get(cu.unit)
                .copied()
                .ok_or_else(|| bad_unit(cu.unit))?;
            let mut offsets = Vec::new();
            walk(&cu.file, info.root, cu.cooked, &mut offsets)?;
            let values = offsets
                .into_iter()
                .map(|off| die_value(&cu.file, off, cu.cooked))
                .collect();
            yield_values(values)
        })),
    );

    voc.add_op_overload(
        "root",
        vec![T_CU],
        OverloadExec::Yielding(Rc::new(|args| {
            let cu = args[0].as_domain::<ValueCu>().unwrap();
            let info = cu
                .file
                .units()
                .get(cu.unit)
                .copied()
                .ok_or_else(|| bad_unit(cu.unit))?;
            yield_values(vec![die_value(&cu.file, info.root, cu.cooked)])
        })),
    );

    // The root of the unit the DIE belongs to.
    voc.add_op_overload(
        "root",
        vec![T_DIE],
        OverloadExec::Yielding(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let unit = die.file.die_unit(die.offset)?;
            let info = die
                .file
                .units()
                .get(unit)
                .copied()
                .ok_or_else(|| bad_unit(unit))?;
            yield_values(vec![die_value(&die.file, info.root, die.cooked)])
        })),
    );

    voc.add_op_overload(
        "child",
        vec![T_DIE],
        OverloadExec::Yielding(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let values = children_of(&die.file, die.offset, die.cooked)?
                .into_iter()
                .map(|off| die_value(&die.file, off, die.cooked))
                .collect();
            yield_values(values)
        })),
    );

    voc.add_op_overload(
        "parent",
        vec![T_DIE],
        OverloadExec::Yielding(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let values = die
                .file
                .die_parent(die.offset)?
                .map(|off| die_value(&die.file, off, die.cooked))
                .into_iter()
                .collect();
            yield_values(values)
        })),
    );

    voc.add_pred_overload(
        "?root",
        vec![T_DIE],
        Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            Ok(PredResult::from_bool(
                die.file.die_parent(die.offset)?.is_none(),
            ))
        }),
    );

    voc.add_pred_overload(
        "?haschildren",
        vec![T_DIE],
        Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            Ok(PredResult::from_bool(
                !die.file.die_children(die.offset)?.is_empty(),
            ))
        }),
    );

    voc.add_pred_overload(
        "?haschildren",
        vec![T_ABBREV],
        Rc::new(|args| {
            let abbrev = args[0].as_domain::<ValueAbbrev>().unwrap();
            Ok(PredResult::from_bool(abbrev.has_children))
        }),
    );
}

fn register_views(voc: &mut Vocabulary) {
    fn with_view(value: &Value, cooked: bool) -> Value {
        if let Some(dw) = value.as_domain::<ValueDwarf>() {
            return Value::domain(Box::new(ValueDwarf {
                file: dw.file.clone(),
                cooked,
            }));
        }
        if let Some(cu) = value.as_domain::<ValueCu>() {
            return Value::domain(Box::new(ValueCu {
                file: cu.file.clone(),
                unit: cu.unit,
                cooked,
            }));
        }
        if let Some(die) = value.as_domain::<ValueDie>() {
            return die_value(&die.file, die.offset, cooked);
        }
        if let Some(attr) = value.as_domain::<ValueAttr>() {
            return Value::domain(Box::new(ValueAttr {
                file: attr.file.clone(),
                die: attr.die,
                data: attr.data.clone(),
                cooked,
            }));
        }
        value.clone()
    }

    for (word, cooked) in [("raw", false), ("cooked", true)] {
        for code in [T_DWARF, T_CU, T_DIE, T_ATTR] {
            voc.add_op_overload(
                word,
                vec![code],
                OverloadExec::Once(Rc::new(move |args| {
                    Ok(Some(with_view(&args[0], cooked)))
                })),
            );
        }
    }
}

fn register_attributes(voc: &mut Vocabulary) {
    voc.add_op_overload(
        "attribute",
        vec![T_DIE],
        OverloadExec::Yielding(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let values = attrs_of(&die.file, die.offset, die.cooked)?
                .into_iter()
                .map(|data| {
                    Value::domain(Box::new(ValueAttr {
                        file: die.file.clone(),
                        die: die.offset,
                        data,
                        cooked: die.cooked,
                    }))
                })
                .collect();
            yield_values(values)
        })),
    );

    voc.add_op_overload(
        "label",
        vec![T_DIE],
        OverloadExec::Once(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let tag = die.file.die_tag(die.offset)?;
            Ok(Some(Value::cst(Constant::new(tag, TAG_DOMAIN))))
        })),
    );

    voc.add_op_overload(
        "label",
        vec![T_ATTR],
        OverloadExec::Once(Rc::new(|args| {
            let attr = args[0].as_domain::<ValueAttr>().unwrap();
            Ok(Some(Value::cst(Constant::new(attr.data.at, AT_DOMAIN))))
        })),
    );

    voc.add_op_overload(
        "label",
        vec![T_ABBREV],
        OverloadExec::Once(Rc::new(|args| {
            let abbrev = args[0].as_domain::<ValueAbbrev>().unwrap();
            Ok(Some(Value::cst(Constant::new(abbrev.tag, TAG_DOMAIN))))
        })),
    );

    voc.add_op_overload(
        "form",
        vec![T_ATTR],
        OverloadExec::Once(Rc::new(|args| {
            let attr = args[0].as_domain::<ValueAttr>().unwrap();
            Ok(Some(Value::cst(Constant::new(
                attr.data.form,
                FORM_DOMAIN,
            ))))
        })),
    );

    voc.add_op_overload(
        "value",
        vec![T_ATTR],
        OverloadExec::Yielding(Rc::new(|args| {
            let attr = args[0].as_domain::<ValueAttr>().unwrap();
            yield_values(attr_values(&attr.file, &attr.data, attr.cooked))
        })),
    );

    voc.add_op_overload(
        "value",
        vec![T_LOCLIST_OP],
        OverloadExec::Yielding(Rc::new(|args| {
            let op = args[0].as_domain::<ValueLocOp>().unwrap();
            let values = op
                .op
                .operands
                .iter()
                .map(|&v| Value::cst(Constant::new(v, DEC_DOMAIN)))
                .collect();
            yield_values(values)
        })),
    );

    voc.add_op_overload(
        "offset",
        vec![T_DIE],
        OverloadExec::Once(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            Ok(Some(Value::cst(Constant::new(die.offset, HEX_DOMAIN))))
        })),
    );

    voc.add_op_overload(
        "offset",
        vec![T_CU],
        OverloadExec::Once(Rc::new(|args| {
            let cu = args[0].as_domain::<ValueCu>().unwrap();
            let info = cu
                .file
                .units()
                .get(cu.unit)
                .copied()
                .ok_or_else(|| bad_unit(cu.unit))?;
            Ok(Some(Value::cst(Constant::new(info.offset, HEX_DOMAIN))))
        })),
    );

    voc.add_op_overload(
        "name",
        vec![T_DWARF],
        OverloadExec::Yielding(Rc::new(|args| {
            let dw = args[0].as_domain::<ValueDwarf>().unwrap();
            yield_values(vec![Value::str(dw.file.name())])
        })),
    );

    voc.add_op_overload(
        "name",
        vec![T_DIE],
        OverloadExec::Yielding(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let values = match attr_lookup(&die.file, die.offset, AT_NAME, die.cooked)? {
                Some(AttrData {
                    value: AttrValue::String(s),
                    ..
                }) => vec![Value::str(s)],
                _ => Vec::new(),
            };
            yield_values(values)
        })),
    );

    voc.add_op_overload(
        "version",
        vec![T_CU],
        OverloadExec::Once(Rc::new(|args| {
            let cu = args[0].as_domain::<ValueCu>().unwrap();
            let info = cu
                .file
                .units()
                .get(cu.unit)
                .copied()
                .ok_or_else(|| bad_unit(cu.unit))?;
            Ok(Some(Value::cst(Constant::dec(info.version))))
        })),
    );
}

fn register_addresses(voc: &mut Vocabulary) {
    voc.add_op_overload(
        "low",
        vec![T_DIE],
        OverloadExec::Yielding(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let values = match attr_lookup(&die.file, die.offset, AT_LOW_PC, die.cooked)? {
                Some(AttrData {
                    value: AttrValue::Address(a),
                    ..
                }) => vec![Value::cst(Constant::new(a, ADDRESS_DOMAIN))],
                _ => Vec::new(),
            };
            yield_values(values)
        })),
    );

    voc.add_op_overload(
        "high",
        vec![T_DIE],
        OverloadExec::Yielding(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let cov = die_addresses(&die.file, die.offset, die.cooked)?;
            let values = cov
                .ranges()
                .last()
                .map(|r| Value::cst(Constant::new(r.end(), ADDRESS_DOMAIN)))
                .into_iter()
                .collect();
            yield_values(values)
        })),
    );

    voc.add_op_overload(
        "address",
        vec![T_DIE],
        OverloadExec::Yielding(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let cov = die_addresses(&die.file, die.offset, die.cooked)?;
            let values = if cov.is_empty() {
                Vec::new()
            } else {
                vec![Value::addr_set(cov)]
            };
            yield_values(values)
        })),
    );

    voc.add_op_overload(
        "address",
        vec![T_LOCLIST_ELEM],
        OverloadExec::Once(Rc::new(|args| {
            let elem = args[0].as_domain::<ValueLocElem>().unwrap();
            let len = elem.entry.high.saturating_sub(elem.entry.low);
            Ok(Some(Value::addr_set(Coverage::range(elem.entry.low, len))))
        })),
    );

    voc.add_op_overload(
        "low",
        vec![T_LOCLIST_ELEM],
        OverloadExec::Once(Rc::new(|args| {
            let elem = args[0].as_domain::<ValueLocElem>().unwrap();
            Ok(Some(Value::cst(Constant::new(
                elem.entry.low,
                ADDRESS_DOMAIN,
            ))))
        })),
    );

    voc.add_op_overload(
        "high",
        vec![T_LOCLIST_ELEM],
        OverloadExec::Once(Rc::new(|args| {
            let elem = args[0].as_domain::<ValueLocElem>().unwrap();
            Ok(Some(Value::cst(Constant::new(
                elem.entry.high,
                ADDRESS_DOMAIN,
            ))))
        })),
    );

    voc.add_op_overload(
        "elem",
        vec![T_LOCLIST_ELEM],
        OverloadExec::Yielding(Rc::new(|args| {
            let elem = args[0].as_domain::<ValueLocElem>().unwrap();
            let values = elem
                .entry
                .ops
                .iter()
                .map(|op| Value::domain(Box::new(ValueLocOp { op: op.clone() })))
                .collect();
            yield_values(values)
        })),
    );
}

fn register_abbrevs(voc: &mut Vocabulary) {
    fn abbrev_value(file: &DwHandle, unit: usize, data: &crate::info::AbbrevData) -> Value {
        Value::domain(Box::new(ValueAbbrev {
            file: file.clone(),
            unit,
            code: data.code,
            tag: data.tag,
            has_children: data.has_children,
        }))
    }

    voc.add_op_overload(
        "abbrev",
        vec![T_CU],
        OverloadExec::Yielding(Rc::new(|args| {
            let cu = args[0].as_domain::<ValueCu>().unwrap();
            let values = cu
                .file
                .unit_abbrevs(cu.unit)
                .iter()
                .map(|a| abbrev_value(&cu.file, cu.unit, a))
                .collect();
            yield_values(values)
        })),
    );

    // The abbreviation entry the DIE was encoded with.
    voc.add_op_overload(
        "abbrev",
        vec![T_DIE],
        OverloadExec::Yielding(Rc::new(|args| {
            let die = args[0].as_domain::<ValueDie>().unwrap();
            let unit = die.file.die_unit(die.offset)?;
            let code = die.file.die_abbrev_code(die.offset)?;
            let values = die
                .file
                .unit_abbrevs(unit)
                .iter()
                .filter(|a| a.code == code)
                .map(|a| abbrev_value(&die.file, unit, a))
                .collect();
            yield_values(values)
        })),
    );

    voc.add_op_overload(
        "code",
        vec![T_ABBREV],
        OverloadExec::Once(Rc::new(|args| {
            let abbrev = args[0].as_domain::<ValueAbbrev>().unwrap();
            Ok(Some(Value::cst(Constant::dec(abbrev.code))))
        })),
    );
}

fn register_families(voc: &mut Vocabulary) {
    // @AT_*: attribute values at a DIE.
    for &(name, at) in DW_ATS {
        let word = format!("@{}", name.trim_start_matches("DW_"));
        voc.add_op_overload(
            &word,
            vec![T_DIE],
            OverloadExec::Yielding(Rc::new(move |args| {
                let die = args[0].as_domain::<ValueDie>().unwrap();
                let values = match attr_lookup(&die.file, die.offset, at, die.cooked)? {
                    Some(data) => attr_values(&die.file, &data, die.cooked),
                    None => Vec::new(),
                };
                yield_values(values)
            })),
        );

        // ?AT_*: the DIE has the attribute / the attribute is the one.
        let word = format!("?{}", name.trim_start_matches("DW_"));
        voc.add_pred_overload(
            &word,
            vec![T_DIE],
            Rc::new(move |args| {
                let die = args[0].as_domain::<ValueDie>().unwrap();
                Ok(PredResult::from_bool(
                    attr_lookup(&die.file, die.offset, at, die.cooked)?.is_some(),
                ))
            }),
        );
        voc.add_pred_overload(
            &word,
            vec![T_ATTR],
            Rc::new(move |args| {
                let attr = args[0].as_domain::<ValueAttr>().unwrap();
                Ok(PredResult::from_bool(attr.data.at == at))
            }),
        );
    }

    // ?TAG_*: tag checks on DIEs and abbreviation entries.
    for &(name, tag) in DW_TAGS {
        let word = format!("?{}", name.trim_start_matches("DW_"));
        voc.add_pred_overload(
            &word,
            vec![T_DIE],
            Rc::new(move |args| {
                let die = args[0].as_domain::<ValueDie>().unwrap();
                Ok(PredResult::from_bool(die.file.die_tag(die.offset)? == tag))
            }),
        );
        voc.add_pred_overload(
            &word,
            vec![T_ABBREV],
            Rc::new(move |args| {
                let abbrev = args[0].as_domain::<ValueAbbrev>().unwrap();
                Ok(PredResult::from_bool(abbrev.tag == tag))
            }),
        );
    }

    for &(name, form) in DW_FORMS {
        let word = format!("?{}", name.trim_start_matches("DW_"));
        voc.add_pred_overload(
            &word,
            vec![T_ATTR],
            Rc::new(move |args| {
                let attr = args[0].as_domain::<ValueAttr>().unwrap();
                Ok(PredResult::from_bool(attr.data.form == form))
            }),
        );
    }

    for &(name, opcode) in DW_OPS {
        let word = format!("?{}", name.trim_start_matches("DW_"));
        voc.add_pred_overload(
            &word,
            vec![T_LOCLIST_OP],
            Rc::new(move |args| {
                let op = args[0].as_domain::<ValueLocOp>().unwrap();
                Ok(PredResult::from_bool(op.op.opcode == opcode))
            }),
        );
    }
}

fn register_constants(voc: &mut Vocabulary) {
    for &(name, code) in DW_TAGS {
        voc.add_constant(name, Value::cst(Constant::new(code, TAG_DOMAIN)));
    }
    for &(name, code) in DW_ATS {
        voc.add_constant(name, Value::cst(Constant::new(code, AT_DOMAIN)));
    }
    for &(name, code) in DW_FORMS {
        voc.add_constant(name, Value::cst(Constant::new(code, FORM_DOMAIN)));
    }
    for &(name, code) in DW_OPS {
        voc.add_constant(name, Value::cst(Constant::new(code, OP_DOMAIN)));
    }
}

/// Register the debug-info words.
///
/// Registers into an existing vocabulary rather than building a
/// separate one: shared word names (`elem`, `add`, `low`, `?empty`,
/// ...) must extend the core overload tables, not shadow them.
pub fn register(voc: &mut Vocabulary) {
    register_traversal(voc);
    register_views(voc);
    register_attributes(voc);
    register_addresses(voc);
    register_abbrevs(voc);
    register_families(voc);
    register_constants(voc);
}

/// The core vocabulary plus the debug-info words.
pub fn full_voc() -> Vocabulary {
    let mut voc = dwq_engine::core_voc();
    register(&mut voc);
    voc
}
