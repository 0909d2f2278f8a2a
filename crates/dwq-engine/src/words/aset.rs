//! Address-set words.
//!
//! `aset` builds a coverage from two constants (start and one-past-end);
//! `add`/`sub`/`overlap` are the set algebra; `range` splits a set into
//! its contiguous ranges; `?contains` covers both point and subset
//! queries.

use std::rc::Rc;

use tracing::error;

use crate::constant::{Constant, ADDRESS_DOMAIN};
use crate::coverage::{CovRange, Coverage};
use crate::error::Result;
use crate::overload::OverloadExec;
use crate::pred::PredResult;
use crate::producer::{ValueProducer, VecProducer};
use crate::value::{Value, T_ASET, T_CONST};
use crate::vocabulary::Vocabulary;

/// Lazily yields every covered address; a coverage can span ranges far
/// too wide to collect eagerly.
struct AddrProducer {
    ranges: Vec<CovRange>,
    index: usize,
    offset: u64,
    pos: usize,
}

impl AddrProducer {
    fn new(cov: &Coverage) -> Self {
        Self {
            ranges: cov.ranges().to_vec(),
            index: 0,
            offset: 0,
            pos: 0,
        }
    }
}

impl ValueProducer for AddrProducer {
    fn next(&mut self) -> Result<Option<Value>> {
        while let Some(range) = self.ranges.get(self.index) {
            if self.offset < range.length {
                let addr = range.start + self.offset;
                self.offset += 1;
                let pos = self.pos;
                self.pos += 1;
                return Ok(Some(
                    Value::cst(Constant::new(addr, ADDRESS_DOMAIN)).with_pos(pos),
                ));
            }
            self.index += 1;
            self.offset = 0;
        }
        Ok(None)
    }
}

fn as_addr(value: &Value, word: &str) -> Option<u64> {
    match value.as_cst().and_then(Constant::to_u64) {
        Some(addr) => Some(addr),
        None => {
            error!("`{word}` needs a non-negative 64-bit address, got {value}");
            None
        }
    }
}

pub fn register(voc: &mut Vocabulary) {
    // start end aset => coverage [start, end)
    voc.add_op_overload(
        "aset",
        vec![T_CONST, T_CONST],
        OverloadExec::Once(Rc::new(|args| {
            let Some(start) = as_addr(&args[0], "aset") else {
                return Ok(None);
            };
            let Some(end) = as_addr(&args[1], "aset") else {
                return Ok(None);
            };
            if end < start {
                error!("`aset`: end {end:#x} below start {start:#x}");
                return Ok(None);
            }
            Ok(Some(Value::addr_set(Coverage::range(start, end - start))))
        })),
    );

    voc.add_op_overload(
        "add",
        vec![T_ASET, T_ASET],
        OverloadExec::Once(Rc::new(|args| {
            let a = args[0].as_addr_set().unwrap();
            let b = args[1].as_addr_set().unwrap();
            Ok(Some(Value::addr_set(a.union(b))))
        })),
    );

    // Add a single address.
    voc.add_op_overload(
        "add",
        vec![T_ASET, T_CONST],
        OverloadExec::Once(Rc::new(|args| {
            let Some(addr) = as_addr(&args[1], "add") else {
                return Ok(None);
            };
            let mut cov = args[0].as_addr_set().unwrap().clone();
            cov.add(addr, 1);
            Ok(Some(Value::addr_set(cov)))
        })),
    );

    voc.add_op_overload(
        "sub",
        vec![T_ASET, T_ASET],
        OverloadExec::Once(Rc::new(|args| {
            let a = args[0].as_addr_set().unwrap();
            let b = args[1].as_addr_set().unwrap();
            Ok(Some(Value::addr_set(a.subtract(b))))
        })),
    );

    voc.add_op_overload(
        "sub",
        vec![T_ASET, T_CONST],
        OverloadExec::Once(Rc::new(|args| {
            let Some(addr) = as_addr(&args[1], "sub") else {
                return Ok(None);
            };
            let mut cov = args[0].as_addr_set().unwrap().clone();
            cov.remove(addr, 1);
            Ok(Some(Value::addr_set(cov)))
        })),
    );

    // Intersection.
    voc.add_op_overload(
        "overlap",
        vec![T_ASET, T_ASET],
        OverloadExec::Once(Rc::new(|args| {
            let a = args[0].as_addr_set().unwrap();
            let b = args[1].as_addr_set().unwrap();
            Ok(Some(Value::addr_set(a.intersect(b))))
        })),
    );

    // Number of covered addresses.
    voc.add_op_overload(
        "length",
        vec![T_ASET],
        OverloadExec::Once(Rc::new(|args| {
            let cov = args[0].as_addr_set().unwrap();
            Ok(Some(Value::cst(Constant::dec(cov.length()))))
        })),
    );

    // Every covered address, one stack each.
    voc.add_op_overload(
        "elem",
        vec![T_ASET],
        OverloadExec::Yielding(Rc::new(|args| {
            Ok(Box::new(AddrProducer::new(args[0].as_addr_set().unwrap())))
        })),
    );

    // Every contiguous range as its own address set.
    voc.add_op_overload(
        "range",
        vec![T_ASET],
        OverloadExec::Yielding(Rc::new(|args| {
            let cov = args[0].as_addr_set().unwrap();
            let ranges: Vec<Value> = cov
                .ranges()
                .iter()
                .map(|r| Value::addr_set(Coverage::range(r.start, r.length)))
                .collect();
            Ok(Box::new(VecProducer::new(ranges)))
        })),
    );

    // Lowest covered address; nothing on an empty set.
    voc.add_op_overload(
        "low",
        vec![T_ASET],
        OverloadExec::Yielding(Rc::new(|args| {
            let cov = args[0].as_addr_set().unwrap();
            let lows: Vec<Value> = cov
                .ranges()
                .first()
                .map(|r| Value::cst(Constant::new(r.start, ADDRESS_DOMAIN)))
                .into_iter()
                .collect();
            Ok(Box::new(VecProducer::new(lows)))
        })),
    );

    // One past the highest covered address; nothing on an empty set.
    voc.add_op_overload(
        "high",
        vec![T_ASET],
        OverloadExec::Yielding(Rc::new(|args| {
            let cov = args[0].as_addr_set().unwrap();
            let highs: Vec<Value> = cov
                .ranges()
                .last()
                .map(|r| Value::cst(Constant::new(r.end(), ADDRESS_DOMAIN)))
                .into_iter()
                .collect();
            Ok(Box::new(VecProducer::new(highs)))
        })),
    );

    voc.add_pred_overload(
        "?contains",
        vec![T_ASET, T_CONST],
        Rc::new(|args| {
            let cov = args[0].as_addr_set().unwrap();
            let Some(addr) = as_addr(&args[1], "?contains") else {
                return Ok(PredResult::Fail);
            };
            Ok(PredResult::from_bool(cov.contains_point(addr)))
        }),
    );

    voc.add_pred_overload(
        "?contains",
        vec![T_ASET, T_ASET],
        Rc::new(|args| {
            let a = args[0].as_addr_set().unwrap();
            let b = args[1].as_addr_set().unwrap();
            Ok(PredResult::from_bool(b.is_subset_of(a)))
        }),
    );

    voc.add_pred_overload(
        "?overlaps",
        vec![T_ASET, T_ASET],
        Rc::new(|args| {
            let a = args[0].as_addr_set().unwrap();
            let b = args[1].as_addr_set().unwrap();
            Ok(PredResult::from_bool(a.overlaps(b)))
        }),
    );

    voc.add_pred_overload(
        "?empty",
        vec![T_ASET],
        Rc::new(|args| {
            Ok(PredResult::from_bool(
                args[0].as_addr_set().unwrap().is_empty(),
            ))
        }),
    );
}
