//! Sequence words: `add`, `length`, `elem`, `relem`, `?empty`, `?find`,
//! `?starts`, `?ends`.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::constant::Constant;
use crate::overload::OverloadExec;
use crate::pred::PredResult;
use crate::producer::VecProducer;
use crate::value::{Value, T_SEQ};
use crate::vocabulary::Vocabulary;

fn elems_equal(a: &Value, b: &Value) -> bool {
    a.cmp_value(b) == Some(Ordering::Equal)
}

pub fn register(voc: &mut Vocabulary) {
    // Concatenate two sequences:
    //
    //     [1, 2, 3] [4, 5, 6] add  =>  [1, 2, 3, 4, 5, 6]
    voc.add_op_overload(
        "add",
        vec![T_SEQ, T_SEQ],
        OverloadExec::Once(Rc::new(|args| {
            let a = args[0].as_seq().unwrap();
            let b = args[1].as_seq().unwrap();
            let mut out: Vec<Value> = a.iter().cloned().collect();
            out.extend(b.iter().cloned());
            Ok(Some(Value::seq(out)))
        })),
    );

    voc.add_op_overload(
        "length",
        vec![T_SEQ],
        OverloadExec::Once(Rc::new(|args| {
            let seq = args[0].as_seq().unwrap();
            Ok(Some(Value::cst(Constant::dec(seq.len() as u64))))
        })),
    );

    // For each element of the sequence on TOS, a stack with that element
    // pushed; positions number the output stream.
    voc.add_op_overload(
        "elem",
        vec![T_SEQ],
        OverloadExec::Yielding(Rc::new(|args| {
            let seq = args[0].as_seq().unwrap();
            Ok(Box::new(VecProducer::new(seq.iter().cloned().collect())))
        })),
    );

    // Same as `elem`, backwards.
    voc.add_op_overload(
        "relem",
        vec![T_SEQ],
        OverloadExec::Yielding(Rc::new(|args| {
            let seq = args[0].as_seq().unwrap();
            Ok(Box::new(VecProducer::new(
                seq.iter().rev().cloned().collect(),
            )))
        })),
    );

    voc.add_pred_overload(
        "?empty",
        vec![T_SEQ],
        Rc::new(|args| {
            Ok(PredResult::from_bool(args[0].as_seq().unwrap().is_empty()))
        }),
    );

    // TOS is contained in the value below it as a contiguous run.
    voc.add_pred_overload(
        "?find",
        vec![T_SEQ, T_SEQ],
        Rc::new(|args| {
            let hay = args[0].as_seq().unwrap();
            let need = args[1].as_seq().unwrap();
            if need.is_empty() {
                return Ok(PredResult::Yes);
            }
            let hay: Vec<&Value> = hay.iter().collect();
            let need: Vec<&Value> = need.iter().collect();
            let hit = hay
                .windows(need.len())
                .any(|w| w.iter().zip(need.iter()).all(|(a, b)| elems_equal(a, b)));
            Ok(PredResult::from_bool(hit))
        }),
    );

    // TOS is a prefix of the value below it.
    voc.add_pred_overload(
        "?starts",
        vec![T_SEQ, T_SEQ],
        Rc::new(|args| {
            let hay = args[0].as_seq().unwrap();
            let need = args[1].as_seq().unwrap();
            let hit = hay.len() >= need.len()
                && hay
                    .iter()
                    .zip(need.iter())
                    .all(|(a, b)| elems_equal(a, b));
            Ok(PredResult::from_bool(hit))
        }),
    );

    // TOS is a suffix of the value below it.
    voc.add_pred_overload(
        "?ends",
        vec![T_SEQ, T_SEQ],
        Rc::new(|args| {
            let hay = args[0].as_seq().unwrap();
            let need = args[1].as_seq().unwrap();
            let hit = hay.len() >= need.len()
                && hay
                    .iter()
                    .skip(hay.len() - need.len())
                    .zip(need.iter())
                    .all(|(a, b)| elems_equal(a, b));
            Ok(PredResult::from_bool(hit))
        }),
    );
}
