//! String words: the `add`/`length`/`elem`/`relem` and predicate
//! overloads for `T_STR`.
//!
//! `length` counts Unicode scalar values and `elem` yields one-character
//! strings.

use std::rc::Rc;

use crate::constant::Constant;
use crate::overload::OverloadExec;
use crate::pred::PredResult;
use crate::producer::VecProducer;
use crate::value::{Value, T_STR};
use crate::vocabulary::Vocabulary;

pub fn register(voc: &mut Vocabulary) {
    voc.add_op_overload(
        "add",
        vec![T_STR, T_STR],
        OverloadExec::Once(Rc::new(|args| {
            let a = args[0].as_str().unwrap();
            let b = args[1].as_str().unwrap();
            Ok(Some(Value::str(format!("{a}{b}"))))
        })),
    );

    voc.add_op_overload(
        "length",
        vec![T_STR],
        OverloadExec::Once(Rc::new(|args| {
            let s = args[0].as_str().unwrap();
            Ok(Some(Value::cst(Constant::dec(s.chars().count() as u64))))
        })),
    );

    voc.add_op_overload(
        "elem",
        vec![T_STR],
        OverloadExec::Yielding(Rc::new(|args| {
            let s = args[0].as_str().unwrap();
            let chars: Vec<Value> = s.chars().map(|c| Value::str(c.to_string())).collect();
            Ok(Box::new(VecProducer::new(chars)))
        })),
    );

    voc.add_op_overload(
        "relem",
        vec![T_STR],
        OverloadExec::Yielding(Rc::new(|args| {
            let s = args[0].as_str().unwrap();
            let chars: Vec<Value> = s
                .chars()
                .rev()
                .map(|c| Value::str(c.to_string()))
                .collect();
            Ok(Box::new(VecProducer::new(chars)))
        })),
    );

    voc.add_pred_overload(
        "?empty",
        vec![T_STR],
        Rc::new(|args| Ok(PredResult::from_bool(args[0].as_str().unwrap().is_empty()))),
    );

    voc.add_pred_overload(
        "?find",
        vec![T_STR, T_STR],
        Rc::new(|args| {
            let hay = args[0].as_str().unwrap();
            let need = args[1].as_str().unwrap();
            Ok(PredResult::from_bool(hay.contains(need)))
        }),
    );

    voc.add_pred_overload(
        "?starts",
        vec![T_STR, T_STR],
        Rc::new(|args| {
            let hay = args[0].as_str().unwrap();
            let need = args[1].as_str().unwrap();
            Ok(PredResult::from_bool(hay.starts_with(need)))
        }),
    );

    voc.add_pred_overload(
        "?ends",
        vec![T_STR, T_STR],
        Rc::new(|args| {
            let hay = args[0].as_str().unwrap();
            let need = args[1].as_str().unwrap();
            Ok(PredResult::from_bool(hay.ends_with(need)))
        }),
    );
}
