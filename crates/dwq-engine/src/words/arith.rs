//! Arithmetic and rendering-cast words on constants.

use std::rc::Rc;

use num_bigint::BigInt;
use num_traits::Zero;
use tracing::error;

use crate::constant::{
    Constant, ConstantDomain, BIN_DOMAIN, DEC_DOMAIN, HEX_DOMAIN, OCT_DOMAIN,
};
use crate::overload::OverloadExec;
use crate::value::{Value, T_CONST};
use crate::vocabulary::Vocabulary;

fn arith_word(
    word: &'static str,
    f: fn(&BigInt, &BigInt) -> Option<BigInt>,
) -> OverloadExec {
    OverloadExec::Once(Rc::new(move |args| {
        let a = args[0].as_cst().unwrap();
        let b = args[1].as_cst().unwrap();
        if !a.dom().safe_arith() || !b.dom().safe_arith() {
            error!("`{word}` needs arithmetic operands, got {a} and {b}");
            return Ok(None);
        }
        match f(a.value(), b.value()) {
            Some(result) => Ok(Some(Value::cst(Constant::new(result, a.dom())))),
            None => {
                error!("`{word}`: division by zero");
                Ok(None)
            }
        }
    }))
}

fn cast_word(dom: &'static dyn ConstantDomain) -> OverloadExec {
    OverloadExec::Once(Rc::new(move |args| {
        let c = args[0].as_cst().unwrap();
        Ok(Some(Value::cst(c.retype(dom))))
    }))
}

pub fn register(voc: &mut Vocabulary) {
    voc.add_op_overload(
        "add",
        vec![T_CONST, T_CONST],
        arith_word("add", |a, b| Some(a + b)),
    );
    voc.add_op_overload(
        "sub",
        vec![T_CONST, T_CONST],
        arith_word("sub", |a, b| Some(a - b)),
    );
    voc.add_op_overload(
        "mul",
        vec![T_CONST, T_CONST],
        arith_word("mul", |a, b| Some(a * b)),
    );
    voc.add_op_overload(
        "div",
        vec![T_CONST, T_CONST],
        arith_word("div", |a, b| if b.is_zero() { None } else { Some(a / b) }),
    );
    voc.add_op_overload(
        "mod",
        vec![T_CONST, T_CONST],
        arith_word("mod", |a, b| if b.is_zero() { None } else { Some(a % b) }),
    );

    voc.add_op_overload("hex", vec![T_CONST], cast_word(HEX_DOMAIN));
    voc.add_op_overload("dec", vec![T_CONST], cast_word(DEC_DOMAIN));
    voc.add_op_overload("oct", vec![T_CONST], cast_word(OCT_DOMAIN));
    voc.add_op_overload("bin", vec![T_CONST], cast_word(BIN_DOMAIN));

    // The plain numeric value, shedding any symbolic domain.
    voc.add_op_overload("value", vec![T_CONST], cast_word(DEC_DOMAIN));
}
