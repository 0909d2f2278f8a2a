//! Miscellaneous builtins: `apply`, `debug`, `type`, `pos`, and the
//! boolean constants.

use std::rc::Rc;

use crate::constant::Constant;
use crate::error::Result;
use crate::op::{ApplyOp, BoxedOp, DebugOp, Op};
use crate::stack::Stack;
use crate::value::Value;
use crate::vocabulary::{OpBuilder, Vocabulary};

struct ApplyBuilder;

impl OpBuilder for ApplyBuilder {
    fn build(&self, upstream: BoxedOp) -> BoxedOp {
        Box::new(ApplyOp::new(upstream))
    }
}

struct DebugBuilder;

impl OpBuilder for DebugBuilder {
    fn build(&self, upstream: BoxedOp) -> BoxedOp {
        Box::new(DebugOp::new(upstream))
    }
}

/// Pops TOS, pushes the name of its type.
struct TypeOp {
    upstream: BoxedOp,
}

impl Op for TypeOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        match self.upstream.next()? {
            Some(mut stk) => {
                stk.need(1, "type")?;
                let name = stk.pop().unwrap().type_name();
                stk.push(Value::str(name));
                Ok(Some(stk))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.upstream.reset();
    }

    fn name(&self) -> String {
        "type".to_string()
    }
}

/// Pops TOS, pushes its position in the stream that produced it.
struct PosOp {
    upstream: BoxedOp,
}

impl Op for PosOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        match self.upstream.next()? {
            Some(mut stk) => {
                stk.need(1, "pos")?;
                let pos = stk.pop().unwrap().pos();
                stk.push(Value::cst(Constant::dec(pos as u64)));
                Ok(Some(stk))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.upstream.reset();
    }

    fn name(&self) -> String {
        "pos".to_string()
    }
}

struct TypeBuilder;

impl OpBuilder for TypeBuilder {
    fn build(&self, upstream: BoxedOp) -> BoxedOp {
        Box::new(TypeOp { upstream })
    }
}

struct PosBuilder;

impl OpBuilder for PosBuilder {
    fn build(&self, upstream: BoxedOp) -> BoxedOp {
        Box::new(PosOp { upstream })
    }
}

pub fn register(voc: &mut Vocabulary) {
    voc.add_builtin("apply", Rc::new(ApplyBuilder));
    voc.add_builtin("debug", Rc::new(DebugBuilder));
    voc.add_builtin("type", Rc::new(TypeBuilder));
    voc.add_builtin("pos", Rc::new(PosBuilder));
    voc.add_constant("true", Value::cst(Constant::bool(true)));
    voc.add_constant("false", Value::cst(Constant::bool(false)));
}
