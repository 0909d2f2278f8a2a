//! Stack-shuffling words: `dup`, `drop`, `swap`, `over`, `rot`.
//!
//! These work on any value types, so they are plain builtins rather than
//! overloads.

use std::rc::Rc;

use crate::error::Result;
use crate::op::{BoxedOp, Op};
use crate::stack::Stack;
use crate::vocabulary::{OpBuilder, Vocabulary};

#[derive(Clone, Copy)]
enum Shuffle {
    Dup,
    Drop,
    Swap,
    Over,
    Rot,
}

impl Shuffle {
    fn word(self) -> &'static str {
        match self {
            Shuffle::Dup => "dup",
            Shuffle::Drop => "drop",
            Shuffle::Swap => "swap",
            Shuffle::Over => "over",
            Shuffle::Rot => "rot",
        }
    }

    fn depth(self) -> usize {
        match self {
            Shuffle::Dup | Shuffle::Drop => 1,
            Shuffle::Swap | Shuffle::Over => 2,
            Shuffle::Rot => 3,
        }
    }

    fn apply(self, stk: &mut Stack) {
        match self {
            Shuffle::Dup => {
                let top = stk.top().unwrap().clone();
                stk.push(top);
            }
            Shuffle::Drop => {
                stk.pop();
            }
            Shuffle::Swap => {
                let a = stk.pop().unwrap();
                let b = stk.pop().unwrap();
                stk.push(a);
                stk.push(b);
            }
            Shuffle::Over => {
                let below = stk.get(1).unwrap().clone();
                stk.push(below);
            }
            Shuffle::Rot => {
                let c = stk.pop().unwrap();
                let b = stk.pop().unwrap();
                let a = stk.pop().unwrap();
                stk.push(b);
                stk.push(c);
                stk.push(a);
            }
        }
    }
}

struct ShuffleOp {
    upstream: BoxedOp,
    kind: Shuffle,
}

impl Op for ShuffleOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        match self.upstream.next()? {
            Some(mut stk) => {
                stk.need(self.kind.depth(), self.kind.word())?;
                self.kind.apply(&mut stk);
                Ok(Some(stk))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.upstream.reset();
    }

    fn name(&self) -> String {
        self.kind.word().to_string()
    }
}

struct ShuffleBuilder(Shuffle);

impl OpBuilder for ShuffleBuilder {
    fn build(&self, upstream: BoxedOp) -> BoxedOp {
        Box::new(ShuffleOp {
            upstream,
            kind: self.0,
        })
    }
}

pub fn register(voc: &mut Vocabulary) {
    for kind in [
        Shuffle::Dup,
        Shuffle::Drop,
        Shuffle::Swap,
        Shuffle::Over,
        Shuffle::Rot,
    ] {
        voc.add_builtin(kind.word(), Rc::new(ShuffleBuilder(kind)));
    }
}
