//! The public façade: compile a query, run it, iterate result stacks.

use std::rc::Rc;

use crate::compile::{lower_query, CompileError, Plan};
use crate::error::Result;
use crate::op::{new_origin, BoxedOp, Op, OriginOp};
use crate::stack::Stack;
use crate::vocabulary::Vocabulary;

/// A compiled query, reusable across runs.
pub struct Query {
    plan: Rc<Plan>,
}

/// Compile query source against a vocabulary.
pub fn compile(source: &str, voc: &Vocabulary) -> std::result::Result<Query, CompileError> {
    let expr = dwq_parser::parse_query(source)?;
    let plan = lower_query(&expr, voc)?;
    Ok(Query { plan })
}

impl Query {
    /// Run the query on an initial stack, producing the result stacks
    /// lazily. Each `run` instantiates a fresh operator chain.
    pub fn run(&self, initial: Stack) -> Results {
        let origin = new_origin();
        let root = self.plan.build(Box::new(OriginOp(origin.clone())));
        origin.borrow_mut().set_next(initial);
        Results {
            root,
            finished: false,
        }
    }
}

/// Iterator over the result stacks of one run.
///
/// Fatal runtime errors surface as an `Err` item; the iterator is fused
/// afterwards.
pub struct Results {
    root: BoxedOp,
    finished: bool,
}

impl Iterator for Results {
    type Item = Result<Stack>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.root.next() {
            Ok(Some(stk)) => Some(Ok(stk)),
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}
