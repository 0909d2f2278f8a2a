//! Predicates.
//!
//! Predicates answer yes, no, or fail on a stack. Fail means "undefined"
//! — a comparison that makes no sense — and never contributes to query
//! success; boolean combinators pass it through verbatim.

use crate::error::Result;
use crate::op::SubExec;
use crate::stack::Stack;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredResult {
    No,
    Yes,
    Fail,
}

impl PredResult {
    pub fn from_bool(b: bool) -> Self {
        if b {
            PredResult::Yes
        } else {
            PredResult::No
        }
    }

    pub fn negate(self) -> Self {
        match self {
            PredResult::Yes => PredResult::No,
            PredResult::No => PredResult::Yes,
            PredResult::Fail => PredResult::Fail,
        }
    }
}

pub trait Pred {
    fn result(&mut self, stk: &mut Stack) -> Result<PredResult>;
    fn reset(&mut self);
    fn name(&self) -> String;
}

pub struct PredNot(pub Box<dyn Pred>);

impl Pred for PredNot {
    fn result(&mut self, stk: &mut Stack) -> Result<PredResult> {
        Ok(self.0.result(stk)?.negate())
    }

    fn reset(&mut self) {
        self.0.reset();
    }

    fn name(&self) -> String {
        format!("not<{}>", self.0.name())
    }
}

/// Short-circuits on the first non-yes answer.
pub struct PredAnd(pub Box<dyn Pred>, pub Box<dyn Pred>);

impl Pred for PredAnd {
    fn result(&mut self, stk: &mut Stack) -> Result<PredResult> {
        match self.0.result(stk)? {
            PredResult::Yes => self.1.result(stk),
            other => Ok(other),
        }
    }

    fn reset(&mut self) {
        self.0.reset();
        self.1.reset();
    }

    fn name(&self) -> String {
        format!("and<{}><{}>", self.0.name(), self.1.name())
    }
}

/// Short-circuits on the first non-no answer.
pub struct PredOr(pub Box<dyn Pred>, pub Box<dyn Pred>);

impl Pred for PredOr {
    fn result(&mut self, stk: &mut Stack) -> Result<PredResult> {
        match self.0.result(stk)? {
            PredResult::No => self.1.result(stk),
            other => Ok(other),
        }
    }

    fn reset(&mut self) {
        self.0.reset();
        self.1.reset();
    }

    fn name(&self) -> String {
        format!("or<{}><{}>", self.0.name(), self.1.name())
    }
}

/// Yes iff the sub-expression yields at least one result on the input.
pub struct PredSubxAny {
    sub: SubExec,
}

impl PredSubxAny {
    pub fn new(sub: SubExec) -> Self {
        Self { sub }
    }
}

impl Pred for PredSubxAny {
    fn result(&mut self, stk: &mut Stack) -> Result<PredResult> {
        self.sub.prime(stk.clone());
        Ok(PredResult::from_bool(self.sub.next()?.is_some()))
    }

    fn reset(&mut self) {
        self.sub.reset();
    }

    fn name(&self) -> String {
        format!("pred_subx_any<{}>", self.sub.name())
    }
}

/// Yes iff some result of `lhs` and some result of `rhs` satisfy the
/// relation on a stack holding both tops.
pub struct PredSubxCompare {
    lhs: SubExec,
    rhs: SubExec,
    rel: Box<dyn Pred>,
}

impl PredSubxCompare {
    pub fn new(lhs: SubExec, rhs: SubExec, rel: Box<dyn Pred>) -> Self {
        Self { lhs, rhs, rel }
    }
}

impl Pred for PredSubxCompare {
    fn result(&mut self, stk: &mut Stack) -> Result<PredResult> {
        self.lhs.prime(stk.clone());
        while let Some(mut left) = self.lhs.next()? {
            self.rhs.prime(stk.clone());
            while let Some(mut right) = self.rhs.next()? {
                right.need(1, "comparison")?;
                left.push(right.pop().unwrap());
                let hit = self.rel.result(&mut left)? == PredResult::Yes;
                left.pop();
                if hit {
                    return Ok(PredResult::Yes);
                }
            }
        }
        Ok(PredResult::No)
    }

    fn reset(&mut self) {
        self.lhs.reset();
        self.rhs.reset();
        self.rel.reset();
    }

    fn name(&self) -> String {
        format!(
            "pred_subx_compare<{}><{}><{}>",
            self.lhs.name(),
            self.rhs.name(),
            self.rel.name()
        )
    }
}

/// Yes iff the top value's stream position equals `pos`.
pub struct PredPos {
    pos: usize,
}

impl PredPos {
    pub fn new(pos: usize) -> Self {
        Self { pos }
    }
}

impl Pred for PredPos {
    fn result(&mut self, stk: &mut Stack) -> Result<PredResult> {
        stk.need(1, "pos assertion")?;
        Ok(PredResult::from_bool(stk.top().unwrap().pos() == self.pos))
    }

    fn reset(&mut self) {}

    fn name(&self) -> String {
        format!("pred_pos<{}>", self.pos)
    }
}
