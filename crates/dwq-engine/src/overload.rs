//! Overload tables and the dispatching operators.
//!
//! Each overloadable word keeps a table of entries keyed by the type
//! codes of the operands it consumes (listed bottom-to-top). At
//! execution time the entry is picked by matching against the stack's
//! selector; the longest (most specific) signature wins, and a duplicate
//! signature is a registration error.
//!
//! Implementations come in two shapes: *once* overloads pop their
//! operands and return at most one value, *yielding* overloads return a
//! producer whose every value becomes one result stack. A miss is
//! advisory: a diagnostic is logged and the stack dropped (operator
//! words) or `Fail` returned (predicate words).

use std::rc::Rc;

use tracing::error;

use crate::error::Result;
use crate::op::{BoxedOp, Op};
use crate::pred::{Pred, PredResult};
use crate::producer::BoxedProducer;
use crate::stack::Stack;
use crate::value::{TypeCode, Value};

/// Once overload: operands in, at most one value out. `Ok(None)` means
/// the word failed advisorily (diagnostic already logged) and the stack
/// is dropped.
pub type OnceFn = Rc<dyn Fn(Vec<Value>) -> Result<Option<Value>>>;

/// Yielding overload: operands in, a producer of values out.
pub type YieldFn = Rc<dyn Fn(Vec<Value>) -> Result<BoxedProducer>>;

#[derive(Clone)]
pub enum OverloadExec {
    Once(OnceFn),
    Yielding(YieldFn),
}

#[derive(Clone)]
pub struct OverloadEntry {
    pub sig: Vec<TypeCode>,
    pub exec: OverloadExec,
}

/// Overload table of one operator word.
#[derive(Clone)]
pub struct OverloadTable {
    name: String,
    entries: Vec<OverloadEntry>,
}

impl OverloadTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an overload.
    ///
    /// # Panics
    ///
    /// Panics if the signature is already registered; two entries may
    /// not tie.
    pub fn add(&mut self, sig: Vec<TypeCode>, exec: OverloadExec) {
        assert!(
            !self.entries.iter().any(|e| e.sig == sig),
            "registration error: duplicate overload {:?} for `{}`",
            sig,
            self.name
        );
        self.entries.push(OverloadEntry { sig, exec });
        // Longest signature first, so that `find` prefers it.
        self.entries.sort_by(|a, b| b.sig.len().cmp(&a.sig.len()));
    }

    pub fn max_arity(&self) -> usize {
        self.entries.first().map_or(0, |e| e.sig.len())
    }

    pub fn find(&self, stk: &Stack) -> Option<&OverloadEntry> {
        self.entries.iter().find(|e| sig_matches(&e.sig, stk))
    }
}

fn sig_matches(sig: &[TypeCode], stk: &Stack) -> bool {
    let k = sig.len();
    if stk.len() < k {
        return false;
    }
    (0..k).all(|depth| stk.get(depth).unwrap().type_code() == sig[k - 1 - depth])
}

fn selector_diagnostic(word: &str, stk: &Stack, arity: usize) {
    let found: Vec<&str> = (0..arity.min(stk.len()))
        .rev()
        .filter_map(|d| stk.get(d).map(Value::type_name))
        .collect();
    error!(
        "`{}` is not applicable to ({}); dropping this stack",
        word,
        found.join(", ")
    );
}

/// The dispatching operator of an overloaded word.
pub struct OverloadOp {
    upstream: BoxedOp,
    table: Rc<OverloadTable>,
    /// Base stack plus live producer of a yielding overload.
    yielding: Option<(Stack, BoxedProducer)>,
}

impl OverloadOp {
    pub fn new(upstream: BoxedOp, table: Rc<OverloadTable>) -> Self {
        Self {
            upstream,
            table,
            yielding: None,
        }
    }
}

impl Op for OverloadOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        loop {
            if let Some((base, producer)) = &mut self.yielding {
                match producer.next()? {
                    Some(value) => {
                        let mut out = base.clone();
                        out.push(value);
                        return Ok(Some(out));
                    }
                    None => self.yielding = None,
                }
                continue;
            }

            let Some(mut stk) = self.upstream.next()? else {
                return Ok(None);
            };
            stk.need(self.table.max_arity(), self.table.name())?;

            let Some(entry) = self.table.find(&stk) else {
                selector_diagnostic(self.table.name(), &stk, self.table.max_arity());
                continue;
            };
            let exec = entry.exec.clone();
            let arity = entry.sig.len();

            let mut operands = Vec::with_capacity(arity);
            for _ in 0..arity {
                operands.push(stk.pop().unwrap());
            }
            operands.reverse();

            match exec {
                OverloadExec::Once(f) => match f(operands)? {
                    Some(value) => {
                        stk.push(value);
                        return Ok(Some(stk));
                    }
                    None => continue,
                },
                OverloadExec::Yielding(f) => {
                    let producer = f(operands)?;
                    self.yielding = Some((stk, producer));
                }
            }
        }
    }

    fn reset(&mut self) {
        self.yielding = None;
        self.upstream.reset();
    }

    fn name(&self) -> String {
        self.table.name().to_string()
    }
}

/// Predicate overload: reads the operands in place (bottom-to-top), does
/// not pop.
pub type PredFn = Rc<dyn Fn(&[Value]) -> Result<PredResult>>;

#[derive(Clone)]
pub struct PredEntry {
    pub sig: Vec<TypeCode>,
    pub f: PredFn,
}

/// Overload table of one predicate word (its positive spelling).
#[derive(Clone)]
pub struct PredTable {
    name: String,
    entries: Vec<PredEntry>,
}

impl PredTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, sig: Vec<TypeCode>, f: PredFn) {
        assert!(
            !self.entries.iter().any(|e| e.sig == sig),
            "registration error: duplicate overload {:?} for `{}`",
            sig,
            self.name
        );
        self.entries.push(PredEntry { sig, f });
        self.entries.sort_by(|a, b| b.sig.len().cmp(&a.sig.len()));
    }

    pub fn max_arity(&self) -> usize {
        self.entries.first().map_or(0, |e| e.sig.len())
    }

    pub fn find(&self, stk: &Stack) -> Option<&PredEntry> {
        self.entries.iter().find(|e| sig_matches(&e.sig, stk))
    }
}

/// The dispatching predicate of an overloaded predicate word.
pub struct OverloadPred {
    table: Rc<PredTable>,
}

impl OverloadPred {
    pub fn new(table: Rc<PredTable>) -> Self {
        Self { table }
    }
}

impl Pred for OverloadPred {
    fn result(&mut self, stk: &mut Stack) -> Result<PredResult> {
        stk.need(self.table.max_arity(), self.table.name())?;
        let Some(entry) = self.table.find(stk) else {
            selector_diagnostic(self.table.name(), stk, self.table.max_arity());
            return Ok(PredResult::Fail);
        };
        let arity = entry.sig.len();
        let mut operands = Vec::with_capacity(arity);
        for depth in (0..arity).rev() {
            operands.push(stk.get(depth).unwrap().clone());
        }
        (entry.f)(&operands)
    }

    fn reset(&mut self) {}

    fn name(&self) -> String {
        self.table.name().to_string()
    }
}
