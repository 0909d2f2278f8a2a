//! The vocabulary: what words mean.
//!
//! A vocabulary maps word names to builders — overload tables, whole
//! custom operators, predicates, or named constants. Vocabularies
//! compose by union, with later registrations shadowing earlier ones for
//! the same name; the core vocabulary and the domain vocabulary of the
//! debug-info words are combined this way.

use std::rc::Rc;

use indexmap::IndexMap;

use crate::op::BoxedOp;
use crate::overload::{OverloadExec, OverloadTable, PredFn, PredTable};
use crate::pred::Pred;
use crate::value::{TypeCode, Value};

/// Builds the operator of a non-overloaded builtin word.
pub trait OpBuilder {
    fn build(&self, upstream: BoxedOp) -> BoxedOp;
}

/// Builds the predicate of a non-overloaded assertion word (its
/// positive flavor; `!`-spellings are derived by negation).
pub trait PredBuilder {
    fn build(&self) -> Box<dyn Pred>;
}

#[derive(Clone)]
pub enum WordEntry {
    /// Overloaded operator word.
    Ops(Rc<OverloadTable>),
    /// Overloaded predicate word.
    Preds(Rc<PredTable>),
    /// Custom operator word.
    Builtin(Rc<dyn OpBuilder>),
    /// Custom predicate word.
    PredBuiltin(Rc<dyn PredBuilder>),
    /// Named constant.
    Constant(Value),
}

#[derive(Clone, Default)]
pub struct Vocabulary {
    words: IndexMap<String, WordEntry>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&WordEntry> {
        self.words.get(name)
    }

    /// Register a word, shadowing any earlier entry of the same name.
    pub fn insert(&mut self, name: impl Into<String>, entry: WordEntry) {
        self.words.insert(name.into(), entry);
    }

    /// Union with another vocabulary; `other`'s entries win on clashes.
    pub fn extend(&mut self, other: &Vocabulary) {
        for (name, entry) in &other.words {
            self.words.insert(name.clone(), entry.clone());
        }
    }

    /// Add one overload to an operator word, creating its table on first
    /// use.
    ///
    /// # Panics
    ///
    /// Panics if the name is already bound to something other than an
    /// overload table (a registration error), or on a duplicate
    /// signature.
    pub fn add_op_overload(&mut self, name: &str, sig: Vec<TypeCode>, exec: OverloadExec) {
        let entry = self
            .words
            .entry(name.to_string())
            .or_insert_with(|| WordEntry::Ops(Rc::new(OverloadTable::new(name))));
        match entry {
            WordEntry::Ops(table) => Rc::make_mut(table).add(sig, exec),
            _ => panic!("registration error: `{name}` is not an overloadable operator"),
        }
    }

    /// Add one overload to a predicate word (positive spelling).
    pub fn add_pred_overload(&mut self, name: &str, sig: Vec<TypeCode>, f: PredFn) {
        let entry = self
            .words
            .entry(name.to_string())
            .or_insert_with(|| WordEntry::Preds(Rc::new(PredTable::new(name))));
        match entry {
            WordEntry::Preds(table) => Rc::make_mut(table).add(sig, f),
            _ => panic!("registration error: `{name}` is not an overloadable predicate"),
        }
    }

    pub fn add_builtin(&mut self, name: &str, builder: Rc<dyn OpBuilder>) {
        self.insert(name, WordEntry::Builtin(builder));
    }

    pub fn add_pred_builtin(&mut self, name: &str, builder: Rc<dyn PredBuilder>) {
        self.insert(name, WordEntry::PredBuiltin(builder));
    }

    pub fn add_constant(&mut self, name: &str, value: Value) {
        self.insert(name, WordEntry::Constant(value));
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.words.keys().map(String::as_str)
    }
}
