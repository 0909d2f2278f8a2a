//! Comparison assertions: `?eq ?ne ?lt ?le ?gt ?ge` and friends.
//!
//! Two elements are inspected, the one below TOS and TOS (A and B). The
//! assertion holds if A relates to B as the word implies. The negated
//! `!`-spellings are derived by the compiler. Cross-variant comparisons
//! order by type code; a comparison that is meaningless within a variant
//! yields fail.

use std::cmp::Ordering;
use std::rc::Rc;

use tracing::error;

use crate::error::Result;
use crate::pred::{Pred, PredResult};
use crate::stack::Stack;
use crate::vocabulary::{PredBuilder, Vocabulary};

struct CmpPred {
    word: &'static str,
    accept: fn(Ordering) -> bool,
}

impl Pred for CmpPred {
    fn result(&mut self, stk: &mut Stack) -> Result<PredResult> {
        stk.need(2, self.word)?;
        let a = stk.get(1).unwrap();
        let b = stk.get(0).unwrap();
        match a.cmp_value(b) {
            Some(ordering) => Ok(PredResult::from_bool((self.accept)(ordering))),
            None => {
                error!("can't compare `{a}' to `{b}'");
                Ok(PredResult::Fail)
            }
        }
    }

    fn reset(&mut self) {}

    fn name(&self) -> String {
        self.word.trim_start_matches('?').to_string()
    }
}

struct CmpBuilder {
    word: &'static str,
    accept: fn(Ordering) -> bool,
}

impl PredBuilder for CmpBuilder {
    fn build(&self) -> Box<dyn Pred> {
        Box::new(CmpPred {
            word: self.word,
            accept: self.accept,
        })
    }
}

pub fn register(voc: &mut Vocabulary) {
    let words: [(&'static str, fn(Ordering) -> bool); 6] = [
        ("?eq", |o| o == Ordering::Equal),
        ("?ne", |o| o != Ordering::Equal),
        ("?lt", |o| o == Ordering::Less),
        ("?gt", |o| o == Ordering::Greater),
        ("?le", |o| o != Ordering::Greater),
        ("?ge", |o| o != Ordering::Less),
    ];
    for (word, accept) in words {
        voc.add_pred_builtin(word, Rc::new(CmpBuilder { word, accept }));
    }
}
