//! The string-format sub-engine.
//!
//! An interpolated literal `"abc %( X %) def"` compiles to a chain of
//! stringers rooted at a [`StringerOrigin`]. Each stringer yields
//! `(stack, suffix)` pairs; literal fragments prepend their text to the
//! suffix, interpolation holes run their sub-expression and prepend the
//! rendered top of each result. The chain is therefore built in reverse
//! part order, with the last fragment closest to the origin.
//!
//! [`crate::op::FormatOp`] is the boundary operator that drives the
//! chain and pushes the assembled strings.

use std::cell::RefCell;
use std::rc::Rc;

use crate::error::Result;
use crate::op::SubExec;
use crate::stack::Stack;

pub trait Stringer {
    fn next(&mut self) -> Result<Option<(Stack, String)>>;
    fn reset(&mut self);
}

/// One-shot slot at the root of a stringer chain.
#[derive(Debug)]
pub struct StringerOrigin {
    slot: Option<Stack>,
    armed: bool,
}

pub type StringerOriginHandle = Rc<RefCell<StringerOrigin>>;

pub fn new_stringer_origin() -> StringerOriginHandle {
    Rc::new(RefCell::new(StringerOrigin {
        slot: None,
        armed: true,
    }))
}

impl StringerOrigin {
    pub fn set_next(&mut self, stk: Stack) {
        assert!(self.slot.is_none(), "BUG: stringer origin primed twice");
        assert!(self.armed, "BUG: stringer origin primed without reset");
        self.armed = false;
        self.slot = Some(stk);
    }
}

/// `Stringer` adapter over a shared [`StringerOrigin`].
pub struct StringerOriginOp(pub StringerOriginHandle);

impl Stringer for StringerOriginOp {
    fn next(&mut self) -> Result<Option<(Stack, String)>> {
        Ok(self.0.borrow_mut().slot.take().map(|stk| (stk, String::new())))
    }

    fn reset(&mut self) {
        let mut origin = self.0.borrow_mut();
        origin.slot = None;
        origin.armed = true;
    }
}

/// Prepends a literal fragment to every suffix flowing through.
pub struct StringerLit {
    upstream: Box<dyn Stringer>,
    text: String,
}

impl StringerLit {
    pub fn new(upstream: Box<dyn Stringer>, text: String) -> Self {
        Self { upstream, text }
    }
}

impl Stringer for StringerLit {
    fn next(&mut self) -> Result<Option<(Stack, String)>> {
        match self.upstream.next()? {
            Some((stk, suffix)) => Ok(Some((stk, format!("{}{}", self.text, suffix)))),
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.upstream.reset();
    }
}

/// Runs a sub-expression per upstream pair; every result contributes its
/// popped-and-rendered top, prepended to the suffix.
pub struct StringerOp {
    upstream: Box<dyn Stringer>,
    sub: SubExec,
    suffix: String,
    have: bool,
}

impl StringerOp {
    pub fn new(upstream: Box<dyn Stringer>, sub: SubExec) -> Self {
        Self {
            upstream,
            sub,
            suffix: String::new(),
            have: false,
        }
    }
}

impl Stringer for StringerOp {
    fn next(&mut self) -> Result<Option<(Stack, String)>> {
        loop {
            if !self.have {
                let Some((stk, suffix)) = self.upstream.next()? else {
                    return Ok(None);
                };
                self.sub.prime(stk);
                self.suffix = suffix;
                self.have = true;
            }

            if let Some(mut stk) = self.sub.next()? {
                stk.need(1, "string interpolation")?;
                let rendered = stk.pop().unwrap().to_string();
                return Ok(Some((stk, format!("{}{}", rendered, self.suffix))));
            }

            self.have = false;
        }
    }

    fn reset(&mut self) {
        self.have = false;
        self.sub.reset();
        self.upstream.reset();
    }
}
