//! The operator graph.
//!
//! Every operator is a lazy, restartable enumerator of result stacks:
//! `next()` pulls from upstream as needed and yields the next result (or
//! `None` when drained for the current priming), `reset()` clears all
//! cached state and propagates upstream.
//!
//! Sub-expressions are driven through an [`Origin`]: the leaf of a
//! sub-chain whose upstream is a one-shot slot. The owning operator
//! re-drives the sub-expression with `reset(); set_next(stack)`.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use tracing::{debug, error};

use crate::compile::Plan;
use crate::error::Result;
use crate::pred::{Pred, PredResult};
use crate::stack::{maybe_unlink_frame, Frame, FrameHandle, Stack, StackKey};
use crate::stringer::{Stringer, StringerOriginHandle};
use crate::value::Value;

pub trait Op {
    /// Produce the next result stack, or `None` when exhausted for the
    /// current upstream priming.
    fn next(&mut self) -> Result<Option<Stack>>;

    /// Prepare to be re-driven from scratch; propagates upstream.
    fn reset(&mut self);

    /// Diagnostic name.
    fn name(&self) -> String;
}

pub type BoxedOp = Box<dyn Op>;

/// The slot at the root of a (sub-)expression.
///
/// `set_next` must be preceded by a `reset()` that percolated down the
/// chain; priming twice without a reset is a bug in the driving
/// operator.
#[derive(Debug)]
pub struct Origin {
    slot: Option<Stack>,
    armed: bool,
}

pub type OriginHandle = Rc<RefCell<Origin>>;

pub fn new_origin() -> OriginHandle {
    Rc::new(RefCell::new(Origin {
        slot: None,
        armed: true,
    }))
}

impl Origin {
    pub fn set_next(&mut self, stk: Stack) {
        assert!(self.slot.is_none(), "BUG: origin primed twice without reset");
        assert!(self.armed, "BUG: origin primed without a preceding reset");
        self.armed = false;
        self.slot = Some(stk);
    }
}

/// `Op` adapter over a shared [`Origin`].
pub struct OriginOp(pub OriginHandle);

impl Op for OriginOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        Ok(self.0.borrow_mut().slot.take())
    }

    fn reset(&mut self) {
        let mut origin = self.0.borrow_mut();
        origin.slot = None;
        origin.armed = true;
    }

    fn name(&self) -> String {
        "origin".to_string()
    }
}

/// A sub-expression: an origin plus the chain built on top of it.
pub struct SubExec {
    origin: OriginHandle,
    body: BoxedOp,
}

impl SubExec {
    pub fn new(build: impl FnOnce(BoxedOp) -> BoxedOp) -> Self {
        let origin = new_origin();
        let body = build(Box::new(OriginOp(origin.clone())));
        Self { origin, body }
    }

    pub fn from_plan(plan: &Rc<Plan>) -> Self {
        let plan = plan.clone();
        Self::new(move |up| plan.build(up))
    }

    /// Re-drive the sub-expression on a fresh input stack.
    pub fn prime(&mut self, stk: Stack) {
        self.body.reset();
        self.origin.borrow_mut().set_next(stk);
    }

    pub fn next(&mut self) -> Result<Option<Stack>> {
        self.body.next()
    }

    pub fn reset(&mut self) {
        self.body.reset();
    }

    pub fn name(&self) -> String {
        self.body.name()
    }
}

pub struct NopOp {
    upstream: BoxedOp,
}

impl NopOp {
    pub fn new(upstream: BoxedOp) -> Self {
        Self { upstream }
    }
}

impl Op for NopOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        self.upstream.next()
    }

    fn reset(&mut self) {
        self.upstream.reset();
    }

    fn name(&self) -> String {
        "nop".to_string()
    }
}

/// Yields only the upstream stacks the predicate holds on.
pub struct AssertOp {
    upstream: BoxedOp,
    pred: Box<dyn Pred>,
}

impl AssertOp {
    pub fn new(upstream: BoxedOp, pred: Box<dyn Pred>) -> Self {
        Self { upstream, pred }
    }
}

impl Op for AssertOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        while let Some(mut stk) = self.upstream.next()? {
            if self.pred.result(&mut stk)? == PredResult::Yes {
                return Ok(Some(stk));
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.pred.reset();
        self.upstream.reset();
    }

    fn name(&self) -> String {
        format!("assert<{}>", self.pred.name())
    }
}

/// Pushes a clone of a fixed value onto every upstream stack.
pub struct ConstOp {
    upstream: BoxedOp,
    value: Value,
}

impl ConstOp {
    pub fn new(upstream: BoxedOp, value: Value) -> Self {
        Self { upstream, value }
    }
}

impl Op for ConstOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        match self.upstream.next()? {
            Some(mut stk) => {
                stk.push(self.value.clone());
                Ok(Some(stk))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.upstream.reset();
    }

    fn name(&self) -> String {
        format!("const<{}>", self.value)
    }
}

/// Pops TOS and binds it in the frame `depth` links up.
pub struct BindOp {
    upstream: BoxedOp,
    depth: usize,
    slot: usize,
}

impl BindOp {
    pub fn new(upstream: BoxedOp, depth: usize, slot: usize) -> Self {
        Self {
            upstream,
            depth,
            slot,
        }
    }
}

impl Op for BindOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        match self.upstream.next()? {
            Some(mut stk) => {
                stk.need(1, "bind")?;
                let value = stk.pop().unwrap();
                let frame = stk.nth_frame(self.depth);
                frame.borrow_mut().bind_value(self.slot, value);
                Ok(Some(stk))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.upstream.reset();
    }

    fn name(&self) -> String {
        format!("bind<{}@{}>", self.slot, self.depth)
    }
}

/// Pushes a clone of a bound variable; reading an unbound slot aborts
/// the query.
pub struct ReadOp {
    upstream: BoxedOp,
    depth: usize,
    slot: usize,
}

impl ReadOp {
    pub fn new(upstream: BoxedOp, depth: usize, slot: usize) -> Self {
        Self {
            upstream,
            depth,
            slot,
        }
    }
}

impl Op for ReadOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        match self.upstream.next()? {
            Some(mut stk) => {
                let frame = stk.nth_frame(self.depth);
                let value = frame.borrow().read_value(self.slot).ok_or(
                    crate::error::Error::UnboundVariable {
                        depth: self.depth,
                        slot: self.slot,
                    },
                )?;
                stk.push(value);
                Ok(Some(stk))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.upstream.reset();
    }

    fn name(&self) -> String {
        format!("read<{}@{}>", self.slot, self.depth)
    }
}

/// Pushes a closure value capturing the current frame.
pub struct LexClosureOp {
    upstream: BoxedOp,
    body: Rc<Plan>,
}

impl LexClosureOp {
    pub fn new(upstream: BoxedOp, body: Rc<Plan>) -> Self {
        Self { upstream, body }
    }
}

impl Op for LexClosureOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        match self.upstream.next()? {
            Some(mut stk) => {
                let frame = stk.frame();
                stk.push(Value::closure(self.body.clone(), frame));
                Ok(Some(stk))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.upstream.reset();
    }

    fn name(&self) -> String {
        "lex_closure".to_string()
    }
}

/// Pops a closure off TOS and executes its body.
///
/// The stack's frame is swapped for the closure's captured frame for the
/// duration of the body; each emitted stack gets the caller's frame
/// back, and the callee frame is unlinked if nothing else holds it. The
/// body chain is built fresh from the closure's compiled tree on every
/// activation, which keeps repeated and re-entrant application sound.
pub struct ApplyOp {
    upstream: BoxedOp,
    active: Option<SubExec>,
    old_frame: Option<FrameHandle>,
}

impl ApplyOp {
    pub fn new(upstream: BoxedOp) -> Self {
        Self {
            upstream,
            active: None,
            old_frame: None,
        }
    }

    fn reset_me(&mut self) {
        self.active = None;
        if let Some(of) = self.old_frame.take() {
            maybe_unlink_frame(&of);
        }
    }
}

impl Op for ApplyOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        loop {
            while self.active.is_none() {
                let Some(mut stk) = self.upstream.next()? else {
                    return Ok(None);
                };
                stk.need(1, "apply")?;
                let Some(closure) = stk.top().and_then(Value::as_closure).cloned() else {
                    error!(
                        "`apply` expects a T_CLOSURE on TOS, found {}",
                        stk.top().map(|v| v.type_name()).unwrap_or("nothing")
                    );
                    continue;
                };
                stk.pop();

                debug_assert!(self.old_frame.is_none());
                self.old_frame = Some(stk.frame());
                stk.set_frame(closure.frame.clone());

                let mut sub = SubExec::from_plan(&closure.body);
                sub.prime(stk);
                self.active = Some(sub);
            }

            if let Some(mut stk) = self.active.as_mut().unwrap().next()? {
                let callee_frame = stk.frame();
                stk.set_frame(self.old_frame.clone().unwrap());
                maybe_unlink_frame(&callee_frame);
                return Ok(Some(stk));
            }

            self.reset_me();
        }
    }

    fn reset(&mut self) {
        self.reset_me();
        self.upstream.reset();
    }

    fn name(&self) -> String {
        "apply".to_string()
    }
}

/// Installs a fresh frame of `num_slots` slots around its body.
pub struct ScopeOp {
    upstream: BoxedOp,
    sub: SubExec,
    num_slots: usize,
    primed: bool,
}

impl ScopeOp {
    pub fn new(upstream: BoxedOp, sub: SubExec, num_slots: usize) -> Self {
        Self {
            upstream,
            sub,
            num_slots,
            primed: false,
        }
    }
}

impl Op for ScopeOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        loop {
            while !self.primed {
                let Some(mut stk) = self.upstream.next()? else {
                    return Ok(None);
                };
                let parent = stk.frame();
                stk.set_frame(Frame::new(Some(parent), self.num_slots));
                self.sub.prime(stk);
                self.primed = true;
            }

            if let Some(mut stk) = self.sub.next()? {
                let scope_frame = stk.nth_frame(0);
                let parent = stk.nth_frame(1);
                stk.set_frame(parent);
                maybe_unlink_frame(&scope_frame);
                return Ok(Some(stk));
            }

            self.primed = false;
        }
    }

    fn reset(&mut self) {
        self.primed = false;
        self.sub.reset();
        self.upstream.reset();
    }

    fn name(&self) -> String {
        format!("scope<vars={}, {}>", self.num_slots, self.sub.name())
    }
}

/// Short-circuit alternation: for each upstream stack, the first branch
/// that yields at least one result is the only branch whose results are
/// emitted.
pub struct OrOp {
    upstream: BoxedOp,
    branches: Vec<SubExec>,
    active: Option<usize>,
}

impl OrOp {
    pub fn new(upstream: BoxedOp, branches: Vec<SubExec>) -> Self {
        Self {
            upstream,
            branches,
            active: None,
        }
    }

    fn reset_me(&mut self) {
        self.active = None;
        for branch in &mut self.branches {
            branch.reset();
        }
    }
}

impl Op for OrOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        loop {
            if let Some(idx) = self.active {
                if let Some(stk) = self.branches[idx].next()? {
                    return Ok(Some(stk));
                }
                self.reset_me();
            }

            let Some(stk) = self.upstream.next()? else {
                return Ok(None);
            };
            for idx in 0..self.branches.len() {
                self.branches[idx].prime(stk.clone());
                if let Some(out) = self.branches[idx].next()? {
                    self.active = Some(idx);
                    return Ok(Some(out));
                }
            }
            // No branch accepted this stack; fall through to the next one.
        }
    }

    fn reset(&mut self) {
        self.reset_me();
        self.upstream.reset();
    }

    fn name(&self) -> String {
        let names: Vec<String> = self.branches.iter().map(SubExec::name).collect();
        format!("or<{}>", names.join(" || "))
    }
}

/// Runs `cond` on a clone of the input; drives `then` if it yields at
/// least one result, `else` otherwise.
pub struct IfElseOp {
    upstream: BoxedOp,
    cond: SubExec,
    then_sub: SubExec,
    else_sub: SubExec,
    selected: Option<bool>,
}

impl IfElseOp {
    pub fn new(upstream: BoxedOp, cond: SubExec, then_sub: SubExec, else_sub: SubExec) -> Self {
        Self {
            upstream,
            cond,
            then_sub,
            else_sub,
            selected: None,
        }
    }

    fn selected_sub(&mut self) -> Option<&mut SubExec> {
        match self.selected {
            Some(true) => Some(&mut self.then_sub),
            Some(false) => Some(&mut self.else_sub),
            None => None,
        }
    }
}

impl Op for IfElseOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        loop {
            if self.selected.is_none() {
                let Some(stk) = self.upstream.next()? else {
                    return Ok(None);
                };
                self.cond.prime(stk.clone());
                let hit = self.cond.next()?.is_some();
                self.selected = Some(hit);
                self.selected_sub().unwrap().prime(stk);
            }

            if let Some(stk) = self.selected_sub().unwrap().next()? {
                return Ok(Some(stk));
            }
            self.selected = None;
        }
    }

    fn reset(&mut self) {
        self.selected = None;
        self.cond.reset();
        self.then_sub.reset();
        self.else_sub.reset();
        self.upstream.reset();
    }

    fn name(&self) -> String {
        "ifelse".to_string()
    }
}

/// Runs the inner expression on each upstream stack; for each inner
/// result, re-emits the upstream stack with the top `keep` values of the
/// result appended in order.
pub struct SubXOp {
    upstream: BoxedOp,
    sub: SubExec,
    keep: usize,
    current: Option<Stack>,
}

impl SubXOp {
    pub fn new(upstream: BoxedOp, sub: SubExec, keep: usize) -> Self {
        Self {
            upstream,
            sub,
            keep,
            current: None,
        }
    }
}

impl Op for SubXOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        loop {
            while self.current.is_none() {
                let Some(stk) = self.upstream.next()? else {
                    return Ok(None);
                };
                self.sub.prime(stk.clone());
                self.current = Some(stk);
            }

            if let Some(mut inner) = self.sub.next()? {
                let mut out = self.current.clone().unwrap();
                inner.need(self.keep, "sub-expression capture")?;
                let mut kept = Vec::with_capacity(self.keep);
                for _ in 0..self.keep {
                    kept.push(inner.pop().unwrap());
                }
                while let Some(v) = kept.pop() {
                    out.push(v);
                }
                return Ok(Some(out));
            }

            self.current = None;
        }
    }

    fn reset(&mut self) {
        self.current = None;
        self.sub.reset();
        self.upstream.reset();
    }

    fn name(&self) -> String {
        format!("subx<{}>", self.sub.name())
    }
}

/// Drives the inner expression to exhaustion, collects the top of every
/// result into a sequence and pushes it onto the original stack.
/// Collected elements are stamped with positions 0, 1, ...
pub struct CaptureOp {
    upstream: BoxedOp,
    sub: SubExec,
}

impl CaptureOp {
    pub fn new(upstream: BoxedOp, sub: SubExec) -> Self {
        Self { upstream, sub }
    }
}

impl Op for CaptureOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        match self.upstream.next()? {
            Some(mut stk) => {
                self.sub.prime(stk.clone());
                let mut elements = Vec::new();
                while let Some(mut inner) = self.sub.next()? {
                    inner.need(1, "capture")?;
                    let pos = elements.len();
                    elements.push(inner.pop().unwrap().with_pos(pos));
                }
                stk.push(Value::seq(elements));
                Ok(Some(stk))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.sub.reset();
        self.upstream.reset();
    }

    fn name(&self) -> String {
        format!("capture<{}>", self.sub.name())
    }
}

/// Transitive closure of the inner expression.
///
/// Breadth-by-frontier over a worklist with a seen-set keyed by stack
/// value. The seen-set is cleared for every new upstream stack: each
/// input provides a fresh context, and e.g. `entry root dup child* ?eq`
/// must see as many root-root matches as there are entries.
pub struct TrClosureOp {
    upstream: BoxedOp,
    sub: SubExec,
    is_plus: bool,
    worklist: Vec<Stack>,
    seen: HashSet<StackKey>,
    sub_drained: bool,
}

impl TrClosureOp {
    pub fn new(upstream: BoxedOp, sub: SubExec, is_plus: bool) -> Self {
        Self {
            upstream,
            sub,
            is_plus,
            worklist: Vec::new(),
            seen: HashSet::new(),
            sub_drained: true,
        }
    }

    fn reset_me(&mut self) {
        self.worklist.clear();
        self.seen.clear();
        self.sub_drained = true;
    }

    /// Yield a stack if it hasn't been seen in this context, remembering
    /// it for further expansion.
    fn yield_and_cache(&mut self, stk: Stack) -> Option<Stack> {
        if self.seen.insert(StackKey(stk.clone())) {
            self.worklist.push(stk.clone());
            Some(stk)
        } else {
            None
        }
    }

    fn next_from_upstream(&mut self) -> Result<Option<Stack>> {
        self.seen.clear();
        self.upstream.next()
    }

    fn next_from_sub(&mut self) -> Result<Option<Stack>> {
        if self.sub_drained {
            return Ok(None);
        }
        match self.sub.next()? {
            Some(stk) => Ok(Some(stk)),
            None => {
                self.sub_drained = true;
                Ok(None)
            }
        }
    }

    fn send_to_sub(&mut self) -> Result<bool> {
        if let Some(stk) = self.worklist.pop() {
            self.sub.prime(stk);
            self.sub_drained = false;
            return Ok(true);
        }
        if self.is_plus {
            if let Some(stk) = self.next_from_upstream()? {
                self.sub.prime(stk);
                self.sub_drained = false;
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Op for TrClosureOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        loop {
            while let Some(stk) = self.next_from_sub()? {
                if let Some(out) = self.yield_and_cache(stk) {
                    return Ok(Some(out));
                }
            }
            if self.send_to_sub()? {
                continue;
            }
            if !self.is_plus {
                if let Some(stk) = self.next_from_upstream()? {
                    // The input stack itself is the first result.
                    if let Some(out) = self.yield_and_cache(stk) {
                        return Ok(Some(out));
                    }
                    continue;
                }
            }
            return Ok(None);
        }
    }

    fn reset(&mut self) {
        self.reset_me();
        self.sub.reset();
        self.upstream.reset();
    }

    fn name(&self) -> String {
        format!(
            "close<{}, {}>",
            if self.is_plus { "plus" } else { "star" },
            self.sub.name()
        )
    }
}

/// One peer of a K-way tee over a shared upstream.
///
/// The peers share a slot file and a done flag. Whichever peer finds the
/// file drained pulls one upstream stack and copies it K-fold; each peer
/// then consumes its own slot.
pub struct TineOp {
    upstream: Rc<RefCell<BoxedOp>>,
    file: Rc<RefCell<Vec<Option<Stack>>>>,
    done: Rc<Cell<bool>>,
    branch: usize,
}

impl TineOp {
    pub fn new(
        upstream: Rc<RefCell<BoxedOp>>,
        file: Rc<RefCell<Vec<Option<Stack>>>>,
        done: Rc<Cell<bool>>,
        branch: usize,
    ) -> Self {
        Self {
            upstream,
            file,
            done,
            branch,
        }
    }
}

impl Op for TineOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        if self.done.get() {
            return Ok(None);
        }

        if self.file.borrow().iter().all(Option::is_none) {
            match self.upstream.borrow_mut().next()? {
                Some(stk) => {
                    let mut file = self.file.borrow_mut();
                    for slot in file.iter_mut() {
                        *slot = Some(stk.clone());
                    }
                }
                None => {
                    self.done.set(true);
                    return Ok(None);
                }
            }
        }

        Ok(self.file.borrow_mut()[self.branch].take())
    }

    fn reset(&mut self) {
        for slot in self.file.borrow_mut().iter_mut() {
            *slot = None;
        }
        self.upstream.borrow_mut().reset();
    }

    fn name(&self) -> String {
        "tine".to_string()
    }
}

/// Round-robins one result from each branch until all drain.
pub struct MergeOp {
    branches: Vec<BoxedOp>,
    done: Rc<Cell<bool>>,
    current: usize,
}

impl MergeOp {
    pub fn new(branches: Vec<BoxedOp>, done: Rc<Cell<bool>>) -> Self {
        Self {
            branches,
            done,
            current: 0,
        }
    }
}

impl Op for MergeOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        if self.branches.is_empty() {
            return Ok(None);
        }
        // A full cycle of empty answers means no branch can make
        // progress: every slot is consumed and the upstream is drained.
        let mut empty_answers = 0;
        while empty_answers < self.branches.len() {
            let result = self.branches[self.current].next()?;
            self.current = (self.current + 1) % self.branches.len();
            match result {
                Some(stk) => return Ok(Some(stk)),
                None => empty_answers += 1,
            }
        }
        Ok(None)
    }

    fn reset(&mut self) {
        self.done.set(false);
        self.current = 0;
        for branch in &mut self.branches {
            branch.reset();
        }
    }

    fn name(&self) -> String {
        "merge".to_string()
    }
}

/// The boundary operator of the string-format sub-engine: drives the
/// stringer chain and pushes each assembled string, positions counted
/// from 0 per upstream stack.
pub struct FormatOp {
    upstream: BoxedOp,
    origin: StringerOriginHandle,
    stringer: Box<dyn Stringer>,
    pos: usize,
}

impl FormatOp {
    pub fn new(upstream: BoxedOp, origin: StringerOriginHandle, stringer: Box<dyn Stringer>) -> Self {
        Self {
            upstream,
            origin,
            stringer,
            pos: 0,
        }
    }

    fn reset_me(&mut self) {
        self.stringer.reset();
        self.pos = 0;
    }
}

impl Op for FormatOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        loop {
            if let Some((mut stk, text)) = self.stringer.next()? {
                let pos = self.pos;
                self.pos += 1;
                stk.push(Value::str(text).with_pos(pos));
                return Ok(Some(stk));
            }

            match self.upstream.next()? {
                Some(stk) => {
                    self.reset_me();
                    self.origin.borrow_mut().set_next(stk);
                }
                None => return Ok(None),
            }
        }
    }

    fn reset(&mut self) {
        self.reset_me();
        self.upstream.reset();
    }

    fn name(&self) -> String {
        "format".to_string()
    }
}

/// Identity; dumps each passing stack to the log.
pub struct DebugOp {
    upstream: BoxedOp,
}

impl DebugOp {
    pub fn new(upstream: BoxedOp) -> Self {
        Self { upstream }
    }
}

impl Op for DebugOp {
    fn next(&mut self) -> Result<Option<Stack>> {
        match self.upstream.next()? {
            Some(stk) => {
                let rendered: Vec<String> =
                    stk.values().iter().map(|v| v.to_string()).collect();
                debug!("< {} >", rendered.join(" "));
                Ok(Some(stk))
            }
            None => Ok(None),
        }
    }

    fn reset(&mut self) {
        self.upstream.reset();
    }

    fn name(&self) -> String {
        "debug".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::Constant;
    use crate::pred::PredPos;

    fn cst(n: i64) -> Value {
        Value::cst(Constant::dec(n))
    }

    fn drain(op: &mut dyn Op) -> Vec<Stack> {
        let mut out = Vec::new();
        while let Some(stk) = op.next().unwrap() {
            out.push(stk);
        }
        out
    }

    fn drive(op: &mut dyn Op, origin: &OriginHandle, stk: Stack) -> Vec<Stack> {
        op.reset();
        origin.borrow_mut().set_next(stk);
        drain(op)
    }

    #[test]
    fn origin_yields_its_slot_once() {
        let origin = new_origin();
        let mut op = OriginOp(origin.clone());
        origin.borrow_mut().set_next(Stack::new());
        assert!(op.next().unwrap().is_some());
        assert!(op.next().unwrap().is_none());
    }

    #[test]
    #[should_panic(expected = "primed twice")]
    fn priming_twice_without_reset_panics() {
        let origin = new_origin();
        origin.borrow_mut().set_next(Stack::new());
        origin.borrow_mut().set_next(Stack::new());
    }

    #[test]
    fn nop_passes_through() {
        let origin = new_origin();
        let mut op = NopOp::new(Box::new(OriginOp(origin.clone())));
        let mut stk = Stack::new();
        stk.push(cst(7));
        let out = drive(&mut op, &origin, stk);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].top().unwrap().to_string(), "7");
    }

    #[test]
    fn reset_and_reprime_reproduces_the_sequence() {
        // Spec of every operator: after reset + set_next, next() behaves
        // as on a fresh construction.
        let origin = new_origin();
        let mut op: BoxedOp = Box::new(ConstOp::new(
            Box::new(ConstOp::new(Box::new(OriginOp(origin.clone())), cst(1))),
            cst(2),
        ));

        let render = |stks: Vec<Stack>| -> Vec<Vec<String>> {
            stks.iter()
                .map(|s| s.values().iter().map(|v| v.to_string()).collect())
                .collect()
        };

        let first = render(drive(op.as_mut(), &origin, Stack::new()));
        let second = render(drive(op.as_mut(), &origin, Stack::new()));
        assert_eq!(first, second);
        assert_eq!(first, vec![vec!["1".to_string(), "2".to_string()]]);
    }

    #[test]
    fn assert_filters_by_position() {
        let origin = new_origin();
        let mut op = AssertOp::new(
            Box::new(OriginOp(origin.clone())),
            Box::new(PredPos::new(3)),
        );

        let mut hit = Stack::new();
        hit.push(cst(5).with_pos(3));
        assert_eq!(drive(&mut op, &origin, hit).len(), 1);

        let mut miss = Stack::new();
        miss.push(cst(5).with_pos(0));
        assert!(drive(&mut op, &origin, miss).is_empty());
    }
}
