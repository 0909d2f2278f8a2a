//! Compilation: AST to executable plan.
//!
//! A [`Plan`] is the resolved form of a query — words bound to their
//! vocabulary entries, lexical names turned into `(depth, slot)` pairs,
//! scopes sized. Plans are shared (`Rc`) and can be instantiated into an
//! operator chain any number of times; closure application relies on
//! that to build a fresh chain per activation.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dwq_ast::{CmpRel, Expr, ExprKind, Name, Radix, Span, StrPart};
use dwq_parser::ParseError;
use thiserror::Error;

use crate::constant::{Constant, BIN_DOMAIN, DEC_DOMAIN, HEX_DOMAIN, OCT_DOMAIN};
use crate::op::{
    AssertOp, BindOp, BoxedOp, CaptureOp, ConstOp, FormatOp, IfElseOp, LexClosureOp, MergeOp,
    OrOp, ReadOp, ScopeOp, SubExec, SubXOp, TineOp, TrClosureOp,
};
use crate::overload::{OverloadOp, OverloadPred, OverloadTable, PredTable};
use crate::pred::{Pred, PredNot, PredSubxAny, PredSubxCompare};
use crate::stringer::{new_stringer_origin, Stringer, StringerLit, StringerOp, StringerOriginOp};
use crate::value::Value;
use crate::vocabulary::{OpBuilder, PredBuilder, Vocabulary, WordEntry};

/// Compile-time errors.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("unknown word `{name}` at {span:?}")]
    UnknownWord { name: String, span: Span },

    #[error("binding `{name}` declared twice in one scope at {span:?}")]
    DuplicateBinding { name: String, span: Span },
}

/// A resolved program tree node.
pub enum Plan {
    /// Concatenation, built left to right.
    Seq(Vec<Rc<Plan>>),
    Const(Value),
    Format(Vec<FormatPart>),
    WordOp {
        table: Rc<OverloadTable>,
    },
    Builtin {
        builder: Rc<dyn OpBuilder>,
    },
    Assert(Rc<PredPlan>),
    Bind {
        depth: usize,
        slot: usize,
    },
    Read {
        depth: usize,
        slot: usize,
    },
    Closure(Rc<Plan>),
    Scope {
        num_slots: usize,
        body: Rc<Plan>,
    },
    Or(Vec<Rc<Plan>>),
    Alt(Vec<Rc<Plan>>),
    Capture(Rc<Plan>),
    TrClosure {
        body: Rc<Plan>,
        plus: bool,
    },
    IfElse {
        cond: Rc<Plan>,
        then_plan: Rc<Plan>,
        else_plan: Rc<Plan>,
    },
    /// `let`: capture the top values of the body's results, bind them in
    /// the current frame.
    Let {
        body: Rc<Plan>,
        slots: Vec<usize>,
    },
}

pub enum FormatPart {
    Lit(String),
    Sub(Rc<Plan>),
}

pub enum PredPlan {
    Any(Rc<Plan>),
    Not(Rc<PredPlan>),
    Compare {
        lhs: Rc<Plan>,
        rhs: Rc<Plan>,
        rel: Rc<PredPlan>,
    },
    WordTable(Rc<PredTable>),
    WordBuiltin(Rc<dyn PredBuilder>),
}

impl Plan {
    /// Instantiate this plan into an operator chain on top of `upstream`.
    pub fn build(self: &Rc<Plan>, upstream: BoxedOp) -> BoxedOp {
        match self.as_ref() {
            Plan::Seq(items) => items
                .iter()
                .fold(upstream, |up, item| item.build(up)),
            Plan::Const(value) => Box::new(ConstOp::new(upstream, value.clone())),
            Plan::Format(parts) => {
                let origin = new_stringer_origin();
                let mut chain: Box<dyn Stringer> = Box::new(StringerOriginOp(origin.clone()));
                for part in parts.iter().rev() {
                    chain = match part {
                        FormatPart::Lit(text) => Box::new(StringerLit::new(chain, text.clone())),
                        FormatPart::Sub(plan) => {
                            Box::new(StringerOp::new(chain, SubExec::from_plan(plan)))
                        }
                    };
                }
                Box::new(FormatOp::new(upstream, origin, chain))
            }
            Plan::WordOp { table } => Box::new(OverloadOp::new(upstream, table.clone())),
            Plan::Builtin { builder } => builder.build(upstream),
            Plan::Assert(pred) => Box::new(AssertOp::new(upstream, build_pred(pred))),
            Plan::Bind { depth, slot } => Box::new(BindOp::new(upstream, *depth, *slot)),
            Plan::Read { depth, slot } => Box::new(ReadOp::new(upstream, *depth, *slot)),
            Plan::Closure(body) => Box::new(LexClosureOp::new(upstream, body.clone())),
            Plan::Scope { num_slots, body } => Box::new(ScopeOp::new(
                upstream,
                SubExec::from_plan(body),
                *num_slots,
            )),
            Plan::Or(branches) => Box::new(OrOp::new(
                upstream,
                branches.iter().map(SubExec::from_plan).collect(),
            )),
            Plan::Alt(branches) => {
                let shared = Rc::new(RefCell::new(upstream));
                let file = Rc::new(RefCell::new(vec![None; branches.len()]));
                let done = Rc::new(Cell::new(false));
                let built: Vec<BoxedOp> = branches
                    .iter()
                    .enumerate()
                    .map(|(i, branch)| {
                        branch.build(Box::new(TineOp::new(
                            shared.clone(),
                            file.clone(),
                            done.clone(),
                            i,
                        )))
                    })
                    .collect();
                Box::new(MergeOp::new(built, done))
            }
            Plan::Capture(body) => {
                Box::new(CaptureOp::new(upstream, SubExec::from_plan(body)))
            }
            Plan::TrClosure { body, plus } => Box::new(TrClosureOp::new(
                upstream,
                SubExec::from_plan(body),
                *plus,
            )),
            Plan::IfElse {
                cond,
                then_plan,
                else_plan,
            } => Box::new(IfElseOp::new(
                upstream,
                SubExec::from_plan(cond),
                SubExec::from_plan(then_plan),
                SubExec::from_plan(else_plan),
            )),
            Plan::Let { body, slots } => {
                let mut op: BoxedOp = Box::new(SubXOp::new(
                    upstream,
                    SubExec::from_plan(body),
                    slots.len(),
                ));
                // Bind from the top down: the last name takes TOS.
                for slot in slots.iter().rev() {
                    op = Box::new(BindOp::new(op, 0, *slot));
                }
                op
            }
        }
    }
}

pub fn build_pred(plan: &Rc<PredPlan>) -> Box<dyn Pred> {
    match plan.as_ref() {
        PredPlan::Any(body) => Box::new(PredSubxAny::new(SubExec::from_plan(body))),
        PredPlan::Not(inner) => Box::new(PredNot(build_pred(inner))),
        PredPlan::Compare { lhs, rhs, rel } => Box::new(PredSubxCompare::new(
            SubExec::from_plan(lhs),
            SubExec::from_plan(rhs),
            build_pred(rel),
        )),
        PredPlan::WordTable(table) => Box::new(OverloadPred::new(table.clone())),
        PredPlan::WordBuiltin(builder) => builder.build(),
    }
}

/// Lower a parsed query against a vocabulary.
pub fn lower_query(expr: &Expr, voc: &Vocabulary) -> Result<Rc<Plan>, CompileError> {
    let mut resolver = Resolver {
        voc,
        scopes: Vec::new(),
    };
    resolver.lower_block(expr)
}

struct ScopeInfo {
    names: Vec<String>,
    /// Slot the next `let` in this scope will bind from.
    next_let_slot: usize,
}

struct Resolver<'v> {
    voc: &'v Vocabulary,
    scopes: Vec<ScopeInfo>,
}

impl Resolver<'_> {
    /// Lower the body of a scope-introducing construct: the program
    /// root, a group with a binding header, a closure body, a captured
    /// or asserted sub-expression, a branch. Creates a scope when the
    /// body declares bindings, otherwise lowers transparently.
    fn lower_block(&mut self, body: &Expr) -> Result<Rc<Plan>, CompileError> {
        let (header, inner): (&[Name], &Expr) = match &body.kind {
            ExprKind::Scoped { names, body } => (names, body),
            _ => (&[], body),
        };

        let mut declared: Vec<Name> = header.to_vec();
        collect_let_names(inner, &mut declared);
        if declared.is_empty() {
            return self.lower_expr(inner);
        }
        for (i, name) in declared.iter().enumerate() {
            if declared[..i].iter().any(|n| n.text == name.text) {
                return Err(CompileError::DuplicateBinding {
                    name: name.text.clone(),
                    span: name.span,
                });
            }
        }

        self.scopes.push(ScopeInfo {
            names: declared.iter().map(|n| n.text.clone()).collect(),
            next_let_slot: header.len(),
        });

        let mut items: Vec<Rc<Plan>> = Vec::new();
        // The header pops TOS into the last name first.
        for slot in (0..header.len()).rev() {
            items.push(Rc::new(Plan::Bind { depth: 0, slot }));
        }
        let result = self.lower_expr(inner);
        let info = self.scopes.pop().unwrap();
        items.push(result?);

        Ok(Rc::new(Plan::Scope {
            num_slots: info.names.len(),
            body: Rc::new(Plan::Seq(items)),
        }))
    }

    fn lower_expr(&mut self, expr: &Expr) -> Result<Rc<Plan>, CompileError> {
        Ok(match &expr.kind {
            ExprKind::Cat(items) => {
                let lowered = items
                    .iter()
                    .map(|item| self.lower_expr(item))
                    .collect::<Result<Vec<_>, _>>()?;
                Rc::new(Plan::Seq(lowered))
            }
            ExprKind::Alt(branches) => Rc::new(Plan::Alt(
                branches
                    .iter()
                    .map(|b| self.lower_block(b))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            ExprKind::Or(branches) => Rc::new(Plan::Or(
                branches
                    .iter()
                    .map(|b| self.lower_block(b))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            ExprKind::Capture(body) => {
                if is_empty_cat(body) {
                    Rc::new(Plan::Const(Value::seq(Vec::new())))
                } else {
                    Rc::new(Plan::Capture(self.lower_block(body)?))
                }
            }
            ExprKind::Closure(body) => Rc::new(Plan::Closure(self.lower_block(body)?)),
            ExprKind::AssertAny { body, positive } => {
                let any = Rc::new(PredPlan::Any(self.lower_block(body)?));
                let pred = if *positive {
                    any
                } else {
                    Rc::new(PredPlan::Not(any))
                };
                Rc::new(Plan::Assert(pred))
            }
            ExprKind::Compare { lhs, rhs, rel } => {
                let rel_plan = self.lower_rel(*rel, expr.span)?;
                Rc::new(Plan::Assert(Rc::new(PredPlan::Compare {
                    lhs: self.lower_block(lhs)?,
                    rhs: self.lower_block(rhs)?,
                    rel: rel_plan,
                })))
            }
            ExprKind::Star(body) => Rc::new(Plan::TrClosure {
                body: self.lower_block(body)?,
                plus: false,
            }),
            ExprKind::Plus(body) => Rc::new(Plan::TrClosure {
                body: self.lower_block(body)?,
                plus: true,
            }),
            ExprKind::Opt(body) => Rc::new(Plan::Alt(vec![
                Rc::new(Plan::Seq(Vec::new())),
                self.lower_block(body)?,
            ])),
            ExprKind::IfElse {
                cond,
                then_branch,
                else_branch,
            } => Rc::new(Plan::IfElse {
                cond: self.lower_block(cond)?,
                then_plan: self.lower_block(then_branch)?,
                else_plan: self.lower_block(else_branch)?,
            }),
            ExprKind::Let { names, body } => {
                let body_plan = self.lower_block(body)?;
                let scope = self
                    .scopes
                    .last_mut()
                    .expect("BUG: let outside any scope survived collection");
                let first = scope.next_let_slot;
                scope.next_let_slot += names.len();
                let slots: Vec<usize> = (first..first + names.len()).collect();
                Rc::new(Plan::Let {
                    body: body_plan,
                    slots,
                })
            }
            ExprKind::Scoped { .. } => self.lower_block(expr)?,
            ExprKind::Word(name) => self.lower_word(name)?,
            ExprKind::Int { value, radix } => {
                let dom = match radix {
                    Radix::Dec => DEC_DOMAIN,
                    Radix::Hex => HEX_DOMAIN,
                    Radix::Oct => OCT_DOMAIN,
                    Radix::Bin => BIN_DOMAIN,
                };
                Rc::new(Plan::Const(Value::cst(Constant::new(*value, dom))))
            }
            ExprKind::Str(parts) => {
                if let [StrPart::Lit(text)] = parts.as_slice() {
                    Rc::new(Plan::Const(Value::str(text.clone())))
                } else {
                    let lowered = parts
                        .iter()
                        .map(|part| {
                            Ok(match part {
                                StrPart::Lit(text) => FormatPart::Lit(text.clone()),
                                StrPart::Hole(hole) => {
                                    FormatPart::Sub(self.lower_block(hole)?)
                                }
                            })
                        })
                        .collect::<Result<Vec<_>, CompileError>>()?;
                    Rc::new(Plan::Format(lowered))
                }
            }
        })
    }

    fn lower_word(&mut self, name: &Name) -> Result<Rc<Plan>, CompileError> {
        let text = name.text.as_str();

        if !text.starts_with(['?', '!', '@']) {
            if let Some((depth, slot)) = self.lookup(text) {
                return Ok(Rc::new(Plan::Read { depth, slot }));
            }
        }

        match self.voc.get(text) {
            Some(WordEntry::Ops(table)) => Ok(Rc::new(Plan::WordOp {
                table: table.clone(),
            })),
            Some(WordEntry::Builtin(builder)) => Ok(Rc::new(Plan::Builtin {
                builder: builder.clone(),
            })),
            Some(WordEntry::Preds(table)) => Ok(Rc::new(Plan::Assert(Rc::new(
                PredPlan::WordTable(table.clone()),
            )))),
            Some(WordEntry::PredBuiltin(builder)) => Ok(Rc::new(Plan::Assert(Rc::new(
                PredPlan::WordBuiltin(builder.clone()),
            )))),
            Some(WordEntry::Constant(value)) => Ok(Rc::new(Plan::Const(value.clone()))),
            None => {
                // `!word` negates the registered `?word`.
                if let Some(rest) = text.strip_prefix('!') {
                    let positive = format!("?{rest}");
                    let pred = match self.voc.get(&positive) {
                        Some(WordEntry::Preds(table)) => {
                            Some(Rc::new(PredPlan::WordTable(table.clone())))
                        }
                        Some(WordEntry::PredBuiltin(builder)) => {
                            Some(Rc::new(PredPlan::WordBuiltin(builder.clone())))
                        }
                        _ => None,
                    };
                    if let Some(pred) = pred {
                        return Ok(Rc::new(Plan::Assert(Rc::new(PredPlan::Not(pred)))));
                    }
                }
                Err(CompileError::UnknownWord {
                    name: text.to_string(),
                    span: name.span,
                })
            }
        }
    }

    fn lower_rel(&self, rel: CmpRel, span: Span) -> Result<Rc<PredPlan>, CompileError> {
        match self.voc.get(rel.word()) {
            Some(WordEntry::Preds(table)) => Ok(Rc::new(PredPlan::WordTable(table.clone()))),
            Some(WordEntry::PredBuiltin(builder)) => {
                Ok(Rc::new(PredPlan::WordBuiltin(builder.clone())))
            }
            _ => Err(CompileError::UnknownWord {
                name: rel.word().to_string(),
                span,
            }),
        }
    }

    fn lookup(&self, name: &str) -> Option<(usize, usize)> {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if let Some(slot) = scope.names.iter().position(|n| n == name) {
                return Some((depth, slot));
            }
        }
        None
    }
}

fn is_empty_cat(expr: &Expr) -> bool {
    matches!(&expr.kind, ExprKind::Cat(items) if items.is_empty())
}

/// Gather the names declared by `let`s that belong to this block: those
/// reachable through concatenation without crossing into another
/// scope-introducing construct.
fn collect_let_names(expr: &Expr, out: &mut Vec<Name>) {
    match &expr.kind {
        ExprKind::Cat(items) => {
            for item in items {
                collect_let_names(item, out);
            }
        }
        ExprKind::Let { names, .. } => out.extend(names.iter().cloned()),
        _ => {}
    }
}
