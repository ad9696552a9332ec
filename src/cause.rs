/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

use std::ops::Add;
use std::ops::BitAnd;
use std::sync::Arc;

use crate::defect::Defect;
use crate::defect::ZTrace;
use crate::fiber_id::FiberId;

/// Rendering options attached by [`Cause::stack`]/[`Cause::stackless`].
///
/// Currently carries only the one flag the pretty-printer cares about, but
/// is its own type (rather than a bare `bool`) so `Cause::Meta` has room to
/// grow without becoming a breaking change for matchers that destructure it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderMeta {
    pub(crate) stackless: bool,
}

/// An immutable, typed, tree-shaped record of why a concurrent computation
/// failed.
///
/// A `Cause<E>` is never constructed by matching on its variants directly
/// from outside this crate (see the smart constructors below and on
/// [`Cause`]'s inherent `impl`); this keeps the invariants in the crate
/// documentation enforceable. Children are held behind `Arc` so Cause values
/// can be freely shared and cheaply cloned without that sharing ever being
/// observable — every operation in this crate treats a `Cause` purely as a
/// value.
#[derive(Debug, Clone)]
pub enum Cause<E> {
    /// No failure. The identity for both [`Cause::then`] and [`Cause::both`].
    Empty,
    /// A checked, domain-level error.
    Fail(E),
    /// An unchecked defect: a host-level throwable-like value.
    Die(Arc<dyn Defect>),
    /// This fiber was interrupted by the identified fiber.
    Interrupt(FiberId),
    /// `left` occurred, then `right` occurred.
    Then(Arc<Cause<E>>, Arc<Cause<E>>),
    /// `left` and `right` occurred concurrently.
    Both(Arc<Cause<E>>, Arc<Cause<E>>),
    /// An execution trace annotation. Transparent to everything except
    /// pretty-printing and [`Cause::untraced`].
    Traced(Arc<Cause<E>>, Arc<ZTrace>),
    /// A rendering-options annotation. Transparent to everything except
    /// pretty-printing.
    Meta(Arc<Cause<E>>, RenderMeta),
}

/// The unique empty cause. Generic over `E` the way the source types it as
/// `Cause[Never]`: since `Cause::Empty` never holds an `E`, this constructor
/// is valid at any `E` without needing an uninhabited-type marker in the
/// public signature.
pub fn empty<E>() -> Cause<E> {
    Cause::Empty
}

/// A checked, domain-level failure.
pub fn fail<E>(e: E) -> Cause<E> {
    Cause::Fail(e)
}

/// An unchecked defect.
pub fn die<E>(defect: Arc<dyn Defect>) -> Cause<E> {
    Cause::Die(defect)
}

/// This fiber was interrupted by `id`.
pub fn interrupt<E>(id: FiberId) -> Cause<E> {
    Cause::Interrupt(id)
}

impl<E> Cause<E> {
    /// Sequential composition: `self` occurred, then `other` occurred.
    ///
    /// Returns `other` when `self` is literally [`Cause::Empty`], and `self`
    /// when `other` is literally [`Cause::Empty`] — the eager half of the
    /// sequential identity law; the rest is handled by equality, which also
    /// recognizes causes that merely *reduce to* Empty (e.g. a stripped-out
    /// failure) as identities.
    pub fn then(self, other: Cause<E>) -> Cause<E> {
        match (&self, &other) {
            (Cause::Empty, _) => other,
            (_, Cause::Empty) => self,
            _ => Cause::Then(Arc::new(self), Arc::new(other)),
        }
    }

    /// Parallel composition: `self` and `other` occurred concurrently.
    ///
    /// Unlike [`Cause::then`], this does not eagerly fold away an `Empty`
    /// operand: per the algebra's laws, `Empty` is a parallel identity too,
    /// but that identity is enforced by equality rather than construction.
    pub fn both(self, other: Cause<E>) -> Cause<E> {
        Cause::Both(Arc::new(self), Arc::new(other))
    }

    /// Wraps in a rendering annotation that keeps defect stack traces.
    pub fn stack(self) -> Cause<E> {
        Cause::Meta(Arc::new(self), RenderMeta { stackless: false })
    }

    /// Wraps in a rendering annotation that omits defect stack traces.
    pub fn stackless(self) -> Cause<E> {
        Cause::Meta(Arc::new(self), RenderMeta { stackless: true })
    }

    /// Attaches an execution trace.
    pub fn traced(self, trace: ZTrace) -> Cause<E> {
        Cause::Traced(Arc::new(self), Arc::new(trace))
    }

    /// Removes every [`Cause::Traced`] annotation, preserving [`Cause::Meta`].
    pub fn untraced(self) -> Cause<E>
    where
        E: Clone,
    {
        enum Task<E> {
            Eval(Cause<E>),
            Then,
            Both,
            Meta(RenderMeta),
        }

        let mut tasks = vec![Task::Eval(self)];
        let mut values: Vec<Cause<E>> = Vec::new();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Eval(c) => match c {
                    Cause::Empty | Cause::Fail(_) | Cause::Die(_) | Cause::Interrupt(_) => {
                        values.push(c)
                    }
                    Cause::Then(l, r) => {
                        tasks.push(Task::Then);
                        tasks.push(Task::Eval(unwrap_arc(r)));
                        tasks.push(Task::Eval(unwrap_arc(l)));
                    }
                    Cause::Both(l, r) => {
                        tasks.push(Task::Both);
                        tasks.push(Task::Eval(unwrap_arc(r)));
                        tasks.push(Task::Eval(unwrap_arc(l)));
                    }
                    Cause::Traced(c, _) => {
                        tasks.push(Task::Eval(unwrap_arc(c)));
                    }
                    Cause::Meta(c, m) => {
                        tasks.push(Task::Meta(m));
                        tasks.push(Task::Eval(unwrap_arc(c)));
                    }
                },
                Task::Then => {
                    let r = values.pop().expect("rhs evaluated before Then");
                    let l = values.pop().expect("lhs evaluated before Then");
                    values.push(l.then(r));
                }
                Task::Both => {
                    let r = values.pop().expect("rhs evaluated before Both");
                    let l = values.pop().expect("lhs evaluated before Both");
                    values.push(l.both(r));
                }
                Task::Meta(m) => {
                    let c = values.pop().expect("inner evaluated before Meta");
                    values.push(Cause::Meta(Arc::new(c), m));
                }
            }
        }
        values.pop().expect("traversal always yields exactly one value")
    }

    /// Rebuilds the tree, replacing each `Fail` payload via `f`.
    pub fn map<E2>(self, mut f: impl FnMut(E) -> E2) -> Cause<E2>
    where
        E: Clone,
    {
        self.flat_map(move |e| Cause::Fail(f(e)))
    }

    /// Substitutes each `Fail(e)` with `f(e)`. Structure-preserving on every
    /// other node; recurses through `Traced`/`Meta`, preserving the wrapper.
    pub fn flat_map<E2>(self, mut f: impl FnMut(E) -> Cause<E2>) -> Cause<E2>
    where
        E: Clone,
    {
        enum Task<E, E2> {
            Eval(Cause<E>),
            Then,
            Both,
            Traced(Arc<ZTrace>),
            Meta(RenderMeta),
            _Marker(std::marker::PhantomData<E2>),
        }

        let mut tasks = vec![Task::Eval(self)];
        let mut values: Vec<Cause<E2>> = Vec::new();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Eval(c) => match c {
                    Cause::Empty => values.push(Cause::Empty),
                    Cause::Fail(e) => values.push(f(e)),
                    Cause::Die(d) => values.push(Cause::Die(d)),
                    Cause::Interrupt(id) => values.push(Cause::Interrupt(id)),
                    Cause::Then(l, r) => {
                        tasks.push(Task::Then);
                        tasks.push(Task::Eval(unwrap_arc(r)));
                        tasks.push(Task::Eval(unwrap_arc(l)));
                    }
                    Cause::Both(l, r) => {
                        tasks.push(Task::Both);
                        tasks.push(Task::Eval(unwrap_arc(r)));
                        tasks.push(Task::Eval(unwrap_arc(l)));
                    }
                    Cause::Traced(c, t) => {
                        tasks.push(Task::Traced(t));
                        tasks.push(Task::Eval(unwrap_arc(c)));
                    }
                    Cause::Meta(c, m) => {
                        tasks.push(Task::Meta(m));
                        tasks.push(Task::Eval(unwrap_arc(c)));
                    }
                },
                Task::Then => {
                    let r = values.pop().expect("rhs evaluated before Then");
                    let l = values.pop().expect("lhs evaluated before Then");
                    values.push(l.then(r));
                }
                Task::Both => {
                    let r = values.pop().expect("rhs evaluated before Both");
                    let l = values.pop().expect("lhs evaluated before Both");
                    values.push(l.both(r));
                }
                Task::Traced(t) => {
                    let c = values.pop().expect("inner evaluated before Traced");
                    values.push(Cause::Traced(Arc::new(c), t));
                }
                Task::Meta(m) => {
                    let c = values.pop().expect("inner evaluated before Meta");
                    values.push(Cause::Meta(Arc::new(c), m));
                }
                Task::_Marker(_) => unreachable!(),
            }
        }
        values.pop().expect("traversal always yields exactly one value")
    }
}

impl<E> Cause<Cause<E>> {
    /// `flat_map(identity)`: collapses a `Cause<Cause<E>>` one level.
    pub fn flatten(self) -> Cause<E>
    where
        E: Clone,
        Cause<E>: Clone,
    {
        self.flat_map(|c| c)
    }
}

/// Moves a `Cause<E>` out of an `Arc`, cloning only if the `Arc` is shared.
///
/// This is how tree-rebuilding combinators ([`Cause::map`], [`Cause::flat_map`],
/// [`Cause::untraced`]) consume `self` by value while still supporting freely
/// shared subtrees: the common case (a subtree with exactly one owner) is a
/// plain move, and only a genuinely shared subtree pays for a clone.
pub(crate) fn unwrap_arc<E: Clone>(arc: Arc<Cause<E>>) -> Cause<E> {
    Arc::try_unwrap(arc).unwrap_or_else(|shared| (*shared).clone())
}

impl<E> Add for Cause<E> {
    type Output = Cause<E>;

    /// `++`: sequential composition. See [`Cause::then`].
    fn add(self, rhs: Cause<E>) -> Cause<E> {
        self.then(rhs)
    }
}

impl<E> BitAnd for Cause<E> {
    type Output = Cause<E>;

    /// `&&`: parallel composition. See [`Cause::both`].
    fn bitand(self, rhs: Cause<E>) -> Cause<E> {
        self.both(rhs)
    }
}
