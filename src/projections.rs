/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Derived traversals over a `Cause`: the projections listed in the
//! algebra's component design, plus the booleans and `squash` built on top
//! of them.
//!
//! Every traversal here walks the tree with an explicit work stack rather
//! than recursing, the same discipline `cause.rs`'s combinators and
//! `fold.rs`'s eliminator follow — a `Cause` produced by a long-running
//! retry loop can be a right-nested `Then` chain a hundred thousand deep,
//! and none of these operations may overflow the host stack on one.

use std::collections::HashSet;
use std::sync::Arc;

use either::Either;

use crate::cause::Cause;
use crate::defect::synthetic_interrupted_defect;
use crate::defect::Defect;
use crate::defect::ZTrace;
use crate::fiber_id::FiberId;
use crate::fiber_id::Never;

/// Depth-first, left-to-right walk collecting `f`'s result at every node.
/// `Then`/`Both` children are visited left-before-right; `Traced`/`Meta`
/// wrappers are transparent and simply continue into their inner cause.
fn walk<'a, E>(root: &'a Cause<E>, mut visit: impl FnMut(&'a Cause<E>)) {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        visit(node);
        match node {
            Cause::Then(l, r) | Cause::Both(l, r) => {
                stack.push(r);
                stack.push(l);
            }
            Cause::Traced(inner, _) | Cause::Meta(inner, _) => stack.push(inner),
            Cause::Empty | Cause::Fail(_) | Cause::Die(_) | Cause::Interrupt(_) => {}
        }
    }
}

impl<E> Cause<E> {
    /// Every `Fail` payload, left-to-right.
    pub fn failures(&self) -> Vec<&E> {
        let mut out = Vec::new();
        walk(self, |node| {
            if let Cause::Fail(e) = node {
                out.push(e);
            }
        });
        out
    }

    /// Every `Die` payload, left-to-right.
    pub fn defects(&self) -> Vec<&Arc<dyn Defect>> {
        let mut out = Vec::new();
        walk(self, |node| {
            if let Cause::Die(d) = node {
                out.push(d);
            }
        });
        out
    }

    /// Every distinct `FiberId` that appears in an `Interrupt` leaf.
    pub fn interruptors(&self) -> HashSet<FiberId> {
        let mut out = HashSet::new();
        walk(self, |node| {
            if let Cause::Interrupt(id) = node {
                out.insert(*id);
            }
        });
        out
    }

    /// Every execution trace attached by `Traced`, in tree order.
    pub fn traces(&self) -> Vec<&ZTrace> {
        let mut out = Vec::new();
        walk(self, |node| {
            if let Cause::Traced(_, t) = node {
                out.push(t);
            }
        });
        out
    }

    /// The first `Fail` payload in left-to-right order, if any.
    pub fn failure_option(&self) -> Option<&E> {
        let mut found = None;
        let mut stack = vec![self];
        while found.is_none() {
            let Some(node) = stack.pop() else { break };
            match node {
                Cause::Fail(e) => found = Some(e),
                Cause::Then(l, r) | Cause::Both(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
                Cause::Traced(inner, _) | Cause::Meta(inner, _) => stack.push(inner),
                Cause::Empty | Cause::Die(_) | Cause::Interrupt(_) => {}
            }
        }
        found
    }

    /// The first `Die` payload in left-to-right order, if any.
    pub fn die_option(&self) -> Option<&Arc<dyn Defect>> {
        let mut found = None;
        let mut stack = vec![self];
        while found.is_none() {
            let Some(node) = stack.pop() else { break };
            match node {
                Cause::Die(d) => found = Some(d),
                Cause::Then(l, r) | Cause::Both(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
                Cause::Traced(inner, _) | Cause::Meta(inner, _) => stack.push(inner),
                Cause::Empty | Cause::Fail(_) | Cause::Interrupt(_) => {}
            }
        }
        found
    }

    /// `true` iff a `Fail` leaf appears anywhere in the tree.
    pub fn failed(&self) -> bool {
        self.failure_option().is_some()
    }

    /// `true` iff a `Die` leaf appears anywhere in the tree.
    pub fn died(&self) -> bool {
        self.die_option().is_some()
    }

    /// `true` iff an `Interrupt` leaf appears anywhere in the tree.
    pub fn interrupted(&self) -> bool {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Cause::Interrupt(_) => return true,
                Cause::Then(l, r) | Cause::Both(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
                Cause::Traced(inner, _) | Cause::Meta(inner, _) => stack.push(inner),
                Cause::Empty | Cause::Fail(_) | Cause::Die(_) => {}
            }
        }
        false
    }

    /// `true` iff no `Fail`/`Die`/`Interrupt` leaf appears anywhere.
    /// `Empty`, `Then`, `Both`, `Traced`, and `Meta` are all transparent to
    /// this check on their own — it's purely about whether a failure atom
    /// is reachable.
    pub fn is_empty(&self) -> bool {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                Cause::Fail(_) | Cause::Die(_) | Cause::Interrupt(_) => return false,
                Cause::Then(l, r) | Cause::Both(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
                Cause::Traced(inner, _) | Cause::Meta(inner, _) => stack.push(inner),
                Cause::Empty => {}
            }
        }
        true
    }

    /// `Left(e)` for the first `Fail` payload if one exists, else
    /// `Right(self)` recast to `Cause<Never>` — sound because the `Left`
    /// case is exhaustive over every `Fail` leaf; reaching `Right` proves
    /// none was there to recast away.
    pub fn failure_or_cause(&self) -> Either<&E, Cause<Never>> {
        if let Some(e) = self.failure_option() {
            Either::Left(e)
        } else {
            Either::Right(self.recast_no_fail())
        }
    }

    /// Rebuilds `self` as a `Cause<Never>`, assuming (and in debug builds
    /// asserting) that it contains no `Fail` leaf. Only called from
    /// [`Cause::failure_or_cause`]'s `Right` arm, where that precondition
    /// has just been established by [`Cause::failure_option`] returning
    /// `None`.
    fn recast_no_fail(&self) -> Cause<Never> {
        enum Task<'a, E> {
            Eval(&'a Cause<E>),
            Then,
            Both,
            Traced(&'a ZTrace),
            Meta(crate::cause::RenderMeta),
        }

        let mut tasks = vec![Task::Eval(self)];
        let mut values: Vec<Cause<Never>> = Vec::new();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Eval(node) => match node {
                    Cause::Empty => values.push(Cause::Empty),
                    Cause::Fail(_) => unreachable!(
                        "recast_no_fail called on a cause that still contains a Fail leaf"
                    ),
                    Cause::Die(d) => values.push(Cause::Die(d.clone())),
                    Cause::Interrupt(id) => values.push(Cause::Interrupt(*id)),
                    Cause::Then(l, r) => {
                        tasks.push(Task::Then);
                        tasks.push(Task::Eval(r));
                        tasks.push(Task::Eval(l));
                    }
                    Cause::Both(l, r) => {
                        tasks.push(Task::Both);
                        tasks.push(Task::Eval(r));
                        tasks.push(Task::Eval(l));
                    }
                    Cause::Traced(inner, t) => {
                        tasks.push(Task::Traced(t));
                        tasks.push(Task::Eval(inner));
                    }
                    Cause::Meta(inner, m) => {
                        tasks.push(Task::Meta(*m));
                        tasks.push(Task::Eval(inner));
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
                    let inner = values.pop().expect("inner evaluated before Traced");
                    values.push(inner.traced(t.clone()));
                }
                Task::Meta(m) => {
                    let inner = values.pop().expect("inner evaluated before Meta");
                    values.push(Cause::Meta(Arc::new(inner), m));
                }
            }
        }
        values.pop().expect("traversal always yields exactly one value")
    }

    /// `Some` of a `Cause` containing only `Die` leaves, or `None` if no
    /// `Die` leaf is reachable. `Fail` and `Interrupt` leaves are removed
    /// entirely; an `Empty` node contributes nothing (it carries no `Die`
    /// to preserve); `Then`/`Both` collapse to whichever side survived when
    /// the other vanished; `Traced`/`Meta` are preserved only on a
    /// surviving subtree.
    pub fn strip_failures(&self) -> Option<Cause<Never>> {
        enum Task<'a, E> {
            Eval(&'a Cause<E>),
            Then,
            Both,
            Traced(&'a ZTrace),
            Meta(crate::cause::RenderMeta),
        }

        let mut tasks = vec![Task::Eval(self)];
        let mut values: Vec<Option<Cause<Never>>> = Vec::new();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Eval(node) => match node {
                    Cause::Empty | Cause::Fail(_) | Cause::Interrupt(_) => values.push(None),
                    Cause::Die(d) => values.push(Some(Cause::Die(d.clone()))),
                    Cause::Then(l, r) => {
                        tasks.push(Task::Then);
                        tasks.push(Task::Eval(r));
                        tasks.push(Task::Eval(l));
                    }
                    Cause::Both(l, r) => {
                        tasks.push(Task::Both);
                        tasks.push(Task::Eval(r));
                        tasks.push(Task::Eval(l));
                    }
                    Cause::Traced(inner, t) => {
                        tasks.push(Task::Traced(t));
                        tasks.push(Task::Eval(inner));
                    }
                    Cause::Meta(inner, m) => {
                        tasks.push(Task::Meta(*m));
                        tasks.push(Task::Eval(inner));
                    }
                },
                Task::Then => {
                    let r = values.pop().expect("rhs evaluated before Then");
                    let l = values.pop().expect("lhs evaluated before Then");
                    values.push(collapse_then(l, r));
                }
                Task::Both => {
                    let r = values.pop().expect("rhs evaluated before Both");
                    let l = values.pop().expect("lhs evaluated before Both");
                    values.push(collapse_both(l, r));
                }
                Task::Traced(t) => {
                    let inner = values.pop().expect("inner evaluated before Traced");
                    values.push(inner.map(|c| c.traced(t.clone())));
                }
                Task::Meta(m) => {
                    let inner = values.pop().expect("inner evaluated before Meta");
                    values.push(inner.map(|c| Cause::Meta(Arc::new(c), m)));
                }
            }
        }
        values.pop().expect("traversal always yields exactly one value")
    }

}

/// `Then`/`Both` collapse used by both [`Cause::strip_failures`] and
/// [`Cause::sequence_cause_option`]: if a side vanished (`None`), the
/// composite is whatever the other side produced; if both vanished, the
/// composite vanishes too.
fn collapse_then(l: Option<Cause<Never>>, r: Option<Cause<Never>>) -> Option<Cause<Never>> {
    match (l, r) {
        (None, None) => None,
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (Some(l), Some(r)) => Some(l.then(r)),
    }
}

fn collapse_both(l: Option<Cause<Never>>, r: Option<Cause<Never>>) -> Option<Cause<Never>> {
    match (l, r) {
        (None, None) => None,
        (Some(l), None) => Some(l),
        (None, Some(r)) => Some(r),
        (Some(l), Some(r)) => Some(l.both(r)),
    }
}

impl<E> Cause<Option<E>> {
    /// `Cause<Option<E>> -> Option<Cause<E>>`. See the type-erased stub on
    /// `impl<E> Cause<E>` above for why this lives on its own `impl` block:
    /// the collapse rule needs to build `Cause<E>` values (not `Cause<Never>`)
    /// for the surviving `Fail(Some(e))` leaves, which only typechecks when
    /// the payload really is `Option<E>`.
    pub fn sequence_cause_option(&self) -> Option<Cause<E>>
    where
        E: Clone,
    {
        enum Task<'a, E> {
            Eval(&'a Cause<Option<E>>),
            Then,
            Both,
            Traced(&'a ZTrace),
            Meta(crate::cause::RenderMeta),
        }
        fn collapse_then_e<E>(l: Option<Cause<E>>, r: Option<Cause<E>>) -> Option<Cause<E>> {
            match (l, r) {
                (None, None) => None,
                (Some(l), None) => Some(l),
                (None, Some(r)) => Some(r),
                (Some(l), Some(r)) => Some(l.then(r)),
            }
        }
        fn collapse_both_e<E>(l: Option<Cause<E>>, r: Option<Cause<E>>) -> Option<Cause<E>> {
            match (l, r) {
                (None, None) => None,
                (Some(l), None) => Some(l),
                (None, Some(r)) => Some(r),
                (Some(l), Some(r)) => Some(l.both(r)),
            }
        }

        let mut tasks = vec![Task::Eval(self)];
        let mut values: Vec<Option<Cause<E>>> = Vec::new();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Eval(node) => match node {
                    Cause::Empty => values.push(Some(Cause::Empty)),
                    Cause::Fail(None) => values.push(None),
                    Cause::Fail(Some(e)) => values.push(Some(Cause::Fail(e.clone()))),
                    Cause::Die(d) => values.push(Some(Cause::Die(d.clone()))),
                    Cause::Interrupt(id) => values.push(Some(Cause::Interrupt(*id))),
                    Cause::Then(l, r) => {
                        tasks.push(Task::Then);
                        tasks.push(Task::Eval(r));
                        tasks.push(Task::Eval(l));
                    }
                    Cause::Both(l, r) => {
                        tasks.push(Task::Both);
                        tasks.push(Task::Eval(r));
                        tasks.push(Task::Eval(l));
                    }
                    Cause::Traced(inner, t) => {
                        tasks.push(Task::Traced(t));
                        tasks.push(Task::Eval(inner));
                    }
                    Cause::Meta(inner, m) => {
                        tasks.push(Task::Meta(*m));
                        tasks.push(Task::Eval(inner));
                    }
                },
                Task::Then => {
                    let r = values.pop().expect("rhs evaluated before Then");
                    let l = values.pop().expect("lhs evaluated before Then");
                    values.push(collapse_then_e(l, r));
                }
                Task::Both => {
                    let r = values.pop().expect("rhs evaluated before Both");
                    let l = values.pop().expect("lhs evaluated before Both");
                    values.push(collapse_both_e(l, r));
                }
                Task::Traced(t) => {
                    let inner = values.pop().expect("inner evaluated before Traced");
                    values.push(inner.map(|c| c.traced(t.clone())));
                }
                Task::Meta(m) => {
                    let inner = values.pop().expect("inner evaluated before Meta");
                    values.push(inner.map(|c| Cause::Meta(Arc::new(c), m)));
                }
            }
        }
        values.pop().expect("traversal always yields exactly one value")
    }
}

impl<E> Cause<E> {
    /// `true` iff `self` or some subtree of `self` is logically equal
    /// (§4.4's `==`, not mere syntactic identity) to `other`.
    pub fn contains(&self, other: &Cause<E>) -> bool
    where
        E: PartialEq,
    {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node == other {
                return true;
            }
            match node {
                Cause::Then(l, r) | Cause::Both(l, r) => {
                    stack.push(r);
                    stack.push(l);
                }
                Cause::Traced(inner, _) | Cause::Meta(inner, _) => stack.push(inner),
                Cause::Empty | Cause::Fail(_) | Cause::Die(_) | Cause::Interrupt(_) => {}
            }
        }
        false
    }

    /// Collapses the whole tree to a single defect-like value, in priority
    /// order: the first `Fail` (mapped through `f`), else — if the cause
    /// was interrupted — a synthetic "interrupted" defect, else the first
    /// `Die`, else (the cause was `Empty`) that same synthetic defect. This
    /// order is load-bearing: interruption outranks a defect that merely
    /// happened to also be present, and the fallback keeps `squash` total
    /// even over a `Cause` with no failure atom at all.
    pub fn squash_with(&self, f: impl FnOnce(&E) -> Arc<dyn Defect>) -> Arc<dyn Defect> {
        if let Some(e) = self.failure_option() {
            f(e)
        } else if self.interrupted() {
            synthetic_interrupted_defect()
        } else if let Some(d) = self.die_option() {
            d.clone()
        } else {
            synthetic_interrupted_defect()
        }
    }

    /// [`Cause::squash_with`] using [`crate::defect::AnyhowDefect::msg`] to
    /// convert a surviving `Fail` payload, for `E` that are themselves
    /// displayable — the common case where `E` is a user error type with
    /// no existing `Defect` of its own.
    pub fn squash(&self) -> Arc<dyn Defect>
    where
        E: std::fmt::Display + std::fmt::Debug,
    {
        self.squash_with(|e| crate::defect::AnyhowDefect::msg(format!("{e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cause::die;
    use crate::cause::empty;
    use crate::cause::fail;
    use crate::cause::interrupt;
    use crate::defect::AnyhowDefect;

    #[test]
    fn failures_and_failure_option_walk_left_to_right_over_a_then_chain() {
        let c = fail("a").then(fail("b")).then(fail("c"));
        assert_eq!(c.failures(), vec![&"a", &"b", &"c"]);
        assert_eq!(c.failure_option(), Some(&"a"));
        assert!(!c.is_empty());
        assert_eq!(c, fail("a").then(fail("b").then(fail("c"))));
    }

    #[test]
    fn is_empty_on_empty_and_leaves() {
        let e: Cause<&str> = empty();
        assert!(e.is_empty());
        assert!(!fail("x").is_empty());
        assert!(!die::<&str>(AnyhowDefect::msg("boom")).is_empty());
        assert!(!interrupt::<&str>(FiberId::new(0, 1)).is_empty());
    }

    #[test]
    fn defects_and_interruptors() {
        let c = die::<&str>(AnyhowDefect::msg("a"))
            .both(die(AnyhowDefect::msg("b")))
            .then(interrupt(FiberId::new(0, 1)))
            .then(interrupt(FiberId::new(5, 2)));
        assert_eq!(c.defects().len(), 2);
        let ids = c.interruptors();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&FiberId::new(0, 1)));
        assert!(ids.contains(&FiberId::new(5, 2)));
    }

    #[test]
    fn strip_failures_keeps_only_dies() {
        let c = fail("a")
            .then(die::<&str>(AnyhowDefect::msg("boom")))
            .both(interrupt(FiberId::new(0, 1)));
        let stripped = c.strip_failures().expect("a Die leaf survives");
        assert!(stripped.died());
        assert!(!stripped.failed());
        assert!(!stripped.interrupted());

        let all_fail: Cause<&str> = fail("a").then(fail("b"));
        assert!(all_fail.strip_failures().is_none());
    }

    #[test]
    fn sequence_cause_option_drops_none_and_keeps_some() {
        let c: Cause<Option<&str>> = Cause::Fail(Some("a"))
            .then(Cause::Fail(None))
            .then(Cause::Fail(Some("b")));
        let sequenced = c.sequence_cause_option().expect("some Fail survives");
        assert_eq!(sequenced.failures(), vec![&"a", &"b"]);

        let all_none: Cause<Option<&str>> = Cause::Fail(None).then(Cause::Fail(None));
        assert!(all_none.sequence_cause_option().is_none());
    }

    #[test]
    fn contains_finds_logically_equal_subtrees() {
        let needle = fail("a").both(fail("b"));
        let haystack = fail("z").then(fail("b").both(fail("a")));
        assert!(haystack.contains(&needle));
        assert!(!haystack.contains(&fail("nope")));
    }

    #[test]
    fn failure_or_cause_splits_on_whether_a_fail_remains() {
        let with_fail = fail("a").both(die::<&str>(AnyhowDefect::msg("boom")));
        assert!(with_fail.failure_or_cause().is_left());

        let no_fail: Cause<&str> = die(AnyhowDefect::msg("boom")).both(interrupt(FiberId::new(0, 1)));
        match no_fail.failure_or_cause() {
            Either::Right(c) => {
                assert!(c.died());
                assert!(c.interrupted());
            }
            Either::Left(_) => panic!("expected Right: no Fail leaf present"),
        }
    }

    // Squash priority: fail > interrupted > defect > synthetic interrupted.
    #[test]
    fn squash_priority_fail_beats_everything() {
        let c = fail("a")
            .both(die::<&str>(AnyhowDefect::msg("boom")))
            .both(interrupt(FiberId::new(0, 1)));
        let d = c.squash();
        assert_eq!(d.to_string(), "a");
    }

    #[test]
    fn squash_priority_interrupted_beats_defect() {
        let c: Cause<&str> =
            die(AnyhowDefect::msg("boom")).both(interrupt(FiberId::new(0, 1)));
        let d = c.squash();
        assert_eq!(d.to_string(), "Interrupted");
    }

    #[test]
    fn squash_priority_defect_is_last_resort() {
        let c: Cause<&str> = die(AnyhowDefect::msg("boom"));
        let d = c.squash();
        assert_eq!(d.to_string(), "boom");
    }

    #[test]
    fn squash_on_empty_is_total() {
        let c: Cause<&str> = empty();
        let d = c.squash();
        assert_eq!(d.to_string(), "Interrupted");
    }

    // Matches the 100,000-deep regression tests in cause.rs/canonical.rs/
    // fold.rs/pretty.rs: every traversal in this module must also terminate
    // within bounded stack on a right-nested Then chain that deep.
    #[test]
    fn projections_terminate_on_a_100_000_deep_then_chain() {
        let mut c: Cause<i32> = fail(0);
        for i in 1..100_000 {
            c = c.then(fail(i));
        }

        assert!(!c.is_empty());
        assert_eq!(c.failure_option(), Some(&0));
        assert!(c.die_option().is_none());
        assert!(c.contains(&fail(99_999)));
        assert!(!c.contains(&fail(-1)));

        let with_a_die = c.clone().then(die(AnyhowDefect::msg("boom")));
        let stripped = with_a_die
            .strip_failures()
            .expect("the trailing Die leaf survives stripping");
        assert!(stripped.died());
        assert!(!stripped.failed());

        let wrapped: Cause<Option<i32>> = c.map(Some);
        let sequenced = wrapped
            .sequence_cause_option()
            .expect("every Fail is Some, so the whole chain survives");
        assert_eq!(sequenced.failures().len(), 100_000);

        assert_eq!(c.squash().to_string(), "0");
    }
}
