/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! The canonical form `Cause::eq`/`Cause::hash` are built on.
//!
//! A [`Canon`] is a `Cause` tree rewritten to a fixpoint under the algebra's
//! laws: `Traced`/`Meta` stripped, `Empty` pruned as an identity on both
//! sides, `Then` chains flattened by associativity into a `Seq`, `Both`
//! groups flattened by associativity and reordered-insensitively by
//! commutativity into a `Par`, and — the part that makes this more than a
//! restatement of the tree — `Then` distributed through any `Both` operand
//! on either side, recursively, so that e.g. `a.then(b.both(c))` and
//! `a.then(b).both(a.then(c))` rewrite to the identical `Canon` value.
//!
//! Two causes are equal iff their `Canon`s are equal, and `Canon`'s own
//! `Hash` impl is built to agree with that equality (a `Par`'s hash combines
//! its members order-independently). This is strategy (b) from the
//! algebra's design notes: canonicalize once per comparison rather than
//! re-deriving every law as its own case. See `DESIGN.md` for why a `Par` is
//! a deduplicated set rather than a multiset, and for the one place this
//! representation goes further than the stated rewrite (distributing `Then`
//! over a `Both` that sits on either side of it, not only the side the base
//! algorithm spells out) to make it agree with distributivity in both
//! directions.

use std::collections::hash_map::DefaultHasher;
use std::hash::Hash;
use std::hash::Hasher;
use std::sync::Arc;

use crate::cause::Cause;
use crate::defect::defect_eq;
use crate::defect::defect_hash;
use crate::defect::Defect;
use crate::fiber_id::FiberId;

/// A `Cause` subtree rewritten into the algebra's canonical shape. Borrows
/// leaf payloads from the `Cause` it was built from rather than cloning
/// them, so computing it to compare or hash a `Cause` costs no more than the
/// tree's own allocations.
pub(crate) enum Canon<'a, E> {
    /// A `Then`-chain, flattened by associativity. Order matters.
    Seq(Vec<Canon<'a, E>>),
    /// A `Both`-group, flattened by associativity and deduplicated as a set
    /// (commutativity). Order does not matter, enforced by the `PartialEq`
    /// and `Hash` impls below rather than by sorting members.
    Par(Vec<Canon<'a, E>>),
    Fail(&'a E),
    Die(&'a Arc<dyn Defect>),
    Interrupt(FiberId),
}

impl<'a, E> Clone for Canon<'a, E> {
    fn clone(&self) -> Self {
        match self {
            Canon::Seq(items) => Canon::Seq(items.clone()),
            Canon::Par(items) => Canon::Par(items.clone()),
            Canon::Fail(e) => Canon::Fail(e),
            Canon::Die(d) => Canon::Die(d),
            Canon::Interrupt(id) => Canon::Interrupt(*id),
        }
    }
}

impl<'a, E: PartialEq> PartialEq for Canon<'a, E> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Canon::Seq(a), Canon::Seq(b)) => a == b,
            (Canon::Par(a), Canon::Par(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x == y))
            }
            (Canon::Fail(a), Canon::Fail(b)) => a == b,
            (Canon::Die(a), Canon::Die(b)) => defect_eq(a, b),
            (Canon::Interrupt(a), Canon::Interrupt(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a, E: Eq> Eq for Canon<'a, E> {}

impl<'a, E: Hash> Hash for Canon<'a, E> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Canon::Seq(items) => {
                state.write_u8(0);
                items.len().hash(state);
                for item in items {
                    item.hash(state);
                }
            }
            Canon::Par(items) => {
                state.write_u8(1);
                items.len().hash(state);
                // Order-independent combine: hash each member on its own
                // hasher, then XOR the results together so permuting
                // `items` leaves the combined value unchanged.
                let combined = items.iter().fold(0u64, |acc, item| {
                    let mut h = DefaultHasher::new();
                    item.hash(&mut h);
                    acc ^ h.finish()
                });
                combined.hash(state);
            }
            Canon::Fail(e) => {
                state.write_u8(2);
                e.hash(state);
            }
            Canon::Die(d) => {
                state.write_u8(3);
                defect_hash(d, state);
            }
            Canon::Interrupt(id) => {
                state.write_u8(4);
                id.hash(state);
            }
        }
    }
}

fn is_empty_canon<E>(c: &Canon<'_, E>) -> bool {
    matches!(c, Canon::Seq(items) if items.is_empty())
}

/// Unwraps one level of `Seq`, or wraps a non-`Seq` value as its sole item.
/// Never called on a value that is itself `Empty` (callers filter that out
/// first), so this never needs to special-case the zero-item case.
fn seq_items<E>(c: Canon<'_, E>) -> Vec<Canon<'_, E>> {
    match c {
        Canon::Seq(items) => items,
        other => vec![other],
    }
}

/// Builds a `Par`, flattening any nested `Par` among `items` (associativity)
/// and deduplicating by `Canon` equality (commutativity realized as set
/// union, per the base algorithm; see `DESIGN.md`).
fn make_par<'a, E: PartialEq>(items: impl IntoIterator<Item = Canon<'a, E>>) -> Canon<'a, E> {
    let mut flat: Vec<Canon<'a, E>> = Vec::new();
    let mut push_dedup = |flat: &mut Vec<Canon<'a, E>>, item: Canon<'a, E>| {
        if !flat.iter().any(|existing| existing == &item) {
            flat.push(item);
        }
    };
    for item in items {
        match item {
            Canon::Par(members) => {
                for m in members {
                    push_dedup(&mut flat, m);
                }
            }
            other => push_dedup(&mut flat, other),
        }
    }
    Canon::Par(flat)
}

/// Sequential composition of two already-canonical subforms. Handles the
/// `Empty` identity eagerly and distributes over a `Par` operand on either
/// side (both directions of §4.4's distributivity laws), recursing until
/// neither side is a `Par`, at which point the two sequences simply
/// concatenate (`Then` associativity).
fn canon_then<'a, E: PartialEq>(l: Canon<'a, E>, r: Canon<'a, E>) -> Canon<'a, E> {
    if is_empty_canon(&l) {
        return r;
    }
    if is_empty_canon(&r) {
        return l;
    }
    match (l, r) {
        (Canon::Par(members), r) => {
            make_par(members.into_iter().map(|m| canon_then(m, r.clone())))
        }
        (l, Canon::Par(members)) => {
            make_par(members.into_iter().map(|m| canon_then(l.clone(), m)))
        }
        (l, r) => {
            let mut items = seq_items(l);
            items.extend(seq_items(r));
            Canon::Seq(items)
        }
    }
}

/// Parallel composition of two already-canonical subforms. Handles the
/// `Empty` identity eagerly; otherwise flattens and deduplicates via
/// [`make_par`] (`Both` associativity + commutativity).
fn canon_both<'a, E: PartialEq>(l: Canon<'a, E>, r: Canon<'a, E>) -> Canon<'a, E> {
    if is_empty_canon(&l) {
        return r;
    }
    if is_empty_canon(&r) {
        return l;
    }
    make_par([l, r])
}

/// Rewrites a `Cause` to its canonical form. Iterative (explicit work
/// stack) so it stays stack-bounded on the same deep `Then` chains every
/// other traversal in this crate is stack-bounded on.
pub(crate) fn canonical_form<E>(c: &Cause<E>) -> Canon<'_, E>
where
    E: PartialEq,
{
    enum Task<'a, E> {
        Eval(&'a Cause<E>),
        Then,
        Both,
    }

    let mut tasks = vec![Task::Eval(c)];
    let mut values: Vec<Canon<'_, E>> = Vec::new();
    while let Some(task) = tasks.pop() {
        match task {
            Task::Eval(node) => match node {
                Cause::Empty => values.push(Canon::Seq(Vec::new())),
                Cause::Fail(e) => values.push(Canon::Fail(e)),
                Cause::Die(d) => values.push(Canon::Die(d)),
                Cause::Interrupt(id) => values.push(Canon::Interrupt(*id)),
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
                Cause::Traced(inner, _) => tasks.push(Task::Eval(inner)),
                Cause::Meta(inner, _) => tasks.push(Task::Eval(inner)),
            },
            Task::Then => {
                let r = values.pop().expect("rhs evaluated before Then");
                let l = values.pop().expect("lhs evaluated before Then");
                values.push(canon_then(l, r));
            }
            Task::Both => {
                let r = values.pop().expect("rhs evaluated before Both");
                let l = values.pop().expect("lhs evaluated before Both");
                values.push(canon_both(l, r));
            }
        }
    }
    values.pop().expect("traversal always yields exactly one value")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cause::die;
    use crate::cause::empty;
    use crate::cause::fail;
    use crate::cause::interrupt;
    use crate::defect::AnyhowDefect;

    fn c_eq<E: PartialEq>(a: &Cause<E>, b: &Cause<E>) -> bool {
        canonical_form(a) == canonical_form(b)
    }

    #[test]
    fn empty_identity_both_sides() {
        assert!(c_eq(&(empty().then(fail("x"))), &fail("x")));
        assert!(c_eq(&(fail("x").then(empty())), &fail("x")));
        assert!(c_eq(&(empty().both(fail("x"))), &fail("x")));
        assert!(c_eq(&(fail("x").both(empty())), &fail("x")));
    }

    #[test]
    fn then_associativity() {
        let a = fail("a").then(fail("b")).then(fail("c"));
        let b = fail("a").then(fail("b").then(fail("c")));
        assert!(c_eq(&a, &b));
    }

    #[test]
    fn both_associativity_and_commutativity() {
        let a = fail("a").both(fail("b")).both(fail("c"));
        let b = fail("a").both(fail("b").both(fail("c")));
        let c = fail("c").both(fail("a")).both(fail("b"));
        assert!(c_eq(&a, &b));
        assert!(c_eq(&a, &c));
    }

    #[test]
    fn left_distributivity() {
        let lhs = fail("a").then(fail("b").both(fail("c")));
        let rhs = fail("a").then(fail("b")).both(fail("a").then(fail("c")));
        assert!(c_eq(&lhs, &rhs));
    }

    #[test]
    fn right_distributivity() {
        let lhs = fail("a").both(fail("b")).then(fail("c"));
        let rhs = fail("a").then(fail("c")).both(fail("b").then(fail("c")));
        assert!(c_eq(&lhs, &rhs));
    }

    #[test]
    fn traced_and_meta_are_transparent() {
        let c: Cause<&str> = fail("x");
        let traced = c.clone().traced(crate::defect::ZTrace::new("at a"));
        let meta = c.clone().stackless();
        assert!(c_eq(&traced, &c));
        assert!(c_eq(&meta, &c));
    }

    #[test]
    fn distinct_causes_are_not_equal() {
        assert!(!c_eq(&fail("a"), &fail("b")));
        assert!(!c_eq(&fail("a").both(fail("b")), &fail("a").then(fail("b"))));
        let id1 = FiberId::new(0, 1);
        let id2 = FiberId::new(0, 2);
        assert!(!c_eq::<()>(&interrupt(id1), &interrupt(id2)));
    }

    #[test]
    fn die_uses_defect_value_equality() {
        let a: Cause<()> = die(AnyhowDefect::msg("boom"));
        let b: Cause<()> = die(AnyhowDefect::msg("boom"));
        let c: Cause<()> = die(AnyhowDefect::msg("other"));
        assert!(c_eq(&a, &b));
        assert!(!c_eq(&a, &c));
    }

    #[test]
    fn deep_then_chain_canonicalizes_without_overflow() {
        let mut c: Cause<i32> = fail(0);
        for i in 1..100_000 {
            c = c.then(fail(i));
        }
        match canonical_form(&c) {
            Canon::Seq(items) => assert_eq!(items.len(), 100_000),
            _ => panic!("expected a flat Seq"),
        }
    }
}
