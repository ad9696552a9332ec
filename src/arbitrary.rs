/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! `quickcheck::Arbitrary` impls, gated behind the `quickcheck` feature.
//! Grounded on `sorted_vector_map::map::SortedVectorMap`'s `Arbitrary` impl
//! (generate the natural representation, delegate field generation to the
//! inner types), with one addition `SortedVectorMap` never needed: `Cause`
//! is a recursive type, so generation has to be depth-bounded or it
//! diverges. Shrinking is left at quickcheck's default (the empty
//! shrinker) — a faithful shrinker would need to retry every subtree
//! individually and isn't worth the complexity for a type whose equality
//! is already quotiented by an equational theory.

use quickcheck::Arbitrary;
use quickcheck::Gen;

use crate::cause::die;
use crate::cause::empty;
use crate::cause::fail;
use crate::cause::interrupt;
use crate::cause::Cause;
use crate::defect::AnyhowDefect;
use crate::fiber_id::FiberId;

/// Caps how deep a generated `Cause` tree can nest `Then`/`Both`. Kept
/// small: property tests care about the algebra's laws holding, not about
/// exercising pathologically large trees (those are covered separately by
/// the fixed 100,000-deep regression tests in `cause.rs`/`canonical.rs`).
const MAX_DEPTH: usize = 4;

impl Arbitrary for FiberId {
    fn arbitrary(g: &mut Gen) -> Self {
        FiberId::new(i64::arbitrary(g), i64::arbitrary(g))
    }
}

impl<E: Arbitrary> Arbitrary for Cause<E> {
    fn arbitrary(g: &mut Gen) -> Self {
        arbitrary_bounded(g, MAX_DEPTH)
    }
}

fn arbitrary_leaf<E: Arbitrary>(g: &mut Gen) -> Cause<E> {
    match u8::arbitrary(g) % 4 {
        0 => empty(),
        1 => fail(E::arbitrary(g)),
        2 => die(AnyhowDefect::msg(String::arbitrary(g))),
        _ => interrupt(FiberId::arbitrary(g)),
    }
}

fn arbitrary_bounded<E: Arbitrary>(g: &mut Gen, depth: usize) -> Cause<E> {
    if depth == 0 {
        return arbitrary_leaf(g);
    }
    match u8::arbitrary(g) % 6 {
        0..=3 => arbitrary_leaf(g),
        4 => arbitrary_bounded(g, depth - 1).then(arbitrary_bounded(g, depth - 1)),
        _ => arbitrary_bounded(g, depth - 1).both(arbitrary_bounded(g, depth - 1)),
    }
}
