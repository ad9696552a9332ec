/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Property tests for the `Cause` algebra's laws, in the style of
//! `sorted_vector_map::map::tests` (a `quickcheck!{ ... }` block driven by
//! a hand-written, depth-bounded `Arbitrary` impl). Gated behind the
//! `quickcheck` feature via this crate's `[[test]]` entry.

use cause::die;
use cause::empty;
use cause::fail;
use cause::interrupt;
use cause::AnyhowDefect;
use cause::Cause;
use cause::FiberId;
use cause::ZTrace;
use quickcheck::quickcheck;

quickcheck! {
    fn empty_is_the_sequential_identity(c: Cause<u8>) -> bool {
        empty().then(c.clone()) == c && c.clone().then(empty()) == c
    }

    fn empty_is_the_parallel_identity(c: Cause<u8>) -> bool {
        empty().both(c.clone()) == c && c.clone().both(empty()) == c
    }

    fn then_is_associative(a: Cause<u8>, b: Cause<u8>, c: Cause<u8>) -> bool {
        a.clone().then(b.clone()).then(c.clone()) == a.then(b.then(c))
    }

    fn both_is_associative(a: Cause<u8>, b: Cause<u8>, c: Cause<u8>) -> bool {
        a.clone().both(b.clone()).both(c.clone()) == a.both(b.both(c))
    }

    fn both_is_commutative(a: Cause<u8>, b: Cause<u8>) -> bool {
        a.clone().both(b.clone()) == b.both(a)
    }

    fn then_distributes_over_both_on_the_left(a: Cause<u8>, b: Cause<u8>, c: Cause<u8>) -> bool {
        let lhs = a.clone().then(b.clone().both(c.clone()));
        let rhs = a.clone().then(b).both(a.then(c));
        lhs == rhs
    }

    fn then_distributes_over_both_on_the_right(a: Cause<u8>, b: Cause<u8>, c: Cause<u8>) -> bool {
        let lhs = a.clone().both(b.clone()).then(c.clone());
        let rhs = a.then(c.clone()).both(b.then(c));
        lhs == rhs
    }

    fn traced_is_transparent(c: Cause<u8>) -> bool {
        c.clone().traced(ZTrace::new("at somewhere")) == c
    }

    fn stackless_and_stack_are_transparent(c: Cause<u8>) -> bool {
        c.clone().stackless() == c && c.clone().stack() == c
    }

    fn equal_causes_hash_equal(a: Cause<u8>, b: Cause<u8>) -> bool {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::Hash;
        use std::hash::Hasher;

        fn hash_of(c: &Cause<u8>) -> u64 {
            let mut h = DefaultHasher::new();
            c.hash(&mut h);
            h.finish()
        }

        // Construct a pair that is guaranteed equal by commutativity, rather
        // than relying on two independently generated trees colliding.
        let lhs = a.clone().both(b.clone());
        let rhs = b.both(a);
        lhs == rhs && hash_of(&lhs) == hash_of(&rhs)
    }

    fn map_identity_is_identity(c: Cause<u8>) -> bool {
        c.clone().map(|e| e) == c
    }

    fn map_composes(c: Cause<u8>) -> bool {
        let f = |e: u8| e.wrapping_add(1);
        let g = |e: u8| e.wrapping_mul(2);
        c.clone().map(f).map(g) == c.map(|e| g(f(e)))
    }

    fn flat_map_left_identity(e: u8) -> bool {
        let f = |e: u8| fail(e.wrapping_add(1)).both(interrupt(FiberId::new(0, e as i64)));
        fail(e).flat_map(f) == f(e)
    }

    fn flat_map_right_identity(c: Cause<u8>) -> bool {
        c.clone().flat_map(fail) == c
    }

    fn flat_map_is_associative(c: Cause<u8>) -> bool {
        let f = |e: u8| fail(e.wrapping_add(1));
        let g = |e: u8| fail(e.wrapping_mul(3));
        let lhs = c.clone().flat_map(f).flat_map(g);
        let rhs = c.flat_map(move |e| f(e).flat_map(g));
        lhs == rhs
    }

    fn failures_round_trips_on_a_single_fail(e: u8) -> bool {
        fail(e).failures() == vec![&e]
    }

    fn interruptors_round_trips_on_a_single_interrupt(seq: i64) -> bool {
        let id = FiberId::new(0, seq);
        let c: Cause<u8> = interrupt(id);
        c.interruptors() == std::collections::HashSet::from([id])
    }

    fn fail_leaf_is_never_empty(e: u8) -> bool {
        !fail(e).is_empty()
    }

    fn interrupt_leaf_is_never_empty(seq: i64) -> bool {
        let c: Cause<u8> = interrupt(FiberId::new(0, seq));
        !c.is_empty()
    }

    fn die_leaf_is_never_empty(msg: String) -> bool {
        let c: Cause<u8> = die(AnyhowDefect::msg(msg));
        !c.is_empty()
    }

    fn sequence_cause_option_inverts_map_some(c: Cause<u8>) -> bool {
        let wrapped = c.clone().map(Some);
        wrapped.sequence_cause_option() == Some(c)
    }

    fn strip_failures_survives_iff_something_died(c: Cause<u8>) -> bool {
        c.died() == c.strip_failures().is_some()
    }
}

#[test]
fn defects_round_trips_on_a_single_die() {
    let c: Cause<u8> = die(AnyhowDefect::msg("boom"));
    let got = c.defects();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].to_string(), "boom");
}
