/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! `Cause`'s `PartialEq`/`Eq`/`Hash`, delegating to the canonical form in
//! `canonical.rs`. See that module's doc comment for the algorithm; this
//! module is just the public-facing glue, kept separate so the thing most
//! readers reach for (`a == b`) isn't buried under the rewrite machinery
//! that makes it correct.

use std::hash::Hash;
use std::hash::Hasher;

use crate::canonical::canonical_form;
use crate::cause::Cause;

impl<E: PartialEq> PartialEq for Cause<E> {
    /// Structural equality quotiented by associativity of `then`/`both`,
    /// commutativity of `both`, both directions of distributivity, the
    /// `Empty` identity, and transparency of `Traced`/`Meta`. Two causes
    /// that look nothing alike syntactically can still be `==` — see
    /// `canonical.rs`.
    fn eq(&self, other: &Self) -> bool {
        canonical_form(self) == canonical_form(other)
    }
}

impl<E: Eq> Eq for Cause<E> {}

impl<E: Hash> Hash for Cause<E> {
    /// Agrees with [`PartialEq::eq`] by construction: both are computed
    /// from the same canonical form.
    fn hash<H: Hasher>(&self, state: &mut H) {
        canonical_form(self).hash(state)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;

    use super::*;
    use crate::cause::die;
    use crate::cause::empty;
    use crate::cause::fail;
    use crate::cause::interrupt;
    use crate::defect::AnyhowDefect;
    use crate::fiber_id::FiberId;

    fn hash_of<E: Hash>(c: &Cause<E>) -> u64 {
        let mut h = DefaultHasher::new();
        c.hash(&mut h);
        h.finish()
    }

    #[test]
    fn empty_is_the_sequential_identity() {
        assert_eq!(fail("x").then(empty()), fail("x"));
    }

    #[test]
    fn both_is_commutative() {
        let a = fail("a").both(fail("b"));
        let b = fail("b").both(fail("a"));
        assert_eq!(a, b);
    }

    #[test]
    fn left_distributivity_has_equal_hashes() {
        let lhs = fail("a").then(fail("b").both(fail("c")));
        let rhs = fail("a")
            .then(fail("b"))
            .both(fail("a").then(fail("c")));
        assert_eq!(lhs, rhs);
        assert_eq!(hash_of(&lhs), hash_of(&rhs));
    }

    #[test]
    fn then_associativity_holds_under_equality() {
        let c = fail("a").then(fail("b")).then(fail("c"));
        let rearranged = fail("a").then(fail("b").then(fail("c")));
        assert_eq!(c, rearranged);
    }

    #[test]
    fn hash_agreement_law() {
        let pairs: Vec<(Cause<&str>, Cause<&str>)> = vec![
            (fail("a").both(fail("b")), fail("b").both(fail("a"))),
            (
                fail("a").then(fail("b")).then(fail("c")),
                fail("a").then(fail("b").then(fail("c"))),
            ),
            (empty().then(fail("z")), fail("z")),
        ];
        for (a, b) in pairs {
            assert_eq!(a, b);
            assert_eq!(hash_of(&a), hash_of(&b));
        }
    }

    #[test]
    fn unequal_causes_need_not_share_a_hash_but_usually_dont() {
        let a: Cause<&str> = fail("a");
        let b: Cause<&str> = fail("b");
        assert_ne!(a, b);
        assert_ne!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn defects_and_interrupts_participate_in_equality() {
        let a: Cause<()> = die(AnyhowDefect::msg("boom"));
        let b: Cause<()> = die(AnyhowDefect::msg("boom"));
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));

        let i1: Cause<()> = interrupt(FiberId::new(0, 1));
        let i2: Cause<()> = interrupt(FiberId::new(0, 1));
        assert_eq!(i1, i2);
    }
}
