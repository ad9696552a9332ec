/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! [`Cause::fold`], the crate's one general-purpose eliminator. Every
//! projection in `projections.rs` could in principle be written in terms of
//! it; most aren't, because an explicit iterative traversal tuned to the
//! one thing it collects is both clearer and faster than building up and
//! tearing down `Z` values for cases the projection doesn't care about. This
//! module exists so `fold` itself is available to callers who want a
//! one-shot, total eliminator without reaching for five separate
//! projections.

use std::sync::Arc;

use crate::cause::Cause;
use crate::defect::Defect;
use crate::defect::ZTrace;
use crate::fiber_id::FiberId;

impl<E> Cause<E> {
    /// The general eliminator: four leaf cases, three combiner cases.
    /// `Meta` is transparent — it contributes no case of its own, the fold
    /// simply continues into the cause it wraps.
    ///
    /// Iterative (explicit work stack), so folding terminates within
    /// bounded stack depth regardless of how deeply nested the `Then`/`Both`
    /// structure is.
    #[allow(clippy::too_many_arguments)]
    pub fn fold<Z, FEmpty, FFail, FDie, FInterrupt, FThen, FBoth, FTraced>(
        &self,
        mut empty_case: FEmpty,
        mut fail_case: FFail,
        mut die_case: FDie,
        mut interrupt_case: FInterrupt,
        mut then_case: FThen,
        mut both_case: FBoth,
        mut traced_case: FTraced,
    ) -> Z
    where
        FEmpty: FnMut() -> Z,
        FFail: FnMut(&E) -> Z,
        FDie: FnMut(&Arc<dyn Defect>) -> Z,
        FInterrupt: FnMut(FiberId) -> Z,
        FThen: FnMut(Z, Z) -> Z,
        FBoth: FnMut(Z, Z) -> Z,
        FTraced: FnMut(Z, &ZTrace) -> Z,
    {
        enum Task<'a, E> {
            Eval(&'a Cause<E>),
            Then,
            Both,
            Traced(&'a ZTrace),
        }

        let mut tasks = vec![Task::Eval(self)];
        let mut values: Vec<Z> = Vec::new();
        while let Some(task) = tasks.pop() {
            match task {
                Task::Eval(node) => match node {
                    Cause::Empty => values.push(empty_case()),
                    Cause::Fail(e) => values.push(fail_case(e)),
                    Cause::Die(d) => values.push(die_case(d)),
                    Cause::Interrupt(id) => values.push(interrupt_case(*id)),
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
                    Cause::Traced(inner, trace) => {
                        tasks.push(Task::Traced(trace));
                        tasks.push(Task::Eval(inner));
                    }
                    Cause::Meta(inner, _) => tasks.push(Task::Eval(inner)),
                },
                Task::Then => {
                    let r = values.pop().expect("rhs folded before Then");
                    let l = values.pop().expect("lhs folded before Then");
                    values.push(then_case(l, r));
                }
                Task::Both => {
                    let r = values.pop().expect("rhs folded before Both");
                    let l = values.pop().expect("lhs folded before Both");
                    values.push(both_case(l, r));
                }
                Task::Traced(trace) => {
                    let inner = values.pop().expect("inner folded before Traced");
                    values.push(traced_case(inner, trace));
                }
            }
        }
        values.pop().expect("traversal always yields exactly one value")
    }
}
