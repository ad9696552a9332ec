/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

use std::fmt;

/// Identifies the fiber that produced an [`crate::Cause::Interrupt`].
///
/// A `FiberId` is a pair of `(start_time_nanos, seq_number)`: the wall-clock
/// time the fiber started and a monotonically increasing sequence number
/// assigned at spawn time. Only `seq_number` is shown by the pretty-printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiberId {
    start_time_nanos: i64,
    seq_number: i64,
}

impl FiberId {
    /// Creates a new `FiberId` from its start time and sequence number.
    pub const fn new(start_time_nanos: i64, seq_number: i64) -> Self {
        FiberId {
            start_time_nanos,
            seq_number,
        }
    }

    /// The wall-clock start time of the fiber, in nanoseconds.
    pub const fn start_time_nanos(&self) -> i64 {
        self.start_time_nanos
    }

    /// The sequence number assigned to the fiber at spawn time.
    ///
    /// This is the value shown by the pretty-printer ("An interrupt was
    /// produced by #<seq_number>.").
    pub const fn seq_number(&self) -> i64 {
        self.seq_number
    }
}

impl fmt::Display for FiberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.seq_number)
    }
}

/// An uninhabited type, used the way `Nothing` is used in the source
/// language: a `Cause<Never>` is a Cause that provably contains no `Fail`
/// leaf, since there is no value of type `Never` to put in one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Never {}

impl fmt::Display for Never {
    fn fmt(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
