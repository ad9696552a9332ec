/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! `slog::KV` glue, gated behind the `slog` feature. Grounded on
//! `failure_ext::slogkv::SlogKVError`: wrap the thing being logged in a
//! newtype, serialize under a couple of well-known keys, and leave the
//! actual logger agnostic to what's inside.

use std::fmt;

use crate::cause::Cause;

/// Wrapper around a `&Cause<E>` that implements [`slog::KV`], so a `Cause`
/// can be attached to a `slog` log record the same way `SlogKVError` lets
/// callers attach an `Error`.
pub struct SlogKVCause<'a, E>(pub &'a Cause<E>);

impl<E: fmt::Display> slog::KV for SlogKVCause<'_, E> {
    fn serialize(
        &self,
        _record: &slog::Record<'_>,
        serializer: &mut dyn slog::Serializer,
    ) -> slog::Result {
        let cause = self.0;
        serializer.emit_str(SlogKVCauseKey::Cause.into_str(), &cause.pretty_print())?;
        serializer.emit_str(
            SlogKVCauseKey::RootCause.into_str(),
            &cause.squash_with(|e| crate::defect::AnyhowDefect::msg(e.to_string())).to_string(),
        )?;
        Ok(())
    }
}

/// Keys used by the [`slog::Serializer`] implementation when [`SlogKVCause`]
/// is logged.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SlogKVCauseKey {
    /// The full pretty-printed failure report.
    Cause,
    /// The single defect `squash`/`squash_with` would pick as the root cause.
    RootCause,
}
use SlogKVCauseKey::*;

impl SlogKVCauseKey {
    /// String representation used as the serialized key.
    pub fn into_str(self) -> &'static str {
        match self {
            Cause => "cause",
            RootCause => "root_cause",
        }
    }
}

impl ::std::str::FromStr for SlogKVCauseKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cause" => Ok(Cause),
            "root_cause" => Ok(RootCause),
            _ => Err(()),
        }
    }
}
