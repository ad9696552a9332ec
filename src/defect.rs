/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! The payload of [`crate::Cause::Die`]: an unchecked, host-level
//! "throwable-like" value.
//!
//! `Cause<E>` never pattern-matches on the contents of a defect, only on
//! whether one is present, so [`Defect`] deliberately exposes just enough
//! surface for the pretty-printer: a one-line `Display`, and an opaque
//! stack-trace hook. This mirrors `failure_ext`'s relationship to `anyhow`:
//! the crate doesn't know or care what error library produced the defect, it
//! only needs a stable way to show it.

use std::fmt;
use std::sync::Arc;

/// A host-provided, throwable-like value carried by [`crate::Cause::Die`].
///
/// Implementors are expected to be cheap to clone (defects are typically
/// stored behind `Arc` and shared across a Cause tree) and to render their
/// stack trace, if any, through [`Defect::fmt_stack_trace`] rather than
/// folding it into `Display`, so the pretty-printer can omit it under
/// `stackless` rendering.
pub trait Defect: fmt::Display + fmt::Debug + Send + Sync + 'static {
    /// Writes this defect's stack trace, one frame per line, with no
    /// trailing newline. The default implementation writes nothing, which is
    /// appropriate for defects that never captured one.
    fn fmt_stack_trace(&self, _f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Ok(())
    }

    /// `true` if [`Defect::fmt_stack_trace`] would write anything.
    fn has_stack_trace(&self) -> bool {
        false
    }
}

/// Renders a defect's stack trace (if any) to a `String`, for callers that
/// don't want to deal with `fmt::Formatter` directly.
pub fn stack_trace_string(defect: &dyn Defect) -> String {
    struct Wrap<'a>(&'a dyn Defect);
    impl fmt::Display for Wrap<'_> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            self.0.fmt_stack_trace(f)
        }
    }
    Wrap(defect).to_string()
}

/// Two defects are considered value-equal if they are the same allocation,
/// or if their `Display` renderings agree.
///
/// The source language gives `Throwable` reference equality by default; a
/// `dyn Defect` trait object can't carry a dyn-safe structural `Eq`/`Hash`
/// without real cost, so this crate approximates reference equality with a
/// pointer-equality fast path and falls back to comparing the rendered
/// message. See `DESIGN.md` for the trade-off.
pub fn defect_eq(a: &Arc<dyn Defect>, b: &Arc<dyn Defect>) -> bool {
    Arc::ptr_eq(a, b) || a.to_string() == b.to_string()
}

/// The canonical-form/hash counterpart of [`defect_eq`]: two defects that
/// compare equal under [`defect_eq`] must hash equal here.
pub fn defect_hash<H: std::hash::Hasher>(defect: &Arc<dyn Defect>, state: &mut H) {
    use std::hash::Hash;
    defect.to_string().hash(state);
}

/// The default [`Defect`] implementation, wrapping an [`anyhow::Error`].
///
/// Its stack trace is the `anyhow` error chain, rendered the same way
/// `failure_ext::DisplayChain` renders a chain of causes ("Caused by: ...",
/// one per line).
#[derive(Debug)]
pub struct AnyhowDefect(pub anyhow::Error);

impl AnyhowDefect {
    /// Wraps any standard error (or anyhow-compatible value) as a `Defect`.
    pub fn new<E>(err: E) -> Arc<dyn Defect>
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Arc::new(AnyhowDefect(anyhow::Error::new(err)))
    }

    /// Wraps a message-only defect that has no underlying `std::error::Error`.
    pub fn msg(message: impl fmt::Display + fmt::Debug + Send + Sync + 'static) -> Arc<dyn Defect> {
        Arc::new(AnyhowDefect(anyhow::Error::msg(message)))
    }
}

impl fmt::Display for AnyhowDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Defect for AnyhowDefect {
    fn fmt_stack_trace(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut chain = self.0.chain().skip(1).peekable();
        while let Some(cause) = chain.next() {
            write!(f, "Caused by: {cause}")?;
            if chain.peek().is_some() {
                writeln!(f)?;
            }
        }
        Ok(())
    }

    fn has_stack_trace(&self) -> bool {
        self.0.chain().nth(1).is_some()
    }
}

/// Builds the synthetic "interrupted" defect used by `squash`/`squash_with`
/// when a Cause was interrupted (or was empty) rather than failed or died.
pub fn synthetic_interrupted_defect() -> Arc<dyn Defect> {
    AnyhowDefect::msg("Interrupted".to_string())
}

/// An opaque execution trace attached by [`crate::Cause::traced`].
///
/// The algebra never inspects a trace's structure, only its pretty-printed
/// form, so `ZTrace` stores the rendered text directly rather than modeling
/// stack frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZTrace {
    rendered: String,
}

impl ZTrace {
    /// Wraps an already-rendered execution trace.
    pub fn new(rendered: impl Into<String>) -> Self {
        ZTrace {
            rendered: rendered.into(),
        }
    }

    /// The trace's pretty-printed form.
    pub fn pretty_print(&self) -> &str {
        &self.rendered
    }
}

impl fmt::Display for ZTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.rendered)
    }
}
