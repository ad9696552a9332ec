/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! An algebra of concurrent failure.
//!
//! [`Cause`] is an immutable, typed, tree-shaped record of *why* a
//! concurrent computation failed. It is not one error but the full
//! structure of a failure assembled from many concurrent sub-computations:
//! some failed independently in parallel ([`Cause::both`]), some failed one
//! after another ([`Cause::then`]), some were interrupted by another fiber
//! ([`interrupt`](crate::interrupt)), some died from an unrecoverable
//! defect ([`die`](crate::die)).
//!
//! The crate is organized the way the algebra's five pieces are described:
//! construction (`cause`, `fiber_id`, `defect`), the generic eliminator
//! (`fold`), derived traversals (`projections`), structural equality and
//! hashing quotiented by the algebra's laws (`eq`, `canonical`), and a
//! box-drawing pretty-printer (`pretty`).
//!
//! Every operation here is total and pure: construction, folding,
//! projecting, comparing, and printing a `Cause` never fail and never
//! recurse more deeply than the shape of the traversal requires, so a
//! fiber that failed after a long retry loop can still be printed and
//! compared without overflowing the stack.

mod canonical;
mod cause;
mod defect;
mod eq;
mod fiber_id;
mod fold;
mod pretty;
mod projections;

#[cfg(feature = "quickcheck")]
mod arbitrary;
#[cfg(feature = "slog")]
mod slogkv;

pub use crate::cause::empty;
pub use crate::cause::die;
pub use crate::cause::fail;
pub use crate::cause::interrupt;
pub use crate::cause::Cause;
pub use crate::cause::RenderMeta;
pub use crate::defect::stack_trace_string;
pub use crate::defect::synthetic_interrupted_defect;
pub use crate::defect::AnyhowDefect;
pub use crate::defect::Defect;
pub use crate::defect::ZTrace;
pub use crate::fiber_id::FiberId;
pub use crate::fiber_id::Never;

#[cfg(feature = "slog")]
pub use crate::slogkv::SlogKVCause;
