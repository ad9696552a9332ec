/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! [`Cause::pretty_print`]: renders a `Cause` as a box-drawing failure
//! report.
//!
//! Unlike every other traversal in this crate, the printer does care about
//! `Traced` and `Meta` — they're the one place the algebra's "transparent
//! wrapper" story doesn't apply, since a trace or a stackless flag has to
//! show up *somewhere* in the text. The shape of the work is still the
//! same two-pass structure as `canonical.rs`: fold `Then` chains into a
//! flat sequence of [`Step`]s and `Both` groups into a flat set of
//! branches, iteratively (explicit work stack) so a long retry chain
//! doesn't recurse the host stack into the ground, then lay the result out
//! as text in a second pass that doesn't need to be stack-bounded (it's
//! already working over the flat `Step` list, not the original tree).

use std::fmt;
use std::sync::Arc;

use crate::cause::Cause;
use crate::defect::stack_trace_string;
use crate::defect::Defect;
use crate::defect::ZTrace;
use crate::fiber_id::FiberId;

/// One step of a flattened `Then`-sequence: either a single rendered leaf
/// (or a "rethrown with a new trace" header above one), or a flattened
/// `Both`-group of parallel branches, each itself a sequence of steps.
enum Step {
    Failure(Vec<String>),
    Parallel(Vec<Vec<Step>>),
}

fn is_leaf<E>(c: &Cause<E>) -> bool {
    matches!(
        c,
        Cause::Fail(_) | Cause::Die(_) | Cause::Interrupt(_)
    )
}

fn as_parallel_branches(steps: Vec<Step>) -> Vec<Vec<Step>> {
    if steps.len() == 1 {
        if let Step::Parallel(_) = &steps[0] {
            let Step::Parallel(branches) = steps.into_iter().next().unwrap() else {
                unreachable!()
            };
            return branches;
        }
    }
    vec![steps]
}

fn combine_then(l: Vec<Step>, r: Vec<Step>) -> Vec<Step> {
    let mut out = l;
    out.extend(r);
    out
}

fn combine_both(l: Vec<Step>, r: Vec<Step>) -> Vec<Step> {
    let mut branches = as_parallel_branches(l);
    branches.extend(as_parallel_branches(r));
    vec![Step::Parallel(branches)]
}

fn render_fail_lines<E: fmt::Display>(e: &E) -> Vec<String> {
    let mut lines = vec!["A checked error was not handled.".to_string()];
    lines.extend(e.to_string().lines().map(str::to_string));
    lines
}

fn render_die_lines(d: &Arc<dyn Defect>, stackless: bool) -> Vec<String> {
    let mut lines = vec!["An unchecked error was produced.".to_string()];
    lines.extend(d.to_string().lines().map(str::to_string));
    if !stackless && d.has_stack_trace() {
        lines.extend(stack_trace_string(d.as_ref()).lines().map(str::to_string));
    }
    lines
}

fn render_interrupt_lines(id: FiberId) -> Vec<String> {
    vec![format!("An interrupt was produced by #{}.", id.seq_number())]
}

/// Builds the flat [`Step`] sequence for a `Cause`, iteratively.
fn to_steps<E: fmt::Display>(root: &Cause<E>) -> Vec<Step> {
    enum Task<'a, E> {
        Eval(&'a Cause<E>, bool),
        Then,
        Both,
        AttachTraceToLeaf(&'a ZTrace),
        PrependRethrowHeader(&'a ZTrace),
        ApplyMeta,
    }

    let mut tasks = vec![Task::Eval(root, false)];
    let mut values: Vec<Vec<Step>> = Vec::new();
    while let Some(task) = tasks.pop() {
        match task {
            Task::Eval(node, stackless) => match node {
                Cause::Empty => values.push(Vec::new()),
                Cause::Fail(e) => values.push(vec![Step::Failure(render_fail_lines(e))]),
                Cause::Die(d) => values.push(vec![Step::Failure(render_die_lines(d, stackless))]),
                Cause::Interrupt(id) => {
                    values.push(vec![Step::Failure(render_interrupt_lines(*id))])
                }
                Cause::Then(l, r) => {
                    tasks.push(Task::Then);
                    tasks.push(Task::Eval(r, stackless));
                    tasks.push(Task::Eval(l, stackless));
                }
                Cause::Both(l, r) => {
                    tasks.push(Task::Both);
                    tasks.push(Task::Eval(r, stackless));
                    tasks.push(Task::Eval(l, stackless));
                }
                Cause::Traced(inner, trace) => {
                    if is_leaf(inner) {
                        tasks.push(Task::AttachTraceToLeaf(trace));
                    } else {
                        tasks.push(Task::PrependRethrowHeader(trace));
                    }
                    tasks.push(Task::Eval(inner, stackless));
                }
                Cause::Meta(inner, meta) => {
                    tasks.push(Task::ApplyMeta);
                    tasks.push(Task::Eval(inner, meta.stackless));
                }
            },
            Task::Then => {
                let r = values.pop().expect("rhs rendered before Then");
                let l = values.pop().expect("lhs rendered before Then");
                values.push(combine_then(l, r));
            }
            Task::Both => {
                let r = values.pop().expect("rhs rendered before Both");
                let l = values.pop().expect("lhs rendered before Both");
                values.push(combine_both(l, r));
            }
            Task::AttachTraceToLeaf(trace) => {
                let mut steps = values.pop().expect("leaf rendered before its trace");
                if let Some(Step::Failure(lines)) = steps.first_mut() {
                    lines.extend(trace.pretty_print().lines().map(str::to_string));
                }
                values.push(steps);
            }
            Task::PrependRethrowHeader(trace) => {
                let steps = values.pop().expect("subtree rendered before its trace");
                let mut header = vec!["An error was rethrown with a new trace.".to_string()];
                header.extend(trace.pretty_print().lines().map(str::to_string));
                let mut out = vec![Step::Failure(header)];
                out.extend(steps);
                values.push(out);
            }
            Task::ApplyMeta => {
                // Meta only changes the stackless context already threaded
                // through `Task::Eval`; it contributes no step of its own.
            }
        }
    }
    values.pop().expect("traversal always yields exactly one value")
}

fn render_parallel_header(branch_count: usize) -> String {
    let mut header = String::new();
    for _ in 0..branch_count.saturating_sub(1) {
        header.push_str("══╦");
    }
    header.push_str("══╗");
    header
}

/// Renders one failure block's raw lines: the header (first line) gets the
/// `─ ` marker; the rest (the error's own stringification, stack trace,
/// trace section) are emitted verbatim, since they're the error's own text,
/// not this printer's commentary on it.
fn render_failure_block(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .enumerate()
        .map(|(j, line)| {
            if j == 0 {
                format!("─ {line}")
            } else {
                line.clone()
            }
        })
        .collect()
}

fn render_sequential(steps: &[Step]) -> Vec<String> {
    let mut out = Vec::new();
    for (i, step) in steps.iter().enumerate() {
        if i > 0 {
            out.push("║".to_string());
            out.push("▼".to_string());
        }
        match step {
            Step::Failure(lines) => out.extend(render_failure_block(lines)),
            Step::Parallel(branches) => {
                out.push(render_parallel_header(branches.len()));
                for branch in branches {
                    for line in render_sequential(branch) {
                        out.push(format!("  ║ {line}"));
                    }
                }
            }
        }
    }
    out
}

impl<E: fmt::Display> Cause<E> {
    /// Renders `self` as a box-drawing failure report. Total: never
    /// panics on a well-formed `Cause`, regardless of depth or shape.
    pub fn pretty_print(&self) -> String {
        let steps = to_steps(self);
        let body = if let [Step::Failure(lines)] = steps.as_slice() {
            render_failure_block(lines)
        } else {
            let mut v = vec!["╥".to_string()];
            v.extend(render_sequential(&steps));
            v
        };
        let mut out = String::from("Fiber failed.");
        for line in body {
            out.push('\n');
            out.push_str(&line);
        }
        out
    }
}
