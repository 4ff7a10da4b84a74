//! Peephole optimizer over the flat `Op` buffer.
//!
//! Two rewrites, applied to a fixed point:
//!
//! - `cancel_adjacent`: stack-based annihilation of `+-`/`-+`/`><`/`<>`.
//!   Loop brackets and I/O are barriers the stack never pops past, so
//!   cancellation can never cross into or out of a loop body and brackets
//!   stay balanced for free.
//! - `eliminate_dead_zero_loops`: a single forward pass tracks, per
//!   relative tape offset, whether the cell is provably zero (every loop
//!   leaves its guard cell at zero on exit, by `while` semantics); a `[`
//!   seen when its cell is known zero guards a loop that can never run, so
//!   the whole bracketed span is dropped. This also accounts for the
//!   spec's `[-][-]` → `[-]` and "dead zero-loop" cases: after the first
//!   loop closes its cell is known zero, so the second is recognized as
//!   unreachable and removed outright.
//!
//! Pointer-arithmetic folding across balanced groups (moving `>`/`<` past
//! a loop that doesn't touch the cells in between) is in scope per the
//! spec but is not implemented: proving a loop body doesn't touch a given
//! offset requires tracking every cell it writes, and a wrong answer here
//! silently corrupts the program rather than merely missing an
//! optimization. Left as future work; recorded in DESIGN.md.

use std::collections::HashMap;

use super::instruction::{Op, Program};

/// Which passes run, so the CLI can disable any one independently (e.g. to
/// isolate a miscompile) without turning optimization off entirely.
#[derive(Debug, Clone, Copy)]
pub struct OptimizationFlags {
    /// `cancel_adjacent`: annihilate adjacent `+-`/`><` pairs.
    pub peephole: bool,
    /// `eliminate_dead_zero_loops`: drop loops guarded by a provably-zero cell.
    pub dead_zero_loop_elim: bool,
    /// Fold pointer motion across a loop that doesn't touch the cells
    /// crossed. Reserved: not implemented yet, see module docs.
    pub pointer_fold: bool,
}

impl Default for OptimizationFlags {
    fn default() -> Self {
        Self {
            peephole: true,
            dead_zero_loop_elim: true,
            pointer_fold: true,
        }
    }
}

pub fn optimize(program: &mut Program) {
    optimize_with_flags(program, &OptimizationFlags::default());
}

pub fn optimize_with_flags(program: &mut Program, flags: &OptimizationFlags) {
    loop {
        let before = program.ops.len();
        if flags.peephole {
            cancel_adjacent(&mut program.ops);
        }
        if flags.dead_zero_loop_elim {
            eliminate_dead_zero_loops(&mut program.ops);
        }
        if program.ops.len() == before {
            break;
        }
    }
    // pointer_fold has no implementation to gate yet; the flag exists so a
    // caller's intent survives once it does.
}

fn cancel_adjacent(ops: &mut Vec<Op>) {
    let mut stack: Vec<Op> = Vec::with_capacity(ops.len());
    for &op in ops.iter() {
        let cancels = match (stack.last(), op) {
            (Some(Op::Inc), Op::Dec) | (Some(Op::Dec), Op::Inc) => true,
            (Some(Op::Right), Op::Left) | (Some(Op::Left), Op::Right) => true,
            _ => false,
        };
        if cancels {
            stack.pop();
        } else {
            stack.push(op);
        }
    }
    *ops = stack;
}

/// Tri-state knowledge about a cell's contents at a point in the symbolic
/// scan: `Some(true)` means provably zero, `Some(false)`/`None` means
/// unknown (distinguished only so `.entry().or_insert` reads cleanly).
fn eliminate_dead_zero_loops(ops: &mut Vec<Op>) {
    let matching_close = match_brackets(ops);

    let mut keep = vec![true; ops.len()];
    let mut zero_known: HashMap<i64, bool> = HashMap::new();
    let mut pointer: i64 = 0;
    let mut i = 0;
    while i < ops.len() {
        match ops[i] {
            Op::Right => {
                pointer += 1;
                i += 1;
            }
            Op::Left => {
                pointer -= 1;
                i += 1;
            }
            Op::Inc | Op::Dec => {
                zero_known.insert(pointer, false);
                i += 1;
            }
            Op::Input => {
                zero_known.insert(pointer, false);
                i += 1;
            }
            Op::Output => {
                i += 1;
            }
            Op::LoopOpen => {
                let close = matching_close[i];
                if zero_known.get(&pointer).copied() == Some(true) {
                    for slot in keep.iter_mut().take(close + 1).skip(i) {
                        *slot = false;
                    }
                    i = close + 1;
                } else {
                    // Entering a live loop: nothing inside is provably zero
                    // relative to our single-pass knowledge once we re-enter
                    // iterations, so forget everything this loop body could
                    // touch by clearing knowledge of offsets the body spans.
                    // A conservative, cheap approximation: drop all
                    // knowledge rather than track per-body writes.
                    zero_known.clear();
                    i += 1;
                }
            }
            Op::LoopClose => {
                // The loop just exited because the guard cell read zero.
                zero_known.insert(pointer, true);
                i += 1;
            }
        }
    }

    let mut result = Vec::with_capacity(ops.len());
    for (op, k) in ops.iter().zip(keep.iter()) {
        if *k {
            result.push(*op);
        }
    }
    *ops = result;
}

/// For every `LoopOpen` at index `i`, the index of its matching
/// `LoopClose`. Indices that aren't `LoopOpen` map to `0` and are unused.
fn match_brackets(ops: &[Op]) -> Vec<usize> {
    let mut matching = vec![0usize; ops.len()];
    let mut stack = Vec::new();
    for (i, op) in ops.iter().enumerate() {
        match op {
            Op::LoopOpen => stack.push(i),
            Op::LoopClose => {
                let open = stack.pop().expect("balanced brackets");
                matching[open] = i;
            }
            _ => {}
        }
    }
    matching
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(ops: Vec<Op>) -> Vec<Op> {
        let mut program = Program {
            ops,
            annotations: Vec::new(),
        };
        optimize(&mut program);
        program.ops
    }

    #[test]
    fn cancels_increment_decrement_pairs() {
        assert_eq!(run(vec![Op::Inc, Op::Dec]), vec![]);
        assert_eq!(run(vec![Op::Right, Op::Left]), vec![]);
    }

    #[test]
    fn cancels_through_nested_pairs() {
        assert_eq!(run(vec![Op::Inc, Op::Inc, Op::Dec, Op::Dec]), vec![]);
    }

    #[test]
    fn does_not_cancel_across_io() {
        let result = run(vec![Op::Inc, Op::Output, Op::Dec]);
        assert_eq!(result, vec![Op::Inc, Op::Output, Op::Dec]);
    }

    #[test]
    fn removes_a_redundant_second_clear_loop() {
        let result = run(vec![
            Op::LoopOpen,
            Op::Dec,
            Op::LoopClose,
            Op::LoopOpen,
            Op::Dec,
            Op::LoopClose,
        ]);
        assert_eq!(result, vec![Op::LoopOpen, Op::Dec, Op::LoopClose]);
    }

    #[test]
    fn never_removes_output_or_input() {
        let result = run(vec![Op::Output, Op::Input]);
        assert_eq!(result, vec![Op::Output, Op::Input]);
    }

    #[test]
    fn preserves_bracket_balance() {
        let mut program = Program {
            ops: vec![
                Op::Inc,
                Op::LoopOpen,
                Op::Dec,
                Op::Right,
                Op::Inc,
                Op::Left,
                Op::LoopClose,
            ],
            annotations: Vec::new(),
        };
        optimize(&mut program);
        assert!(program.is_bracket_balanced());
    }

    #[test]
    fn is_idempotent_at_fixed_point() {
        let mut program = Program {
            ops: vec![Op::Inc, Op::Dec, Op::Right, Op::Right, Op::Left],
            annotations: Vec::new(),
        };
        optimize(&mut program);
        let once = program.ops.clone();
        optimize(&mut program);
        assert_eq!(program.ops, once);
    }
}
