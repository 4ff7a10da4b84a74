//! Lowers a checked AST to tape instructions.
//!
//! `Emitter` is the `CompilerContext` the design notes call for: one struct,
//! threaded by `&mut` through every emit call, that owns the instruction
//! buffer, the scope table, and the tape allocator. Nothing else holds a
//! second handle to any of them, so the shared-resource policy in the
//! concurrency section is enforced by construction rather than convention.

pub mod builtins;
pub mod calls;
pub mod expr;
pub mod stmt;

use std::collections::HashMap;

use crate::abi;
use crate::ast::{Param, Stmt, Type};
use crate::bf::{Op, Program};
use crate::error::{Error, Position, Result};
use crate::sema::ScopeTable;
use crate::tape::TapeAllocator;

/// A function's signature and body, recorded once while walking top-level
/// declarations. Call sites look functions up here and inline the body;
/// nothing here is ever emitted standalone.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    pub ret_type: Type,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub pos: Position,
}

pub type FunctionTable = HashMap<String, FunctionInfo>;

pub struct Emitter<'f> {
    pub program: Program,
    pub scope: ScopeTable,
    pub tape: TapeAllocator,
    pub functions: &'f FunctionTable,
    /// Global cell set to a nonzero value the first time a division or
    /// modulo by zero happens at runtime. Checked by nothing in-language
    /// (there is no exception mechanism) but surfaced to callers of the
    /// generated program as documented runtime-guard behavior.
    pub div_zero_flag: usize,
    pointer: usize,
    loop_stack: Vec<usize>,
    return_flag_stack: Vec<usize>,
    call_chain: Vec<String>,
    verbose: bool,
}

impl<'f> Emitter<'f> {
    /// Reserves cell 0 as `div_zero_flag` before any other allocation runs,
    /// so every caller sees the same well-known cell without having to
    /// thread it through the compile pipeline by hand.
    pub fn new(functions: &'f FunctionTable, verbose: bool) -> Self {
        let mut tape = TapeAllocator::new(0);
        let div_zero_flag = tape.allocate_named(1);
        Self {
            program: Program::new(),
            scope: ScopeTable::new(),
            tape,
            functions,
            div_zero_flag,
            pointer: 0,
            loop_stack: Vec::new(),
            return_flag_stack: Vec::new(),
            call_chain: Vec::new(),
            verbose,
        }
    }

    pub fn note(&mut self, text: impl Into<String>) {
        if self.verbose {
            self.program.annotate(text);
        }
    }

    // ---- raw instruction emission ----

    pub fn emit(&mut self, op: Op) {
        self.program.push(op);
    }

    pub fn emit_n(&mut self, op: Op, n: usize) {
        for _ in 0..n {
            self.emit(op);
        }
    }

    /// Move the data pointer to `cell`, updating the compile-time-tracked
    /// position. This is the only place `>`/`<` are emitted, which is what
    /// lets every other routine reason about pointer position purely by
    /// bookkeeping (the pointer-return invariant).
    pub fn goto(&mut self, cell: usize) {
        if cell > self.pointer {
            self.emit_n(Op::Right, cell - self.pointer);
        } else if cell < self.pointer {
            self.emit_n(Op::Left, self.pointer - cell);
        }
        self.pointer = cell;
    }

    #[must_use]
    pub const fn pointer(&self) -> usize {
        self.pointer
    }

    /// `[-]`: the canonical zero idiom. Leaves the pointer at `cell`.
    pub fn emit_zero(&mut self, cell: usize) {
        self.goto(cell);
        self.emit(Op::LoopOpen);
        self.emit(Op::Dec);
        self.emit(Op::LoopClose);
    }

    /// Zero `cell`, then increment it `value` times (folding to a bare
    /// zero when `value == 0`, per the expression emitter's literal rule).
    pub fn emit_set_const(&mut self, cell: usize, value: u8) {
        self.emit_zero(cell);
        if value != 0 {
            self.goto(cell);
            self.emit_n(Op::Inc, value as usize);
        }
    }

    /// Destructive transfer: `dst += src; src = 0`. Requires `dst` to
    /// already hold the value the caller wants preserved underneath the
    /// addition (callers that want a plain move first zero `dst`).
    pub fn emit_move(&mut self, src: usize, dst: usize) {
        self.goto(src);
        self.emit(Op::LoopOpen);
        self.emit(Op::Dec);
        self.goto(dst);
        self.emit(Op::Inc);
        self.goto(src);
        self.emit(Op::LoopClose);
    }

    /// Destructive transfer: `dst -= src; src = 0`.
    pub fn emit_move_sub(&mut self, src: usize, dst: usize) {
        self.goto(src);
        self.emit(Op::LoopOpen);
        self.emit(Op::Dec);
        self.goto(dst);
        self.emit(Op::Dec);
        self.goto(src);
        self.emit(Op::LoopClose);
    }

    /// The copy idiom: duplicate `src` into a fresh cell without disturbing
    /// it, via a scratch cell that restores `src` afterward.
    pub fn copy_cell(&mut self, src: usize) -> usize {
        let dst = self.tape.allocate_temp();
        let scratch = self.tape.allocate_temp();
        self.goto(src);
        self.emit(Op::LoopOpen);
        self.emit(Op::Dec);
        self.goto(dst);
        self.emit(Op::Inc);
        self.goto(scratch);
        self.emit(Op::Inc);
        self.goto(src);
        self.emit(Op::LoopClose);
        self.emit_move(scratch, src);
        self.release_temp(scratch);
        dst
    }

    pub fn release_temp(&mut self, cell: usize) {
        self.tape.release_temp(cell);
    }

    /// The canonical two-flag if/else lowering from the control emitter:
    /// evaluate `cond` into a cell the caller already owns, run `then` if
    /// it was nonzero, otherwise run `else_`, with an `else_flag` gating
    /// the second branch. `cond` is left at zero; the caller releases it.
    pub fn emit_if_else(
        &mut self,
        cond: usize,
        then: impl FnOnce(&mut Self) -> Result<()>,
        else_: Option<impl FnOnce(&mut Self) -> Result<()>>,
    ) -> Result<()> {
        let else_flag = self.tape.allocate_temp();
        self.emit_set_const(else_flag, 1);

        self.goto(cond);
        self.emit(Op::LoopOpen);
        then(self)?;
        self.emit_zero(cond);
        self.emit_zero(else_flag);
        self.goto(cond);
        self.emit(Op::LoopClose);

        self.goto(else_flag);
        self.emit(Op::LoopOpen);
        if let Some(else_fn) = else_ {
            else_fn(self)?;
        }
        self.emit_zero(else_flag);
        self.goto(else_flag);
        self.emit(Op::LoopClose);

        self.release_temp(else_flag);
        Ok(())
    }

    /// Overwrite `x` in place with `1` if the original value was `0`, else
    /// `0`. Used both for `!` and as the core of every comparison.
    pub fn emit_is_zero_in_place(&mut self, x: usize) {
        let tmp = self.tape.allocate_temp();
        self.emit_set_const(tmp, 1);
        self.goto(x);
        self.emit(Op::LoopOpen);
        self.emit_zero(tmp);
        self.goto(x);
        self.emit(Op::Dec);
        self.emit(Op::LoopClose);
        self.emit_move(tmp, x);
        self.release_temp(tmp);
    }

    /// Overwrite the boolean `x` in place with its logical negation.
    pub fn emit_not_bool_in_place(&mut self, x: usize) {
        let tmp = self.tape.allocate_temp();
        self.emit_set_const(tmp, 1);
        self.emit_move_sub(x, tmp);
        self.emit_move(tmp, x);
        self.release_temp(tmp);
    }

    /// `target := target != 0 && cond_src != 0`, leaving `target` in place.
    /// Used to fold a loop's `break`-driven `running_flag` into its
    /// re-evaluated condition cell each iteration.
    pub fn and_in_place(&mut self, target: usize, cond_src: usize) -> Result<()> {
        let probe = self.copy_cell(cond_src);
        self.emit_if_else(
            probe,
            |_| Ok(()),
            Some(|s: &mut Self| {
                s.emit_zero(target);
                Ok(())
            }),
        )?;
        self.release_temp(probe);
        Ok(())
    }

    pub fn push_loop(&mut self, running_flag: usize) {
        self.loop_stack.push(running_flag);
    }

    pub fn pop_loop(&mut self) {
        self.loop_stack.pop();
    }

    pub fn innermost_running_flag(&self, pos: Position) -> Result<usize> {
        self.loop_stack
            .last()
            .copied()
            .ok_or_else(|| Error::semantic(pos, "'break' outside a loop or switch"))
    }

    pub fn check_capacity(&self, limit: usize) -> Result<()> {
        self.tape.check_capacity(limit)
    }

    fn cells_for(ty: Type) -> usize {
        match ty {
            Type::Array(_, len) => len + abi::ARRAY_WALK_LANE_CELLS,
            _ => 1,
        }
    }

    /// Reserve the cells for a new named binding (scalar or array) and
    /// record it in the current scope.
    pub fn declare_local(&mut self, name: &str, ty: Type, pos: Position, is_param: bool) -> Result<usize> {
        let cell = self.tape.allocate_named(Self::cells_for(ty));
        if is_param {
            self.scope.declare_param(name, ty, cell, pos)?;
        } else {
            self.scope.declare(name, ty, cell, pos)?;
        }
        Ok(cell)
    }

    pub fn declare_global(&mut self, name: &str, ty: Type, pos: Position) -> Result<usize> {
        let cell = self.tape.allocate_named(Self::cells_for(ty));
        self.scope.declare_global(name, ty, cell, pos)?;
        Ok(cell)
    }

    pub fn push_return_flag(&mut self, cell: usize) {
        self.return_flag_stack.push(cell);
    }

    pub fn pop_return_flag(&mut self) {
        self.return_flag_stack.pop();
    }

    #[must_use]
    pub fn current_return_flag(&self) -> Option<usize> {
        self.return_flag_stack.last().copied()
    }

    /// `target := target(expr)`: zero `target`, evaluate `expr` fresh, move
    /// the result in. Used by `VarDecl`/`Assign` and by loop condition
    /// re-evaluation, all of which need "write this expression's value into
    /// a cell I already own" rather than a fresh allocation.
    pub fn emit_expr_into(&mut self, target: usize, expr: &crate::ast::Expr) -> Result<()> {
        self.emit_zero(target);
        let v = self.emit_expr(expr)?;
        self.emit_move(v, target);
        self.release_temp(v);
        Ok(())
    }

    /// A cell holding `1` exactly when no enclosing `break` or `return` has
    /// fired yet: the AND of the current function's return flag and the
    /// innermost loop/switch's running flag (either may be absent).
    pub fn emit_active_probe(&mut self) -> Result<usize> {
        let probe = match self.current_return_flag() {
            Some(rf) => self.copy_cell(rf),
            None => {
                let c = self.tape.allocate_temp();
                self.emit_set_const(c, 1);
                c
            }
        };
        if let Some(running) = self.loop_stack.last().copied() {
            self.and_in_place(probe, running)?;
        }
        Ok(probe)
    }

    /// Run a statement sequence so that a `break`/`return` partway through
    /// suppresses everything after it, not just the statement it appears
    /// in: every statement is individually gated on [`Self::emit_active_probe`].
    pub fn emit_stmt_seq(&mut self, stmts: &[Stmt]) -> Result<()> {
        for stmt in stmts {
            let active = self.emit_active_probe()?;
            self.emit_if_else(active, |s| s.emit_stmt(stmt), None::<fn(&mut Self) -> Result<()>>)?;
            self.release_temp(active);
        }
        Ok(())
    }

    pub fn is_calling(&self, name: &str) -> bool {
        self.call_chain.iter().any(|n| n == name)
    }

    pub fn enter_call(&mut self, name: impl Into<String>) {
        self.call_chain.push(name.into());
    }

    pub fn exit_call(&mut self) {
        self.call_chain.pop();
    }

    #[must_use]
    pub fn call_depth(&self) -> usize {
        self.call_chain.len()
    }
}
