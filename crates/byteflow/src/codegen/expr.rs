//! The expression emitter (E): lowers a checked `Expr` to code that leaves
//! its value in exactly one freshly allocated cell, which the caller owns
//! and must eventually release.
//!
//! Binary arithmetic reuses one operand's cell as the result (the same
//! trick the allocator's LIFO discipline wants: allocate the cell you'll
//! keep before the one you'll release) rather than allocating a third
//! "result" cell. Comparisons and logical operators consume both operands
//! and leave a plain `0`/`1` boolean behind.

use super::Emitter;
use crate::abi;
use crate::ast::{BinaryOp, Expr, UnaryOp};
use crate::error::{Error, Result};

impl<'f> Emitter<'f> {
    /// Evaluate `expr`, leaving its value in a freshly allocated cell.
    /// Operands are evaluated strictly left to right, matching the source
    /// order a reader would expect for expressions with side effects
    /// (calls, in this language).
    pub fn emit_expr(&mut self, expr: &Expr) -> Result<usize> {
        match expr {
            Expr::IntLit(value, _) => {
                let cell = self.tape.allocate_temp();
                let byte = value.rem_euclid(256) as u8;
                self.emit_set_const(cell, byte);
                Ok(cell)
            }
            Expr::CharLit(byte, _) => {
                let cell = self.tape.allocate_temp();
                self.emit_set_const(cell, *byte);
                Ok(cell)
            }
            Expr::BoolLit(value, _) => {
                let cell = self.tape.allocate_temp();
                self.emit_set_const(cell, u8::from(*value));
                Ok(cell)
            }
            Expr::StringLit(_, pos) => Err(Error::semantic(
                *pos,
                "string literals may only appear as a direct argument to print()",
            )),
            Expr::Ident(name, pos) => {
                let sym = self.scope.resolve(name, *pos)?;
                if sym.is_array {
                    return Err(Error::semantic(
                        *pos,
                        format!("'{name}' is an array; index it before use"),
                    ));
                }
                Ok(self.copy_cell(sym.cell))
            }
            Expr::Index(base, index, pos) => self.emit_index_expr(base, index, *pos),
            Expr::Unary(op, operand, _) => self.emit_unary(*op, operand),
            Expr::Binary(op, lhs, rhs, pos) => self.emit_binary(*op, lhs, rhs, *pos),
            Expr::Call(name, args, pos) => self.emit_call_expr(name, args, *pos),
        }
    }

    fn emit_unary(&mut self, op: UnaryOp, operand: &Expr) -> Result<usize> {
        match op {
            UnaryOp::Not => {
                let v = self.emit_expr(operand)?;
                self.emit_is_zero_in_place(v);
                Ok(v)
            }
            UnaryOp::Neg => {
                // Allocate the result before evaluating the operand so it
                // sits lower in the stack and survives the operand's
                // release, same as the binary-operator result convention.
                let result = self.tape.allocate_temp();
                let v = self.emit_expr(operand)?;
                self.emit_move_sub(v, result); // result = 0 - v (wraps)
                self.release_temp(v);
                Ok(result)
            }
        }
    }

    fn emit_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        pos: crate::error::Position,
    ) -> Result<usize> {
        match op {
            BinaryOp::Add => {
                let l = self.emit_expr(lhs)?;
                let r = self.emit_expr(rhs)?;
                self.emit_move(r, l);
                self.release_temp(r);
                Ok(l)
            }
            BinaryOp::Sub => {
                let l = self.emit_expr(lhs)?;
                let r = self.emit_expr(rhs)?;
                self.emit_move_sub(r, l);
                self.release_temp(r);
                Ok(l)
            }
            BinaryOp::Mul => self.emit_mul(lhs, rhs),
            BinaryOp::Div => {
                let (q, r) = self.emit_divmod(lhs, rhs, pos)?;
                self.release_temp(r);
                Ok(q)
            }
            BinaryOp::Mod => {
                let (q, r) = self.emit_divmod(lhs, rhs, pos)?;
                // `r` is allocator-newer than `q` (emit_divmod allocates `q`
                // first), so it must be released before `q`. Move its value
                // down into `q`'s cell rather than trying to release the
                // older cell out of order.
                self.emit_zero(q);
                self.emit_move(r, q);
                self.release_temp(r);
                Ok(q)
            }
            BinaryOp::Eq => {
                let l = self.emit_expr(lhs)?;
                let r = self.emit_expr(rhs)?;
                Ok(self.emit_eq(l, r))
            }
            BinaryOp::Ne => {
                let l = self.emit_expr(lhs)?;
                let r = self.emit_expr(rhs)?;
                let eq = self.emit_eq(l, r);
                self.emit_not_bool_in_place(eq);
                Ok(eq)
            }
            BinaryOp::Lt => {
                let l = self.emit_expr(lhs)?;
                let r = self.emit_expr(rhs)?;
                self.emit_lt(l, r)
            }
            BinaryOp::Gt => {
                let l = self.emit_expr(lhs)?;
                let r = self.emit_expr(rhs)?;
                self.emit_lt(r, l)
            }
            BinaryOp::Le => {
                let l = self.emit_expr(lhs)?;
                let r = self.emit_expr(rhs)?;
                let gt = self.emit_lt(r, l)?;
                self.emit_not_bool_in_place(gt);
                Ok(gt)
            }
            BinaryOp::Ge => {
                let l = self.emit_expr(lhs)?;
                let r = self.emit_expr(rhs)?;
                let lt = self.emit_lt(l, r)?;
                self.emit_not_bool_in_place(lt);
                Ok(lt)
            }
            BinaryOp::And => self.emit_logical_and(lhs, rhs),
            BinaryOp::Or => self.emit_logical_or(lhs, rhs),
        }
    }

    /// `x := (x != 0) as u8`, overwriting `x` in place.
    pub fn emit_truthy_in_place(&mut self, x: usize) {
        self.emit_is_zero_in_place(x);
        self.emit_not_bool_in_place(x);
    }

    /// Order-agnostic equality: consumes both cells, leaves the boolean
    /// result in whichever of the two has the lower index (so the caller
    /// never needs to track which argument is allocator-newer).
    pub(super) fn emit_eq(&mut self, a: usize, b: usize) -> usize {
        let (keep, drop) = if a < b { (a, b) } else { (b, a) };
        self.emit_move_sub(drop, keep);
        self.release_temp(drop);
        self.emit_is_zero_in_place(keep);
        keep
    }

    /// `a < b`, consuming both via the classic mutual-decrement race: each
    /// round, whichever of `a`/`b` hits zero first decides the answer, with
    /// both-zero-at-once meaning "equal", not "less".
    pub(super) fn emit_lt(&mut self, a: usize, b: usize) -> Result<usize> {
        let lt = self.tape.allocate_temp();
        let running = self.tape.allocate_temp();
        self.emit_set_const(lt, 0);
        self.emit_set_const(running, 1);

        self.goto(running);
        self.emit(crate::bf::Op::LoopOpen);
        self.lt_race_round(a, b, lt, running)?;
        self.goto(running);
        self.emit(crate::bf::Op::LoopClose);

        self.release_temp(running);
        self.emit_zero(a);
        self.emit_zero(b);

        // `lt` is allocator-newer than both `a` and `b`, so it must be
        // gone before either of them can be released. Move its value down
        // into whichever of the two is older and hand that cell back,
        // keeping the survivor the lowest-indexed of the three.
        let (keep, drop_newer) = if a < b { (a, b) } else { (b, a) };
        self.emit_move(lt, keep);
        self.release_temp(lt);
        self.release_temp(drop_newer);
        Ok(keep)
    }

    fn lt_race_round(&mut self, a: usize, b: usize, lt: usize, running: usize) -> Result<()> {
        let a_zero = self.copy_cell(a);
        self.emit_is_zero_in_place(a_zero);
        self.emit_if_else(
            a_zero,
            |s| {
                let b_zero = s.copy_cell(b);
                s.emit_is_zero_in_place(b_zero);
                s.emit_if_else(
                    b_zero,
                    |s| {
                        s.emit_zero(lt);
                        s.emit_zero(running);
                        Ok(())
                    },
                    Some(|s: &mut Self| {
                        s.emit_set_const(lt, 1);
                        s.emit_zero(running);
                        Ok(())
                    }),
                )?;
                s.release_temp(b_zero);
                Ok(())
            },
            Some(|s: &mut Self| {
                let b_zero = s.copy_cell(b);
                s.emit_is_zero_in_place(b_zero);
                s.emit_if_else(
                    b_zero,
                    |s| {
                        s.emit_zero(running);
                        Ok(())
                    },
                    Some(|s: &mut Self| {
                        s.goto(a);
                        s.emit(crate::bf::Op::Dec);
                        s.goto(b);
                        s.emit(crate::bf::Op::Dec);
                        Ok(())
                    }),
                )?;
                s.release_temp(b_zero);
                Ok(())
            }),
        )?;
        self.release_temp(a_zero);
        Ok(())
    }

    /// `l && r`, short-circuiting: `r`'s code only runs (at runtime) when
    /// `l` was truthy.
    fn emit_logical_and(&mut self, lhs: &Expr, rhs: &Expr) -> Result<usize> {
        let l = self.emit_expr(lhs)?;
        self.emit_truthy_in_place(l);
        let cond = self.copy_cell(l);
        self.emit_if_else(
            cond,
            |s| {
                let r = s.emit_expr(rhs)?;
                s.emit_truthy_in_place(r);
                s.emit_zero(l);
                s.emit_move(r, l);
                s.release_temp(r);
                Ok(())
            },
            Some(|s: &mut Self| {
                s.emit_zero(l);
                Ok(())
            }),
        )?;
        self.release_temp(cond);
        Ok(l)
    }

    fn emit_logical_or(&mut self, lhs: &Expr, rhs: &Expr) -> Result<usize> {
        let l = self.emit_expr(lhs)?;
        self.emit_truthy_in_place(l);
        let cond = self.copy_cell(l);
        self.emit_if_else(
            cond,
            |s| {
                s.emit_set_const(l, 1);
                Ok(())
            },
            Some(|s: &mut Self| {
                let r = s.emit_expr(rhs)?;
                s.emit_truthy_in_place(r);
                s.emit_zero(l);
                s.emit_move(r, l);
                s.release_temp(r);
                Ok(())
            }),
        )?;
        self.release_temp(cond);
        Ok(l)
    }

    /// Repeated-addition-with-restore multiplication template: `acc`
    /// accumulates `l` once per unit of `r`, restoring `l` from a scratch
    /// copy after each unit so it survives every iteration.
    fn emit_mul(&mut self, lhs: &Expr, rhs: &Expr) -> Result<usize> {
        let acc = self.tape.allocate_temp();
        let l = self.emit_expr(lhs)?;
        let r = self.emit_expr(rhs)?;
        let t = self.tape.allocate_temp();

        self.goto(r);
        self.emit(crate::bf::Op::LoopOpen);
        self.goto(l);
        self.emit(crate::bf::Op::LoopOpen);
        self.emit(crate::bf::Op::Dec);
        self.goto(acc);
        self.emit(crate::bf::Op::Inc);
        self.goto(t);
        self.emit(crate::bf::Op::Inc);
        self.goto(l);
        self.emit(crate::bf::Op::LoopClose);
        self.emit_move(t, l);
        self.goto(r);
        self.emit(crate::bf::Op::Dec);
        self.emit(crate::bf::Op::LoopClose);

        self.release_temp(t);
        self.release_temp(r);
        self.release_temp(l);
        Ok(acc)
    }

    /// Division and modulo by repeated subtraction, guarded by a runtime
    /// zero check that sets `div_zero_flag` and yields `(0, 0)` rather than
    /// looping the subtraction forever.
    fn emit_divmod(
        &mut self,
        lhs: &Expr,
        rhs: &Expr,
        pos: crate::error::Position,
    ) -> Result<(usize, usize)> {
        let _ = pos;
        let q = self.tape.allocate_temp();
        let num = self.emit_expr(lhs)?;
        let den = self.emit_expr(rhs)?;

        let den_nonzero = self.copy_cell(den);
        self.emit_truthy_in_place(den_nonzero);
        self.emit_if_else(
            den_nonzero,
            |s| s.emit_divmod_loop(num, den, q),
            Some(|s: &mut Self| {
                s.goto(s.div_zero_flag);
                s.emit(crate::bf::Op::Inc);
                Ok(())
            }),
        )?;
        self.release_temp(den_nonzero);

        self.release_temp(den);
        Ok((q, num))
    }

    /// Divides `num` by `den` in place: `num` ends up holding the
    /// remainder, `q` (already zeroed by the caller) accumulates the
    /// quotient. `den` is read through copies and left untouched. Shared
    /// with `printint`'s digit extraction, which divides by fixed
    /// constants and so skips the zero-divisor guard `emit_divmod` wraps
    /// this in.
    pub(super) fn emit_divmod_loop(&mut self, num: usize, den: usize, q: usize) -> Result<()> {
        let running = self.tape.allocate_temp();
        self.emit_set_const(running, 1);
        self.goto(running);
        self.emit(crate::bf::Op::LoopOpen);

        let num_copy = self.copy_cell(num);
        let den_copy = self.copy_cell(den);
        let lt = self.emit_lt(num_copy, den_copy)?;
        self.emit_not_bool_in_place(lt); // ge := num >= den
        self.emit_if_else(
            lt,
            |s| {
                let den_copy2 = s.copy_cell(den);
                s.emit_move_sub(den_copy2, num);
                s.release_temp(den_copy2);
                s.goto(q);
                s.emit(crate::bf::Op::Inc);
                Ok(())
            },
            Some(|s: &mut Self| {
                s.emit_zero(running);
                Ok(())
            }),
        )?;
        self.release_temp(lt);

        self.goto(running);
        self.emit(crate::bf::Op::LoopClose);
        self.release_temp(running);
        Ok(())
    }

    fn emit_index_expr(
        &mut self,
        base: &Expr,
        index: &Expr,
        pos: crate::error::Position,
    ) -> Result<usize> {
        let Expr::Ident(name, ident_pos) = base else {
            return Err(Error::semantic(pos, "only array variables can be indexed"));
        };
        let sym = self.scope.resolve(name, *ident_pos)?.clone();
        if !sym.is_array {
            return Err(Error::semantic(
                pos,
                format!("'{name}' is not an array"),
            ));
        }
        let len = sym.ty.size_in_cells();
        let elem0 = sym.cell + abi::ARRAY_WALK_LANE_CELLS;
        self.emit_index_read(elem0, len, index)
    }

    /// Out-of-bounds reads are defined to yield `0`: no compile-time-unrolled
    /// branch matches, so the result cell is simply never written.
    fn emit_index_read(&mut self, elem0: usize, len: usize, index: &Expr) -> Result<usize> {
        // Allocated before `idx` so it outlives it, the same "survivor
        // first" rule every multi-temp arithmetic helper follows.
        let result = self.tape.allocate_temp();
        let idx = self.emit_expr(index)?;
        for k in 0..len {
            let probe = self.copy_cell(idx);
            let k_const = self.tape.allocate_temp();
            self.emit_set_const(k_const, (k % 256) as u8);
            let is_match = self.emit_eq(probe, k_const);
            self.emit_if_else(
                is_match,
                |s| {
                    let val = s.copy_cell(elem0 + k);
                    s.emit_move(val, result);
                    s.release_temp(val);
                    Ok(())
                },
                None::<fn(&mut Self) -> Result<()>>,
            )?;
            self.release_temp(is_match);
        }
        self.release_temp(idx);
        Ok(result)
    }

    /// Out-of-bounds writes are defined to be silently dropped: `value` is
    /// unconditionally drained to zero at the end regardless of whether a
    /// slot matched, preserving the "temps are zero when idle" invariant.
    pub(super) fn emit_index_write(
        &mut self,
        elem0: usize,
        len: usize,
        index: &Expr,
        value: usize,
    ) -> Result<()> {
        let idx = self.emit_expr(index)?;
        for k in 0..len {
            let probe = self.copy_cell(idx);
            let k_const = self.tape.allocate_temp();
            self.emit_set_const(k_const, (k % 256) as u8);
            let is_match = self.emit_eq(probe, k_const);
            self.emit_if_else(
                is_match,
                |s| {
                    s.emit_zero(elem0 + k);
                    s.emit_move(value, elem0 + k);
                    Ok(())
                },
                None::<fn(&mut Self) -> Result<()>>,
            )?;
            self.release_temp(is_match);
        }
        self.emit_zero(value);
        self.release_temp(idx);
        self.release_temp(value);
        Ok(())
    }
}
