//! The three library routines the language ships with: `print`, `printint`,
//! `readint`. These are recognized by name ahead of the user function table
//! rather than declared anywhere, and are lowered as pre-built code
//! templates under the same tape discipline as everything else — there is
//! no separate "builtin calling convention."

use crate::ast::Expr;
use crate::bf::Op;
use crate::error::{Error, Position, Result};

use super::Emitter;

const ASCII_ZERO: u8 = b'0';
const ASCII_NINE: u8 = b'9';

impl<'f> Emitter<'f> {
    /// Returns `Ok(Some(cell))` if `name` is a recognized builtin and the
    /// call was lowered, `Ok(None)` if `name` isn't a builtin (the caller
    /// should fall through to the user function table).
    pub(super) fn try_emit_builtin(
        &mut self,
        name: &str,
        args: &[Expr],
        pos: Position,
    ) -> Result<Option<usize>> {
        match name {
            "print" => self.emit_print(args, pos).map(Some),
            "printint" => self.emit_printint(args, pos).map(Some),
            "readint" => self.emit_readint(args, pos).map(Some),
            _ => Ok(None),
        }
    }

    /// `print(s)`: `s` must be a string literal, lowered to `+…+.` per
    /// character with no cell ever holding the string. The call has no
    /// useful value; like any other call it still returns a cell, here a
    /// freshly zeroed one.
    fn emit_print(&mut self, args: &[Expr], pos: Position) -> Result<usize> {
        let [arg] = args else {
            return Err(Error::semantic(pos, "print() takes exactly one argument"));
        };
        let Expr::StringLit(text, _) = arg else {
            return Err(Error::semantic(
                pos,
                "print() requires a string literal argument",
            ));
        };

        let scratch = self.tape.allocate_temp();
        self.emit_set_const(scratch, 0);
        let mut current: u8 = 0;
        for &byte in text.as_bytes() {
            let delta = byte.wrapping_sub(current);
            self.goto(scratch);
            if delta <= 128 {
                self.emit_n(Op::Inc, delta as usize);
            } else {
                self.emit_n(Op::Dec, 256 - delta as usize);
            }
            self.emit(Op::Output);
            current = byte;
        }
        self.emit_zero(scratch);
        self.release_temp(scratch);

        let result = self.tape.allocate_temp();
        self.emit_set_const(result, 0);
        Ok(result)
    }

    /// `printint(e)`: prints the decimal digits of `e mod 256` with no
    /// leading zeros (`0` itself still prints as `0`).
    fn emit_printint(&mut self, args: &[Expr], pos: Position) -> Result<usize> {
        let [arg] = args else {
            return Err(Error::semantic(pos, "printint() takes exactly one argument"));
        };
        let value = self.emit_expr(arg)?;

        let hundreds = self.tape.allocate_temp();
        self.emit_set_const(hundreds, 0);
        let hundred_const = self.tape.allocate_temp();
        self.emit_set_const(hundred_const, 100);
        self.emit_divmod_loop(value, hundred_const, hundreds)?;
        self.release_temp(hundred_const);

        let tens = self.tape.allocate_temp();
        self.emit_set_const(tens, 0);
        let ten_const = self.tape.allocate_temp();
        self.emit_set_const(ten_const, 10);
        self.emit_divmod_loop(value, ten_const, tens)?;
        self.release_temp(ten_const);

        // `value` now holds the ones digit.
        let printed_any = self.tape.allocate_temp();
        self.emit_set_const(printed_any, 0);

        self.emit_print_digit_conditional(hundreds, printed_any)?;
        self.emit_print_digit_conditional(tens, printed_any)?;
        self.emit_print_digit_raw(value);

        self.release_temp(printed_any);
        self.release_temp(tens);
        self.release_temp(hundreds);

        Ok(value)
    }

    /// Prints `digit` (0-9) as its ASCII character, unconditionally,
    /// through a disposable copy so `digit` itself is left untouched.
    fn emit_print_digit_raw(&mut self, digit: usize) {
        let c = self.copy_cell(digit);
        self.goto(c);
        self.emit_n(Op::Inc, ASCII_ZERO as usize);
        self.emit(Op::Output);
        self.emit_zero(c);
        self.release_temp(c);
    }

    /// Prints `digit` only if it is nonzero or a more significant digit
    /// has already been printed (`printed_any`), and sets `printed_any`
    /// when it does — the leading-zero suppression rule.
    fn emit_print_digit_conditional(&mut self, digit: usize, printed_any: usize) -> Result<()> {
        let show = self.copy_cell(digit);
        self.emit_truthy_in_place(show);
        let already = self.copy_cell(printed_any);
        self.emit_if_else(
            already,
            |s| {
                s.emit_set_const(show, 1);
                Ok(())
            },
            None::<fn(&mut Self) -> Result<()>>,
        )?;
        self.release_temp(already);

        self.emit_if_else(
            show,
            |s| {
                s.emit_print_digit_raw(digit);
                s.emit_set_const(printed_any, 1);
                Ok(())
            },
            None::<fn(&mut Self) -> Result<()>>,
        )?;
        self.release_temp(show);
        Ok(())
    }

    /// `readint()`: reads ASCII decimal digits from stdin until a
    /// non-digit or end of input, accumulating `n = n*10 + digit`. No
    /// digits read at all yields `0`.
    fn emit_readint(&mut self, args: &[Expr], pos: Position) -> Result<usize> {
        if !args.is_empty() {
            return Err(Error::semantic(pos, "readint() takes no arguments"));
        }

        let total = self.tape.allocate_temp();
        self.emit_set_const(total, 0);

        let digit = self.tape.allocate_temp();
        let reading = self.tape.allocate_temp();
        self.emit_set_const(reading, 1);

        self.goto(reading);
        self.emit(Op::LoopOpen);
        self.emit_zero(digit);
        self.goto(digit);
        self.emit(Op::Input);

        let is_digit = self.emit_ascii_digit_check(digit);
        self.emit_if_else(
            is_digit,
            |s| {
                let ten = s.tape.allocate_temp();
                s.emit_set_const(ten, 10);
                s.emit_mul_in_place(total, ten)?;
                s.release_temp(ten);

                let offset = s.copy_cell(digit);
                let zero_ascii = s.tape.allocate_temp();
                s.emit_set_const(zero_ascii, ASCII_ZERO);
                s.emit_move_sub(zero_ascii, offset);
                s.release_temp(zero_ascii);
                s.emit_move(offset, total);
                s.release_temp(offset);
                Ok(())
            },
            Some(|s: &mut Self| {
                s.emit_zero(reading);
                Ok(())
            }),
        )?;
        self.release_temp(is_digit);

        self.goto(reading);
        self.emit(Op::LoopClose);

        self.release_temp(reading);
        self.release_temp(digit);

        Ok(total)
    }

    /// `target := ASCII_ZERO <= digit <= ASCII_NINE`, consuming nothing.
    fn emit_ascii_digit_check(&mut self, digit: usize) -> usize {
        let ge_zero = {
            let a = self.copy_cell(digit);
            let b = self.tape.allocate_temp();
            self.emit_set_const(b, ASCII_ZERO);
            let lt = self.emit_lt(a, b).expect("emit_lt is infallible here");
            self.emit_not_bool_in_place(lt);
            lt
        };
        let le_nine = {
            let a = self.tape.allocate_temp();
            self.emit_set_const(a, ASCII_NINE);
            let b = self.copy_cell(digit);
            let lt = self.emit_lt(a, b).expect("emit_lt is infallible here");
            self.emit_not_bool_in_place(lt);
            lt
        };
        self.and_in_place(ge_zero, le_nine)
            .expect("and_in_place is infallible");
        self.release_temp(le_nine);
        ge_zero
    }

    /// `target := target * factor` in place, via the repeated-addition
    /// template: `factor` is consumed, `target` is overwritten with the
    /// product.
    fn emit_mul_in_place(&mut self, target: usize, factor: usize) -> Result<()> {
        let acc = self.tape.allocate_temp();
        self.emit_set_const(acc, 0);
        let t = self.tape.allocate_temp();

        self.goto(factor);
        self.emit(Op::LoopOpen);
        self.goto(target);
        self.emit(Op::LoopOpen);
        self.emit(Op::Dec);
        self.goto(acc);
        self.emit(Op::Inc);
        self.goto(t);
        self.emit(Op::Inc);
        self.goto(target);
        self.emit(Op::LoopClose);
        self.emit_move(t, target);
        self.goto(factor);
        self.emit(Op::Dec);
        self.emit(Op::LoopClose);

        self.release_temp(t);
        self.emit_zero(target);
        self.emit_move(acc, target);
        self.release_temp(acc);
        Ok(())
    }
}
