//! Function-call lowering (F): strict inlining.
//!
//! The chosen recursion strategy rejects direct and mutual recursion
//! outright rather than attempting a runtime call stack (the tape machine
//! has none), so every call site's callee body is spliced in place. Because
//! the whole program shares one [`super::Emitter`] — one instruction
//! buffer, one tape allocator, one scope table — a callee's "frame" is
//! simply a nested tape-allocator scope entered at the call site, which is
//! exactly the "frame is a suffix of the caller's tape region" placement
//! the calling convention calls for, with no separate base-address
//! bookkeeping needed.

use crate::abi;
use crate::ast::Expr;
use crate::error::{Error, Position, Result};

use super::Emitter;

impl<'f> Emitter<'f> {
    /// Lowers a call expression, builtins included, to a cell holding the
    /// callee's return value (always present, even for `void` functions,
    /// where it is simply never read).
    pub(super) fn emit_call_expr(&mut self, name: &str, args: &[Expr], pos: Position) -> Result<usize> {
        if let Some(result) = self.try_emit_builtin(name, args, pos)? {
            return Ok(result);
        }

        let info = self
            .functions
            .get(name)
            .cloned()
            .ok_or_else(|| Error::semantic(pos, format!("call to undeclared function '{name}'")))?;

        if self.is_calling(name) {
            return Err(Error::semantic(
                pos,
                format!(
                    "'{name}' calls itself (directly or through another function); \
                     recursion is not supported because calls are lowered by inlining"
                ),
            ));
        }
        if self.call_depth() >= abi::MAX_INLINE_DEPTH {
            return Err(Error::semantic(
                pos,
                format!(
                    "call chain through '{name}' exceeds the maximum inline depth of {}",
                    abi::MAX_INLINE_DEPTH
                ),
            ));
        }
        if args.len() != info.params.len() {
            return Err(Error::semantic(
                pos,
                format!(
                    "'{name}' expects {} argument(s), got {}",
                    info.params.len(),
                    args.len()
                ),
            ));
        }

        // Arguments are evaluated in the caller's scope, left to right,
        // before the callee's frame is opened.
        let mut arg_cells = Vec::with_capacity(args.len());
        for arg in args {
            arg_cells.push(self.emit_expr(arg)?);
        }

        // Allocated before the callee's scope opens so it survives the
        // scope's exit, the same "allocate the survivor first" trick the
        // expression emitter uses for binary-operator results.
        let result = self.tape.allocate_temp();

        self.scope.enter();
        self.tape.enter_scope();
        self.enter_call(name);

        let frame = self.tape.allocate_named(abi::FIRST_PARAM);
        self.emit_set_const(frame + abi::RETURN_FLAG, 1);
        self.emit_zero(frame + abi::RETURN_VALUE);
        self.push_return_flag(frame);

        for (param, arg_cell) in info.params.iter().zip(arg_cells.into_iter()) {
            let param_cell = self.declare_local(&param.name, param.ty, info.pos, true)?;
            self.emit_zero(param_cell);
            self.emit_move(arg_cell, param_cell);
            self.release_temp(arg_cell);
        }

        self.emit_stmt_seq(&info.body)?;

        self.emit_move(frame + abi::RETURN_VALUE, result);
        self.emit_zero(frame + abi::RETURN_FLAG);

        self.pop_return_flag();
        self.exit_call();
        let released = self.tape.exit_scope();
        self.scope.exit();
        for cell in released {
            self.emit_zero(cell);
        }

        Ok(result)
    }
}
