//! The statement and control emitter (C).
//!
//! Every compound statement follows the same shape: enter a scope, emit
//! the body via [`super::Emitter::emit_stmt_seq`] so `break`/`return`
//! short-circuit correctly, then exit the scope and zero whatever cells it
//! held. Loops additionally fold their own `running_flag` into the
//! re-evaluated condition each pass, per the guard-flag envelope every
//! loop is wrapped in.

use super::Emitter;
use crate::abi;
use crate::ast::{Expr, Stmt, SwitchCase};
use crate::bf::Op;
use crate::error::{Error, Position, Result};

impl<'f> Emitter<'f> {
    pub fn emit_stmt(&mut self, stmt: &Stmt) -> Result<()> {
        match stmt {
            Stmt::Block(stmts) => self.emit_block(stmts),
            Stmt::VarDecl { name, ty, init, pos } => self.emit_var_decl(name, *ty, init, *pos),
            Stmt::Assign { target, value, pos } => self.emit_assign(target, value, *pos),
            Stmt::If { cond, then_branch, else_branch, .. } => {
                self.emit_if(cond, then_branch, else_branch.as_deref())
            }
            Stmt::While { cond, body, .. } => self.emit_while(cond, body),
            Stmt::For { init, cond, step, body, pos } => {
                self.emit_for(init.as_deref(), cond.as_ref(), step.as_deref(), body, *pos)
            }
            Stmt::Switch { scrutinee, cases, .. } => self.emit_switch(scrutinee, cases),
            Stmt::Break(pos) => {
                let running = self.innermost_running_flag(*pos)?;
                self.emit_zero(running);
                Ok(())
            }
            Stmt::Return(value, pos) => self.emit_return(value.as_ref(), *pos),
            Stmt::ExprStmt(expr) => {
                let v = self.emit_expr(expr)?;
                self.emit_zero(v);
                self.release_temp(v);
                Ok(())
            }
        }
    }

    fn emit_block(&mut self, stmts: &[Stmt]) -> Result<()> {
        self.scope.enter();
        self.tape.enter_scope();
        let result = self.emit_stmt_seq(stmts);
        let released = self.tape.exit_scope();
        self.scope.exit();
        for cell in released {
            self.emit_zero(cell);
        }
        result
    }

    fn emit_var_decl(
        &mut self,
        name: &str,
        ty: crate::ast::Type,
        init: &Option<Expr>,
        pos: Position,
    ) -> Result<()> {
        let cell = self.declare_local(name, ty, pos, false)?;
        match init {
            Some(_) if matches!(ty, crate::ast::Type::Array(..)) => Err(Error::semantic(
                pos,
                "local arrays cannot have an initializer",
            )),
            Some(expr) => self.emit_expr_into(cell, expr),
            None => Ok(()),
        }
    }

    fn emit_assign(&mut self, target: &Expr, value: &Expr, pos: Position) -> Result<()> {
        match target {
            Expr::Ident(name, ident_pos) => {
                let sym = self.scope.resolve(name, *ident_pos)?.clone();
                if sym.is_array {
                    return Err(Error::semantic(
                        pos,
                        format!("'{name}' is an array; assign to an element instead"),
                    ));
                }
                self.emit_expr_into(sym.cell, value)
            }
            Expr::Index(base, index, _) => {
                let Expr::Ident(name, ident_pos) = base.as_ref() else {
                    return Err(Error::semantic(pos, "only array variables can be indexed"));
                };
                let sym = self.scope.resolve(name, *ident_pos)?.clone();
                if !sym.is_array {
                    return Err(Error::semantic(pos, format!("'{name}' is not an array")));
                }
                let len = sym.ty.size_in_cells();
                let elem0 = sym.cell + abi::ARRAY_WALK_LANE_CELLS;
                let v = self.emit_expr(value)?;
                self.emit_index_write(elem0, len, index, v)
            }
            _ => Err(Error::semantic(pos, "invalid assignment target")),
        }
    }

    fn emit_if(&mut self, cond: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) -> Result<()> {
        let c = self.emit_expr(cond)?;
        self.emit_truthy_in_place(c);
        if let Some(else_branch) = else_branch {
            self.emit_if_else(
                c,
                |s| s.emit_stmt(then_branch),
                Some(|s: &mut Self| s.emit_stmt(else_branch)),
            )?;
        } else {
            self.emit_if_else(c, |s| s.emit_stmt(then_branch), None::<fn(&mut Self) -> Result<()>>)?;
        }
        self.release_temp(c);
        Ok(())
    }

    fn emit_while(&mut self, cond: &Expr, body: &Stmt) -> Result<()> {
        let running = self.tape.allocate_temp();
        self.emit_set_const(running, 1);
        let guard = self.tape.allocate_temp();

        self.emit_expr_into(guard, cond)?;
        self.emit_truthy_in_place(guard);
        self.and_in_place(guard, running)?;

        self.goto(guard);
        self.emit(Op::LoopOpen);
        self.push_loop(running);
        self.emit_stmt(body)?;
        self.pop_loop();
        self.emit_expr_into(guard, cond)?;
        self.emit_truthy_in_place(guard);
        self.and_in_place(guard, running)?;
        self.goto(guard);
        self.emit(Op::LoopClose);

        self.release_temp(guard);
        self.release_temp(running);
        Ok(())
    }

    fn emit_for(
        &mut self,
        init: Option<&Stmt>,
        cond: Option<&Expr>,
        step: Option<&Stmt>,
        body: &Stmt,
        pos: Position,
    ) -> Result<()> {
        self.scope.enter();
        self.tape.enter_scope();

        if let Some(init) = init {
            self.emit_stmt(init)?;
        }
        let always_true = Expr::BoolLit(true, pos);
        let cond = cond.unwrap_or(&always_true);

        let mut body_stmts = vec![body.clone()];
        if let Some(step) = step {
            body_stmts.push(step.clone());
        }
        let combined_body = Stmt::Block(body_stmts);
        let result = self.emit_while(cond, &combined_body);

        let released = self.tape.exit_scope();
        self.scope.exit();
        for cell in released {
            self.emit_zero(cell);
        }
        result
    }

    fn emit_switch(&mut self, scrutinee: &Expr, cases: &[SwitchCase]) -> Result<()> {
        let scrutinee_cell = self.emit_expr(scrutinee)?;
        let broken = self.tape.allocate_temp();
        self.emit_set_const(broken, 1);
        let matched = self.tape.allocate_temp();
        self.emit_set_const(matched, 0);

        self.push_loop(broken);
        for case in cases.iter().filter(|c| c.value.is_some()) {
            let label = case.value.expect("filtered to Some above");
            let probe = self.copy_cell(scrutinee_cell);
            let k_const = self.tape.allocate_temp();
            self.emit_set_const(k_const, label.rem_euclid(256) as u8);
            let is_match = self.emit_eq(probe, k_const);
            self.emit_if_else(
                is_match,
                |s| {
                    s.emit_set_const(matched, 1);
                    s.emit_stmt_seq(&case.body)
                },
                None::<fn(&mut Self) -> Result<()>>,
            )?;
            self.release_temp(is_match);
        }
        if let Some(default_case) = cases.iter().find(|c| c.value.is_none()) {
            let not_matched = self.copy_cell(matched);
            self.emit_not_bool_in_place(not_matched);
            self.emit_if_else(
                not_matched,
                |s| s.emit_stmt_seq(&default_case.body),
                None::<fn(&mut Self) -> Result<()>>,
            )?;
            self.release_temp(not_matched);
        }
        self.pop_loop();

        self.release_temp(matched);
        self.emit_zero(broken);
        self.release_temp(broken);
        self.emit_zero(scrutinee_cell);
        self.release_temp(scrutinee_cell);
        Ok(())
    }

    fn emit_return(&mut self, value: Option<&Expr>, pos: Position) -> Result<()> {
        let rf = self
            .current_return_flag()
            .ok_or_else(|| Error::semantic(pos, "'return' outside a function"))?;
        if let Some(expr) = value {
            self.emit_expr_into(rf + abi::RETURN_VALUE, expr)?;
        }
        self.emit_zero(rf);
        Ok(())
    }
}
