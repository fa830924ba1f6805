//! Statements inside functions.

use rain_foundation::{Error, ErrorKind, Result, Span};
use rain_syntax::{Binding, Block, Expr, ExprKind, Stmt, StmtKind};

use super::module::stmt_name;
use super::{FnCtx, Lowerer};
use crate::scope::{BindState, LocalStorage};

impl Lowerer<'_> {
    pub(super) fn block(&mut self, f: &mut FnCtx<'_>, block: &Block) -> Result<()> {
        for stmt in &block.stmts {
            self.stmt(f, stmt).map_err(|err| err.at(stmt.span))?;
        }
        Ok(())
    }

    fn stmt(&mut self, f: &mut FnCtx<'_>, stmt: &Stmt) -> Result<()> {
        match &stmt.kind {
            StmtKind::Assign {
                target,
                value,
                binding,
            } => self.local_assign(f, target, value, *binding),
            StmtKind::If { pred, body, els } => self.if_stmt(f, pred, body, els.as_ref()),
            StmtKind::Catch { name, body } => self.catch_stmt(f, name, body),
            StmtKind::For { names, gens, body } => self.for_stmt(f, names, gens, body),
            StmtKind::With { func, params, body } => self.with_stmt(f, func, params, body),
            StmtKind::While { pred, body } => self.while_stmt(f, pred, body, true),
            StmtKind::Until { pred, body } => self.while_stmt(f, pred, body, false),
            StmtKind::Loop { body } => self.loop_stmt(f, body),
            StmtKind::Break(cond) => self.break_stmt(f, cond.as_ref(), true),
            StmtKind::Continue(cond) => self.break_stmt(f, cond.as_ref(), false),
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    let value = self.expr(f, value)?;
                    let ret = f.ret;
                    f.copy_box(value, ret);
                }
                f.return_status(0);
                f.unreachable_tail();
                Ok(())
            }
            StmtKind::Save(value) => {
                let value = self.expr(f, value)?;
                let ret = f.ret;
                f.copy_box(value, ret);
                Ok(())
            }
            StmtKind::Expr(expr) => self.expr(f, expr).map(drop),
            StmtKind::Block(block) => self.block(f, block),
            StmtKind::Macro(_) | StmtKind::Pass => Ok(()),
            StmtKind::Error(_) | StmtKind::Warning(_) | StmtKind::Hint(_) => {
                self.advisory(&stmt.kind, stmt.span)
            }
            other @ (StmtKind::ExportForeign { .. }
            | StmtKind::Import { .. }
            | StmtKind::Link(_)
            | StmtKind::Library(_)) => Err(Error::invalid_scope(format!(
                "{} is only allowed at module scope",
                stmt_name(other)
            ))),
        }
    }

    fn local_assign(
        &mut self,
        f: &mut FnCtx<'_>,
        target: &Expr,
        value: &Expr,
        binding: Binding,
    ) -> Result<()> {
        match (&target.kind, binding) {
            (ExprKind::Name(name), Binding::Let) => {
                let slot = f.local_slot();
                let cell = f.slot_addr(slot);
                f.store_null(cell);
                self.scopes
                    .declare(name, LocalStorage::Slot(slot), BindState::Reserved);
                let value = self.expr(f, value)?;
                self.scopes.mark_bound(name);
                let cell = f.slot_addr(slot);
                f.copy_box(value, cell);
                Ok(())
            }
            (ExprKind::Name(name), Binding::Assign) => {
                let value = self.expr(f, value)?;
                let place = self
                    .resolve(name)
                    .ok_or_else(|| Error::new(ErrorKind::UndeclaredName(name.clone())))?;
                let cell = self.place_addr(f, place);
                f.copy_box(value, cell);
                Ok(())
            }
            (ExprKind::Name(_), Binding::Export) => Err(Error::invalid_scope(
                "exports are only allowed at module scope",
            )),
            (ExprKind::Index { lhs, key }, Binding::Assign) => {
                let table = self.expr(f, lhs)?;
                let key = self.expr(f, key)?;
                let value = self.expr(f, value)?;
                self.put_dynamic(f, table, key, value)
            }
            _ => Err(Error::invalid_scope("can't assign to this expression")),
        }
    }

    /// `error` aborts compilation; `warning` and `hint` are recorded.
    pub(super) fn advisory(&mut self, stmt: &StmtKind, span: Span) -> Result<()> {
        match stmt {
            StmtKind::Error(message) => Err(Error::new(ErrorKind::UserError(message.clone()))),
            StmtKind::Warning(message) => {
                self.diagnostics
                    .warning(message.clone(), Some(self.unit), span);
                Ok(())
            }
            StmtKind::Hint(message) => {
                self.diagnostics.hint(message.clone(), Some(self.unit), span);
                Ok(())
            }
            other => Err(Error::internal(format!(
                "{} is not an advisory statement",
                stmt_name(other)
            ))),
        }
    }
}
