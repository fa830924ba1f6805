//! Branches, loops and exception handlers.

use cranelift_codegen::ir::{InstBuilder, types};
use rain_foundation::{Error, ErrorKind, Result};
use rain_syntax::{Block, Expr};

use super::frame::{Handler, LoopTargets};
use super::{FnCtx, Lowerer};
use crate::scope::{BindState, LocalStorage};

impl Lowerer<'_> {
    pub(super) fn if_stmt(
        &mut self,
        f: &mut FnCtx<'_>,
        pred: &Expr,
        body: &Block,
        els: Option<&Block>,
    ) -> Result<()> {
        let pred = self.expr(f, pred)?;
        let truthy = self.truthy(f, pred)?;
        let then = f.b.create_block();
        let merge = f.b.create_block();
        let other = if els.is_some() {
            f.b.create_block()
        } else {
            merge
        };
        f.b.ins().brif(truthy, then, &[], other, &[]);

        f.b.switch_to_block(then);
        self.block(f, body)?;
        f.b.ins().jump(merge, &[]);
        if let Some(els) = els {
            f.b.switch_to_block(other);
            self.block(f, els)?;
            f.b.ins().jump(merge, &[]);
        }
        f.b.switch_to_block(merge);
        Ok(())
    }

    /// `while` runs the body while the predicate is truthy; `until` while
    /// it is not.
    pub(super) fn while_stmt(
        &mut self,
        f: &mut FnCtx<'_>,
        pred: &Expr,
        body: &Block,
        run_while_truthy: bool,
    ) -> Result<()> {
        let before = f.b.create_block();
        let inner = f.b.create_block();
        let after = f.b.create_block();
        f.jump_to(before);
        let pred = self.expr(f, pred)?;
        let truthy = self.truthy(f, pred)?;
        if run_while_truthy {
            f.b.ins().brif(truthy, inner, &[], after, &[]);
        } else {
            f.b.ins().brif(truthy, after, &[], inner, &[]);
        }
        f.b.switch_to_block(inner);
        self.loop_body(f, body, LoopTargets { before, after })
    }

    pub(super) fn loop_stmt(&mut self, f: &mut FnCtx<'_>, body: &Block) -> Result<()> {
        let before = f.b.create_block();
        let after = f.b.create_block();
        f.jump_to(before);
        self.loop_body(f, body, LoopTargets { before, after })
    }

    /// Lowers a loop body, jumps back to `before` and continues after the
    /// loop.
    fn loop_body(&mut self, f: &mut FnCtx<'_>, body: &Block, targets: LoopTargets) -> Result<()> {
        f.loops.push(targets);
        let lowered = self.block(f, body);
        f.loops.pop();
        lowered?;
        f.b.ins().jump(targets.before, &[]);
        f.b.switch_to_block(targets.after);
        Ok(())
    }

    /// `break`/`continue`, optionally guarded by a condition.
    pub(super) fn break_stmt(
        &mut self,
        f: &mut FnCtx<'_>,
        cond: Option<&Expr>,
        exit: bool,
    ) -> Result<()> {
        let Some(targets) = f.loops.last().copied() else {
            let keyword = if exit { "break" } else { "continue" };
            return Err(Error::invalid_scope(format!("{keyword} outside a loop")));
        };
        let target = if exit { targets.after } else { targets.before };
        match cond {
            Some(cond) => {
                let cond = self.expr(f, cond)?;
                let truthy = self.truthy(f, cond)?;
                let next = f.b.create_block();
                f.b.ins().brif(truthy, target, &[], next, &[]);
                f.b.switch_to_block(next);
            }
            None => {
                f.b.ins().jump(target, &[]);
                f.unreachable_tail();
            }
        }
        Ok(())
    }

    /// `for names in gens`: every iteration resets each variable to null (or
    /// its generator's environment), calls the generators in order, and
    /// leaves the loop at the first null result.
    pub(super) fn for_stmt(
        &mut self,
        f: &mut FnCtx<'_>,
        names: &[String],
        gens: &[Expr],
        body: &Block,
    ) -> Result<()> {
        if names.len() != gens.len() {
            return Err(Error::new(ErrorKind::ForArity {
                names: names.len(),
                funcs: gens.len(),
            }));
        }
        let mut funcs = Vec::with_capacity(gens.len());
        for generator in gens {
            let func = self.expr(f, generator)?;
            let exc = f.new_cell();
            let zero = f.b.ins().iconst(types::I32, 0);
            let status = self.call_runtime_value(f, "rain_check_callable", &[exc, func, zero])?;
            f.check_status(status, exc);
            funcs.push(func);
        }
        let mut slots = Vec::with_capacity(names.len());
        for name in names {
            let slot = f.local_slot();
            self.scopes
                .declare(name, LocalStorage::Slot(slot), BindState::Bound);
            slots.push(slot);
        }

        let before = f.b.create_block();
        let after = f.b.create_block();
        f.jump_to(before);
        for (&slot, &func) in slots.iter().zip(&funcs) {
            let cell = f.slot_addr(slot);
            f.store_null(cell);
            f.inject_env(func, cell);
        }
        for (&slot, &func) in slots.iter().zip(&funcs) {
            let cell = f.slot_addr(slot);
            let code = f.load_data(func);
            let sig = f.sig_ref(&*self.module, 0);
            let call = f.b.ins().call_indirect(sig, code, &[cell]);
            let status = f.b.inst_results(call)[0];
            f.check_status(status, cell);
            let tag = f.load_tag(cell);
            let next = f.b.create_block();
            f.b.ins().brif(tag, next, &[], after, &[]);
            f.b.switch_to_block(next);
        }
        self.loop_body(f, body, LoopTargets { before, after })
    }

    /// `catch name` + block: `name` starts as null and receives any
    /// exception raised in the block, after which control continues past the
    /// block.
    pub(super) fn catch_stmt(&mut self, f: &mut FnCtx<'_>, name: &str, body: &Block) -> Result<()> {
        let slot = f.local_slot();
        let cell = f.slot_addr(slot);
        f.store_null(cell);
        self.scopes
            .declare(name, LocalStorage::Slot(slot), BindState::Bound);
        let end = f.b.create_block();
        f.handlers.push(Handler { slot, target: end });
        let lowered = self.block(f, body);
        f.handlers.pop();
        lowered?;
        f.jump_to(end);
        Ok(())
    }
}
