//! Expressions inside functions.

use cranelift_codegen::ir::{InstBuilder, Value};
use rain_foundation::{Error, Result};
use rain_syntax::{BinaryOp, Expr, ExprKind, UnaryOp};

use super::module::arity;
use super::{FnCtx, Lowerer};
use crate::constant::ConstBox;

/// Runtime primitive behind an arithmetic or comparison operator.
fn primitive(op: BinaryOp) -> Option<&'static str> {
    Some(match op {
        BinaryOp::Add => "rain_add",
        BinaryOp::Sub => "rain_sub",
        BinaryOp::Mul => "rain_mul",
        BinaryOp::Div => "rain_div",
        BinaryOp::Eq => "rain_eq",
        BinaryOp::Ne => "rain_ne",
        BinaryOp::Gt => "rain_gt",
        BinaryOp::Ge => "rain_ge",
        BinaryOp::Lt => "rain_lt",
        BinaryOp::Le => "rain_le",
        BinaryOp::Concat => "rain_string_concat",
        BinaryOp::Attach | BinaryOp::And | BinaryOp::Or => return None,
    })
}

impl Lowerer<'_> {
    /// Lowers an expression to a pointer to the box holding its value.
    pub(super) fn expr(&mut self, f: &mut FnCtx<'_>, expr: &Expr) -> Result<Value> {
        self.expr_kind(f, &expr.kind)
            .map_err(|err| err.at(expr.span))
    }

    fn expr_kind(&mut self, f: &mut FnCtx<'_>, expr: &ExprKind) -> Result<Value> {
        match expr {
            ExprKind::Null => self.const_cell(f, &ConstBox::null()),
            ExprKind::Int(i) => self.const_cell(f, &ConstBox::int(*i)),
            ExprKind::Float(x) => self.const_cell(f, &ConstBox::float(*x)),
            ExprKind::Bool(b) => self.const_cell(f, &ConstBox::bool(*b)),
            ExprKind::Str(text) => self.string_cell(f, text),
            ExprKind::Name(name) => {
                let place = self.resolve(name).ok_or_else(|| Error::unknown_name(name))?;
                Ok(self.place_addr(f, place))
            }
            ExprKind::Table => self.call_runtime_value(f, "rain_new_table", &[]),
            ExprKind::Array(items) => {
                let table = self.call_runtime_value(f, "rain_new_table", &[])?;
                for (index, item) in (0i64..).zip(items) {
                    let key = self.const_cell(f, &ConstBox::int(index))?;
                    let value = self.expr(f, item)?;
                    self.put_dynamic(f, table, key, value)?;
                }
                Ok(table)
            }
            ExprKind::Dict(items) => {
                let table = self.call_runtime_value(f, "rain_new_table", &[])?;
                for (key, value) in items {
                    let key = self.expr(f, key)?;
                    let value = self.expr(f, value)?;
                    self.put_dynamic(f, table, key, value)?;
                }
                Ok(table)
            }
            ExprKind::Func { params, body } => self.func_expr(f, params, body),
            ExprKind::Foreign { name, params } => {
                let arity = arity(params)?;
                let func = self.pool.foreign(self.module, name, arity)?;
                self.const_cell(f, &ConstBox::func(func, arity))
            }
            ExprKind::Call { func, args, catch } => self.call_expr(f, func, args, *catch),
            ExprKind::Method {
                recv,
                name,
                args,
                catch,
            } => self.method_expr(f, recv, name, args, *catch),
            ExprKind::Index { lhs, key } => {
                let table = self.expr(f, lhs)?;
                let key = self.expr(f, key)?;
                let ret = f.new_cell();
                self.call_runtime(f, "rain_get", &[ret, table, key])?;
                Ok(ret)
            }
            ExprKind::Unary { op, operand } => {
                let value = self.expr(f, operand)?;
                let name = match op {
                    UnaryOp::Neg => "rain_neg",
                    UnaryOp::Not => "rain_not",
                };
                let ret = f.new_cell();
                let status = self.call_runtime_value(f, name, &[ret, value])?;
                f.check_status(status, ret);
                Ok(ret)
            }
            ExprKind::Binary { op, lhs, rhs } => match op {
                BinaryOp::Attach => self.attach(f, lhs, rhs),
                BinaryOp::And | BinaryOp::Or => self.short_circuit(f, *op, lhs, rhs),
                _ => {
                    let name = primitive(*op)
                        .ok_or_else(|| Error::internal(format!("no primitive for {op}")))?;
                    let lhs = self.expr(f, lhs)?;
                    let rhs = self.expr(f, rhs)?;
                    let ret = f.new_cell();
                    let status = self.call_runtime_value(f, name, &[ret, lhs, rhs])?;
                    f.check_status(status, ret);
                    Ok(ret)
                }
            },
        }
    }

    /// `value :: env`: a copy of `value` whose environment is a fresh heap
    /// box holding `env`.
    fn attach(&mut self, f: &mut FnCtx<'_>, value: &Expr, env: &Expr) -> Result<Value> {
        let value = self.expr(f, value)?;
        let env = self.expr(f, env)?;
        let heap = self.call_runtime_value(f, "rain_box_malloc", &[])?;
        f.copy_box(env, heap);
        let ret = f.new_cell();
        f.copy_box(value, ret);
        f.store_env(ret, heap);
        Ok(ret)
    }

    /// `a & b`, `a | b`: `b` is evaluated only when `a` does not decide the
    /// result.
    fn short_circuit(
        &mut self,
        f: &mut FnCtx<'_>,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<Value> {
        let ret = f.new_cell();
        let lhs = self.expr(f, lhs)?;
        f.copy_box(lhs, ret);
        let truthy = self.truthy(f, ret)?;
        let eval_rhs = f.b.create_block();
        let merge = f.b.create_block();
        if op == BinaryOp::And {
            f.b.ins().brif(truthy, eval_rhs, &[], merge, &[]);
        } else {
            f.b.ins().brif(truthy, merge, &[], eval_rhs, &[]);
        }
        f.b.switch_to_block(eval_rhs);
        let rhs = self.expr(f, rhs)?;
        f.copy_box(rhs, ret);
        f.jump_to(merge);
        Ok(ret)
    }
}
