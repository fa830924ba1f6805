//! Function literals, closures and calls.

use cranelift_codegen::Context;
use cranelift_codegen::ir::{Function, InstBuilder, UserFuncName, Value, types};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::FuncId;
use rain_foundation::abi::BOX_SIZE;
use rain_foundation::{Error, Result};
use rain_syntax::{Block, Expr};

use super::module::arity;
use super::{FnCtx, Lowerer, Place};
use crate::constant::ConstBox;
use crate::runtime::box_signature;
use crate::scope::{BindState, LocalStorage, free_variables, local_bindings};

impl Lowerer<'_> {
    /// Lowers a function literal into its own Cranelift function. Returns
    /// the function and the names it captures from enclosing functions.
    pub(super) fn lower_function(
        &mut self,
        params: &[String],
        body: &Block,
    ) -> Result<(FuncId, Vec<String>)> {
        let scopes = &self.scopes;
        let captures = free_variables(params, body, &|name| scopes.in_enclosing_function(name));
        let sig = box_signature(&*self.module, arity(params)?);
        let id = self
            .module
            .declare_anonymous_function(&sig)
            .map_err(Error::codegen)?;
        tracing::trace!(
            target: "rain::codegen",
            func = id.as_u32(),
            params = params.len(),
            captures = captures.len(),
            "lowering function"
        );

        let mut func = Function::with_name_signature(UserFuncName::user(0, id.as_u32()), sig);
        let mut builder_ctx = FunctionBuilderContext::new();
        let mut b = FunctionBuilder::new(&mut func, &mut builder_ctx);
        let entry = b.create_block();
        b.append_block_params_for_function_params(entry);
        b.switch_to_block(entry);
        let cells = b.block_params(entry).to_vec();
        let mut f = FnCtx::new(b, cells[0], self.ptr());
        f.reserve_locals(local_bindings(body));

        self.scopes.push_scope();
        let lowered = self.function_body(&mut f, &captures, params, &cells[1..], body);
        self.scopes.pop_scope();
        lowered?;

        f.return_status(0);
        f.b.seal_all_blocks();
        f.b.finalize();
        let mut ctx = Context::for_function(func);
        self.module
            .define_function(id, &mut ctx)
            .map_err(|err| Error::codegen(format!("{err:?}")))?;
        Ok((id, captures))
    }

    fn function_body(
        &mut self,
        f: &mut FnCtx<'_>,
        captures: &[String],
        params: &[String],
        cells: &[Value],
        body: &Block,
    ) -> Result<()> {
        if !captures.is_empty() {
            // The caller copied the environment table into the result cell.
            let env = f.ret;
            for name in captures {
                let key = self.string_cell(f, name)?;
                let slot = self.call_runtime_value(f, "rain_get_ptr", &[env, key])?;
                self.scopes
                    .declare(name, LocalStorage::Ptr(slot), BindState::Bound);
            }
            f.store_null(env);
        }
        for (name, &cell) in params.iter().zip(cells) {
            self.scopes
                .declare(name, LocalStorage::Ptr(cell), BindState::Bound);
        }
        self.block(f, body)
    }

    /// A function literal inside a function: the function box, with an
    /// environment table when it captures anything.
    pub(super) fn func_expr(
        &mut self,
        f: &mut FnCtx<'_>,
        params: &[String],
        body: &Block,
    ) -> Result<Value> {
        let (id, captures) = self.lower_function(params, body)?;
        let cell = self.const_cell(f, &ConstBox::func(id, arity(params)?))?;
        if captures.is_empty() {
            return Ok(cell);
        }
        let env = self.call_runtime_value(f, "rain_new_table", &[])?;
        f.store_env(cell, env);
        for name in &captures {
            let value = match self.resolve(name) {
                Some(Place::Local(_, BindState::Reserved)) => cell,
                Some(place) => self.place_addr(f, place),
                None => return Err(Error::unknown_name(name)),
            };
            let key = self.string_cell(f, name)?;
            self.put_dynamic(f, env, key, value)?;
        }
        Ok(cell)
    }

    /// Calls the function box at `func` with argument cells `args`.
    ///
    /// The callable guard runs first and always propagates. With `catch`, a
    /// raised exception becomes the result instead of unwinding.
    pub(super) fn call_cells(
        &mut self,
        f: &mut FnCtx<'_>,
        func: Value,
        args: &[Value],
        catch: bool,
    ) -> Result<Value> {
        let nargs = arity_of(args.len())?;
        let exc = f.new_cell();
        let expected = f.b.ins().iconst(types::I32, i64::from(nargs));
        let status = self.call_runtime_value(f, "rain_check_callable", &[exc, func, expected])?;
        f.check_status(status, exc);

        let slot = f.new_slot(BOX_SIZE * (nargs + 1));
        let ret = f.slot_addr(slot);
        f.store_null(ret);
        f.inject_env(func, ret);
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(ret);
        for (index, &arg) in (1i64..).zip(args) {
            let cell = f.b.ins().iadd_imm(ret, index * i64::from(BOX_SIZE));
            f.copy_box(arg, cell);
            params.push(cell);
        }

        let code = f.load_data(func);
        let sig = f.sig_ref(&*self.module, nargs);
        let call = f.b.ins().call_indirect(sig, code, &params);
        let status = f.b.inst_results(call)[0];
        if !catch {
            f.check_status(status, ret);
        }
        Ok(ret)
    }

    pub(super) fn call_expr(
        &mut self,
        f: &mut FnCtx<'_>,
        func: &Expr,
        args: &[Expr],
        catch: bool,
    ) -> Result<Value> {
        let callee = self.expr(f, func)?;
        let args = self.exprs(f, args)?;
        self.call_cells(f, callee, &args, catch)
    }

    /// `recv:name(args)`: looks `name` up in the receiver and passes the
    /// receiver first.
    pub(super) fn method_expr(
        &mut self,
        f: &mut FnCtx<'_>,
        recv: &Expr,
        name: &str,
        args: &[Expr],
        catch: bool,
    ) -> Result<Value> {
        let recv = self.expr(f, recv)?;
        let key = self.string_cell(f, name)?;
        let method = f.new_cell();
        self.call_runtime(f, "rain_get", &[method, recv, key])?;
        let mut cells = vec![recv];
        cells.extend(self.exprs(f, args)?);
        self.call_cells(f, method, &cells, catch)
    }

    /// `with func as params` + block: calls `func` with the block as a
    /// function.
    pub(super) fn with_stmt(
        &mut self,
        f: &mut FnCtx<'_>,
        func: &Expr,
        params: &[String],
        body: &Block,
    ) -> Result<()> {
        let callee = self.expr(f, func)?;
        let block = self.func_expr(f, params, body)?;
        self.call_cells(f, callee, &[block], false).map(drop)
    }

    fn exprs(&mut self, f: &mut FnCtx<'_>, exprs: &[Expr]) -> Result<Vec<Value>> {
        let mut cells = Vec::with_capacity(exprs.len());
        for expr in exprs {
            cells.push(self.expr(f, expr)?);
        }
        Ok(cells)
    }
}

fn arity_of(count: usize) -> Result<u32> {
    u32::try_from(count).map_err(|_| Error::codegen("too many arguments"))
}
