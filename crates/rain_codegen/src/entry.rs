//! Native entry points: the program runner, the C `main`, and macro
//! entries.

use cranelift_codegen::Context;
use cranelift_codegen::ir::{AbiParam, Function, InstBuilder, Signature, UserFuncName, Value, types};
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::{FuncId, Linkage, Module};
use rain_foundation::abi::BOX_SIZE;
use rain_foundation::{Error, ErrorKind, Result};

use crate::backend::Backend;
use crate::constant::{ConstBox, ConstValue};
use crate::lower::FnCtx;
use crate::runtime::box_signature;
use crate::unit::UnitInterface;

/// Builds and defines a function whose entry block receives the signature's
/// parameters. `body` must terminate the current block.
fn define(
    module: &mut dyn Module,
    id: FuncId,
    sig: Signature,
    body: impl FnOnce(&mut dyn Module, &mut FnCtx<'_>, &[Value]) -> Result<()>,
) -> Result<()> {
    let ptr = module.target_config().pointer_type();
    let mut func = Function::with_name_signature(UserFuncName::user(0, id.as_u32()), sig);
    let mut builder_ctx = FunctionBuilderContext::new();
    let mut b = FunctionBuilder::new(&mut func, &mut builder_ctx);
    let entry = b.create_block();
    b.append_block_params_for_function_params(entry);
    b.switch_to_block(entry);
    let params = b.block_params(entry).to_vec();
    let mut f = FnCtx::new(b, params[0], ptr);
    body(module, &mut f, &params)?;
    f.b.seal_all_blocks();
    f.b.finalize();
    let mut ctx = Context::for_function(func);
    module
        .define_function(id, &mut ctx)
        .map_err(|err| Error::codegen(format!("{err:?}")))
}

fn status_of(result: Option<Value>) -> Result<Value> {
    result.ok_or_else(|| Error::internal("call returned no status"))
}

impl<M: Module> Backend<M> {
    /// Defines `fn(ret) -> i32` that runs each unit's `init`, then the root
    /// unit's `main`, leaving `main`'s result or the raised exception in
    /// `ret`.
    ///
    /// # Errors
    /// Returns [`ErrorKind::MissingMain`] if the root unit has no `main`.
    pub fn define_runner(
        &mut self,
        units: &[&UnitInterface],
        root: &UnitInterface,
    ) -> Result<FuncId> {
        let main = root
            .main()
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::MissingMain(root.name.clone())))?;
        let inits: Vec<ConstBox> = units.iter().filter_map(|unit| unit.init().cloned()).collect();

        let (module, pool) = self.parts();
        let sig = box_signature(&*module, 0);
        let id = module
            .declare_anonymous_function(&sig)
            .map_err(Error::codegen)?;
        let rain_main = pool.runtime(module, "rain_main")?;
        let tables = pool.tables();
        define(module, id, sig, |module, f, _| {
            let ret = f.ret;
            for init in &inits {
                let cell = f.new_cell();
                f.store_const(module, tables, cell, init)?;
                let status = status_of(f.call(module, rain_main, &[ret, cell]))?;
                f.check_status(status, ret);
            }
            let cell = f.new_cell();
            f.store_const(module, tables, cell, &main)?;
            let status = status_of(f.call(module, rain_main, &[ret, cell]))?;
            f.b.ins().return_(&[status]);
            Ok(())
        })?;
        Ok(id)
    }

    /// Defines the C `main(argc, argv)` of an executable around `runner`.
    ///
    /// # Errors
    /// Returns an error if `main` is already defined.
    pub fn define_c_main(&mut self, runner: FuncId) -> Result<FuncId> {
        let (module, pool) = self.parts();
        let ptr = module.target_config().pointer_type();
        let mut sig = module.make_signature();
        sig.params.push(AbiParam::new(types::I32));
        sig.params.push(AbiParam::new(ptr));
        sig.returns.push(AbiParam::new(types::I32));
        let id = module
            .declare_function("main", Linkage::Export, &sig)
            .map_err(Error::codegen)?;
        let init_args = pool.runtime(module, "rain_init_args")?;
        let report = pool.runtime(module, "rain_report_uncaught")?;
        let to_exit = pool.runtime(module, "rain_box_to_exit")?;
        define(module, id, sig, |module, f, params| {
            f.call(module, init_args, &[params[0], params[1]]);
            let ret = f.new_cell();
            f.ret = ret;
            let status = status_of(f.call(module, runner, &[ret]))?;
            let failed = f.b.create_block();
            let finished = f.b.create_block();
            f.b.ins().brif(status, failed, &[], finished, &[]);

            f.b.switch_to_block(failed);
            f.call(module, report, &[ret]);
            f.return_status(1);

            f.b.switch_to_block(finished);
            let code = status_of(f.call(module, to_exit, &[ret]))?;
            f.b.ins().return_(&[code]);
            Ok(())
        })?;
        Ok(id)
    }

    /// Defines `fn(ret, argv) -> i32` calling the macro body `func` with
    /// `arity` consecutive argument cells starting at `argv`.
    ///
    /// # Errors
    /// Returns an internal error if `func` is not a function of `arity`
    /// parameters.
    pub fn define_macro_entry(&mut self, func: &ConstBox, arity: u32) -> Result<FuncId> {
        let ConstValue::Func {
            func: body,
            arity: declared,
        } = func.value
        else {
            return Err(Error::internal("macro body is not a function"));
        };
        if declared != arity {
            return Err(Error::internal(format!(
                "macro body takes {declared} parameters, entry passes {arity}"
            )));
        }
        let (module, _) = self.parts();
        let ptr = module.target_config().pointer_type();
        let mut sig = module.make_signature();
        sig.params.push(AbiParam::new(ptr));
        sig.params.push(AbiParam::new(ptr));
        sig.returns.push(AbiParam::new(types::I32));
        let id = module
            .declare_anonymous_function(&sig)
            .map_err(Error::codegen)?;
        define(module, id, sig, |module, f, params| {
            let (ret, argv) = (params[0], params[1]);
            let mut args = vec![ret];
            for index in 0..i64::from(arity) {
                args.push(f.b.ins().iadd_imm(argv, index * i64::from(BOX_SIZE)));
            }
            let status = status_of(f.call(module, body, &args))?;
            f.b.ins().return_(&[status]);
            Ok(())
        })?;
        Ok(id)
    }
}
