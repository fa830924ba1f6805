//! Cranelift modules for the two ways Rain code leaves the compiler: loaded
//! into this process, or written to an object file.

use cranelift_codegen::isa::OwnedTargetIsa;
use cranelift_codegen::settings::{self, Configurable};
use cranelift_jit::{JITBuilder, JITModule};
use cranelift_module::{FuncId, Module, default_libcall_names};
use cranelift_object::{ObjectBuilder, ObjectModule};
use rain_codegen::Backend;
use rain_foundation::{Error, Result};

fn native_isa(pic: bool) -> Result<OwnedTargetIsa> {
    let mut flags = settings::builder();
    flags
        .set("use_colocated_libcalls", "false")
        .map_err(Error::codegen)?;
    flags
        .set("is_pic", if pic { "true" } else { "false" })
        .map_err(Error::codegen)?;
    let isa = cranelift_native::builder().map_err(Error::codegen)?;
    isa.finish(settings::Flags::new(flags))
        .map_err(Error::codegen)
}

/// A JIT module whose symbol table holds the runtime library.
///
/// # Errors
/// Returns an error if the host machine is not supported.
pub fn jit_module() -> Result<JITModule> {
    let mut builder = JITBuilder::with_isa(native_isa(false)?, default_libcall_names());
    builder.symbols(rain_runtime::symbols());
    Ok(JITModule::new(builder))
}

/// An object module named `name` for the host target.
///
/// # Errors
/// Returns an error if the host machine is not supported.
pub fn object_module(name: &str) -> Result<ObjectModule> {
    let builder = ObjectBuilder::new(native_isa(true)?, name, default_libcall_names())
        .map_err(Error::codegen)?;
    Ok(ObjectModule::new(builder))
}

/// Finalized JIT code. The module stays alive as long as this value, so the
/// code and the data it references do too.
pub struct Loaded {
    module: JITModule,
    code: *const u8,
}

impl Loaded {
    /// Finalizes every definition in `backend` and takes the address of
    /// `entry`.
    ///
    /// # Errors
    /// Returns an error if relocations cannot be resolved, for example when
    /// a `foreign` symbol is not in the runtime library.
    pub fn finalize(backend: Backend<JITModule>, entry: FuncId) -> Result<Self> {
        let mut module = backend.into_module();
        module
            .finalize_definitions()
            .map_err(|err| Error::codegen(format!("{err:?}")))?;
        let code = module.get_finalized_function(entry);
        Ok(Self { module, code })
    }

    /// Address of the entry function.
    #[must_use]
    pub fn code(&self) -> *const u8 {
        self.code
    }

    /// The module holding the code.
    #[must_use]
    pub fn module(&self) -> &JITModule {
        &self.module
    }
}

impl std::fmt::Debug for Loaded {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loaded").field("code", &self.code).finish_non_exhaustive()
    }
}

/// Emits the object file for a finished module.
///
/// # Errors
/// Returns an error if the object writer fails.
pub fn emit_object(backend: Backend<ObjectModule>) -> Result<Vec<u8>> {
    backend
        .into_module()
        .finish()
        .emit()
        .map_err(Error::codegen)
}
