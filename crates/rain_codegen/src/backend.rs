//! A Cranelift module together with the declarations shared by every unit
//! lowered into it.

use std::collections::HashMap;
use std::rc::Rc;

use cranelift_module::{DataDescription, DataId, FuncId, Linkage, Module};
use rain_foundation::{Error, Result};

use crate::constant::ConstBox;
use crate::runtime;
use crate::static_table::StaticTables;

/// Interned strings, imported functions and static tables of one module.
#[derive(Debug, Default)]
pub struct Pool {
    strings: HashMap<Rc<str>, DataId>,
    imports: HashMap<String, FuncId>,
    tables: StaticTables,
}

impl Pool {
    /// A string box over read-only NUL-terminated data, shared between
    /// equal literals.
    ///
    /// # Errors
    /// Returns an error if the module rejects the data.
    pub fn string(&mut self, module: &mut dyn Module, text: &str) -> Result<ConstBox> {
        if let Some((text, &data)) = self.strings.get_key_value(text) {
            return Ok(ConstBox::string(data, Rc::clone(text)));
        }
        let data = module
            .declare_anonymous_data(false, false)
            .map_err(Error::codegen)?;
        let mut desc = DataDescription::new();
        let mut bytes = Vec::with_capacity(text.len() + 1);
        bytes.extend_from_slice(text.as_bytes());
        bytes.push(0);
        desc.define(bytes.into_boxed_slice());
        module.define_data(data, &desc).map_err(Error::codegen)?;
        let text: Rc<str> = Rc::from(text);
        self.strings.insert(Rc::clone(&text), data);
        Ok(ConstBox::string(data, text))
    }

    /// Imports a runtime library function.
    ///
    /// # Errors
    /// Returns an internal error for names the runtime does not provide.
    pub fn runtime(&mut self, module: &mut dyn Module, name: &str) -> Result<FuncId> {
        if let Some(&id) = self.imports.get(name) {
            return Ok(id);
        }
        let sig = runtime::signature(&*module, name)
            .ok_or_else(|| Error::internal(format!("no runtime function {name}")))?;
        self.import(module, name, &sig)
    }

    /// Imports a native function with the box calling convention.
    ///
    /// # Errors
    /// Returns an error if `name` was already imported with another arity.
    pub fn foreign(&mut self, module: &mut dyn Module, name: &str, arity: u32) -> Result<FuncId> {
        let sig = runtime::box_signature(&*module, arity);
        match self.imports.get(name) {
            Some(&id) if module.declarations().get_function_decl(id).signature == sig => Ok(id),
            Some(_) => Err(Error::codegen(format!(
                "foreign function {name} is declared with conflicting parameter counts"
            ))),
            None => self.import(module, name, &sig),
        }
    }

    fn import(
        &mut self,
        module: &mut dyn Module,
        name: &str,
        sig: &cranelift_codegen::ir::Signature,
    ) -> Result<FuncId> {
        let id = module
            .declare_function(name, Linkage::Import, sig)
            .map_err(Error::codegen)?;
        self.imports.insert(name.to_string(), id);
        Ok(id)
    }

    /// Static tables.
    #[must_use]
    pub fn tables(&self) -> &StaticTables {
        &self.tables
    }

    /// Static tables, mutably.
    pub fn tables_mut(&mut self) -> &mut StaticTables {
        &mut self.tables
    }
}

/// A Cranelift module (JIT or object) being filled with Rain units.
pub struct Backend<M: Module> {
    module: M,
    pool: Pool,
}

impl<M: Module> Backend<M> {
    /// Wraps an empty module.
    pub fn new(module: M) -> Self {
        Self {
            module,
            pool: Pool::default(),
        }
    }

    /// The underlying module.
    pub fn module(&self) -> &M {
        &self.module
    }

    /// The underlying module, mutably.
    pub fn module_mut(&mut self) -> &mut M {
        &mut self.module
    }

    /// Shared declarations.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }

    /// The module as a trait object alongside the pool, for lowering.
    pub fn parts(&mut self) -> (&mut dyn Module, &mut Pool) {
        (&mut self.module, &mut self.pool)
    }

    /// Unwraps the module, e.g. to finalize or emit it.
    pub fn into_module(self) -> M {
        self.module
    }
}
