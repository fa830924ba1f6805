//! Syntax tree to Cranelift IR.
//!
//! A unit is lowered in one pass. Module-scope statements fold to constant
//! data; function literals are lowered recursively into their own Cranelift
//! functions when they are reached.

mod call;
mod control;
mod expr;
mod frame;
mod module;
mod stmt;

use std::collections::HashMap;
use std::rc::Rc;

use cranelift_codegen::ir::{InstBuilder, Value};
use cranelift_module::{DataDescription, DataId, Linkage, Module};
use rain_foundation::abi::BOX_SIZE;
use rain_foundation::{Diagnostics, Error, Result};

use crate::backend::Pool;
use crate::constant::{ConstBox, write_box};
use crate::scope::{BindState, GlobalStorage, LocalStorage, Resolved, Scopes};
use crate::static_table::{StaticTables, TableId};
use crate::unit::{UnitInterface, UnitSource};

pub(crate) use frame::FnCtx;

/// Storage a name resolves to.
#[derive(Clone, Copy, Debug)]
enum Place {
    Local(LocalStorage, BindState),
    Global(GlobalStorage),
}

pub(crate) struct Lowerer<'a> {
    module: &'a mut dyn Module,
    pool: &'a mut Pool,
    unit: &'a str,
    imports: &'a HashMap<String, Rc<UnitInterface>>,
    diagnostics: &'a mut Diagnostics,
    scopes: Scopes,
    exports: TableId,
    links: Vec<String>,
    libraries: Vec<String>,
    foreign_exports: Vec<(String, GlobalStorage)>,
}

/// Lowers one unit into `module`, defining all of its functions and data.
pub(crate) fn lower_unit(
    module: &mut dyn Module,
    pool: &mut Pool,
    source: &UnitSource<'_>,
    diagnostics: &mut Diagnostics,
) -> Result<UnitInterface> {
    tracing::debug!(target: "rain::codegen", unit = source.name, "lowering unit");
    let exports = pool
        .tables_mut()
        .alloc(module, &format!("{}.exports", source.name))?;
    let mut lowerer = Lowerer {
        module,
        pool,
        unit: source.name,
        imports: source.imports,
        diagnostics,
        scopes: Scopes::new(),
        exports,
        links: Vec::new(),
        libraries: Vec::new(),
        foreign_exports: Vec::new(),
    };
    if let Some(prelude) = source.prelude {
        lowerer.seed_prelude(prelude)?;
    }
    for stmt in &source.program.stmts {
        lowerer
            .module_stmt(stmt)
            .map_err(|err| err.at(stmt.span).in_source(source.name))?;
    }
    lowerer.finish().map_err(|err| err.in_source(source.name))
}

impl Lowerer<'_> {
    fn ptr(&self) -> cranelift_codegen::ir::Type {
        self.module.target_config().pointer_type()
    }

    fn tables(&self) -> &StaticTables {
        self.pool.tables()
    }

    fn string(&mut self, text: &str) -> Result<ConstBox> {
        self.pool.string(self.module, text)
    }

    fn data_addr(&mut self, f: &mut FnCtx<'_>, id: DataId) -> Value {
        f.data_addr(self.module, id)
    }

    /// Calls a runtime entry point and returns its result, if it has one.
    fn call_runtime(
        &mut self,
        f: &mut FnCtx<'_>,
        name: &str,
        args: &[Value],
    ) -> Result<Option<Value>> {
        let id = self.pool.runtime(self.module, name)?;
        Ok(f.call(self.module, id, args))
    }

    /// Like [`Self::call_runtime`] for entry points that return a value.
    fn call_runtime_value(
        &mut self,
        f: &mut FnCtx<'_>,
        name: &str,
        args: &[Value],
    ) -> Result<Value> {
        self.call_runtime(f, name, args)?
            .ok_or_else(|| Error::internal(format!("{name} returns nothing")))
    }

    /// `rain_truthy` of a cell, as an `i32`.
    fn truthy(&mut self, f: &mut FnCtx<'_>, cell: Value) -> Result<Value> {
        self.call_runtime_value(f, "rain_truthy", &[cell])
    }

    /// Writes a compile-time box into a cell.
    fn store_const(&mut self, f: &mut FnCtx<'_>, cell: Value, value: &ConstBox) -> Result<()> {
        f.store_const(self.module, self.pool.tables(), cell, value)
    }

    /// A fresh cell holding a compile-time box.
    fn const_cell(&mut self, f: &mut FnCtx<'_>, value: &ConstBox) -> Result<Value> {
        let cell = f.new_cell();
        self.store_const(f, cell, value)?;
        Ok(cell)
    }

    /// Address of a module-scope name's box.
    fn global_addr(&mut self, f: &mut FnCtx<'_>, storage: GlobalStorage) -> Value {
        match storage {
            GlobalStorage::Cell(index) => {
                let data = self.scopes.cell(index).data;
                self.data_addr(f, data)
            }
            GlobalStorage::Export(slot) => {
                let items = self.tables().items(self.exports);
                let base = self.data_addr(f, items);
                f.b.ins()
                    .iadd_imm(base, StaticTables::value_offset(slot))
            }
        }
    }

    fn resolve(&self, name: &str) -> Option<Place> {
        match self.scopes.lookup(name) {
            Resolved::Local(binding) => Some(Place::Local(binding.storage, binding.state)),
            Resolved::Global(binding) => Some(Place::Global(binding.storage)),
            Resolved::Undeclared => None,
        }
    }

    /// Address of the box a name is stored in.
    fn place_addr(&mut self, f: &mut FnCtx<'_>, place: Place) -> Value {
        match place {
            Place::Local(LocalStorage::Slot(slot), _) => f.slot_addr(slot),
            Place::Local(LocalStorage::Ptr(ptr), _) => ptr,
            Place::Global(storage) => self.global_addr(f, storage),
        }
    }

    /// A fresh cell holding a string constant.
    fn string_cell(&mut self, f: &mut FnCtx<'_>, text: &str) -> Result<Value> {
        let value = self.string(text)?;
        self.const_cell(f, &value)
    }

    /// `table[key] = value` at run time; raises through the unwind protocol.
    fn put_dynamic(
        &mut self,
        f: &mut FnCtx<'_>,
        table: Value,
        key: Value,
        value: Value,
    ) -> Result<()> {
        let exc = f.new_cell();
        let status = self.call_runtime_value(f, "rain_put", &[exc, table, key, value])?;
        f.check_status(status, exc);
        Ok(())
    }

    /// Current compile-time value of a module-scope name.
    fn global_value(&self, storage: GlobalStorage) -> ConstBox {
        match storage {
            GlobalStorage::Cell(index) => self.scopes.cell(index).value.clone(),
            GlobalStorage::Export(slot) => self
                .tables()
                .value_at(self.exports, slot)
                .cloned()
                .unwrap_or_else(ConstBox::null),
        }
    }

    fn set_global_value(&mut self, storage: GlobalStorage, value: ConstBox) -> Result<()> {
        match storage {
            GlobalStorage::Cell(index) => {
                self.scopes.cell_mut(index).value = value;
                Ok(())
            }
            GlobalStorage::Export(slot) => {
                self.pool.tables_mut().set_at(self.exports, slot, value)
            }
        }
    }

    /// A new global cell; its data is defined when the unit is finished.
    fn new_global_cell(&mut self, value: ConstBox) -> Result<usize> {
        let data = self
            .module
            .declare_anonymous_data(true, false)
            .map_err(Error::codegen)?;
        Ok(self.scopes.add_cell(data, value))
    }

    fn finish(mut self) -> Result<UnitInterface> {
        let tables = self.pool.tables();
        let header_of = |id: TableId| tables.header(id);
        for cell in self.scopes.cells() {
            let mut desc = DataDescription::new();
            desc.set_align(8);
            let mut bytes = vec![0u8; BOX_SIZE as usize];
            write_box(self.module, &mut desc, &mut bytes, 0, &cell.value, &header_of)?;
            desc.define(bytes.into_boxed_slice());
            self.module
                .define_data(cell.data, &desc)
                .map_err(Error::codegen)?;
        }
        self.pool.tables_mut().finish_pending(self.module)?;
        for (symbol, storage) in std::mem::take(&mut self.foreign_exports) {
            self.define_foreign_export(&symbol, storage)?;
        }

        let mut globals = std::collections::BTreeMap::new();
        for (name, binding) in self.scopes.globals() {
            if binding.own {
                globals.insert(name.to_string(), self.global_value(binding.storage));
            }
        }
        tracing::debug!(
            target: "rain::codegen",
            unit = self.unit,
            globals = globals.len(),
            "unit finished"
        );
        Ok(UnitInterface {
            name: self.unit.to_string(),
            exports: ConstBox::table(self.exports),
            globals,
            links: self.links,
            libraries: self.libraries,
        })
    }

    /// A pointer-sized exported symbol holding the address of a global's
    /// storage.
    fn define_foreign_export(&mut self, symbol: &str, storage: GlobalStorage) -> Result<()> {
        let id = self
            .module
            .declare_data(symbol, Linkage::Export, false, false)
            .map_err(Error::codegen)?;
        let (target, addend) = match storage {
            GlobalStorage::Cell(index) => (self.scopes.cell(index).data, 0),
            GlobalStorage::Export(slot) => (
                self.tables().items(self.exports),
                StaticTables::value_offset(slot),
            ),
        };
        let mut desc = DataDescription::new();
        desc.set_align(8);
        let size = self.ptr().bytes() as usize;
        desc.define(vec![0u8; size].into_boxed_slice());
        let gv = self.module.declare_data_in_data(target, &mut desc);
        desc.write_data_addr(0, gv, addend);
        self.module.define_data(id, &desc).map_err(Error::codegen)
    }
}
