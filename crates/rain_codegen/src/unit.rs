//! Units: one source file lowered into a backend.

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use cranelift_module::Module;
use rain_foundation::{Diagnostics, Result};
use rain_syntax::Program;

use crate::backend::Backend;
use crate::constant::{ConstBox, ConstValue};
use crate::lower;

/// What other units and the entry points see of a lowered unit.
#[derive(Clone, Debug)]
pub struct UnitInterface {
    /// Module name.
    pub name: String,
    /// The exports table.
    pub exports: ConstBox,
    /// Final values of the unit's own module-scope names, exported or not.
    pub globals: BTreeMap<String, ConstBox>,
    /// Files named by `link`.
    pub links: Vec<String>,
    /// Libraries named by `library`.
    pub libraries: Vec<String>,
}

impl UnitInterface {
    /// A module-scope value.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<&ConstBox> {
        self.globals.get(name)
    }

    /// The `init` function, run before the program's `main`.
    #[must_use]
    pub fn init(&self) -> Option<&ConstBox> {
        self.global("init")
    }

    /// The `main` function.
    #[must_use]
    pub fn main(&self) -> Option<&ConstBox> {
        self.global("main")
    }

    /// A global that holds a function, with its arity.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<(&ConstBox, u32)> {
        let value = self.global(name)?;
        match value.value {
            ConstValue::Func { arity, .. } => Some((value, arity)),
            _ => None,
        }
    }
}

/// Input to [`Backend::lower_unit`].
#[derive(Clone, Copy, Debug)]
pub struct UnitSource<'a> {
    /// Module name, used for diagnostics and data names.
    pub name: &'a str,
    /// Parsed source.
    pub program: &'a Program,
    /// Units this one imports, by the module name written in `import`.
    pub imports: &'a HashMap<String, Rc<UnitInterface>>,
    /// Builtins copied into the unit's module scope.
    pub prelude: Option<&'a UnitInterface>,
}

impl<M: Module> Backend<M> {
    /// Lowers one unit, defining all of its functions and data.
    ///
    /// # Errors
    /// Returns the first compile error in the unit.
    pub fn lower_unit(
        &mut self,
        source: &UnitSource<'_>,
        diagnostics: &mut Diagnostics,
    ) -> Result<UnitInterface> {
        let (module, pool) = self.parts();
        lower::lower_unit(module, pool, source, diagnostics)
    }
}
