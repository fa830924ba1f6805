//! Compilation sessions: parse a root module and its imports, lower them
//! into one backend, then run the result in process or emit an object file.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use cranelift_module::{FuncId, Module};
use rain_codegen::{Backend, UnitInterface, UnitSource};
use rain_foundation::{Diagnostics, Error, ErrorKind, Result};
use rain_runtime::{Value, builtins, call_runner, process};
use rain_syntax::Program;
use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::engine::{self, Loaded};
use crate::loader::{LoadedModule, Loader, Source};
use crate::prelude;

/// An object file for the host target.
#[derive(Clone, Debug)]
pub struct ObjectFile {
    /// Object file contents, including a C `main`.
    pub bytes: Vec<u8>,
    /// Files the program asked to link with, in module order.
    pub links: Vec<String>,
    /// Libraries the program asked to link with, in module order.
    pub libraries: Vec<String>,
}

/// Units lowered into one backend, and the function that runs them.
struct Lowered {
    runner: FuncId,
    units: Vec<Rc<UnitInterface>>,
}

/// Lowers `modules`, each after its imports, and defines a runner for the
/// last one.
fn lower_program<M: Module>(
    backend: &mut Backend<M>,
    modules: &[&LoadedModule],
    diagnostics: &mut Diagnostics,
) -> Result<Lowered> {
    let prelude = prelude::lower_prelude(backend, diagnostics)?;
    let mut lowered: HashMap<String, Rc<UnitInterface>> = HashMap::new();
    let mut units = Vec::with_capacity(modules.len());
    for module in modules {
        debug!(target: "rain::session", module = %module.name, "lowering");
        let unit = backend
            .lower_unit(
                &UnitSource {
                    name: &module.name,
                    program: &module.program,
                    imports: &lowered,
                    prelude: Some(&prelude),
                },
                diagnostics,
            )
            .map_err(|err| err.in_source(module.name.as_str()))?;
        let unit = Rc::new(unit);
        lowered.insert(module.name.clone(), Rc::clone(&unit));
        units.push(unit);
    }
    let root = units
        .last()
        .ok_or_else(|| Error::internal("no modules to lower"))?;
    let order: Vec<&UnitInterface> = units.iter().map(AsRef::as_ref).collect();
    let runner = backend.define_runner(&order, root)?;
    Ok(Lowered { runner, units })
}

/// One compilation session.
///
/// Modules are parsed once per session, so a session that runs several
/// programs shares their common imports and the macros those define.
#[derive(Debug)]
pub struct Session {
    loader: Loader,
}

impl Session {
    /// Creates a session.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            loader: Loader::new(config),
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        self.loader.config()
    }

    /// Warnings and hints recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        self.loader.diagnostics()
    }

    /// The module loader.
    #[must_use]
    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    /// Parses `text` as module `name`, expanding macros and loading its
    /// imports.
    ///
    /// # Errors
    /// Returns the first parse, macro or import error.
    pub fn parse_source(&mut self, name: &str, text: &str) -> Result<&Program> {
        Ok(&self.loader.parse(Source::new(name, text))?.program)
    }

    /// Parses a file, as [`Session::parse_source`] does.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not parse.
    pub fn parse_file(&mut self, path: &Path) -> Result<&Program> {
        let source = Source::from_file(path)?;
        Ok(&self.loader.parse(source)?.program)
    }

    /// Compiles module `name` and runs its `main`, returning what it
    /// returned.
    ///
    /// # Errors
    /// Returns a compile error, or [`ErrorKind::Uncaught`] if the program
    /// raises an exception nothing catches.
    pub fn run_source(&mut self, name: &str, text: &str) -> Result<Value> {
        self.loader.parse(Source::new(name, text))?;
        self.run(name)
    }

    /// Compiles a file and runs its `main`, as [`Session::run_source`] does.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or compiled, or if the
    /// program raises an exception nothing catches.
    pub fn run_file(&mut self, path: &Path) -> Result<Value> {
        let name = self.loader.parse(Source::from_file(path)?)?.name.clone();
        self.run(&name)
    }

    /// Compiles module `name` to an object file defining a C `main`.
    ///
    /// # Errors
    /// Returns the first compile error.
    pub fn build_source(&mut self, name: &str, text: &str) -> Result<ObjectFile> {
        self.loader.parse(Source::new(name, text))?;
        self.build(name)
    }

    /// Compiles a file to an object file, as [`Session::build_source`] does.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or compiled.
    pub fn build_file(&mut self, path: &Path) -> Result<ObjectFile> {
        let name = self.loader.parse(Source::from_file(path)?)?.name.clone();
        self.build(&name)
    }

    fn run(&mut self, root: &str) -> Result<Value> {
        let mut backend = Backend::new(engine::jit_module()?);
        let (modules, diagnostics) = self.loader.dependency_order(root);
        let lowered = lower_program(&mut backend, &modules, diagnostics)?;
        let loaded = Loaded::finalize(backend, lowered.runner)?;
        process::set_args(self.config().args.clone());
        info!(target: "rain::session", module = %root, "running");
        // SAFETY: the runner was defined with the runner signature and the
        // module stays loaded until the value below is read out.
        let result = unsafe { call_runner(loaded.code()) };
        match result {
            // SAFETY: boxes written by compiled code are valid
            Ok(ret) => Ok(unsafe { Value::from_box(&ret) }),
            Err(exc) => Err(Error::new(ErrorKind::Uncaught(
                // SAFETY: boxes written by compiled code are valid
                unsafe { builtins::display(&exc) },
            ))
            .in_source(root)),
        }
    }

    fn build(&mut self, root: &str) -> Result<ObjectFile> {
        let mut backend = Backend::new(engine::object_module(&self.config().object_name)?);
        let (modules, diagnostics) = self.loader.dependency_order(root);
        let lowered = lower_program(&mut backend, &modules, diagnostics)?;
        backend.define_c_main(lowered.runner)?;
        let bytes = engine::emit_object(backend)?;
        info!(target: "rain::session", module = %root, size = bytes.len(), "object emitted");
        let mut links = Vec::new();
        let mut libraries = Vec::new();
        for unit in &lowered.units {
            links.extend(unit.links.iter().cloned());
            libraries.extend(unit.libraries.iter().cloned());
        }
        Ok(ObjectFile {
            bytes,
            links,
            libraries,
        })
    }
}
