//! Finding, parsing and caching modules.
//!
//! A module `name` imported from a file in `dir` is the first of:
//! an in-memory source registered under `name`, `dir/name.rn`,
//! `dir/name/_pkg.rn`, the same two paths under each search path and then
//! the standard library, and finally a library built into the compiler.
//! Each module is parsed once per [`Loader`]; its macros are compiled while
//! it parses.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use rain_foundation::{Diagnostics, Error, ErrorKind, Result, Span};
use rain_syntax::{MacroArg, MacroDef, MacroHost, Node, ParserKind, Program};
use tracing::debug;

use crate::config::SessionConfig;
use crate::macros::{Macro, MacroRegistry};
use crate::prelude;

/// File name of a package's root module.
const PACKAGE_ROOT: &str = "_pkg.rn";
/// Extension of Rain source files.
const EXTENSION: &str = "rn";

/// Source text of a module, and the directory its own imports start from.
#[derive(Clone, Debug)]
pub struct Source {
    /// Module name.
    pub name: String,
    /// Source text.
    pub text: String,
    /// Directory of the file, if it came from one.
    pub dir: Option<PathBuf>,
}

impl Source {
    /// An in-memory source.
    #[must_use]
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            dir: None,
        }
    }

    /// Reads a file. The module is named after the file, or after its
    /// directory for a package root.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| {
            Error::new(ErrorKind::Io {
                path: path.display().to_string(),
                source,
            })
        })?;
        let dir = path.parent().map(Path::to_path_buf);
        let stem = if path.file_name().is_some_and(|file| file == PACKAGE_ROOT) {
            dir.as_deref().and_then(Path::file_name)
        } else {
            path.file_stem()
        };
        let name = stem
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, text, dir })
    }
}

/// A parsed module.
#[derive(Debug)]
pub struct LoadedModule {
    /// Module name.
    pub name: String,
    /// Syntax tree with macros expanded.
    pub program: Program,
    /// Macros visible in the module, including imported ones.
    pub macros: MacroRegistry,
    /// Modules it imports, in order.
    pub imports: Vec<String>,
}

/// Module cache for one session.
#[derive(Debug)]
pub struct Loader {
    config: SessionConfig,
    modules: HashMap<String, LoadedModule>,
    /// Modules being parsed, outermost first.
    loading: Vec<String>,
    diagnostics: Diagnostics,
}

impl Loader {
    /// Creates an empty loader.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            modules: HashMap::new(),
            loading: Vec::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// The configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Warnings and hints recorded while compiling.
    #[must_use]
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// A loaded module.
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&LoadedModule> {
        self.modules.get(name)
    }

    /// Locates module `name` for a file in `from`.
    ///
    /// # Errors
    /// Returns [`ErrorKind::ModuleNotFound`] if no candidate exists, or an
    /// I/O error if the one found cannot be read.
    pub fn find(&self, name: &str, from: Option<&Path>) -> Result<Source> {
        if let Some(text) = self.config.sources.get(name) {
            return Ok(Source::new(name, text.as_str()));
        }
        let dirs = from
            .into_iter()
            .chain(self.config.search_paths.iter().map(PathBuf::as_path))
            .chain(self.config.stdlib.as_deref());
        for dir in dirs {
            let file = dir.join(name).with_extension(EXTENSION);
            let package = dir.join(name).join(PACKAGE_ROOT);
            for candidate in [file, package] {
                if candidate.is_file() {
                    let mut source = Source::from_file(&candidate)?;
                    source.name = name.to_string();
                    return Ok(source);
                }
            }
        }
        prelude::library(name)
            .map(|text| Source::new(name, text))
            .ok_or_else(|| Error::new(ErrorKind::ModuleNotFound(name.to_string())))
    }

    /// Loads module `name` imported from a file in `from`, parsing it unless
    /// it is already loaded.
    ///
    /// # Errors
    /// Returns an error if the module cannot be found or parsed, or if it
    /// imports itself through other modules.
    pub fn load(&mut self, name: &str, from: Option<&Path>) -> Result<&LoadedModule> {
        if let Some(start) = self.loading.iter().position(|loading| loading == name) {
            let mut cycle = self.loading[start..].to_vec();
            cycle.push(name.to_string());
            return Err(Error::new(ErrorKind::ImportCycle(cycle)));
        }
        if !self.modules.contains_key(name) {
            let source = self.find(name, from)?;
            self.parse(source)?;
        }
        self.modules
            .get(name)
            .ok_or_else(|| Error::internal(format!("module {name} vanished while loading")))
    }

    /// Parses `source` as a module, replacing any module of the same name.
    ///
    /// # Errors
    /// Returns an error if the source or one of its imports does not parse.
    pub fn parse(&mut self, source: Source) -> Result<&LoadedModule> {
        debug!(target: "rain::loader", module = %source.name, "parsing");
        self.modules.remove(&source.name);
        self.loading.push(source.name.clone());
        let mut host = FileHost {
            loader: self,
            module: &source.name,
            dir: source.dir.as_deref(),
            macros: MacroRegistry::new(),
            imports: Vec::new(),
        };
        let parsed = rain_syntax::parse(&source.text, &mut host);
        let FileHost {
            macros, imports, ..
        } = host;
        self.loading.pop();
        let program = parsed.map_err(|err| err.in_source(source.name.as_str()))?;
        let name = source.name;
        self.modules.insert(
            name.clone(),
            LoadedModule {
                name: name.clone(),
                program,
                macros,
                imports,
            },
        );
        self.modules
            .get(&name)
            .ok_or_else(|| Error::internal(format!("module {name} vanished while loading")))
    }

    /// `root` and every module it imports, each after its imports.
    ///
    /// Also returns the diagnostics sink, so lowering can record into it
    /// while it reads the modules.
    pub fn dependency_order(&mut self, root: &str) -> (Vec<&LoadedModule>, &mut Diagnostics) {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        visit(&self.modules, root, &mut seen, &mut order);
        (order, &mut self.diagnostics)
    }
}

fn visit<'m>(
    modules: &'m HashMap<String, LoadedModule>,
    name: &str,
    seen: &mut HashSet<&'m str>,
    order: &mut Vec<&'m LoadedModule>,
) {
    let Some(module) = modules.get(name) else {
        return;
    };
    if !seen.insert(module.name.as_str()) {
        return;
    }
    for import in &module.imports {
        visit(modules, import, seen, order);
    }
    order.push(module);
}

/// Macro host for one file being parsed.
struct FileHost<'a> {
    loader: &'a mut Loader,
    module: &'a str,
    dir: Option<&'a Path>,
    macros: MacroRegistry,
    imports: Vec<String>,
}

impl MacroHost for FileHost<'_> {
    fn contains(&self, name: &str) -> bool {
        self.macros.contains(name)
    }

    fn define(&mut self, def: &MacroDef, span: Span) -> Result<()> {
        let mac = Macro::compile(self.module, def, &mut self.loader.diagnostics)
            .map_err(|err| err.at(span))?;
        self.macros.define(&def.name, Rc::new(mac));
        Ok(())
    }

    fn parsers(&self, name: &str) -> Option<Vec<ParserKind>> {
        self.macros.get(name).map(|mac| mac.parsers().to_vec())
    }

    fn invoke(&mut self, name: &str, args: Vec<MacroArg>, span: Span) -> Result<Node> {
        let mac = self
            .macros
            .get(name)
            .ok_or_else(|| Error::new(ErrorKind::UnknownMacro(name.to_string())).at(span))?;
        mac.invoke(&args, span)
    }

    fn import(&mut self, module: &str, alias: Option<&str>, span: Span) -> Result<()> {
        let loaded = self
            .loader
            .load(module, self.dir)
            .map_err(|err| err.at(span))?;
        self.macros.import(alias.unwrap_or(module), &loaded.macros);
        if !self.imports.iter().any(|import| import == module) {
            self.imports.push(module.to_string());
        }
        Ok(())
    }
}
