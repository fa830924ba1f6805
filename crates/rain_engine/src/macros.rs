//! Compiled macros and the registries that name them.
//!
//! A macro body is lowered as a function in a JIT module of its own,
//! alongside the prelude, the `ast` library and a `gensym` helper. A fixed
//! entry `fn(ret, argv) -> i32` unpacks one argument cell per declared
//! parser, so the host can call any macro the same way.

use std::collections::HashMap;
use std::rc::Rc;

use rain_codegen::{Backend, UnitSource};
use rain_foundation::{Diagnostics, Error, ErrorKind, Result, Span};
use rain_runtime::{Value, builtins, call_entry};
use rain_syntax::{
    BinaryOp, Binding, Block, Expr, ExprKind, MacroArg, MacroDef, Node, ParserKind, Program,
    Stmt, StmtKind, parse_program,
};
use tracing::debug;

use crate::engine::{self, Loaded};
use crate::marshal;
use crate::prelude;

/// Name of the macro body inside its unit. Not a valid identifier, so it
/// can't collide with names in the body.
const BODY: &str = ":body";
/// Counter behind `gensym`.
const SYMCOUNT: &str = ":symcount";

/// A macro compiled to native code.
#[derive(Debug)]
pub struct Macro {
    name: String,
    parsers: Vec<ParserKind>,
    loaded: Loaded,
}

fn let_stmt(name: &str, value: Expr) -> Stmt {
    Stmt::synthetic(StmtKind::Assign {
        target: Expr::name(name),
        value,
        binding: Binding::Let,
    })
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::synthetic(ExprKind::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

/// `gensym()` returns `":<macro>:0"`, `":<macro>:1"`, and so on.
fn gensym(qualified: &str) -> Vec<Stmt> {
    let tostr = Expr::synthetic(ExprKind::Call {
        func: Box::new(Expr::name("tostr")),
        args: vec![Expr::name(SYMCOUNT)],
        catch: false,
    });
    let body = Block::new(
        vec![
            Stmt::synthetic(StmtKind::Save(binary(
                BinaryOp::Concat,
                Expr::string(format!(":{qualified}:")),
                tostr,
            ))),
            Stmt::synthetic(StmtKind::Assign {
                target: Expr::name(SYMCOUNT),
                value: binary(BinaryOp::Add, Expr::name(SYMCOUNT), Expr::int(1)),
                binding: Binding::Assign,
            }),
        ],
        Span::synthetic(),
    );
    vec![
        let_stmt(SYMCOUNT, Expr::int(0)),
        let_stmt(
            "gensym",
            Expr::synthetic(ExprKind::Func {
                params: Vec::new(),
                body,
            }),
        ),
    ]
}

impl Macro {
    /// Compiles `def`, defined in `module`, to native code.
    ///
    /// # Errors
    /// Returns an error if the body does not compile.
    pub fn compile(module: &str, def: &MacroDef, diagnostics: &mut Diagnostics) -> Result<Self> {
        let name = format!("{module}:{}", def.name);
        debug!(target: "rain::macros", macro_name = %name, "compiling macro");

        let mut backend = Backend::new(engine::jit_module()?);
        let prelude = prelude::lower_prelude(&mut backend, diagnostics)?;
        let ast_program = parse_program(prelude::AST).map_err(|err| err.in_source("ast"))?;
        let no_imports = HashMap::new();
        let ast = backend.lower_unit(
            &UnitSource {
                name: "ast",
                program: &ast_program,
                imports: &no_imports,
                prelude: Some(&prelude),
            },
            diagnostics,
        )?;

        let mut stmts = vec![Stmt::synthetic(StmtKind::Import {
            module: "ast".to_string(),
            alias: None,
        })];
        stmts.extend(gensym(&name));
        stmts.push(let_stmt(
            BODY,
            Expr::new(
                ExprKind::Func {
                    params: def.params.clone(),
                    body: def.body.clone(),
                },
                def.body.span,
            ),
        ));
        let program = Program { stmts };
        let imports = HashMap::from([("ast".to_string(), Rc::new(ast))]);
        let unit = backend.lower_unit(
            &UnitSource {
                name: module,
                program: &program,
                imports: &imports,
                prelude: Some(&prelude),
            },
            diagnostics,
        )?;
        let (body, arity) = unit
            .function(BODY)
            .ok_or_else(|| Error::internal(format!("macro {name} has no body")))?;
        let entry = backend.define_macro_entry(body, arity)?;
        let loaded = Loaded::finalize(backend, entry)?;
        debug!(target: "rain::macros", macro_name = %name, "macro loaded");
        Ok(Self {
            name,
            parsers: def.parsers.clone(),
            loaded,
        })
    }

    /// Qualified name, `module:macro`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Argument parsers, in invocation order.
    #[must_use]
    pub fn parsers(&self) -> &[ParserKind] {
        &self.parsers
    }

    /// Calls the macro on parsed arguments and reads back the node it
    /// returns.
    ///
    /// # Errors
    /// Returns [`ErrorKind::MacroFailed`] if the body raises and
    /// [`ErrorKind::MalformedNode`] if it returns something that is not a
    /// node.
    pub fn invoke(&self, args: &[MacroArg], span: Span) -> Result<Node> {
        if args.len() != self.parsers.len() {
            return Err(Error::internal(format!(
                "macro {} takes {} arguments, got {}",
                self.name,
                self.parsers.len(),
                args.len()
            )));
        }
        let mut argv = args
            .iter()
            .map(marshal::encode_arg)
            .collect::<Result<Vec<_>>>()
            .map_err(|err| err.at(span))?;
        debug!(target: "rain::macros", macro_name = %self.name, "expanding");
        // SAFETY: the entry was defined for exactly `parsers.len()` cells and
        // its module lives as long as `self`.
        let result = unsafe { call_entry(self.loaded.code(), &mut argv) };
        match result {
            Ok(ret) => {
                // SAFETY: boxes written by compiled code are valid
                let value = unsafe { Value::from_box(&ret) };
                marshal::decode(&value, span).map_err(|err| err.at(span))
            }
            Err(exc) => Err(Error::new(ErrorKind::MacroFailed {
                name: self.name.clone(),
                // SAFETY: boxes written by compiled code are valid
                message: unsafe { builtins::display(&exc) },
            })
            .at(span)),
        }
    }
}

/// Macros visible in one source file.
///
/// Imports share compiled macros with the exporting file; both maps are
/// persistent, so cloning a registry is cheap.
#[derive(Clone, Debug, Default)]
pub struct MacroRegistry {
    visible: im::HashMap<String, Rc<Macro>>,
    own: im::HashMap<String, Rc<Macro>>,
}

impl MacroRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a macro defined in this file.
    pub fn define(&mut self, name: &str, mac: Rc<Macro>) {
        self.visible.insert(name.to_string(), Rc::clone(&mac));
        self.own.insert(name.to_string(), mac);
    }

    /// Makes the macros defined in `other` visible as `alias.name`.
    pub fn import(&mut self, alias: &str, other: &Self) {
        for (name, mac) in &other.own {
            self.visible
                .insert(format!("{alias}.{name}"), Rc::clone(mac));
        }
    }

    /// Looks up a macro by the name used at invocation sites.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Rc<Macro>> {
        self.visible.get(name)
    }

    /// Returns true if `name` is visible in this file.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.visible.contains_key(name)
    }

    /// Names of macros defined in this file.
    pub fn own_names(&self) -> impl Iterator<Item = &str> {
        self.own.keys().map(String::as_str)
    }

    /// Number of visible macros.
    #[must_use]
    pub fn len(&self) -> usize {
        self.visible.len()
    }

    /// Returns true if no macro is visible.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}
