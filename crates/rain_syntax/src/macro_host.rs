//! The seam between the parser and the macro engine.
//!
//! The parser owns token consumption; the host owns macro definitions and
//! their compiled code. At an invocation site the parser asks the host which
//! argument parsers the macro declares, runs them on its live state, then
//! hands the parsed arguments to [`MacroHost::invoke`] and splices the
//! returned node in place.

use rain_foundation::{Error, ErrorKind, Result, Span};

use crate::ast::{Block, Expr, MacroDef, ParserKind, Stmt};

/// A parsed macro argument, one per declared parser.
#[derive(Clone, Debug, PartialEq)]
pub enum MacroArg {
    /// From `compound` or `expr`.
    Expr(Expr),
    /// From `args` or `argblock`.
    Exprs(Vec<Expr>),
    /// From `params`.
    Params(Vec<String>),
    /// From `block`.
    Block(Block),
    /// From `stmt`.
    Stmt(Stmt),
    /// From `name`, `namestr`, or `string`.
    Str(String),
    /// From `int`.
    Int(i64),
    /// From `float`.
    Float(f64),
    /// From `bool`.
    Bool(bool),
}

/// What a macro expands to.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A statement.
    Stmt(Stmt),
    /// An expression.
    Expr(Expr),
}

/// Owner of macro definitions for one source file.
pub trait MacroHost {
    /// Returns true if `name` is already a macro in this file.
    fn contains(&self, name: &str) -> bool;

    /// Compiles and registers a macro.
    ///
    /// # Errors
    /// Returns an error if the macro body fails to compile.
    fn define(&mut self, def: &MacroDef, span: Span) -> Result<()>;

    /// Argument parsers of a registered macro.
    fn parsers(&self, name: &str) -> Option<Vec<ParserKind>>;

    /// Runs a registered macro on parsed arguments.
    ///
    /// # Errors
    /// Returns an error if the macro raises or returns a malformed node.
    fn invoke(&mut self, name: &str, args: Vec<MacroArg>, span: Span) -> Result<Node>;

    /// Makes another module's macros available under `alias.` (or the
    /// module's own name).
    ///
    /// # Errors
    /// Returns an error if the module cannot be found or parsed.
    fn import(&mut self, module: &str, alias: Option<&str>, span: Span) -> Result<()>;
}

/// A host for sources that may not define or use macros.
///
/// Imports are accepted and ignored, so library sources with imports can
/// still be parsed.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoMacros;

impl MacroHost for NoMacros {
    fn contains(&self, _name: &str) -> bool {
        false
    }

    fn define(&mut self, def: &MacroDef, span: Span) -> Result<()> {
        Err(Error::invalid_scope(format!(
            "macro {:?} can't be defined here",
            def.name
        ))
        .at(span))
    }

    fn parsers(&self, _name: &str) -> Option<Vec<ParserKind>> {
        None
    }

    fn invoke(&mut self, name: &str, _args: Vec<MacroArg>, span: Span) -> Result<Node> {
        Err(Error::new(ErrorKind::UnknownMacro(name.to_string())).at(span))
    }

    fn import(&mut self, _module: &str, _alias: Option<&str>, _span: Span) -> Result<()> {
        Ok(())
    }
}
