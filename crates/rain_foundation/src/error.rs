//! Error types for the Rain compiler.
//!
//! Compile-time failures abort compilation and are reported through
//! [`Error`]. Runtime failures of compiled programs are boxes that travel
//! through the unwind protocol and only reach this type when they escape a
//! JIT-run program ([`ErrorKind::Uncaught`]) or a macro body
//! ([`ErrorKind::MacroFailed`]).

use std::fmt;

use thiserror::Error;

use crate::abi::TypeTag;
use crate::span::Span;

/// The main error type for Rain operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Attaches a source position unless one is already present.
    ///
    /// Synthetic spans carry no position and leave the error untouched.
    #[must_use]
    pub fn at(mut self, span: Span) -> Self {
        if span.is_synthetic() {
            return self;
        }
        let context = self.context.take().unwrap_or_default();
        let context = if context.line.is_some() {
            context
        } else {
            context.with_position(span.line as usize, span.column as usize)
        };
        self.context = Some(context);
        self
    }

    /// Names the source file or module unless one is already present.
    #[must_use]
    pub fn in_source(mut self, source: impl Into<String>) -> Self {
        let context = self.context.take().unwrap_or_default();
        let context = if context.source.is_some() {
            context
        } else {
            context.with_source(source)
        };
        self.context = Some(context);
        self
    }

    /// Creates an unknown name error.
    #[must_use]
    pub fn unknown_name(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownName(name.into()))
    }

    /// Creates an undeclared global error.
    #[must_use]
    pub fn undeclared_global(name: impl Into<String>) -> Self {
        Self::new(ErrorKind::UndeclaredGlobal(name.into()))
    }

    /// Creates an error for a construct used in a scope that forbids it.
    #[must_use]
    pub fn invalid_scope(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidScope(message.into()))
    }

    /// Creates a code generation error.
    #[must_use]
    pub fn codegen(message: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Codegen(message.to_string()))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal(message.into()))
    }

    /// Renders the error with its location, as `source:line:column: message`.
    #[must_use]
    pub fn report(&self) -> String {
        match &self.context {
            Some(ctx) => {
                let mut out = String::new();
                if let Some(source) = &ctx.source {
                    out.push_str(source);
                    out.push(':');
                }
                if let (Some(line), Some(column)) = (ctx.line, ctx.column) {
                    out.push_str(&format!("{line}:{column}:"));
                }
                if out.is_empty() {
                    self.kind.to_string()
                } else {
                    format!("{out} {}", self.kind)
                }
            }
            None => self.kind.to_string(),
        }
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// Malformed source text.
    #[error("parse error at {line}:{column}: {message}")]
    Parse {
        /// Description of the parse error.
        message: String,
        /// Line number (1-indexed).
        line: u32,
        /// Column number (1-indexed).
        column: u32,
        /// The source line where the error occurred.
        context: String,
    },

    /// A name was read that no scope declares.
    #[error("unknown name {0:?}")]
    UnknownName(String),

    /// A local assignment targets a name that no scope declares.
    #[error("undeclared name {0:?}")]
    UndeclaredName(String),

    /// A module-scope assignment targets a name that was never declared
    /// with `let` or `export`.
    #[error("undeclared global {0:?}")]
    UndeclaredGlobal(String),

    /// A construct was used in a scope that forbids it.
    #[error("{0}")]
    InvalidScope(String),

    /// A `for` statement names a different number of variables than generators.
    #[error("name and function count mismatch; found {funcs} functions, expected {names}")]
    ForArity {
        /// Number of loop variables.
        names: usize,
        /// Number of generator expressions.
        funcs: usize,
    },

    /// A macro name was defined twice in one file.
    #[error("redefinition of macro {0:?}")]
    MacroRedefinition(String),

    /// A macro invocation names no known macro.
    #[error("unknown macro {0:?}")]
    UnknownMacro(String),

    /// A macro declares an argument parser that does not exist.
    #[error("unknown macro argument parser {0:?}")]
    UnknownParserKind(String),

    /// A macro declares a different number of parsers than parameters.
    #[error("macro {name:?} declares {parsers} parsers but {params} parameters")]
    MacroArity {
        /// Macro name.
        name: String,
        /// Number of declared argument parsers.
        parsers: usize,
        /// Number of declared parameters.
        params: usize,
    },

    /// A macro body raised an exception during expansion.
    #[error("macro {name:?} failed: {message}")]
    MacroFailed {
        /// Macro name.
        name: String,
        /// Text of the raised exception.
        message: String,
    },

    /// A macro returned a value that does not encode a syntax-tree node.
    #[error("malformed syntax node: {0}")]
    MalformedNode(String),

    /// An imported module could not be located.
    #[error("can't find module {0:?}")]
    ModuleNotFound(String),

    /// Modules import each other.
    #[error("import cycle: {}", .0.join(" -> "))]
    ImportCycle(Vec<String>),

    /// A compile-time table has no free slot left.
    #[error("static table {0} is full")]
    TableFull(String),

    /// A compile-time table key is not a literal value.
    #[error("values of type {0} can't be used as static table keys")]
    UnhashableKey(TypeTag),

    /// An `error` statement was reached during compilation.
    #[error("{0}")]
    UserError(String),

    /// The program has no `main` to run.
    #[error("module {0:?} does not define main")]
    MissingMain(String),

    /// An exception escaped a JIT-run program.
    #[error("uncaught exception: {0}")]
    Uncaught(String),

    /// The native code generator rejected the generated code.
    #[error("code generation failed: {0}")]
    Codegen(String),

    /// A source file could not be read.
    #[error("can't read {path}: {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Internal error (should not happen).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Source file or module name.
    pub source: Option<String>,
    /// Line number in source.
    pub line: Option<usize>,
    /// Column number in source.
    pub column: Option<usize>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the source location.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the line and column.
    #[must_use]
    pub fn with_position(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.column = Some(column);
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "at {source}")?;
            if let (Some(line), Some(col)) = (self.line, self.column) {
                write!(f, ":{line}:{col}")?;
            }
        } else if let (Some(line), Some(col)) = (self.line, self.column) {
            write!(f, "at {line}:{col}")?;
        }
        Ok(())
    }
}
