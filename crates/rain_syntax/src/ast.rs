//! Syntax tree for Rain.
//!
//! Statements and expressions are closed enums; every lowering pass matches
//! them exhaustively. Nodes carry the [`Span`] they were parsed from, or
//! [`Span::synthetic`] when a macro or the compiler built them.

use std::fmt;

use rain_foundation::Span;

use crate::token::Operator;

/// A parsed source file.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    /// Top-level statements, in source order.
    pub stmts: Vec<Stmt>,
}

/// An indented sequence of statements.
#[derive(Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    /// Statements, in source order.
    pub stmts: Vec<Stmt>,
    /// Source span.
    pub span: Span,
}

impl Block {
    /// Creates a block.
    #[must_use]
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }
}

/// A statement with its span.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Stmt {
    /// What kind of statement this is.
    pub kind: StmtKind,
    /// Source span.
    pub span: Span,
}

impl Stmt {
    /// Creates a statement.
    #[must_use]
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Creates a statement without a source position.
    #[must_use]
    pub fn synthetic(kind: StmtKind) -> Self {
        Self::new(kind, Span::synthetic())
    }
}

/// How an assignment binds its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Binding {
    /// `x = v`: the name must already exist.
    Assign,
    /// `let x = v`: declares a new binding.
    Let,
    /// `export x = v`: declares a module export.
    Export,
}

/// Statement variants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StmtKind {
    /// `let x = v`, `export x = v`, `x = v`, `t.k = v`, `t[k] = v`.
    Assign {
        /// A name or an index expression.
        target: Expr,
        /// Assigned value.
        value: Expr,
        /// Binding mode.
        binding: Binding,
    },
    /// `export NAME as foreign SYMBOL`.
    ExportForeign {
        /// Module global to export.
        name: String,
        /// Native symbol name.
        symbol: String,
    },
    /// `import NAME [as ALIAS]`.
    Import {
        /// Module name as written.
        module: String,
        /// Local alias.
        alias: Option<String>,
    },
    /// `macro NAME(parsers) as (params)` + block. Expanded at parse time.
    Macro(MacroDef),
    /// `link "file"`.
    Link(String),
    /// `library "name"`.
    Library(String),
    /// `if pred` + block, optional `else`.
    If {
        /// Condition.
        pred: Expr,
        /// Taken when the condition is truthy.
        body: Block,
        /// `else` block; `else if` chains nest as a single `If` statement.
        els: Option<Block>,
    },
    /// `catch NAME` + block.
    Catch {
        /// Receives the exception, or null.
        name: String,
        /// Protected statements.
        body: Block,
    },
    /// `for a, b in f, g` + block.
    For {
        /// Loop variables.
        names: Vec<String>,
        /// Zero-argument generator functions, one per variable.
        gens: Vec<Expr>,
        /// Loop body.
        body: Block,
    },
    /// `with EXPR as p, q` + block: calls `EXPR` with `func(p, q)` + block.
    With {
        /// Function receiving the block.
        func: Expr,
        /// Parameters of the block function.
        params: Vec<String>,
        /// Block function body.
        body: Block,
    },
    /// `while pred` + block.
    While {
        /// Loop condition.
        pred: Expr,
        /// Loop body.
        body: Block,
    },
    /// `until pred` + block.
    Until {
        /// Exit condition.
        pred: Expr,
        /// Loop body.
        body: Block,
    },
    /// `loop` + block.
    Loop {
        /// Loop body.
        body: Block,
    },
    /// `pass`.
    Pass,
    /// `break [if cond]`.
    Break(Option<Expr>),
    /// `continue [if cond]`.
    Continue(Option<Expr>),
    /// `return [value]`.
    Return(Option<Expr>),
    /// `save value`: sets the return value without returning.
    Save(Expr),
    /// A call or method call evaluated for its effects.
    Expr(Expr),
    /// Several statements spliced in by a macro.
    Block(Block),
    /// Aborts compilation with a message.
    Error(String),
    /// Reports a warning and continues.
    Warning(String),
    /// Reports a hint and continues.
    Hint(String),
}

/// An expression with its span.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Expr {
    /// What kind of expression this is.
    pub kind: ExprKind,
    /// Source span.
    pub span: Span,
}

impl Expr {
    /// Creates an expression.
    #[must_use]
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Creates an expression without a source position.
    #[must_use]
    pub fn synthetic(kind: ExprKind) -> Self {
        Self::new(kind, Span::synthetic())
    }

    /// Synthetic name reference.
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Name(name.into()))
    }

    /// Synthetic string literal.
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::synthetic(ExprKind::Str(value.into()))
    }

    /// Synthetic integer literal.
    #[must_use]
    pub fn int(value: i64) -> Self {
        Self::synthetic(ExprKind::Int(value))
    }

    /// Returns the name if this is a plain name reference.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Name(name) => Some(name),
            _ => None,
        }
    }
}

/// Expression variants.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExprKind {
    /// `null`
    Null,
    /// `table`: a fresh empty table.
    Table,
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// `true` / `false`.
    Bool(bool),
    /// String literal.
    Str(String),
    /// Name reference.
    Name(String),
    /// `[a, b, c]`: table keyed 0, 1, 2.
    Array(Vec<Expr>),
    /// `{k = v, [e] = v}`.
    Dict(Vec<(Expr, Expr)>),
    /// `func(params)` + block, or `func(params) -> expr`.
    Func {
        /// Parameter names.
        params: Vec<String>,
        /// Function body.
        body: Block,
    },
    /// `foreign NAME(params)`: a native function using the box convention.
    Foreign {
        /// Native symbol name.
        name: String,
        /// Parameter names (only the count matters).
        params: Vec<String>,
    },
    /// `f(args)` or `f?(args)`.
    Call {
        /// Callee.
        func: Box<Expr>,
        /// Arguments.
        args: Vec<Expr>,
        /// True for `?`: the call's own exception becomes its value.
        catch: bool,
    },
    /// `obj:name(args)` or `obj:name?(args)`.
    Method {
        /// Receiver, passed as the first argument.
        recv: Box<Expr>,
        /// Method name looked up in the receiver.
        name: String,
        /// Remaining arguments.
        args: Vec<Expr>,
        /// True for `?`.
        catch: bool,
    },
    /// `t.k` or `t[k]`.
    Index {
        /// Indexed value.
        lhs: Box<Expr>,
        /// Key.
        key: Box<Expr>,
    },
    /// `-x`, `!x`.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// `a OP b`.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
}

/// Unary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `!`
    Not,
}

impl UnaryOp {
    /// The operator as written.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
        }
    }

    /// Parses an operator spelling.
    #[must_use]
    pub fn from_symbol(text: &str) -> Option<Self> {
        match text {
            "-" => Some(Self::Neg),
            "!" => Some(Self::Not),
            _ => None,
        }
    }
}

/// Binary operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    /// `::`: attaches an environment.
    Attach,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `$`: string concatenation.
    Concat,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `&`: short-circuit and.
    And,
    /// `|`: short-circuit or.
    Or,
}

impl BinaryOp {
    const ALL: [Self; 14] = [
        Self::Attach,
        Self::Mul,
        Self::Div,
        Self::Add,
        Self::Sub,
        Self::Concat,
        Self::Lt,
        Self::Gt,
        Self::Le,
        Self::Ge,
        Self::Eq,
        Self::Ne,
        Self::And,
        Self::Or,
    ];

    /// Binding strength; higher binds tighter. Equal strengths associate left.
    #[must_use]
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Attach => 100,
            Self::Mul | Self::Div => 90,
            Self::Add | Self::Sub => 80,
            Self::Concat => 70,
            Self::Lt | Self::Gt | Self::Le | Self::Ge | Self::Eq | Self::Ne => 60,
            Self::And | Self::Or => 30,
        }
    }

    /// The binary operator a token denotes, if any.
    #[must_use]
    pub const fn from_operator(op: Operator) -> Option<Self> {
        Some(match op {
            Operator::ColonColon => Self::Attach,
            Operator::Star => Self::Mul,
            Operator::Slash => Self::Div,
            Operator::Plus => Self::Add,
            Operator::Minus => Self::Sub,
            Operator::Dollar => Self::Concat,
            Operator::Lt => Self::Lt,
            Operator::Gt => Self::Gt,
            Operator::Le => Self::Le,
            Operator::Ge => Self::Ge,
            Operator::EqEq => Self::Eq,
            Operator::Ne => Self::Ne,
            Operator::Amp => Self::And,
            Operator::Pipe => Self::Or,
            Operator::Bang | Operator::Arrow => return None,
        })
    }

    /// The operator as written.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Attach => "::",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Concat => "$",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::And => "&",
            Self::Or => "|",
        }
    }

    /// Parses an operator spelling.
    #[must_use]
    pub fn from_symbol(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == text)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A macro definition as parsed.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MacroDef {
    /// Macro name.
    pub name: String,
    /// Argument parsers, run in order at each invocation.
    pub parsers: Vec<ParserKind>,
    /// Body parameters, one per parser.
    pub params: Vec<String>,
    /// Body, compiled as a function of `params`.
    pub body: Block,
}

/// Parse-time argument parsers a macro can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParserKind {
    /// A macro invocation, function literal, or expression.
    Compound,
    /// A binary expression.
    Expr,
    /// A parenthesized argument list.
    Args,
    /// A parenthesized parameter list.
    Params,
    /// An indented block of statements.
    Block,
    /// An indented block of expressions, one per line.
    ArgBlock,
    /// A single statement.
    Stmt,
    /// A bare identifier.
    Name,
    /// An identifier or string literal.
    NameStr,
    /// A string literal.
    String,
    /// An integer literal.
    Int,
    /// A float literal.
    Float,
    /// A boolean literal.
    Bool,
}

impl ParserKind {
    /// Looks up a parser by the name used in macro definitions.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "compound" => Self::Compound,
            "expr" => Self::Expr,
            "args" => Self::Args,
            "params" => Self::Params,
            "block" => Self::Block,
            "argblock" => Self::ArgBlock,
            "stmt" => Self::Stmt,
            "name" => Self::Name,
            "namestr" => Self::NameStr,
            "string" => Self::String,
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            _ => return None,
        })
    }

    /// The name used in macro definitions.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Compound => "compound",
            Self::Expr => "expr",
            Self::Args => "args",
            Self::Params => "params",
            Self::Block => "block",
            Self::ArgBlock => "argblock",
            Self::Stmt => "stmt",
            Self::Name => "name",
            Self::NameStr => "namestr",
            Self::String => "string",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
        }
    }
}
