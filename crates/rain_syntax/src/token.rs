//! Token types for Rain.
//!
//! Tokens are the output of the lexer and input to the parser. Layout is
//! carried by explicit [`TokenKind::Indent`], [`TokenKind::Dedent`], and
//! [`TokenKind::Newline`] tokens.

use std::fmt;

use rain_foundation::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Reserved words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Keyword {
    Let,
    Export,
    As,
    Foreign,
    Import,
    Macro,
    Link,
    Library,
    If,
    Else,
    Catch,
    For,
    In,
    With,
    While,
    Until,
    Loop,
    Pass,
    Break,
    Continue,
    Return,
    Save,
    Func,
}

impl Keyword {
    /// Looks up a reserved word.
    #[must_use]
    pub fn from_word(word: &str) -> Option<Self> {
        Some(match word {
            "let" => Self::Let,
            "export" => Self::Export,
            "as" => Self::As,
            "foreign" => Self::Foreign,
            "import" => Self::Import,
            "macro" => Self::Macro,
            "link" => Self::Link,
            "library" => Self::Library,
            "if" => Self::If,
            "else" => Self::Else,
            "catch" => Self::Catch,
            "for" => Self::For,
            "in" => Self::In,
            "with" => Self::With,
            "while" => Self::While,
            "until" => Self::Until,
            "loop" => Self::Loop,
            "pass" => Self::Pass,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "return" => Self::Return,
            "save" => Self::Save,
            "func" => Self::Func,
            _ => return None,
        })
    }

    /// The reserved word as written.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Let => "let",
            Self::Export => "export",
            Self::As => "as",
            Self::Foreign => "foreign",
            Self::Import => "import",
            Self::Macro => "macro",
            Self::Link => "link",
            Self::Library => "library",
            Self::If => "if",
            Self::Else => "else",
            Self::Catch => "catch",
            Self::For => "for",
            Self::In => "in",
            Self::With => "with",
            Self::While => "while",
            Self::Until => "until",
            Self::Loop => "loop",
            Self::Pass => "pass",
            Self::Break => "break",
            Self::Continue => "continue",
            Self::Return => "return",
            Self::Save => "save",
            Self::Func => "func",
        }
    }
}

/// Punctuation that is not an operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `=`
    Assign,
    /// `@`
    At,
    /// `?`
    Question,
}

impl Symbol {
    /// The symbol as written.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LParen => "(",
            Self::RParen => ")",
            Self::LBracket => "[",
            Self::RBracket => "]",
            Self::LBrace => "{",
            Self::RBrace => "}",
            Self::Comma => ",",
            Self::Dot => ".",
            Self::Colon => ":",
            Self::Assign => "=",
            Self::At => "@",
            Self::Question => "?",
        }
    }
}

/// Operators, including the unary-only `!` and the `->` arrow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Operator {
    ColonColon,
    Star,
    Slash,
    Plus,
    Minus,
    Dollar,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
    Amp,
    Pipe,
    Bang,
    Arrow,
}

impl Operator {
    /// The operator as written.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ColonColon => "::",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Dollar => "$",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
            Self::EqEq => "==",
            Self::Ne => "!=",
            Self::Amp => "&",
            Self::Pipe => "|",
            Self::Bang => "!",
            Self::Arrow => "->",
        }
    }
}

/// Token types for Rain.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    /// Identifier.
    Name(String),
    /// Integer literal.
    Int(i64),
    /// Float literal.
    Float(f64),
    /// String literal, escapes resolved.
    Str(String),
    /// `true` or `false`.
    Bool(bool),
    /// `null`
    Null,
    /// `table`
    Table,
    /// Reserved word.
    Keyword(Keyword),
    /// Punctuation.
    Symbol(Symbol),
    /// Operator.
    Operator(Operator),
    /// Start of a more deeply indented block.
    Indent,
    /// End of an indented block.
    Dedent,
    /// End of a logical line.
    Newline,
    /// End of input.
    End,
}

impl TokenKind {
    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Name(_) => "name",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
            Self::Null => "null",
            Self::Table => "table",
            Self::Keyword(k) => k.as_str(),
            Self::Symbol(s) => s.as_str(),
            Self::Operator(o) => o.as_str(),
            Self::Indent => "indent",
            Self::Dedent => "dedent",
            Self::Newline => "newline",
            Self::End => "end of input",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(n) => write!(f, "name {n:?}"),
            Self::Int(i) => write!(f, "integer {i}"),
            Self::Float(x) => write!(f, "float {x}"),
            Self::Str(s) => write!(f, "string {s:?}"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Keyword(_) | Self::Symbol(_) | Self::Operator(_) => {
                write!(f, "'{}'", self.name())
            }
            _ => f.write_str(self.name()),
        }
    }
}
