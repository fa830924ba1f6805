//! Lexer, syntax tree, and parser for the Rain language.
//!
//! This crate provides:
//! - [`lexer`] - Tokenization with indentation-driven layout tokens
//! - [`ast`] - The statement and expression tree
//! - [`parser`] - Recursive descent parsing with in-place macro expansion
//! - [`MacroHost`] - The seam through which macros are defined and invoked
//!
//! # Example
//!
//! ```
//! use rain_syntax::{ExprKind, StmtKind, parse_program};
//!
//! let program = parse_program("let x = 1 + 2").unwrap();
//! let StmtKind::Assign { value, .. } = &program.stmts[0].kind else {
//!     panic!("expected an assignment");
//! };
//! assert!(matches!(value.kind, ExprKind::Binary { .. }));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod lexer;
pub mod macro_host;
pub mod parser;
pub mod token;


pub use ast::{
    BinaryOp, Binding, Block, Expr, ExprKind, MacroDef, ParserKind, Program, Stmt, StmtKind,
    UnaryOp,
};
pub use lexer::{Lexer, tokenize};
pub use macro_host::{MacroArg, MacroHost, NoMacros, Node};
pub use parser::{Parser, parse, parse_program};
pub use token::{Keyword, Operator, Symbol, Token, TokenKind};
