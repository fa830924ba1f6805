//! Errors, source spans, diagnostics, and the box ABI for Rain.
//!
//! This crate provides:
//! - [`Error`] - Compile-time errors with source context
//! - [`Span`] - Source locations for tokens and syntax-tree nodes
//! - [`Diagnostics`] - Sink for warnings and hints that do not abort compilation
//! - [`abi`] - The in-memory layout of boxes and tables, and the probe law
//!   shared by compile-time and runtime tables

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod abi;
pub mod diagnostics;
pub mod error;
pub mod span;

pub use abi::{HASH_SIZE, TypeTag};
pub use diagnostics::{Diagnostic, Diagnostics, Level};
pub use error::{Error, ErrorContext, ErrorKind};
pub use span::Span;

/// Result type alias using the Rain error type.
pub type Result<T> = std::result::Result<T, Error>;
