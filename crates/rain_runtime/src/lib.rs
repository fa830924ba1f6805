//! Runtime library for compiled Rain programs.
//!
//! Generated code calls these functions by name. The same library is
//! registered with the JIT for macros and in-process runs, and linked as a
//! static library into native executables.
//!
//! This crate provides:
//! - [`RBox`], [`RTable`], [`RItem`] - `#[repr(C)]` views of the box ABI
//! - [`table`] - Table get/put following the shared probe law
//! - [`ops`], [`builtins`], [`process`] - Entry points with C linkage
//! - [`Value`] - Owned host-side snapshots of runtime values
//! - [`symbols`] - Name/address pairs for JIT symbol registration

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod access;
pub mod boxes;
pub mod builtins;
pub mod call;
pub mod ops;
pub mod process;
pub mod symbols;
pub mod table;
pub mod value;

pub use boxes::{RBox, RItem, RTable};
pub use call::{EntryFn, RunnerFn, call_entry, call_runner};
pub use symbols::symbols;
pub use table::TableError;
pub use value::Value;
