//! Lowering of Rain syntax trees to Cranelift IR.
//!
//! Every Rain value lives in a 32-byte box; every expression lowers to a
//! pointer to one. Functions take a result cell followed by one cell per
//! parameter and return a status: 0 for a normal return, 1 when the result
//! cell holds a raised exception. Module scope never produces code. Its
//! statements fold to static data, including tables laid out with the same
//! probe law the runtime uses.
//!
//! This crate provides:
//! - [`Backend`] and [`Pool`] - A Cranelift module plus interned strings, imports and tables
//! - [`ConstBox`] - Compile-time values written into data objects
//! - [`StaticTables`] - Tables built at compile time, identical in layout to runtime tables
//! - [`Scopes`] and [`free_variables`] - Name resolution and closure captures
//! - [`UnitInterface`] - What a lowered unit exposes to importers and entry points
//! - [`runtime`] - Signatures of the runtime entry points generated code calls

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod backend;
pub mod constant;
pub mod entry;
mod lower;
pub mod runtime;
pub mod scope;
pub mod static_table;
pub mod unit;

pub use backend::{Backend, Pool};
pub use constant::{ConstBox, ConstValue};
pub use runtime::box_signature;
pub use scope::{Scopes, free_variables, local_bindings};
pub use static_table::{SlotLookup, StaticTables, TableId, TableSlots};
pub use unit::{UnitInterface, UnitSource};
