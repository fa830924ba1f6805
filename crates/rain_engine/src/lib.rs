//! Compilation sessions for Rain.
//!
//! Macros are compiled to native code the moment the parser sees their
//! definition, then called while the rest of the file is still being
//! parsed. Programs are lowered with their imports into a single Cranelift
//! module that is either run in this process or written out as an object
//! file.
//!
//! This crate provides:
//! - [`Session`] - Parse, run, or build a program and everything it imports
//! - [`SessionConfig`] - Search paths, in-memory modules, and program arguments
//! - [`Loader`] - Module resolution, caching, and import cycle detection
//! - [`Macro`] and [`MacroRegistry`] - JIT-compiled macros and the names they are visible under
//! - [`marshal`] - The table encoding of syntax trees that macros consume and produce

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod engine;
pub mod loader;
pub mod macros;
pub mod marshal;
pub mod prelude;
pub mod session;

pub use config::SessionConfig;
pub use engine::Loaded;
pub use loader::{LoadedModule, Loader, Source};
pub use macros::{Macro, MacroRegistry};
pub use session::{ObjectFile, Session};
