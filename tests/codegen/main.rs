//! Integration tests for Layer 3: Code generation
//!
//! Programs are compiled and run in process; each test checks what `main`
//! returns.

mod closures;
mod control;
mod exceptions;
mod module_scope;
mod tables;

use rain_engine::{Session, SessionConfig};
use rain_foundation::Error;
use rain_runtime::Value;

/// Runs `source` and returns the value of its `main`.
pub fn run(source: &str) -> Value {
    Session::new(SessionConfig::default())
        .run_source("main", source)
        .unwrap_or_else(|err| panic!("{}", err.report()))
}

/// Compiles and runs `source`, expecting an error.
pub fn run_err(source: &str) -> Error {
    match Session::new(SessionConfig::default()).run_source("main", source) {
        Ok(value) => panic!("expected an error, got {value}"),
        Err(err) => err,
    }
}
