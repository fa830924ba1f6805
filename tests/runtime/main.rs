//! Integration tests for Layer 2: Runtime
//!
//! Tests for tables, operators and builtins as compiled code sees them.

mod operators;
mod tables;
