//! Integration tests for Layer 1: Syntax
//!
//! Tests for whole-program layout and for the parser's conversation with a
//! macro host.

mod macro_host;
mod programs;
