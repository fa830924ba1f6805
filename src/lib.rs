//! Rain - a small dynamic language compiled to native code
//!
//! This crate re-exports every layer of the Rain compiler.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: rain_engine     - Sessions, module loader, JIT macro engine
//! Layer 3: rain_codegen    - Scopes, static tables, lowering to Cranelift IR
//! Layer 2: rain_runtime    - Boxes, tables, operators and builtins called by compiled code
//! Layer 1: rain_syntax     - Lexer, parser, syntax tree, macro host interface
//! Layer 0: rain_foundation - Errors, spans, diagnostics, the value ABI
//! ```

pub use rain_codegen as codegen;
pub use rain_engine as engine;
pub use rain_foundation as foundation;
pub use rain_runtime as runtime;
pub use rain_syntax as syntax;
