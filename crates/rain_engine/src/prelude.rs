//! Builtin units: the prelude every unit sees, and the `ast` library that
//! macros import to build syntax trees.

use std::collections::HashMap;

use cranelift_module::Module;
use rain_codegen::{Backend, UnitInterface, UnitSource};
use rain_foundation::{Diagnostics, Result};
use rain_syntax::parse_program;

/// Module name of the prelude.
pub const PRELUDE_NAME: &str = "prelude";

/// Names copied into every unit's module scope.
pub const PRELUDE: &str = r#"
let print = foreign rain_print(value)
let tostr = foreign rain_tostr(value)
let throw = foreign rain_throw(value)
let type = foreign rain_type(value)
let len = foreign rain_len(value)
let args = foreign rain_args()
"#;

/// Constructors for the table encoding of syntax-tree nodes.
pub const AST: &str = r#"
# Syntax-tree constructors for macros.

export nil = func() -> {type = "null"}
export int = func(value) -> {type = "int", value = value}
export float = func(value) -> {type = "float", value = value}
export bool = func(value) -> {type = "bool", value = value}
export str = func(value) -> {type = "str", value = value}
export name = func(value) -> {type = "name", value = value}
export array = func(items) -> {type = "array", items = items}

export call = func(fn, args) -> {type = "call", ["func"] = fn, args = args, ["catch"] = false}
export method = func(lhs, name, args) -> {type = "meth", lhs = lhs, name = name, args = args, ["catch"] = false}
export index = func(lhs, rhs) -> {type = "idx", lhs = lhs, rhs = rhs}
export unary = func(op, val) -> {type = "unary", op = op, val = val}
export binary = func(op, lhs, rhs) -> {type = "binary", op = op, lhs = lhs, rhs = rhs}
export function = func(params, body) -> {type = "func", params = params, body = body}

export block = func(stmts) -> {type = "block", stmts = stmts}
export declare = func(lhs, rhs) -> {type = "assn", lhs = lhs, rhs = rhs, ["let"] = true, ["export"] = false}
export assign = func(lhs, rhs) -> {type = "assn", lhs = lhs, rhs = rhs, ["let"] = false, ["export"] = false}
export ret = func(value) -> {type = "return", value = value}
export cond = func(pred, body, els) -> {type = "if", pred = pred, body = body, els = els}
export error = func(msg) -> {type = "error", msg = msg}
export warning = func(msg) -> {type = "warning", msg = msg}
export hint = func(msg) -> {type = "hint", msg = msg}

export is = func(node, kind) -> node.type == kind
"#;

/// Source of a module that ships with the compiler.
#[must_use]
pub fn library(name: &str) -> Option<&'static str> {
    match name {
        "ast" => Some(AST),
        _ => None,
    }
}

/// Lowers the prelude into `backend`.
///
/// # Errors
/// Returns an error if the prelude does not lower, which means the runtime
/// library and the prelude disagree.
pub fn lower_prelude<M: Module>(
    backend: &mut Backend<M>,
    diagnostics: &mut Diagnostics,
) -> Result<UnitInterface> {
    let program = parse_program(PRELUDE).map_err(|err| err.in_source(PRELUDE_NAME))?;
    let imports = HashMap::new();
    backend.lower_unit(
        &UnitSource {
            name: PRELUDE_NAME,
            program: &program,
            imports: &imports,
            prelude: None,
        },
        diagnostics,
    )
}
