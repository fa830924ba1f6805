//! Integration tests for macros compiled and run during parsing
//!
//! Every macro here is defined in Rain, compiled by the JIT while its
//! module is being parsed, and expanded before the program is lowered.

use rain_engine::{Session, SessionConfig};
use rain_foundation::{ErrorKind, Result};
use rain_runtime::Value;

fn run_with(config: SessionConfig, source: &str) -> Result<Value> {
    Session::new(config).run_source("main", source)
}

fn run(source: &str) -> Value {
    run_with(SessionConfig::default(), source).unwrap()
}

fn array(items: impl IntoIterator<Item = Value>) -> Value {
    Value::Table(
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| (Value::Int(i as i64), item))
            .collect(),
    )
}

// =============================================================================
// Expression Macros
// =============================================================================

#[test]
fn identity_macro_expands_in_place() {
    let source = "\
macro id(expr) as (e)
    return e
let main = func()
    return @id(1 + 2)
";
    assert_eq!(run(source), Value::Int(3));
}

#[test]
fn macros_build_new_expressions() {
    let source = "\
macro square(expr) as (e)
    return ast.binary(\"*\", e, e)
let main = func()
    let n = 7
    return @square(n)
";
    assert_eq!(run(source), Value::Int(49));
}

#[test]
fn macros_inspect_their_arguments() {
    let source = "\
macro kind(expr) as (e)
    return ast.str(e.type)
let main = func()
    let a = @kind(1)
    let b = @kind(\"s\")
    let c = @kind(f(x))
    return [a, b, c]
";
    assert_eq!(
        run(source),
        array([
            Value::Str("int".into()),
            Value::Str("str".into()),
            Value::Str("call".into()),
        ])
    );
}

#[test]
fn nested_invocations_expand_inner_first() {
    let source = "\
macro twice(compound) as (e)
    return ast.binary(\"+\", e, e)
let main = func()
    return @twice @twice @twice 1
";
    assert_eq!(run(source), Value::Int(8));
}

#[test]
fn macros_see_scalar_arguments() {
    let source = "\
macro repeat(string, int) as (text, n)
    let out = \"\"
    let i = 0
    while i < n
        out = out $ text
        i = i + 1
    return ast.str(out)
let main = func()
    return @repeat \"ab\" 3
";
    assert_eq!(run(source), Value::Str("ababab".into()));
}

// =============================================================================
// Statement Macros
// =============================================================================

#[test]
fn statement_expansions_splice_into_the_caller() {
    let source = "\
macro unless(expr, block) as (pred, body)
    return ast.cond(ast.unary(\"!\", pred), body, null)
let main = func()
    let hits = 0
    @unless false
        hits = hits + 1
    @unless true
        hits = hits + 10
    return hits
";
    assert_eq!(run(source), Value::Int(1));
}

#[test]
fn gensym_keeps_temporaries_apart() {
    let source = "\
macro swap(name, name) as (a, b)
    let tmp = ast.name(gensym())
    return ast.block([
        ast.declare(tmp, ast.name(a)),
        ast.assign(ast.name(a), ast.name(b)),
        ast.assign(ast.name(b), tmp)
    ])
let main = func()
    let x = 1
    let y = 2
    let z = 3
    @swap x y
    @swap y z
    return [x, y, z]
";
    assert_eq!(
        run(source),
        array([Value::Int(2), Value::Int(3), Value::Int(1)])
    );
}

#[test]
fn null_expansions_vanish() {
    let source = "\
macro nothing() as ()
    return null
let main = func()
    @nothing
    return 5
";
    assert_eq!(run(source), Value::Int(5));
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn raising_macros_abort_parsing() {
    let source = "\
macro refuse(int) as (n)
    throw(\"refused \" $ tostr(n))
let main = func()
    return @refuse 3
";
    let err = run_with(SessionConfig::default(), source).unwrap_err();
    let ErrorKind::MacroFailed { name, message } = err.kind else {
        panic!("expected a macro failure, got {err:?}");
    };
    assert_eq!(name, "main:refuse");
    assert_eq!(message, "refused 3");
}

#[test]
fn malformed_nodes_are_rejected() {
    let source = "\
macro bogus() as ()
    return {type = \"nonsense\"}
let main = func()
    return @bogus
";
    let err = run_with(SessionConfig::default(), source).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::MalformedNode(_)), "{err:?}");
}

#[test]
fn unknown_macros() {
    let err = run_with(SessionConfig::default(), "let main = func()\n    return @nope 1\n")
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownMacro(ref name) if name == "nope"));
}

// =============================================================================
// Imported Macros
// =============================================================================

const LIB: &str = "\
macro inc(expr) as (e)
    return ast.binary(\"+\", e, ast.int(1))
";

#[test]
fn imported_macros_use_the_module_prefix() {
    let config = SessionConfig::default().with_source("lib", LIB);
    let source = "\
import lib
let main = func()
    return @lib.inc(41)
";
    assert_eq!(run_with(config, source).unwrap(), Value::Int(42));
}

#[test]
fn imported_macros_use_the_alias() {
    let config = SessionConfig::default().with_source("lib", LIB);
    let source = "\
import lib as l
let main = func()
    return @l.inc(1)
";
    assert_eq!(run_with(config, source).unwrap(), Value::Int(2));
}

#[test]
fn imported_macros_need_the_prefix() {
    let config = SessionConfig::default().with_source("lib", LIB);
    let source = "\
import lib
let main = func()
    return @inc(1)
";
    let err = run_with(config, source).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::UnknownMacro(_)));
}
