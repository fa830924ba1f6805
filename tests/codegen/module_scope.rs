//! Integration tests for module-scope folding into static data

use rain_engine::{Session, SessionConfig};
use rain_foundation::{ErrorKind, Level};
use rain_runtime::Value;

use crate::{run, run_err};

#[test]
fn module_tables_are_static_and_mutable() {
    let source = "\
let config = {name = \"rain\", [\"let\"] = 1, [2] = [10, 20]}
config.extra = true
let main = func()
    config.name = config.name $ \"!\"
    return [config.name, config[\"let\"], config[2][1], config.extra]
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Str("rain!".into())),
            (Value::Int(1), Value::Int(1)),
            (Value::Int(2), Value::Int(20)),
            (Value::Int(3), Value::Bool(true)),
        ])
    );
}

#[test]
fn module_names_fold_to_their_current_value() {
    let source = "\
let a = 1
let b = a
a = 2
let main = func()
    return [a, b]
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Int(2)),
            (Value::Int(1), Value::Int(1)),
        ])
    );
}

#[test]
fn functions_see_globals_assigned_at_run_time() {
    let source = "\
let count = 0
let bump = func()
    count = count + 1
let main = func()
    bump()
    bump()
    return count
";
    assert_eq!(run(source), Value::Int(2));
}

#[test]
fn exports_are_globals_too() {
    let source = "\
export version = 3
export describe = func() -> \"v\" $ tostr(version)
let main = func()
    return describe()
";
    assert_eq!(run(source), Value::Str("v3".into()));
}

#[test]
fn attach_at_module_scope() {
    let source = "\
let base = {kind = \"base\"}
let derived = {name = \"derived\"} :: base
let main = func()
    return derived.kind $ \"/\" $ derived.name
";
    assert_eq!(run(source), Value::Str("base/derived".into()));
}

#[test]
fn foreign_functions_bind_runtime_symbols() {
    let source = "\
let kind = foreign rain_type(v)
let main = func()
    return kind(1.5)
";
    assert_eq!(run(source), Value::Str("float".into()));
}

#[test]
fn init_runs_before_main() {
    let source = "\
let log = []
let init = func()
    log[0] = \"init\"
let main = func()
    log[1] = \"main\"
    return log
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Str("init".into())),
            (Value::Int(1), Value::Str("main".into())),
        ])
    );
}

#[test]
fn calls_are_rejected_at_module_scope() {
    let err = run_err("let x = print(1)\nlet main = func() -> x\n");
    assert!(matches!(err.kind, ErrorKind::InvalidScope(_)));
}

#[test]
fn operators_are_rejected_at_module_scope() {
    let err = run_err("let x = 1 + 2\nlet main = func() -> x\n");
    assert!(matches!(err.kind, ErrorKind::InvalidScope(_)));
    let err = run_err("let y = 1\nlet x = -y\nlet main = func() -> x\n");
    assert!(matches!(err.kind, ErrorKind::InvalidScope(_)));
}

#[test]
fn negative_literals_are_constants() {
    assert_eq!(run("let x = -4\nlet main = func() -> x\n"), Value::Int(-4));
}

#[test]
fn assigning_an_undeclared_global_fails() {
    let err = run_err("missing = 1\nlet main = func() -> 0\n");
    assert!(matches!(err.kind, ErrorKind::UndeclaredGlobal(_)));
}

#[test]
fn error_nodes_abort_compilation() {
    let source = "\
macro stop() as ()
    return ast.error(\"stop here\")
@stop
let main = func() -> 0
";
    let err = run_err(source);
    assert!(matches!(err.kind, ErrorKind::UserError(ref message) if message == "stop here"));
}

#[test]
fn warning_and_hint_nodes_are_collected() {
    let mut session = Session::new(SessionConfig::default());
    let source = "\
macro advise() as ()
    return ast.block([ast.warning(\"careful\"), ast.hint(\"try this\")])
@advise
let main = func() -> 0
";
    session.run_source("main", source).unwrap();
    let levels: Vec<_> = session.diagnostics().iter().map(|d| d.level).collect();
    assert_eq!(levels, [Level::Warning, Level::Hint]);
    let first = session.diagnostics().iter().next().unwrap();
    assert_eq!(first.message, "careful");
    assert_eq!(first.source.as_deref(), Some("main"));
}
