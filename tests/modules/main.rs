//! Integration tests for imports, module loading and object emission

use std::fs;
use std::path::PathBuf;

use rain_engine::{Session, SessionConfig};
use rain_foundation::ErrorKind;
use rain_runtime::Value;

const LIB: &str = "\
export answer = 42
export double = func(n) -> n * 2
export counter = {hits = 0}
export bump = func()
    counter.hits = counter.hits + 1
    return counter.hits
let hidden = \"internal\"
";

fn session(modules: &[(&str, &str)]) -> Session {
    let config = modules
        .iter()
        .fold(SessionConfig::default(), |config, (name, text)| {
            config.with_source(*name, *text)
        });
    Session::new(config)
}

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rain_modules_{}_{name}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

// =============================================================================
// Imports
// =============================================================================

#[test]
fn exported_values_are_reachable_through_the_module_name() {
    let mut session = session(&[("lib", LIB)]);
    let source = "\
import lib
let main = func()
    return lib.double(lib.answer)
";
    assert_eq!(session.run_source("main", source).unwrap(), Value::Int(84));
}

#[test]
fn aliases_rename_the_module() {
    let mut session = session(&[("lib", LIB)]);
    let source = "\
import lib as l
let main = func()
    return l.answer
";
    assert_eq!(session.run_source("main", source).unwrap(), Value::Int(42));
}

#[test]
fn module_state_is_shared() {
    let mut session = session(&[("lib", LIB)]);
    let source = "\
import lib
let main = func()
    lib.bump()
    lib.bump()
    return lib.counter.hits
";
    assert_eq!(session.run_source("main", source).unwrap(), Value::Int(2));
}

#[test]
fn module_scope_reaches_unexported_globals() {
    let mut session = session(&[("lib", LIB)]);
    let source = "\
import lib
let hidden = lib.hidden
let missing = lib.missing
let main = func()
    return [hidden, missing]
";
    assert_eq!(
        session.run_source("main", source).unwrap(),
        Value::Table(vec![
            (Value::Int(0), Value::Str("internal".into())),
            (Value::Int(1), Value::Null),
        ])
    );
}

#[test]
fn transitive_imports_initialize_first() {
    let mut session = session(&[
        ("base", "export log = []\nlet init = func()\n    log[0] = \"base\"\n"),
        (
            "mid",
            "import base\nlet init = func()\n    base.log[1] = \"mid\"\n",
        ),
    ]);
    let source = "\
import mid
import base
let main = func()
    return base.log
";
    assert_eq!(
        session.run_source("main", source).unwrap(),
        Value::Table(vec![
            (Value::Int(0), Value::Str("base".into())),
            (Value::Int(1), Value::Str("mid".into())),
        ])
    );
}

#[test]
fn the_ast_library_is_importable() {
    let mut session = Session::new(SessionConfig::default());
    let source = "\
import ast
let main = func()
    let node = ast.binary(\"+\", ast.int(1), ast.int(2))
    return [node.op, ast.is(node, \"binary\")]
";
    assert_eq!(
        session.run_source("main", source).unwrap(),
        Value::Table(vec![
            (Value::Int(0), Value::Str("+".into())),
            (Value::Int(1), Value::Bool(true)),
        ])
    );
}

// =============================================================================
// Loader Errors
// =============================================================================

#[test]
fn missing_modules() {
    let mut session = Session::new(SessionConfig::default());
    let err = session
        .run_source("main", "import nowhere\nlet main = func()\n    return 1\n")
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::ModuleNotFound(ref name) if name == "nowhere"));
}

#[test]
fn import_cycles() {
    let mut session = session(&[("a", "import b\n"), ("b", "import a\n")]);
    let err = session
        .run_source("main", "import a\nlet main = func()\n    return 1\n")
        .unwrap_err();
    let ErrorKind::ImportCycle(cycle) = err.kind else {
        panic!("expected an import cycle, got {err:?}");
    };
    assert_eq!(cycle, ["a", "b", "a"]);
}

#[test]
fn errors_name_the_failing_module() {
    let mut session = session(&[("broken", "let x = (1 +\n")]);
    let err = session
        .run_source("main", "import broken\nlet main = func()\n    return 1\n")
        .unwrap_err();
    let context = err.context.expect("parse errors carry context");
    assert_eq!(context.source.as_deref(), Some("broken"));
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn files_import_siblings_and_packages() {
    let dir = scratch_dir("files");
    fs::write(dir.join("helper.rn"), "export greet = func(who) -> \"hi \" $ who\n").unwrap();
    fs::create_dir_all(dir.join("tools")).unwrap();
    fs::write(dir.join("tools").join("_pkg.rn"), "export name = \"tools\"\n").unwrap();
    fs::write(
        dir.join("app.rn"),
        "import helper\nimport tools\nlet main = func()\n    return helper.greet(tools.name)\n",
    )
    .unwrap();

    let mut session = Session::new(SessionConfig::default());
    let value = session.run_file(&dir.join("app.rn")).unwrap();
    assert_eq!(value, Value::Str("hi tools".into()));
}

#[test]
fn search_paths_are_consulted() {
    let dir = scratch_dir("search");
    fs::write(dir.join("shared.rn"), "export seven = 7\n").unwrap();
    let mut session = Session::new(SessionConfig::default().with_search_path(&dir));
    let source = "import shared\nlet main = func()\n    return shared.seven\n";
    assert_eq!(session.run_source("main", source).unwrap(), Value::Int(7));
}

#[test]
fn missing_files() {
    let mut session = Session::new(SessionConfig::default());
    let err = session
        .run_file(&scratch_dir("missing").join("absent.rn"))
        .unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Io { .. }), "{err:?}");
}

// =============================================================================
// Objects
// =============================================================================

#[test]
fn building_emits_an_object() {
    let mut session = session(&[("lib", LIB)]);
    let source = "\
import lib
link \"support.o\"
library \"c\"
let main = func()
    print(lib.double(3))
";
    let object = session.build_source("main", source).unwrap();
    assert!(!object.bytes.is_empty());
    assert_eq!(object.links, ["support.o"]);
    assert_eq!(object.libraries, ["c"]);
}

#[test]
fn foreign_exports_name_a_symbol() {
    let mut session = Session::new(SessionConfig::default());
    let source = "\
export limit = 10
export limit as foreign \"rain_limit\"
let main = func()
    return limit
";
    let object = session.build_source("main", source).unwrap();
    let symbol = b"rain_limit";
    assert!(object.bytes.windows(symbol.len()).any(|w| w == symbol));

    let mut session = Session::new(SessionConfig::default());
    assert_eq!(session.run_source("main", source).unwrap(), Value::Int(10));
}
