//! Integration tests for functions, closures and calls

use rain_foundation::ErrorKind;
use rain_runtime::Value;

use crate::{run, run_err};

#[test]
fn captures_are_snapshots() {
    let source = "\
let main = func()
    let x = 1
    let get = func() -> x
    x = 2
    return get()
";
    assert_eq!(run(source), Value::Int(1));
}

#[test]
fn each_closure_keeps_its_own_state() {
    let source = "\
let counter = func()
    let n = 0
    return func()
        n = n + 1
        return n
let main = func()
    let a = counter()
    let b = counter()
    a()
    a()
    return [a(), b()]
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Int(3)),
            (Value::Int(1), Value::Int(1)),
        ])
    );
}

#[test]
fn local_functions_can_call_themselves() {
    let source = "\
let main = func()
    let fact = func(n)
        if n < 2
            return 1
        return n * fact(n - 1)
    return fact(10)
";
    assert_eq!(run(source), Value::Int(3_628_800));
}

#[test]
fn module_functions_recurse_through_globals() {
    let source = "\
let fib = func(n)
    if n < 2
        return n
    return fib(n - 1) + fib(n - 2)
let main = func()
    return fib(20)
";
    assert_eq!(run(source), Value::Int(6765));
}

#[test]
fn nested_closures_capture_through_levels() {
    let source = "\
let main = func()
    let base = 10
    let outer = func(a)
        return func(b) -> base + a + b
    return outer(1)(2)
";
    assert_eq!(run(source), Value::Int(13));
}

#[test]
fn functions_are_values() {
    let source = "\
let apply = func(f, x) -> f(x)
let main = func()
    return apply(func(v) -> v * 2, 21)
";
    assert_eq!(run(source), Value::Int(42));
}

#[test]
fn methods_receive_their_table() {
    let source = "\
let main = func()
    let point = {x = 3, y = 4}
    point.sum = func(self) -> self.x + self.y
    return point:sum()
";
    assert_eq!(run(source), Value::Int(7));
}

#[test]
fn methods_are_found_through_the_environment() {
    let source = "\
let proto = {describe = func(self) -> \"point \" $ tostr(self.x)}
let main = func()
    let p = {x = 5} :: proto
    return p:describe()
";
    assert_eq!(run(source), Value::Str("point 5".into()));
}

#[test]
fn save_sets_the_result_without_returning() {
    let source = "\
let f = func()
    save 1
    let ignored = 2
let main = func()
    return f()
";
    assert_eq!(run(source), Value::Int(1));
}

#[test]
fn falling_off_the_end_returns_null() {
    let source = "\
let f = func(x)
    let y = x
let main = func()
    return f(1)
";
    assert_eq!(run(source), Value::Null);
}

#[test]
fn wrong_arity_raises() {
    let source = "\
let f = func(a, b) -> a
let main = func()
    return f(1)
";
    let err = run_err(source);
    assert!(matches!(
        err.kind,
        ErrorKind::Uncaught(ref text) if text == "function expects 2 arguments, got 1"
    ));
}

#[test]
fn unknown_names_fail_to_compile() {
    let err = run_err("let main = func()\n    return nowhere\n");
    assert!(matches!(err.kind, ErrorKind::UnknownName(ref name) if name == "nowhere"));
}

#[test]
fn shadowing_in_one_branch_keeps_earlier_captures() {
    let source = "\
let main = func()
    let x = 5
    let pick = func(flag)
        let seen = x
        if flag
            let x = 1
        return [seen, x]
    return [pick(true), pick(false)]
";
    let pair = |a: Value, b: Value| Value::Table(vec![(Value::Int(0), a), (Value::Int(1), b)]);
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), pair(Value::Int(5), Value::Int(1))),
            (Value::Int(1), pair(Value::Int(5), Value::Null)),
        ])
    );
}
