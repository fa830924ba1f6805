//! Integration tests for raising, catching and `?` calls

use rain_foundation::ErrorKind;
use rain_runtime::Value;

use crate::{run, run_err};

#[test]
fn catch_receives_the_exception() {
    let source = "\
let main = func()
    catch err
        throw(\"boom\")
        return \"not reached\"
    return err
";
    assert_eq!(run(source), Value::Str("boom".into()));
}

#[test]
fn catch_without_an_exception_leaves_null() {
    let source = "\
let main = func()
    catch err
        let x = 1
    return err
";
    assert_eq!(run(source), Value::Null);
}

#[test]
fn exceptions_unwind_through_calls() {
    let source = "\
let inner = func()
    throw({code = 7})
let middle = func()
    inner()
    return \"not reached\"
let main = func()
    catch err
        middle()
    return err.code
";
    assert_eq!(run(source), Value::Int(7));
}

#[test]
fn nearest_catch_wins() {
    let source = "\
let main = func()
    let log = []
    catch outer
        catch inner
            throw(\"first\")
        log[0] = inner
        throw(\"second\")
    log[1] = outer
    return log
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Str("first".into())),
            (Value::Int(1), Value::Str("second".into())),
        ])
    );
}

#[test]
fn question_mark_turns_the_exception_into_the_value() {
    let source = "\
let fails = func(x)
    throw(\"bad \" $ tostr(x))
let main = func()
    return fails?(3)
";
    assert_eq!(run(source), Value::Str("bad 3".into()));
}

#[test]
fn question_mark_does_not_catch_argument_errors() {
    let source = "\
let id = func(x) -> x
let main = func()
    catch err
        let value = id?(1 / 0)
        return \"not reached\"
    return \"outer: \" $ err
";
    assert_eq!(run(source), Value::Str("outer: division by zero".into()));
}

#[test]
fn question_mark_does_not_catch_the_call_guard() {
    let source = "\
let main = func()
    catch err
        let f = 5
        let value = f?()
    return err
";
    assert_eq!(run(source), Value::Str("can't call int".into()));
}

#[test]
fn question_mark_methods() {
    let source = "\
let main = func()
    let obj = {fail = func(self) -> throw(\"method failed\")}
    return obj:fail?()
";
    assert_eq!(run(source), Value::Str("method failed".into()));
}

#[test]
fn operator_errors_are_exceptions() {
    let source = "\
let main = func()
    catch err
        let x = \"a\" + 1
    return err
";
    assert_eq!(run(source), Value::Str("can't add str and int".into()));
}

#[test]
fn uncaught_exceptions_reach_the_session() {
    let err = run_err("let main = func()\n    return 1 / 0\n");
    assert!(matches!(err.kind, ErrorKind::Uncaught(ref text) if text == "division by zero"));
}

#[test]
fn returns_inside_catch_leave_the_function() {
    let source = "\
let main = func()
    catch err
        return \"early\"
    return \"late\"
";
    assert_eq!(run(source), Value::Str("early".into()));
}
