//! Integration tests for branches, loops and short-circuit operators

use rain_foundation::ErrorKind;
use rain_runtime::Value;

use crate::{run, run_err};

/// `range(n)` yields 0 through n - 1, then null.
const RANGE: &str = "\
let range = func(n)
    let i = 0
    return func()
        if i < n
            i = i + 1
            return i - 1
";

#[test]
fn if_else_chains() {
    let source = "\
let classify = func(n)
    if n < 0
        return \"negative\"
    else if n == 0
        return \"zero\"
    else
        return \"positive\"
let main = func()
    return classify(-3) $ \" \" $ classify(0) $ \" \" $ classify(8)
";
    assert_eq!(run(source), Value::Str("negative zero positive".into()));
}

#[test]
fn while_and_until() {
    let source = "\
let main = func()
    let i = 0
    let total = 0
    while i < 5
        total = total + i
        i = i + 1
    until i == 0
        i = i - 1
    return [total, i]
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Int(10)),
            (Value::Int(1), Value::Int(0)),
        ])
    );
}

#[test]
fn loop_with_guarded_break_and_continue() {
    let source = "\
let main = func()
    let i = 0
    let odd = 0
    loop
        i = i + 1
        break if i > 9
        continue if i / 2 * 2 == i
        odd = odd + i
    return odd
";
    assert_eq!(run(source), Value::Int(1 + 3 + 5 + 7 + 9));
}

#[test]
fn for_stops_at_the_first_null() {
    let source = format!(
        "{RANGE}\
let main = func()
    let total = 0
    for x in range(4)
        total = total + x
    return total
"
    );
    assert_eq!(run(&source), Value::Int(6));
}

#[test]
fn for_with_several_generators_stops_at_the_shortest() {
    let source = format!(
        "{RANGE}\
let main = func()
    let pairs = 0
    let last = null
    for a, b in range(10), range(3)
        pairs = pairs + 1
        last = a + b
    return [pairs, last]
"
    );
    assert_eq!(
        run(&source),
        Value::Table(vec![
            (Value::Int(0), Value::Int(3)),
            (Value::Int(1), Value::Int(4)),
        ])
    );
}

#[test]
fn for_over_an_exhausted_generator_never_runs() {
    let source = "\
let main = func()
    let ran = false
    for x in func() -> null
        ran = true
    return ran
";
    assert_eq!(run(source), Value::Bool(false));
}

#[test]
fn for_requires_nullary_generators() {
    let source = "\
let main = func()
    for x in func(a) -> a
        pass
";
    let err = run_err(source);
    assert!(matches!(err.kind, ErrorKind::Uncaught(_)));
}

#[test]
fn short_circuit_skips_the_right_side() {
    let source = "\
let hits = {n = 0}
let bump = func()
    hits.n = hits.n + 1
    return true
let main = func()
    let a = false & bump()
    let b = true | bump()
    let c = true & bump()
    let d = null | bump()
    return [hits.n, a, b, c, d]
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Int(2)),
            (Value::Int(1), Value::Bool(false)),
            (Value::Int(2), Value::Bool(true)),
            (Value::Int(3), Value::Bool(true)),
            (Value::Int(4), Value::Bool(true)),
        ])
    );
}

#[test]
fn and_or_return_the_deciding_operand() {
    let source = "\
let main = func()
    return [0 | \"fallback\", 3 & 4, \"\" & 5]
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Str("fallback".into())),
            (Value::Int(1), Value::Int(4)),
            (Value::Int(2), Value::Str(String::new())),
        ])
    );
}

#[test]
fn with_passes_the_block_as_a_function() {
    let source = "\
let twice = func(block)
    block(1)
    block(2)
let main = func()
    let log = {total = 0}
    with twice as n
        log.total = log.total + n
    return log.total
";
    assert_eq!(run(source), Value::Int(3));
}

#[test]
fn break_outside_a_loop_is_rejected() {
    let err = run_err("let main = func()\n    break\n");
    assert!(matches!(err.kind, ErrorKind::InvalidScope(_)));
}

#[test]
fn loops_are_rejected_at_module_scope() {
    let err = run_err("while true\n    pass\nlet main = func() -> 0\n");
    assert!(matches!(err.kind, ErrorKind::InvalidScope(_)));
}

// =============================================================================
// Bindings on Skipped Paths
// =============================================================================

#[test]
fn let_in_a_skipped_branch_reads_null() {
    let source = "\
let pick = func(flag)
    if flag
        let y = 1
    return y
let main = func()
    return [pick(true), pick(false)]
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Int(1)),
            (Value::Int(1), Value::Null),
        ])
    );
}

#[test]
fn catch_and_for_names_in_a_skipped_branch_read_null() {
    let source = "\
let once = func()
    let done = false
    return func()
        if done
            return null
        done = true
        return 9
let pick = func(flag)
    if flag
        for x in once()
            pass
        catch err
            throw(\"bad\")
    return [x, err]
let main = func()
    return [pick(true), pick(false)]
";
    let pair = |x: Value, err: Value| Value::Table(vec![(Value::Int(0), x), (Value::Int(1), err)]);
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), pair(Value::Null, Value::Str("bad".into()))),
            (Value::Int(1), pair(Value::Null, Value::Null)),
        ])
    );
}

#[test]
fn loop_bodies_that_never_run_leave_bindings_null() {
    let source = "\
let count = func(n)
    let i = 0
    while i < n
        let last = i
        i = i + 1
    return last
let main = func()
    return [count(3), count(0)]
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Int(2)),
            (Value::Int(1), Value::Null),
        ])
    );
}
