//! Integration tests for parsing complete programs

use rain_foundation::ErrorKind;
use rain_syntax::{Binding, ExprKind, StmtKind, parse_program, tokenize};

// =============================================================================
// Layout
// =============================================================================

#[test]
fn nested_functions_and_loops() {
    let source = "\
# counts down from n
let countdown = func(n)
    let out = []
    let i = 0
    while n > 0
        out[i] = n
        n = n - 1
        i = i + 1
    return out

let main = func()
    for x in countdown(3)
        print(x)
";
    let program = parse_program(source).unwrap();
    assert_eq!(program.stmts.len(), 2);

    let StmtKind::Assign { value, binding, .. } = &program.stmts[0].kind else {
        panic!("expected assignment");
    };
    assert_eq!(*binding, Binding::Let);
    let ExprKind::Func { params, body } = &value.kind else {
        panic!("expected function");
    };
    assert_eq!(params, &["n".to_string()]);
    assert_eq!(body.stmts.len(), 4);
    let StmtKind::While { body: loop_body, .. } = &body.stmts[2].kind else {
        panic!("expected while");
    };
    assert_eq!(loop_body.stmts.len(), 3);
}

#[test]
fn statement_spans_cover_their_lines() {
    let program = parse_program("let a = 1\n\nlet b = 2\n").unwrap();
    assert_eq!(program.stmts[0].span.line, 1);
    assert_eq!(program.stmts[1].span.line, 3);
}

#[test]
fn catch_and_save() {
    let source = "\
let f = func()
    catch err
        save 1
        risky()
    return err
";
    let program = parse_program(source).unwrap();
    let StmtKind::Assign { value, .. } = &program.stmts[0].kind else {
        panic!("expected assignment");
    };
    let ExprKind::Func { body, .. } = &value.kind else {
        panic!("expected function");
    };
    let StmtKind::Catch { name, body: protected } = &body.stmts[0].kind else {
        panic!("expected catch");
    };
    assert_eq!(name, "err");
    assert!(matches!(protected.stmts[0].kind, StmtKind::Save(_)));
    assert!(matches!(protected.stmts[1].kind, StmtKind::Expr(_)));
}

#[test]
fn keywords_as_dict_keys_need_brackets() {
    assert!(parse_program("let d = {[\"let\"] = true}").is_ok());
    assert!(parse_program("let d = {let = true}").is_err());
}

#[test]
fn attach_operator() {
    let program = parse_program("let t = {a = 1} :: base").unwrap();
    let StmtKind::Assign { value, .. } = &program.stmts[0].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(value.kind, ExprKind::Binary { .. }));
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn inconsistent_dedent_is_a_parse_error() {
    let err = tokenize("if a\n    b\n  c\n").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Parse { .. }));
}

#[test]
fn unterminated_block() {
    let err = parse_program("let f = func()\n").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::Parse { .. }));
}

#[test]
fn errors_report_line_and_column() {
    let err = parse_program("let a = 1\nlet b = (2 +\n").unwrap_err();
    let ErrorKind::Parse { line, .. } = err.kind else {
        panic!("expected parse error, got {err:?}");
    };
    assert!(line >= 2);
}
