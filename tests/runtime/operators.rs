//! Integration tests for operator primitives and builtins

use rain_runtime::builtins::{rain_len, rain_tostr, rain_type};
use rain_runtime::ops::{
    rain_add, rain_check_callable, rain_div, rain_eq, rain_lt, rain_not, rain_string_concat,
    truthy,
};
use rain_runtime::{RBox, Value, symbols, table};

type Binary = unsafe extern "C" fn(*mut RBox, *const RBox, *const RBox) -> i32;
type Unary = unsafe extern "C" fn(*mut RBox, *const RBox) -> i32;

fn binary(op: Binary, a: RBox, b: RBox) -> Result<Value, Value> {
    let mut ret = RBox::null();
    let status = unsafe { op(&mut ret, &a, &b) };
    let value = unsafe { Value::from_box(&ret) };
    if status == 0 { Ok(value) } else { Err(value) }
}

fn unary(op: Unary, a: RBox) -> Result<Value, Value> {
    let mut ret = RBox::null();
    let status = unsafe { op(&mut ret, &a) };
    let value = unsafe { Value::from_box(&ret) };
    if status == 0 { Ok(value) } else { Err(value) }
}

#[test]
fn arithmetic_widens_mixed_operands() {
    assert_eq!(binary(rain_add, RBox::int(1), RBox::int(2)), Ok(Value::Int(3)));
    assert_eq!(
        binary(rain_add, RBox::int(1), RBox::float(0.5)),
        Ok(Value::Float(1.5))
    );
    assert_eq!(binary(rain_div, RBox::int(7), RBox::int(2)), Ok(Value::Int(3)));
}

#[test]
fn integer_division_by_zero_raises() {
    assert_eq!(
        binary(rain_div, RBox::int(1), RBox::int(0)),
        Err(Value::Str("division by zero".into()))
    );
    assert!(binary(rain_div, RBox::float(1.0), RBox::float(0.0)).is_ok());
}

#[test]
fn type_errors_raise() {
    assert!(binary(rain_add, RBox::string("a"), RBox::int(1)).is_err());
    assert!(binary(rain_lt, RBox::null(), RBox::int(1)).is_err());
    assert!(binary(rain_string_concat, RBox::string("a"), RBox::int(1)).is_err());
}

#[test]
fn concatenation_and_comparison() {
    assert_eq!(
        binary(rain_string_concat, RBox::string("ra"), RBox::string("in")),
        Ok(Value::Str("rain".into()))
    );
    assert_eq!(
        binary(rain_lt, RBox::string("a"), RBox::string("b")),
        Ok(Value::Bool(true))
    );
    assert_eq!(
        binary(rain_eq, RBox::int(2), RBox::float(2.0)),
        Ok(Value::Bool(true))
    );
}

#[test]
fn tables_are_equal_by_identity() {
    let a = RBox::new_table();
    let b = RBox::new_table();
    assert_eq!(binary(rain_eq, a, a), Ok(Value::Bool(true)));
    assert_eq!(binary(rain_eq, a, b), Ok(Value::Bool(false)));
}

#[test]
fn falsy_values() {
    for value in [
        RBox::null(),
        RBox::bool(false),
        RBox::int(0),
        RBox::float(0.0),
        RBox::string(""),
    ] {
        assert!(!truthy(&value));
        assert_eq!(unary(rain_not, value), Ok(Value::Bool(true)));
    }
    assert!(truthy(&RBox::new_table()));
    assert!(truthy(&RBox::string("0")));
}

#[test]
fn builtins() {
    assert_eq!(unary(rain_type, RBox::float(1.0)), Ok(Value::Str("float".into())));
    assert_eq!(unary(rain_tostr, RBox::float(2.0)), Ok(Value::Str("2.0".into())));
    assert_eq!(unary(rain_len, RBox::string("four")), Ok(Value::Int(4)));
    assert!(unary(rain_len, RBox::int(4)).is_err());

    let target = RBox::new_table();
    unsafe { table::put(&target, &RBox::int(0), RBox::null()).unwrap() };
    assert_eq!(unary(rain_len, target), Ok(Value::Int(1)));
}

#[test]
fn callable_guard_checks_arity() {
    let mut exc = RBox::null();
    let func = RBox::func(std::ptr::null(), 2);
    unsafe {
        assert_eq!(rain_check_callable(&mut exc, &func, 2), 0);
        assert_eq!(rain_check_callable(&mut exc, &func, 1), 1);
        assert_eq!(
            Value::from_box(&exc),
            Value::Str("function expects 2 arguments, got 1".into())
        );
        assert_eq!(rain_check_callable(&mut exc, &RBox::int(1), 0), 1);
    }
}

#[test]
fn symbol_table_covers_the_entry_points() {
    let names: Vec<&str> = symbols().into_iter().map(|(name, _)| name).collect();
    for expected in [
        "rain_new_table",
        "rain_box_malloc",
        "rain_get",
        "rain_put",
        "rain_get_ptr",
        "rain_truthy",
        "rain_check_callable",
        "rain_init_args",
        "rain_main",
        "rain_box_to_exit",
        "rain_report_uncaught",
        "rain_print",
        "rain_tostr",
        "rain_throw",
        "rain_type",
        "rain_len",
    ] {
        assert!(names.contains(&expected), "{expected} missing");
    }
}
