//! Operator primitives, truthiness, and the callable guard.
//!
//! Every fallible primitive takes the result cell first and returns the
//! unwind status: 0 with the result in `*ret`, or 1 with an exception
//! string box in `*ret`.

use std::cmp::Ordering;

use rain_foundation::TypeTag;

use crate::boxes::RBox;

/// Stores a string exception in `ret` and returns the failure status.
///
/// # Safety
/// `ret` must be valid for writes.
pub unsafe fn raise(ret: *mut RBox, message: &str) -> i32 {
    tracing::trace!(target: "rain::runtime", exception = message, "raise");
    // SAFETY: guaranteed by the caller
    unsafe {
        *ret = RBox::string(message);
    }
    1
}

/// Stores `value` in `ret` and returns the success status.
///
/// # Safety
/// `ret` must be valid for writes.
pub unsafe fn finish(ret: *mut RBox, value: RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        *ret = value;
    }
    0
}

/// Truthiness: null, false, 0, 0.0, and the empty string are false.
#[must_use]
pub fn truthy(value: &RBox) -> bool {
    match value.type_tag() {
        TypeTag::Null => false,
        TypeTag::Bool | TypeTag::Int => value.data != 0,
        TypeTag::Float => value.as_float() != 0.0,
        TypeTag::Str => value.size != 0,
        TypeTag::Func | TypeTag::Table => true,
    }
}

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

fn number(value: &RBox) -> Option<Num> {
    match value.type_tag() {
        TypeTag::Int => Some(Num::Int(value.as_int())),
        TypeTag::Float => Some(Num::Float(value.as_float())),
        _ => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn widen(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Float(f) => f,
    }
}

fn operands(a: &RBox, b: &RBox) -> Option<(Num, Num)> {
    Some((number(a)?, number(b)?))
}

unsafe fn arith(
    ret: *mut RBox,
    a: *const RBox,
    b: *const RBox,
    verb: &str,
    int: fn(i64, i64) -> Option<i64>,
    float: fn(f64, f64) -> f64,
) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        let (a, b) = (&*a, &*b);
        let Some((x, y)) = operands(a, b) else {
            let message = format!("can't {verb} {} and {}", a.type_tag(), b.type_tag());
            return raise(ret, &message);
        };
        let result = match (x, y) {
            (Num::Int(x), Num::Int(y)) => match int(x, y) {
                Some(value) => RBox::int(value),
                None => return raise(ret, "division by zero"),
            },
            (x, y) => RBox::float(float(widen(x), widen(y))),
        };
        finish(ret, result)
    }
}

/// `a + b`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_add(ret: *mut RBox, a: *const RBox, b: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe { arith(ret, a, b, "add", |x, y| Some(x.wrapping_add(y)), |x, y| x + y) }
}

/// `a - b`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_sub(ret: *mut RBox, a: *const RBox, b: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        arith(
            ret,
            a,
            b,
            "subtract",
            |x, y| Some(x.wrapping_sub(y)),
            |x, y| x - y,
        )
    }
}

/// `a * b`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_mul(ret: *mut RBox, a: *const RBox, b: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        arith(
            ret,
            a,
            b,
            "multiply",
            |x, y| Some(x.wrapping_mul(y)),
            |x, y| x * y,
        )
    }
}

/// `a / b`. Integer division truncates; integer division by zero raises.
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_div(ret: *mut RBox, a: *const RBox, b: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe { arith(ret, a, b, "divide", i64::checked_div, |x, y| x / y) }
}

/// Value equality. Numbers compare across int and float; strings by bytes;
/// functions and tables by identity.
///
/// # Safety
/// Both boxes must be valid.
#[must_use]
pub unsafe fn equal(a: &RBox, b: &RBox) -> bool {
    if let Some((x, y)) = operands(a, b) {
        return match (x, y) {
            (Num::Int(x), Num::Int(y)) => x == y,
            (x, y) => widen(x) == widen(y),
        };
    }
    // SAFETY: guaranteed by the caller
    unsafe { a.key_eq(b) }
}

/// `a == b`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_eq(ret: *mut RBox, a: *const RBox, b: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe { finish(ret, RBox::bool(equal(&*a, &*b))) }
}

/// `a != b`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_ne(ret: *mut RBox, a: *const RBox, b: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe { finish(ret, RBox::bool(!equal(&*a, &*b))) }
}

unsafe fn compare(
    ret: *mut RBox,
    a: *const RBox,
    b: *const RBox,
    accept: fn(Ordering) -> bool,
) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        let (a, b) = (&*a, &*b);
        let ordering = if let Some((x, y)) = operands(a, b) {
            match (x, y) {
                (Num::Int(x), Num::Int(y)) => Some(x.cmp(&y)),
                (x, y) => widen(x).partial_cmp(&widen(y)),
            }
        } else if let (Some(x), Some(y)) = (a.str_bytes(), b.str_bytes()) {
            Some(x.cmp(y))
        } else {
            let message = format!("can't compare {} and {}", a.type_tag(), b.type_tag());
            return raise(ret, &message);
        };
        // NaN compares false both ways
        finish(ret, RBox::bool(ordering.is_some_and(accept)))
    }
}

/// `a > b`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_gt(ret: *mut RBox, a: *const RBox, b: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe { compare(ret, a, b, Ordering::is_gt) }
}

/// `a >= b`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_ge(ret: *mut RBox, a: *const RBox, b: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe { compare(ret, a, b, Ordering::is_ge) }
}

/// `a < b`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_lt(ret: *mut RBox, a: *const RBox, b: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe { compare(ret, a, b, Ordering::is_lt) }
}

/// `a <= b`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_le(ret: *mut RBox, a: *const RBox, b: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe { compare(ret, a, b, Ordering::is_le) }
}

/// `a $ b`: concatenation of two strings.
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_string_concat(
    ret: *mut RBox,
    a: *const RBox,
    b: *const RBox,
) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        let (a, b) = (&*a, &*b);
        let (Some(x), Some(y)) = (a.str_bytes(), b.str_bytes()) else {
            let message = format!("can't concatenate {} and {}", a.type_tag(), b.type_tag());
            return raise(ret, &message);
        };
        finish(ret, RBox::bytes(&[x, y].concat()))
    }
}

/// `-a`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_neg(ret: *mut RBox, a: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        match number(&*a) {
            Some(Num::Int(i)) => finish(ret, RBox::int(i.wrapping_neg())),
            Some(Num::Float(f)) => finish(ret, RBox::float(-f)),
            None => raise(ret, &format!("can't negate {}", (*a).type_tag())),
        }
    }
}

/// `!a`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_not(ret: *mut RBox, a: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe { finish(ret, RBox::bool(!truthy(&*a))) }
}

/// Truthiness as 0 or 1.
///
/// # Safety
/// `value` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_truthy(value: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    i32::from(unsafe { truthy(&*value) })
}

/// Guard emitted before every call: `func` must be a function taking
/// `nargs` arguments. On failure the exception goes to `exc`.
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_check_callable(
    exc: *mut RBox,
    func: *const RBox,
    nargs: i32,
) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        let func = &*func;
        if !func.is(TypeTag::Func) {
            return raise(exc, &format!("can't call {}", func.type_tag()));
        }
        if i64::from(func.size) != i64::from(nargs) {
            let message = format!(
                "function expects {} argument{}, got {nargs}",
                func.size,
                if func.size == 1 { "" } else { "s" }
            );
            return raise(exc, &message);
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(b: &RBox) -> String {
        String::from_utf8_lossy(unsafe { b.str_bytes() }.unwrap_or_default()).into_owned()
    }

    fn binary(
        op: unsafe extern "C" fn(*mut RBox, *const RBox, *const RBox) -> i32,
        a: RBox,
        b: RBox,
    ) -> (i32, RBox) {
        let mut ret = RBox::null();
        let status = unsafe { op(&mut ret, &a, &b) };
        (status, ret)
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(binary(rain_add, RBox::int(2), RBox::int(3)).1.as_int(), 5);
        assert_eq!(binary(rain_sub, RBox::int(2), RBox::int(3)).1.as_int(), -1);
        assert_eq!(binary(rain_mul, RBox::int(4), RBox::int(3)).1.as_int(), 12);
        assert_eq!(binary(rain_div, RBox::int(7), RBox::int(2)).1.as_int(), 3);
    }

    #[test]
    fn mixed_arithmetic_widens() {
        let (status, ret) = binary(rain_add, RBox::int(1), RBox::float(0.5));
        assert_eq!(status, 0);
        assert!(ret.is(TypeTag::Float));
        assert!((ret.as_float() - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn type_errors_raise() {
        let (status, ret) = binary(rain_add, RBox::int(1), RBox::string("x"));
        assert_eq!(status, 1);
        assert_eq!(text(&ret), "can't add int and str");

        let (status, ret) = binary(rain_div, RBox::int(1), RBox::int(0));
        assert_eq!(status, 1);
        assert_eq!(text(&ret), "division by zero");
    }

    #[test]
    fn comparisons() {
        assert_eq!(binary(rain_lt, RBox::int(1), RBox::int(2)).1.data, 1);
        assert_eq!(binary(rain_ge, RBox::float(2.0), RBox::int(2)).1.data, 1);
        assert_eq!(
            binary(rain_gt, RBox::string("b"), RBox::string("a")).1.data,
            1
        );
        assert_eq!(binary(rain_le, RBox::null(), RBox::int(1)).0, 1);
    }

    #[test]
    fn equality() {
        assert_eq!(binary(rain_eq, RBox::int(1), RBox::float(1.0)).1.data, 1);
        assert_eq!(
            binary(rain_eq, RBox::string("a"), RBox::string("a")).1.data,
            1
        );
        assert_eq!(binary(rain_ne, RBox::null(), RBox::bool(false)).1.data, 1);
    }

    #[test]
    fn concat() {
        let (status, ret) = binary(rain_string_concat, RBox::string("ab"), RBox::string("cd"));
        assert_eq!(status, 0);
        assert_eq!(text(&ret), "abcd");
        assert_eq!(
            binary(rain_string_concat, RBox::string("a"), RBox::int(1)).0,
            1
        );
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
        }
        for value in [
            RBox::bool(true),
            RBox::int(-1),
            RBox::string("0"),
            RBox::new_table(),
        ] {
            assert!(truthy(&value));
        }
    }

    #[test]
    fn callable_guard() {
        let mut exc = RBox::null();
        let f = RBox::func(std::ptr::null(), 2);
        assert_eq!(unsafe { rain_check_callable(&mut exc, &f, 2) }, 0);
        assert_eq!(unsafe { rain_check_callable(&mut exc, &f, 1) }, 1);
        assert_eq!(text(&exc), "function expects 2 arguments, got 1");
        assert_eq!(
            unsafe { rain_check_callable(&mut exc, &RBox::int(3), 0) },
            1
        );
        assert_eq!(text(&exc), "can't call int");
    }
}
