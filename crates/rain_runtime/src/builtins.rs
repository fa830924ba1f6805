//! Builtin functions with the box calling convention.
//!
//! Programs reach these through `foreign` declarations in the prelude, so
//! each one takes the result cell followed by one cell per argument.

use std::io::Write;

use rain_foundation::TypeTag;

use crate::boxes::RBox;
use crate::ops::{finish, raise};
use crate::process;
use crate::table;

/// Text of a box as `tostr` renders it.
///
/// # Safety
/// `value` must be a valid box.
#[must_use]
pub unsafe fn display(value: &RBox) -> String {
    match value.type_tag() {
        TypeTag::Null => "null".to_string(),
        TypeTag::Int => value.as_int().to_string(),
        TypeTag::Float => format_float(value.as_float()),
        TypeTag::Bool => (value.data != 0).to_string(),
        // SAFETY: guaranteed by the caller
        TypeTag::Str => String::from_utf8_lossy(unsafe { value.str_bytes() }.unwrap_or_default())
            .into_owned(),
        TypeTag::Func => format!("<func {:#x}>", value.data),
        TypeTag::Table => format!("<table {:#x}>", value.data),
    }
}

/// Floats always show a fractional part or exponent.
pub(crate) fn format_float(value: f64) -> String {
    let text = value.to_string();
    if text.contains(['.', 'e', 'i', 'N']) {
        text
    } else {
        text + ".0"
    }
}

/// `print(value)`: writes the value's text and a newline to stdout.
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_print(ret: *mut RBox, value: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        let text = display(&*value);
        let mut out = std::io::stdout().lock();
        if writeln!(out, "{text}").and_then(|()| out.flush()).is_err() {
            return raise(ret, "can't write to stdout");
        }
        finish(ret, RBox::null())
    }
}

/// `tostr(value)`
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_tostr(ret: *mut RBox, value: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        if (*value).is(TypeTag::Str) {
            return finish(ret, *value);
        }
        finish(ret, RBox::string(&display(&*value)))
    }
}

/// `throw(value)`: raises `value`.
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_throw(ret: *mut RBox, value: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        *ret = *value;
    }
    1
}

/// `type(value)`: the tag name as a string.
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_type(ret: *mut RBox, value: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe { finish(ret, RBox::string((*value).type_tag().name())) }
}

/// `len(value)`: byte length of a string or entry count of a table.
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_len(ret: *mut RBox, value: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        let value = &*value;
        match value.type_tag() {
            TypeTag::Str => finish(ret, RBox::int(i64::from(value.size))),
            TypeTag::Table => {
                let count = table::entries(value).len();
                finish(ret, RBox::int(i64::try_from(count).unwrap_or(i64::MAX)))
            }
            tag => raise(ret, &format!("can't take the length of {tag}")),
        }
    }
}

/// `args()`: the process arguments as an array table.
///
/// # Safety
/// `ret` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_args(ret: *mut RBox) -> i32 {
    let array = RBox::new_table();
    for (index, arg) in process::args().iter().enumerate() {
        let key = RBox::int(i64::try_from(index).unwrap_or(i64::MAX));
        // SAFETY: `array` is a fresh table
        if let Err(err) = unsafe { table::put(&array, &key, RBox::string(arg)) } {
            // SAFETY: guaranteed by the caller
            return unsafe { raise(ret, &err.to_string()) };
        }
    }
    // SAFETY: guaranteed by the caller
    unsafe { finish(ret, array) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(f: unsafe extern "C" fn(*mut RBox, *const RBox) -> i32, arg: RBox) -> (i32, RBox) {
        let mut ret = RBox::null();
        let status = unsafe { f(&mut ret, &arg) };
        (status, ret)
    }

    fn text(b: &RBox) -> String {
        unsafe { display(b) }
    }

    #[test]
    fn display_forms() {
        assert_eq!(text(&RBox::null()), "null");
        assert_eq!(text(&RBox::int(-4)), "-4");
        assert_eq!(text(&RBox::float(2.0)), "2.0");
        assert_eq!(text(&RBox::float(0.25)), "0.25");
        assert_eq!(text(&RBox::bool(true)), "true");
        assert_eq!(text(&RBox::string("hi")), "hi");
        assert!(text(&RBox::new_table()).starts_with("<table"));
    }

    #[test]
    fn tostr_and_type() {
        assert_eq!(text(&call(rain_tostr, RBox::int(12)).1), "12");
        assert_eq!(text(&call(rain_type, RBox::float(1.0)).1), "float");
        assert_eq!(text(&call(rain_type, RBox::new_table()).1), "table");
    }

    #[test]
    fn throw_raises_its_argument() {
        let (status, ret) = call(rain_throw, RBox::int(7));
        assert_eq!(status, 1);
        assert_eq!(ret.as_int(), 7);
    }

    #[test]
    fn len_of_string_and_table() {
        assert_eq!(call(rain_len, RBox::string("abc")).1.as_int(), 3);
        let t = RBox::new_table();
        unsafe {
            table::put(&t, &RBox::int(0), RBox::int(0)).unwrap();
        }
        assert_eq!(call(rain_len, t).1.as_int(), 1);
        assert_eq!(call(rain_len, RBox::int(1)).0, 1);
    }

    #[test]
    fn print_returns_null() {
        let (status, ret) = call(rain_print, RBox::string("from print test"));
        assert_eq!(status, 0);
        assert!(ret.is_null());
    }
}
