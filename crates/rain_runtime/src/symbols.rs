//! Addresses of every runtime entry point, for registration with a JIT.

use crate::access::{rain_box_malloc, rain_get, rain_get_ptr, rain_new_table, rain_put};
use crate::builtins::{rain_args, rain_len, rain_print, rain_throw, rain_tostr, rain_type};
use crate::ops::{
    rain_add, rain_check_callable, rain_div, rain_eq, rain_ge, rain_gt, rain_le, rain_lt,
    rain_mul, rain_ne, rain_neg, rain_not, rain_string_concat, rain_sub, rain_truthy,
};
use crate::process::{rain_box_to_exit, rain_init_args, rain_main, rain_report_uncaught};

/// Name and address of each exported runtime function.
#[must_use]
pub fn symbols() -> Vec<(&'static str, *const u8)> {
    vec![
        ("rain_new_table", rain_new_table as *const u8),
        ("rain_box_malloc", rain_box_malloc as *const u8),
        ("rain_get", rain_get as *const u8),
        ("rain_put", rain_put as *const u8),
        ("rain_get_ptr", rain_get_ptr as *const u8),
        ("rain_truthy", rain_truthy as *const u8),
        ("rain_check_callable", rain_check_callable as *const u8),
        ("rain_add", rain_add as *const u8),
        ("rain_sub", rain_sub as *const u8),
        ("rain_mul", rain_mul as *const u8),
        ("rain_div", rain_div as *const u8),
        ("rain_eq", rain_eq as *const u8),
        ("rain_ne", rain_ne as *const u8),
        ("rain_gt", rain_gt as *const u8),
        ("rain_ge", rain_ge as *const u8),
        ("rain_lt", rain_lt as *const u8),
        ("rain_le", rain_le as *const u8),
        ("rain_string_concat", rain_string_concat as *const u8),
        ("rain_neg", rain_neg as *const u8),
        ("rain_not", rain_not as *const u8),
        ("rain_init_args", rain_init_args as *const u8),
        ("rain_main", rain_main as *const u8),
        ("rain_box_to_exit", rain_box_to_exit as *const u8),
        ("rain_report_uncaught", rain_report_uncaught as *const u8),
        ("rain_print", rain_print as *const u8),
        ("rain_tostr", rain_tostr as *const u8),
        ("rain_throw", rain_throw as *const u8),
        ("rain_type", rain_type as *const u8),
        ("rain_len", rain_len as *const u8),
        ("rain_args", rain_args as *const u8),
    ]
}
