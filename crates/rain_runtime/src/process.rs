//! Process entry helpers used by the generated C `main` and by JIT runs.

use std::cell::RefCell;
use std::ffi::{CStr, c_char};

use rain_foundation::TypeTag;

use crate::boxes::RBox;
use crate::builtins::display;
use crate::call::RunnerFn;
use crate::ops::rain_check_callable;

thread_local! {
    // Compiled code runs on the thread that started it, so sessions on
    // different threads each see their own arguments.
    static ARGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Replaces the arguments seen by `args()` on the current thread.
pub fn set_args(args: Vec<String>) {
    ARGS.with_borrow_mut(|current| *current = args);
}

/// Arguments seen by `args()` on the current thread.
#[must_use]
pub fn args() -> Vec<String> {
    ARGS.with_borrow(Clone::clone)
}

/// Records `argv` for the `args()` builtin.
///
/// # Safety
/// `argv` must hold `argc` valid NUL-terminated strings.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_init_args(argc: i32, argv: *const *const c_char) {
    let count = usize::try_from(argc).unwrap_or(0);
    let mut collected = Vec::with_capacity(count);
    for index in 0..count {
        // SAFETY: guaranteed by the caller
        let arg = unsafe { *argv.add(index) };
        if arg.is_null() {
            break;
        }
        // SAFETY: guaranteed by the caller
        collected.push(unsafe { CStr::from_ptr(arg) }.to_string_lossy().into_owned());
    }
    set_args(collected);
}

/// Calls `main` with no arguments, seeding the result cell with its
/// environment.
///
/// # Safety
/// Both pointers must be valid and a function box must point to code with
/// the box calling convention.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_main(ret: *mut RBox, main: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        if rain_check_callable(ret, main, 0) != 0 {
            return 1;
        }
        let main = &*main;
        *ret = if main.env.is_null() {
            RBox::null()
        } else {
            *main.env
        };
        let code: RunnerFn = std::mem::transmute::<*const u8, RunnerFn>(main.data as *const u8);
        code(ret)
    }
}

/// Exit status for the value `main` returned: null and true are 0, false
/// is 1, integers are themselves.
///
/// # Safety
/// `value` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_box_to_exit(value: *const RBox) -> i32 {
    // SAFETY: guaranteed by the caller
    let value = unsafe { &*value };
    match value.type_tag() {
        TypeTag::Bool => i32::from(value.data == 0),
        #[allow(clippy::cast_possible_truncation)]
        TypeTag::Int => value.as_int() as i32,
        _ => 0,
    }
}

/// Prints an uncaught exception to stderr.
///
/// # Safety
/// `exc` must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_report_uncaught(exc: *const RBox) {
    // SAFETY: guaranteed by the caller
    let text = unsafe { display(&*exc) };
    tracing::debug!(target: "rain::runtime", exception = %text, "uncaught");
    eprintln!("uncaught exception: {text}");
}
