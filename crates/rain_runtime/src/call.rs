//! Calling generated code from the host.

use crate::boxes::RBox;

/// Signature of a nullary box-convention function and of program runners.
pub type RunnerFn = unsafe extern "C" fn(*mut RBox) -> i32;

/// Signature of a macro entry: result cell and argument vector.
pub type EntryFn = unsafe extern "C" fn(*mut RBox, *mut RBox) -> i32;

fn outcome(status: i32, ret: RBox) -> Result<RBox, RBox> {
    if status == 0 { Ok(ret) } else { Err(ret) }
}

/// Calls a runner. `Err` carries the raised exception.
///
/// # Safety
/// `code` must be finalized code with the [`RunnerFn`] signature.
pub unsafe fn call_runner(code: *const u8) -> Result<RBox, RBox> {
    let mut ret = RBox::null();
    // SAFETY: guaranteed by the caller
    let status = unsafe {
        let code = std::mem::transmute::<*const u8, RunnerFn>(code);
        code(&raw mut ret)
    };
    outcome(status, ret)
}

/// Calls a macro entry with `argv` as its argument cells. `Err` carries
/// the raised exception.
///
/// # Safety
/// `code` must be finalized code with the [`EntryFn`] signature that reads
/// at most `argv.len()` cells.
pub unsafe fn call_entry(code: *const u8, argv: &mut [RBox]) -> Result<RBox, RBox> {
    let mut ret = RBox::null();
    // SAFETY: guaranteed by the caller
    let status = unsafe {
        let code = std::mem::transmute::<*const u8, EntryFn>(code);
        code(&raw mut ret, argv.as_mut_ptr())
    };
    outcome(status, ret)
}
