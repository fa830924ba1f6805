//! Allocation and table access entry points called by generated code.

use crate::boxes::RBox;
use crate::ops::raise;
use crate::table;

/// Allocates a heap box holding a fresh empty table.
#[unsafe(no_mangle)]
pub extern "C" fn rain_new_table() -> *mut RBox {
    RBox::new_table().leak()
}

/// Allocates a heap box holding null.
#[unsafe(no_mangle)]
pub extern "C" fn rain_box_malloc() -> *mut RBox {
    RBox::null().leak()
}

/// `*ret = tbl[key]`, following the environment chain; null when absent.
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_get(ret: *mut RBox, tbl: *const RBox, key: *const RBox) {
    // SAFETY: guaranteed by the caller
    unsafe {
        *ret = table::lookup(tbl, &*key);
    }
}

/// `tbl[key] = val`. Raises into `exc` when `tbl` is not a table or is
/// full.
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_put(
    exc: *mut RBox,
    tbl: *const RBox,
    key: *const RBox,
    val: *const RBox,
) -> i32 {
    // SAFETY: guaranteed by the caller
    unsafe {
        match table::put(tbl, &*key, *val) {
            Ok(()) => 0,
            Err(err) => raise(exc, &err.to_string()),
        }
    }
}

/// Address of the value slot for `key` in `tbl`, inserting null when
/// absent. Returns a null pointer when `tbl` is not a table or is full.
///
/// # Safety
/// All pointers must be valid.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn rain_get_ptr(tbl: *const RBox, key: *const RBox) -> *mut RBox {
    // SAFETY: guaranteed by the caller
    unsafe { table::slot(tbl, &*key).unwrap_or(std::ptr::null_mut()) }
}
