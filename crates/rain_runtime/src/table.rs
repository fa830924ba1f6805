//! Table access following the shared probe law.
//!
//! These functions operate on any table box, whether it was built by the
//! runtime or emitted as data by the compiler.

use thiserror::Error;

use rain_foundation::TypeTag;
use rain_foundation::abi::probe;

use crate::boxes::{RBox, RTable};

/// Upper bound on environment hops during a lookup, so `a :: a` chains
/// terminate.
const MAX_ENV_DEPTH: usize = 1024;

/// Errors from table writes.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TableError {
    /// Every slot holds a different key.
    #[error("table is full")]
    Full,
    /// The target is not a table.
    #[error("can't index {0}")]
    NotATable(TypeTag),
}

/// Slot index holding `key`, if present.
///
/// # Safety
/// `table` must be a valid table header and `key` a valid box.
#[must_use]
pub unsafe fn find(table: &RTable, key: &RBox) -> Option<usize> {
    // SAFETY: guaranteed by the caller
    unsafe {
        let items = table.items();
        let hash = key.key_hash();
        for index in probe(hash, items.len()) {
            let item = &items[index];
            if item.occupied == 0 {
                return None;
            }
            if item.key.key_eq(key) {
                return Some(index);
            }
        }
    }
    None
}

/// Reads `key` from `target`'s own table, ignoring its environment.
///
/// # Safety
/// `target` must point to a valid box.
#[must_use]
pub unsafe fn get(target: *const RBox, key: &RBox) -> Option<RBox> {
    // SAFETY: guaranteed by the caller
    unsafe {
        let header = (*target).table_ptr()?;
        let index = find(&*header, key)?;
        Some((*header).items()[index].value)
    }
}

/// Reads `key` from `target`, falling back through the environment chain.
/// Returns null when no table along the chain holds the key.
///
/// # Safety
/// `target` and every environment pointer reachable from it must be valid.
#[must_use]
pub unsafe fn lookup(target: *const RBox, key: &RBox) -> RBox {
    let mut current = target;
    for _ in 0..MAX_ENV_DEPTH {
        // SAFETY: guaranteed by the caller
        unsafe {
            if let Some(value) = get(current, key) {
                return value;
            }
            let env = (*current).env;
            if env.is_null() {
                break;
            }
            current = env;
        }
    }
    RBox::null()
}

/// Pointer to the value slot for `key`, inserting a null value if absent.
///
/// # Errors
/// Fails if `target` is not a table or the table is full.
///
/// # Safety
/// `target` must point to a valid box.
pub unsafe fn slot(target: *const RBox, key: &RBox) -> Result<*mut RBox, TableError> {
    // SAFETY: guaranteed by the caller
    unsafe {
        let header = (*target)
            .table_ptr()
            .ok_or_else(|| TableError::NotATable((*target).type_tag()))?;
        let hash = key.key_hash();
        let items = (*header).items_mut();
        for index in probe(hash, items.len()) {
            let item = &mut items[index];
            if item.occupied == 0 {
                item.occupied = 1;
                item.key = *key;
                item.value = RBox::null();
                (*header).count += 1;
                return Ok(&raw mut item.value);
            }
            if item.key.key_eq(key) {
                return Ok(&raw mut item.value);
            }
        }
    }
    Err(TableError::Full)
}

/// Writes `value` under `key`, overwriting an equal key.
///
/// # Errors
/// Fails if `target` is not a table or the table is full.
///
/// # Safety
/// `target` must point to a valid box.
pub unsafe fn put(target: *const RBox, key: &RBox, value: RBox) -> Result<(), TableError> {
    // SAFETY: guaranteed by the caller
    unsafe {
        *slot(target, key)? = value;
    }
    Ok(())
}

/// Occupied entries in slot order.
///
/// # Safety
/// `target` must point to a valid box.
#[must_use]
pub unsafe fn entries(target: *const RBox) -> Vec<(RBox, RBox)> {
    // SAFETY: guaranteed by the caller
    unsafe {
        let Some(header) = (*target).table_ptr() else {
            return Vec::new();
        };
        (*header)
            .items()
            .iter()
            .filter(|item| item.occupied != 0)
            .map(|item| (item.key, item.value))
            .collect()
    }
}
