//! Integration tests for runtime tables

use proptest::prelude::*;
use rain_foundation::HASH_SIZE;
use rain_foundation::abi::probe;
use rain_runtime::access::{rain_get, rain_get_ptr, rain_new_table, rain_put};
use rain_runtime::{RBox, TableError, Value, table};

fn table_of(entries: &[(RBox, RBox)]) -> RBox {
    let target = RBox::new_table();
    for (key, value) in entries {
        unsafe { table::put(&target, key, *value).unwrap() };
    }
    target
}

// =============================================================================
// Environment chains
// =============================================================================

#[test]
fn lookups_fall_back_through_the_environment() {
    let base = table_of(&[(RBox::string("greet"), RBox::string("hi"))]);
    let mut derived = table_of(&[(RBox::string("name"), RBox::string("rain"))]);
    derived.env = base.leak();

    unsafe {
        let greet = table::lookup(&derived, &RBox::string("greet"));
        assert_eq!(Value::from_box(&greet), Value::Str("hi".into()));
        assert!(table::get(&derived, &RBox::string("greet")).is_none());
        assert!(table::lookup(&derived, &RBox::string("missing")).is_null());
    }
}

#[test]
fn own_keys_shadow_the_environment() {
    let base = table_of(&[(RBox::int(1), RBox::int(10))]);
    let mut derived = table_of(&[(RBox::int(1), RBox::int(20))]);
    derived.env = base.leak();
    unsafe {
        assert_eq!(table::lookup(&derived, &RBox::int(1)).as_int(), 20);
    }
}

#[test]
fn self_attached_tables_terminate() {
    let cell = RBox::new_table().leak();
    unsafe {
        (*cell).env = cell;
        assert!(table::lookup(cell, &RBox::string("x")).is_null());
    }
}

// =============================================================================
// Entry points
// =============================================================================

#[test]
fn put_and_get_entry_points() {
    let target = rain_new_table();
    let mut exc = RBox::null();
    let mut out = RBox::null();
    unsafe {
        assert_eq!(rain_put(&mut exc, target, &RBox::string("k"), &RBox::int(5)), 0);
        rain_get(&mut out, target, &RBox::string("k"));
        assert_eq!(out.as_int(), 5);

        let slot = rain_get_ptr(target, &RBox::string("fresh"));
        assert!(!slot.is_null());
        assert!((*slot).is_null());
        *slot = RBox::bool(true);
        rain_get(&mut out, target, &RBox::string("fresh"));
        assert_eq!(Value::from_box(&out), Value::Bool(true));
    }
}

#[test]
fn writing_to_a_non_table_raises() {
    let mut exc = RBox::null();
    unsafe {
        assert_eq!(rain_put(&mut exc, &RBox::int(3), &RBox::int(0), &RBox::null()), 1);
        assert_eq!(Value::from_box(&exc), Value::Str("can't index int".into()));
        assert!(rain_get_ptr(&RBox::int(3), &RBox::int(0)).is_null());
        assert_eq!(
            table::put(&RBox::null(), &RBox::int(0), RBox::null()),
            Err(TableError::NotATable(rain_foundation::TypeTag::Null))
        );
    }
}

#[test]
fn string_keys_compare_by_content() {
    let target = RBox::new_table();
    unsafe {
        table::put(&target, &RBox::string("same"), RBox::int(1)).unwrap();
        table::put(&target, &RBox::string("same"), RBox::int(2)).unwrap();
        assert_eq!(table::entries(&target).len(), 1);
        assert_eq!(table::get(&target, &RBox::string("same")).unwrap().as_int(), 2);
    }
}

// =============================================================================
// Probe law
// =============================================================================

proptest! {
    #[test]
    fn keys_sit_on_their_probe_path(keys in prop::collection::hash_set(any::<i64>(), 0..HASH_SIZE)) {
        let target = RBox::new_table();
        for &k in &keys {
            unsafe { table::put(&target, &RBox::int(k), RBox::int(k)).unwrap() };
        }
        let header = target.table_ptr().unwrap();
        for &k in &keys {
            let key = RBox::int(k);
            let slot = unsafe { table::find(&*header, &key) };
            prop_assert!(slot.is_some());
            let slot = slot.unwrap();
            // every slot before it on the probe path is occupied by another key
            let hash = unsafe { key.key_hash() };
            let items = unsafe { (*header).items() };
            for index in probe(hash, HASH_SIZE) {
                if index == slot {
                    break;
                }
                prop_assert!(items[index].occupied != 0);
                prop_assert!(items[index].key.as_int() != k);
            }
        }
    }

    #[test]
    fn tables_never_exceed_capacity(keys in prop::collection::vec(0i64..200, 0..300)) {
        let target = RBox::new_table();
        for &k in &keys {
            let result = unsafe { table::put(&target, &RBox::int(k), RBox::null()) };
            if result.is_err() {
                prop_assert_eq!(result, Err(TableError::Full));
            }
        }
        let count = unsafe { table::entries(&target) }.len();
        prop_assert!(count <= HASH_SIZE);
    }
}
