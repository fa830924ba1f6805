//! Integration tests for agreement between compile-time and run-time tables

use proptest::prelude::*;
use rain_codegen::{ConstBox, SlotLookup, TableSlots};
use rain_foundation::HASH_SIZE;
use rain_runtime::{RBox, Value, table};

use crate::run;

proptest! {
    #[test]
    fn static_and_dynamic_tables_place_keys_alike(
        keys in prop::collection::vec(any::<i64>(), 0..HASH_SIZE)
    ) {
        let mut slots = TableSlots::default();
        let dynamic = RBox::new_table();
        for &k in &keys {
            slots.put(ConstBox::int(k), ConstBox::int(k)).unwrap();
            unsafe { table::put(&dynamic, &RBox::int(k), RBox::int(k)).unwrap() };
        }
        let header = dynamic.table_ptr().unwrap();
        for &k in &keys {
            let SlotLookup::Found(slot) = slots.get_index(&ConstBox::int(k)).unwrap() else {
                return Err(TestCaseError::fail(format!("{k} missing from static table")));
            };
            let found = unsafe { table::find(&*header, &RBox::int(k)) };
            prop_assert_eq!(found, Some(slot));
        }
    }

    #[test]
    fn absent_keys_are_absent_in_both(
        keys in prop::collection::hash_set(0i64..1000, 0..32),
        absent in 1000i64..2000,
    ) {
        let mut slots = TableSlots::default();
        let dynamic = RBox::new_table();
        for &k in &keys {
            slots.put(ConstBox::int(k), ConstBox::null()).unwrap();
            unsafe { table::put(&dynamic, &RBox::int(k), RBox::null()).unwrap() };
        }
        let header = dynamic.table_ptr().unwrap();
        let lookup = slots.get_index(&ConstBox::int(absent)).unwrap();
        prop_assert!(!matches!(lookup, SlotLookup::Found(_)));
        let found = unsafe { table::find(&*header, &RBox::int(absent)) };
        prop_assert_eq!(found, None);
    }
}

#[test]
fn colliding_static_keys_are_readable_at_run_time() {
    // every key shares home slot 0
    let keys: Vec<i64> = (0..40).map(|i| i * HASH_SIZE as i64).collect();
    let entries: Vec<String> = keys.iter().map(|k| format!("[{k}] = {k}")).collect();
    let reads: Vec<String> = keys.iter().map(|k| format!("t[{k}]")).collect();
    let source = format!(
        "let t = {{{}}}\nlet main = func()\n    return {}\n",
        entries.join(", "),
        reads.join(" + ")
    );
    assert_eq!(run(&source), Value::Int(keys.iter().sum()));
}

#[test]
fn run_time_writes_fill_static_tables() {
    let source = "\
let t = {a = 1}
let main = func()
    let i = 0
    while i < 63
        t[i] = i
        i = i + 1
    return [t.a, t[62]]
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Int(1)),
            (Value::Int(1), Value::Int(62)),
        ])
    );
}

#[test]
fn full_tables_raise() {
    let source = "\
let main = func()
    let t = table
    let i = 0
    catch err
        while true
            t[i] = i
            i = i + 1
    return [err, i]
";
    assert_eq!(
        run(source),
        Value::Table(vec![
            (Value::Int(0), Value::Str("table is full".into())),
            (Value::Int(1), Value::Int(HASH_SIZE as i64)),
        ])
    );
}
