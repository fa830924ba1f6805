//! Tables built at compile time.
//!
//! Module-scope table operations are constant folding on a [`TableSlots`]
//! buffer that follows the same probe law as the runtime. When a unit is
//! finished, each pending table becomes two data objects: the item array
//! and the header pointing at it. Runtime `rain_get`/`rain_put` then work on
//! them unchanged.

use cranelift_module::{DataDescription, DataId, Module};
use rain_foundation::abi::{
    self, HEADER_CAPACITY_OFFSET, HEADER_COUNT_OFFSET, HEADER_ITEMS_OFFSET, ITEM_KEY_OFFSET,
    ITEM_OCCUPIED_OFFSET, ITEM_SIZE, ITEM_VALUE_OFFSET, TABLE_HEADER_SIZE,
};
use rain_foundation::{Error, ErrorKind, HASH_SIZE, Result};

use crate::constant::{ConstBox, write_box};

/// Handle to a static table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(u32);

/// Where a key lives in a static table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotLookup {
    /// The key's slot.
    Found(usize),
    /// The key's home slot is empty.
    NotFound,
    /// The probe chain ended without reaching the key.
    CollisionExhausted,
}

/// Fixed-capacity open-addressing buffer of compile-time entries.
#[derive(Clone, Debug)]
pub struct TableSlots {
    items: Vec<Option<(ConstBox, ConstBox)>>,
    count: usize,
}

impl Default for TableSlots {
    fn default() -> Self {
        Self::with_capacity(HASH_SIZE)
    }
}

impl TableSlots {
    /// Creates an empty buffer with `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: vec![None; capacity],
            count: 0,
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    /// Inserts or overwrites `key`, returning its slot.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnhashableKey`] for non-literal keys and
    /// [`ErrorKind::TableFull`] when every slot holds another key.
    pub fn put(&mut self, key: ConstBox, value: ConstBox) -> Result<usize> {
        let hash = key.key_hash()?;
        for slot in abi::probe(hash, self.capacity()) {
            match &mut self.items[slot] {
                entry @ None => {
                    *entry = Some((key, value));
                    self.count += 1;
                    return Ok(slot);
                }
                Some((existing, current)) if existing.key_eq(&key) => {
                    *current = value;
                    return Ok(slot);
                }
                Some(_) => {}
            }
        }
        Err(Error::new(ErrorKind::TableFull(format!(
            "with {} entries",
            self.count
        ))))
    }

    /// Locates `key`.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnhashableKey`] for non-literal keys.
    pub fn get_index(&self, key: &ConstBox) -> Result<SlotLookup> {
        let hash = key.key_hash()?;
        let mut chain = abi::probe(hash, self.capacity()).peekable();
        if chain.peek().is_none_or(|&home| self.items[home].is_none()) {
            return Ok(SlotLookup::NotFound);
        }
        for slot in chain {
            match &self.items[slot] {
                None => break,
                Some((existing, _)) if existing.key_eq(key) => return Ok(SlotLookup::Found(slot)),
                Some(_) => {}
            }
        }
        Ok(SlotLookup::CollisionExhausted)
    }

    /// Value stored under `key`, if any.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnhashableKey`] for non-literal keys.
    pub fn get(&self, key: &ConstBox) -> Result<Option<&ConstBox>> {
        Ok(match self.get_index(key)? {
            SlotLookup::Found(slot) => self.value_at(slot),
            SlotLookup::NotFound | SlotLookup::CollisionExhausted => None,
        })
    }

    /// Value in an occupied slot.
    #[must_use]
    pub fn value_at(&self, slot: usize) -> Option<&ConstBox> {
        self.items.get(slot)?.as_ref().map(|(_, value)| value)
    }

    /// Replaces the value in an occupied slot, keeping its key.
    ///
    /// # Errors
    /// Returns an internal error if the slot is empty.
    pub fn set_at(&mut self, slot: usize, value: ConstBox) -> Result<()> {
        match self.items.get_mut(slot) {
            Some(Some((_, current))) => {
                *current = value;
                Ok(())
            }
            _ => Err(Error::internal(format!("static table slot {slot} is empty"))),
        }
    }

    /// Occupied slots in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ConstBox, &ConstBox)> {
        self.items
            .iter()
            .enumerate()
            .filter_map(|(slot, entry)| entry.as_ref().map(|(k, v)| (slot, k, v)))
    }
}

#[derive(Debug)]
struct StaticTable {
    name: String,
    slots: TableSlots,
    header: DataId,
    items: DataId,
    finished: bool,
}

/// Every static table of a backend. Tables stay readable after their unit
/// is finished so importers can fold lookups into them.
#[derive(Debug, Default)]
pub struct StaticTables {
    tables: Vec<StaticTable>,
    pending: Vec<TableId>,
}

impl StaticTables {
    /// Declares a new empty table. Its data is defined by
    /// [`StaticTables::finish_pending`].
    ///
    /// # Errors
    /// Returns an error if the module rejects the declarations.
    pub fn alloc(&mut self, module: &mut dyn Module, name: &str) -> Result<TableId> {
        let header = module
            .declare_anonymous_data(true, false)
            .map_err(Error::codegen)?;
        let items = module
            .declare_anonymous_data(true, false)
            .map_err(Error::codegen)?;
        let id = TableId(
            u32::try_from(self.tables.len()).map_err(|_| Error::codegen("too many tables"))?,
        );
        tracing::trace!(target: "rain::codegen", table = name, "alloc static table");
        self.tables.push(StaticTable {
            name: name.to_string(),
            slots: TableSlots::default(),
            header,
            items,
            finished: false,
        });
        self.pending.push(id);
        Ok(id)
    }

    fn table(&self, id: TableId) -> &StaticTable {
        &self.tables[id.0 as usize]
    }

    fn open(&mut self, id: TableId) -> Result<&mut StaticTable> {
        let table = &mut self.tables[id.0 as usize];
        if table.finished {
            return Err(Error::invalid_scope(format!(
                "table {} belongs to a finished module and can't be changed",
                table.name
            )));
        }
        Ok(table)
    }

    /// Name given at allocation.
    #[must_use]
    pub fn name(&self, id: TableId) -> &str {
        &self.table(id).name
    }

    /// Header data object: what a table box points at.
    #[must_use]
    pub fn header(&self, id: TableId) -> DataId {
        self.table(id).header
    }

    /// Item array data object.
    #[must_use]
    pub fn items(&self, id: TableId) -> DataId {
        self.table(id).items
    }

    /// Compile-time `table[key] = value`.
    ///
    /// # Errors
    /// Fails for non-literal keys, full tables, and finished tables.
    pub fn put(&mut self, id: TableId, key: ConstBox, value: ConstBox) -> Result<usize> {
        let table = self.open(id)?;
        let name = table.name.clone();
        table.slots.put(key, value).map_err(|err| match err.kind {
            ErrorKind::TableFull(_) => Error::new(ErrorKind::TableFull(name)),
            _ => err,
        })
    }

    /// Compile-time `table[key]`; null when absent.
    ///
    /// # Errors
    /// Fails for non-literal keys.
    pub fn get(&self, id: TableId, key: &ConstBox) -> Result<ConstBox> {
        Ok(self
            .table(id)
            .slots
            .get(key)?
            .cloned()
            .unwrap_or_else(ConstBox::null))
    }

    /// Slot of `key`.
    ///
    /// # Errors
    /// Fails for non-literal keys.
    pub fn get_index(&self, id: TableId, key: &ConstBox) -> Result<SlotLookup> {
        self.table(id).slots.get_index(key)
    }

    /// Value in an occupied slot.
    #[must_use]
    pub fn value_at(&self, id: TableId, slot: usize) -> Option<&ConstBox> {
        self.table(id).slots.value_at(slot)
    }

    /// Overwrites the value in an occupied slot.
    ///
    /// # Errors
    /// Fails for finished tables and empty slots.
    pub fn set_at(&mut self, id: TableId, slot: usize, value: ConstBox) -> Result<()> {
        self.open(id)?.slots.set_at(slot, value)
    }

    /// Byte offset of a slot's value box inside the item array.
    #[must_use]
    pub fn value_offset(slot: usize) -> i64 {
        let slot = i64::try_from(slot).unwrap_or_default();
        slot * i64::from(ITEM_SIZE) + i64::from(ITEM_VALUE_OFFSET)
    }

    /// Defines the data of every table allocated since the last call.
    ///
    /// # Errors
    /// Returns an error if the module rejects a definition.
    pub fn finish_pending(&mut self, module: &mut dyn Module) -> Result<()> {
        for id in std::mem::take(&mut self.pending) {
            let (items, header) = self.describe(module, id)?;
            let table = self.table(id);
            module
                .define_data(table.items, &items)
                .map_err(Error::codegen)?;
            module
                .define_data(table.header, &header)
                .map_err(Error::codegen)?;
            self.tables[id.0 as usize].finished = true;
        }
        Ok(())
    }

    fn describe(
        &self,
        module: &mut dyn Module,
        id: TableId,
    ) -> Result<(DataDescription, DataDescription)> {
        let table = self.table(id);
        let header_of = |other: TableId| self.header(other);
        let item_size = ITEM_SIZE as usize;
        let offset = |field: i32| usize::try_from(field).unwrap_or_default();

        let mut items = DataDescription::new();
        items.set_align(8);
        let mut bytes = vec![0u8; table.slots.capacity() * item_size];
        for (slot, key, value) in table.slots.iter() {
            let base = slot * item_size;
            let occupied = base + offset(ITEM_OCCUPIED_OFFSET);
            bytes[occupied..occupied + 4].copy_from_slice(&1u32.to_ne_bytes());
            let key_at = base + offset(ITEM_KEY_OFFSET);
            write_box(module, &mut items, &mut bytes, key_at, key, &header_of)?;
            let value_at = base + offset(ITEM_VALUE_OFFSET);
            write_box(module, &mut items, &mut bytes, value_at, value, &header_of)?;
        }
        items.define(bytes.into_boxed_slice());

        let count = u32::try_from(table.slots.count()).unwrap_or(u32::MAX);
        let capacity = u32::try_from(table.slots.capacity()).unwrap_or(u32::MAX);
        let mut header = DataDescription::new();
        header.set_align(8);
        let mut bytes = vec![0u8; TABLE_HEADER_SIZE as usize];
        let at = offset(HEADER_COUNT_OFFSET);
        bytes[at..at + 4].copy_from_slice(&count.to_ne_bytes());
        let at = offset(HEADER_CAPACITY_OFFSET);
        bytes[at..at + 4].copy_from_slice(&capacity.to_ne_bytes());
        let gv = module.declare_data_in_data(table.items, &mut header);
        header.write_data_addr(HEADER_ITEMS_OFFSET.unsigned_abs(), gv, 0);
        header.define(bytes.into_boxed_slice());
        Ok((items, header))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn put_then_get() {
        let mut slots = TableSlots::default();
        slots.put(ConstBox::int(1), ConstBox::int(10)).unwrap();
        slots.put(ConstBox::int(1), ConstBox::int(11)).unwrap();
        assert_eq!(slots.count(), 1);
        assert_eq!(slots.get(&ConstBox::int(1)).unwrap(), Some(&ConstBox::int(11)));
        assert_eq!(slots.get(&ConstBox::int(2)).unwrap(), None);
    }

    #[test]
    fn index_outcomes() {
        let mut slots = TableSlots::with_capacity(4);
        // 1 and 5 share home slot 1.
        assert_eq!(slots.get_index(&ConstBox::int(1)).unwrap(), SlotLookup::NotFound);
        slots.put(ConstBox::int(1), ConstBox::null()).unwrap();
        assert_eq!(
            slots.get_index(&ConstBox::int(1)).unwrap(),
            SlotLookup::Found(1)
        );
        assert_eq!(
            slots.get_index(&ConstBox::int(5)).unwrap(),
            SlotLookup::CollisionExhausted
        );
        assert_eq!(slots.put(ConstBox::int(5), ConstBox::null()).unwrap(), 2);
        assert_eq!(
            slots.get_index(&ConstBox::int(5)).unwrap(),
            SlotLookup::Found(2)
        );
    }

    #[test]
    fn full_table_is_an_error() {
        let mut slots = TableSlots::with_capacity(2);
        slots.put(ConstBox::int(0), ConstBox::null()).unwrap();
        slots.put(ConstBox::int(1), ConstBox::null()).unwrap();
        slots.put(ConstBox::int(1), ConstBox::int(3)).unwrap();
        let err = slots.put(ConstBox::int(2), ConstBox::null()).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::TableFull(_)));
        assert_eq!(
            slots.get_index(&ConstBox::int(2)).unwrap(),
            SlotLookup::CollisionExhausted
        );
    }

    #[test]
    fn set_at_requires_occupied_slot() {
        let mut slots = TableSlots::with_capacity(4);
        let slot = slots.put(ConstBox::bool(true), ConstBox::null()).unwrap();
        slots.set_at(slot, ConstBox::int(7)).unwrap();
        assert_eq!(slots.value_at(slot), Some(&ConstBox::int(7)));
        assert!(slots.set_at((slot + 1) % 4, ConstBox::null()).is_err());
    }

    #[test]
    fn value_offsets() {
        assert_eq!(StaticTables::value_offset(0), 40);
        assert_eq!(StaticTables::value_offset(2), 2 * 72 + 40);
    }

    proptest! {
        #[test]
        fn written_keys_are_found(keys in prop::collection::vec(any::<i64>(), 0..HASH_SIZE)) {
            let mut slots = TableSlots::default();
            for &k in &keys {
                slots.put(ConstBox::int(k), ConstBox::int(k)).unwrap();
            }
            prop_assert!(slots.count() <= HASH_SIZE);
            for &k in &keys {
                let found = slots.get_index(&ConstBox::int(k)).unwrap();
                let SlotLookup::Found(slot) = found else {
                    return Err(TestCaseError::fail(format!("{k} not found")));
                };
                prop_assert_eq!(slots.value_at(slot), Some(&ConstBox::int(k)));
            }
        }
    }
}
