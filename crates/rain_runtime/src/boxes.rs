//! `#[repr(C)]` boxes, tables, and table items.
//!
//! These types are the Rust view of the layout in
//! [`rain_foundation::abi`]; the assertions at the bottom of this file keep
//! the two in sync.

use std::{ptr, slice};

use rain_foundation::TypeTag;
use rain_foundation::abi::{
    BOX_SIZE, DATA_OFFSET, ENV_OFFSET, HASH_SIZE, HEADER_CAPACITY_OFFSET, HEADER_COUNT_OFFSET,
    HEADER_ITEMS_OFFSET, ITEM_KEY_OFFSET, ITEM_OCCUPIED_OFFSET, ITEM_SIZE, ITEM_VALUE_OFFSET,
    SIZE_OFFSET, TABLE_HEADER_SIZE, TAG_OFFSET, key_hash,
};

#[allow(clippy::cast_possible_truncation)]
const CAPACITY: u32 = HASH_SIZE as u32;

/// A dynamic value.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RBox {
    /// [`TypeTag`] byte.
    pub tag: u8,
    /// Payload word, interpreted according to `tag`.
    pub data: u64,
    /// String length or function arity.
    pub size: u32,
    /// Heap box holding the environment, or null.
    pub env: *mut RBox,
}

/// Header of an open-addressing table.
#[repr(C)]
#[derive(Debug)]
pub struct RTable {
    /// Number of occupied slots.
    pub count: u32,
    /// Number of slots.
    pub capacity: u32,
    /// Slot array of `capacity` items.
    pub items: *mut RItem,
}

/// One slot of a table.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RItem {
    /// Nonzero when the slot holds a key.
    pub occupied: u32,
    /// Slot key.
    pub key: RBox,
    /// Slot value.
    pub value: RBox,
}

impl Default for RBox {
    fn default() -> Self {
        Self::null()
    }
}

impl RBox {
    /// The null box.
    #[must_use]
    pub const fn null() -> Self {
        Self {
            tag: TypeTag::Null as u8,
            data: 0,
            size: 0,
            env: ptr::null_mut(),
        }
    }

    /// An integer box.
    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self {
            tag: TypeTag::Int as u8,
            data: u64::from_ne_bytes(value.to_ne_bytes()),
            ..Self::null()
        }
    }

    /// A float box.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self {
            tag: TypeTag::Float as u8,
            data: value.to_bits(),
            ..Self::null()
        }
    }

    /// A boolean box.
    #[must_use]
    pub const fn bool(value: bool) -> Self {
        Self {
            tag: TypeTag::Bool as u8,
            data: value as u64,
            ..Self::null()
        }
    }

    /// A string box. The bytes are copied to a leaked, NUL-terminated
    /// buffer.
    #[must_use]
    pub fn string(text: &str) -> Self {
        Self::bytes(text.as_bytes())
    }

    /// A string box over arbitrary bytes.
    #[must_use]
    pub fn bytes(bytes: &[u8]) -> Self {
        let mut buffer = Vec::with_capacity(bytes.len() + 1);
        buffer.extend_from_slice(bytes);
        buffer.push(0);
        let leaked: &'static mut [u8] = Box::leak(buffer.into_boxed_slice());
        Self {
            tag: TypeTag::Str as u8,
            data: leaked.as_ptr() as u64,
            size: u32::try_from(bytes.len()).unwrap_or(u32::MAX),
            env: ptr::null_mut(),
        }
    }

    /// A function box over code with the box calling convention.
    #[must_use]
    pub fn func(code: *const u8, arity: u32) -> Self {
        Self {
            tag: TypeTag::Func as u8,
            data: code as u64,
            size: arity,
            env: ptr::null_mut(),
        }
    }

    /// A box holding a fresh, empty table of [`HASH_SIZE`] slots.
    #[must_use]
    pub fn new_table() -> Self {
        let items = vec![
            RItem {
                occupied: 0,
                key: Self::null(),
                value: Self::null(),
            };
            HASH_SIZE
        ];
        let items = Box::leak(items.into_boxed_slice()).as_mut_ptr();
        let header = Box::leak(Box::new(RTable {
            count: 0,
            capacity: CAPACITY,
            items,
        }));
        Self {
            tag: TypeTag::Table as u8,
            data: ptr::from_mut(header) as u64,
            ..Self::null()
        }
    }

    /// Moves a box to the heap and leaks it.
    #[must_use]
    pub fn leak(self) -> *mut RBox {
        Box::into_raw(Box::new(self))
    }

    /// Decoded type tag. Unknown tag bytes read as null.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        TypeTag::from_u8(self.tag).unwrap_or(TypeTag::Null)
    }

    /// Returns true if this box holds `tag`.
    #[must_use]
    pub fn is(&self, tag: TypeTag) -> bool {
        self.type_tag() == tag
    }

    /// Returns true for the null box.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.is(TypeTag::Null)
    }

    /// Payload as an integer.
    #[must_use]
    pub const fn as_int(&self) -> i64 {
        i64::from_ne_bytes(self.data.to_ne_bytes())
    }

    /// Payload as a float.
    #[must_use]
    pub const fn as_float(&self) -> f64 {
        f64::from_bits(self.data)
    }

    /// The string bytes of a string box, or `None` for other tags.
    ///
    /// # Safety
    /// A string box must point to at least `size` readable bytes that live
    /// for `'a`.
    #[must_use]
    pub unsafe fn str_bytes<'a>(&self) -> Option<&'a [u8]> {
        if !self.is(TypeTag::Str) || self.data == 0 {
            return None;
        }
        // SAFETY: guaranteed by the caller
        Some(unsafe { slice::from_raw_parts(self.data as *const u8, self.size as usize) })
    }

    /// The table header of a table box, or `None` for other tags.
    #[must_use]
    pub fn table_ptr(&self) -> Option<*mut RTable> {
        (self.is(TypeTag::Table) && self.data != 0).then_some(self.data as *mut RTable)
    }

    /// Hash of this box used as a table key.
    ///
    /// # Safety
    /// See [`RBox::str_bytes`].
    #[must_use]
    pub unsafe fn key_hash(&self) -> u64 {
        // SAFETY: guaranteed by the caller
        let text = unsafe { self.str_bytes() };
        key_hash(self.type_tag(), self.data, text)
    }

    /// Key equality: same tag, equal bytes for strings, equal payload
    /// otherwise.
    ///
    /// # Safety
    /// See [`RBox::str_bytes`].
    #[must_use]
    pub unsafe fn key_eq(&self, other: &Self) -> bool {
        let tag = self.type_tag();
        if tag != other.type_tag() {
            return false;
        }
        match tag {
            TypeTag::Null => true,
            TypeTag::Bool => (self.data != 0) == (other.data != 0),
            // SAFETY: guaranteed by the caller
            TypeTag::Str => unsafe { self.str_bytes() == other.str_bytes() },
            TypeTag::Int | TypeTag::Float | TypeTag::Func | TypeTag::Table => {
                self.data == other.data
            }
        }
    }
}

impl RTable {
    /// The slot array.
    ///
    /// # Safety
    /// `items` must point to `capacity` initialized items.
    #[must_use]
    pub unsafe fn items(&self) -> &[RItem] {
        if self.items.is_null() {
            return &[];
        }
        // SAFETY: guaranteed by the caller
        unsafe { slice::from_raw_parts(self.items, self.capacity as usize) }
    }

    /// The slot array, mutably.
    ///
    /// # Safety
    /// `items` must point to `capacity` initialized items that nothing else
    /// borrows.
    #[must_use]
    pub unsafe fn items_mut(&mut self) -> &mut [RItem] {
        if self.items.is_null() {
            return &mut [];
        }
        // SAFETY: guaranteed by the caller
        unsafe { slice::from_raw_parts_mut(self.items, self.capacity as usize) }
    }
}

const _: () = {
    use std::mem::{offset_of, size_of};

    assert!(size_of::<RBox>() == BOX_SIZE as usize);
    assert!(offset_of!(RBox, tag) == TAG_OFFSET as usize);
    assert!(offset_of!(RBox, data) == DATA_OFFSET as usize);
    assert!(offset_of!(RBox, size) == SIZE_OFFSET as usize);
    assert!(offset_of!(RBox, env) == ENV_OFFSET as usize);

    assert!(size_of::<RTable>() == TABLE_HEADER_SIZE as usize);
    assert!(offset_of!(RTable, count) == HEADER_COUNT_OFFSET as usize);
    assert!(offset_of!(RTable, capacity) == HEADER_CAPACITY_OFFSET as usize);
    assert!(offset_of!(RTable, items) == HEADER_ITEMS_OFFSET as usize);

    assert!(size_of::<RItem>() == ITEM_SIZE as usize);
    assert!(offset_of!(RItem, occupied) == ITEM_OCCUPIED_OFFSET as usize);
    assert!(offset_of!(RItem, key) == ITEM_KEY_OFFSET as usize);
    assert!(offset_of!(RItem, value) == ITEM_VALUE_OFFSET as usize);
};
