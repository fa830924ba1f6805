//! The box ABI: the shape of every Rain value in memory.
//!
//! A box is 32 bytes on 64-bit targets:
//!
//! ```text
//! offset  0  tag   u8   TypeTag
//! offset  8  data  u64  int, float bits, bool, or a pointer (str, func, table)
//! offset 16  size  u32  string length or function arity
//! offset 24  env   ptr  heap box holding the environment, or null
//! ```
//!
//! Tables are open-addressing arrays of items behind a 16-byte header:
//!
//! ```text
//! header  { count u32 @0, capacity u32 @4, items ptr @8 }
//! item    { occupied u32 @0, key box @8, value box @40 }   (72 bytes)
//! ```
//!
//! Compile-time tables and runtime tables share this layout and the probe
//! law in [`probe`], so the runtime can read and write either kind.

use std::fmt;

/// Size of a box in bytes.
pub const BOX_SIZE: u32 = 32;
/// Offset of the type tag.
pub const TAG_OFFSET: i32 = 0;
/// Offset of the payload word.
pub const DATA_OFFSET: i32 = 8;
/// Offset of the string length or function arity.
pub const SIZE_OFFSET: i32 = 16;
/// Offset of the environment pointer.
pub const ENV_OFFSET: i32 = 24;

/// Size of a table header in bytes.
pub const TABLE_HEADER_SIZE: u32 = 16;
/// Offset of the occupied-slot count in a table header.
pub const HEADER_COUNT_OFFSET: i32 = 0;
/// Offset of the capacity in a table header.
pub const HEADER_CAPACITY_OFFSET: i32 = 4;
/// Offset of the item-array pointer in a table header.
pub const HEADER_ITEMS_OFFSET: i32 = 8;

/// Size of a table item in bytes.
pub const ITEM_SIZE: u32 = 72;
/// Offset of the occupied flag in a table item.
pub const ITEM_OCCUPIED_OFFSET: i32 = 0;
/// Offset of the key box in a table item.
pub const ITEM_KEY_OFFSET: i32 = 8;
/// Offset of the value box in a table item.
pub const ITEM_VALUE_OFFSET: i32 = 40;

/// Capacity of every table, static or dynamic.
pub const HASH_SIZE: usize = 64;

/// Type tag stored in the first byte of every box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TypeTag {
    /// The null value.
    Null = 0,
    /// 64-bit signed integer.
    Int = 1,
    /// 64-bit float.
    Float = 2,
    /// Boolean.
    Bool = 3,
    /// Immutable NUL-terminated string.
    Str = 4,
    /// Compiled function.
    Func = 5,
    /// Associative table.
    Table = 6,
}

impl TypeTag {
    /// Decodes a tag byte.
    #[must_use]
    pub const fn from_u8(byte: u8) -> Option<Self> {
        Some(match byte {
            0 => Self::Null,
            1 => Self::Int,
            2 => Self::Float,
            3 => Self::Bool,
            4 => Self::Str,
            5 => Self::Func,
            6 => Self::Table,
            _ => return None,
        })
    }

    /// The tag byte.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// The name programs see through the `type` builtin.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Str => "str",
            Self::Func => "func",
            Self::Table => "table",
        }
    }

    /// Returns true for tags whose values can key a compile-time table.
    #[must_use]
    pub const fn is_literal(self) -> bool {
        !matches!(self, Self::Func | Self::Table)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// 64-bit FNV-1a hash of a byte string.
#[must_use]
pub fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Hash of a table key.
///
/// `data` is the box's payload word; `text` must be the string bytes when
/// `tag` is [`TypeTag::Str`] and is ignored otherwise.
#[must_use]
pub fn key_hash(tag: TypeTag, data: u64, text: Option<&[u8]>) -> u64 {
    match tag {
        TypeTag::Null => 0,
        TypeTag::Bool => u64::from(data != 0),
        TypeTag::Str => fnv1a(text.unwrap_or_default()),
        TypeTag::Int | TypeTag::Float | TypeTag::Func | TypeTag::Table => data,
    }
}

/// The probe law: slots visited for a key with hash `hash` in a table of
/// `capacity` slots, in order.
///
/// Every slot is visited exactly once. `put` stops at the first empty slot
/// or the first slot holding an equal key; `get` stops at the first empty
/// slot (absent) or the first equal key.
pub fn probe(hash: u64, capacity: usize) -> impl Iterator<Item = usize> {
    let home = if capacity == 0 {
        0
    } else {
        // capacity fits in u64 on every supported target
        (hash % capacity as u64) as usize
    };
    (0..capacity).map(move |step| (home + step) % capacity)
}
