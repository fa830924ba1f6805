//! Boxes known at compile time.
//!
//! Module-scope code never runs: every module-scope expression folds to a
//! [`ConstBox`], which is later written into data objects as 32 bytes plus
//! relocations for its pointer fields.

use std::rc::Rc;

use cranelift_module::{DataDescription, DataId, FuncId, Module};
use rain_foundation::abi::{self, BOX_SIZE, DATA_OFFSET, ENV_OFFSET, SIZE_OFFSET, TAG_OFFSET};
use rain_foundation::{Error, ErrorKind, Result, TypeTag};

use crate::static_table::TableId;

/// Payload of a compile-time box.
#[derive(Clone, Debug, PartialEq)]
pub enum ConstValue {
    /// `null`
    Null,
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// A string held in read-only data.
    Str {
        /// NUL-terminated bytes.
        data: DataId,
        /// Text, for key hashing and folding.
        text: Rc<str>,
    },
    /// A compiled function.
    Func {
        /// Its code.
        func: FuncId,
        /// Number of parameters.
        arity: u32,
    },
    /// A static table.
    Table(TableId),
}

/// A box whose contents are fixed at compile time.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstBox {
    /// Payload.
    pub value: ConstValue,
    /// Global cell holding the environment, if any.
    pub env: Option<DataId>,
}

impl ConstBox {
    const fn plain(value: ConstValue) -> Self {
        Self { value, env: None }
    }

    /// `null`
    #[must_use]
    pub const fn null() -> Self {
        Self::plain(ConstValue::Null)
    }

    /// Integer box.
    #[must_use]
    pub const fn int(value: i64) -> Self {
        Self::plain(ConstValue::Int(value))
    }

    /// Float box.
    #[must_use]
    pub const fn float(value: f64) -> Self {
        Self::plain(ConstValue::Float(value))
    }

    /// Boolean box.
    #[must_use]
    pub const fn bool(value: bool) -> Self {
        Self::plain(ConstValue::Bool(value))
    }

    /// String box over interned data.
    #[must_use]
    pub fn string(data: DataId, text: Rc<str>) -> Self {
        Self::plain(ConstValue::Str { data, text })
    }

    /// Function box.
    #[must_use]
    pub const fn func(func: FuncId, arity: u32) -> Self {
        Self::plain(ConstValue::Func { func, arity })
    }

    /// Static table box.
    #[must_use]
    pub const fn table(id: TableId) -> Self {
        Self::plain(ConstValue::Table(id))
    }

    /// The same box with `cell` as its environment.
    #[must_use]
    pub fn with_env(mut self, cell: DataId) -> Self {
        self.env = Some(cell);
        self
    }

    /// Type tag.
    #[must_use]
    pub const fn tag(&self) -> TypeTag {
        match self.value {
            ConstValue::Null => TypeTag::Null,
            ConstValue::Int(_) => TypeTag::Int,
            ConstValue::Float(_) => TypeTag::Float,
            ConstValue::Bool(_) => TypeTag::Bool,
            ConstValue::Str { .. } => TypeTag::Str,
            ConstValue::Func { .. } => TypeTag::Func,
            ConstValue::Table(_) => TypeTag::Table,
        }
    }

    /// Payload word for scalar boxes; 0 for pointer-valued ones.
    #[must_use]
    pub fn data_word(&self) -> u64 {
        match &self.value {
            ConstValue::Int(i) => u64::from_ne_bytes(i.to_ne_bytes()),
            ConstValue::Float(f) => f.to_bits(),
            ConstValue::Bool(b) => u64::from(*b),
            _ => 0,
        }
    }

    /// Size field: string length or function arity.
    ///
    /// # Errors
    /// Returns an error for strings longer than `u32::MAX` bytes.
    pub fn size_word(&self) -> Result<u32> {
        match &self.value {
            ConstValue::Str { text, .. } => u32::try_from(text.len())
                .map_err(|_| Error::codegen("string literal is too long")),
            ConstValue::Func { arity, .. } => Ok(*arity),
            _ => Ok(0),
        }
    }

    /// Hash under the probe law. Only literal-valued boxes can be static keys.
    ///
    /// # Errors
    /// Returns [`ErrorKind::UnhashableKey`] for functions and tables.
    pub fn key_hash(&self) -> Result<u64> {
        let tag = self.tag();
        if !tag.is_literal() {
            return Err(Error::new(ErrorKind::UnhashableKey(tag)));
        }
        let text = match &self.value {
            ConstValue::Str { text, .. } => Some(text.as_bytes()),
            _ => None,
        };
        Ok(abi::key_hash(tag, self.data_word(), text))
    }

    /// Key equality: same tag, equal bytes for strings, equal payload
    /// otherwise.
    #[must_use]
    pub fn key_eq(&self, other: &Self) -> bool {
        match (&self.value, &other.value) {
            (ConstValue::Str { text: a, .. }, ConstValue::Str { text: b, .. }) => a == b,
            (ConstValue::Func { func: a, .. }, ConstValue::Func { func: b, .. }) => a == b,
            (ConstValue::Table(a), ConstValue::Table(b)) => a == b,
            _ => self.tag() == other.tag() && self.data_word() == other.data_word(),
        }
    }
}

/// Writes `value` into `bytes` at `offset`, recording relocations for its
/// pointer fields in `desc`. `table_header` maps a static table to the data
/// object its box points at.
///
/// # Errors
/// Returns an error if a field does not fit its slot.
pub fn write_box(
    module: &mut dyn Module,
    desc: &mut DataDescription,
    bytes: &mut [u8],
    offset: usize,
    value: &ConstBox,
    table_header: &dyn Fn(TableId) -> DataId,
) -> Result<()> {
    let at = |field: i32| offset + usize::try_from(field).unwrap_or_default();
    let reloc = |field: i32| {
        u32::try_from(at(field)).map_err(|_| Error::codegen("data object is too large"))
    };
    let end = offset + BOX_SIZE as usize;
    if bytes.len() < end {
        return Err(Error::internal("box written past the end of its data"));
    }

    bytes[at(TAG_OFFSET)] = value.tag().as_u8();
    bytes[at(DATA_OFFSET)..at(DATA_OFFSET) + 8].copy_from_slice(&value.data_word().to_ne_bytes());
    bytes[at(SIZE_OFFSET)..at(SIZE_OFFSET) + 4].copy_from_slice(&value.size_word()?.to_ne_bytes());

    match &value.value {
        ConstValue::Str { data, .. } => {
            let gv = module.declare_data_in_data(*data, desc);
            desc.write_data_addr(reloc(DATA_OFFSET)?, gv, 0);
        }
        ConstValue::Func { func, .. } => {
            let fref = module.declare_func_in_data(*func, desc);
            desc.write_function_addr(reloc(DATA_OFFSET)?, fref);
        }
        ConstValue::Table(id) => {
            let gv = module.declare_data_in_data(table_header(*id), desc);
            desc.write_data_addr(reloc(DATA_OFFSET)?, gv, 0);
        }
        ConstValue::Null | ConstValue::Int(_) | ConstValue::Float(_) | ConstValue::Bool(_) => {}
    }
    if let Some(env) = value.env {
        let gv = module.declare_data_in_data(env, desc);
        desc.write_data_addr(reloc(ENV_OFFSET)?, gv, 0);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> ConstBox {
        ConstBox::string(DataId::from_u32(0), Rc::from(s))
    }

    #[test]
    fn strings_compare_by_text() {
        let a = ConstBox::string(DataId::from_u32(1), Rc::from("k"));
        let b = ConstBox::string(DataId::from_u32(2), Rc::from("k"));
        assert!(a.key_eq(&b));
        assert!(!a.key_eq(&text("j")));
        assert_eq!(a.key_hash().unwrap(), b.key_hash().unwrap());
    }

    #[test]
    fn scalar_keys() {
        assert!(ConstBox::int(3).key_eq(&ConstBox::int(3)));
        assert!(!ConstBox::int(1).key_eq(&ConstBox::bool(true)));
        assert_eq!(ConstBox::null().key_hash().unwrap(), 0);
        assert_eq!(ConstBox::int(-1).data_word(), u64::MAX);
    }

    #[test]
    fn functions_are_not_static_keys() {
        let f = ConstBox::func(FuncId::from_u32(0), 1);
        let err = f.key_hash().unwrap_err();
        assert!(matches!(err.kind, ErrorKind::UnhashableKey(TypeTag::Func)));
        assert_eq!(f.size_word().unwrap(), 1);
    }

    #[test]
    fn env_keeps_payload() {
        let b = ConstBox::int(4).with_env(DataId::from_u32(9));
        assert_eq!(b.tag(), TypeTag::Int);
        assert_eq!(b.env, Some(DataId::from_u32(9)));
    }
}
