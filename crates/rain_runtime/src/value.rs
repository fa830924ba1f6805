//! Host-side snapshots of runtime values.

use std::collections::HashSet;
use std::fmt;

use rain_foundation::TypeTag;

use crate::boxes::RBox;
use crate::builtins::format_float;
use crate::table;

/// An owned copy of a box and everything reachable through its tables.
///
/// Tables keep slot order. A table reached again while it is being copied
/// snapshots as an empty table.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// The null value.
    Null,
    /// Integer.
    Int(i64),
    /// Float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// String.
    Str(String),
    /// Function, with its arity.
    Func {
        /// Number of parameters.
        arity: u32,
    },
    /// Table entries.
    Table(Vec<(Value, Value)>),
}

impl Value {
    /// Copies a box.
    ///
    /// # Safety
    /// `value` and everything reachable from it must be valid.
    #[must_use]
    pub unsafe fn from_box(value: &RBox) -> Self {
        let mut seen = HashSet::new();
        // SAFETY: guaranteed by the caller
        unsafe { Self::copy(value, &mut seen) }
    }

    unsafe fn copy(value: &RBox, seen: &mut HashSet<u64>) -> Self {
        match value.type_tag() {
            TypeTag::Null => Self::Null,
            TypeTag::Int => Self::Int(value.as_int()),
            TypeTag::Float => Self::Float(value.as_float()),
            TypeTag::Bool => Self::Bool(value.data != 0),
            // SAFETY: guaranteed by the caller
            TypeTag::Str => Self::Str(
                String::from_utf8_lossy(unsafe { value.str_bytes() }.unwrap_or_default())
                    .into_owned(),
            ),
            TypeTag::Func => Self::Func { arity: value.size },
            TypeTag::Table => {
                if !seen.insert(value.data) {
                    return Self::Table(Vec::new());
                }
                // SAFETY: guaranteed by the caller
                let entries = unsafe { table::entries(value) }
                    .into_iter()
                    .map(|(k, v)| unsafe { (Self::copy(&k, seen), Self::copy(&v, seen)) })
                    .collect();
                seen.remove(&value.data);
                Self::Table(entries)
            }
        }
    }

    /// Tag of this value.
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Null => TypeTag::Null,
            Self::Int(_) => TypeTag::Int,
            Self::Float(_) => TypeTag::Float,
            Self::Bool(_) => TypeTag::Bool,
            Self::Str(_) => TypeTag::Str,
            Self::Func { .. } => TypeTag::Func,
            Self::Table(_) => TypeTag::Table,
        }
    }

    /// Entry of a table under `key`.
    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        match self {
            Self::Table(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Entry of a table under a string key.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Self::Table(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Self::Str(s) if s == name))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Entries of an array-shaped table (`0..n` integer keys) in key order.
    /// Returns `None` if any key is missing or not an integer.
    #[must_use]
    pub fn as_array(&self) -> Option<Vec<&Value>> {
        let Self::Table(entries) = self else {
            return None;
        };
        let mut items = vec![None; entries.len()];
        for (key, value) in entries {
            let Self::Int(index) = key else {
                return None;
            };
            let slot = items.get_mut(usize::try_from(*index).ok()?)?;
            *slot = Some(value);
        }
        items.into_iter().collect()
    }

    /// The integer, if this is one.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The string, if this is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Int(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{}", format_float(*n)),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Str(s) => write!(f, "{s}"),
            Self::Func { arity } => write!(f, "<func/{arity}>"),
            Self::Table(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match k {
                        Self::Str(s) => write!(f, "{s} = {v}")?,
                        _ => write!(f, "[{k}] = {v}")?,
                    }
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_scalars() {
        unsafe {
            assert_eq!(Value::from_box(&RBox::int(3)), Value::Int(3));
            assert_eq!(Value::from_box(&RBox::string("s")), Value::Str("s".into()));
            assert_eq!(
                Value::from_box(&RBox::func(std::ptr::null(), 2)),
                Value::Func { arity: 2 }
            );
        }
    }

    #[test]
    fn snapshot_nested_tables() {
        let inner = RBox::new_table();
        let outer = RBox::new_table();
        unsafe {
            table::put(&inner, &RBox::int(0), RBox::string("a")).unwrap();
            table::put(&outer, &RBox::string("inner"), inner).unwrap();
            let value = Value::from_box(&outer);
            let inner = value.field("inner").unwrap();
            assert_eq!(inner.as_array().unwrap(), vec![&Value::Str("a".into())]);
        }
    }

    #[test]
    fn snapshot_cycles_terminate() {
        let t = RBox::new_table();
        unsafe {
            table::put(&t, &RBox::string("self"), t).unwrap();
            let value = Value::from_box(&t);
            assert_eq!(value.field("self"), Some(&Value::Table(Vec::new())));
        }
    }

    #[test]
    fn array_requires_dense_keys() {
        let sparse = Value::Table(vec![(Value::Int(1), Value::Null)]);
        assert!(sparse.as_array().is_none());
        let dense = Value::Table(vec![
            (Value::Int(1), Value::Int(20)),
            (Value::Int(0), Value::Int(10)),
        ]);
        assert_eq!(
            dense.as_array().unwrap(),
            vec![&Value::Int(10), &Value::Int(20)]
        );
    }

    #[test]
    fn display() {
        let v = Value::Table(vec![
            (Value::Str("a".into()), Value::Int(1)),
            (Value::Int(0), Value::Float(1.0)),
        ]);
        assert_eq!(v.to_string(), "{a = 1, [0] = 1.0}");
    }
}
