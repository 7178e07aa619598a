//! Typed attribute/key values.
//!
//! The original C source represents schema attributes and B+-tree keys as a
//! tagged union (`Value` with a `DataType` discriminant) but then compares
//! keys by reading only the integer payload (`v.intV`) regardless of the
//! declared type. Here comparisons are type-directed: comparing two `Value`s
//! of different `DataType`s is a caller error rather than silently reading
//! the wrong union arm.

use crate::error::{Result, StorageError};
use std::cmp::Ordering;
use std::fmt;

/// The type tag of a schema attribute or B+-tree key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Float,
    Bool,
    /// Fixed-length string; the length lives on the owning `Attribute`.
    String,
}

/// A typed value: an attribute payload or a B+-tree key.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
}

impl Value {
    /// The `DataType` tag of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Bool(_) => DataType::Bool,
            Value::String(_) => DataType::String,
        }
    }

    /// Native on-disk width of this value's type, in bytes, given a fixed
    /// string length for `DataType::String`. Mirrors `attrOffset` in
    /// `record_mgr.c`.
    pub fn width(data_type: DataType, type_length: usize) -> usize {
        match data_type {
            DataType::Int => std::mem::size_of::<i32>(),
            DataType::Float => std::mem::size_of::<f32>(),
            DataType::Bool => std::mem::size_of::<u8>(),
            DataType::String => type_length,
        }
    }

    /// Type-directed comparison. Errors if `self` and `other` carry
    /// different `DataType`s — the bug the original source has (comparing
    /// only the integer payload of whatever type was passed) is treated as
    /// an open question resolved in favor of correctness (SPEC_FULL §6.1).
    pub fn compare_typed(&self, other: &Value) -> Result<Ordering> {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => Ok(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => a
                .partial_cmp(b)
                .ok_or_else(|| StorageError::invalid_operation("NaN is not orderable")),
            (Value::Bool(a), Value::Bool(b)) => Ok(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
            _ => Err(StorageError::invalid_operation(format!(
                "cannot compare {:?} key against {:?} key",
                self.data_type(),
                other.data_type()
            ))),
        }
    }

    /// Serialize this value into `dst` using its native width. `dst` must be
    /// exactly `Value::width(self.data_type(), type_length)` bytes.
    pub fn encode(&self, dst: &mut [u8], type_length: usize) {
        match self {
            Value::Int(v) => dst[..4].copy_from_slice(&v.to_le_bytes()),
            Value::Float(v) => dst[..4].copy_from_slice(&v.to_le_bytes()),
            Value::Bool(v) => dst[0] = *v as u8,
            Value::String(s) => {
                let bytes = s.as_bytes();
                let n = bytes.len().min(type_length);
                dst[..n].copy_from_slice(&bytes[..n]);
                for b in &mut dst[n..type_length] {
                    *b = 0;
                }
            }
        }
    }

    /// Deserialize a value of `data_type` from `src`.
    pub fn decode(data_type: DataType, src: &[u8], type_length: usize) -> Self {
        match data_type {
            DataType::Int => Value::Int(i32::from_le_bytes(src[..4].try_into().unwrap())),
            DataType::Float => Value::Float(f32::from_le_bytes(src[..4].try_into().unwrap())),
            DataType::Bool => Value::Bool(src[0] != 0),
            DataType::String => {
                let end = src[..type_length]
                    .iter()
                    .position(|&b| b == 0)
                    .unwrap_or(type_length);
                Value::String(String::from_utf8_lossy(&src[..end]).into_owned())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compares_same_type() {
        assert_eq!(
            Value::Int(1).compare_typed(&Value::Int(2)).unwrap(),
            Ordering::Less
        );
        assert_eq!(
            Value::String("b".into())
                .compare_typed(&Value::String("a".into()))
                .unwrap(),
            Ordering::Greater
        );
    }

    #[test]
    fn rejects_mixed_type_comparison() {
        assert!(Value::Int(1).compare_typed(&Value::Bool(true)).is_err());
    }

    #[test]
    fn round_trips_through_encode_decode() {
        let mut buf = [0u8; 8];
        Value::String("hi".into()).encode(&mut buf, 8);
        assert_eq!(
            Value::decode(DataType::String, &buf, 8),
            Value::String("hi".into())
        );

        let mut buf = [0u8; 4];
        Value::Int(-7).encode(&mut buf, 4);
        assert_eq!(Value::decode(DataType::Int, &buf, 4), Value::Int(-7));
    }
}
