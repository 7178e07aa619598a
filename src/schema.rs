//! Table schemas: attribute names, types, and fixed-width layout.
//!
//! Grounded in `record_mgr.c`'s `Schema`/`createSchema`/`attrOffset`. A
//! schema's attributes are fixed at creation; string attributes carry a
//! fixed `type_length` the way the C struct's `typeLength` array does.

use crate::error::{Result, StorageError};
use crate::types::{DataType, Value};

/// A table's attribute list and the derived layout used by the record
/// manager to pack/unpack fixed-width records.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    attr_names: Vec<String>,
    data_types: Vec<DataType>,
    type_lengths: Vec<usize>,
    key_attrs: Vec<usize>,
}

impl Schema {
    /// Build a schema. `type_lengths` is only meaningful for `String`
    /// attributes and must have the same length as `attr_names`.
    /// `key_attrs` are indices into `attr_names` forming the primary key.
    pub fn new(
        attr_names: Vec<String>,
        data_types: Vec<DataType>,
        type_lengths: Vec<usize>,
        key_attrs: Vec<usize>,
    ) -> Result<Self> {
        if attr_names.len() != data_types.len() || attr_names.len() != type_lengths.len() {
            return Err(StorageError::invalid_operation(
                "attr_names, data_types, and type_lengths must have equal length",
            ));
        }
        for &k in &key_attrs {
            if k >= attr_names.len() {
                return Err(StorageError::invalid_operation(format!(
                    "key attribute index {k} out of range"
                )));
            }
        }
        Ok(Self {
            attr_names,
            data_types,
            type_lengths,
            key_attrs,
        })
    }

    pub fn num_attrs(&self) -> usize {
        self.attr_names.len()
    }

    pub fn attr_names(&self) -> &[String] {
        &self.attr_names
    }

    pub fn data_types(&self) -> &[DataType] {
        &self.data_types
    }

    pub fn key_attrs(&self) -> &[usize] {
        &self.key_attrs
    }

    pub fn attr_index(&self, name: &str) -> Option<usize> {
        self.attr_names.iter().position(|n| n == name)
    }

    fn check_attr(&self, attr_num: usize) -> Result<()> {
        if attr_num >= self.num_attrs() {
            return Err(StorageError::invalid_operation(format!(
                "attribute index {attr_num} out of range for schema with {} attributes",
                self.num_attrs()
            )));
        }
        Ok(())
    }

    /// Byte width of attribute `attr_num` in an encoded record.
    pub fn attr_width(&self, attr_num: usize) -> Result<usize> {
        self.check_attr(attr_num)?;
        Ok(Value::width(self.data_types[attr_num], self.type_lengths[attr_num]))
    }

    /// Byte offset of attribute `attr_num` within an encoded record,
    /// *excluding* the leading tombstone byte. Mirrors `attrOffset`.
    pub fn attr_offset(&self, attr_num: usize) -> Result<usize> {
        self.check_attr(attr_num)?;
        let mut offset = 0;
        for i in 0..attr_num {
            offset += self.attr_width(i)?;
        }
        Ok(offset)
    }

    /// Total encoded record width, including the one-byte tombstone marker.
    pub fn record_size(&self) -> usize {
        let data_size: usize = (0..self.num_attrs())
            .map(|i| self.attr_width(i).unwrap())
            .sum();
        data_size + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        Schema::new(
            vec!["id".into(), "name".into()],
            vec![DataType::Int, DataType::String],
            vec![0, 16],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn computes_offsets_and_record_size() {
        let s = sample();
        assert_eq!(s.attr_offset(0).unwrap(), 0);
        assert_eq!(s.attr_offset(1).unwrap(), 4);
        assert_eq!(s.record_size(), 4 + 16 + 1);
    }

    #[test]
    fn rejects_mismatched_lengths() {
        let result = Schema::new(vec!["a".into()], vec![DataType::Int], vec![], vec![]);
        assert!(result.is_err());
    }
}
