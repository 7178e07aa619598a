//! Record manager: a slotted-page, fixed-width row store.
//!
//! Grounded in `record_mgr.c`: page 0 of a table's file holds the tuple
//! count, a free-page hint, and the encoded [`crate::schema::Schema`]; every
//! later page is packed with fixed-width records, each prefixed by a single
//! tombstone byte (`b'+'` live, `b'-'` deleted).

mod codec;
mod scan;
mod table;

pub use scan::Scan;
pub use table::{Table, DEFAULT_BUFFER_FRAMES};

use crate::error::{Result, StorageError};
use crate::schema::Schema;
use crate::types::{Rid, Value};

/// A decoded row together with the RID it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    rid: Rid,
    values: Vec<Value>,
}

impl Record {
    pub fn new(rid: Rid, values: Vec<Value>) -> Self {
        Self { rid, values }
    }

    pub fn rid(&self) -> Rid {
        self.rid
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Read attribute `attr_num`. Mirrors `getAttr`.
    pub fn get_attr(&self, attr_num: usize) -> Result<&Value> {
        self.values
            .get(attr_num)
            .ok_or_else(|| StorageError::invalid_operation(format!("no attribute {attr_num}")))
    }

    /// Overwrite attribute `attr_num`. Mirrors `setAttr`.
    pub fn set_attr(&mut self, attr_num: usize, value: Value, schema: &Schema) -> Result<()> {
        let expected = *schema
            .data_types()
            .get(attr_num)
            .ok_or_else(|| StorageError::invalid_operation(format!("no attribute {attr_num}")))?;
        if value.data_type() != expected {
            return Err(StorageError::invalid_operation(format!(
                "attribute {attr_num} expects {expected:?}, got {:?}",
                value.data_type()
            )));
        }
        *self
            .values
            .get_mut(attr_num)
            .ok_or_else(|| StorageError::invalid_operation(format!("no attribute {attr_num}")))? = value;
        Ok(())
    }
}
