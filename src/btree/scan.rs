//! Materialized in-order tree scan. Mirrors `openTreeScan`/`nextEntry`/
//! `closeTreeScan`.

use super::tree::BTree;
use crate::error::{Result, StorageError};
use crate::types::{Rid, Value};

pub struct TreeScan {
    entries: Vec<(Value, Rid)>,
    position: usize,
}

impl TreeScan {
    /// Snapshot every entry in `tree` at the moment the scan is opened;
    /// later mutations to `tree` are not reflected.
    pub fn open(tree: &BTree) -> Self {
        Self {
            entries: tree.entries(),
            position: 0,
        }
    }

    /// Advance to the next entry, or [`StorageError::ImNoMoreEntries`] once
    /// exhausted.
    pub fn next(&mut self) -> Result<(Value, Rid)> {
        let entry = self
            .entries
            .get(self.position)
            .cloned()
            .ok_or(StorageError::ImNoMoreEntries)?;
        self.position += 1;
        Ok(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release the scan. A no-op since results are already materialized.
    pub fn close(self) -> Result<()> {
        Ok(())
    }
}
