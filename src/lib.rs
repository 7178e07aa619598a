//! # Storage Engine Core
//!
//! A disk-backed relational storage core built from three layers:
//!
//! - **Storage layer** (`storage`): a block-addressable page file, the only
//!   layer that touches the operating system directly.
//! - **Buffer pool** (`buffer`): a fixed-size in-memory page cache with
//!   FIFO/LRU replacement sitting on top of the page file.
//! - **Access methods** (`schema`/`record`/`btree`): a slotted-page record
//!   manager and an in-memory B+-tree index keyed to record identifiers,
//!   both built on the buffer pool.
//!
//! Transactions, concurrency control across clients, crash recovery, and
//! replication are out of scope; see each module for its specific contract.

pub mod btree;
pub mod buffer;
pub mod error;
pub mod record;
pub mod schema;
pub mod storage;
pub mod types;

pub use error::{Result, StorageError};
pub use types::{PageNumber, Rid, DataType, Value, NO_PAGE, PAGE_SIZE};

pub use btree::{BTree, TreeNode, TreeScan};
pub use buffer::{BufferPool, PinnedPage, ReplacementStrategy};
pub use record::{Record, Scan as TableScan, Table};
pub use schema::Schema;
pub use storage::{FilePageFile, PageFile};

/// Buffer pool sizing and replacement policy for a table or index file.
#[derive(Debug, Clone, Copy)]
pub struct BufferPoolConfig {
    /// Number of frames allocated to the pool.
    pub num_frames: usize,
    /// Replacement policy used when every frame is occupied.
    pub strategy: ReplacementStrategy,
}

impl Default for BufferPoolConfig {
    fn default() -> Self {
        Self {
            num_frames: record::DEFAULT_BUFFER_FRAMES,
            strategy: ReplacementStrategy::Fifo,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn record_and_index_layers_compose_over_one_table() {
        let dir = TempDir::new().unwrap();
        let table_path = dir.path().join("people.bin").to_str().unwrap().to_string();

        let schema = Schema::new(
            vec!["id".into(), "name".into()],
            vec![DataType::Int, DataType::String],
            vec![0, 16],
            vec![0],
        )
        .unwrap();

        let mut table: Table<FilePageFile> =
            Table::create(&table_path, schema, ReplacementStrategy::Lru).unwrap();
        let mut index = BTree::create(DataType::Int, 4).unwrap();

        for (id, name) in [(1, "ann"), (2, "bo"), (3, "cy")] {
            let rid = table
                .insert_record(vec![Value::Int(id), Value::String(name.into())])
                .unwrap();
            index.insert(Value::Int(id), rid).unwrap();
        }

        let rid = index.search(&Value::Int(2)).unwrap();
        let record = table.get_record(rid).unwrap();
        assert_eq!(record.get_attr(1).unwrap(), &Value::String("bo".into()));

        index.delete(&Value::Int(2)).unwrap();
        table.delete_record(rid).unwrap();
        assert!(index.search(&Value::Int(2)).is_err());
        assert!(table.get_record(rid).is_err());
    }
}
