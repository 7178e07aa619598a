//! Table handle: create/open/close/delete plus the single-record CRUD
//! operations. Grounded in `record_mgr.c`'s `createTable`/`openTable`/
//! `insertRecord`/`deleteRecord`/`updateRecord`/`getRecord`.

use super::codec;
use super::Record;
use crate::buffer::{BufferPool, ReplacementStrategy};
use crate::error::{Result, StorageError};
use crate::schema::Schema;
use crate::storage::PageFile;
use crate::types::{PageNumber, Rid, PAGE_SIZE};

/// Default number of buffer frames a table allocates for itself.
pub const DEFAULT_BUFFER_FRAMES: usize = 64;

pub struct Table<F: PageFile> {
    pool: BufferPool<F>,
    schema: Schema,
    tuples_count: i32,
    free_page_hint: PageNumber,
    record_size: usize,
    records_per_page: usize,
}

impl<F: PageFile> Table<F> {
    /// Create a new table file with `schema` and write its page-0 metadata.
    pub fn create(path: &str, schema: Schema, strategy: ReplacementStrategy) -> Result<Self> {
        let file = F::create(path)?;
        let pool = BufferPool::new(file, DEFAULT_BUFFER_FRAMES, strategy)?;
        let mut table = Self {
            pool,
            record_size: schema.record_size(),
            records_per_page: PAGE_SIZE / schema.record_size().max(1),
            schema,
            tuples_count: 0,
            free_page_hint: 1,
        };
        table.persist_page_zero()?;
        Ok(table)
    }

    /// Open an existing table file, reading its schema and counters back
    /// from page 0.
    pub fn open(path: &str, strategy: ReplacementStrategy) -> Result<Self> {
        let file = F::open(path)?;
        let pool = BufferPool::new(file, DEFAULT_BUFFER_FRAMES, strategy)?;
        pool.pin(0)?;
        let page0 = pool.read_page(0)?;
        pool.unpin(0)?;

        let tuples_count = i32::from_le_bytes(page0[0..4].try_into().unwrap());
        let free_page_hint = i32::from_le_bytes(page0[4..8].try_into().unwrap());
        let (schema, _) = codec::decode_schema(&page0[8..])?;

        Ok(Self {
            record_size: schema.record_size(),
            records_per_page: PAGE_SIZE / schema.record_size().max(1),
            pool,
            schema,
            tuples_count,
            free_page_hint,
        })
    }

    /// Flush page-0 metadata and release the table's buffer pool.
    pub fn close(mut self) -> Result<()> {
        self.persist_page_zero()?;
        self.pool.shutdown()
    }

    /// Remove a table file from disk. The table must not be open.
    pub fn destroy(path: &str) -> Result<()> {
        F::destroy(path)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_tuples(&self) -> i32 {
        self.tuples_count
    }

    fn persist_page_zero(&mut self) -> Result<()> {
        let schema_bytes = codec::encode_schema(&self.schema);
        if 8 + schema_bytes.len() > PAGE_SIZE {
            return Err(StorageError::invalid_operation("schema too large for page 0"));
        }
        let mut buf = vec![0u8; PAGE_SIZE];
        buf[0..4].copy_from_slice(&self.tuples_count.to_le_bytes());
        buf[4..8].copy_from_slice(&self.free_page_hint.to_le_bytes());
        buf[8..8 + schema_bytes.len()].copy_from_slice(&schema_bytes);

        self.pool.pin(0)?;
        self.pool.write_page(0, &buf)?;
        self.pool.unpin(0)
    }

    fn slot_offset(&self, slot: i32) -> Result<usize> {
        if slot < 0 || slot as usize >= self.records_per_page {
            return Err(StorageError::invalid_operation(format!(
                "slot {slot} out of range (capacity {} per page)",
                self.records_per_page
            )));
        }
        Ok(slot as usize * self.record_size)
    }

    fn check_values(&self, values: &[crate::types::Value]) -> Result<()> {
        if values.len() != self.schema.num_attrs() {
            return Err(StorageError::invalid_operation(format!(
                "expected {} values, got {}",
                self.schema.num_attrs(),
                values.len()
            )));
        }
        for (i, v) in values.iter().enumerate() {
            if v.data_type() != self.schema.data_types()[i] {
                return Err(StorageError::invalid_operation(format!(
                    "attribute {i} expects {:?}, got {:?}",
                    self.schema.data_types()[i],
                    v.data_type()
                )));
            }
        }
        Ok(())
    }

    /// Insert a new record, returning the RID it was stored at. Mirrors
    /// `insertRecord`/`findFreeSlot`.
    pub fn insert_record(&mut self, values: Vec<crate::types::Value>) -> Result<Rid> {
        self.check_values(&values)?;
        let record_bytes = codec::encode_record(&values, &self.schema)?;

        let mut page_num = self.free_page_hint.max(1);
        loop {
            self.pool.pin(page_num)?;
            let mut data = self.pool.read_page(page_num)?;
            let mut free_slot = None;
            for slot in 0..self.records_per_page {
                let off = slot * self.record_size;
                if !codec::is_live(&data[off..off + self.record_size]) {
                    free_slot = Some(slot);
                    break;
                }
            }
            if let Some(slot) = free_slot {
                let off = slot * self.record_size;
                data[off..off + self.record_size].copy_from_slice(&record_bytes);
                self.pool.write_page(page_num, &data)?;
                self.pool.unpin(page_num)?;
                self.free_page_hint = page_num;
                self.tuples_count += 1;
                self.persist_page_zero()?;
                return Ok(Rid::new(page_num, slot as i32));
            }
            self.pool.unpin(page_num)?;
            page_num += 1;
        }
    }

    /// Mark the record at `rid` deleted. Mirrors `deleteRecord`.
    pub fn delete_record(&mut self, rid: Rid) -> Result<()> {
        let off = self.slot_offset(rid.slot)?;
        self.pool.pin(rid.page)?;
        let mut data = self.pool.read_page(rid.page)?;
        if !codec::is_live(&data[off..off + self.record_size]) {
            self.pool.unpin(rid.page)?;
            return Err(StorageError::RmNoTupleWithGivenRid(rid));
        }
        codec::mark_tombstone(&mut data[off..off + self.record_size]);
        self.pool.write_page(rid.page, &data)?;
        self.pool.unpin(rid.page)?;
        self.tuples_count -= 1;
        if rid.page < self.free_page_hint {
            self.free_page_hint = rid.page;
        }
        self.persist_page_zero()
    }

    /// Overwrite the record at `rid` in place. Mirrors `updateRecord`.
    pub fn update_record(&mut self, rid: Rid, values: Vec<crate::types::Value>) -> Result<()> {
        self.check_values(&values)?;
        let record_bytes = codec::encode_record(&values, &self.schema)?;
        let off = self.slot_offset(rid.slot)?;

        self.pool.pin(rid.page)?;
        let mut data = self.pool.read_page(rid.page)?;
        if !codec::is_live(&data[off..off + self.record_size]) {
            self.pool.unpin(rid.page)?;
            return Err(StorageError::RmNoTupleWithGivenRid(rid));
        }
        data[off..off + self.record_size].copy_from_slice(&record_bytes);
        self.pool.write_page(rid.page, &data)?;
        self.pool.unpin(rid.page)
    }

    /// Read the record at `rid`. Mirrors `getRecord`.
    pub fn get_record(&self, rid: Rid) -> Result<Record> {
        let off = self.slot_offset(rid.slot)?;
        self.pool.pin(rid.page)?;
        let data = self.pool.read_page(rid.page)?;
        self.pool.unpin(rid.page)?;
        let bytes = &data[off..off + self.record_size];
        if !codec::is_live(bytes) {
            return Err(StorageError::RmNoTupleWithGivenRid(rid));
        }
        let values = codec::decode_record(bytes, &self.schema)?;
        Ok(Record::new(rid, values))
    }

    pub(crate) fn records_per_page(&self) -> usize {
        self.records_per_page
    }

    pub(crate) fn total_pages(&self) -> PageNumber {
        self.pool.total_pages()
    }

    pub(crate) fn pool(&self) -> &BufferPool<F> {
        &self.pool
    }

    pub(crate) fn record_size(&self) -> usize {
        self.record_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::FilePageFile;
    use crate::types::{DataType, Value};
    use tempfile::TempDir;

    fn sample_schema() -> Schema {
        Schema::new(
            vec!["id".into(), "name".into()],
            vec![DataType::Int, DataType::String],
            vec![0, 16],
            vec![0],
        )
        .unwrap()
    }

    #[test]
    fn insert_get_delete_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.bin").to_str().unwrap().to_string();
        let mut table: Table<FilePageFile> =
            Table::create(&path, sample_schema(), ReplacementStrategy::Fifo).unwrap();

        let rid = table
            .insert_record(vec![Value::Int(1), Value::String("alice".into())])
            .unwrap();
        assert_eq!(table.num_tuples(), 1);

        let record = table.get_record(rid).unwrap();
        assert_eq!(record.get_attr(0).unwrap(), &Value::Int(1));

        table.delete_record(rid).unwrap();
        assert_eq!(table.num_tuples(), 0);
        assert!(table.get_record(rid).is_err());
    }

    #[test]
    fn reopened_table_recovers_schema_and_count() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.bin").to_str().unwrap().to_string();
        {
            let mut table: Table<FilePageFile> =
                Table::create(&path, sample_schema(), ReplacementStrategy::Fifo).unwrap();
            table
                .insert_record(vec![Value::Int(9), Value::String("bob".into())])
                .unwrap();
            table.close().unwrap();
        }

        let table: Table<FilePageFile> = Table::open(&path, ReplacementStrategy::Fifo).unwrap();
        assert_eq!(table.num_tuples(), 1);
        assert_eq!(table.schema().num_attrs(), 2);
    }

    #[test]
    fn insert_reuses_tombstoned_slot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.bin").to_str().unwrap().to_string();
        let mut table: Table<FilePageFile> =
            Table::create(&path, sample_schema(), ReplacementStrategy::Fifo).unwrap();

        let rid1 = table
            .insert_record(vec![Value::Int(1), Value::String("a".into())])
            .unwrap();
        table.delete_record(rid1).unwrap();
        let rid2 = table
            .insert_record(vec![Value::Int(2), Value::String("b".into())])
            .unwrap();
        assert_eq!(rid1, rid2);
    }
}
