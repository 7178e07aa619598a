//! Table scan with an optional predicate.
//!
//! Materializes every matching record when opened rather than streaming
//! page-by-page (matching the B+-tree scan's materialize-at-open
//! contract). `Scan::open` takes the caller's table handle directly — the
//! original `startScan` instead called `openTable(rel, "ScanTable")`,
//! silently replacing the relation the caller passed in. That bug is not
//! reproduced here.
//!
//! Every slot is decoded and offered to the predicate regardless of its
//! tombstone byte — a caller that only wants live rows filters on it
//! explicitly, the same contract `next` has in `record_mgr.c`.

use super::{codec, Record, Table};
use crate::error::{Result, StorageError};
use crate::storage::PageFile;
use crate::types::Rid;

/// A predicate evaluated against each live record during a scan.
pub type Predicate = Box<dyn Fn(&Record) -> bool>;

pub struct Scan {
    records: Vec<Record>,
    position: usize,
}

impl Scan {
    /// Open a scan over `table`, optionally filtered by `predicate`.
    /// Mirrors `startScan`/`next`.
    pub fn open<F: PageFile>(table: &Table<F>, predicate: Option<Predicate>) -> Result<Self> {
        let mut records = Vec::new();
        let records_per_page = table.records_per_page();
        let record_size = table.record_size();
        let pool = table.pool();

        for page_num in 1..table.total_pages() {
            pool.pin(page_num)?;
            let data = pool.read_page(page_num)?;
            pool.unpin(page_num)?;

            for slot in 0..records_per_page {
                let off = slot * record_size;
                let bytes = &data[off..off + record_size];
                let values = codec::decode_record(bytes, table.schema())?;
                let record = Record::new(Rid::new(page_num, slot as i32), values);
                if predicate.as_ref().map_or(true, |p| p(&record)) {
                    records.push(record);
                }
            }
        }

        Ok(Self { records, position: 0 })
    }

    /// Return the next matching record, or
    /// [`StorageError::RmNoMoreTuples`] once exhausted.
    pub fn next(&mut self) -> Result<Record> {
        let record = self
            .records
            .get(self.position)
            .cloned()
            .ok_or(StorageError::RmNoMoreTuples)?;
        self.position += 1;
        Ok(record)
    }

    /// Number of records this scan matched in total.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Release the scan. A no-op since results are already materialized;
    /// kept for symmetry with `closeScan`.
    pub fn close(self) -> Result<()> {
        Ok(())
    }
}
