//! Storage layer: the page file store.
//!
//! A page file is a flat file divided into fixed-size [`PAGE_SIZE`] blocks,
//! addressed by a zero-based [`PageNumber`]. This is the lowest layer of the
//! engine and the only one that talks to the operating system directly; the
//! buffer pool is built entirely on top of the [`PageFile`] trait.

mod page_file;

pub use page_file::FilePageFile;

use crate::error::Result;
use crate::types::{PageNumber, PAGE_SIZE};

/// A block-addressable page file.
///
/// Implementations track a current-page cursor so the five cursor-relative
/// reads (`read_first_block` .. `read_last_block`) behave like the original
/// interface's block-position-relative reads.
pub trait PageFile {
    /// Create a new page file on disk containing a single zeroed page.
    /// Fails if a file already exists at `path`.
    fn create(path: &str) -> Result<Self>
    where
        Self: Sized;

    /// Open an existing page file.
    fn open(path: &str) -> Result<Self>
    where
        Self: Sized;

    /// Flush and release the underlying file handle.
    fn close(&mut self) -> Result<()>;

    /// Remove the page file from disk. The file must not be open.
    fn destroy(path: &str) -> Result<()>;

    /// Total number of pages currently in the file.
    fn total_pages(&self) -> i32;

    /// The page number last read or written, i.e. `getBlockPos`.
    fn current_page(&self) -> PageNumber;

    /// Read the page at `page_num` into `buf`, which must be exactly
    /// [`PAGE_SIZE`] bytes.
    fn read_block(&mut self, page_num: PageNumber, buf: &mut [u8]) -> Result<()>;

    fn read_first_block(&mut self, buf: &mut [u8]) -> Result<()>;
    fn read_previous_block(&mut self, buf: &mut [u8]) -> Result<()>;
    fn read_current_block(&mut self, buf: &mut [u8]) -> Result<()>;
    fn read_next_block(&mut self, buf: &mut [u8]) -> Result<()>;
    fn read_last_block(&mut self, buf: &mut [u8]) -> Result<()>;

    /// Write `buf` to the page at `page_num`. `page_num` must already exist
    /// in the file (use [`PageFile::ensure_capacity`] first to grow it).
    fn write_block(&mut self, page_num: PageNumber, buf: &[u8]) -> Result<()>;

    /// Write `buf` to the current page (`current_page()`).
    fn write_current_block(&mut self, buf: &[u8]) -> Result<()>;

    /// Append one zeroed page to the end of the file.
    fn append_empty_block(&mut self) -> Result<()>;

    /// Grow the file with zeroed pages, if necessary, until it has at least
    /// `num_pages` pages.
    fn ensure_capacity(&mut self, num_pages: i32) -> Result<()>;
}

pub(crate) fn assert_page_buf(buf: &[u8]) -> Result<()> {
    if buf.len() != PAGE_SIZE {
        return Err(crate::error::StorageError::invalid_operation(format!(
            "page buffer must be exactly {PAGE_SIZE} bytes, got {}",
            buf.len()
        )));
    }
    Ok(())
}
