//! A [`super::PageFile`] backed by a single OS file.
//!
//! Grounded in `Buffer_manager/storage_mgr.c`: one page's worth of zero bytes
//! is written on `create`, `ensure_capacity`/`append_empty_block` extend the
//! file in [`PAGE_SIZE`]-byte steps, and the cursor-relative reads track the
//! block position the same way `readBlock`'s siblings do there.

use super::assert_page_buf;
use crate::error::{Result, StorageError};
use crate::types::{PageNumber, NO_PAGE, PAGE_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

pub struct FilePageFile {
    file: File,
    file_name: String,
    total_pages: i32,
    curr_page: PageNumber,
}

impl FilePageFile {
    fn byte_offset(page_num: PageNumber) -> u64 {
        page_num as u64 * PAGE_SIZE as u64
    }

    fn check_bounds(&self, page_num: PageNumber) -> Result<()> {
        if page_num < 0 || page_num >= self.total_pages {
            return Err(StorageError::ReadNonExistingPage(page_num));
        }
        Ok(())
    }

    fn read_at(&mut self, page_num: PageNumber, buf: &mut [u8]) -> Result<()> {
        assert_page_buf(buf)?;
        self.check_bounds(page_num)?;
        self.file.seek(SeekFrom::Start(Self::byte_offset(page_num)))?;
        self.file.read_exact(buf)?;
        self.curr_page = page_num;
        Ok(())
    }
}

impl super::PageFile for FilePageFile {
    fn create(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            return Err(StorageError::invalid_operation(format!(
                "page file already exists: {path}"
            )));
        }
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        file.write_all(&[0u8; PAGE_SIZE])?;
        file.flush()?;
        Ok(Self {
            file,
            file_name: path.to_string(),
            total_pages: 1,
            curr_page: NO_PAGE,
        })
    }

    fn open(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            return Err(StorageError::file_not_found(path));
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        if len % PAGE_SIZE as u64 != 0 || len == 0 {
            return Err(StorageError::corruption(format!(
                "page file {path} has size {len}, not a multiple of {PAGE_SIZE}"
            )));
        }
        Ok(Self {
            file,
            file_name: path.to_string(),
            total_pages: (len / PAGE_SIZE as u64) as i32,
            curr_page: NO_PAGE,
        })
    }

    fn close(&mut self) -> Result<()> {
        self.file.flush()?;
        Ok(())
    }

    fn destroy(path: &str) -> Result<()> {
        std::fs::remove_file(path).map_err(StorageError::from)
    }

    fn total_pages(&self) -> i32 {
        self.total_pages
    }

    fn current_page(&self) -> PageNumber {
        self.curr_page
    }

    fn read_block(&mut self, page_num: PageNumber, buf: &mut [u8]) -> Result<()> {
        self.read_at(page_num, buf)
    }

    fn read_first_block(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_at(0, buf)
    }

    fn read_previous_block(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.curr_page == NO_PAGE {
            return Err(StorageError::invalid_operation("no current page set"));
        }
        self.read_at(self.curr_page - 1, buf)
    }

    fn read_current_block(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.curr_page == NO_PAGE {
            return Err(StorageError::invalid_operation("no current page set"));
        }
        self.read_at(self.curr_page, buf)
    }

    fn read_next_block(&mut self, buf: &mut [u8]) -> Result<()> {
        if self.curr_page == NO_PAGE {
            return Err(StorageError::invalid_operation("no current page set"));
        }
        self.read_at(self.curr_page + 1, buf)
    }

    fn read_last_block(&mut self, buf: &mut [u8]) -> Result<()> {
        self.read_at(self.total_pages - 1, buf)
    }

    fn write_block(&mut self, page_num: PageNumber, buf: &[u8]) -> Result<()> {
        assert_page_buf(buf)?;
        self.check_bounds(page_num)?;
        self.file.seek(SeekFrom::Start(Self::byte_offset(page_num)))?;
        self.file
            .write_all(buf)
            .map_err(|_| StorageError::WriteFailed(page_num))?;
        self.file.flush()?;
        self.curr_page = page_num;
        Ok(())
    }

    fn write_current_block(&mut self, buf: &[u8]) -> Result<()> {
        if self.curr_page == NO_PAGE {
            return Err(StorageError::invalid_operation("no current page set"));
        }
        self.write_block(self.curr_page, buf)
    }

    fn append_empty_block(&mut self) -> Result<()> {
        self.file.seek(SeekFrom::End(0))?;
        self.file.write_all(&[0u8; PAGE_SIZE])?;
        self.file.flush()?;
        self.total_pages += 1;
        Ok(())
    }

    fn ensure_capacity(&mut self, num_pages: i32) -> Result<()> {
        while self.total_pages < num_pages {
            self.append_empty_block()?;
        }
        Ok(())
    }
}

impl FilePageFile {
    /// The path this page file was opened/created with.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::PageFile;
    use tempfile::TempDir;

    fn temp_path(dir: &TempDir, name: &str) -> String {
        dir.path().join(name).to_str().unwrap().to_string()
    }

    #[test]
    fn create_yields_one_page_file() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "t.bin");
        let pf = FilePageFile::create(&path).unwrap();
        assert_eq!(pf.total_pages(), 1);
    }

    #[test]
    fn create_twice_fails() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "t.bin");
        FilePageFile::create(&path).unwrap();
        assert!(FilePageFile::create(&path).is_err());
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "t.bin");
        let mut pf = FilePageFile::create(&path).unwrap();
        let mut page = [0u8; PAGE_SIZE];
        page[0] = 42;
        pf.write_block(0, &page).unwrap();

        let mut back = [0u8; PAGE_SIZE];
        pf.read_block(0, &mut back).unwrap();
        assert_eq!(back[0], 42);
    }

    #[test]
    fn ensure_capacity_grows_file() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "t.bin");
        let mut pf = FilePageFile::create(&path).unwrap();
        pf.ensure_capacity(5).unwrap();
        assert_eq!(pf.total_pages(), 5);
    }

    #[test]
    fn reading_past_end_is_read_non_existing_page() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "t.bin");
        let mut pf = FilePageFile::create(&path).unwrap();
        let mut buf = [0u8; PAGE_SIZE];
        match pf.read_block(7, &mut buf) {
            Err(StorageError::ReadNonExistingPage(7)) => {}
            other => panic!("expected ReadNonExistingPage, got {other:?}"),
        }
    }

    #[test]
    fn cursor_relative_reads_track_position() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "t.bin");
        let mut pf = FilePageFile::create(&path).unwrap();
        pf.ensure_capacity(3).unwrap();
        let mut buf = [0u8; PAGE_SIZE];
        pf.read_first_block(&mut buf).unwrap();
        assert_eq!(pf.current_page(), 0);
        pf.read_next_block(&mut buf).unwrap();
        assert_eq!(pf.current_page(), 1);
        pf.read_last_block(&mut buf).unwrap();
        assert_eq!(pf.current_page(), 2);
        pf.read_previous_block(&mut buf).unwrap();
        assert_eq!(pf.current_page(), 1);
    }

    #[test]
    fn open_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "missing.bin");
        assert!(FilePageFile::open(&path).is_err());
    }

    #[test]
    fn destroy_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = temp_path(&dir, "t.bin");
        FilePageFile::create(&path).unwrap();
        FilePageFile::destroy(&path).unwrap();
        assert!(!Path::new(&path).exists());
    }
}
