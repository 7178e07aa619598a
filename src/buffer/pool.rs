//! The buffer pool itself.

use super::replacement::ReplacementStrategy;
use crate::error::{Result, StorageError};
use crate::storage::PageFile;
use crate::types::{PageNumber, NO_PAGE, PAGE_SIZE};
use parking_lot::Mutex;
use std::collections::HashMap;

struct Frame {
    data: Vec<u8>,
    page_num: PageNumber,
    dirty: bool,
    fix_count: i32,
    /// Stamp assigned when the page currently in this frame was loaded.
    /// Used by FIFO. Sourced from a dedicated monotonic counter, not the
    /// read-IO counter (the original's admission stamp was `getNumReadIO()`,
    /// which drifts whenever some *other* frame does I/O).
    fifo_stamp: u64,
    /// Stamp updated on every pin/access of this frame. Used by LRU.
    lru_stamp: u64,
}

impl Frame {
    fn empty() -> Self {
        Self {
            data: vec![0u8; PAGE_SIZE],
            page_num: NO_PAGE,
            dirty: false,
            fix_count: 0,
            fifo_stamp: 0,
            lru_stamp: 0,
        }
    }
}

struct Inner<F: PageFile> {
    file: F,
    frames: Vec<Frame>,
    page_table: HashMap<PageNumber, usize>,
    strategy: ReplacementStrategy,
    read_io: u64,
    write_io: u64,
    hits: u64,
    fifo_counter: u64,
    lru_counter: u64,
}

impl<F: PageFile> Inner<F> {
    fn choose_victim(&self) -> Option<usize> {
        let candidates = self
            .frames
            .iter()
            .enumerate()
            .filter(|(_, f)| f.fix_count == 0);
        match self.strategy {
            ReplacementStrategy::Fifo => candidates.min_by_key(|(_, f)| f.fifo_stamp).map(|(i, _)| i),
            ReplacementStrategy::Lru => candidates.min_by_key(|(_, f)| f.lru_stamp).map(|(i, _)| i),
        }
    }

    fn frame_index_of(&self, page_num: PageNumber) -> Result<usize> {
        self.page_table
            .get(&page_num)
            .copied()
            .ok_or_else(|| StorageError::invalid_operation(format!("page {page_num} is not pinned")))
    }

    fn write_back(&mut self, frame_idx: usize) -> Result<()> {
        let frame = &self.frames[frame_idx];
        if frame.dirty && frame.page_num != NO_PAGE {
            self.file.write_block(frame.page_num, &frame.data)?;
            self.write_io += 1;
            self.frames[frame_idx].dirty = false;
        }
        Ok(())
    }

    fn load_into(&mut self, frame_idx: usize, page_num: PageNumber) -> Result<()> {
        if page_num >= self.file.total_pages() {
            self.file.ensure_capacity(page_num + 1)?;
        }
        let frame = &mut self.frames[frame_idx];
        self.file.read_block(page_num, &mut frame.data)?;
        self.read_io += 1;
        self.fifo_counter += 1;
        self.lru_counter += 1;
        frame.page_num = page_num;
        frame.dirty = false;
        frame.fix_count = 0;
        frame.fifo_stamp = self.fifo_counter;
        frame.lru_stamp = self.lru_counter;
        Ok(())
    }
}

/// A fixed-size pool of page frames backed by a [`PageFile`].
pub struct BufferPool<F: PageFile> {
    inner: Mutex<Inner<F>>,
}

impl<F: PageFile> BufferPool<F> {
    /// Open `file` and create a pool of `num_frames` frames using
    /// `strategy` for replacement. Mirrors `initBufferPool`.
    pub fn new(file: F, num_frames: usize, strategy: ReplacementStrategy) -> Result<Self> {
        if num_frames == 0 {
            return Err(StorageError::invalid_operation(
                "buffer pool must have at least one frame",
            ));
        }
        let frames = (0..num_frames).map(|_| Frame::empty()).collect();
        Ok(Self {
            inner: Mutex::new(Inner {
                file,
                frames,
                page_table: HashMap::new(),
                strategy,
                read_io: 0,
                write_io: 0,
                hits: 0,
                fifo_counter: 0,
                lru_counter: 0,
            }),
        })
    }

    /// Pin `page_num`, loading it from disk if it isn't already cached.
    /// Fails with [`StorageError::BufferPoolExhausted`] if every frame is
    /// pinned. Mirrors `pinPage`.
    pub fn pin(&self, page_num: PageNumber) -> Result<()> {
        if page_num < 0 {
            return Err(StorageError::invalid_operation("page number must be >= 0"));
        }
        let mut inner = self.inner.lock();

        if let Some(&idx) = inner.page_table.get(&page_num) {
            inner.hits += 1;
            inner.lru_counter += 1;
            let stamp = inner.lru_counter;
            let frame = &mut inner.frames[idx];
            frame.fix_count += 1;
            frame.lru_stamp = stamp;
            return Ok(());
        }

        let victim = inner
            .choose_victim()
            .ok_or(StorageError::BufferPoolExhausted)?;

        inner.write_back(victim)?;
        let old_page = inner.frames[victim].page_num;
        if old_page != NO_PAGE {
            inner.page_table.remove(&old_page);
        }
        inner.load_into(victim, page_num)?;
        inner.frames[victim].fix_count = 1;
        inner.page_table.insert(page_num, victim);
        Ok(())
    }

    /// Decrement `page_num`'s fix count. Mirrors `unpinPage`.
    pub fn unpin(&self, page_num: PageNumber) -> Result<()> {
        let mut inner = self.inner.lock();
        let idx = inner.frame_index_of(page_num)?;
        let frame = &mut inner.frames[idx];
        if frame.fix_count <= 0 {
            return Err(StorageError::invalid_operation(format!(
                "page {page_num} is not pinned"
            )));
        }
        frame.fix_count -= 1;
        Ok(())
    }

    /// Mark `page_num`'s frame dirty. Mirrors `markDirty`.
    pub fn mark_dirty(&self, page_num: PageNumber) -> Result<()> {
        let mut inner = self.inner.lock();
        let idx = inner.frame_index_of(page_num)?;
        inner.frames[idx].dirty = true;
        Ok(())
    }

    /// Write `page_num`'s frame to disk immediately, regardless of its
    /// dirty bit, and clear the dirty bit. Mirrors `forcePage`.
    pub fn force_page(&self, page_num: PageNumber) -> Result<()> {
        let mut inner = self.inner.lock();
        let idx = inner.frame_index_of(page_num)?;
        inner.frames[idx].dirty = true;
        inner.write_back(idx)
    }

    /// Copy `page_num`'s current frame contents out. The page must be
    /// pinned.
    pub fn read_page(&self, page_num: PageNumber) -> Result<Vec<u8>> {
        let inner = self.inner.lock();
        let idx = inner.frame_index_of(page_num)?;
        Ok(inner.frames[idx].data.clone())
    }

    /// Overwrite `page_num`'s frame contents and mark it dirty. The page
    /// must be pinned. `data` must be exactly [`PAGE_SIZE`] bytes.
    pub fn write_page(&self, page_num: PageNumber, data: &[u8]) -> Result<()> {
        if data.len() != PAGE_SIZE {
            return Err(StorageError::invalid_operation(format!(
                "page buffer must be exactly {PAGE_SIZE} bytes, got {}",
                data.len()
            )));
        }
        let mut inner = self.inner.lock();
        let idx = inner.frame_index_of(page_num)?;
        inner.frames[idx].data.copy_from_slice(data);
        inner.frames[idx].dirty = true;
        Ok(())
    }

    /// Write back every dirty frame with a zero fix count. Frames still
    /// pinned are left dirty. Mirrors `forceFlushPool`.
    pub fn flush_all(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        for idx in 0..inner.frames.len() {
            if inner.frames[idx].fix_count == 0 {
                inner.write_back(idx)?;
            }
        }
        Ok(())
    }

    /// Flush and release the pool. Fails if any frame is still pinned.
    /// Mirrors `shutdownBufferPool`.
    pub fn shutdown(mut self) -> Result<()> {
        let mut inner = self.inner.lock();
        let pinned = inner.frames.iter().filter(|f| f.fix_count > 0).count();
        if pinned > 0 {
            return Err(StorageError::PinnedPagesInBuffer(pinned));
        }
        for idx in 0..inner.frames.len() {
            inner.write_back(idx)?;
        }
        inner.file.close()?;
        drop(inner);
        Ok(())
    }

    /// Snapshot of the page number held by each frame, in frame order.
    /// Frames with no page loaded report [`NO_PAGE`]. Mirrors
    /// `getFrameContents`.
    pub fn frame_contents(&self) -> Vec<PageNumber> {
        self.inner.lock().frames.iter().map(|f| f.page_num).collect()
    }

    /// Snapshot of each frame's dirty bit, in frame order. Mirrors
    /// `getDirtyFlags`.
    pub fn dirty_flags(&self) -> Vec<bool> {
        self.inner.lock().frames.iter().map(|f| f.dirty).collect()
    }

    /// Snapshot of each frame's fix count, in frame order. Mirrors
    /// `getFixCounts`.
    pub fn fix_counts(&self) -> Vec<i32> {
        self.inner.lock().frames.iter().map(|f| f.fix_count).collect()
    }

    /// Total number of page reads since the pool was created. Mirrors
    /// `getNumReadIO`.
    pub fn num_read_io(&self) -> u64 {
        self.inner.lock().read_io
    }

    /// Total number of page writes since the pool was created. Mirrors
    /// `getNumWriteIO`.
    pub fn num_write_io(&self) -> u64 {
        self.inner.lock().write_io
    }

    /// Total number of `pin` calls satisfied by an already-cached frame,
    /// i.e. that did not require a disk read.
    pub fn num_hits(&self) -> u64 {
        self.inner.lock().hits
    }

    /// Number of frames in the pool.
    pub fn capacity(&self) -> usize {
        self.inner.lock().frames.len()
    }

    /// Total number of pages currently in the backing file.
    pub fn total_pages(&self) -> PageNumber {
        self.inner.lock().file.total_pages()
    }
}

/// RAII convenience wrapper around [`BufferPool::pin`]/[`BufferPool::unpin`].
/// Fetches a page on construction, buffers writes locally, and writes back
/// and unpins on drop. Mirrors the teacher crate's `PageGuard` texture while
/// leaving the pool's own pin/unpin/markDirty contract explicit and
/// independently usable.
pub struct PinnedPage<'p, F: PageFile> {
    pool: &'p BufferPool<F>,
    page_num: PageNumber,
    data: Vec<u8>,
    dirty: bool,
}

impl<'p, F: PageFile> PinnedPage<'p, F> {
    pub fn fetch(pool: &'p BufferPool<F>, page_num: PageNumber) -> Result<Self> {
        pool.pin(page_num)?;
        let data = pool.read_page(page_num)?;
        Ok(Self {
            pool,
            page_num,
            data,
            dirty: false,
        })
    }

    pub fn page_num(&self) -> PageNumber {
        self.page_num
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.dirty = true;
        &mut self.data
    }
}

impl<F: PageFile> Drop for PinnedPage<'_, F> {
    fn drop(&mut self) {
        if self.dirty {
            let _ = self.pool.write_page(self.page_num, &self.data);
        }
        let _ = self.pool.unpin(self.page_num);
    }
}
