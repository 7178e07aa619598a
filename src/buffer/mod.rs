//! Buffer pool: a fixed-size in-memory page cache with pluggable
//! replacement policies.
//!
//! Grounded in `B+tree/buffer_mgr.c`: a fixed array of frames, an explicit
//! pin/unpin/markDirty/forcePage contract (no auto-unpin-on-drop in the
//! core API — [`PinnedPage`] is a convenience wrapper built on top of it),
//! and FIFO/LRU replacement chosen at pool-creation time.

mod pool;
mod replacement;

pub use pool::{BufferPool, PinnedPage};
pub use replacement::ReplacementStrategy;
