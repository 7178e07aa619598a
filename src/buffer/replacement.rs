//! Page replacement policy identifiers.

/// Which frame to evict when the pool is full and a new page must be
/// loaded. Mirrors the `ReplacementStrategy` enum passed to `initBufferPool`
/// in `buffer_mgr.c` (`RS_FIFO`, `RS_LRU`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplacementStrategy {
    /// Evict the unpinned frame that has held its current page the longest.
    Fifo,
    /// Evict the unpinned frame that was least recently accessed (pinned or
    /// unpinned through it).
    Lru,
}
