//! Error types for the storage engine.
//!
//! Variants mirror the status codes the original C interface returns
//! (`RC_FILE_NOT_FOUND`, `RC_IM_KEY_NOT_FOUND`, ...) so callers porting code
//! from that interface can recover the code name via [`StorageError::code`].

use crate::types::PageNumber;
use thiserror::Error;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur anywhere in the storage engine.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error from the underlying file system.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The page file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// An operation was attempted on a page file handle that was never
    /// opened, or was already closed.
    #[error("file handle not initialized")]
    FileHandleNotInit,

    /// A write to the page file did not complete.
    #[error("write failed for page {0}")]
    WriteFailed(PageNumber),

    /// A read addressed a page beyond the file's current extent.
    #[error("attempted to read non-existing page {0}")]
    ReadNonExistingPage(PageNumber),

    /// The buffer pool could not be shut down or flushed because one or
    /// more frames still have a nonzero fix count.
    #[error("cannot complete operation: {0} page(s) still pinned")]
    PinnedPagesInBuffer(usize),

    /// The buffer pool has no frame available to satisfy a pin request
    /// (every frame is pinned).
    #[error("buffer pool exhausted: no unpinned frame available")]
    BufferPoolExhausted,

    /// A B+-tree lookup did not find the requested key.
    #[error("key not found")]
    ImKeyNotFound,

    /// A B+-tree scan has been advanced past the last entry.
    #[error("no more entries")]
    ImNoMoreEntries,

    /// A table scan has been advanced past the last tuple.
    #[error("no more tuples")]
    RmNoMoreTuples,

    /// `getRecord`/update/delete addressed a RID with no live record.
    #[error("no tuple with given RID {0:?}")]
    RmNoTupleWithGivenRid(crate::types::Rid),

    /// A scan was opened without a usable condition/predicate context.
    #[error("scan condition not found")]
    ScanConditionNotFound,

    /// Data corruption detected (bad magic, truncated header, ...).
    #[error("corruption detected: {0}")]
    Corruption(String),

    /// Page contents failed a structural sanity check.
    #[error("invalid page: {0}")]
    InvalidPage(String),

    /// Operation is not valid given the current state or arguments.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The schema, table, or index file has invalid or inconsistent
    /// contents.
    #[error("invalid database file: {0}")]
    InvalidDatabaseFile(String),

    /// Catch-all for conditions with no more specific variant, matching the
    /// original interface's generic `RC_ERROR`.
    #[error("{0}")]
    Generic(String),
}

impl StorageError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    pub fn invalid_page(msg: impl Into<String>) -> Self {
        Self::InvalidPage(msg.into())
    }

    pub fn invalid_operation(msg: impl Into<String>) -> Self {
        Self::InvalidOperation(msg.into())
    }

    pub fn invalid_db(msg: impl Into<String>) -> Self {
        Self::InvalidDatabaseFile(msg.into())
    }

    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    /// The original interface's status-code name for this error, for
    /// callers that want to branch on it the way the C interface's integer
    /// return codes were branched on.
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::Io(_) => "RC_IO_ERROR",
            StorageError::FileNotFound(_) => "RC_FILE_NOT_FOUND",
            StorageError::FileHandleNotInit => "RC_FILE_HANDLE_NOT_INIT",
            StorageError::WriteFailed(_) => "RC_WRITE_FAILED",
            StorageError::ReadNonExistingPage(_) => "RC_READ_NON_EXISTING_PAGE",
            StorageError::PinnedPagesInBuffer(_) => "RC_PINNED_PAGES_IN_BUFFER",
            StorageError::BufferPoolExhausted => "RC_BUFFER_POOL_EXHAUSTED",
            StorageError::ImKeyNotFound => "RC_IM_KEY_NOT_FOUND",
            StorageError::ImNoMoreEntries => "RC_IM_NO_MORE_ENTRIES",
            StorageError::RmNoMoreTuples => "RC_RM_NO_MORE_TUPLES",
            StorageError::RmNoTupleWithGivenRid(_) => "RC_RM_NO_TUPLE_WITH_GIVEN_RID",
            StorageError::ScanConditionNotFound => "RC_SCAN_CONDITION_NOT_FOUND",
            StorageError::Corruption(_) => "RC_CORRUPTION",
            StorageError::InvalidPage(_) => "RC_INVALID_PAGE",
            StorageError::InvalidOperation(_) => "RC_INVALID_OPERATION",
            StorageError::InvalidDatabaseFile(_) => "RC_INVALID_DB_FILE",
            StorageError::Generic(_) => "RC_ERROR",
        }
    }
}
