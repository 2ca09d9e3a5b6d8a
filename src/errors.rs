//! Crate-specific error types for dbmap.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Errors from advisory file locking.
#[derive(Debug, Error)]
pub enum LockError {
    /// The lock was not acquired within the caller's deadline.
    /// Recoverable: the caller may retry with a fresh deadline.
    #[error("file lock not acquired within deadline (waited {waited:?})")]
    Timeout {
        /// Wall-clock time spent waiting before giving up.
        waited: Duration,
    },

    /// The underlying OS lock call failed for a reason other than
    /// contention (e.g. an invalid descriptor). Propagated unchanged.
    #[error("file lock operation failed: {0}")]
    Os(#[from] io::Error),
}

/// Errors from creating, flushing, or releasing a mapped region.
#[derive(Debug, Error)]
pub enum MapError {
    /// A zero-byte mapping was requested. Mapping zero bytes is
    /// platform-dependent and rejected up front.
    #[error("mapping size must be greater than zero")]
    ZeroSize,

    /// The requested mapping extends past the end of the backing file.
    /// The caller must extend the file before mapping; this layer never
    /// resizes the file.
    #[error("requested mapping of {requested} bytes but file is {file_len} bytes")]
    BeyondEof {
        /// Requested mapping length.
        requested: u64,
        /// Real file length at the time of the map call.
        file_len: u64,
    },

    /// The underlying map syscall failed (resource exhaustion, invalid
    /// arguments). Not retried; no partial mapping is left behind.
    #[error("mmap failed: {0}")]
    Map(#[source] io::Error),

    /// The random-access kernel hint could not be applied. The whole
    /// mapping operation is unwound; a misapplied hint is not trusted.
    #[error("madvise failed: {0}")]
    Advise(#[source] io::Error),

    /// Flushing dirty pages back to the file failed.
    #[error("flush failed: {0}")]
    Flush(#[source] io::Error),
}

/// Errors from reading or writing through a mapped region.
#[derive(Debug, Error)]
pub enum AccessError {
    /// The requested range does not fit inside the mapped region.
    /// Writes are rejected outright, never truncated: a silent partial
    /// copy would corrupt the page format layered above this core.
    #[error("request exceeds mapped region: offset={offset}, len={len}, region_len={region_len}")]
    SizeExceeded {
        /// Requested start offset.
        offset: u64,
        /// Requested length.
        len: u64,
        /// Length of the mapped region.
        region_len: u64,
    },

    /// The region has already been unmapped; its handle is stale.
    #[error("mapped region has been unmapped")]
    Unmapped,
}
