//! # dbmap: memory-mapped storage primitives for embedded database engines
//!
//! This crate is the lowest layer of a single-file, memory-mapped storage
//! engine. It exposes the on-disk database file as an addressable memory
//! region and coordinates exclusive process-level access to that file.
//! The page format, transactions, and the open/grow/close policy live in
//! the layers above; they hand this crate an already-open file handle and
//! a requested size, and get back four primitives: acquire a lock, map a
//! region, write into it with bounds checks, and unmap.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::fs::OpenOptions;
//! use std::time::Duration;
//! use dbmap::{lock, map_readwrite};
//!
//! let file = OpenOptions::new().read(true).write(true).open("db.data")?;
//!
//! // One writer per cooperating process set.
//! lock::acquire(&file, true, Duration::from_secs(5))?;
//!
//! let mut region = map_readwrite(&file, 4096)?;
//! region.write_into(b"HELLOWORLD", 0)?;
//! region.flush()?;
//! region.unmap()?;
//!
//! lock::release(&file)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Modules
//!
//! - [`errors`]: error types for locking, mapping, and region access
//! - [`lock`]: process-level advisory file locking with bounded retry
//! - [`region`]: mapped regions with bounds-checked reads and writes
//!
//! ## Guarantees and non-guarantees
//!
//! The lock is advisory: it constrains cooperating processes only. All
//! calls are synchronous and block the calling thread; the caller's
//! owning database object must serialize map/unmap/write transitions on
//! a given file handle. Regions never resize the file — growth is
//! unmap-then-remap-larger, driven by the layer above.

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]

pub mod errors;
pub mod lock;
pub mod region;
mod sys;

pub use errors::{AccessError, LockError, MapError};
pub use region::{map_readonly, map_readwrite, Region, RegionMut};
