//! Per-OS implementations of the four raw primitives this crate sits on:
//! non-blocking advisory lock, unlock, and the random-access mapping hint.
//! (Mapping and unmapping themselves go through `memmap2`.)
//!
//! Every implementation must satisfy the same contract:
//!
//! - `try_lock` attempts a whole-file advisory lock without blocking and
//!   reports contention as `Ok(false)`, never as an error.
//! - `unlock` drops whatever advisory lock the handle holds.
//! - `advise_random` tells the kernel the mapped range will be accessed
//!   randomly; on platforms with no such hint it succeeds as a no-op.

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        mod unix;
        pub(crate) use unix::{advise_random, try_lock, unlock};
    } else if #[cfg(windows)] {
        mod windows;
        pub(crate) use windows::{advise_random, try_lock, unlock};
    } else {
        compile_error!("dbmap supports only unix and windows targets");
    }
}
