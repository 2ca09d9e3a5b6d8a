//! Process-level advisory locking on the database's backing file.
//!
//! The lock is purely advisory: a cooperating set of processes achieves
//! at-most-one-writer, but nothing here stops a non-cooperating process
//! from opening and writing the file directly.
//!
//! Acquisition is a busy-poll loop over a non-blocking lock attempt
//! rather than a blocking syscall, because blocking advisory locks with
//! native timeouts are not uniformly available across target platforms.
//! The loop sleeps the calling thread between attempts, so `acquire` can
//! block the caller for up to the full timeout.
//!
//! No handle object is retained after a successful `acquire`; the lock
//! is OS state keyed to the file handle, and `release` undoes it.

use std::fs::File;
use std::thread;
use std::time::{Duration, Instant};

use crate::errors::LockError;
use crate::sys;

/// Fixed sleep between lock attempts while the lock is contended.
pub const RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Time source for the retry loop. Production uses the system clock;
/// tests substitute a fake so timeout behavior is checked without
/// real sleeping.
pub(crate) trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, dur: Duration);
}

pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, dur: Duration) {
        thread::sleep(dur);
    }
}

/// Acquire an advisory lock on `file`, shared or exclusive.
///
/// Attempts a non-blocking lock; on contention, sleeps [`RETRY_INTERVAL`]
/// and retries. A `timeout` of zero retries forever. A nonzero `timeout`
/// is checked before every attempt except the first, so at least one real
/// attempt is always made, and [`LockError::Timeout`] is returned only
/// once wall-clock elapsed strictly exceeds `timeout`.
///
/// # Errors
///
/// Returns `LockError::Timeout` when the deadline passes while the lock
/// is still contended, or `LockError::Os` for any other failure of the
/// underlying lock call (propagated unchanged, never retried).
pub fn acquire(file: &File, exclusive: bool, timeout: Duration) -> Result<(), LockError> {
    acquire_with(file, exclusive, timeout, &mut SystemClock)
}

fn acquire_with<C: Clock>(
    file: &File,
    exclusive: bool,
    timeout: Duration,
    clock: &mut C,
) -> Result<(), LockError> {
    let mut first_attempt: Option<Instant> = None;
    loop {
        // The deadline can only fire after at least one real attempt.
        match first_attempt {
            None => first_attempt = Some(clock.now()),
            Some(started) => {
                let waited = clock.now().saturating_duration_since(started);
                if !timeout.is_zero() && waited > timeout {
                    return Err(LockError::Timeout { waited });
                }
            }
        }

        if sys::try_lock(file, exclusive)? {
            return Ok(());
        }

        log::trace!(
            "advisory lock contended (exclusive={exclusive}), retrying in {RETRY_INTERVAL:?}"
        );
        clock.sleep(RETRY_INTERVAL);
    }
}

/// Release the advisory lock held on `file`.
///
/// Converts the held lock to unlocked unconditionally. Calling this
/// without a prior successful [`acquire`] on the same handle is a
/// contract violation; the result is whatever the OS does for an
/// unlock of an unheld lock.
///
/// # Errors
///
/// Returns `LockError::Os` if the underlying unlock call fails.
pub fn release(file: &File) -> Result<(), LockError> {
    sys::unlock(file)?;
    Ok(())
}
