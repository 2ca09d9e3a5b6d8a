//! Unix implementation: `flock(2)` for advisory locking, `madvise(2)` for
//! the access-pattern hint.

use std::fs::File;
use std::io;
use std::os::unix::io::AsRawFd;

/// Attempt a non-blocking whole-file advisory lock.
///
/// Returns `Ok(false)` when another handle holds a conflicting lock.
pub(crate) fn try_lock(file: &File, exclusive: bool) -> io::Result<bool> {
    let flag = if exclusive {
        libc::LOCK_EX
    } else {
        libc::LOCK_SH
    };
    // SAFETY: flock only inspects the descriptor; the File keeps it open
    // for the duration of the call.
    let rc = unsafe { libc::flock(file.as_raw_fd(), flag | libc::LOCK_NB) };
    if rc == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(err)
    }
}

/// Release the advisory lock held through this handle.
pub(crate) fn unlock(file: &File) -> io::Result<()> {
    // SAFETY: see try_lock.
    let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_UN) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

/// Advise the kernel that `[ptr, ptr + len)` will be accessed randomly.
///
/// # Safety contract (internal)
///
/// `ptr`/`len` must describe a live mapping; callers in this crate only
/// pass ranges obtained from a just-created `memmap2` map.
pub(crate) fn advise_random(ptr: *const u8, len: usize) -> io::Result<()> {
    // SAFETY: the caller guarantees the range covers a live mapping.
    let rc = unsafe { libc::madvise(ptr as *mut libc::c_void, len, libc::MADV_RANDOM) };
    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}
